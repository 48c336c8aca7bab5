/// REST clients for outside services
pub mod client;
/// Cryptography-related objects
pub mod crypto;
/// Domain objects
pub mod domain;
/// Entitlement writer: converts purchases into enrollments, exactly once
pub mod entitlement;
/// Error enums
pub mod error;
/// Models
pub mod model;
/// Repositories
pub mod repo;
