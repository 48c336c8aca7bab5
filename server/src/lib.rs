/// Basic application code
pub mod app;
/// Application authorization
pub mod auth;
/// Controllers for REST endpoints
pub mod controller;
/// Error enums
pub mod error;
/// Application settings
pub mod settings;
/// Application telemetry for tracing and logging
pub mod telemetry;
