mod credentials;
mod guard;
mod leader;

pub use credentials::Credentials;
pub use guard::{Administrator, Student};
pub use leader::LeaderPrincipal;
