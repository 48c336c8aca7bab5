use serde::{Deserialize, Serialize};

/// Role lattice, lowest to highest privilege.
///
/// `LEADER` is held by exactly one configured identity and can neither be
/// granted to anyone else nor revoked from it (see the server's access
/// guard).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Vip,
    Admin,
    Leader,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        *self >= Role::Admin
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Vip => "VIP",
            Role::Admin => "ADMIN",
            Role::Leader => "LEADER",
        }
    }
}
