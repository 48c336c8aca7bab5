use chrono::{DateTime, Utc};

use serde::Serialize;

use uuid::Uuid;

use crate::domain::{EmailAddress, Role};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_super_admin: bool,
    pub blocked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewUser {
    pub email: EmailAddress,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub is_super_admin: bool,
}
