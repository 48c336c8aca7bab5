use chrono::{DateTime, Utc};

use rust_decimal::Decimal;

use serde::{Deserialize, Serialize};

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseStatus {
    Draft,
    Published,
}

/// Stored catalog record.
///
/// `students_count`, `rating` and `reviews_count` are denormalized
/// counters; `students_count` is maintained by the entitlement writer and
/// must track the number of live enrollment rows.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Course {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub status: CourseStatus,
    pub students_count: i32,
    pub rating: Decimal,
    pub reviews_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// The amount a checkout starts from: the discounted price when one is
    /// set, the list price otherwise.
    pub fn effective_price(&self) -> Decimal {
        self.discount_price.unwrap_or(self.price)
    }

    pub fn is_published(&self) -> bool {
        self.status == CourseStatus::Published
    }
}

/// Payload for creating a catalog record.
#[derive(Debug, Deserialize)]
pub struct NewCourse {
    pub slug: String,
    pub title: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub status: CourseStatus,
}
