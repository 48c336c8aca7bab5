use chrono::{DateTime, Utc};

use rust_decimal::Decimal;

use serde::{Deserialize, Serialize};

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Audit record of a purchase attempt. Free enrollments get a zero-amount
/// row for uniformity. Payment rows are never deleted, even when the
/// enrollment they funded is later revoked.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub amount: Decimal,
    pub status: PaymentStatus,
    /// External processor reference, unique when present.
    pub stripe_payment_intent_id: Option<String>,
    pub coupon_id: Option<Uuid>,
    pub discount_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// A PENDING payment row bound to a freshly created processor intent.
#[derive(Debug)]
pub struct NewPendingPayment {
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub amount: Decimal,
    pub stripe_payment_intent_id: String,
    pub coupon_id: Option<Uuid>,
    pub discount_amount: Option<Decimal>,
}
