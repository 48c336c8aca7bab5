use chrono::{DateTime, Utc};

use rust_decimal::Decimal;

use serde::Serialize;

use uuid::Uuid;

/// The entitlement record: proof that a student may access a course.
/// At most one row exists per (student, course), enforced by a unique
/// constraint the entitlement writer treats as authoritative.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    /// Completion percentage in [0, 100].
    pub progress: Decimal,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
