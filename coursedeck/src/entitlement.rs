//! Converts purchases (free or paid) into durable enrollments, exactly
//! once. Every grant applies its four effects inside one transaction:
//! enrollment insert, seat-counter increment, conditional coupon
//! redemption, payment record. The unique constraint on
//! (student_id, course_id) is the source of truth for at-most-one
//! enrollment; the pre-checks in controllers are advisory.

use chrono::Utc;

use rust_decimal::Decimal;

use sqlx::PgPool;

use uuid::Uuid;

use crate::domain::CouponCode;
use crate::model::{CouponRejection, PaymentStatus};
use crate::repo::{CouponsRepo, CoursesRepo, EnrollmentsRepo, PaymentsRepo};

/// The ids produced by a successful grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementGrant {
    pub enrollment_id: Uuid,
    pub payment_id: Uuid,
}

/// Outcome of finalizing a processor success event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Granted(EntitlementGrant),
    /// The payment had already left PENDING; redelivered events are
    /// acknowledged without side effects.
    AlreadyProcessed,
}

#[derive(Debug, thiserror::Error)]
pub enum EntitlementError {
    #[error("Course not found")]
    CourseNotFound,
    #[error("Already enrolled in this course")]
    AlreadyEnrolled,
    #[error("Payment not found")]
    PaymentNotFound,
    #[error("Course requires payment")]
    NotFree,
    #[error(transparent)]
    Coupon(#[from] CouponRejection),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl EntitlementError {
    /// Stable machine-readable code for API envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CourseNotFound => "COURSE_NOT_FOUND",
            Self::AlreadyEnrolled => "ALREADY_ENROLLED",
            Self::PaymentNotFound => "PAYMENT_NOT_FOUND",
            Self::NotFree => "NOT_FREE",
            Self::Coupon(rejection) => rejection.code(),
            Self::Database(_) => "CONFLICT",
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Grant an entitlement without going through the payment processor.
/// The course's effective price, after any coupon, must be zero.
///
/// Records a zero-amount SUCCEEDED payment for audit uniformity.
#[tracing::instrument(name = "Grant free entitlement", skip(pool))]
pub async fn grant_free(
    pool: &PgPool,
    student_id: Uuid,
    course_id: Uuid,
    coupon_code: Option<&CouponCode>,
) -> Result<EntitlementGrant, EntitlementError> {
    let mut tx = pool.begin().await?;

    let course = CoursesRepo::fetch_by_id(&mut *tx, course_id)
        .await?
        .ok_or(EntitlementError::CourseNotFound)?;

    let amount = course.effective_price();
    let coupon = match coupon_code {
        Some(code) => Some(
            CouponsRepo::fetch_by_code(&mut tx, code)
                .await?
                .ok_or(CouponRejection::InvalidCode)?,
        ),
        None => None,
    };
    let discount = match &coupon {
        Some(coupon) => Some(coupon.evaluate(course_id, amount, Utc::now())?),
        None => None,
    };

    if amount - discount.unwrap_or(Decimal::ZERO) > Decimal::ZERO {
        return Err(EntitlementError::NotFree);
    }

    let enrollment_id = EnrollmentsRepo::insert(&mut *tx, student_id, course_id)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                EntitlementError::AlreadyEnrolled
            } else {
                err.into()
            }
        })?;

    CoursesRepo::adjust_students_count(&mut *tx, course_id, 1).await?;

    if let Some(coupon) = &coupon {
        if !CouponsRepo::redeem(&mut *tx, coupon.id).await? {
            return Err(CouponRejection::UsageLimitReached.into());
        }
    }

    let payment_id = PaymentsRepo::insert_succeeded(
        &mut *tx,
        student_id,
        course_id,
        Decimal::ZERO,
        coupon.as_ref().map(|coupon| coupon.id),
        discount,
    )
    .await?;

    tx.commit().await?;

    Ok(EntitlementGrant {
        enrollment_id,
        payment_id,
    })
}

/// Finalize a processor success event: transition the payment out of
/// PENDING and grant the entitlement it paid for.
///
/// Idempotent under webhook redelivery: the PENDING → SUCCEEDED
/// transition is a conditional update, and losing the enrollment race
/// rolls the whole transaction back.
#[tracing::instrument(name = "Finalize paid entitlement", skip(pool))]
pub async fn finalize_paid(
    pool: &PgPool,
    intent_ref: &str,
) -> Result<FinalizeOutcome, EntitlementError> {
    let mut tx = pool.begin().await?;

    let payment = match PaymentsRepo::transition_to_succeeded(&mut *tx, intent_ref).await? {
        Some(payment) => payment,
        None => {
            let existing = PaymentsRepo::fetch_by_intent(&mut *tx, intent_ref)
                .await?
                .ok_or(EntitlementError::PaymentNotFound)?;
            if existing.status == PaymentStatus::Failed {
                tracing::warn!(intent_ref, "Success event for a payment already marked failed");
            }
            return Ok(FinalizeOutcome::AlreadyProcessed);
        }
    };

    let enrollment_id =
        EnrollmentsRepo::insert(&mut *tx, payment.student_id, payment.course_id)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    EntitlementError::AlreadyEnrolled
                } else {
                    err.into()
                }
            })?;

    CoursesRepo::adjust_students_count(&mut *tx, payment.course_id, 1).await?;

    if let Some(coupon_id) = payment.coupon_id {
        if !CouponsRepo::redeem(&mut *tx, coupon_id).await? {
            return Err(CouponRejection::UsageLimitReached.into());
        }
    }

    tx.commit().await?;

    Ok(FinalizeOutcome::Granted(EntitlementGrant {
        enrollment_id,
        payment_id: payment.id,
    }))
}

/// Record a processor failure event. No entitlement is written; only a
/// PENDING payment transitions, so redeliveries are harmless.
#[tracing::instrument(name = "Mark payment failed", skip(pool))]
pub async fn mark_failed(pool: &PgPool, intent_ref: &str) -> Result<(), EntitlementError> {
    PaymentsRepo::mark_failed(pool, intent_ref).await?;
    Ok(())
}

/// Administrative revocation: remove the enrollment and its counted seat
/// together. Payments and consumed coupon uses stay behind as audit.
#[tracing::instrument(name = "Revoke entitlement", skip(pool))]
pub async fn revoke(pool: &PgPool, enrollment_id: Uuid) -> Result<bool, EntitlementError> {
    let mut tx = pool.begin().await?;

    let Some(course_id) = EnrollmentsRepo::delete(&mut *tx, enrollment_id).await? else {
        return Ok(false);
    };
    CoursesRepo::adjust_students_count(&mut *tx, course_id, -1).await?;

    tx.commit().await?;
    Ok(true)
}
