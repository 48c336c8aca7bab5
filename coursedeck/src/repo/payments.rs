use rust_decimal::Decimal;

use sqlx::PgExecutor;

use uuid::Uuid;

use crate::model::{NewPendingPayment, Payment, PaymentStatus};

/// Postgres payment repository.
/// Payment rows are append-and-transition only; nothing here deletes.
#[derive(Debug)]
pub struct PaymentsRepo;

impl PaymentsRepo {
    #[tracing::instrument(name = "Insert pending payment", skip(executor))]
    pub async fn insert_pending<'con>(
        executor: impl PgExecutor<'con>,
        new_payment: &NewPendingPayment,
    ) -> sqlx::Result<Uuid> {
        let row: (Uuid,) = sqlx::query_as(
            "insert into payments(student_id, course_id, amount, status, \
             stripe_payment_intent_id, coupon_id, discount_amount) \
             values ($1, $2, $3, $4, $5, $6, $7) returning id",
        )
        .bind(new_payment.student_id)
        .bind(new_payment.course_id)
        .bind(new_payment.amount)
        .bind(PaymentStatus::Pending)
        .bind(&new_payment.stripe_payment_intent_id)
        .bind(new_payment.coupon_id)
        .bind(new_payment.discount_amount)
        .fetch_one(executor)
        .await?;

        Ok(row.0)
    }

    /// Audit row for a grant that never went through the processor
    /// (the free path): already SUCCEEDED, no intent reference.
    #[tracing::instrument(name = "Insert succeeded payment", skip(executor))]
    pub async fn insert_succeeded<'con>(
        executor: impl PgExecutor<'con>,
        student_id: Uuid,
        course_id: Uuid,
        amount: Decimal,
        coupon_id: Option<Uuid>,
        discount_amount: Option<Decimal>,
    ) -> sqlx::Result<Uuid> {
        let row: (Uuid,) = sqlx::query_as(
            "insert into payments(student_id, course_id, amount, status, coupon_id, \
             discount_amount) values ($1, $2, $3, $4, $5, $6) returning id",
        )
        .bind(student_id)
        .bind(course_id)
        .bind(amount)
        .bind(PaymentStatus::Succeeded)
        .bind(coupon_id)
        .bind(discount_amount)
        .fetch_one(executor)
        .await?;

        Ok(row.0)
    }

    #[tracing::instrument(name = "Fetch payment by intent", skip(executor))]
    pub async fn fetch_by_intent<'con>(
        executor: impl PgExecutor<'con>,
        intent_ref: &str,
    ) -> sqlx::Result<Option<Payment>> {
        sqlx::query_as::<_, Payment>(
            "select * from payments where stripe_payment_intent_id=$1",
        )
        .bind(intent_ref)
        .fetch_optional(executor)
        .await
    }

    /// Atomic PENDING → SUCCEEDED transition, keyed by intent reference.
    /// Returns the transitioned row, or `None` when no pending row
    /// matched; two concurrent webhook redeliveries cannot both win.
    #[tracing::instrument(name = "Transition payment to succeeded", skip(executor))]
    pub async fn transition_to_succeeded<'con>(
        executor: impl PgExecutor<'con>,
        intent_ref: &str,
    ) -> sqlx::Result<Option<Payment>> {
        sqlx::query_as::<_, Payment>(
            "update payments set status=$2 \
             where stripe_payment_intent_id=$1 and status=$3 returning *",
        )
        .bind(intent_ref)
        .bind(PaymentStatus::Succeeded)
        .bind(PaymentStatus::Pending)
        .fetch_optional(executor)
        .await
    }

    #[tracing::instrument(name = "Mark payment failed", skip(executor))]
    pub async fn mark_failed<'con>(
        executor: impl PgExecutor<'con>,
        intent_ref: &str,
    ) -> sqlx::Result<u64> {
        let result = sqlx::query(
            "update payments set status=$2 \
             where stripe_payment_intent_id=$1 and status=$3",
        )
        .bind(intent_ref)
        .bind(PaymentStatus::Failed)
        .bind(PaymentStatus::Pending)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
