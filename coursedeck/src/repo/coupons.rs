use chrono::Utc;

use sqlx::{PgConnection, PgExecutor};

use uuid::Uuid;

use crate::domain::CouponCode;
use crate::model::{Coupon, NewCoupon};

/// Postgres coupon repository
#[derive(Debug)]
pub struct CouponsRepo;

impl CouponsRepo {
    /// Insert a coupon along with its course restriction rows.
    /// Takes a connection rather than an executor: two statements.
    #[tracing::instrument(name = "Insert coupon", skip(conn))]
    pub async fn insert(conn: &mut PgConnection, new_coupon: &NewCoupon) -> sqlx::Result<Uuid> {
        let valid_from = new_coupon.valid_from.unwrap_or_else(Utc::now);

        let row: (Uuid,) = sqlx::query_as(
            "insert into coupons(code, discount_type, discount_value, max_uses, \
             max_uses_per_user, min_purchase_amount, valid_from, valid_until) \
             values ($1, $2, $3, $4, $5, $6, $7, $8) returning id",
        )
        .bind(new_coupon.code.as_ref())
        .bind(new_coupon.discount_type)
        .bind(new_coupon.discount_value)
        .bind(new_coupon.max_uses)
        .bind(new_coupon.max_uses_per_user)
        .bind(new_coupon.min_purchase_amount)
        .bind(valid_from)
        .bind(new_coupon.valid_until)
        .fetch_one(&mut *conn)
        .await?;

        for course_id in &new_coupon.course_ids {
            sqlx::query("insert into coupon_courses(coupon_id, course_id) values ($1, $2)")
                .bind(row.0)
                .bind(course_id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(row.0)
    }

    /// Fetch a coupon and its restriction list by normalized code.
    #[tracing::instrument(name = "Fetch coupon by code", skip(conn))]
    pub async fn fetch_by_code(
        conn: &mut PgConnection,
        code: &CouponCode,
    ) -> sqlx::Result<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>("select * from coupons where code=$1")
            .bind(code.as_ref())
            .fetch_optional(&mut *conn)
            .await?;

        let Some(mut coupon) = coupon else {
            return Ok(None);
        };

        let course_ids: Vec<(Uuid,)> =
            sqlx::query_as("select course_id from coupon_courses where coupon_id=$1")
                .bind(coupon.id)
                .fetch_all(&mut *conn)
                .await?;
        coupon.course_ids = course_ids.into_iter().map(|row| row.0).collect();

        Ok(Some(coupon))
    }

    #[tracing::instrument(name = "Fetch all coupons", skip(executor))]
    pub async fn fetch_all<'con>(executor: impl PgExecutor<'con>) -> sqlx::Result<Vec<Coupon>> {
        sqlx::query_as::<_, Coupon>("select * from coupons order by created_at desc")
            .fetch_all(executor)
            .await
    }

    /// Consume one use, guarded by the usage limit. Returns `false` when
    /// the coupon is already exhausted; callers must then abort their
    /// transaction. This conditional update is the authoritative limit
    /// check, not the evaluator's advisory one.
    #[tracing::instrument(name = "Redeem coupon use", skip(executor))]
    pub async fn redeem<'con>(executor: impl PgExecutor<'con>, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query(
            "update coupons set current_uses = current_uses + 1 \
             where id=$1 and (max_uses is null or current_uses < max_uses)",
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(name = "Toggle coupon active flag", skip(executor))]
    pub async fn toggle_active<'con>(
        executor: impl PgExecutor<'con>,
        id: Uuid,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query("update coupons set is_active = not is_active where id=$1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(name = "Delete coupon", skip(executor))]
    pub async fn delete<'con>(executor: impl PgExecutor<'con>, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("delete from coupons where id=$1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
