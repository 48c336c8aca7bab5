use actix_web::{delete, post, web, HttpResponse, Scope};

use chrono::Utc;

use coursedeck::domain::CouponCode;
use coursedeck::model::{CouponRejection, NewCoupon};
use coursedeck::repo::{CouponsRepo, CoursesRepo};

use serde::Deserialize;

use serde_json::json;

use sqlx::PgPool;

use uuid::Uuid;

use crate::auth::{Administrator, Student};
use crate::controller::{decline, ok};
use crate::error::RestResult;

pub fn scope() -> Scope {
    web::scope("/coupons").service(validate)
}

pub fn admin_scope() -> Scope {
    web::scope("/admin/coupons")
        .service(create)
        .service(toggle)
        .service(remove)
}

#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    code: CouponCode,
    course_id: Uuid,
}

/// Advisory coupon check for the checkout page. Usage is only consumed
/// when an entitlement is actually granted.
#[tracing::instrument(name = "Validate coupon", skip(pool, _student))]
#[post("/validate")]
async fn validate(
    _student: Student,
    pool: web::Data<PgPool>,
    body: web::Json<ValidateCouponRequest>,
) -> RestResult<HttpResponse> {
    let course = match CoursesRepo::fetch_by_id(pool.get_ref(), body.course_id).await? {
        Some(course) if course.is_published() => course,
        _ => return Ok(decline("COURSE_NOT_FOUND", "Course not found")),
    };

    let mut conn = pool.acquire().await?;
    let Some(coupon) = CouponsRepo::fetch_by_code(&mut conn, &body.code).await? else {
        let rejection = CouponRejection::InvalidCode;
        return Ok(decline(rejection.code(), rejection.to_string()));
    };

    let amount = course.effective_price();
    match coupon.evaluate(course.id, amount, Utc::now()) {
        Ok(discount) => Ok(ok(json!({
            "code": coupon.code,
            "discount_type": coupon.discount_type,
            "discount_amount": discount,
            "final_amount": amount - discount,
        }))),
        Err(rejection) => Ok(decline(rejection.code(), rejection.to_string())),
    }
}

#[tracing::instrument(name = "Create coupon", skip(pool, _admin))]
#[post("")]
async fn create(
    _admin: Administrator,
    pool: web::Data<PgPool>,
    body: web::Json<NewCoupon>,
) -> RestResult<HttpResponse> {
    let mut conn = pool.acquire().await?;

    if CouponsRepo::fetch_by_code(&mut conn, &body.code).await?.is_some() {
        return Ok(decline("DUPLICATE_CODE", "Coupon code already exists"));
    }

    let id = CouponsRepo::insert(&mut conn, &body).await?;

    Ok(ok(json!({ "coupon_id": id })))
}

#[tracing::instrument(name = "Toggle coupon", skip(pool, _admin))]
#[post("/{id}/toggle")]
async fn toggle(
    _admin: Administrator,
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> RestResult<HttpResponse> {
    let id = path.into_inner();

    if CouponsRepo::toggle_active(pool.get_ref(), id).await? {
        Ok(ok(json!({ "coupon_id": id })))
    } else {
        Ok(decline("COUPON_NOT_FOUND", "Coupon not found"))
    }
}

#[tracing::instrument(name = "Delete coupon", skip(pool, _admin))]
#[delete("/{id}")]
async fn remove(
    _admin: Administrator,
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> RestResult<HttpResponse> {
    let id = path.into_inner();

    if CouponsRepo::delete(pool.get_ref(), id).await? {
        Ok(ok(json!({ "deleted": id })))
    } else {
        Ok(decline("COUPON_NOT_FOUND", "Coupon not found"))
    }
}
