use actix_web::{delete, post, web, HttpResponse, Scope};

use coursedeck::domain::CouponCode;
use coursedeck::entitlement::{self, EntitlementError};

use serde::Deserialize;

use serde_json::json;

use sqlx::PgPool;

use uuid::Uuid;

use crate::auth::{Administrator, Student};
use crate::controller::{decline, ok};
use crate::error::{RestError, RestResult};

pub fn scope() -> Scope {
    web::scope("/enroll").service(enroll_free)
}

pub fn admin_scope() -> Scope {
    web::scope("/admin/enrollments").service(revoke)
}

#[derive(Debug, Deserialize)]
pub struct FreeEnrollmentRequest {
    course_id: Uuid,
    coupon_code: Option<CouponCode>,
}

/// Free-path enrollment: the course (after any coupon) must cost nothing.
#[tracing::instrument(name = "Create free enrollment", skip(pool, student))]
#[post("/free")]
async fn enroll_free(
    student: Student,
    pool: web::Data<PgPool>,
    body: web::Json<FreeEnrollmentRequest>,
) -> RestResult<HttpResponse> {
    let grant = entitlement::grant_free(
        pool.get_ref(),
        student.id,
        body.course_id,
        body.coupon_code.as_ref(),
    )
    .await;

    match grant {
        Ok(grant) => Ok(ok(json!({
            "enrollment_id": grant.enrollment_id,
            "payment_id": grant.payment_id,
        }))),
        Err(EntitlementError::Database(e)) => Err(e.into()),
        Err(err) => Ok(decline(err.code(), err.to_string())),
    }
}

/// Administrative revocation. The seat counter moves in the same
/// transaction as the enrollment delete; payments stay for audit.
#[tracing::instrument(name = "Revoke enrollment", skip(pool, admin))]
#[delete("/{id}")]
async fn revoke(
    admin: Administrator,
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> RestResult<HttpResponse> {
    let enrollment_id = path.into_inner();

    let revoked = match entitlement::revoke(pool.get_ref(), enrollment_id).await {
        Ok(revoked) => revoked,
        Err(EntitlementError::Database(e)) => return Err(e.into()),
        Err(err) => return Err(RestError::InternalError(err.to_string())),
    };

    if revoked {
        Ok(ok(json!({ "revoked": enrollment_id })))
    } else {
        Ok(decline("ENROLLMENT_NOT_FOUND", "Enrollment not found"))
    }
}
