use actix_web::{post, web, HttpResponse, Scope};

use chrono::Utc;

use coursedeck::domain::CouponCode;
use coursedeck::model::{CouponRejection, NewPendingPayment};
use coursedeck::repo::{CouponsRepo, CoursesRepo, EnrollmentsRepo, PaymentsRepo};

use rust_decimal::Decimal;

use serde::Deserialize;

use serde_json::json;

use sqlx::PgPool;

use uuid::Uuid;

use crate::app::PaymentGateway;
use crate::auth::Student;
use crate::controller::{decline, ok};
use crate::error::RestResult;

pub fn scope() -> Scope {
    web::scope("/checkout").service(create_intent)
}

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    course_id: Uuid,
    coupon_code: Option<CouponCode>,
}

/// Start a paid checkout: price the purchase, obtain a processor intent,
/// and record a PENDING payment bound to it. The entitlement itself is
/// only granted later, when the processor confirms asynchronously.
#[tracing::instrument(name = "Create payment intent", skip(pool, gateway, student))]
#[post("/intent")]
async fn create_intent(
    student: Student,
    pool: web::Data<PgPool>,
    gateway: web::Data<Option<PaymentGateway>>,
    body: web::Json<CreateIntentRequest>,
) -> RestResult<HttpResponse> {
    let Some(gateway) = gateway.as_ref() else {
        return Ok(decline(
            "PAYMENT_NOT_CONFIGURED",
            "Paid checkout is not available",
        ));
    };

    let course = match CoursesRepo::fetch_by_id(pool.get_ref(), body.course_id).await? {
        Some(course) if course.is_published() => course,
        _ => return Ok(decline("COURSE_NOT_FOUND", "Course not found")),
    };

    // Advisory pre-check; the unique constraint still backstops the race.
    if EnrollmentsRepo::exists(pool.get_ref(), student.id, course.id).await? {
        return Ok(decline("ALREADY_ENROLLED", "Already enrolled in this course"));
    }

    let amount = course.effective_price();
    let (coupon, discount) = match &body.coupon_code {
        Some(code) => {
            let mut conn = pool.acquire().await?;
            let Some(coupon) = CouponsRepo::fetch_by_code(&mut conn, code).await? else {
                let rejection = CouponRejection::InvalidCode;
                return Ok(decline(rejection.code(), rejection.to_string()));
            };
            match coupon.evaluate(course.id, amount, Utc::now()) {
                Ok(discount) => (Some(coupon), discount),
                Err(rejection) => return Ok(decline(rejection.code(), rejection.to_string())),
            }
        }
        None => (None, Decimal::ZERO),
    };

    let amount = amount - discount;
    if amount <= Decimal::ZERO {
        return Ok(decline(
            "NOT_PAYABLE",
            "Nothing to pay; use the free enrollment path",
        ));
    }

    // Processor failures map to 502.
    let intent = gateway
        .client
        .create_intent(amount, student.id, course.id)
        .await?;

    let payment_id = PaymentsRepo::insert_pending(
        pool.get_ref(),
        &NewPendingPayment {
            student_id: student.id,
            course_id: course.id,
            amount,
            stripe_payment_intent_id: intent.id,
            coupon_id: coupon.as_ref().map(|coupon| coupon.id),
            discount_amount: coupon.as_ref().map(|_| discount),
        },
    )
    .await?;

    Ok(ok(json!({
        "client_secret": intent.client_secret,
        "payment_id": payment_id,
        "amount": amount,
    })))
}
