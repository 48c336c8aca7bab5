use actix_web::HttpResponse;

use serde::Serialize;

use serde_json::json;

pub mod checkout;
pub mod coupons;
pub mod courses;
pub mod enrollments;
pub mod roles;
pub mod webhooks;

/// Business outcomes ride a 200 with a `success` flag; declines carry a
/// stable machine-readable `code` next to the human-readable `error`.
pub(crate) fn ok(data: impl Serialize) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "data": data,
    }))
}

pub(crate) fn decline(code: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": false,
        "code": code,
        "error": message.into(),
    }))
}
