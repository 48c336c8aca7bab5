use actix_web::{post, web, HttpRequest, HttpResponse, Scope};

use coursedeck::crypto::SIGNATURE_HEADER;
use coursedeck::entitlement::{self, EntitlementError, FinalizeOutcome};

use serde::Deserialize;

use serde_json::json;

use sqlx::PgPool;

use crate::app::PaymentGateway;
use crate::controller::{decline, ok};
use crate::error::{RestError, RestResult};

pub fn scope() -> Scope {
    web::scope("/webhooks").service(payment_event)
}

/// Asynchronous notification from the payment processor.
#[derive(Debug, Deserialize)]
struct ProcessorEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: ProcessorEventData,
}

#[derive(Debug, Deserialize)]
struct ProcessorEventData {
    object: ProcessorEventObject,
}

#[derive(Debug, Deserialize)]
struct ProcessorEventObject {
    id: String,
}

/// Inbound processor events. The signature is verified against the raw
/// body before anything is parsed or written; unverifiable events are
/// rejected outright. Redelivered events are acknowledged as no-ops so
/// the processor stops retrying.
#[tracing::instrument(name = "Handle processor event", skip_all)]
#[post("/payment")]
async fn payment_event(
    req: HttpRequest,
    body: web::Bytes,
    pool: web::Data<PgPool>,
    gateway: web::Data<Option<PaymentGateway>>,
) -> RestResult<HttpResponse> {
    let Some(gateway) = gateway.as_ref() else {
        return Err(RestError::FailedToAuthenticate(anyhow::anyhow!(
            "No webhook secret configured"
        )));
    };

    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            RestError::FailedToAuthenticate(anyhow::anyhow!("Missing event signature"))
        })?;
    gateway.verifier.verify(&body, signature)?;

    let event: ProcessorEvent = serde_json::from_slice(&body)
        .map_err(|e| RestError::ParseError(format!("Malformed event payload: {}", e)))?;
    let intent_ref = &event.data.object.id;

    match event.event_type.as_str() {
        "payment_intent.succeeded" => {
            match entitlement::finalize_paid(pool.get_ref(), intent_ref).await {
                Ok(FinalizeOutcome::Granted(grant)) => Ok(ok(json!({
                    "enrollment_id": grant.enrollment_id,
                    "payment_id": grant.payment_id,
                }))),
                Ok(FinalizeOutcome::AlreadyProcessed) => Ok(ok(json!({ "received": true }))),
                // Business conflicts are acknowledged so the processor
                // stops redelivering; they are not server faults.
                Err(err @ (EntitlementError::PaymentNotFound
                | EntitlementError::AlreadyEnrolled
                | EntitlementError::Coupon(_))) => {
                    tracing::warn!(intent_ref, error = %err, "Declined processor event");
                    Ok(decline(err.code(), err.to_string()))
                }
                Err(EntitlementError::Database(e)) => Err(e.into()),
                Err(err) => Err(RestError::InternalError(err.to_string())),
            }
        }
        "payment_intent.payment_failed" => {
            entitlement::mark_failed(pool.get_ref(), intent_ref)
                .await
                .map_err(|err| RestError::InternalError(err.to_string()))?;
            Ok(ok(json!({ "received": true })))
        }
        other => {
            tracing::debug!(event_type = other, "Ignoring unhandled event type");
            Ok(ok(json!({ "received": true })))
        }
    }
}
