use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde_json::json;

use thiserror::Error;

pub type RestResult<T> = Result<T, RestError>;

/// Transport-level failures. Business declines (invalid coupon, already
/// enrolled, ...) are not errors; controllers return them as 200
/// envelopes with `success: false`.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("Parse Error: {0}")]
    ParseError(String),

    #[error("Unauthorized Access: {0}")]
    FailedToAuthenticate(#[source] anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Payment processor unavailable")]
    UpstreamFailure(#[source] anyhow::Error),

    #[error("Internal Server Error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for RestError {
    fn from(_e: sqlx::Error) -> Self {
        Self::InternalError("Database error".into())
    }
}

impl From<coursedeck::error::Error> for RestError {
    fn from(e: coursedeck::error::Error) -> Self {
        use coursedeck::error::Error as E;
        match e {
            E::ParsingError(msg) => Self::ParseError(msg),
            E::SignatureVerification(_) => {
                Self::FailedToAuthenticate(anyhow::anyhow!("Failed to verify event signature"))
            }
            E::PaymentApiError(e) => Self::UpstreamFailure(e.into()),
        }
    }
}

impl ResponseError for RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ParseError(_) => StatusCode::BAD_REQUEST,
            Self::FailedToAuthenticate(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            Self::InternalError(_) | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // No internals leak past this point; details were logged where
        // the error was constructed.
        let message = match self {
            Self::ParseError(msg) => msg.clone(),
            Self::FailedToAuthenticate(_) => "Authentication required".into(),
            Self::Forbidden(msg) => msg.clone(),
            Self::UpstreamFailure(_) => "Payment processor unavailable".into(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".into(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": message,
        }))
    }
}
