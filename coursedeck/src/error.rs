pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Parsing errors
    #[error("{0}")]
    ParsingError(String),
    // Webhook signature errors
    #[error("Failed to verify event signature")]
    SignatureVerification(String),
    // Payment processor client errors
    #[error("Payment processor request failed: {0}")]
    PaymentApiError(reqwest::Error),
}
