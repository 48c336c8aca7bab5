use std::convert::Infallible;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use reqwest::Client;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use secrecy::Secret;

use serde::Deserialize;

use url::Url;

use uuid::Uuid;

use crate::error::{Error, Result};

/// REST client for the payment processor's intent API.
#[derive(Debug)]
pub struct PaymentClient {
    client: Client,

    api_create_intent_url: Url,
    secret_key: ProcessorSecretKey,
}

impl PaymentClient {
    pub fn new(
        api_timeout: Duration,
        api_base_url: Url,
        secret_key: ProcessorSecretKey,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_create_intent_url = api_base_url
            .join("v1/payment_intents")
            .context("Failed to create payment intent endpoint URL")?;

        Ok(Self {
            client,
            api_create_intent_url,
            secret_key,
        })
    }

    /// Ask the processor for a payment intent. The returned client secret
    /// goes back to the browser; the id binds our PENDING payment row to
    /// the processor's asynchronous outcome.
    pub async fn create_intent(
        &self,
        amount: Decimal,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<PaymentIntent> {
        use secrecy::ExposeSecret;

        let amount_cents = (amount * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .ok_or_else(|| Error::ParsingError("Amount out of range for the processor API".into()))?;

        let params = [
            ("amount", amount_cents.to_string()),
            ("currency", "usd".to_string()),
            ("metadata[student_id]", student_id.to_string()),
            ("metadata[course_id]", course_id.to_string()),
        ];

        let intent: PaymentIntent = self
            .client
            .post(self.api_create_intent_url.clone())
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params)
            .send()
            .await
            .map_err(Error::PaymentApiError)?
            .error_for_status()
            .map_err(Error::PaymentApiError)?
            .json()
            .await
            .map_err(Error::PaymentApiError)?;

        Ok(intent)
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct ProcessorSecretKey(Secret<String>);

impl FromStr for ProcessorSecretKey {
    type Err = Infallible;

    fn from_str(value: &str) -> std::result::Result<Self, Infallible> {
        Ok(Self(Secret::new(value.to_string())))
    }
}

impl From<Secret<String>> for ProcessorSecretKey {
    fn from(value: Secret<String>) -> Self {
        Self(value)
    }
}

impl secrecy::ExposeSecret<String> for ProcessorSecretKey {
    fn expose_secret(&self) -> &String {
        use secrecy::ExposeSecret;
        self.0.expose_secret()
    }
}
