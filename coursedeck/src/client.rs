mod payment_client;

pub use payment_client::{PaymentClient, PaymentIntent, ProcessorSecretKey};
