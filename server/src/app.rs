use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use coursedeck::client::PaymentClient;
use coursedeck::crypto::WebhookVerifier;

use sqlx::PgPool;

use tracing_actix_web::TracingLogger;

use crate::auth::LeaderPrincipal;
use crate::controller::{checkout, coupons, courses, enrollments, roles, webhooks};
use crate::settings::PaymentSettings;

/// Everything the paid path needs: the outbound intent client and the
/// inbound event verifier. Absent when no processor is configured.
pub struct PaymentGateway {
    pub client: PaymentClient,
    pub verifier: WebhookVerifier,
}

impl PaymentGateway {
    pub fn from_settings(settings: &PaymentSettings) -> anyhow::Result<Self> {
        let client = PaymentClient::new(
            settings.api_timeout(),
            settings.api_base_url(),
            settings.secret_key().into(),
        )?;
        let verifier = WebhookVerifier::new(settings.webhook_secret());

        Ok(Self { client, verifier })
    }
}

/// Simple health-check endpoint
#[tracing::instrument(name = "Health check")]
#[get("/health_check")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("I am alive")
}

/// Run the application on a specified TCP listener
pub fn run(
    listener: TcpListener,
    pool: PgPool,
    gateway: Option<PaymentGateway>,
    leader: LeaderPrincipal,
) -> anyhow::Result<Server> {
    // Wrap application data
    let pool = web::Data::new(pool);
    let gateway = web::Data::new(gateway);
    let leader = web::Data::new(leader);

    // Start the server
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(pool.clone())
            .app_data(gateway.clone())
            .app_data(leader.clone())
            .service(health_check)
            .service(courses::scope())
            .service(coupons::scope())
            .service(checkout::scope())
            .service(enrollments::scope())
            .service(webhooks::scope())
            .service(coupons::admin_scope())
            .service(enrollments::admin_scope())
            .service(roles::scope())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
