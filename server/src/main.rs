use std::net::TcpListener;

use anyhow::Context;

use sqlx::PgPool;

use server::app::{self, PaymentGateway};
use server::auth::LeaderPrincipal;
use server::settings::Settings;
use server::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = telemetry::create_subscriber("info".into(), std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let settings = Settings::load().expect("Failed to load settings");

    let pool = PgPool::connect_with(settings.database.with_db()).await?;

    let gateway = match &settings.payment {
        Some(payment) => Some(PaymentGateway::from_settings(payment)?),
        None => {
            tracing::warn!("No payment processor configured; paid checkout is disabled");
            None
        }
    };
    let leader = LeaderPrincipal::new(settings.access.leader_email());

    let listener = TcpListener::bind(settings.app.addr())?;

    app::run(listener, pool, gateway, leader)?
        .await
        .context("Failed to run app")
}
