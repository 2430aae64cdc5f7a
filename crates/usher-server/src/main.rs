use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use usher_api::{AppState, ResendMailer, router};
use usher_core::{AppConfig, ConsoleEmailProvider, EmailProvider, PgStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
    let base_url =
        std::env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let app_name = std::env::var("APP_NAME").unwrap_or_else(|_| "Usher".to_string());

    let config = AppConfig::new().app_name(app_name).base_url(&base_url);
    config.validate()?;

    let store = PgStore::connect(&database_url).await?;
    store.test_connection().await?;
    tracing::info!("connected to database");

    // Without Resend credentials, emails degrade to log lines; invitations
    // are still persisted and their links can be shared manually.
    let mailer: Arc<dyn EmailProvider> = match (
        std::env::var("RESEND_API_KEY"),
        std::env::var("RESEND_FROM_EMAIL"),
    ) {
        (Ok(api_key), Ok(from)) => Arc::new(ResendMailer::new(api_key, from)),
        _ => {
            tracing::warn!(
                "RESEND_API_KEY / RESEND_FROM_EMAIL not set; falling back to console email output"
            );
            Arc::new(ConsoleEmailProvider)
        }
    };

    let state = AppState::new(config, store).with_mailer(mailer);
    let app = router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "usher server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
