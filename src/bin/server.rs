//! AeroSafe API server entry point.

use std::sync::Arc;

use tracing::info;

use aerosafe::api::{create_api_router, AppState};
use aerosafe::config::ServerConfig;
use aerosafe::database::{PgDocumentStore, PgInvoiceStore, PgUserStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "aerosafe=info,tower_http=debug".to_string()),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env();

    info!("Connecting to database: {}", config.database_url);
    let pool = sqlx::PgPool::connect(&config.database_url).await?;

    let state = AppState::new(
        Arc::new(PgDocumentStore::new(pool.clone())),
        Arc::new(PgUserStore::new(pool.clone())),
        Arc::new(PgInvoiceStore::new(pool)),
    );

    let app = create_api_router(state);

    let addr = config.bind_addr();
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
