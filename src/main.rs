use anyhow::{Context, Result};
use reqwest::Client;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use minivan_rent::{build_app, catalog::CatalogHandle, config::Settings, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "minivan_rent=info,tower_http=info".into()))
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing MinivanRent server...");

    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            return Err(e);
        }
    };

    let addr: SocketAddr = settings
        .server_address
        .parse()
        .with_context(|| format!("Invalid server address format: {}", settings.server_address))?;

    let http_client = Client::builder()
        .user_agent(concat!("minivan_rent/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build shared reqwest client")?;

    // Pages render a loading notice until this finishes
    let catalog = CatalogHandle::loading();
    let data_source = settings.data_source();
    let app_state = AppState::new(settings, http_client, catalog.clone());
    catalog.spawn_load(data_source, Arc::clone(&app_state.http_client));

    let app = build_app(app_state);

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
