use anyhow::{Context, Result};
use mailchimp_plugin::api::{create_router, ApiState};
use mailchimp_plugin::config::{PluginConfig, CONFIG_PATH_ENV};
use mailchimp_plugin::connection::MailchimpConnection;
use mailchimp_plugin::registry::build_registry;
use std::sync::Arc;
use tablekit::config::load_from_env;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailchimp_plugin=info,tablekit=info".into()),
        )
        .init();

    info!("Mailchimp plugin starting...");

    let config: PluginConfig =
        load_from_env(CONFIG_PATH_ENV).context("Failed to load plugin configuration")?;
    let address = config.server.address();

    info!(
        connection = %config.connection.name,
        address = %address,
        timeout_secs = config.connection.timeout_secs,
        "Configuration loaded"
    );

    // Credentials are resolved lazily; a missing key surfaces on first query
    let connection = Arc::new(MailchimpConnection::new(config.connection));
    let registry = build_registry(connection);
    info!(tables = registry.len(), "Tables registered");

    let router = create_router(ApiState {
        registry: Arc::new(registry),
    });
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!(address = %address, "Table API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Table API server error")?;

    info!("Mailchimp plugin stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl_c signal");
        return;
    }
    info!("Shutdown signal received");
}
