//! Entry point for the Table Billing binary.
//!
//! Running this binary starts an HTTP server that builds bills from
//! completed orders and manages GST settings.  The listen address and
//! the settings directory come from `BILLING_BIND_ADDR` and
//! `BILLING_SETTINGS_DIR` (see [`table_billing::config::Config`]); log
//! output is filtered with `RUST_LOG`.

use table_billing::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "table_billing=info".into()),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(bind_addr = %config.bind_addr, "starting table billing");

    if let Err(err) = table_billing::api::serve(&config).await {
        tracing::error!(error = %err, "server stopped");
        return Err(err);
    }
    Ok(())
}
