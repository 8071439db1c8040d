use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use super::{ServeArgs, init_store};
use crate::billing::Billing;
use crate::config::ServerConfig;
use crate::lifecycle::Lifecycle;
use crate::server::{AppState, create_router};
use crate::store::{Store, TenantStore};

/// Layers the config file (or defaults) under command-line flags and
/// environment variables.
pub fn resolve_config(args: ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(suffix) = args.public_host_suffix {
        config.public_host_suffix = suffix;
    }
    if let Some(key_id) = args.razorpay_key_id {
        config.billing.key_id = Some(key_id);
    }
    if let Some(key_secret) = args.razorpay_key_secret {
        config.billing.key_secret = Some(key_secret);
    }
    if let Some(webhook_secret) = args.razorpay_webhook_secret {
        config.billing.webhook_secret = Some(webhook_secret);
    }
    if let Some(api_base) = args.razorpay_api_base {
        config.billing.api_base = api_base;
    }

    Ok(config)
}

pub async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = resolve_config(args)?;

    let store = init_store(&config.data_dir)?;
    store.initialize()?;
    if !store.has_platform_admin()? {
        anyhow::bail!(
            "Server not initialized. Run 'schoolhub admin init' first to create the platform admin."
        );
    }
    let store: Arc<dyn Store> = Arc::new(store);

    let billing = Billing::from_config(&config.billing)?;
    if billing.is_none() {
        tracing::warn!("Razorpay keys not configured; billing endpoints are disabled");
    }

    let lifecycle = Lifecycle::new(
        store.clone(),
        config.lifecycle.clone(),
        config.public_host_suffix.clone(),
    );
    tokio::spawn(lifecycle.worker().run());

    let state = Arc::new(AppState {
        store,
        data_dir: config.data_dir.clone(),
        public_host_suffix: config.public_host_suffix.clone(),
        billing,
        lifecycle,
    });

    let app = create_router(state);
    let addr = config
        .socket_addr()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
