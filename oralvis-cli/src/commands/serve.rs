//! Serve command - run the HTTP server

use std::sync::Arc;

use anyhow::{Context, Result};
use oralvis_core::config::{load_signing_secret, Config};
use oralvis_core::{api, OralVisContext};

use super::ensure_data_dir;

pub async fn run(bind: Option<String>, ephemeral: bool) -> Result<()> {
    let data_dir = ensure_data_dir()?;
    let secret = load_signing_secret()?;

    let mut config = Config::load(&data_dir)?;
    if let Some(bind) = bind {
        config = config.with_bind(&bind);
    }

    let ctx = if ephemeral {
        tracing::warn!("ephemeral mode: scans and accounts are lost on exit");
        OralVisContext::ephemeral(config, &secret)?
    } else {
        OralVisContext::open(&data_dir, config, &secret)
            .with_context(|| format!("Failed to open {:?}", data_dir))?
    };

    ctx.account_service.seed(&ctx.config.seed_accounts).await?;

    let bind = ctx.config.bind.clone();
    api::serve(Arc::new(ctx), &bind, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested");
    }
}
