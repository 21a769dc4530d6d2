use std::sync::Arc;

use anyhow::Context;

use wms_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    wms_observability::init(config.log_format);

    let services = wms_api::app::services::build_services(&config)
        .await
        .context("failed to initialize stores")?;
    let adjust_policy = services.adjuster.policy();
    let app = wms_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        persistent = config.use_persistent_stores(),
        adjust_policy = %adjust_policy,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
