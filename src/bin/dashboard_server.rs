use std::sync::Arc;

use gamedash::{
    dashboard_router, init_logging, log_app_bind, log_app_start, log_config_error,
    logging_config_from_env, server_config_from_env, DashboardDataSource, DashboardHub,
    HttpDataSource,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start(&logging_cfg);

    let server_cfg = server_config_from_env().inspect_err(log_config_error)?;

    let source: Arc<dyn DashboardDataSource> =
        Arc::new(HttpDataSource::new(server_cfg.backend.clone())?);
    let hub = Arc::new(DashboardHub::new(source, server_cfg.auto_refresh));
    hub.mount_all()?;

    let app = dashboard_router(Arc::clone(&hub));
    let listener = tokio::net::TcpListener::bind(server_cfg.bind_addr).await?;
    let bound_addr = listener.local_addr()?;

    log_app_bind(bound_addr, server_cfg.auto_refresh);
    axum::serve(listener, app).await?;

    hub.unmount_all();
    Ok(())
}
