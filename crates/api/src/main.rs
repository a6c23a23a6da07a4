use tierlink_infra::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tierlink_observability::init();

    let settings = Settings::from_env()?;
    let service = tierlink_api::app::services::build_service(&settings).await?;
    // Only validates REDIS_URL; no connection is made until the lock is used.
    let _identify_lock = tierlink_api::app::services::build_identify_lock(&settings)?;
    let app = tierlink_api::app::build_app(service);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
