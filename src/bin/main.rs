use std::{env, error::Error, net::SocketAddr, sync::Arc};

use log::info;
use tracing_subscriber::EnvFilter;

use quest_overflow::{
    app::{self, AppServices, Backend},
    resources::levels::LevelTable,
    settings::{Settings, DEFAULT_SETTINGS_PATH},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Setup tracing_subscriber
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    // Setup state
    let settings_path = env::var("SETTINGS_PATH").unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    let settings = Settings::load(&settings_path)?;
    let levels = Arc::new(LevelTable::load(&settings.resources_path)?);

    let backend = Backend::connect_or_fallback(&settings.database_url).await;
    let services = AppServices::new(&backend, levels, &settings);
    let app = app::router(services, &settings.uploads.dir);

    let addr: SocketAddr = settings.addr.parse()?;
    info!("Listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service()).await?;

    Ok(())
}
