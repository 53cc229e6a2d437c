use actix_web::{App, HttpServer, web};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod model;
mod service;

use app::AppState;
use model::Config;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    let state = AppState::new(config).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize application");
        std::io::Error::other(e)
    })?;

    let json_limit = state.json_limit();
    let registry = web::Data::from(state.registry);
    let limits = web::Data::new(state.limits);
    let model = web::Data::new(state.model);

    tracing::info!("Starting Contract Risk Agent server on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(json_limit))
            .app_data(registry.clone())
            .app_data(limits.clone())
            .app_data(model.clone())
            .configure(api::session::configure)
            .configure(api::health::configure)
            .configure(api::openapi::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
