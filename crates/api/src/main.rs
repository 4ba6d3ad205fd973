mod config;
mod error;
mod handlers;
mod metrics;

use anyhow::{Context, Result};
use ner::{EntityModel, GazetteerModel, Pipeline, RemoteModel};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use config::{AppConfig, LogFormat, ModelBackend, ModelConfig};
use handlers::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    // Load the model once; requests fail fast if this does not succeed
    let pipeline = match load_model(&config.model).await {
        Ok(model) => Some(Pipeline::new(model)),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "NER model failed to load; serving without it");
            None
        }
    };

    let backend = match config.model.backend {
        ModelBackend::Remote => "remote",
        ModelBackend::Gazetteer => "gazetteer",
    };
    let state = Arc::new(AppState::new(pipeline, backend));

    let mut app = handlers::router(state);
    if config.server.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn load_model(config: &ModelConfig) -> Result<Arc<dyn EntityModel>> {
    let model: Arc<dyn EntityModel> = match config.backend {
        ModelBackend::Remote => Arc::new(
            RemoteModel::load(
                config.url.clone(),
                config.model_name.clone(),
                Duration::from_secs(config.timeout_secs),
            )
            .await?,
        ),
        ModelBackend::Gazetteer => Arc::new(GazetteerModel::load(&config.gazetteer_path).await?),
    };
    Ok(model)
}
