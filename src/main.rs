//! OralScan API Server
//!
//! Startup order: logging, configuration, classification policy, model,
//! storage, router. A missing model or missing storage credentials only
//! disable the endpoints that need them; an invalid policy aborts startup.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oralscan::config::Config;
use oralscan::logic::classifier::Classifier;
use oralscan::logic::decoder::ImageDecoder;
use oralscan::logic::model::{ModelHandle, OnnxEngine};
use oralscan::logic::storage::auth::SCOPE_DRIVE_FILE;
use oralscan::logic::storage::{DriveClient, StorageGateway};
use oralscan::{create_router, AppState, StorageContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (.env may also carry RUST_LOG / LOG_FORMAT)
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();
    tracing::info!("Oral Cancer Detection API starting ({})...", config.environment);

    let policy = config.load_policy().context("invalid classification policy")?;
    tracing::info!("Classification policy: {} ({} zones)", policy.name(), policy.zones().len());

    let model = load_model(&config);
    let storage = connect_storage(&config).await;

    let state = AppState {
        classifier: Arc::new(Classifier::new(policy)),
        decoder: ImageDecoder::new(config.img_size),
        model,
        storage,
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "oralscan=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Load the ONNX model; on failure the service runs without /predict
fn load_model(config: &Config) -> Option<Arc<ModelHandle>> {
    match OnnxEngine::load(&config.model_path) {
        Ok(engine) => Some(Arc::new(ModelHandle::new(Box::new(engine)))),
        Err(e) => {
            tracing::error!("❌ Model unavailable: {}", e);
            None
        }
    }
}

/// Authenticate and resolve the upload folder; on failure storage stays off
async fn connect_storage(config: &Config) -> Option<StorageContext> {
    let credentials = match config.credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::warn!("⚠️ Drive disabled: {}", e);
            return None;
        }
    };

    let client = match DriveClient::new(config.drive_config(), credentials, SCOPE_DRIVE_FILE) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("❌ Drive client setup failed: {}", e);
            return None;
        }
    };

    match client.ensure_folder(&config.drive_folder_name).await {
        Ok(folder_id) => {
            tracing::info!("✅ Drive connected, folder '{}' ({})", config.drive_folder_name, folder_id);
            Some(StorageContext {
                gateway: Arc::new(client),
                folder_id,
            })
        }
        Err(e) => {
            tracing::error!("❌ Drive folder lookup failed: {}", e);
            None
        }
    }
}
