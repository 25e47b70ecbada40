//! HTTP server for the prediction API, built on axum.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::config::ExovisionConfig;
use crate::model::ModelStore;
use crate::predictor::Predictor;

/// Thread-safe shared gateway reference for axum handlers.
///
/// Everything mutable lives behind the [`ModelStore`], so no outer lock is
/// needed.
pub type SharedGateway = Arc<GatewayServer>;

/// The prediction API server state.
pub struct GatewayServer {
    config: ExovisionConfig,
    store: Arc<ModelStore>,
    predictor: Predictor,
}

impl std::fmt::Debug for GatewayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayServer")
            .field("bind_addr", &self.config.bind_addr())
            .field("artifact_path", &self.store.artifact_path())
            .field("model_loaded", &self.store.is_loaded())
            .finish()
    }
}

impl GatewayServer {
    /// Create a server with an empty model store. Call
    /// [`ModelStore::load`] through [`store`](Self::store) to load the
    /// configured artifact.
    pub fn new(config: ExovisionConfig) -> Self {
        let store = Arc::new(ModelStore::new(
            config.model.clone(),
            config.features.clone(),
        ));
        Self::with_store(config, store)
    }

    /// Create a server around an existing store.
    pub fn with_store(config: ExovisionConfig, store: Arc<ModelStore>) -> Self {
        let predictor = Predictor::new(Arc::clone(&store), &config.prediction);
        Self {
            config,
            store,
            predictor,
        }
    }

    pub fn config(&self) -> &ExovisionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }
}

/// Build the axum router with all prediction routes.
pub fn router(shared: SharedGateway) -> Router {
    let body_limit = shared.config().server.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/model/info", get(handlers::model_info))
        .route("/model/reload", post(handlers::reload_model))
        .route("/predict", post(handlers::predict))
        .route("/predict/extended", post(handlers::predict_extended))
        .route("/predict/batch", post(handlers::predict_batch))
        .route("/predict/file", post(handlers::predict_file))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the server on the configured address.
///
/// Runs until Ctrl-C is received, then drains in-flight requests.
pub async fn run(gw: SharedGateway) -> Result<(), std::io::Error> {
    let addr = gw.config().bind_addr();
    let app = router(gw);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Prediction API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Prediction API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
