//! HTTP boundary.
//!
//! Exactly one route: `POST /analyze-health-data`. The handler re-imports
//! the configured export file, ingests it into the retention store, and
//! runs the full specialist fan-out synchronously. Any core failure comes
//! back as a 500 with the error message; there are no partial results.

use crate::coordinator::HealthCoordinator;
use crate::gateway::{ChatModel, EmbeddingModel};
use crate::import;
use crate::models::{AnalysisReport, SpecialtyProfile};
use crate::store::RetentionStore;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared state behind the analysis endpoint.
///
/// The retention store is the only mutable piece; ingest calls are
/// serialized through the mutex to keep the single-writer discipline.
pub struct AppState<M> {
    pub model: Arc<M>,
    pub store: Arc<Mutex<RetentionStore>>,
    pub profiles: Arc<Vec<SpecialtyProfile>>,
    pub csv_path: PathBuf,
}

impl<M> Clone for AppState<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            store: Arc::clone(&self.store),
            profiles: Arc::clone(&self.profiles),
            csv_path: self.csv_path.clone(),
        }
    }
}

/// Build the single-endpoint router. CORS is wide open so a local
/// dashboard can call it directly.
pub fn router<M>(state: AppState<M>) -> Router
where
    M: ChatModel + EmbeddingModel + 'static,
{
    Router::new()
        .route("/analyze-health-data", post(analyze_health_data::<M>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve<M>(state: AppState<M>, port: u16) -> Result<()>
where
    M: ChatModel + EmbeddingModel + 'static,
{
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on http://{addr}");
    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}

async fn analyze_health_data<M>(State(state): State<AppState<M>>) -> Response
where
    M: ChatModel + EmbeddingModel + 'static,
{
    match run_analysis(&state).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!("Health analysis failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn run_analysis<M>(state: &AppState<M>) -> Result<AnalysisReport>
where
    M: ChatModel + EmbeddingModel,
{
    let payload = import::parse_health_export(&state.csv_path)?;

    let context = {
        let mut store = state.store.lock().await;
        store
            .ingest(state.model.as_ref(), payload, Utc::now())
            .await?;
        store
            .current_context()
            .cloned()
            .context("No health documents ingested")?
    };

    let coordinator = HealthCoordinator::new(&state.profiles, state.model.as_ref());
    let report = coordinator.run_analyses(&context).await?;
    Ok(report)
}
