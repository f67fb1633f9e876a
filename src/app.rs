use std::net::SocketAddr;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::AssetBackend;
use crate::state::AppState;
use crate::{auth, projects};

pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::router())
        .merge(projects::router())
        .route("/", get(api_root))
        .route("/health", get(|| async { "ok" }));

    let mut app = Router::new().nest("/api", api);

    // Disk-backed deployments serve uploaded assets directly; inline refs
    // need no fetch at all.
    if state.config.asset_backend == AssetBackend::Disk {
        app = app.nest_service("/uploads", ServeDir::new(&state.config.upload_dir));
    }

    app.with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn api_root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "Listforge API",
        "ai_features_enabled": state.ai.is_some(),
    }))
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
