//! HTTP front end for the comic pipeline

use std::num::NonZeroU16;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, header::CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ComicConfig;
use crate::error::ComicError;
use crate::pipeline::ComicPipeline;

mod api;
mod images;
mod prelude;
mod views;

use api::{
    generate_comic_handler, generate_panel_handler, generate_story_handler, layouts_handler,
    status_handler,
};
use views::index_handler;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    pipeline: Arc<ComicPipeline>,
    comics_dir: PathBuf,
}

impl AppState {
    fn new(config: &ComicConfig) -> Self {
        Self {
            pipeline: Arc::new(ComicPipeline::new(config)),
            comics_dir: config.comics_dir.clone(),
        }
    }
}

async fn comic_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ComicError> {
    images::serve_comic(&state.comics_dir, &filename, &headers).await
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(index_handler))
        .route("/static/styles.css", axum::routing::get(styles_handler))
        .route("/api/status", axum::routing::get(status_handler))
        .route("/api/layouts", axum::routing::get(layouts_handler))
        .route(
            "/api/generate_story",
            axum::routing::post(generate_story_handler),
        )
        .route(
            "/api/generate_panel",
            axum::routing::post(generate_panel_handler),
        )
        .route(
            "/api/generate_comic",
            axum::routing::post(generate_comic_handler),
        )
        .route("/comics/{filename}", axum::routing::get(comic_handler))
        .layer(TraceLayer::new_for_http())
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

/// Binds the listener and serves until ctrl-c.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    config: &ComicConfig,
) -> Result<(), anyhow::Error> {
    config.ensure_dirs().await?;
    let app = create_router().with_state(AppState::new(config));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
