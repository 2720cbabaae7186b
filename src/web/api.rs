//! JSON API handlers

use std::num::NonZeroUsize;
use std::path::Path;

use axum::http::header::CONTENT_TYPE;
use chrono::Utc;

use super::prelude::*;
use crate::constants::{
    DEFAULT_LAYOUT_PRESET, DEFAULT_PAGE_FORMAT, DEFAULT_PANELS, DEFAULT_STYLE, MAX_PANELS,
};
use crate::layout::{LayoutGeometry, PageFormat, preset_summaries};
use crate::pipeline::ComicRequest;

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

fn default_num_panels() -> i64 {
    DEFAULT_PANELS as i64
}

fn default_layout_preset() -> String {
    DEFAULT_LAYOUT_PRESET.to_string()
}

fn default_page() -> String {
    DEFAULT_PAGE_FORMAT.to_string()
}

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Panel counts outside `1..=MAX_PANELS` are rejected.
pub(crate) fn panel_count(num_panels: i64) -> Result<NonZeroUsize, ComicError> {
    usize::try_from(num_panels)
        .ok()
        .filter(|count| *count <= MAX_PANELS)
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| {
            ComicError::BadRequest(format!(
                "num_panels must be between 1 and {MAX_PANELS}, got {num_panels}"
            ))
        })
}

fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, ComicError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ComicError::BadRequest(format!("{field} is required")));
    }
    Ok(value)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StoryRequest {
    #[serde(default)]
    prompt: String,
    #[serde(default = "default_style")]
    style: String,
    #[serde(default = "default_num_panels")]
    num_panels: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PanelRequest {
    #[serde(default)]
    description: String,
    #[serde(default = "default_style")]
    style: String,
    #[serde(default)]
    panel_index: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ComicPayload {
    #[serde(default)]
    prompt: String,
    #[serde(default = "default_style")]
    style: String,
    #[serde(default = "default_num_panels")]
    num_panels: i64,
    #[serde(default = "default_layout_preset")]
    layout_preset: String,
    #[serde(default = "default_page")]
    page: String,
    #[serde(default)]
    geometry: Option<LayoutGeometry>,
}

/// GET /api/status
pub(crate) async fn status_handler(State(state): State<AppState>) -> Response {
    let (ollama, comfyui) = tokio::join!(
        state.pipeline.text_service_status(),
        state.pipeline.render_service_status()
    );
    Json(json!({"ollama": ollama, "comfyui": comfyui})).into_response()
}

/// GET /api/layouts
pub(crate) async fn layouts_handler() -> Response {
    Json(json!({"layouts": preset_summaries()})).into_response()
}

/// POST /api/generate_story
pub(crate) async fn generate_story_handler(
    State(state): State<AppState>,
    payload: Result<Json<StoryRequest>, JsonRejection>,
) -> Result<Response, ComicError> {
    let Json(request) = payload?;
    let prompt = require_text("prompt", &request.prompt)?;
    let count = panel_count(request.num_panels)?;
    info!(
        "Generating story for prompt: {}...",
        prompt.chars().take(100).collect::<String>()
    );

    let panels = state
        .pipeline
        .generate_story(prompt, count, &request.style)
        .await;
    Ok(Json(json!({
        "success": true,
        "panels": panels,
        "timestamp": timestamp(),
    }))
    .into_response())
}

fn image_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "image/png",
    }
}

/// POST /api/generate_panel, responds with the image itself
pub(crate) async fn generate_panel_handler(
    State(state): State<AppState>,
    payload: Result<Json<PanelRequest>, JsonRejection>,
) -> Result<Response, ComicError> {
    let Json(request) = payload?;
    let description = require_text("description", &request.description)?;
    info!("Generating panel {}", request.panel_index);

    let path = state
        .pipeline
        .render_panel(description, &request.style, request.panel_index)
        .await;
    let bytes = tokio::fs::read(&path).await.map_err(|err| {
        error!("Failed to read panel image {}: {}", path.display(), err);
        ComicError::InternalServerError(format!("panel image unavailable: {err}"))
    })?;
    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, image_content_type(&path))],
        bytes,
    )
        .into_response())
}

/// POST /api/generate_comic
pub(crate) async fn generate_comic_handler(
    State(state): State<AppState>,
    payload: Result<Json<ComicPayload>, JsonRejection>,
) -> Result<Response, ComicError> {
    let Json(payload) = payload?;
    let prompt = require_text("prompt", &payload.prompt)?.to_string();
    let panel_count = panel_count(payload.num_panels)?;
    let page_format = PageFormat::from_id(&payload.page);

    if let Some(geometry) = &payload.geometry
        && !geometry.cells.is_empty()
        && !geometry.fits(page_format.size())
    {
        return Err(ComicError::BadRequest(format!(
            "outerMarginPx {} leaves no room on the page",
            geometry.outer_margin_px
        )));
    }

    let comic_path = state
        .pipeline
        .create_comic(ComicRequest {
            prompt,
            style: payload.style,
            panel_count,
            layout_preset: payload.layout_preset,
            page_format,
            geometry: payload.geometry,
        })
        .await?;
    let filename = comic_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            ComicError::InternalServerError(format!(
                "comic path has no file name: {}",
                comic_path.display()
            ))
        })?;

    Ok(Json(json!({
        "success": true,
        "comic_url": format!("/comics/{filename}"),
        "timestamp": timestamp(),
    }))
    .into_response())
}
