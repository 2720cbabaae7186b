//! Serving finished comic pages with conditional-request support.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::header::{
    CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use axum::http::response::Builder;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use httpdate::{fmt_http_date, parse_http_date};
use tracing::debug;

use crate::constants::COMIC_CACHE_CONTROL;
use crate::error::ComicError;

/// Cache validators for one page on disk.
#[derive(Clone, Debug)]
pub(crate) struct ComicCacheHeaders {
    etag: Option<HeaderValue>,
    last_modified: Option<HeaderValue>,
    modified_at: Option<SystemTime>,
}

impl ComicCacheHeaders {
    pub(crate) fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let modified_at = metadata.modified().ok();
        let etag = build_etag(metadata.len(), modified_at);
        let last_modified =
            modified_at.and_then(|modified| HeaderValue::from_str(&fmt_http_date(modified)).ok());
        Self {
            etag,
            last_modified,
            modified_at,
        }
    }
}

fn apply_cache_headers(mut builder: Builder, cache: &ComicCacheHeaders) -> Builder {
    builder = builder.header(CACHE_CONTROL, COMIC_CACHE_CONTROL);
    if let Some(etag) = &cache.etag {
        builder = builder.header(ETAG, etag.clone());
    }
    if let Some(last_modified) = &cache.last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified.clone());
    }
    builder
}

/// If-None-Match wins over If-Modified-Since when both are sent.
pub(crate) fn is_not_modified(headers: &HeaderMap, cache: &ComicCacheHeaders) -> bool {
    if let Some(if_none_match) = headers.get(IF_NONE_MATCH) {
        if let Ok(value) = if_none_match.to_str() {
            let value = value.trim();
            if value == "*" {
                return true;
            }
            if let Some(etag) = cache.etag.as_ref().and_then(|value| value.to_str().ok())
                && value.split(',').any(|candidate| candidate.trim() == etag)
            {
                return true;
            }
        }
        return false;
    }

    if let (Some(if_modified_since), Some(modified_at)) =
        (headers.get(IF_MODIFIED_SINCE), cache.modified_at)
        && let Ok(value) = if_modified_since.to_str()
        && let Ok(since) = parse_http_date(value)
        && modified_at <= since
    {
        return true;
    }

    false
}

fn build_etag(size: u64, modified_at: Option<SystemTime>) -> Option<HeaderValue> {
    let suffix = modified_at
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .map(|duration| duration.as_secs())
        .unwrap_or(0);
    HeaderValue::from_str(&format!("W/\"{size}-{suffix}\"")).ok()
}

/// A bare file name: no separators, no parent references, nothing hidden.
pub(crate) fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains(['/', '\\', '\0'])
}

/// Responds with `comics_dir/filename`, or a 304 if the client's copy is current.
pub(crate) async fn serve_comic(
    comics_dir: &Path,
    filename: &str,
    headers: &HeaderMap,
) -> Result<Response, ComicError> {
    if !is_safe_filename(filename) {
        return Err(ComicError::BadRequest(format!(
            "Invalid comic filename: {filename}"
        )));
    }
    let path = comics_dir.join(filename);
    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(ComicError::NotFound(path.display().to_string())),
    };
    let cache = ComicCacheHeaders::from_metadata(&metadata);

    if is_not_modified(headers, &cache) {
        debug!("Comic {} not modified", filename);
        return apply_cache_headers(Response::builder().status(StatusCode::NOT_MODIFIED), &cache)
            .body(Body::empty())
            .map_err(ComicError::from);
    }

    let bytes = tokio::fs::read(&path).await?;
    apply_cache_headers(Response::builder().status(StatusCode::OK), &cache)
        .header(CONTENT_TYPE, "image/png")
        .body(Body::from(bytes))
        .map_err(ComicError::from)
}
