//! Imports shared by the handler modules

pub(crate) use super::AppState;
pub(crate) use crate::error::ComicError;
pub(crate) use axum::Json;
pub(crate) use axum::extract::State;
pub(crate) use axum::extract::rejection::JsonRejection;
pub(crate) use axum::http::StatusCode;
pub(crate) use axum::response::{IntoResponse, Response};
pub(crate) use serde::Deserialize;
pub(crate) use serde_json::json;
pub(crate) use tracing::{error, info};
