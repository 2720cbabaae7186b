//! comicgen: turns a story prompt into a multi-panel comic page.
//!
//! A local LLM writes the panel scripts, a ComfyUI server renders each panel,
//! and the compositor lays the results out on an A4 page. When either service
//! is unavailable the pipeline keeps going with fallback scripts and
//! placeholder cards, so a request always ends in a page.

#![allow(clippy::multiple_crate_versions)]
#![deny(clippy::all)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::disallowed_methods)]
#![deny(clippy::expect_used)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::panic)]
#![deny(clippy::perf)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::unreachable)]
#![deny(clippy::unwrap_used)]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod compositor;
pub mod config;
pub mod constants;
pub mod error;
pub mod glyphs;
pub mod layout;
pub mod panels;
pub mod pipeline;
pub mod placeholder;
pub mod prompt;
pub mod render;
pub mod status;
pub mod web;
