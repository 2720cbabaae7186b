//! CLI parser
use clap::{Args, Parser};
use std::num::NonZeroU16;
use std::path::PathBuf;
use url::Url;

use crate::constants::{
    DEFAULT_COMFYUI_OUTPUT_DIR, DEFAULT_COMICS_DIR, DEFAULT_OLLAMA_MODEL, DEFAULT_TEMP_DIR,
    DEFAULT_WORKFLOW_PATH,
};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "COMICGEN_DEBUG")]
    /// Enable debug logging. Env: COMICGEN_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "5000", env = "COMICGEN_PORT")]
    /// http listener, defaults to `5000`.
    /// Env: COMICGEN_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "COMICGEN_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: COMICGEN_LISTEN_ADDRESS
    pub listen_address: String,

    #[command(flatten)]
    /// Where the backing services live and where output goes
    pub services: ServiceOptions,
}

/// Options shared by the server and the one-shot generator.
#[derive(Args, Debug, Clone)]
pub struct ServiceOptions {
    #[clap(long, default_value = "http://localhost:11434", env = "COMICGEN_OLLAMA_URL")]
    /// Base URL of the text-generation service.
    /// Env: COMICGEN_OLLAMA_URL
    pub ollama_url: Url,
    #[clap(long, default_value = DEFAULT_OLLAMA_MODEL, env = "COMICGEN_OLLAMA_MODEL")]
    /// Model name passed to the text-generation service.
    /// Env: COMICGEN_OLLAMA_MODEL
    pub ollama_model: String,
    #[clap(long, default_value = "http://127.0.0.1:8000", env = "COMICGEN_COMFYUI_URL")]
    /// Base URL of the image-generation service.
    /// Env: COMICGEN_COMFYUI_URL
    pub comfyui_url: Url,
    #[clap(long, default_value = DEFAULT_WORKFLOW_PATH, env = "COMICGEN_WORKFLOW_PATH")]
    /// API-format workflow JSON submitted per panel.
    /// Env: COMICGEN_WORKFLOW_PATH
    pub workflow_path: PathBuf,
    #[clap(long, default_value = DEFAULT_COMICS_DIR, env = "COMICGEN_COMICS_DIR")]
    /// Finished comic pages, eg `/data/comics`.
    /// Env: COMICGEN_COMICS_DIR
    pub comics_dir: PathBuf,
    #[clap(long, default_value = DEFAULT_TEMP_DIR, env = "COMICGEN_TEMP_DIR")]
    /// Placeholder and scratch images.
    /// Env: COMICGEN_TEMP_DIR
    pub temp_dir: PathBuf,
    #[clap(
        long,
        default_value = DEFAULT_COMFYUI_OUTPUT_DIR,
        env = "COMICGEN_COMFYUI_OUTPUT_DIR"
    )]
    /// The render server's output directory as seen from here.
    /// Env: COMICGEN_COMFYUI_OUTPUT_DIR
    pub comfyui_output_dir: PathBuf,
    #[clap(long, default_value = "2", env = "COMICGEN_POLL_INTERVAL_SECS")]
    /// Seconds between render history polls.
    /// Env: COMICGEN_POLL_INTERVAL_SECS
    pub poll_interval_secs: u64,
    #[clap(long, default_value = "300", env = "COMICGEN_POLL_TIMEOUT_SECS")]
    /// Seconds before a single render is abandoned.
    /// Env: COMICGEN_POLL_TIMEOUT_SECS
    pub poll_timeout_secs: u64,
    #[clap(long, default_value = "120", env = "COMICGEN_REQUEST_TIMEOUT_SECS")]
    /// Seconds before a story or submit request is abandoned.
    /// Env: COMICGEN_REQUEST_TIMEOUT_SECS
    pub request_timeout_secs: u64,
}
