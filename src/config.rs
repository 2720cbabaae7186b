//! Config handling

use std::path::PathBuf;
use std::time::Duration;

use tracing::log::LevelFilter;
use url::Url;

use crate::cli::ServiceOptions;
use crate::constants::{
    DEFAULT_COMFYUI_OUTPUT_DIR, DEFAULT_COMICS_DIR, DEFAULT_OLLAMA_MODEL, DEFAULT_POLL_INTERVAL,
    DEFAULT_POLL_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TEMP_DIR, DEFAULT_WORKFLOW_PATH,
};

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("tower_http", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Everything the pipeline components need to know about their surroundings.
///
/// Each component takes this (or the parts it needs) at construction, so tests
/// can point them at mock services and scratch directories.
#[derive(Clone, Debug)]
pub struct ComicConfig {
    /// Base URL of the text-generation service
    pub ollama_url: Url,
    /// Model name for the text-generation service
    pub ollama_model: String,
    /// Base URL of the image-generation service
    pub comfyui_url: Url,
    /// Workflow template submitted per panel
    pub workflow_path: PathBuf,
    /// Finished pages
    pub comics_dir: PathBuf,
    /// Placeholder cards
    pub temp_dir: PathBuf,
    /// Render server output namespace
    pub comfyui_output_dir: PathBuf,
    /// Delay between history polls
    pub poll_interval: Duration,
    /// Budget for one render
    pub poll_timeout: Duration,
    /// Budget for one story generation or render submission
    pub request_timeout: Duration,
}

impl ComicConfig {
    /// Config pointing at the two services with every other setting defaulted.
    pub fn new(ollama_url: Url, comfyui_url: Url) -> Self {
        Self {
            ollama_url,
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            comfyui_url,
            workflow_path: PathBuf::from(DEFAULT_WORKFLOW_PATH),
            comics_dir: PathBuf::from(DEFAULT_COMICS_DIR),
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            comfyui_output_dir: PathBuf::from(DEFAULT_COMFYUI_OUTPUT_DIR),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Creates the output directories if they're missing.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.comics_dir).await?;
        tokio::fs::create_dir_all(&self.temp_dir).await
    }
}

impl From<&ServiceOptions> for ComicConfig {
    fn from(opts: &ServiceOptions) -> Self {
        Self {
            ollama_url: opts.ollama_url.clone(),
            ollama_model: opts.ollama_model.clone(),
            comfyui_url: opts.comfyui_url.clone(),
            workflow_path: opts.workflow_path.clone(),
            comics_dir: opts.comics_dir.clone(),
            temp_dir: opts.temp_dir.clone(),
            comfyui_output_dir: opts.comfyui_output_dir.clone(),
            poll_interval: Duration::from_secs(opts.poll_interval_secs.max(1)),
            poll_timeout: Duration::from_secs(opts.poll_timeout_secs),
            request_timeout: Duration::from_secs(opts.request_timeout_secs.max(1)),
        }
    }
}

/// Joins an API path onto a service base URL, keeping any base path.
pub(crate) fn endpoint(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// A service that accepts connections and never answers.
#[cfg(test)]
pub(crate) async fn silent_service() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind silent listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    Url::parse(&format!("http://{addr}")).expect("silent service url")
}
