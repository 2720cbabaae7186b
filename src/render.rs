//! Image render client: one workflow job per panel against the render queue.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use md5::{Digest, Md5};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::{ComicConfig, endpoint};
use crate::constants::{
    MAX_SEED, NODE_POSITIVE_PROMPT, NODE_SAMPLER_SEED, NODE_UPSCALE_SEED, QUALITY_PREFIX,
    QUALITY_SUFFIX, UPSCALE_SEED_OFFSET,
};
use crate::placeholder::PlaceholderRenderer;
use crate::status::{ServiceStatus, check_liveness};

/// What to render.
#[derive(Clone, Debug)]
pub struct RenderRequest {
    /// Enhanced panel prompt
    pub prompt: String,
    /// Comic style, used for placeholder styling
    pub style: String,
    /// `-1` picks random seeds
    pub seed: i64,
    /// Panel number, for the placeholder header
    pub panel_index: usize,
}

/// Lifecycle of a render job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    /// Accepted by the queue
    Submitted,
    /// Waiting on history
    Polling,
    /// An image came back
    Completed,
    /// The server reported an execution error
    Failed,
    /// Gave up waiting
    TimedOut,
}

impl JobStatus {
    fn rank(self) -> u8 {
        match self {
            JobStatus::Submitted => 0,
            JobStatus::Polling => 1,
            JobStatus::Completed | JobStatus::Failed | JobStatus::TimedOut => 2,
        }
    }

    /// Terminal states never change again
    pub fn is_terminal(self) -> bool {
        self.rank() == 2
    }
}

/// A submitted job and where it is in its lifecycle.
#[derive(Debug)]
pub struct RenderJob {
    /// Prompt as submitted
    pub prompt: String,
    /// Seed the caller asked for
    pub seed: i64,
    /// Id the queue knows the job by
    pub job_id: String,
    status: JobStatus,
}

impl RenderJob {
    /// A job that's just been accepted by the queue.
    pub fn submitted(prompt: &str, seed: i64, job_id: String) -> Self {
        Self {
            prompt: prompt.to_string(),
            seed,
            job_id,
            status: JobStatus::Submitted,
        }
    }

    /// Current status
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Moves the job forward. Backward moves and moves out of a terminal
    /// state are refused and return false.
    pub fn advance(&mut self, next: JobStatus) -> bool {
        if self.status.is_terminal() || next.rank() <= self.status.rank() {
            warn!(
                "Ignoring render job {} transition {:?} -> {:?}",
                self.job_id, self.status, next
            );
            return false;
        }
        debug!("Render job {}: {:?} -> {:?}", self.job_id, self.status, next);
        self.status = next;
        true
    }
}

/// Sampler and upscaler seeds for a requested seed.
///
/// `-1` draws both independently; a positive seed pins the sampler and puts
/// the upscaler [`UPSCALE_SEED_OFFSET`] above it; anything else is used for
/// both as-is.
pub fn resolve_seeds(seed: i64) -> (i64, i64) {
    if seed == -1 {
        (
            rand::random_range(1..=MAX_SEED),
            rand::random_range(1..=MAX_SEED),
        )
    } else if seed > 0 {
        (seed, seed.saturating_add(UPSCALE_SEED_OFFSET))
    } else {
        (seed, seed)
    }
}

/// Writes the prompt and seeds into the workflow's known nodes.
///
/// Nodes the template doesn't have are left alone.
pub fn apply_workflow(workflow: &mut Value, prompt: &str, seeds: (i64, i64)) {
    let styled_prompt = format!("{QUALITY_PREFIX}{prompt}{QUALITY_SUFFIX}");
    let updates = [
        (NODE_POSITIVE_PROMPT, "text", json!(styled_prompt)),
        (NODE_SAMPLER_SEED, "seed", json!(seeds.0)),
        (NODE_UPSCALE_SEED, "seed", json!(seeds.1)),
    ];
    for (node, field, value) in updates {
        match workflow
            .get_mut(node)
            .and_then(|node| node.get_mut("inputs"))
            .and_then(Value::as_object_mut)
        {
            Some(inputs) => {
                inputs.insert(field.to_string(), value);
                debug!("Updated {field} in node {node}");
            }
            None => debug!("Workflow has no node {node}, skipping {field}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    #[serde(default)]
    prompt_id: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct ImageRef {
    filename: String,
    #[serde(default)]
    subfolder: String,
}

#[derive(Debug, PartialEq, Eq)]
enum PollOutcome {
    Pending,
    Ready(ImageRef),
    Failed(String),
}

/// Reads a `/history/{id}` body. Output nodes are checked in the order the
/// server sent them and the first image of the first node with any wins.
fn parse_history(history: &Value, job_id: &str) -> Result<PollOutcome> {
    let Some(entry) = history.get(job_id) else {
        return Ok(PollOutcome::Pending);
    };

    if let Some(outputs) = entry.get("outputs").and_then(Value::as_object) {
        debug!(
            "Found outputs for {}: {:?}",
            job_id,
            outputs.keys().collect::<Vec<_>>()
        );
        for output in outputs.values() {
            if let Some(first) = output
                .get("images")
                .and_then(Value::as_array)
                .and_then(|images| images.first())
            {
                let image: ImageRef = serde_json::from_value(first.clone())
                    .context("History image entry is malformed")?;
                return Ok(PollOutcome::Ready(image));
            }
        }
    }

    let status = entry.get("status");
    if status.and_then(|s| s.get("status_str")).and_then(Value::as_str) == Some("error") {
        return Ok(PollOutcome::Failed(
            status.map(Value::to_string).unwrap_or_default(),
        ));
    }
    Ok(PollOutcome::Pending)
}

/// Client for the render queue.
#[derive(Clone, Debug)]
pub struct RenderClient {
    client: reqwest::Client,
    base_url: url::Url,
    workflow_path: PathBuf,
    output_dir: PathBuf,
    poll_interval: Duration,
    poll_timeout: Duration,
    request_timeout: Duration,
    placeholders: PlaceholderRenderer,
}

impl RenderClient {
    /// Client for the render service named in `config`.
    pub fn new(config: &ComicConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.comfyui_url.clone(),
            workflow_path: config.workflow_path.clone(),
            output_dir: config.comfyui_output_dir.clone(),
            poll_interval: config.poll_interval,
            poll_timeout: config.poll_timeout,
            request_timeout: config.request_timeout,
            placeholders: PlaceholderRenderer::new(config.temp_dir.clone()),
        }
    }

    /// Renders one image and returns its path.
    ///
    /// Doesn't fail: whatever goes wrong, the caller gets the path of a
    /// placeholder card carrying the prompt instead.
    pub async fn render(&self, request: &RenderRequest) -> PathBuf {
        info!(
            "Starting image generation for prompt: {}...",
            request.prompt.chars().take(50).collect::<String>()
        );
        match self.try_render(request).await {
            Ok(path) => {
                info!("Image generated successfully: {}", path.display());
                path
            }
            Err(err) => {
                error!("Failed to generate image: {:#}", err);
                self.placeholder(request).await
            }
        }
    }

    async fn try_render(&self, request: &RenderRequest) -> Result<PathBuf> {
        let mut workflow = self.load_workflow().await?;
        apply_workflow(&mut workflow, &request.prompt, resolve_seeds(request.seed));

        info!("Submitting workflow to ComfyUI...");
        let job_id = self.queue_prompt(&workflow).await?;
        let mut job = RenderJob::submitted(&request.prompt, request.seed, job_id);

        let image = self.wait_for_completion(&mut job).await?;
        Ok(self.resolve_output(&image))
    }

    async fn load_workflow(&self) -> Result<Value> {
        debug!("Loading workflow from {}", self.workflow_path.display());
        let bytes = tokio::fs::read(&self.workflow_path)
            .await
            .with_context(|| format!("Failed to load workflow {}", self.workflow_path.display()))?;
        let workflow: Value = serde_json::from_slice(&bytes).with_context(|| {
            format!("Workflow {} is not valid JSON", self.workflow_path.display())
        })?;
        debug!(
            "Workflow loaded with {} nodes",
            workflow.as_object().map(|nodes| nodes.len()).unwrap_or(0)
        );
        Ok(workflow)
    }

    /// Queues the workflow and returns the id to poll.
    ///
    /// A server that omits `prompt_id` leaves us with our own client id,
    /// which history won't know, so such a job can only time out.
    async fn queue_prompt(&self, workflow: &Value) -> Result<String> {
        let client_id = uuid::Uuid::new_v4().to_string();
        let body = json!({ "prompt": workflow, "client_id": client_id });

        let resp = self
            .client
            .post(endpoint(&self.base_url, "prompt"))
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .context("Request to /prompt failed")?;

        let status = resp.status();
        let bytes = resp.bytes().await.context("Failed reading /prompt body")?;
        if status != reqwest::StatusCode::OK {
            return Err(anyhow!(
                "Failed to queue prompt: {status} - {}",
                String::from_utf8_lossy(&bytes)
            ));
        }

        let parsed: QueueResponse =
            serde_json::from_slice(&bytes).context("Failed to parse /prompt JSON")?;
        let job_id = match parsed.prompt_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                warn!("Queue response had no prompt_id, polling with client id {client_id}");
                client_id
            }
        };
        info!("Prompt queued successfully with ID: {}", job_id);
        Ok(job_id)
    }

    async fn wait_for_completion(&self, job: &mut RenderJob) -> Result<ImageRef> {
        info!(
            "Waiting for completion of prompt {}, timeout: {}s",
            job.job_id,
            self.poll_timeout.as_secs()
        );
        job.advance(JobStatus::Polling);

        let job_id = job.job_id.clone();
        let waited = tokio::time::timeout(self.poll_timeout, async {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.poll_once(&job_id).await {
                    Ok(PollOutcome::Ready(image)) => return Ok(image),
                    Ok(PollOutcome::Failed(detail)) => return Err(detail),
                    Ok(PollOutcome::Pending) => debug!("Still waiting for {}", job_id),
                    Err(err) => warn!("Error checking completion: {:#}", err),
                }
            }
        })
        .await;

        match waited {
            Ok(Ok(image)) => {
                job.advance(JobStatus::Completed);
                Ok(image)
            }
            Ok(Err(detail)) => {
                job.advance(JobStatus::Failed);
                Err(anyhow!("Render job {} failed: {detail}", job.job_id))
            }
            Err(_) => {
                job.advance(JobStatus::TimedOut);
                Err(anyhow!(
                    "Image generation timed out after {}s",
                    self.poll_timeout.as_secs()
                ))
            }
        }
    }

    async fn poll_once(&self, job_id: &str) -> Result<PollOutcome> {
        let resp = self
            .client
            .get(endpoint(&self.base_url, &format!("history/{job_id}")))
            .timeout(self.request_timeout)
            .send()
            .await
            .context("Request to /history failed")?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(anyhow!("History returned {status}"));
        }
        let bytes = resp.bytes().await.context("Failed reading /history body")?;
        let history: Value =
            serde_json::from_slice(&bytes).context("Failed to parse /history JSON")?;
        parse_history(&history, job_id)
    }

    fn resolve_output(&self, image: &ImageRef) -> PathBuf {
        let mut path = self.output_dir.clone();
        if !image.subfolder.is_empty() {
            path.push(&image.subfolder);
        }
        path.push(&image.filename);
        path
    }

    /// Deterministic placeholder location for a prompt.
    ///
    /// Only the prompt goes into the name, so panels whose prompts are
    /// identical share one file and the last card written wins.
    pub fn placeholder_path(&self, prompt: &str) -> PathBuf {
        let digest = hex::encode(Md5::digest(prompt.as_bytes()));
        let short = digest.get(..8).unwrap_or(digest.as_str());
        self.placeholders
            .temp_dir()
            .join(format!("prompt_placeholder_{short}.png"))
    }

    async fn placeholder(&self, request: &RenderRequest) -> PathBuf {
        let path = self.placeholder_path(&request.prompt);
        let placeholders = self.placeholders.clone();
        let request = request.clone();
        let target = path.clone();
        match tokio::task::spawn_blocking(move || {
            placeholders.render_to(&target, &request.prompt, request.panel_index, &request.style)
        })
        .await
        {
            Ok(written) => written,
            Err(err) => {
                error!("Placeholder task failed: {}", err);
                path
            }
        }
    }

    /// Checks `/system_stats`.
    pub async fn status(&self) -> ServiceStatus {
        check_liveness(&self.client, &endpoint(&self.base_url, "system_stats")).await
    }

    /// True when the render server answers its liveness check.
    pub async fn is_available(&self) -> bool {
        self.status().await.is_online()
    }

    /// Where the render server's outputs are read from
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WORKFLOW: &str = r#"{
        "6": {"class_type": "CLIPTextEncode", "inputs": {"text": "", "clip": ["4", 1]}},
        "31": {"class_type": "KSampler", "inputs": {"seed": 0, "steps": 20}},
        "42": {"class_type": "UltimateSDUpscale", "inputs": {"seed": 0}}
    }"#;

    fn client_for(server: &Server, dir: &Path) -> RenderClient {
        let url = url::Url::parse(&server.url()).expect("server url");
        let workflow_path = dir.join("workflow.json");
        std::fs::write(&workflow_path, WORKFLOW).expect("write workflow");
        let mut config = ComicConfig::new(url.clone(), url);
        config.workflow_path = workflow_path;
        config.temp_dir = dir.join("temp");
        config.comfyui_output_dir = dir.join("comfyui_output");
        config.poll_interval = Duration::from_millis(10);
        config.poll_timeout = Duration::from_secs(5);
        RenderClient::new(&config)
    }

    fn request(prompt: &str, seed: i64) -> RenderRequest {
        RenderRequest {
            prompt: prompt.to_string(),
            style: "anime".to_string(),
            seed,
            panel_index: 0,
        }
    }

    #[test]
    fn seed_policy() {
        assert_eq!(resolve_seeds(5), (5, 1005));
        assert_eq!(resolve_seeds(0), (0, 0));
        for _ in 0..100 {
            let (main, upscale) = resolve_seeds(-1);
            assert!((1..=MAX_SEED).contains(&main));
            assert!((1..=MAX_SEED).contains(&upscale));
        }
    }

    #[test]
    fn workflow_nodes_get_prompt_and_seeds() {
        let mut workflow: Value = serde_json::from_str(WORKFLOW).expect("workflow");
        apply_workflow(&mut workflow, "a cat", (5, 1005));
        assert_eq!(
            workflow["6"]["inputs"]["text"],
            format!("{QUALITY_PREFIX}a cat{QUALITY_SUFFIX}")
        );
        assert_eq!(workflow["6"]["inputs"]["clip"], json!(["4", 1]));
        assert_eq!(workflow["31"]["inputs"]["seed"], 5);
        assert_eq!(workflow["42"]["inputs"]["seed"], 1005);

        let mut sparse = json!({"6": {"inputs": {"text": ""}}});
        apply_workflow(&mut sparse, "x", (1, 2));
        assert!(sparse.get("31").is_none());
    }

    #[test]
    fn job_status_only_moves_forward() {
        let mut job = RenderJob::submitted("p", -1, "abc".to_string());
        assert!(job.advance(JobStatus::Polling));
        assert!(!job.advance(JobStatus::Submitted));
        assert!(job.advance(JobStatus::TimedOut));
        assert!(!job.advance(JobStatus::Completed));
        assert_eq!(job.status(), JobStatus::TimedOut);
    }

    #[test]
    fn history_takes_first_node_with_images() {
        let history = json!({"abc": {"outputs": {
            "9": {"text": ["not an image"]},
            "50": {"images": []},
            "45": {"images": [
                {"filename": "first.png", "subfolder": "comics", "type": "output"},
                {"filename": "second.png", "subfolder": "", "type": "output"}
            ]},
            "12": {"images": [{"filename": "later.png", "subfolder": "", "type": "output"}]}
        }}});
        assert_eq!(
            parse_history(&history, "abc").expect("parse"),
            PollOutcome::Ready(ImageRef {
                filename: "first.png".to_string(),
                subfolder: "comics".to_string()
            })
        );
        assert_eq!(
            parse_history(&json!({}), "abc").expect("parse"),
            PollOutcome::Pending
        );
        let failed = json!({"abc": {"outputs": {}, "status": {"status_str": "error", "completed": true}}});
        assert!(matches!(
            parse_history(&failed, "abc").expect("parse"),
            PollOutcome::Failed(_)
        ));
    }

    #[test]
    fn placeholder_name_is_prompt_hash() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = ComicConfig::new(
            url::Url::parse("http://localhost:1").expect("url"),
            url::Url::parse("http://localhost:1").expect("url"),
        );
        config.temp_dir = dir.path().to_path_buf();
        let client = RenderClient::new(&config);
        // md5("hello") = 5d41402abc4b2a76b9719d911017c592
        assert_eq!(
            client.placeholder_path("hello"),
            dir.path().join("prompt_placeholder_5d41402a.png")
        );
    }

    #[tokio::test]
    async fn render_resolves_first_output_image() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut server = Server::new_async().await;
        let submit = server
            .mock("POST", "/prompt")
            .match_body(Matcher::PartialJson(json!({
                "prompt": {"31": {"inputs": {"seed": 5}}, "42": {"inputs": {"seed": 1005}}}
            })))
            .with_status(200)
            .with_body(r#"{"prompt_id": "job-1", "number": 0}"#)
            .create_async()
            .await;
        let history = server
            .mock("GET", "/history/job-1")
            .with_status(200)
            .with_body(
                json!({"job-1": {"outputs": {"45": {"images": [
                    {"filename": "ComfyUI_00001_.png", "subfolder": "", "type": "output"}
                ]}}}})
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server, dir.path());
        let path = client.render(&request("a cat", 5)).await;
        assert_eq!(path, client.output_dir().join("ComfyUI_00001_.png"));
        submit.assert_async().await;
        history.assert_async().await;
    }

    #[tokio::test]
    async fn poll_errors_are_transient() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/prompt")
            .with_status(200)
            .with_body(r#"{"prompt_id": "job-2"}"#)
            .create_async()
            .await;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        server
            .mock("GET", "/history/job-2")
            .with_status(200)
            .with_body_from_request(move |_| match counter.fetch_add(1, Ordering::SeqCst) {
                0 => b"{}".to_vec(),
                1 => b"<html>502</html>".to_vec(),
                _ => json!({"job-2": {"outputs": {"7": {"images": [
                    {"filename": "late.png", "subfolder": "run", "type": "output"}
                ]}}}})
                .to_string()
                .into_bytes(),
            })
            .create_async()
            .await;

        let client = client_for(&server, dir.path());
        let path = client.render(&request("a dog", -1)).await;
        assert_eq!(path, client.output_dir().join("run").join("late.png"));
        assert!(calls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn submit_failure_yields_placeholder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/prompt")
            .with_status(500)
            .with_body("queue full")
            .create_async()
            .await;

        let client = client_for(&server, dir.path());
        let path = client.render(&request("hello", -1)).await;
        assert_eq!(path, dir.path().join("temp").join("prompt_placeholder_5d41402a.png"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn poll_timeout_yields_placeholder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/prompt")
            .with_status(200)
            .with_body(r#"{"prompt_id": "slow"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/history/slow")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let url = url::Url::parse(&server.url()).expect("server url");
        let workflow_path = dir.path().join("workflow.json");
        std::fs::write(&workflow_path, WORKFLOW).expect("write workflow");
        let mut config = ComicConfig::new(url.clone(), url);
        config.workflow_path = workflow_path;
        config.temp_dir = dir.path().join("temp");
        config.poll_interval = Duration::from_millis(20);
        config.poll_timeout = Duration::from_millis(150);
        let client = RenderClient::new(&config);

        let path = client.render(&request("slow prompt", -1)).await;
        assert_eq!(path, client.placeholder_path("slow prompt"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn execution_error_yields_placeholder_without_waiting() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/prompt")
            .with_status(200)
            .with_body(r#"{"prompt_id": "bad"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/history/bad")
            .with_status(200)
            .with_body(
                json!({"bad": {"outputs": {}, "status": {"status_str": "error", "completed": true}}})
                    .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server, dir.path());
        let started = std::time::Instant::now();
        let path = client.render(&request("broken", -1)).await;
        assert_eq!(path, client.placeholder_path("broken"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn missing_workflow_never_submits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut server = Server::new_async().await;
        let submit = server
            .mock("POST", "/prompt")
            .expect(0)
            .create_async()
            .await;

        let url = url::Url::parse(&server.url()).expect("server url");
        let mut config = ComicConfig::new(url.clone(), url);
        config.workflow_path = dir.path().join("missing.json");
        config.temp_dir = dir.path().join("temp");
        let client = RenderClient::new(&config);

        let path = client.render(&request("no template", 3)).await;
        assert_eq!(path, client.placeholder_path("no template"));
        submit.assert_async().await;
    }

    #[tokio::test]
    async fn silent_queue_yields_placeholder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = crate::config::silent_service().await;
        let workflow_path = dir.path().join("workflow.json");
        std::fs::write(&workflow_path, WORKFLOW).expect("write workflow");
        let mut config = ComicConfig::new(url.clone(), url);
        config.workflow_path = workflow_path;
        config.temp_dir = dir.path().join("temp");
        config.poll_timeout = Duration::from_millis(200);
        config.request_timeout = Duration::from_millis(200);
        let client = RenderClient::new(&config);

        let path = tokio::time::timeout(Duration::from_secs(5), client.render(&request("hush", -1)))
            .await
            .expect("render gave up in time");
        assert_eq!(path, client.placeholder_path("hush"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn identical_prompts_share_a_card() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = ComicConfig::new(
            url::Url::parse("http://localhost:1").expect("url"),
            url::Url::parse("http://localhost:1").expect("url"),
        );
        config.workflow_path = dir.path().join("missing.json");
        config.temp_dir = dir.path().join("temp");
        let client = RenderClient::new(&config);

        let first = client.render(&request("same beat", -1)).await;
        let second = client
            .render(&RenderRequest {
                panel_index: 1,
                ..request("same beat", -1)
            })
            .await;
        assert_eq!(first, second);
        let card = image::open(&second).expect("open card").to_rgb8();
        assert_eq!(
            card.as_raw(),
            crate::placeholder::draw_card("same beat", 1, "anime").as_raw()
        );
    }

    #[tokio::test]
    async fn missing_prompt_id_falls_back_to_client_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/prompt")
            .with_status(200)
            .with_body(r#"{"number": 3}"#)
            .create_async()
            .await;

        let client = client_for(&server, dir.path());
        let job_id = client.queue_prompt(&json!({})).await.expect("queue");
        assert!(uuid::Uuid::parse_str(&job_id).is_ok());
    }

    #[tokio::test]
    async fn availability_check() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/system_stats")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        assert!(client_for(&server, dir.path()).is_available().await);

        let mut down = Server::new_async().await;
        down.mock("GET", "/system_stats")
            .with_status(500)
            .create_async()
            .await;
        assert!(!client_for(&down, dir.path()).is_available().await);
    }
}
