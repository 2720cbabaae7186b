//! The comic pipeline: panel scripts, prompts, renders, page.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::compositor::Compositor;
use crate::config::ComicConfig;
use crate::error::ComicError;
use crate::layout::{LayoutGeometry, PageFormat};
use crate::panels::{PanelScriptGenerator, PanelSpec};
use crate::placeholder::PlaceholderRenderer;
use crate::prompt::enhance;
use crate::render::{RenderClient, RenderRequest};
use crate::status::ServiceStatus;

/// Everything needed to make one comic.
#[derive(Clone, Debug)]
pub struct ComicRequest {
    /// The story idea
    pub prompt: String,
    /// Art style, eg `anime`
    pub style: String,
    /// How many panels to write
    pub panel_count: NonZeroUsize,
    /// Preset used when `geometry` has no cells
    pub layout_preset: String,
    /// Page size
    pub page_format: PageFormat,
    /// Client-supplied layout, if any
    pub geometry: Option<LayoutGeometry>,
}

/// Runs the whole pipeline for a request.
#[derive(Clone, Debug)]
pub struct ComicPipeline {
    panels: PanelScriptGenerator,
    renderer: Arc<RenderClient>,
    placeholders: PlaceholderRenderer,
    compositor: Compositor,
}

impl ComicPipeline {
    /// Pipeline wired up from `config`.
    pub fn new(config: &ComicConfig) -> Self {
        Self {
            panels: PanelScriptGenerator::new(config),
            renderer: Arc::new(RenderClient::new(config)),
            placeholders: PlaceholderRenderer::new(config.temp_dir.clone()),
            compositor: Compositor::new(config.comics_dir.clone()),
        }
    }

    /// Writes the panel scripts for a story.
    pub async fn generate_story(
        &self,
        prompt: &str,
        panel_count: NonZeroUsize,
        style: &str,
    ) -> Vec<PanelSpec> {
        self.panels.generate(prompt, panel_count, style).await
    }

    /// Renders a single panel description, seeded by its index so repeat
    /// requests come out the same.
    pub async fn render_panel(
        &self,
        description: &str,
        style: &str,
        panel_index: usize,
    ) -> PathBuf {
        let request = RenderRequest {
            prompt: description.to_string(),
            style: style.to_string(),
            seed: i64::try_from(panel_index).unwrap_or(i64::MAX),
            panel_index,
        };
        self.render_isolated(request).await
    }

    /// Makes a comic and returns the path of the finished page.
    ///
    /// Panels are rendered one after another. Every panel ends up as either
    /// a real render or a placeholder card, so the only error left is failing
    /// to write the page.
    pub async fn create_comic(&self, request: ComicRequest) -> Result<PathBuf, ComicError> {
        info!(
            "Generating complete comic: {}...",
            request.prompt.chars().take(100).collect::<String>()
        );
        let panels = self
            .generate_story(&request.prompt, request.panel_count, &request.style)
            .await;

        let mut images = Vec::with_capacity(panels.len());
        for panel in &panels {
            let render = RenderRequest {
                prompt: enhance(panel, &panels),
                style: request.style.clone(),
                seed: -1,
                panel_index: panel.index,
            };
            images.push(self.render_isolated(render).await);
        }

        let compositor = self.compositor.clone();
        let ComicRequest {
            layout_preset,
            page_format,
            geometry,
            ..
        } = request;
        tokio::task::spawn_blocking(move || {
            compositor.assemble(&images, &layout_preset, page_format, geometry)
        })
        .await?
    }

    async fn render_isolated(&self, request: RenderRequest) -> PathBuf {
        let renderer = Arc::clone(&self.renderer);
        let task_request = request.clone();
        self.run_isolated(async move { renderer.render(&task_request).await }, request)
            .await
    }

    /// Runs `render` on its own task so that even a panic inside it only
    /// costs this panel, which then gets a placeholder card.
    async fn run_isolated<F>(&self, render: F, request: RenderRequest) -> PathBuf
    where
        F: Future<Output = PathBuf> + Send + 'static,
    {
        match tokio::spawn(render).await {
            Ok(path) => path,
            Err(err) => {
                warn!(
                    "Render unavailable for panel {}: {}",
                    request.panel_index, err
                );
                let placeholders = self.placeholders.clone();
                let fallback = placeholders.temp_dir().join(format!(
                    "simple_placeholder_{}.png",
                    request.panel_index
                ));
                tokio::task::spawn_blocking(move || {
                    placeholders.render(&request.prompt, request.panel_index, &request.style)
                })
                .await
                .unwrap_or(fallback)
            }
        }
    }

    /// Liveness of the text-generation service
    pub async fn text_service_status(&self) -> ServiceStatus {
        self.panels.status().await
    }

    /// Liveness of the render service
    pub async fn render_service_status(&self) -> ServiceStatus {
        self.renderer.status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde_json::json;
    use std::time::Duration;

    async fn pipeline_with(server: &Server, dir: &std::path::Path) -> ComicPipeline {
        let url = url::Url::parse(&server.url()).expect("server url");
        let mut config = ComicConfig::new(url.clone(), url);
        config.workflow_path = dir.join("missing_workflow.json");
        config.comics_dir = dir.join("comics");
        config.temp_dir = dir.join("temp");
        config.poll_interval = Duration::from_millis(10);
        config.poll_timeout = Duration::from_millis(100);
        ComicPipeline::new(&config)
    }

    #[tokio::test]
    async fn render_panel_falls_back_to_card() {
        let dir = tempfile::tempdir().expect("tempdir");
        let server = Server::new_async().await;
        let pipeline = pipeline_with(&server, dir.path()).await;

        let path = pipeline.render_panel("a lone lighthouse", "manga", 2).await;
        assert!(path.starts_with(dir.path().join("temp")));
        let card = image::open(&path).expect("open card").to_rgb8();
        assert_eq!(*card.get_pixel(511, 0), image::Rgb([0xF0, 0xF8, 0xFF]));
    }

    async fn exploding_render() -> PathBuf {
        panic!("renderer exploded")
    }

    fn piano_request() -> RenderRequest {
        RenderRequest {
            prompt: "a falling piano".to_string(),
            style: "realistic".to_string(),
            seed: -1,
            panel_index: 3,
        }
    }

    #[tokio::test]
    async fn panicking_render_gets_a_card() {
        let dir = tempfile::tempdir().expect("tempdir");
        let server = Server::new_async().await;
        let pipeline = pipeline_with(&server, dir.path()).await;

        let path = pipeline
            .run_isolated(exploding_render(), piano_request())
            .await;
        assert!(path.starts_with(dir.path().join("temp")));
        let name = path.file_name().and_then(|n| n.to_str()).expect("file name");
        assert!(name.starts_with("prompt_placeholder_3_"), "{name}");
        let card = image::open(&path).expect("open card").to_rgb8();
        assert_eq!(
            card.as_raw(),
            crate::placeholder::draw_card("a falling piano", 3, "realistic").as_raw()
        );
    }

    #[tokio::test]
    async fn panicking_render_with_unwritable_temp_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("temp"), b"not a dir").expect("write blocker");
        let server = Server::new_async().await;
        let pipeline = pipeline_with(&server, dir.path()).await;

        let path = pipeline
            .run_isolated(exploding_render(), piano_request())
            .await;
        assert_eq!(path, dir.path().join("temp").join("simple_placeholder_3.png"));
    }

    #[tokio::test]
    async fn comic_completes_against_silent_services() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = crate::config::silent_service().await;
        let workflow_path = dir.path().join("workflow.json");
        std::fs::write(&workflow_path, r#"{"6": {"inputs": {"text": ""}}}"#)
            .expect("write workflow");
        let mut config = ComicConfig::new(url.clone(), url);
        config.workflow_path = workflow_path;
        config.comics_dir = dir.path().join("comics");
        config.temp_dir = dir.path().join("temp");
        config.poll_timeout = Duration::from_millis(200);
        config.request_timeout = Duration::from_millis(200);
        let pipeline = ComicPipeline::new(&config);

        let mut geometry = crate::compositor::resolve_geometry("Layout0", None);
        // keeps the page cheap to compose
        geometry.outer_margin_px = 1200;
        let request = ComicRequest {
            prompt: "quiet night".to_string(),
            style: "anime".to_string(),
            panel_count: NonZeroUsize::new(1).expect("non-zero"),
            layout_preset: "Layout0".to_string(),
            page_format: PageFormat::A4Portrait,
            geometry: Some(geometry),
        };
        let page = tokio::time::timeout(Duration::from_secs(10), pipeline.create_comic(request))
            .await
            .expect("comic finished in time")
            .expect("comic");
        assert!(page.exists());
    }

    #[tokio::test]
    async fn comic_uses_requested_preset_and_llm_panels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut server = Server::new_async().await;
        let inner = json!({"panels": [
            {"description": "Alice at the cliff", "camera_angle": "wide shot",
             "emotion": "tense", "characters": "Alice", "setting": "cliff"},
            {"description": "Alice leaps", "camera_angle": "low angle", "emotion": "brave"}
        ]});
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(json!({"response": inner.to_string()}).to_string())
            .create_async()
            .await;

        let pipeline = pipeline_with(&server, dir.path()).await;
        let request = ComicRequest {
            prompt: "Alice flies".to_string(),
            style: "cartoon".to_string(),
            panel_count: NonZeroUsize::new(2).expect("non-zero"),
            layout_preset: "Layout3".to_string(),
            page_format: PageFormat::A4Landscape,
            geometry: None,
        };
        let page = pipeline.create_comic(request).await.expect("comic");
        assert!(page.starts_with(dir.path().join("comics")));
        assert_eq!(
            image::image_dimensions(&page).expect("dimensions"),
            (3508, 2480)
        );

        // second panel never named a character, yet its card carries the anchor
        let second_prompt =
            "(consistent character: Alice:1.3), (low angle:1.2), (brave mood:1.1), Alice leaps";
        let renderer = RenderClient::new(&{
            let mut config = ComicConfig::new(
                url::Url::parse("http://localhost:1").expect("url"),
                url::Url::parse("http://localhost:1").expect("url"),
            );
            config.temp_dir = dir.path().join("temp");
            config
        });
        assert!(renderer.placeholder_path(second_prompt).exists());
    }
}
