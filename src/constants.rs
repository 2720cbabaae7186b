//! Shared constants for the comic pipeline
//!

use std::time::Duration;

/// Default place finished comic pages go
pub const DEFAULT_COMICS_DIR: &str = "output/comics";

/// Default place placeholder and scratch images go
pub const DEFAULT_TEMP_DIR: &str = "output/temp";

/// Where the render server writes its outputs, as seen from this host
pub const DEFAULT_COMFYUI_OUTPUT_DIR: &str = "comfyui_output";

/// API-format workflow template submitted for every panel
pub const DEFAULT_WORKFLOW_PATH: &str = "workflows/comic_workflow_api.json";

/// Default text-generation model
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";

/// Default style when a request doesn't name one
pub const DEFAULT_STYLE: &str = "anime";

/// Default number of panels per comic
pub const DEFAULT_PANELS: usize = 4;

/// Upper bound on panels accepted over HTTP
pub const MAX_PANELS: usize = 12;

/// Default layout preset id
pub const DEFAULT_LAYOUT_PRESET: &str = "Layout0";

/// Default page format id
pub const DEFAULT_PAGE_FORMAT: &str = "A4-P";

/// Timeout for the liveness checks against both services.
pub const LIVENESS_TIMEOUT: Duration = Duration::from_secs(3);

/// How often the render history is polled.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long a single render may take before it's abandoned.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(300);

/// Upper bound on one story or submit request, response body included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Largest seed the render server accepts from us
pub const MAX_SEED: i64 = 999_999_999_999_999;

/// Offset between the sampler seed and the upscaler seed
pub const UPSCALE_SEED_OFFSET: i64 = 1000;

/// Workflow node holding the positive prompt text
pub const NODE_POSITIVE_PROMPT: &str = "6";
/// Workflow node holding the main sampler seed
pub const NODE_SAMPLER_SEED: &str = "31";
/// Workflow node holding the upscale sampler seed
pub const NODE_UPSCALE_SEED: &str = "42";

/// Weighted quality terms wrapped around every render prompt.
pub const QUALITY_PREFIX: &str = "score_9, score_8_up, score_7_up, (cel shading:1.3), (stylized features:1.2), (consistent character design:1.4), (detailed background:1.2), (professional comic art:1.3), ";
/// See [`QUALITY_PREFIX`].
pub const QUALITY_SUFFIX: &str = ", (cartoon style:1.3), (high quality:1.4), (detailed illustration:1.2), (vibrant colors:1.1), (clean line art:1.2), (comic book panel:1.2)";

/// Placeholder card width
pub const PLACEHOLDER_WIDTH: u32 = 512;
/// Placeholder card height
pub const PLACEHOLDER_HEIGHT: u32 = 768;
/// Max wrapped prompt lines drawn on a placeholder card
pub const PLACEHOLDER_MAX_LINES: usize = 25;
/// Bottom line of every placeholder card.
pub const PLACEHOLDER_WATERMARK: &str = "ComfyUI Unavailable - Showing Generated Prompt";

/// Cache-Control value for served comic pages.
pub const COMIC_CACHE_CONTROL: &str = "public, max-age=3600, s-maxage=86400";
