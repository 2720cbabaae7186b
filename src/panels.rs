//! Panel scripts: asking the text model to break a story into panels.

use std::num::NonZeroUsize;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::config::{ComicConfig, endpoint};
use crate::status::{ServiceStatus, check_liveness};

/// Camera angle used when the model doesn't give one
pub const DEFAULT_CAMERA_ANGLE: &str = "medium shot";
/// Emotion used when the model doesn't give one
pub const DEFAULT_EMOTION: &str = "neutral";

/// One story beat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSpec {
    /// Position in the comic, 0-based
    pub index: usize,
    /// What the panel shows
    pub description: String,
    /// Spoken text, may be empty
    pub dialogue: String,
    /// eg `close-up`
    pub camera_angle: String,
    /// eg `worried`
    pub emotion: String,
    /// Who appears, may be empty
    pub characters: String,
    /// Where it happens, may be empty
    pub setting: String,
}

impl PanelSpec {
    /// The panel used when the model can't be asked or its answer is unusable.
    pub fn fallback(index: usize, prompt: &str) -> Self {
        Self {
            index,
            description: format!("Panel {} of story: {}", index + 1, prompt),
            dialogue: String::new(),
            camera_angle: DEFAULT_CAMERA_ANGLE.to_string(),
            emotion: DEFAULT_EMOTION.to_string(),
            characters: String::new(),
            setting: String::new(),
        }
    }
}

/// Deterministic panels for when the model is unavailable. Never does I/O.
pub fn fallback_panels(prompt: &str, panel_count: NonZeroUsize) -> Vec<PanelSpec> {
    (0..panel_count.get())
        .map(|index| PanelSpec::fallback(index, prompt))
        .collect()
}

const PANEL_GENERATION_PROMPT: &str = r#"You are an expert comic writer and storyboard artist. Your task is to break down a user's story idea into detailed panel descriptions for a {num_panels}-panel comic.

Style: {style}

CRITICAL REQUIREMENTS FOR DETAILED DESCRIPTIONS:
1. Include SPECIFIC visual details: character appearance, clothing, poses, facial expressions
2. Describe the ENVIRONMENT in detail: location, lighting, weather, atmosphere
3. Specify COMPOSITION: foreground, background, depth of field
4. Add CONSISTENCY ELEMENTS: character names, recurring visual themes, color schemes
5. Include EMOTIONAL CONTEXT: mood, tension, energy level
6. Specify TECHNICAL DETAILS: time of day, season, architectural style

WEIGHTED PROMPT STRUCTURE:
- Use (term:1.2) for emphasis
- Use (term:1.5) for strong emphasis
- Use (term:0.8) for de-emphasis
- Focus on: (consistent character design:1.4), (detailed background:1.2), (professional comic art:1.3)

Requirements:
1. Return a valid JSON object with a "panels" array
2. Each panel should have: description, dialogue, camera_angle, emotion, characters, setting
3. Create a coherent narrative flow across all panels
4. Include EXTENSIVE visual details for each scene (minimum 3 sentences per description)
5. Keep dialogue concise and impactful
6. Vary camera angles for visual interest
7. Maintain character consistency across panels
8. Add weighted prompt elements for key visual aspects

Example format:
{
  "panels": [
    {
      "description": "(detailed background:1.2) Wide shot of a bustling medieval marketplace at golden hour sunset, with (warm lighting:1.3) casting long shadows across cobblestone streets. Wooden merchant stalls with colorful awnings line both sides, filled with fresh produce and handmade goods. (atmospheric perspective:1.1) Steam rises from food vendors in the background.",
      "dialogue": "VENDOR: Last chance for fresh apples!",
      "camera_angle": "wide shot",
      "emotion": "busy",
      "characters": "elderly bearded vendor in brown apron, various background townspeople",
      "setting": "medieval marketplace, sunset, cobblestone streets"
    },
    {
      "description": "(close-up portrait:1.3) Tight shot of a young woman with (expressive brown eyes:1.2) and shoulder-length auburn hair, wearing a simple blue dress. Her face shows (worried expression:1.4) with furrowed brow as she opens an empty leather coin purse. (shallow depth of field:1.1) with marketplace blurred in background.",
      "dialogue": "",
      "camera_angle": "close-up",
      "emotion": "worried",
      "characters": "young woman, auburn hair, blue dress, brown eyes",
      "setting": "marketplace, personal moment, late afternoon"
    }
  ]
}

Generate exactly {num_panels} panels for the story. Focus on MAXIMUM visual detail and consistency between panels."#;

/// Builds the full text sent to the model.
pub fn build_panel_prompt(prompt: &str, panel_count: NonZeroUsize, style: &str) -> String {
    let system_prompt = PANEL_GENERATION_PROMPT
        .replace("{num_panels}", &panel_count.to_string())
        .replace("{style}", style);
    format!(
        "{system_prompt}\n\nCreate a {}-panel comic story based on: {prompt}",
        panel_count
    )
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Talks to the text-generation service.
#[derive(Clone, Debug)]
pub struct PanelScriptGenerator {
    client: reqwest::Client,
    base_url: url::Url,
    model: String,
    request_timeout: Duration,
}

impl PanelScriptGenerator {
    /// Generator for the service and model named in `config`.
    pub fn new(config: &ComicConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.ollama_url.clone(),
            model: config.ollama_model.clone(),
            request_timeout: config.request_timeout,
        }
    }

    /// Breaks `prompt` into exactly `panel_count` panels.
    ///
    /// One request, no retries. Anything that goes wrong yields
    /// [`fallback_panels`] instead.
    pub async fn generate(
        &self,
        prompt: &str,
        panel_count: NonZeroUsize,
        style: &str,
    ) -> Vec<PanelSpec> {
        match self.request_panels(prompt, panel_count, style).await {
            Ok(panels) => {
                info!("Generated {} panel descriptions", panels.len());
                panels
            }
            Err(err) => {
                error!("Failed to generate panels: {:#}", err);
                fallback_panels(prompt, panel_count)
            }
        }
    }

    async fn request_panels(
        &self,
        prompt: &str,
        panel_count: NonZeroUsize,
        style: &str,
    ) -> Result<Vec<PanelSpec>> {
        let body = json!({
            "model": self.model,
            "prompt": build_panel_prompt(prompt, panel_count, style),
            "stream": false,
            "format": "json",
        });

        let resp = self
            .client
            .post(endpoint(&self.base_url, "api/generate"))
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .context("Request to /api/generate failed")?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(anyhow!("Ollama API error: {status}"));
        }

        let bytes = resp
            .bytes()
            .await
            .context("Failed reading /api/generate body")?;
        let parsed: GenerateResponse =
            serde_json::from_slice(&bytes).context("Failed to parse /api/generate JSON")?;

        parse_panels(&parsed.response, prompt, panel_count)
    }

    /// Checks `/api/tags`.
    pub async fn status(&self) -> ServiceStatus {
        check_liveness(&self.client, &endpoint(&self.base_url, "api/tags")).await
    }
}

/// Turns the model's JSON answer into exactly `panel_count` panels.
fn parse_panels(raw: &str, prompt: &str, panel_count: NonZeroUsize) -> Result<Vec<PanelSpec>> {
    let payload: Value =
        serde_json::from_str(raw).with_context(|| format!("Model returned invalid JSON: {raw}"))?;
    let items = payload
        .get("panels")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("Model response has no panels array"))?;
    if items.is_empty() {
        return Err(anyhow!("Model returned an empty panels array"));
    }
    if items.len() != panel_count.get() {
        info!(
            "Model returned {} panels, wanted {}; adjusting",
            items.len(),
            panel_count
        );
    }

    let panels = (0..panel_count.get())
        .map(|index| match items.get(index) {
            Some(item) => panel_from_value(index, item, prompt),
            None => PanelSpec::fallback(index, prompt),
        })
        .collect();
    Ok(panels)
}

fn panel_from_value(index: usize, item: &Value, prompt: &str) -> PanelSpec {
    let mut description = text_field(item, "description");
    if description.is_empty() {
        description = PanelSpec::fallback(index, prompt).description;
    }
    PanelSpec {
        index,
        description,
        dialogue: text_field(item, "dialogue"),
        camera_angle: text_or(item, "camera_angle", DEFAULT_CAMERA_ANGLE),
        emotion: text_or(item, "emotion", DEFAULT_EMOTION),
        characters: text_field(item, "characters"),
        setting: text_field(item, "setting"),
    }
}

/// Models don't always stick to strings, so lists get joined and anything else is dropped.
fn text_field(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

fn text_or(item: &Value, key: &str, default: &str) -> String {
    let text = text_field(item, key);
    if text.is_empty() {
        default.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn count(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).expect("non-zero")
    }

    fn generator_for(server: &Server) -> PanelScriptGenerator {
        let url = url::Url::parse(&server.url()).expect("server url");
        PanelScriptGenerator::new(&ComicConfig::new(url.clone(), url))
    }

    fn ollama_body(inner: &Value) -> String {
        json!({ "model": "llama3.1:8b", "response": inner.to_string(), "done": true }).to_string()
    }

    #[test]
    fn fallback_is_deterministic_and_indexed() {
        let first = fallback_panels("A cat learns to fly", count(3));
        let second = fallback_panels("A cat learns to fly", count(3));
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        for (i, panel) in first.iter().enumerate() {
            assert_eq!(panel.index, i);
            assert_eq!(
                panel.description,
                format!("Panel {} of story: A cat learns to fly", i + 1)
            );
            assert_eq!(panel.camera_angle, "medium shot");
            assert_eq!(panel.emotion, "neutral");
            assert!(panel.dialogue.is_empty());
        }
    }

    #[test]
    fn prompt_embeds_count_style_and_story() {
        let text = build_panel_prompt("a heist", count(5), "manga");
        assert!(text.contains("for a 5-panel comic"));
        assert!(text.contains("Style: manga"));
        assert!(text.contains("Generate exactly 5 panels"));
        assert!(text.ends_with("Create a 5-panel comic story based on: a heist"));
        assert!(!text.contains("{num_panels}"));
    }

    #[test]
    fn parse_pads_and_truncates_to_requested_count() {
        let raw = json!({"panels": [
            {"description": "one", "camera_angle": "wide shot", "emotion": "busy"},
            {"description": "two"}
        ]})
        .to_string();

        let padded = parse_panels(&raw, "story", count(3)).expect("parse");
        assert_eq!(padded.len(), 3);
        assert_eq!(padded[0].camera_angle, "wide shot");
        assert_eq!(padded[1].camera_angle, "medium shot");
        assert_eq!(padded[2], PanelSpec::fallback(2, "story"));

        let truncated = parse_panels(&raw, "story", count(1)).expect("parse");
        assert_eq!(truncated.len(), 1);
        assert_eq!(truncated[0].description, "one");
    }

    #[test]
    fn parse_is_lenient_about_field_types() {
        let raw = json!({"panels": [{
            "description": "",
            "characters": ["Alice", " the robot "],
            "emotion": "",
            "setting": 42
        }]})
        .to_string();
        let panels = parse_panels(&raw, "story", count(1)).expect("parse");
        assert_eq!(panels[0].description, "Panel 1 of story: story");
        assert_eq!(panels[0].characters, "Alice, the robot");
        assert_eq!(panels[0].emotion, "neutral");
        assert_eq!(panels[0].setting, "42");
    }

    #[test]
    fn parse_rejects_unusable_payloads() {
        assert!(parse_panels("not json", "s", count(1)).is_err());
        assert!(parse_panels(r#"{"scenes": []}"#, "s", count(1)).is_err());
        assert!(parse_panels(r#"{"panels": []}"#, "s", count(1)).is_err());
    }

    #[tokio::test]
    async fn generate_uses_model_output() {
        let mut server = Server::new_async().await;
        let inner = json!({"panels": [
            {"description": "Alice looks up", "dialogue": "Oh!", "camera_angle": "low angle",
             "emotion": "amazed", "characters": "Alice", "setting": "garden"},
            {"description": "Alice jumps", "dialogue": "", "camera_angle": "wide shot",
             "emotion": "joyful", "characters": "Alice", "setting": "garden"}
        ]});
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "llama3.1:8b",
                "stream": false,
                "format": "json"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(ollama_body(&inner))
            .create_async()
            .await;

        let panels = generator_for(&server)
            .generate("Alice flies", count(2), "anime")
            .await;
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].dialogue, "Oh!");
        assert_eq!(panels[1].index, 1);
        assert_eq!(panels[1].emotion, "joyful");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn generate_falls_back_on_server_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let panels = generator_for(&server)
            .generate("A cat learns to fly", count(2), "anime")
            .await;
        assert_eq!(panels, fallback_panels("A cat learns to fly", count(2)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn generate_falls_back_when_model_never_answers() {
        let url = crate::config::silent_service().await;
        let mut config = ComicConfig::new(url.clone(), url);
        config.request_timeout = Duration::from_millis(200);

        let panels = tokio::time::timeout(
            Duration::from_secs(5),
            PanelScriptGenerator::new(&config).generate("story", count(2), "anime"),
        )
        .await
        .expect("generate gave up in time");
        assert_eq!(panels, fallback_panels("story", count(2)));
    }

    #[tokio::test]
    async fn generate_falls_back_on_garbage_inner_json() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(200)
            .with_body(json!({"response": "Sure! Here are your panels:"}).to_string())
            .create_async()
            .await;

        let panels = generator_for(&server)
            .generate("story", count(4), "manga")
            .await;
        assert_eq!(panels, fallback_panels("story", count(4)));
    }

    #[tokio::test]
    async fn status_reflects_tags_endpoint() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_body(r#"{"models": []}"#)
            .create_async()
            .await;
        assert_eq!(generator_for(&server).status().await, ServiceStatus::Online);

        let mut down = Server::new_async().await;
        down.mock("GET", "/api/tags")
            .with_status(503)
            .create_async()
            .await;
        assert_eq!(generator_for(&down).status().await, ServiceStatus::Offline);
    }
}
