//! Text-card placeholders for panels that couldn't be rendered.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use tracing::{debug, error};

use crate::constants::{
    PLACEHOLDER_HEIGHT, PLACEHOLDER_MAX_LINES, PLACEHOLDER_WATERMARK, PLACEHOLDER_WIDTH,
};
use crate::glyphs::{draw_text, wrap_text};

const MARGIN: u32 = 20;
const BODY_SCALE: u32 = 2;
const LINE_HEIGHT: u32 = 20;

const HEADER_COLOR: Rgb<u8> = Rgb([0x33, 0x33, 0x33]);
const STYLE_COLOR: Rgb<u8> = Rgb([0x66, 0x66, 0x66]);
const LABEL_COLOR: Rgb<u8> = Rgb([0x44, 0x44, 0x44]);
const BODY_COLOR: Rgb<u8> = Rgb([0x22, 0x22, 0x22]);
const WATERMARK_COLOR: Rgb<u8> = Rgb([0x88, 0x88, 0x88]);

/// Background for a style's placeholder cards; unknown styles get neutral grey.
pub fn style_background(style: &str) -> Rgb<u8> {
    match style {
        "anime" => Rgb([0xFF, 0xE4, 0xE1]),
        "manga" => Rgb([0xF0, 0xF8, 0xFF]),
        "cartoon" => Rgb([0xF0, 0xFF, 0xF0]),
        "realistic" => Rgb([0xFF, 0xF8, 0xDC]),
        _ => Rgb([0xF5, 0xF5, 0xF5]),
    }
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Draws the placeholder card. Pure; identical inputs give identical pixels.
pub fn draw_card(prompt_text: &str, panel_index: usize, style: &str) -> RgbImage {
    let mut img = RgbImage::from_pixel(
        PLACEHOLDER_WIDTH,
        PLACEHOLDER_HEIGHT,
        style_background(style),
    );
    let margin = i64::from(MARGIN);

    draw_text(
        &mut img,
        margin,
        20,
        &format!("Panel {}", panel_index + 1),
        HEADER_COLOR,
        3,
    );
    draw_text(
        &mut img,
        margin,
        60,
        &format!("Style: {}", title_case(style)),
        STYLE_COLOR,
        BODY_SCALE,
    );

    let mut y_pos: u32 = 120;
    draw_text(
        &mut img,
        margin,
        i64::from(y_pos - 10),
        "Generated Prompt:",
        LABEL_COLOR,
        BODY_SCALE,
    );
    y_pos += 30;

    let max_width = PLACEHOLDER_WIDTH - 2 * MARGIN;
    for line in wrap_text(prompt_text, max_width, BODY_SCALE)
        .iter()
        .take(PLACEHOLDER_MAX_LINES)
    {
        draw_text(&mut img, margin, i64::from(y_pos), line, BODY_COLOR, BODY_SCALE);
        y_pos += LINE_HEIGHT;
        if y_pos > PLACEHOLDER_HEIGHT - 50 {
            break;
        }
    }

    draw_text(
        &mut img,
        margin,
        i64::from(PLACEHOLDER_HEIGHT - 40),
        PLACEHOLDER_WATERMARK,
        WATERMARK_COLOR,
        1,
    );
    img
}

fn draw_simple_card(prompt_text: &str, panel_index: usize) -> RgbImage {
    let mut img = RgbImage::from_pixel(
        PLACEHOLDER_WIDTH,
        PLACEHOLDER_HEIGHT,
        Rgb([0xF0, 0xF0, 0xF0]),
    );
    let black = Rgb([0, 0, 0]);
    let snippet: String = prompt_text.chars().take(100).collect();
    draw_text(&mut img, 50, 350, &format!("Panel {}", panel_index + 1), black, 1);
    draw_text(&mut img, 50, 362, &format!("Prompt: {snippet}..."), black, 1);
    img
}

/// Writes placeholder cards into the temp directory.
#[derive(Clone, Debug)]
pub struct PlaceholderRenderer {
    temp_dir: PathBuf,
}

impl PlaceholderRenderer {
    /// Renderer writing under `temp_dir`.
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }

    /// Where the cards go
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Renders a card under a fresh random name and returns its path.
    pub fn render(&self, prompt_text: &str, panel_index: usize, style: &str) -> PathBuf {
        let suffix: u32 = rand::random();
        let path = self
            .temp_dir
            .join(format!("prompt_placeholder_{panel_index}_{suffix:08x}.png"));
        self.render_to(&path, prompt_text, panel_index, style)
    }

    /// Renders a card to `path`.
    ///
    /// Never fails: if the card can't be written a plainer one is tried, and
    /// the returned path may then point at nothing. The compositor copes
    /// with that.
    pub fn render_to(
        &self,
        path: &Path,
        prompt_text: &str,
        panel_index: usize,
        style: &str,
    ) -> PathBuf {
        let card = draw_card(prompt_text, panel_index, style);
        match self.save(path, &card) {
            Ok(()) => {
                debug!("Wrote placeholder {}", path.display());
                path.to_path_buf()
            }
            Err(err) => {
                error!("Failed to create prompt placeholder: {:#}", err);
                let simple_path = self
                    .temp_dir
                    .join(format!("simple_placeholder_{panel_index}.png"));
                if let Err(err) = self.save(&simple_path, &draw_simple_card(prompt_text, panel_index))
                {
                    error!(
                        "Failed to write simple placeholder {}: {:#}",
                        simple_path.display(),
                        err
                    );
                }
                simple_path
            }
        }
    }

    fn save(&self, path: &Path, img: &RgbImage) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        img.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}
