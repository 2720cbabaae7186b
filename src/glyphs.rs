//! Bitmap text drawing on RGB canvases.
//!
//! Uses the embedded 8x8 font so rendering never depends on fonts installed
//! on the host, and identical text always produces identical pixels.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};

/// Glyph cell size in pixels at scale 1
pub const GLYPH_SIZE: u32 = 8;

/// Pixel width of `text` drawn at `scale`.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale.max(1)
}

/// Draws a single line of text with its top-left corner at `(x, y)`.
///
/// Pixels falling outside the canvas are dropped. Characters the font
/// doesn't cover are drawn as `?`.
pub fn draw_text(img: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>, scale: u32) {
    let scale = i64::from(scale.max(1));
    let (width, height) = (i64::from(img.width()), i64::from(img.height()));
    let mut cursor_x = x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += 8 * scale;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            for col_idx in 0..8i64 {
                if (row >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col_idx * scale;
                let py = y + row_idx as i64 * scale;
                for sy in 0..scale {
                    for sx in 0..scale {
                        let (tx, ty) = (px + sx, py + sy);
                        if tx >= 0 && ty >= 0 && tx < width && ty < height {
                            img.put_pixel(tx as u32, ty as u32, color);
                        }
                    }
                }
            }
        }
        cursor_x += 8 * scale;
    }
}

/// Draws `text` centred on `(cx, cy)`.
pub fn draw_text_centered(
    img: &mut RgbImage,
    cx: i64,
    cy: i64,
    text: &str,
    color: Rgb<u8>,
    scale: u32,
) {
    let half_w = i64::from(text_width(text, scale)) / 2;
    let half_h = i64::from(GLYPH_SIZE * scale.max(1)) / 2;
    draw_text(img, cx - half_w, cy - half_h, text, color, scale);
}

/// Greedy word wrap against a pixel budget.
///
/// Words are packed while the measured line fits in `max_width`; a word
/// that's wider than the budget on its own gets a line to itself rather
/// than being split.
pub fn wrap_text(text: &str, max_width: u32, scale: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        let mut candidate = current.join(" ");
        if !candidate.is_empty() {
            candidate.push(' ');
        }
        candidate.push_str(word);

        if text_width(&candidate, scale) <= max_width {
            current.push(word);
        } else if current.is_empty() {
            lines.push(word.to_string());
        } else {
            lines.push(current.join(" "));
            current = vec![word];
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }
    lines
}

/// Parses `#rrggbb` (or `rrggbb`, or `#rgb`) into a colour.
pub fn parse_hex_color(value: &str) -> Option<Rgb<u8>> {
    let hex = value.trim().trim_start_matches('#');
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |range: std::ops::Range<usize>| {
        expanded
            .get(range)
            .and_then(|part| u8::from_str_radix(part, 16).ok())
    };
    Some(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
}
