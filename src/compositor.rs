//! Page compositor: lays rendered panels out on a page canvas.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::{debug, error, info};

use crate::error::ComicError;
use crate::glyphs::{draw_text_centered, parse_hex_color};
use crate::layout::{LayoutGeometry, LayoutPreset, PageFormat, PageSize, PixelRect};

const MISSING_PANEL_BG: Rgb<u8> = Rgb([0xF0, 0xF0, 0xF0]);
const MISSING_PANEL_TEXT: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);

/// Picks the geometry for a comic: the client's if it has any cells,
/// otherwise the named preset.
pub fn resolve_geometry(layout_preset: &str, geometry: Option<LayoutGeometry>) -> LayoutGeometry {
    match geometry {
        Some(geometry) if !geometry.cells.is_empty() => geometry,
        _ => {
            let preset = LayoutPreset::resolve(layout_preset);
            debug!("Using preset layout {}", preset.id);
            preset.geometry()
        }
    }
}

fn load_panel(path: &Path, rect: PixelRect) -> Result<RgbImage, image::ImageError> {
    let img = image::open(path)?;
    Ok(img.resize_exact(rect.w, rect.h, FilterType::Lanczos3).to_rgb8())
}

fn missing_panel(rect: PixelRect, panel_number: usize, scale: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(rect.w, rect.h, MISSING_PANEL_BG);
    draw_text_centered(
        &mut img,
        i64::from(rect.w / 2),
        i64::from(rect.h / 2),
        &format!("Panel {panel_number}"),
        MISSING_PANEL_TEXT,
        scale,
    );
    img
}

fn draw_border(canvas: &mut RgbImage, rect: PixelRect, thickness: u32, color: Rgb<u8>) {
    let x_end = rect.x.saturating_add(rect.w).min(canvas.width());
    let y_end = rect.y.saturating_add(rect.h).min(canvas.height());
    let thickness = thickness.min(rect.w / 2).min(rect.h / 2);
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            let from_left = x - rect.x;
            let from_top = y - rect.y;
            let from_right = rect.x + rect.w - 1 - x;
            let from_bottom = rect.y + rect.h - 1 - y;
            if from_left.min(from_top).min(from_right).min(from_bottom) < thickness {
                canvas.put_pixel(x, y, color);
            }
        }
    }
}

/// Composes panel images onto a blank page.
///
/// Images are paired with cells by position; surplus images are dropped.
/// An image that can't be loaded becomes a flat "Panel N" card.
pub fn compose(image_paths: &[PathBuf], geometry: &LayoutGeometry, page: PageSize) -> RgbImage {
    let bg = parse_hex_color(&geometry.page.bg).unwrap_or(WHITE);
    let border = parse_hex_color(&geometry.panel.border_color).unwrap_or(Rgb([0, 0, 0]));
    let mut canvas = RgbImage::from_pixel(page.width, page.height, bg);

    if image_paths.len() > geometry.cells.len() {
        info!(
            "Dropping {} panels that have no layout cell",
            image_paths.len() - geometry.cells.len()
        );
    }

    for (i, (path, cell)) in image_paths.iter().zip(&geometry.cells).enumerate() {
        if cell.index != i {
            debug!("Cell {} declares index {}, placing positionally", i, cell.index);
        }
        let rect = cell.bounds(page, geometry.outer_margin_px);
        if rect.w == 0 || rect.h == 0 {
            debug!("Skipping zero-sized cell {}", i);
            continue;
        }

        let panel = match load_panel(path, rect) {
            Ok(panel) => panel,
            Err(err) => {
                error!("Failed to load panel image {}: {}", path.display(), err);
                let scale = (rect.w.min(rect.h) / 160).max(1);
                missing_panel(rect, i + 1, scale)
            }
        };
        imageops::replace(&mut canvas, &panel, i64::from(rect.x), i64::from(rect.y));

        if geometry.panel.border_px > 0 {
            draw_border(&mut canvas, rect, geometry.panel.border_px, border);
        }
    }
    canvas
}

/// Assembles comic pages into the comics directory.
#[derive(Clone, Debug)]
pub struct Compositor {
    comics_dir: PathBuf,
}

impl Compositor {
    /// Compositor writing under `comics_dir`.
    pub fn new(comics_dir: impl Into<PathBuf>) -> Self {
        Self {
            comics_dir: comics_dir.into(),
        }
    }

    /// Builds the page and writes it under a random name.
    ///
    /// Bad panels don't fail the page; only failing to write the page does.
    pub fn assemble(
        &self,
        image_paths: &[PathBuf],
        layout_preset: &str,
        page_format: PageFormat,
        geometry: Option<LayoutGeometry>,
    ) -> Result<PathBuf, ComicError> {
        let geometry = resolve_geometry(layout_preset, geometry);
        let canvas = compose(image_paths, &geometry, page_format.size());

        std::fs::create_dir_all(&self.comics_dir)?;
        let suffix: u64 = rand::random();
        let output_path = self.comics_dir.join(format!("comic_{suffix:016x}.png"));
        canvas.save_with_format(&output_path, image::ImageFormat::Png)?;
        info!("Comic assembled: {}", output_path.display());
        Ok(output_path)
    }

    /// Where pages go
    pub fn comics_dir(&self) -> &Path {
        &self.comics_dir
    }
}
