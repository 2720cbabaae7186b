//! Page formats, layout geometry and the named layout presets.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LAYOUT_PRESET;

/// Pixel size of a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSize {
    /// Pixels across
    pub width: u32,
    /// Pixels down
    pub height: u32,
}

/// Supported page formats, A4 at 300 DPI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum PageFormat {
    /// 210x297mm
    #[default]
    #[serde(rename = "A4-P")]
    A4Portrait,
    /// 297x210mm
    #[serde(rename = "A4-L")]
    A4Landscape,
}

impl PageFormat {
    /// Resolves a format id; unknown ids fall back to portrait.
    ///
    /// Accepts `A4-P` / `A4-L` as well as the short `a4p` / `a4l` forms.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "a4l" => PageFormat::A4Landscape,
            _ => PageFormat::A4Portrait,
        }
    }

    /// Canonical id, `A4-P` or `A4-L`
    pub fn id(self) -> &'static str {
        match self {
            PageFormat::A4Portrait => "A4-P",
            PageFormat::A4Landscape => "A4-L",
        }
    }

    /// Canvas size in pixels
    pub fn size(self) -> PageSize {
        match self {
            PageFormat::A4Portrait => PageSize {
                width: 2480,
                height: 3508,
            },
            PageFormat::A4Landscape => PageSize {
                width: 3508,
                height: 2480,
            },
        }
    }
}

/// One panel slot, in fractions of the content area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Declared panel number. Carried along but not used for placement.
    #[serde(default)]
    pub index: usize,
    /// Left edge, 0..1
    pub x: f64,
    /// Top edge, 0..1
    pub y: f64,
    /// Width, 0..1
    pub w: f64,
    /// Height, 0..1
    pub h: f64,
}

/// Pixel rectangle on the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width
    pub w: u32,
    /// Height
    pub h: u32,
}

impl Cell {
    /// Scales the cell against the page minus its outer margin.
    ///
    /// Fractions are clamped to 0..1 and the content area never goes
    /// negative, so this can't overflow whatever the client sent.
    pub fn bounds(&self, page: PageSize, margin: u32) -> PixelRect {
        let content_w = page.width.saturating_sub(margin.saturating_mul(2));
        let content_h = page.height.saturating_sub(margin.saturating_mul(2));
        let scale = |fraction: f64, extent: u32| -> u32 {
            let fraction = if fraction.is_finite() {
                fraction.clamp(0.0, 1.0)
            } else {
                0.0
            };
            (fraction * f64::from(extent)) as u32
        };
        PixelRect {
            x: margin.saturating_add(scale(self.x, content_w)),
            y: margin.saturating_add(scale(self.y, content_h)),
            w: scale(self.w, content_w),
            h: scale(self.h, content_h),
        }
    }
}

fn default_page_bg() -> String {
    "#ffffff".to_string()
}

fn default_outer_margin() -> u32 {
    24
}

fn default_border_color() -> String {
    "#000000".to_string()
}

/// Page-level styling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageStyle {
    /// Background colour, `#rrggbb`
    #[serde(default = "default_page_bg")]
    pub bg: String,
}

impl Default for PageStyle {
    fn default() -> Self {
        Self {
            bg: default_page_bg(),
        }
    }
}

/// Decorative panel border.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelStyle {
    /// Border thickness; 0 draws nothing
    #[serde(default)]
    pub border_px: u32,
    /// Border colour, `#rrggbb`
    #[serde(default = "default_border_color")]
    pub border_color: String,
}

impl Default for PanelStyle {
    fn default() -> Self {
        Self {
            border_px: 0,
            border_color: default_border_color(),
        }
    }
}

/// Where panels go on the page.
///
/// Cells are consumed in order: panel `i` lands in `cells[i]` whatever that
/// cell's `index` says, and panels beyond the last cell are dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGeometry {
    /// Panel slots, in placement order
    #[serde(default)]
    pub cells: Vec<Cell>,
    /// Blank border around the content area
    #[serde(default = "default_outer_margin")]
    pub outer_margin_px: u32,
    /// Page styling
    #[serde(default)]
    pub page: PageStyle,
    /// Panel styling
    #[serde(default)]
    pub panel: PanelStyle,
}

impl LayoutGeometry {
    /// True when the margin leaves some content area on `page`.
    pub fn fits(&self, page: PageSize) -> bool {
        let double = self.outer_margin_px.saturating_mul(2);
        double < page.width && double < page.height
    }
}

/// Grid placement of one panel in a preset, 1-based like CSS grid lines.
#[derive(Clone, Copy, Debug)]
struct GridSlot {
    col_start: u32,
    col_span: u32,
    row_start: u32,
    row_span: u32,
}

const fn slot(col_start: u32, col_span: u32, row_start: u32, row_span: u32) -> GridSlot {
    GridSlot {
        col_start,
        col_span,
        row_start,
        row_span,
    }
}

/// A named page layout.
#[derive(Debug)]
pub struct LayoutPreset {
    /// Preset id, eg `Layout0`
    pub id: &'static str,
    /// Human readable name
    pub label: &'static str,
    cols: u32,
    rows: u32,
    slots: &'static [GridSlot],
}

/// Gap between preset cells, in thousandths of the content area
const PRESET_GUTTER_PERMILLE: f64 = 40.0;
/// Outer margin for preset layouts
const PRESET_MARGIN_PX: u32 = 60;

/// Every layout the service knows by name.
pub static PRESETS: &[LayoutPreset] = &[
    LayoutPreset {
        id: "Layout0",
        label: "2×2 grid (4 equal)",
        cols: 2,
        rows: 2,
        slots: &[slot(1, 1, 1, 1), slot(2, 1, 1, 1), slot(1, 1, 2, 1), slot(2, 1, 2, 1)],
    },
    LayoutPreset {
        id: "Layout1",
        label: "Tall middle columns",
        cols: 2,
        rows: 3,
        slots: &[slot(1, 1, 1, 1), slot(2, 1, 1, 2), slot(1, 1, 2, 2), slot(2, 1, 3, 1)],
    },
    LayoutPreset {
        id: "Layout2",
        label: "Right column tall",
        cols: 3,
        rows: 2,
        slots: &[slot(1, 1, 1, 1), slot(2, 1, 1, 1), slot(3, 1, 1, 2), slot(1, 2, 2, 1)],
    },
    LayoutPreset {
        id: "Layout3",
        label: "Wide top + mixed right",
        cols: 3,
        rows: 2,
        slots: &[slot(1, 2, 1, 1), slot(3, 1, 1, 1), slot(1, 1, 2, 1), slot(2, 2, 2, 1)],
    },
    LayoutPreset {
        id: "Layout5",
        label: "Stacked big bottom (5 panels)",
        cols: 3,
        rows: 3,
        slots: &[
            slot(1, 2, 1, 1),
            slot(3, 1, 1, 1),
            slot(1, 1, 2, 1),
            slot(2, 2, 2, 1),
            slot(1, 3, 3, 1),
        ],
    },
];

impl LayoutPreset {
    /// Looks a preset up by id
    pub fn find(id: &str) -> Option<&'static LayoutPreset> {
        PRESETS.iter().find(|preset| preset.id == id)
    }

    /// Looks a preset up by id, falling back to `Layout0`.
    pub fn resolve(id: &str) -> &'static LayoutPreset {
        Self::find(id)
            .or_else(|| Self::find(DEFAULT_LAYOUT_PRESET))
            .unwrap_or(&PRESETS[0])
    }

    /// How many panels the preset holds
    pub fn panel_count(&self) -> usize {
        self.slots.len()
    }

    /// Normalized geometry for this preset.
    pub fn geometry(&self) -> LayoutGeometry {
        let gutter = PRESET_GUTTER_PERMILLE / 1000.0;
        let cols = f64::from(self.cols);
        let rows = f64::from(self.rows);
        let cell_w = (1.0 - (cols - 1.0) * gutter) / cols;
        let cell_h = (1.0 - (rows - 1.0) * gutter) / rows;

        let cells = self
            .slots
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                let col = f64::from(slot.col_start - 1);
                let row = f64::from(slot.row_start - 1);
                let col_span = f64::from(slot.col_span);
                let row_span = f64::from(slot.row_span);
                Cell {
                    index,
                    x: col * cell_w + col * gutter,
                    y: row * cell_h + row * gutter,
                    w: col_span * cell_w + (col_span - 1.0) * gutter,
                    h: row_span * cell_h + (row_span - 1.0) * gutter,
                }
            })
            .collect();

        LayoutGeometry {
            cells,
            outer_margin_px: PRESET_MARGIN_PX,
            page: PageStyle::default(),
            panel: PanelStyle {
                border_px: 2,
                border_color: default_border_color(),
            },
        }
    }
}

/// Serializable summary of a preset for the API.
#[derive(Clone, Debug, Serialize)]
pub struct PresetSummary {
    /// Preset id
    pub id: &'static str,
    /// Human readable name
    pub label: &'static str,
    /// Panels in the layout
    pub panels: usize,
    /// Normalized geometry
    pub geometry: LayoutGeometry,
}

/// All presets, for listing.
pub fn preset_summaries() -> Vec<PresetSummary> {
    PRESETS
        .iter()
        .map(|preset| PresetSummary {
            id: preset.id,
            label: preset.label,
            panels: preset.panel_count(),
            geometry: preset.geometry(),
        })
        .collect()
}
