use askama::Template;
use askama_web::WebTemplate;

use crate::constants::{DEFAULT_LAYOUT_PRESET, DEFAULT_PANELS, MAX_PANELS};
use crate::layout::{PRESETS, PageFormat};

#[derive(Clone, Debug)]
pub(crate) struct PresetOption {
    pub(crate) id: &'static str,
    pub(crate) label: &'static str,
    pub(crate) panels: usize,
    pub(crate) selected: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct PageOption {
    pub(crate) id: &'static str,
    pub(crate) label: &'static str,
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    pub(crate) presets: Vec<PresetOption>,
    pub(crate) pages: Vec<PageOption>,
    pub(crate) styles: Vec<&'static str>,
    pub(crate) default_panels: usize,
    pub(crate) max_panels: usize,
}

/// handles the / GET
pub(crate) async fn index_handler() -> IndexTemplate {
    let presets = PRESETS
        .iter()
        .map(|preset| PresetOption {
            id: preset.id,
            label: preset.label,
            panels: preset.panel_count(),
            selected: preset.id == DEFAULT_LAYOUT_PRESET,
        })
        .collect();
    let pages = [PageFormat::A4Portrait, PageFormat::A4Landscape]
        .into_iter()
        .map(|format| PageOption {
            id: format.id(),
            label: match format {
                PageFormat::A4Portrait => "A4 portrait",
                PageFormat::A4Landscape => "A4 landscape",
            },
        })
        .collect();

    IndexTemplate {
        presets,
        pages,
        styles: vec!["anime", "manga", "cartoon", "realistic"],
        default_panels: DEFAULT_PANELS,
        max_panels: MAX_PANELS,
    }
}
