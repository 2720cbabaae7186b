//! Per-panel image prompts with cross-panel consistency cues.

use tracing::debug;

use crate::panels::PanelSpec;

/// The first non-empty character description across the whole comic.
///
/// Every panel gets this anchor, including panels that list nobody, so the
/// renderer keeps drawing the same protagonist.
pub fn consistency_anchor(all_panels: &[PanelSpec]) -> Option<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for panel in all_panels {
        let chars = panel.characters.as_str();
        if !chars.is_empty() && !seen.contains(&chars) {
            seen.push(chars);
        }
    }
    seen.first().copied()
}

/// Weighted render prompt for `panel`.
///
/// Term order is fixed: character, setting, camera, mood, then the panel's
/// own description.
pub fn enhance(panel: &PanelSpec, all_panels: &[PanelSpec]) -> String {
    let mut terms = Vec::with_capacity(5);
    if let Some(anchor) = consistency_anchor(all_panels) {
        terms.push(format!("(consistent character: {anchor}:1.3)"));
    }
    if !panel.setting.is_empty() {
        terms.push(format!("(setting: {}:1.1)", panel.setting));
    }
    terms.push(format!("({}:1.2)", panel.camera_angle));
    terms.push(format!("({} mood:1.1)", panel.emotion));

    debug!(
        "Enhanced panel {} prompt with consistency elements",
        panel.index
    );
    format!("{}, {}", terms.join(", "), panel.description)
}
