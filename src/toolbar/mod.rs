//! # Toolbar
//!
//! Document actions and formatting commands as values. The host maps its
//! buttons to a [`ToolbarAction`]; the editor interprets it.

pub mod format;
pub mod table_picker;

pub use format::{Align, FormattingCommand, TextRange};
pub use table_picker::{SavedSelection, TableInsertion, TablePicker};

use serde::{Deserialize, Serialize};

/// Discrete zoom steps, in percent.
pub const ZOOM_STEPS: [u32; 9] = [50, 75, 90, 100, 110, 125, 150, 175, 200];

/// A zoom level, always one of [`ZOOM_STEPS`]. Applied to the pages as a
/// CSS scale transform; layout itself is never zoomed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomLevel(u32);

impl Default for ZoomLevel {
    fn default() -> Self {
        ZoomLevel(100)
    }
}

impl ZoomLevel {
    /// The step nearest to `percent`.
    pub fn nearest(percent: u32) -> Self {
        let step = ZOOM_STEPS
            .iter()
            .copied()
            .min_by_key(|s| s.abs_diff(percent))
            .unwrap_or(100);
        ZoomLevel(step)
    }

    pub fn percent(&self) -> u32 {
        self.0
    }

    pub fn scale(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn zoom_in(&self) -> Self {
        ZOOM_STEPS
            .iter()
            .copied()
            .find(|s| *s > self.0)
            .map(ZoomLevel)
            .unwrap_or(*self)
    }

    pub fn zoom_out(&self) -> Self {
        ZOOM_STEPS
            .iter()
            .rev()
            .copied()
            .find(|s| *s < self.0)
            .map(ZoomLevel)
            .unwrap_or(*self)
    }

    /// Inline style for the page container.
    pub fn css_transform(&self) -> String {
        format!("transform: scale({}); transform-origin: top center", self.scale())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ToolbarAction {
    Undo,
    Redo,
    Print,
    SaveDraft,
    Preview,
    GenerateFinal,
    SubmitForApproval,
    ZoomIn,
    ZoomOut,
    Zoom { percent: u32 },
    Format { command: FormattingCommand },
}

impl ToolbarAction {
    /// Actions that change the document and so go through undo history.
    pub fn is_edit(&self) -> bool {
        matches!(self, ToolbarAction::Format { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_steps_saturate() {
        let z = ZoomLevel::default();
        assert_eq!(z.zoom_in().percent(), 110);
        assert_eq!(z.zoom_out().percent(), 90);
        assert_eq!(ZoomLevel::nearest(200).zoom_in().percent(), 200);
        assert_eq!(ZoomLevel::nearest(10).zoom_out().percent(), 50);
        assert_eq!(ZoomLevel::nearest(130).percent(), 125);
    }

    #[test]
    fn scale_transform() {
        assert_eq!(
            ZoomLevel::nearest(150).css_transform(),
            "transform: scale(1.5); transform-origin: top center"
        );
    }

    #[test]
    fn actions_from_json() {
        let a: ToolbarAction = serde_json::from_str(r#"{"action":"zoom","percent":75}"#).unwrap();
        assert_eq!(a, ToolbarAction::Zoom { percent: 75 });
        let f: ToolbarAction = serde_json::from_str(
            r#"{"action":"format","command":{"command":"toggleList","value":{"ordered":true}}}"#,
        )
        .unwrap();
        assert_eq!(
            f,
            ToolbarAction::Format {
                command: FormattingCommand::ToggleList { ordered: true }
            }
        );
        assert!(f.is_edit());
    }
}
