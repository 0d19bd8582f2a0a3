//! Plain-data model of the upload page the controller drives.

use shared::domain::ProgressState;

pub const SUBMIT_IDLE_LABEL: &str = "Procesar Video";
pub const SUBMIT_BUSY_LABEL: &str = "Procesando...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Progress,
    Result,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub enabled: bool,
    pub label: String,
}

impl SubmitControl {
    pub fn idle() -> Self {
        Self {
            enabled: true,
            label: SUBMIT_IDLE_LABEL.to_string(),
        }
    }

    pub fn busy() -> Self {
        Self {
            enabled: false,
            label: SUBMIT_BUSY_LABEL.to_string(),
        }
    }
}

/// Everything a front end needs to draw the page. At most one of the three
/// panels is visible at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub file_info: String,
    pub submit: SubmitControl,
    pub visible_panel: Option<Panel>,
    pub progress: ProgressState,
    pub subtitle_href: Option<String>,
    pub video_href: Option<String>,
    pub error_message: String,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            file_info: String::new(),
            submit: SubmitControl::idle(),
            visible_panel: None,
            progress: ProgressState::default(),
            subtitle_href: None,
            video_href: None,
            error_message: String::new(),
        }
    }
}

impl PageState {
    pub fn is_visible(&self, panel: Panel) -> bool {
        self.visible_panel == Some(panel)
    }
}
