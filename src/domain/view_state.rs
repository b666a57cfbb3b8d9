// View state - what the user has selected, independent of any snapshot
use std::time::Duration;

pub const DEFAULT_AXIS: &str = "dy";
pub const DEFAULT_REFRESH_SECS: u64 = 60;

pub const HIDE_ALL_LABEL: &str = "Hide All";
pub const SHOW_ALL_LABEL: &str = "Show All";
pub const HIDE_PANEL_LABEL: &str = "Hide Panel";
pub const SHOW_PANEL_LABEL: &str = "Show Panel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub selected_axis: String,
    pub selected_project: Option<String>,
    /// At most one highlighted series; everything else is hidden while set.
    pub highlighted: Option<String>,
    pub all_hidden: bool,
    pub panel_visible: bool,
    pub refresh_interval: Duration,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            selected_axis: DEFAULT_AXIS.to_string(),
            selected_project: None,
            highlighted: None,
            all_hidden: false,
            panel_visible: true,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
        }
    }
}

impl ViewState {
    pub fn new(selected_axis: impl Into<String>, refresh_interval: Duration) -> Self {
        Self {
            selected_axis: selected_axis.into(),
            refresh_interval,
            ..Self::default()
        }
    }

    /// Selecting the highlighted id again shows everything; a different id
    /// becomes the only visible series.
    pub fn toggle_highlight(&mut self, id: &str) {
        if self.highlighted.as_deref() == Some(id) {
            self.highlighted = None;
        } else {
            self.highlighted = Some(id.to_string());
        }
        self.all_hidden = false;
    }

    pub fn set_all_hidden(&mut self, hidden: bool) {
        self.all_hidden = hidden;
        self.highlighted = None;
    }

    /// Drop a highlight that no longer names a series in `ids`.
    pub fn retain_highlight(&mut self, ids: &[String]) {
        if let Some(id) = &self.highlighted {
            if !ids.iter().any(|candidate| candidate == id) {
                tracing::debug!("Clearing stale highlight {}", id);
                self.highlighted = None;
            }
        }
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        match &self.highlighted {
            Some(highlighted) => highlighted != id,
            None => self.all_hidden,
        }
    }

    pub fn is_highlighted(&self, id: &str) -> bool {
        self.highlighted.as_deref() == Some(id)
    }

    pub fn toggle_panel(&mut self) {
        self.panel_visible = !self.panel_visible;
    }

    pub fn visibility_label(&self) -> &'static str {
        if self.all_hidden {
            SHOW_ALL_LABEL
        } else {
            HIDE_ALL_LABEL
        }
    }

    pub fn panel_label(&self) -> &'static str {
        if self.panel_visible {
            HIDE_PANEL_LABEL
        } else {
            SHOW_PANEL_LABEL
        }
    }
}
