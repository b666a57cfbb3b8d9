// Project domain model
use serde::Serialize;

/// Length of the survey window named in the panel title.
pub const TREND_WINDOW_DAYS: u32 = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Project folder names double as URL and path components, so anything
    /// that could escape the projects directory is refused.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && !name.contains("..")
            && !name.contains(['/', '\\', '\0'])
    }

    pub fn header(&self) -> HeaderText {
        HeaderText {
            panel_title: format!(
                "{} Displacement Trend (Last {} Days)",
                self.name, TREND_WINDOW_DAYS
            ),
            page_header: format!("{} Displacement Trend", self.name),
        }
    }
}

/// Text shown above the chart for the active project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderText {
    pub panel_title: String,
    pub page_header: String,
}
