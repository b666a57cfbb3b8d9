// Chart domain model - turns a snapshot and view state into a line chart
use super::snapshot::{Snapshot, SnapshotError, Timestamp};
use super::view_state::ViewState;
use serde::{Deserialize, Serialize};

pub const BASE_BORDER_WIDTH: f64 = 2.0;
pub const HIGHLIGHT_WEIGHT_FACTOR: f64 = 3.0;
pub const DATA_POINT_RADIUS: f64 = 2.0;
pub const HUE_STEP: usize = 35;
pub const TICK_DECIMALS: usize = 1;

/// Numeric inputs next to the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartControls {
    pub y_min: f64,
    pub y_max: f64,
    pub alarm_limit: f64,
    pub warning_limit: f64,
}

impl Default for ChartControls {
    fn default() -> Self {
        Self {
            y_min: -50.0,
            y_max: 50.0,
            alarm_limit: 25.0,
            warning_limit: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesKind {
    Data,
    Threshold,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSeries {
    pub label: String,
    pub kind: SeriesKind,
    pub values: Vec<f64>,
    pub color: String,
    pub border_width: f64,
    pub border_dash: Option<[u8; 2]>,
    pub point_radius: f64,
    pub hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YAxis {
    pub min: f64,
    pub max: f64,
    pub tick_decimals: usize,
}

impl YAxis {
    pub fn format_tick(&self, value: f64) -> String {
        format!("{:.*}", self.tick_decimals, value)
    }
}

/// Everything a line-chart surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSpec {
    pub labels: Vec<Timestamp>,
    pub series: Vec<LineSeries>,
    pub y_axis: YAxis,
    pub show_legend: bool,
    pub animate: bool,
}

impl RenderSpec {
    pub fn data_series(&self) -> impl Iterator<Item = &LineSeries> {
        self.series.iter().filter(|s| s.kind == SeriesKind::Data)
    }

    pub fn threshold_series(&self) -> impl Iterator<Item = &LineSeries> {
        self.series.iter().filter(|s| s.kind == SeriesKind::Threshold)
    }
}

/// Warning (WSL) and alarm (AL) bounds drawn as dashed constant lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    WarningUpper,
    WarningLower,
    AlarmUpper,
    AlarmLower,
}

pub const THRESHOLDS: [Threshold; 4] = [
    Threshold::WarningUpper,
    Threshold::WarningLower,
    Threshold::AlarmUpper,
    Threshold::AlarmLower,
];

impl Threshold {
    pub fn label(self) -> &'static str {
        match self {
            Threshold::WarningUpper => "WSL +",
            Threshold::WarningLower => "WSL -",
            Threshold::AlarmUpper => "AL +",
            Threshold::AlarmLower => "AL -",
        }
    }

    pub fn value(self, controls: &ChartControls) -> f64 {
        match self {
            Threshold::WarningUpper => controls.warning_limit,
            Threshold::WarningLower => -controls.warning_limit,
            Threshold::AlarmUpper => controls.alarm_limit,
            Threshold::AlarmLower => -controls.alarm_limit,
        }
    }

    fn line(self, controls: &ChartControls, samples: usize) -> LineSeries {
        let (color, dash, width) = match self {
            Threshold::WarningUpper | Threshold::WarningLower => ("orange", [6, 4], 1.0),
            Threshold::AlarmUpper | Threshold::AlarmLower => ("red", [4, 4], 2.0),
        };

        LineSeries {
            label: self.label().to_string(),
            kind: SeriesKind::Threshold,
            values: vec![self.value(controls); samples],
            color: color.to_string(),
            border_width: width,
            border_dash: Some(dash),
            point_radius: 0.0,
            hidden: false,
        }
    }
}

/// Hue for the series at `index`; stable for a fixed id order.
pub fn series_hue(index: usize) -> u32 {
    ((index * HUE_STEP) % 360) as u32
}

pub fn series_color(index: usize) -> String {
    format!("hsl({}, 70%, 45%)", series_hue(index))
}

/// Build the chart for `snapshot` as seen through `state`.
///
/// Values are plotted exactly as received. Threshold lines ignore highlight
/// and hide state, and the y-axis uses the user's bounds as given.
pub fn render(
    snapshot: &Snapshot,
    state: &ViewState,
    controls: &ChartControls,
) -> Result<RenderSpec, SnapshotError> {
    let rows = snapshot.axis(&state.selected_axis)?;

    let mut series: Vec<LineSeries> = snapshot
        .ids
        .iter()
        .zip(rows)
        .enumerate()
        .map(|(index, (id, values))| {
            let border_width = if state.is_highlighted(id) {
                BASE_BORDER_WIDTH * HIGHLIGHT_WEIGHT_FACTOR
            } else {
                BASE_BORDER_WIDTH
            };

            LineSeries {
                label: id.clone(),
                kind: SeriesKind::Data,
                values: values.clone(),
                color: series_color(index),
                border_width,
                border_dash: None,
                point_radius: DATA_POINT_RADIUS,
                hidden: state.is_hidden(id),
            }
        })
        .collect();

    let samples = snapshot.timestamps.len();
    series.extend(THRESHOLDS.iter().map(|t| t.line(controls, samples)));

    Ok(RenderSpec {
        labels: snapshot.timestamps.clone(),
        series,
        y_axis: YAxis {
            min: controls.y_min,
            max: controls.y_max,
            tick_decimals: TICK_DECIMALS,
        },
        show_legend: false,
        animate: false,
    })
}
