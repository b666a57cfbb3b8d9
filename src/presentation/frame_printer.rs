// Text and JSON rendering of dashboard frames for the watch client
use crate::application::view_model::{Frame, IdChip};
use crate::domain::chart::RenderSpec;

const ID_COLUMN_WIDTH: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn format_frame(frame: &Frame, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(describe(frame)),
        OutputFormat::Json => Ok(serde_json::to_string(frame)?),
    }
}

/// The id list in two columns, highlighted ids marked with `*`.
pub fn id_columns(chips: &[IdChip]) -> Vec<String> {
    let cell = |chip: &IdChip| {
        let marker = if chip.highlighted { "*" } else { " " };
        format!("{}{}", marker, chip.id)
    };

    chips
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => format!("{:<width$}{}", cell(left), cell(right), width = ID_COLUMN_WIDTH),
            [single] => cell(single),
            _ => String::new(),
        })
        .collect()
}

fn describe(frame: &Frame) -> String {
    let mut lines = Vec::new();

    match &frame.header {
        Some(header) => {
            lines.push(format!("== {} ==", header.page_header));
            lines.push(header.panel_title.clone());
        }
        None => lines.push("== no project selected ==".to_string()),
    }

    if !frame.projects.is_empty() {
        let nav: Vec<String> = frame
            .projects
            .iter()
            .map(|entry| {
                if entry.active {
                    format!("[{}]", entry.project)
                } else {
                    entry.project.clone()
                }
            })
            .collect();
        lines.push(format!("projects: {}", nav.join(" ")));
    }

    match &frame.render {
        Some(render) => describe_chart(render, &mut lines),
        None => lines.push("chart: waiting for data".to_string()),
    }

    if frame.panel_visible {
        lines.extend(id_columns(&frame.ids).into_iter().map(|row| format!("  {}", row)));
    }

    lines.push(format!("[{}] [{}]", frame.visibility_label, frame.panel_label));
    lines.join("\n")
}

fn describe_chart(render: &RenderSpec, lines: &mut Vec<String>) {
    let axis = &render.y_axis;
    let span = match (render.labels.first(), render.labels.last()) {
        (Some(first), Some(last)) => format!("{} .. {}", first, last),
        _ => "no samples".to_string(),
    };
    lines.push(format!(
        "chart: {} samples ({}), y {} .. {}",
        render.labels.len(),
        span,
        axis.format_tick(axis.min),
        axis.format_tick(axis.max)
    ));

    let mut hidden = 0;
    for series in render.data_series() {
        if series.hidden {
            hidden += 1;
            continue;
        }
        let last = series
            .values
            .last()
            .map(|v| axis.format_tick(*v))
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "  {:<12} {:<20} last {:>8}  width {}",
            series.label, series.color, last, series.border_width
        ));
    }
    if hidden > 0 {
        lines.push(format!("  ({} series hidden)", hidden));
    }

    let limits: Vec<String> = render
        .threshold_series()
        .map(|s| {
            let value = s.values.first().copied().unwrap_or_default();
            format!("{} {}", s.label, axis.format_tick(value))
        })
        .collect();
    if !limits.is_empty() {
        lines.push(format!("  limits: {}", limits.join(", ")));
    }
}
