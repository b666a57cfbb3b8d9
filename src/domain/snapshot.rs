// Snapshot domain model - one fetched dataset for a project
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Axes of a survey payload, read from the last three columns of every row.
pub const SURVEY_AXES: [&str; 3] = ["dx", "dy", "dz"];

/// A label on the shared time axis.
///
/// Survey files named with a date produce ISO-8601 labels; files without one
/// fall back to their modification time in epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Epoch(f64),
    Label(String),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Label(label) => f.write_str(label),
            Timestamp::Epoch(secs) if secs.fract() == 0.0 => write!(f, "{}", *secs as i64),
            Timestamp::Epoch(secs) => write!(f, "{}", secs),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SnapshotError {
    #[error("snapshot contains no series ids")]
    NoIds,
    #[error("axis '{axis}' has {rows} rows for {ids} ids")]
    RowCount { axis: String, rows: usize, ids: usize },
    #[error("series '{id}' on axis '{axis}' has {samples} samples for {timestamps} timestamps")]
    SampleCount {
        axis: String,
        id: String,
        samples: usize,
        timestamps: usize,
    },
    #[error("axis '{0}' is not present in the snapshot")]
    UnknownAxis(String),
}

/// All series of a project at one point in time.
///
/// `axes` maps an axis name (`dx`, `dy`, `dz`, ...) to one row per id, each
/// row aligned with `timestamps`. On the wire the axes sit next to `ids` and
/// `timestamps` as top-level keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamps: Vec<Timestamp>,
    pub ids: Vec<String>,
    #[serde(flatten)]
    pub axes: BTreeMap<String, Vec<Vec<f64>>>,
}

impl Snapshot {
    pub fn new(
        timestamps: Vec<Timestamp>,
        ids: Vec<String>,
        axes: BTreeMap<String, Vec<Vec<f64>>>,
    ) -> Self {
        Self {
            timestamps,
            ids,
            axes,
        }
    }

    /// Payload with no points that still carries every survey axis key.
    pub fn empty() -> Self {
        let axes = SURVEY_AXES
            .iter()
            .map(|axis| (axis.to_string(), Vec::new()))
            .collect();
        Self::new(Vec::new(), Vec::new(), axes)
    }

    /// Check that every axis row lines up with `ids` and `timestamps`.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.ids.is_empty() {
            return Err(SnapshotError::NoIds);
        }

        for (axis, rows) in &self.axes {
            if rows.len() != self.ids.len() {
                return Err(SnapshotError::RowCount {
                    axis: axis.clone(),
                    rows: rows.len(),
                    ids: self.ids.len(),
                });
            }

            for (id, row) in self.ids.iter().zip(rows) {
                if row.len() != self.timestamps.len() {
                    return Err(SnapshotError::SampleCount {
                        axis: axis.clone(),
                        id: id.clone(),
                        samples: row.len(),
                        timestamps: self.timestamps.len(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn axis(&self, name: &str) -> Result<&[Vec<f64>], SnapshotError> {
        self.axes
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SnapshotError::UnknownAxis(name.to_string()))
    }

    pub fn has_axis(&self, name: &str) -> bool {
        self.axes.contains_key(name)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.iter().any(|candidate| candidate == id)
    }
}
