// Survey file repository - one folder of *.dat surveys per project
use crate::application::survey_repository::SurveyRepository;
use crate::domain::project::Project;
use crate::domain::snapshot::{Snapshot, Timestamp, SURVEY_AXES};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

const SURVEY_EXTENSION: &str = "dat";
const PLACEHOLDERS: [&str; 6] = ["data", "dx", "dy", "dz", "nodata", "no"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone)]
pub struct DatDirectoryRepository {
    root: PathBuf,
}

#[derive(Debug)]
struct Survey {
    timestamp: Timestamp,
    points: BTreeMap<String, [f64; 3]>,
}

impl DatDirectoryRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn project_dir(&self, project: &str) -> Result<PathBuf> {
        anyhow::ensure!(
            Project::is_valid_name(project),
            "invalid project name {:?}",
            project
        );
        Ok(self.root.join(project))
    }
}

#[async_trait]
impl SurveyRepository for DatDirectoryRepository {
    async fn list_projects(&self) -> Result<Vec<String>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || list_project_dirs(&root)).await?
    }

    async fn load_project(&self, project: &str) -> Result<Snapshot> {
        let dir = self.project_dir(project)?;
        tokio::task::spawn_blocking(move || load_project_dir(&dir)).await?
    }
}

fn list_project_dirs(root: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("Failed to read projects folder {}", root.display()))?;

    let mut projects = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if Project::is_valid_name(name) {
                projects.push(name.to_string());
            }
        }
    }

    projects.sort();
    Ok(projects)
}

fn load_project_dir(dir: &Path) -> Result<Snapshot> {
    if !dir.is_dir() {
        tracing::error!("Project folder not found: {}", dir.display());
        return Ok(Snapshot::empty());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(SURVEY_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();

    let mut surveys = Vec::new();
    for path in &files {
        let survey = read_survey(path)?;
        if survey.points.is_empty() {
            tracing::warn!("Skipping survey without readable points: {}", path.display());
            continue;
        }
        surveys.push(survey);
    }

    tracing::debug!("Read {} surveys from {}", surveys.len(), dir.display());
    Ok(assemble(surveys))
}

fn read_survey(path: &Path) -> Result<Survey> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    let timestamp = match parse_file_timestamp(name) {
        Some(at) => Timestamp::Label(at.format(TIMESTAMP_FORMAT).to_string()),
        None => Timestamp::Epoch(modified_secs(path)?),
    };

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let points = parse_survey_rows(&String::from_utf8_lossy(&bytes));

    Ok(Survey { timestamp, points })
}

fn modified_secs(path: &Path) -> Result<f64> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(modified.duration_since(UNIX_EPOCH)?.as_secs_f64())
}

/// Date (`01Nov25`) and optional time (`01-00-30`) embedded in a survey
/// file name such as `OBVCB_01Nov25_Cycle1_01-00-30.dat`.
pub fn parse_file_timestamp(name: &str) -> Option<NaiveDateTime> {
    let bytes = name.as_bytes();

    let date_at = bytes.windows(7).position(|w| {
        w[..2].iter().all(u8::is_ascii_digit)
            && w[2..5].iter().all(u8::is_ascii_alphabetic)
            && w[5..].iter().all(u8::is_ascii_digit)
    })?;
    let date = NaiveDate::parse_from_str(&name[date_at..date_at + 7], "%d%b%y").ok()?;

    let time = bytes
        .windows(8)
        .position(|w| {
            w.iter()
                .enumerate()
                .all(|(i, b)| if i == 2 || i == 5 { *b == b'-' } else { b.is_ascii_digit() })
        })
        .and_then(|at| NaiveTime::parse_from_str(&name[at..at + 8], "%H-%M-%S").ok())
        .unwrap_or(NaiveTime::MIN);

    Some(date.and_time(time))
}

/// Point rows of one survey. The first line is a header; a point keeps its
/// first valid row.
fn parse_survey_rows(text: &str) -> BTreeMap<String, [f64; 3]> {
    let mut points = BTreeMap::new();

    for (id, values) in text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .skip(1)
        .filter_map(parse_row)
    {
        points.entry(id).or_insert(values);
    }

    points
}

fn parse_row(line: &str) -> Option<(String, [f64; 3])> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return None;
    }

    let tail = &parts[parts.len() - 3..];
    if tail
        .iter()
        .any(|v| PLACEHOLDERS.contains(&v.to_lowercase().as_str()))
    {
        return None;
    }

    let mut values = [0.0; 3];
    for (slot, raw) in values.iter_mut().zip(tail) {
        *slot = raw.parse::<f64>().ok().filter(|v| v.is_finite())?;
    }

    Some((parts[0].to_string(), values))
}

/// Only points measured in every survey are kept, so each series lines up
/// with the timestamps. Surveys without any points never reach this far.
fn assemble(surveys: Vec<Survey>) -> Snapshot {
    let Some(first) = surveys.first() else {
        return Snapshot::empty();
    };

    let mut ids: BTreeSet<&String> = first.points.keys().collect();
    for survey in &surveys[1..] {
        ids.retain(|id| survey.points.contains_key(*id));
    }

    let total: BTreeSet<&String> = surveys.iter().flat_map(|s| s.points.keys()).collect();
    if total.len() > ids.len() {
        tracing::debug!(
            "Dropping {} points missing from some surveys",
            total.len() - ids.len()
        );
    }

    let axes: BTreeMap<String, Vec<Vec<f64>>> = SURVEY_AXES
        .iter()
        .enumerate()
        .map(|(k, axis)| {
            let rows = ids
                .iter()
                .map(|id| surveys.iter().map(|s| s.points[*id][k]).collect())
                .collect();
            (axis.to_string(), rows)
        })
        .collect();

    let ids = ids.into_iter().cloned().collect();
    let timestamps = surveys.into_iter().map(|s| s.timestamp).collect();

    Snapshot::new(timestamps, ids, axes)
}
