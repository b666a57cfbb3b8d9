// Chart view-model - UI state plus the last accepted snapshot
use crate::application::data_source::FetchError;
use crate::domain::chart::{self, ChartControls, RenderSpec};
use crate::domain::project::{HeaderText, Project};
use crate::domain::snapshot::{Snapshot, SnapshotError};
use crate::domain::view_state::ViewState;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] SnapshotError),
}

/// Issued for every load request. Only the ticket carrying the latest
/// generation may change what is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub project: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Stale,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisChange {
    Rendered,
    NeedsLoad(LoadTicket),
}

/// Entry of the clickable id list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdChip {
    pub id: String,
    pub highlighted: bool,
}

/// Entry of the project navigation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub project: String,
    pub active: bool,
}

/// What a surface shows after a state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub render: Option<RenderSpec>,
    pub header: Option<HeaderText>,
    pub ids: Vec<IdChip>,
    pub projects: Vec<NavEntry>,
    pub visibility_label: &'static str,
    pub panel_label: &'static str,
    pub panel_visible: bool,
}

#[derive(Debug, Clone)]
pub struct ChartViewModel {
    state: ViewState,
    controls: ChartControls,
    snapshot: Option<Snapshot>,
    last_render: Option<RenderSpec>,
    projects: Vec<String>,
    generation: u64,
    loading: bool,
    applied_project: Option<String>,
    rendered_axis: Option<String>,
}

impl Default for ChartViewModel {
    fn default() -> Self {
        Self::new(ViewState::default(), ChartControls::default())
    }
}

impl ChartViewModel {
    pub fn new(state: ViewState, controls: ChartControls) -> Self {
        Self {
            state,
            controls,
            snapshot: None,
            last_render: None,
            projects: Vec::new(),
            generation: 0,
            loading: false,
            applied_project: None,
            rendered_axis: None,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn controls(&self) -> &ChartControls {
        &self.controls
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn current_render(&self) -> Option<&RenderSpec> {
        self.last_render.as_ref()
    }

    pub fn projects(&self) -> &[String] {
        &self.projects
    }

    /// Start a load of the active project (or the server default).
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.loading = true;
        LoadTicket {
            generation: self.generation,
            project: self.state.selected_project.clone(),
        }
    }

    /// Apply the result of a load. Results for superseded tickets, failed
    /// fetches and malformed snapshots leave the view untouched.
    pub fn finish_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Snapshot, FetchError>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding snapshot for generation {} (latest is {})",
                ticket.generation,
                self.generation
            );
            return LoadOutcome::Stale;
        }
        self.loading = false;

        match result.map_err(LoadError::from).and_then(|s| self.accept(s)) {
            Ok(snapshot) => {
                tracing::debug!(
                    "Applying snapshot for {:?}: {} ids",
                    ticket.project,
                    snapshot.ids.len()
                );
                self.state.retain_highlight(&snapshot.ids);
                self.snapshot = Some(snapshot);
                self.applied_project = ticket.project.clone();
                self.rerender();
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("Failed to load project data for {:?}: {}", ticket.project, e);
                LoadOutcome::Failed
            }
        }
    }

    /// A snapshot without the selected axis is still taken; the view falls
    /// back to the axis on screen, or the first one the snapshot carries.
    fn accept(&mut self, snapshot: Snapshot) -> Result<Snapshot, LoadError> {
        snapshot.validate()?;

        if !snapshot.has_axis(&self.state.selected_axis) {
            let fallback = self
                .rendered_axis
                .clone()
                .filter(|axis| snapshot.has_axis(axis))
                .or_else(|| snapshot.axes.keys().next().cloned())
                .ok_or_else(|| SnapshotError::UnknownAxis(self.state.selected_axis.clone()))?;
            tracing::warn!(
                "Axis {} is not in the snapshot, showing {}",
                self.state.selected_axis,
                fallback
            );
            self.state.selected_axis = fallback;
        }

        Ok(snapshot)
    }

    fn rerender(&mut self) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };

        match chart::render(snapshot, &self.state, &self.controls) {
            Ok(spec) => {
                self.last_render = Some(spec);
                self.rendered_axis = Some(self.state.selected_axis.clone());
            }
            Err(e) => tracing::warn!("Keeping previous chart: {}", e),
        }
    }

    /// Toggle the highlight on `id`. Returns false when the id is not part of
    /// the current snapshot.
    pub fn set_highlight(&mut self, id: &str) -> bool {
        if !self.snapshot.as_ref().is_some_and(|s| s.contains_id(id)) {
            tracing::debug!("Ignoring highlight of unknown id {}", id);
            return false;
        }

        self.state.toggle_highlight(id);
        self.rerender();
        true
    }

    pub fn set_all_visibility(&mut self, hidden: bool) {
        self.state.set_all_hidden(hidden);
        self.rerender();
    }

    /// Flip between hide-all and show-all, as the toggle button does.
    pub fn toggle_all_visibility(&mut self) {
        let hide = !self.state.all_hidden;
        self.set_all_visibility(hide);
    }

    pub fn set_axis(&mut self, axis: &str) -> AxisChange {
        self.state.selected_axis = axis.to_string();

        if self.snapshot.as_ref().is_some_and(|s| s.has_axis(axis)) {
            self.rerender();
            AxisChange::Rendered
        } else {
            AxisChange::NeedsLoad(self.begin_load())
        }
    }

    pub fn set_controls(&mut self, controls: ChartControls) {
        self.controls = controls;
        self.rerender();
    }

    /// Switch to `project`. The previous chart and header stay until the new
    /// snapshot arrives.
    pub fn set_project(&mut self, project: &str) -> LoadTicket {
        tracing::info!("Switching to project {}", project);
        self.state.selected_project = Some(project.to_string());
        self.begin_load()
    }

    /// Store the navigation list; picks the first project if none is active.
    pub fn set_projects(&mut self, projects: Vec<String>) -> Option<LoadTicket> {
        self.projects = projects;

        if self.state.selected_project.is_some() {
            return None;
        }
        let first = self.projects.first().cloned()?;
        Some(self.set_project(&first))
    }

    /// Submit of the chart form: new axis, limits and refresh interval.
    pub fn apply_form(
        &mut self,
        axis: &str,
        controls: ChartControls,
        refresh_secs: u64,
    ) -> Option<LoadTicket> {
        self.state.selected_axis = axis.to_string();
        self.controls = controls;
        self.set_refresh_secs(refresh_secs);
        self.rerender();
        self.reload()
    }

    /// Load the active project again; nothing to do without one.
    pub fn reload(&mut self) -> Option<LoadTicket> {
        if self.state.selected_project.is_some() {
            Some(self.begin_load())
        } else {
            None
        }
    }

    /// Load for an auto-refresh tick. Skipped while an earlier load is still
    /// out, so a period shorter than the fetch time cannot starve the view.
    pub fn refresh_tick(&mut self) -> Option<LoadTicket> {
        if self.loading {
            tracing::debug!("Skipping refresh, generation {} still loading", self.generation);
            return None;
        }
        self.reload()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_refresh_secs(&mut self, secs: u64) {
        self.state.refresh_interval = Duration::from_secs(secs);
    }

    /// Period of the auto-refresh timer, `None` when refresh is off.
    pub fn refresh_period(&self) -> Option<Duration> {
        Some(self.state.refresh_interval).filter(|p| !p.is_zero())
    }

    pub fn toggle_panel(&mut self) {
        self.state.toggle_panel();
    }

    pub fn frame(&self) -> Frame {
        let ids = self
            .snapshot
            .as_ref()
            .map(|s| {
                s.ids
                    .iter()
                    .map(|id| IdChip {
                        id: id.clone(),
                        highlighted: self.state.is_highlighted(id),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let projects = self
            .projects
            .iter()
            .map(|p| NavEntry {
                project: p.clone(),
                active: self.state.selected_project.as_deref() == Some(p.as_str()),
            })
            .collect();

        Frame {
            render: self.last_render.clone(),
            header: self
                .applied_project
                .as_deref()
                .map(|p| Project::new(p).header()),
            ids,
            projects,
            visibility_label: self.state.visibility_label(),
            panel_label: self.state.panel_label(),
            panel_visible: self.state.panel_visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::SeriesKind;
    use crate::domain::snapshot::Timestamp;
    use crate::domain::view_state::{HIDE_ALL_LABEL, SHOW_ALL_LABEL};
    use std::collections::BTreeMap;

    fn snapshot(ids: &[&str], dy: Vec<Vec<f64>>) -> Snapshot {
        let samples = dy.first().map(Vec::len).unwrap_or(0);
        let mut axes = BTreeMap::new();
        axes.insert("dx".to_string(), vec![vec![0.0; samples]; ids.len()]);
        axes.insert("dy".to_string(), dy);
        Snapshot::new(
            (0..samples).map(|i| Timestamp::Epoch(i as f64)).collect(),
            ids.iter().map(|s| s.to_string()).collect(),
            axes,
        )
    }

    fn loaded() -> ChartViewModel {
        let mut vm = ChartViewModel::default();
        let ticket = vm.set_project("OBVCB");
        let outcome = vm.finish_load(
            &ticket,
            Ok(snapshot(&["P1", "P2"], vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])),
        );
        assert_eq!(outcome, LoadOutcome::Applied);
        vm
    }

    fn data_values(vm: &ChartViewModel) -> Vec<Vec<f64>> {
        vm.current_render()
            .unwrap()
            .data_series()
            .map(|s| s.values.clone())
            .collect()
    }

    fn unavailable() -> FetchError {
        FetchError::Status {
            url: "http://localhost/get_data".to_string(),
            status: 503,
        }
    }

    #[test]
    fn test_applied_snapshot_renders() {
        let vm = loaded();
        assert_eq!(data_values(&vm), vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);

        let frame = vm.frame();
        assert_eq!(frame.ids.len(), 2);
        assert_eq!(
            frame.header.unwrap().page_header,
            "OBVCB Displacement Trend"
        );
        assert_eq!(frame.render.unwrap().threshold_series().count(), 4);
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut vm = ChartViewModel::default();
        let slow = vm.set_project("A");
        let fast = vm.set_project("B");

        let b = snapshot(&["B1"], vec![vec![9.0]]);
        assert_eq!(vm.finish_load(&fast, Ok(b)), LoadOutcome::Applied);

        let a = snapshot(&["A1"], vec![vec![1.0]]);
        assert_eq!(vm.finish_load(&slow, Ok(a)), LoadOutcome::Stale);
        assert_eq!(vm.snapshot().unwrap().ids, vec!["B1"]);
    }

    #[test]
    fn test_failed_fetch_keeps_chart() {
        let mut vm = loaded();
        let before = vm.frame();

        let ticket = vm.reload().unwrap();
        assert_eq!(vm.finish_load(&ticket, Err(unavailable())), LoadOutcome::Failed);
        assert_eq!(vm.frame(), before);
    }

    #[test]
    fn test_malformed_snapshot_keeps_chart() {
        let mut vm = loaded();
        let before = vm.frame();

        let mut bad = snapshot(&["P1", "P2"], vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        bad.timestamps.pop();
        let ticket = vm.reload().unwrap();
        assert_eq!(vm.finish_load(&ticket, Ok(bad)), LoadOutcome::Failed);

        let ticket = vm.reload().unwrap();
        assert_eq!(vm.finish_load(&ticket, Ok(Snapshot::default())), LoadOutcome::Failed);
        assert_eq!(vm.frame(), before);
    }

    #[test]
    fn test_header_follows_applied_snapshot() {
        let mut vm = loaded();

        let ticket = vm.set_project("missing");
        assert_eq!(vm.frame().header.unwrap().page_header, "OBVCB Displacement Trend");
        assert_eq!(vm.finish_load(&ticket, Err(unavailable())), LoadOutcome::Failed);

        let frame = vm.frame();
        assert_eq!(frame.header.unwrap().page_header, "OBVCB Displacement Trend");
        assert_eq!(frame.ids[0].id, "P1");
    }

    #[test]
    fn test_refresh_tick_waits_for_outstanding_load() {
        let mut vm = loaded();
        assert!(!vm.is_loading());

        let ticket = vm.refresh_tick().unwrap();
        assert!(vm.is_loading());
        assert_eq!(vm.refresh_tick(), None);

        let outcome = vm.finish_load(&ticket, Ok(snapshot(&["P1"], vec![vec![7.0]])));
        assert_eq!(outcome, LoadOutcome::Applied);
        assert!(!vm.is_loading());
        assert!(vm.refresh_tick().is_some());
    }

    #[test]
    fn test_stale_result_keeps_newer_load_outstanding() {
        let mut vm = loaded();
        let old = vm.reload().unwrap();
        let _new = vm.set_project("B");

        assert_eq!(vm.finish_load(&old, Err(unavailable())), LoadOutcome::Stale);
        assert!(vm.is_loading());
    }

    #[test]
    fn test_highlight_round_trip() {
        let mut vm = loaded();
        let before = vm.state().clone();

        assert!(vm.set_highlight("P1"));
        let render = vm.current_render().unwrap();
        let p2 = render.data_series().find(|s| s.label == "P2").unwrap();
        assert!(p2.hidden);
        assert!(vm.frame().ids[0].highlighted);

        assert!(vm.set_highlight("P1"));
        assert_eq!(vm.state(), &before);
        let render = vm.current_render().unwrap();
        assert!(render.data_series().all(|s| !s.hidden && s.border_width == 2.0));
    }

    #[test]
    fn test_highlight_unknown_id_is_ignored() {
        let mut vm = loaded();
        assert!(!vm.set_highlight("P9"));
        assert_eq!(vm.state().highlighted, None);

        let mut empty = ChartViewModel::default();
        assert!(!empty.set_highlight("P1"));
    }

    #[test]
    fn test_hide_show_all() {
        let mut vm = loaded();
        vm.set_highlight("P2");

        vm.toggle_all_visibility();
        assert_eq!(vm.frame().visibility_label, SHOW_ALL_LABEL);
        let render = vm.current_render().unwrap();
        assert!(render.data_series().all(|s| s.hidden));
        assert!(render.threshold_series().all(|s| !s.hidden));

        vm.set_all_visibility(false);
        assert_eq!(vm.state().highlighted, None);
        assert_eq!(vm.frame().visibility_label, HIDE_ALL_LABEL);
        assert!(vm.current_render().unwrap().series.iter().all(|s| !s.hidden));
    }

    #[test]
    fn test_new_snapshot_keeps_valid_highlight_and_drops_stale_one() {
        let mut vm = loaded();
        vm.set_highlight("P2");

        let ticket = vm.reload().unwrap();
        vm.finish_load(&ticket, Ok(snapshot(&["P1", "P2"], vec![vec![1.0], vec![2.0]])));
        assert_eq!(vm.state().highlighted.as_deref(), Some("P2"));

        let ticket = vm.reload().unwrap();
        vm.finish_load(&ticket, Ok(snapshot(&["P1"], vec![vec![1.0]])));
        assert_eq!(vm.state().highlighted, None);
        assert!(vm.current_render().unwrap().data_series().all(|s| !s.hidden));
    }

    #[test]
    fn test_axis_change_rerenders_from_held_snapshot() {
        let mut vm = loaded();
        assert_eq!(vm.set_axis("dx"), AxisChange::Rendered);
        assert_eq!(data_values(&vm), vec![vec![0.0; 3], vec![0.0; 3]]);

        match vm.set_axis("dz") {
            AxisChange::NeedsLoad(ticket) => assert_eq!(ticket.project.as_deref(), Some("OBVCB")),
            AxisChange::Rendered => panic!("dz is not in the snapshot"),
        }
        // The dx chart stays up while dz is missing.
        assert_eq!(data_values(&vm), vec![vec![0.0; 3], vec![0.0; 3]]);
    }

    #[test]
    fn test_missing_axis_falls_back_to_rendered_axis() {
        let mut vm = loaded();
        vm.set_axis("dx");
        let AxisChange::NeedsLoad(ticket) = vm.set_axis("dz") else {
            panic!("dz is not in the snapshot");
        };

        let fresh = snapshot(&["P1", "P2"], vec![vec![8.0], vec![9.0]]);
        assert_eq!(vm.finish_load(&ticket, Ok(fresh)), LoadOutcome::Applied);
        assert_eq!(vm.state().selected_axis, "dx");
        assert_eq!(data_values(&vm), vec![vec![0.0], vec![0.0]]);

        // Later snapshots keep being applied.
        let ticket = vm.reload().unwrap();
        let later = snapshot(&["P3"], vec![vec![1.0]]);
        assert_eq!(vm.finish_load(&ticket, Ok(later)), LoadOutcome::Applied);
        assert_eq!(vm.frame().ids[0].id, "P3");
    }

    #[test]
    fn test_first_snapshot_without_selected_axis_uses_its_first_axis() {
        let mut vm = ChartViewModel::default();
        vm.set_axis("dz");
        let ticket = vm.set_project("OBVCB");
        let outcome = vm.finish_load(&ticket, Ok(snapshot(&["P1"], vec![vec![3.0]])));

        assert_eq!(outcome, LoadOutcome::Applied);
        assert_eq!(vm.state().selected_axis, "dx");
    }

    #[test]
    fn test_axis_change_without_snapshot_loads() {
        let mut vm = ChartViewModel::default();
        assert!(matches!(vm.set_axis("dx"), AxisChange::NeedsLoad(_)));
    }

    #[test]
    fn test_apply_form_updates_thresholds_and_reloads() {
        let mut vm = loaded();
        let controls = ChartControls {
            y_min: -10.0,
            y_max: 10.0,
            alarm_limit: 8.0,
            warning_limit: 5.0,
        };

        let ticket = vm.apply_form("dy", controls, 30);
        assert!(ticket.is_some());
        assert_eq!(vm.refresh_period(), Some(Duration::from_secs(30)));

        let render = vm.current_render().unwrap();
        assert_eq!(render.y_axis.min, -10.0);
        let limits: Vec<f64> = render.threshold_series().map(|s| s.values[0]).collect();
        assert_eq!(limits, vec![5.0, -5.0, 8.0, -8.0]);
        assert_eq!(render.series.iter().filter(|s| s.kind == SeriesKind::Data).count(), 2);
    }

    #[test]
    fn test_apply_form_without_project_does_not_load() {
        let mut vm = ChartViewModel::default();
        assert_eq!(vm.apply_form("dx", ChartControls::default(), 0), None);
        assert_eq!(vm.refresh_period(), None);
        assert_eq!(vm.state().selected_axis, "dx");
    }

    #[test]
    fn test_project_list_selects_first() {
        let mut vm = ChartViewModel::default();
        let ticket = vm.set_projects(vec!["A".to_string(), "B".to_string()]).unwrap();
        assert_eq!(ticket.project.as_deref(), Some("A"));

        let frame = vm.frame();
        assert!(frame.projects[0].active);
        assert!(!frame.projects[1].active);

        assert_eq!(vm.set_projects(vec!["C".to_string()]), None);
        assert_eq!(vm.state().selected_project.as_deref(), Some("A"));
    }

    #[test]
    fn test_generation_increases() {
        let mut vm = ChartViewModel::default();
        let first = vm.begin_load();
        let second = vm.begin_load();
        assert!(second.generation > first.generation);
        assert_eq!(first.project, None);
    }
}
