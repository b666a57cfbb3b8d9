// Dashboard controller - one task owns the view-model, fetches and the refresh timer
use crate::application::data_source::{DashboardSource, FetchError};
use crate::application::view_model::{AxisChange, ChartViewModel, Frame, LoadTicket};
use crate::domain::chart::ChartControls;
use crate::domain::snapshot::Snapshot;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

const COMMAND_BUFFER: usize = 100;

/// User interactions the controller understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Highlight(String),
    SetAllVisibility(bool),
    ToggleAllVisibility,
    SetAxis(String),
    SetControls(ChartControls),
    SetProject(String),
    ApplyForm {
        axis: String,
        controls: ChartControls,
        refresh_secs: u64,
    },
    TogglePanel,
    StartAutoRefresh(u64),
    StopAutoRefresh,
    Reload,
    RefreshProjects,
}

enum Message {
    User(Command),
    Tick,
    SnapshotLoaded {
        ticket: LoadTicket,
        result: Result<Snapshot, FetchError>,
    },
    ProjectsLoaded(Result<Vec<String>, FetchError>),
}

/// Cloneable front door to a running controller.
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Message>,
    frames: watch::Receiver<Frame>,
}

impl ControllerHandle {
    pub async fn send(&self, command: Command) -> anyhow::Result<()> {
        self.tx
            .send(Message::User(command))
            .await
            .map_err(|_| anyhow::anyhow!("dashboard controller has stopped"))
    }

    /// Receiver that observes every frame the controller publishes.
    pub fn frames(&self) -> watch::Receiver<Frame> {
        self.frames.clone()
    }
}

/// Processes commands, timer ticks and fetch results strictly one at a time,
/// so the view-model never needs a lock. The controller only keeps a weak
/// sender to itself and stops once every handle is gone.
pub struct DashboardController {
    view_model: ChartViewModel,
    source: Arc<dyn DashboardSource>,
    tx: mpsc::WeakSender<Message>,
    rx: mpsc::Receiver<Message>,
    frames: watch::Sender<Frame>,
    refresh: Option<JoinHandle<()>>,
}

impl DashboardController {
    pub fn spawn(
        source: Arc<dyn DashboardSource>,
        view_model: ChartViewModel,
    ) -> (ControllerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (frames_tx, frames_rx) = watch::channel(view_model.frame());

        let controller = Self {
            view_model,
            source,
            tx: tx.downgrade(),
            rx,
            frames: frames_tx,
            refresh: None,
        };
        let task = tokio::spawn(controller.run());

        (ControllerHandle { tx, frames: frames_rx }, task)
    }

    async fn run(mut self) {
        tracing::info!("Dashboard controller started");

        // Mirror page load: fetch the navigation list, which selects the
        // first project when none was chosen up front.
        self.request_projects();
        if let Some(ticket) = self.view_model.reload() {
            self.spawn_load(ticket);
            self.restart_auto_refresh();
        }

        while let Some(message) = self.rx.recv().await {
            self.handle(message);
            self.publish();
        }

        self.stop_auto_refresh();
        tracing::info!("Dashboard controller stopped");
    }

    fn publish(&self) {
        let frame = self.view_model.frame();
        self.frames.send_if_modified(|current| {
            if *current == frame {
                false
            } else {
                *current = frame;
                true
            }
        });
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::User(command) => self.handle_command(command),
            Message::Tick => {
                tracing::debug!("Auto-refresh tick");
                if let Some(ticket) = self.view_model.refresh_tick() {
                    self.spawn_load(ticket);
                }
            }
            Message::SnapshotLoaded { ticket, result } => {
                self.view_model.finish_load(&ticket, result);
            }
            Message::ProjectsLoaded(Ok(projects)) => {
                tracing::info!("Loaded {} projects", projects.len());
                if let Some(ticket) = self.view_model.set_projects(projects) {
                    self.spawn_load(ticket);
                    self.restart_auto_refresh();
                }
            }
            Message::ProjectsLoaded(Err(e)) => {
                tracing::warn!("Failed to load projects: {}", e);
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        tracing::debug!("Handling {:?}", command);

        match command {
            Command::Highlight(id) => {
                self.view_model.set_highlight(&id);
            }
            Command::SetAllVisibility(hidden) => self.view_model.set_all_visibility(hidden),
            Command::ToggleAllVisibility => self.view_model.toggle_all_visibility(),
            Command::SetAxis(axis) => {
                if let AxisChange::NeedsLoad(ticket) = self.view_model.set_axis(&axis) {
                    self.spawn_load(ticket);
                }
            }
            Command::SetControls(controls) => self.view_model.set_controls(controls),
            Command::SetProject(project) => {
                let ticket = self.view_model.set_project(&project);
                self.spawn_load(ticket);
                self.restart_auto_refresh();
            }
            Command::ApplyForm {
                axis,
                controls,
                refresh_secs,
            } => {
                if let Some(ticket) = self.view_model.apply_form(&axis, controls, refresh_secs) {
                    self.spawn_load(ticket);
                }
                self.restart_auto_refresh();
            }
            Command::TogglePanel => self.view_model.toggle_panel(),
            Command::StartAutoRefresh(secs) => {
                self.view_model.set_refresh_secs(secs);
                self.restart_auto_refresh();
            }
            Command::StopAutoRefresh => {
                self.view_model.set_refresh_secs(0);
                self.stop_auto_refresh();
            }
            Command::Reload => {
                if let Some(ticket) = self.view_model.reload() {
                    self.spawn_load(ticket);
                }
            }
            Command::RefreshProjects => self.request_projects(),
        }
    }

    fn request_projects(&self) {
        let Some(tx) = self.tx.upgrade() else {
            return;
        };
        let source = self.source.clone();

        tokio::spawn(async move {
            let result = source.list_projects().await;
            let _ = tx.send(Message::ProjectsLoaded(result)).await;
        });
    }

    fn spawn_load(&self, ticket: LoadTicket) {
        let Some(tx) = self.tx.upgrade() else {
            return;
        };
        let source = self.source.clone();

        tracing::debug!(
            "Requesting snapshot for {:?} (generation {})",
            ticket.project,
            ticket.generation
        );

        tokio::spawn(async move {
            let result = source.fetch_snapshot(ticket.project.as_deref()).await;
            let _ = tx.send(Message::SnapshotLoaded { ticket, result }).await;
        });
    }

    /// Replace the refresh timer; at most one is ever running.
    fn restart_auto_refresh(&mut self) {
        self.stop_auto_refresh();

        let Some(period) = self.view_model.refresh_period() else {
            tracing::info!("Auto-refresh disabled");
            return;
        };
        tracing::debug!("Auto-refresh every {}s", period.as_secs());

        let tx = self.tx.clone();
        self.refresh = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(tx) = tx.upgrade() else {
                    break;
                };
                if tx.send(Message::Tick).await.is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_auto_refresh(&mut self) {
        if let Some(timer) = self.refresh.take() {
            timer.abort();
        }
    }
}
