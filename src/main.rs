// Main entry point - Dependency injection, data server and dashboard client
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use displacement_dashboard::application::controller::DashboardController;
use displacement_dashboard::application::survey_service::SurveyService;
use displacement_dashboard::application::view_model::ChartViewModel;
use displacement_dashboard::infrastructure::config::{load_dashboard_config, DashboardConfig};
use displacement_dashboard::infrastructure::dat_repository::DatDirectoryRepository;
use displacement_dashboard::infrastructure::http_source::HttpDashboardSource;
use displacement_dashboard::presentation::app_state::AppState;
use displacement_dashboard::presentation::console::{handle_line, ConsoleAction};
use displacement_dashboard::presentation::frame_printer::{format_frame, OutputFormat};
use displacement_dashboard::presentation::handlers::router;

#[derive(Parser)]
#[command(name = "displacement-dashboard")]
#[command(about = "Displacement monitoring dashboard: survey data server and chart client")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to config/dashboard.*)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve /get_projects and /get_data from a folder of survey files
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        projects_dir: Option<PathBuf>,
        #[arg(long)]
        default_project: Option<String>,
    },
    /// Poll a dashboard server and print each chart frame
    Watch {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        project: Option<String>,
        /// Auto-refresh interval in seconds, 0 to disable
        #[arg(long)]
        refresh: Option<u64>,
        /// Print frames as JSON lines instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_dashboard_config(cli.config.as_deref())
        .context("Failed to load dashboard configuration")?;

    match cli.command {
        Commands::Serve {
            bind,
            projects_dir,
            default_project,
        } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(dir) = projects_dir {
                config.server.projects_dir = dir;
            }
            if let Some(project) = default_project {
                config.server.default_project = project;
            }
            serve(config).await
        }
        Commands::Watch {
            url,
            project,
            refresh,
            json,
        } => {
            if let Some(url) = url {
                config.client.base_url = url;
            }
            if project.is_some() {
                config.client.project = project;
            }
            if let Some(secs) = refresh {
                config.chart.refresh_secs = secs;
            }
            let format = if json { OutputFormat::Json } else { OutputFormat::Text };
            watch(config, format).await
        }
    }
}

async fn serve(config: DashboardConfig) -> anyhow::Result<()> {
    let settings = config.server;

    // Create repository (infrastructure layer)
    let repository = Arc::new(DatDirectoryRepository::new(settings.projects_dir.clone()));

    // Create services (application layer)
    let survey_service = SurveyService::new(repository, settings.default_project.clone());
    let state = Arc::new(AppState { survey_service });

    let addr: SocketAddr = settings
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", settings.bind))?;
    tracing::info!(
        "Serving projects from {} on {} (default project {})",
        settings.projects_dir.display(),
        addr,
        settings.default_project
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router(state)).await?;

    Ok(())
}

async fn watch(config: DashboardConfig, format: OutputFormat) -> anyhow::Result<()> {
    let source = Arc::new(HttpDashboardSource::new(
        config.client.base_url.clone(),
        Duration::from_secs(config.client.request_timeout_secs),
    )?);

    let mut state = config.chart.view_state();
    state.selected_project = config.client.project.clone();
    let view_model = ChartViewModel::new(state, config.chart.controls());

    tracing::info!("Watching {}", config.client.base_url);
    let (handle, task) = DashboardController::spawn(source, view_model);
    let mut frames = handle.frames();
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                println!("{}", format_frame(&frame, format)?);
            }
            line = input.next_line(), if input_open => {
                match line? {
                    Some(line) => match handle_line(&line) {
                        ConsoleAction::Send(command) => handle.send(command).await?,
                        ConsoleAction::Quit => break,
                        ConsoleAction::Ignore => {}
                    },
                    None => input_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    drop(frames);
    drop(handle);
    task.abort();
    Ok(())
}
