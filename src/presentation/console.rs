// Console commands for the watch client
use crate::application::controller::Command;
use crate::domain::chart::ChartControls;
use thiserror::Error;

pub const HELP: &str = "commands: project <name> | axis <name> | highlight <id> | hide | show | toggle | \
panel | refresh <secs> | stop | limits <y_min> <y_max> <alarm> <warning> | reload | projects | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Command(Command),
    Help,
    Quit,
}

/// What the watch loop does with one line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleAction {
    Send(Command),
    Quit,
    Ignore,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("'{command}' expects {expected}")]
    Usage {
        command: &'static str,
        expected: &'static str,
    },
    #[error("'{0}' is not a number")]
    NotANumber(String),
}

fn required<'a>(
    rest: &'a str,
    command: &'static str,
    expected: &'static str,
) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        Err(ParseError::Usage { command, expected })
    } else {
        Ok(rest)
    }
}

fn number<T: std::str::FromStr>(raw: &str) -> Result<T, ParseError> {
    raw.parse()
        .map_err(|_| ParseError::NotANumber(raw.to_string()))
}

/// Parse one input line. Empty lines are `None`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleInput>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (keyword, rest) = line
        .split_once(char::is_whitespace)
        .map(|(k, r)| (k, r.trim()))
        .unwrap_or((line, ""));

    let command = match keyword.to_lowercase().as_str() {
        "project" => Command::SetProject(required(rest, "project", "a project name")?.to_string()),
        "axis" => Command::SetAxis(required(rest, "axis", "an axis name")?.to_string()),
        "highlight" | "hl" => Command::Highlight(required(rest, "highlight", "a point id")?.to_string()),
        "hide" => Command::SetAllVisibility(true),
        "show" => Command::SetAllVisibility(false),
        "toggle" => Command::ToggleAllVisibility,
        "panel" => Command::TogglePanel,
        "refresh" => Command::StartAutoRefresh(number(required(rest, "refresh", "seconds")?)?),
        "stop" => Command::StopAutoRefresh,
        "reload" => Command::Reload,
        "projects" => Command::RefreshProjects,
        "limits" => {
            let values = rest
                .split_whitespace()
                .map(number::<f64>)
                .collect::<Result<Vec<_>, _>>()?;
            let [y_min, y_max, alarm_limit, warning_limit] = values[..] else {
                return Err(ParseError::Usage {
                    command: "limits",
                    expected: "<y_min> <y_max> <alarm> <warning>",
                });
            };
            Command::SetControls(ChartControls {
                y_min,
                y_max,
                alarm_limit,
                warning_limit,
            })
        }
        "help" | "?" => return Ok(Some(ConsoleInput::Help)),
        "quit" | "exit" => return Ok(Some(ConsoleInput::Quit)),
        other => return Err(ParseError::Unknown(other.to_string())),
    };

    Ok(Some(ConsoleInput::Command(command)))
}

/// Parse a line and report help or mistakes through the log.
pub fn handle_line(line: &str) -> ConsoleAction {
    match parse_line(line) {
        Ok(Some(ConsoleInput::Command(command))) => ConsoleAction::Send(command),
        Ok(Some(ConsoleInput::Quit)) => ConsoleAction::Quit,
        Ok(Some(ConsoleInput::Help)) => {
            tracing::info!("{}", HELP);
            ConsoleAction::Ignore
        }
        Ok(None) => ConsoleAction::Ignore,
        Err(e) => {
            tracing::warn!("{} ({})", e, HELP);
            ConsoleAction::Ignore
        }
    }
}
