#![forbid(unsafe_code)]

mod app;
mod config;
mod constants;
mod errors;
mod launcher;
mod matcher;
mod rule;
mod types;
mod window;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use app::{RuleOutcome, RuleReport, RunMode, WindowFixer};
use config::ConfigFile;
use launcher::ProcessLauncher;
use rule::{ApplyOutcome, LaunchAttempt};
use window::x11::X11WindowSystem;

/// This tool can save and restore the window positions of specific programs.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Provide an alternate location for the config file. By default, look
    /// for windowfixer.ini in the current working directory.
    #[arg(long, value_name = "INIFILE", default_value = constants::config::DEFAULT_FILENAME)]
    conf: PathBuf,

    /// Instead of moving windows, save their current locations in the config
    /// file to be restored later.
    #[arg(short, long)]
    save: bool,

    /// Print one JSON report per rule instead of status lines
    #[arg(long)]
    json: bool,
}

fn init_logging() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")
}

fn status_line(report: &RuleReport) -> String {
    let action = match &report.outcome {
        RuleOutcome::Fixed { outcome } => match outcome {
            ApplyOutcome::Applied { windows } => format!("moved {windows} window(s)"),
            ApplyOutcome::Skipped { missing } => format!(
                "skipped, incomplete saved position (missing {}). Edit the config file, or run with -s after manually positioning the window",
                missing.join(", ")
            ),
            ApplyOutcome::GaveUp { launch } => match launch {
                LaunchAttempt::NotConfigured => "unable to find matching window, skipping".to_string(),
                LaunchAttempt::Failed { message } => format!("unable to find matching window; {message}"),
                LaunchAttempt::TimedOut { waited_secs } => {
                    format!("started command, waited {waited_secs:.1} seconds, and gave up")
                }
            },
        },
        RuleOutcome::Captured { state } => match state.placement {
            types::Placement::Normal => format!("saved {}", state.geometry),
            placement => format!("saved state={placement}"),
        },
        RuleOutcome::NotCaptured { reason } => reason.clone(),
        RuleOutcome::Invalid { reason } => format!("invalid: {reason}"),
        RuleOutcome::Failed { reason } => format!("failed: {reason}"),
    };
    format!("[{}] {action}", report.name)
}

/// One stdout line per rule; warnings already went to the log
fn report_lines(reports: &[RuleReport], json: bool) -> Result<Vec<String>> {
    reports
        .iter()
        .map(|report| {
            if json {
                serde_json::to_string(report).context("Failed to serialize report to JSON")
            } else {
                Ok(status_line(report))
            }
        })
        .collect()
}

fn run(cli: &Cli) -> Result<()> {
    let mode = if cli.save { RunMode::Capture } else { RunMode::Apply };

    // Fatal checks happen before connecting to the display or touching any rule
    let config = ConfigFile::open(&cli.conf, mode == RunMode::Capture)?;
    let system = X11WindowSystem::connect()?;
    let launcher = ProcessLauncher;

    let reports = WindowFixer::new(config, mode, &system, &launcher).run()?;
    for line in report_lines(&reports, cli.json)? {
        println!("{line}");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging() {
        eprintln!("{e:#}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Geometry, Placement, WindowState};

    fn report(outcome: RuleOutcome) -> RuleReport {
        RuleReport {
            name: "Notepad".to_string(),
            warnings: vec![],
            outcome,
        }
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["windowfixer"]);
        assert_eq!(cli.conf, PathBuf::from("windowfixer.ini"));
        assert!(!cli.save);
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_save_with_alternate_config() {
        let cli = Cli::parse_from(["windowfixer", "-s", "--conf", "/tmp/other.ini"]);
        assert_eq!(cli.conf, PathBuf::from("/tmp/other.ini"));
        assert!(cli.save);
    }

    #[test]
    fn test_warnings_are_not_repeated_on_stdout() {
        let mut with_warning = report(RuleOutcome::Fixed {
            outcome: ApplyOutcome::Applied { windows: 1 },
        });
        with_warning.warnings = vec!["Unknown option colour= in section [Notepad]".to_string()];

        let lines = report_lines(&[with_warning], false).unwrap();
        assert_eq!(lines, vec!["[Notepad] moved 1 window(s)".to_string()]);
    }

    #[test]
    fn test_json_lines_carry_warnings() {
        let mut with_warning = report(RuleOutcome::Fixed {
            outcome: ApplyOutcome::Applied { windows: 1 },
        });
        with_warning.warnings = vec!["Unknown option colour= in section [Notepad]".to_string()];

        let lines = report_lines(&[with_warning], true).unwrap();
        assert_eq!(lines.len(), 1);
        let json: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(json["warnings"][0], "Unknown option colour= in section [Notepad]");
    }

    #[test]
    fn test_status_line_applied() {
        let line = status_line(&report(RuleOutcome::Fixed {
            outcome: ApplyOutcome::Applied { windows: 2 },
        }));
        assert_eq!(line, "[Notepad] moved 2 window(s)");
    }

    #[test]
    fn test_status_line_captured_maximized() {
        let line = status_line(&report(RuleOutcome::Captured {
            state: WindowState {
                geometry: Geometry::new(0, 0, 1920, 1080),
                placement: Placement::Maximized,
            },
        }));
        assert_eq!(line, "[Notepad] saved state=maximized");
    }

    #[test]
    fn test_status_line_gave_up_after_launch() {
        let line = status_line(&report(RuleOutcome::Fixed {
            outcome: ApplyOutcome::GaveUp {
                launch: LaunchAttempt::TimedOut { waited_secs: 1.0 },
            },
        }));
        assert_eq!(line, "[Notepad] started command, waited 1.0 seconds, and gave up");
    }
}
