//! One configured window target and its save/fix behavior

use regex::Regex;
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::constants::{keys, retry};
use crate::errors::{CaptureError, ConfigError, WindowError};
use crate::launcher::Launcher;
use crate::matcher::find_windows;
use crate::types::{Geometry, MatchMode, Placement, WindowState};
use crate::window::{Window, WindowSystem};

/// Typed options of one config section, validated once
#[derive(Debug, Clone, PartialEq)]
pub struct RuleConfig {
    pub title: String,
    pub match_mode: MatchMode,
    pub state: Option<Placement>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub w: Option<i32>,
    pub h: Option<i32>,
    pub run_if_not_found: Option<String>,
    pub run_keep_trying: f64,
}

fn lookup<'o>(options: &'o [(String, String)], key: &str) -> Option<&'o str> {
    options
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim())
}

/// Like `lookup`, but a blank value counts as absent
fn lookup_non_blank<'o>(options: &'o [(String, String)], key: &str) -> Option<&'o str> {
    lookup(options, key).filter(|v| !v.is_empty())
}

fn read_int(options: &[(String, String)], key: &str) -> Result<Option<i32>, ConfigError> {
    lookup_non_blank(options, key)
        .map(|v| {
            v.parse::<i32>().map_err(|_| ConfigError::InvalidInteger {
                key: key.to_string(),
                value: v.to_string(),
            })
        })
        .transpose()
}

impl RuleConfig {
    pub fn from_options(options: &[(String, String)]) -> Result<Self, ConfigError> {
        let title = lookup(options, keys::TITLE).ok_or(ConfigError::MissingTitle)?;

        let match_mode = match lookup(options, keys::MATCH) {
            Some(value) => value
                .parse::<MatchMode>()
                .map_err(|value| ConfigError::InvalidMatchMode { value })?,
            None => MatchMode::default(),
        };

        let state = lookup_non_blank(options, keys::STATE)
            .map(|v| v.parse::<Placement>().map_err(|value| ConfigError::InvalidState { value }))
            .transpose()?;

        let run_keep_trying = match lookup_non_blank(options, keys::RUN_KEEP_TRYING) {
            Some(v) => v
                .parse::<f64>()
                .ok()
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .ok_or_else(|| ConfigError::InvalidFloat {
                    key: keys::RUN_KEEP_TRYING.to_string(),
                    value: v.to_string(),
                })?,
            None => retry::DEFAULT_KEEP_TRYING_SECS,
        };

        Ok(Self {
            title: title.to_string(),
            match_mode,
            state,
            x: read_int(options, keys::X)?,
            y: read_int(options, keys::Y)?,
            w: read_int(options, keys::W)?,
            h: read_int(options, keys::H)?,
            run_if_not_found: lookup_non_blank(options, keys::RUN_IF_NOT_FOUND).map(str::to_string),
            run_keep_trying,
        })
    }
}

/// Option keys this tool does not recognize, in section order
pub fn unknown_keys(options: &[(String, String)]) -> Vec<String> {
    options
        .iter()
        .filter(|(k, _)| !keys::KNOWN.contains(&k.as_str()))
        .map(|(k, _)| k.clone())
        .collect()
}

/// What a rule pushes onto its windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Geometry(Geometry),
    /// Minimized or maximized; stored geometry is not used
    Placement(Placement),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaunchAttempt {
    NotConfigured,
    Failed { message: String },
    TimedOut { waited_secs: f64 },
}

/// Terminal state of [`Rule::apply`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ApplyOutcome {
    Applied { windows: usize },
    /// No complete position recorded; nothing was touched
    Skipped { missing: Vec<&'static str> },
    GaveUp { launch: LaunchAttempt },
}

#[derive(Debug)]
pub struct Rule {
    name: String,
    title: Regex,
    match_mode: MatchMode,
    state: Option<Placement>,
    x: Option<i32>,
    y: Option<i32>,
    w: Option<i32>,
    h: Option<i32>,
    launch_command: Option<String>,
    keep_trying: Duration,
}

impl Rule {
    pub fn new(name: &str, config: RuleConfig) -> Result<Self, ConfigError> {
        let title = Regex::new(&config.title).map_err(|e| ConfigError::InvalidPattern {
            pattern: config.title.clone(),
            message: e.to_string(),
        })?;
        let keep_trying = Duration::try_from_secs_f64(config.run_keep_trying).map_err(|_| {
            ConfigError::InvalidFloat {
                key: keys::RUN_KEEP_TRYING.to_string(),
                value: config.run_keep_trying.to_string(),
            }
        })?;
        Ok(Self {
            name: name.to_string(),
            title,
            match_mode: config.match_mode,
            state: config.state,
            x: config.x,
            y: config.y,
            w: config.w,
            h: config.h,
            launch_command: config.run_if_not_found,
            keep_trying,
        })
    }

    /// Validate a section's options and build the rule in one step
    pub fn from_options(name: &str, options: &[(String, String)]) -> Result<Self, ConfigError> {
        Self::new(name, RuleConfig::from_options(options)?)
    }

    fn target(&self) -> Result<Target, Vec<&'static str>> {
        match self.state.unwrap_or_default() {
            Placement::Normal => match (self.x, self.y, self.w, self.h) {
                (Some(x), Some(y), Some(w), Some(h)) => Ok(Target::Geometry(Geometry::new(x, y, w, h))),
                _ => Err([(keys::X, self.x), (keys::Y, self.y), (keys::W, self.w), (keys::H, self.h)]
                    .into_iter()
                    .filter(|(_, v)| v.is_none())
                    .map(|(k, _)| k)
                    .collect()),
            },
            placement => Ok(Target::Placement(placement)),
        }
    }

    /// Read the state of the first matching window that can still be read
    pub fn capture(&self, system: &dyn WindowSystem) -> Result<WindowState, CaptureError> {
        // Every match is a candidate; the first one may vanish before its state is read
        let windows = find_windows(system, &self.title, MatchMode::All)?;
        let state = windows
            .iter()
            .find_map(|w| w.state())
            .ok_or(CaptureError::NoWindowFound)?;
        info!(rule = %self.name, geometry = %state.geometry, placement = %state.placement, "Captured current position");
        Ok(state)
    }

    /// Push the stored position onto every matching window
    ///
    /// When nothing matches and a program is configured, it is started and
    /// matching is retried every poll interval until the retry window closes.
    pub fn apply(
        &self,
        system: &dyn WindowSystem,
        launcher: &dyn Launcher,
    ) -> Result<ApplyOutcome, WindowError> {
        let target = match self.target() {
            Ok(target) => target,
            Err(missing) => {
                warn!(
                    rule = %self.name, x = ?self.x, y = ?self.y, w = ?self.w, h = ?self.h,
                    "Incomplete saved position. Edit the config file, or run with -s after manually positioning the window"
                );
                return Ok(ApplyOutcome::Skipped { missing });
            }
        };

        let fixed = self.apply_to_matching(system, target)?;
        if fixed > 0 {
            return Ok(ApplyOutcome::Applied { windows: fixed });
        }

        let Some(command) = &self.launch_command else {
            info!(rule = %self.name, "Unable to find matching window");
            return Ok(ApplyOutcome::GaveUp {
                launch: LaunchAttempt::NotConfigured,
            });
        };

        if let Err(e) = launcher.launch(command) {
            warn!(rule = %self.name, error = %e, "Could not start program");
            return Ok(ApplyOutcome::GaveUp {
                launch: LaunchAttempt::Failed {
                    message: e.to_string(),
                },
            });
        }

        let start = Instant::now();
        while start.elapsed() < self.keep_trying {
            let remaining = self.keep_trying.saturating_sub(start.elapsed());
            thread::sleep(retry::POLL_INTERVAL.min(remaining));
            let fixed = self.apply_to_matching(system, target)?;
            if fixed > 0 {
                info!(rule = %self.name, waited_ms = start.elapsed().as_millis() as u64, "Window appeared after launch");
                return Ok(ApplyOutcome::Applied { windows: fixed });
            }
        }

        let waited = start.elapsed();
        info!(rule = %self.name, command = %command, waited_secs = waited.as_secs_f64(), "Started command, waited, and gave up");
        Ok(ApplyOutcome::GaveUp {
            launch: LaunchAttempt::TimedOut {
                waited_secs: waited.as_secs_f64(),
            },
        })
    }

    /// One match-and-apply pass; returns how many windows accepted the target
    fn apply_to_matching(&self, system: &dyn WindowSystem, target: Target) -> Result<usize, WindowError> {
        let windows = find_windows(system, &self.title, self.match_mode)?;
        Ok(windows
            .iter()
            .filter(|window| self.apply_to_window(window, target))
            .count())
    }

    fn apply_to_window(&self, window: &Window<'_>, target: Target) -> bool {
        match target {
            Target::Geometry(geometry) => {
                info!(rule = %self.name, window = %window, %geometry, "Move window");
                window.restore() && window.set_geometry(geometry)
            }
            Target::Placement(Placement::Maximized) => {
                info!(rule = %self.name, window = %window, "Maximize window");
                window.maximize()
            }
            Target::Placement(Placement::Minimized) => {
                info!(rule = %self.name, window = %window, "Minimize window");
                window.minimize()
            }
            Target::Placement(Placement::Normal) => {
                // target() never yields this; geometry carries normal placement
                window.restore()
            }
        }
    }
}
