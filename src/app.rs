//! Runs every configured rule in save or fix mode

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ConfigFile, Section};
use crate::errors::{CaptureError, ConfigError};
use crate::launcher::Launcher;
use crate::rule::{unknown_keys, ApplyOutcome, Rule};
use crate::types::WindowState;
use crate::window::WindowSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Move matching windows to their stored position
    Apply,
    /// Store the current position of matching windows
    Capture,
}

/// A rule built from one section, with the warnings raised while reading it
#[derive(Debug)]
pub struct RuleEntry {
    pub name: String,
    pub warnings: Vec<String>,
    pub rule: Result<Rule, ConfigError>,
}

/// Build rules for every section, in config order
pub fn build_rules(sections: &[Section]) -> Vec<RuleEntry> {
    sections
        .iter()
        .map(|section| {
            let warnings = unknown_keys(&section.options)
                .into_iter()
                .map(|key| format!("Unknown option {key}= in section [{}]", section.name))
                .collect();
            RuleEntry {
                name: section.name.clone(),
                warnings,
                rule: Rule::from_options(&section.name, &section.options),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RuleOutcome {
    Fixed { outcome: ApplyOutcome },
    Captured { state: WindowState },
    /// Nothing captured; the stored position is left as it was
    NotCaptured { reason: String },
    /// The section could not be turned into a rule
    Invalid { reason: String },
    /// The windowing system refused the request
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleReport {
    pub name: String,
    pub warnings: Vec<String>,
    pub outcome: RuleOutcome,
}

pub struct WindowFixer<'a> {
    config: ConfigFile,
    mode: RunMode,
    system: &'a dyn WindowSystem,
    launcher: &'a dyn Launcher,
}

impl<'a> WindowFixer<'a> {
    pub fn new(
        config: ConfigFile,
        mode: RunMode,
        system: &'a dyn WindowSystem,
        launcher: &'a dyn Launcher,
    ) -> Self {
        Self {
            config,
            mode,
            system,
            launcher,
        }
    }

    /// Process every rule in order; in capture mode, write captured
    /// positions back to the config file once all rules are done
    pub fn run(&mut self) -> Result<Vec<RuleReport>> {
        let entries = build_rules(&self.config.sections());
        let mut staged: Vec<(String, WindowState)> = Vec::new();
        let mut reports = Vec::with_capacity(entries.len());

        for entry in entries {
            for warning in &entry.warnings {
                warn!(rule = %entry.name, "{warning}");
            }
            let outcome = match &entry.rule {
                Err(e) => {
                    warn!(rule = %entry.name, error = %e, "Skipping rule");
                    RuleOutcome::Invalid {
                        reason: e.to_string(),
                    }
                }
                Ok(rule) => match self.mode {
                    RunMode::Apply => self.apply(rule),
                    RunMode::Capture => {
                        let outcome = self.capture(rule);
                        if let RuleOutcome::Captured { state } = &outcome {
                            staged.push((entry.name.clone(), *state));
                        }
                        outcome
                    }
                },
            };
            reports.push(RuleReport {
                name: entry.name,
                warnings: entry.warnings,
                outcome,
            });
        }

        if self.mode == RunMode::Capture {
            for (name, state) in &staged {
                self.config.record_capture(name, state);
            }
            self.config.save()?;
            info!(captured = staged.len(), path = %self.config.path().display(), "Wrote captured positions");
        }
        Ok(reports)
    }

    fn apply(&self, rule: &Rule) -> RuleOutcome {
        match rule.apply(self.system, self.launcher) {
            Ok(outcome) => RuleOutcome::Fixed { outcome },
            Err(e) => RuleOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    fn capture(&self, rule: &Rule) -> RuleOutcome {
        match rule.capture(self.system) {
            Ok(state) => RuleOutcome::Captured { state },
            Err(CaptureError::NoWindowFound) => RuleOutcome::NotCaptured {
                reason: CaptureError::NoWindowFound.to_string(),
            },
            Err(CaptureError::Window(e)) => RuleOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}
