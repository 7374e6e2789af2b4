use std::process::{Command, Stdio};
use tracing::info;

use crate::errors::LaunchError;

/// Starts the program that owns a rule's window
pub trait Launcher {
    /// Fire-and-forget: the spawned process is not tracked afterwards
    fn launch(&self, command: &str) -> Result<(), LaunchError>;
}

/// Spawns `run_if_not_found` as a child process
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&self, command: &str) -> Result<(), LaunchError> {
        let child = Command::new(command)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::SpawnFailed {
                command: command.to_string(),
                source,
            })?;
        info!(command = %command, pid = child.id(), "Started program");
        Ok(())
    }
}
