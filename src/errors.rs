use std::path::PathBuf;

/// Failure of a single windowing-system primitive
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Failed to enumerate top-level windows: {message}")]
    EnumerationFailed { message: String },

    /// The window is gone or refused the request; callers treat it as vanished
    #[error("Window {window} is no longer available: {message}")]
    Unavailable { window: u32, message: String },
}

/// Per-rule configuration problem; skips only the offending rule
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Section has no title pattern")]
    MissingTitle,

    #[error("Invalid match mode '{value}'; should be 'first' or 'all'")]
    InvalidMatchMode { value: String },

    #[error("Invalid title pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid state '{value}'; should be 'normal', 'minimized' or 'maximized'")]
    InvalidState { value: String },

    #[error("Option {key}= must be an integer, got '{value}'")]
    InvalidInteger { key: String, value: String },

    #[error("Option {key}= must be a non-negative number of seconds, got '{value}'")]
    InvalidFloat { key: String, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Window title was not found, skipping")]
    NoWindowFound,

    #[error(transparent)]
    Window(#[from] WindowError),
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Failed to start '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Conditions that abort the run before any rule executes
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("Config file '{}' does not exist yet. See windowfixer.ini.example", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Config file '{}' exists, but is not writeable, and save mode was requested", path.display())]
    ConfigNotWritable { path: PathBuf },

    #[error("Config file '{}' could not be read: {message}", path.display())]
    ConfigUnreadable { path: PathBuf, message: String },
}
