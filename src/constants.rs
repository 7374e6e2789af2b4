//! Application-wide constants
//!
//! Magic numbers and option names used throughout the tool, kept in one place
//! so the config layer, the rule engine and the X11 backend agree on them.

/// Configuration file defaults
pub mod config {
    /// Config file looked up in the working directory when `--conf` is not given
    pub const DEFAULT_FILENAME: &str = "windowfixer.ini";
}

/// Option keys recognized inside a rule section
pub mod keys {
    pub const TITLE: &str = "title";
    pub const MATCH: &str = "match";
    pub const STATE: &str = "state";
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const W: &str = "w";
    pub const H: &str = "h";
    pub const RUN_IF_NOT_FOUND: &str = "run_if_not_found";
    pub const RUN_KEEP_TRYING: &str = "run_keep_trying";

    /// Every key a section may carry; anything else is warned about
    pub const KNOWN: &[&str] = &[
        TITLE,
        MATCH,
        STATE,
        X,
        Y,
        W,
        H,
        RUN_IF_NOT_FOUND,
        RUN_KEEP_TRYING,
    ];

    /// Geometry keys, rewritten or removed together on save
    pub const GEOMETRY: &[&str] = &[X, Y, W, H];
}

/// Launch-and-retry timing
pub mod retry {
    use std::time::Duration;

    /// Fixed delay between match attempts while a launched program starts
    pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

    /// Seconds to keep trying when `run_keep_trying` is not set
    pub const DEFAULT_KEEP_TRYING_SECS: f64 = 5.0;
}

/// X11 protocol constants (EWMH / ICCCM)
pub mod x11 {
    /// `_NET_WM_STATE` client message action: remove the property
    pub const NET_WM_STATE_REMOVE: u32 = 0;

    /// `_NET_WM_STATE` client message action: add the property
    pub const NET_WM_STATE_ADD: u32 = 1;

    /// Source indication for EWMH client messages (2 = pager/direct user action)
    pub const SOURCE_INDICATION_PAGER: u32 = 2;

    /// ICCCM `IconicState` for `WM_CHANGE_STATE`
    pub const ICONIC_STATE: u32 = 3;

    /// Upper bound, in 32-bit units, when reading title properties
    pub const MAX_TITLE_LENGTH: u32 = 1024;
}
