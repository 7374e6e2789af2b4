use regex::Regex;
use tracing::{debug, trace};

use crate::errors::WindowError;
use crate::types::MatchMode;
use crate::window::{Window, WindowSystem};

/// Find the live windows whose title matches `pattern` anywhere
///
/// Enumerates afresh on every call and keeps the system's enumeration order.
/// Windows that vanish before their title can be read are skipped.
/// With [`MatchMode::First`] at most one window is returned.
pub fn find_windows<'a>(
    system: &'a dyn WindowSystem,
    pattern: &Regex,
    mode: MatchMode,
) -> Result<Vec<Window<'a>>, WindowError> {
    let mut matches = Vec::new();
    for id in system.enumerate_windows()? {
        let window = Window::new(id, system);
        let Some(title) = window.title() else {
            continue;
        };
        if pattern.is_match(&title) {
            trace!(window = id, title = %title, "title matched");
            matches.push(window);
            if mode == MatchMode::First {
                break;
            }
        }
    }
    debug!(pattern = %pattern, ?mode, count = matches.len(), "matched windows");
    Ok(matches)
}
