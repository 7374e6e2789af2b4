//! Windowing-system seam
//!
//! The rule engine never talks to X11 directly. It goes through the
//! [`WindowSystem`] primitives, wrapped per window by [`Window`], so tests can
//! bind an in-memory fake and production binds [`x11::X11WindowSystem`].

#[cfg(test)]
pub mod fake;
pub mod x11;

use std::fmt;
use tracing::debug;

use crate::errors::WindowError;
use crate::types::{Geometry, Placement, WindowState};

/// Opaque identifier of a live top-level window
/// Only valid for the enumeration pass that produced it
pub type WindowId = u32;

/// Edge rectangle as reported by the windowing system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Show command issued when changing a window's placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowCommand {
    Restore,
    Minimize,
    Maximize,
}

/// The primitive operations the engine needs from the windowing system
pub trait WindowSystem {
    /// Currently live top-level windows, in the system's stacking/creation order
    fn enumerate_windows(&self) -> Result<Vec<WindowId>, WindowError>;

    /// Window title; empty when the window has none
    fn window_title(&self, window: WindowId) -> Result<String, WindowError>;

    fn window_rect(&self, window: WindowId) -> Result<Rect, WindowError>;

    fn window_placement(&self, window: WindowId) -> Result<Placement, WindowError>;

    /// Move and resize without touching the stacking order
    fn set_window_position(&self, window: WindowId, geometry: Geometry) -> Result<(), WindowError>;

    fn set_window_show(&self, window: WindowId, command: ShowCommand) -> Result<(), WindowError>;
}

/// One live window, read and written through a [`WindowSystem`]
///
/// Reads return `None` and writes are dropped when the window vanished since
/// it was enumerated; a vanished window simply stops counting.
#[derive(Clone, Copy)]
pub struct Window<'a> {
    id: WindowId,
    system: &'a dyn WindowSystem,
}

impl<'a> Window<'a> {
    pub fn new(id: WindowId, system: &'a dyn WindowSystem) -> Self {
        Self { id, system }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn title(&self) -> Option<String> {
        self.system
            .window_title(self.id)
            .inspect_err(|e| debug!(window = self.id, error = %e, "Could not read window title"))
            .ok()
    }

    pub fn geometry(&self) -> Option<Geometry> {
        self.system
            .window_rect(self.id)
            .map(|r| Geometry::from_edges(r.left, r.top, r.right, r.bottom))
            .inspect_err(|e| debug!(window = self.id, error = %e, "Could not read window rectangle"))
            .ok()
    }

    pub fn placement(&self) -> Option<Placement> {
        self.system
            .window_placement(self.id)
            .inspect_err(|e| debug!(window = self.id, error = %e, "Could not read window placement"))
            .ok()
    }

    /// Geometry and placement together, or `None` if either read failed
    pub fn state(&self) -> Option<WindowState> {
        Some(WindowState {
            geometry: self.geometry()?,
            placement: self.placement()?,
        })
    }

    /// Returns whether the system accepted the request
    pub fn set_geometry(&self, geometry: Geometry) -> bool {
        self.system
            .set_window_position(self.id, geometry)
            .inspect_err(|e| debug!(window = self.id, error = %e, "Could not move window"))
            .is_ok()
    }

    pub fn restore(&self) -> bool {
        self.show(ShowCommand::Restore)
    }

    pub fn minimize(&self) -> bool {
        self.show(ShowCommand::Minimize)
    }

    pub fn maximize(&self) -> bool {
        self.show(ShowCommand::Maximize)
    }

    fn show(&self, command: ShowCommand) -> bool {
        self.system
            .set_window_show(self.id, command)
            .inspect_err(|e| debug!(window = self.id, ?command, error = %e, "Could not change window placement"))
            .is_ok()
    }
}

impl fmt::Display for Window<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id(), self.title().unwrap_or_default())
    }
}

impl fmt::Debug for Window<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{Call, FakeWindowSystem};
    use super::*;

    #[test]
    fn test_geometry_derived_from_edges() {
        let system = FakeWindowSystem::new();
        let id = system.add_window("Notepad", Geometry::new(10, 20, 300, 200), Placement::Normal);
        let window = Window::new(id, &system);

        assert_eq!(window.geometry(), Some(Geometry::new(10, 20, 300, 200)));
        assert_eq!(window.title().as_deref(), Some("Notepad"));
    }

    #[test]
    fn test_untitled_window_has_empty_title() {
        let system = FakeWindowSystem::new();
        let id = system.add_window("", Geometry::new(0, 0, 10, 10), Placement::Normal);

        assert_eq!(Window::new(id, &system).title().as_deref(), Some(""));
    }

    #[test]
    fn test_vanished_window_reads_none() {
        let system = FakeWindowSystem::new();
        let id = system.add_window("Notepad", Geometry::new(0, 0, 100, 100), Placement::Normal);
        system.remove_window(id);
        let window = Window::new(id, &system);

        assert_eq!(window.title(), None);
        assert_eq!(window.geometry(), None);
        assert_eq!(window.placement(), None);
        assert_eq!(window.state(), None);
    }

    #[test]
    fn test_writes_to_vanished_window_are_dropped() {
        let system = FakeWindowSystem::new();
        let id = system.add_window("Notepad", Geometry::new(0, 0, 100, 100), Placement::Normal);
        system.remove_window(id);
        let window = Window::new(id, &system);

        assert!(!window.restore());
        assert!(!window.set_geometry(Geometry::new(1, 2, 3, 4)));
        assert!(system.mutations().is_empty());
    }

    #[test]
    fn test_show_commands_reach_system() {
        let system = FakeWindowSystem::new();
        let id = system.add_window("Notepad", Geometry::new(0, 0, 100, 100), Placement::Normal);
        let window = Window::new(id, &system);

        assert!(window.maximize());
        assert_eq!(window.placement(), Some(Placement::Maximized));
        assert!(window.minimize());
        assert_eq!(window.placement(), Some(Placement::Minimized));
        assert!(window.restore());
        assert_eq!(window.placement(), Some(Placement::Normal));
        assert_eq!(
            system.mutations(),
            vec![
                Call::Show(id, ShowCommand::Maximize),
                Call::Show(id, ShowCommand::Minimize),
                Call::Show(id, ShowCommand::Restore),
            ]
        );
    }
}
