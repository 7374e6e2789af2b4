//! In-memory window system for tests

use std::cell::{Cell, RefCell};

use super::{Rect, ShowCommand, WindowId, WindowSystem};
use crate::errors::WindowError;
use crate::types::{Geometry, Placement};

/// A mutation that reached a live window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Position(WindowId, Geometry),
    Show(WindowId, ShowCommand),
}

/// How much of a window is still reachable after it was destroyed behind the
/// caller's back; it keeps showing up in enumerations either way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vanished {
    /// Every read and write fails
    Entirely,
    /// The title can still be read, everything else fails
    AfterTitle,
}

#[derive(Debug, Clone)]
struct FakeWindow {
    id: WindowId,
    title: String,
    geometry: Geometry,
    placement: Placement,
    vanished: Option<Vanished>,
}

struct Pending {
    after_enumerations: usize,
    window: FakeWindow,
}

#[derive(Default)]
pub struct FakeWindowSystem {
    windows: RefCell<Vec<FakeWindow>>,
    pending: RefCell<Vec<Pending>>,
    mutations: RefCell<Vec<Call>>,
    enumerations: Cell<usize>,
    next_id: Cell<WindowId>,
    fail_enumeration: Cell<bool>,
}

impl FakeWindowSystem {
    pub fn new() -> Self {
        let system = Self::default();
        system.next_id.set(0x1000);
        system
    }

    fn allocate(&self, title: &str, geometry: Geometry, placement: Placement) -> FakeWindow {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        FakeWindow {
            id,
            title: title.to_string(),
            geometry,
            placement,
            vanished: None,
        }
    }

    /// Add a window at the end of the enumeration order
    pub fn add_window(&self, title: &str, geometry: Geometry, placement: Placement) -> WindowId {
        let window = self.allocate(title, geometry, placement);
        let id = window.id;
        self.windows.borrow_mut().push(window);
        id
    }

    /// Add a window that only shows up once `enumerations` more enumerations have happened
    pub fn add_window_later(&self, enumerations: usize, title: &str, geometry: Geometry) -> WindowId {
        let window = self.allocate(title, geometry, Placement::Normal);
        let id = window.id;
        self.pending.borrow_mut().push(Pending {
            after_enumerations: self.enumerations.get() + enumerations,
            window,
        });
        id
    }

    pub fn remove_window(&self, id: WindowId) {
        self.windows.borrow_mut().retain(|w| w.id != id);
    }

    /// Keep enumerating `id` but fail every read and write on it
    pub fn vanish_after_enumeration(&self, id: WindowId) {
        self.mark_vanished(id, Vanished::Entirely);
    }

    /// Keep enumerating `id` and serving its title, but fail everything else
    pub fn vanish_after_title(&self, id: WindowId) {
        self.mark_vanished(id, Vanished::AfterTitle);
    }

    fn mark_vanished(&self, id: WindowId, vanished: Vanished) {
        if let Some(window) = self.windows.borrow_mut().iter_mut().find(|w| w.id == id) {
            window.vanished = Some(vanished);
        }
    }

    pub fn set_fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.set(fail);
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.mutations.borrow().clone()
    }

    pub fn enumerations(&self) -> usize {
        self.enumerations.get()
    }

    pub fn geometry_of(&self, id: WindowId) -> Option<Geometry> {
        self.find(id, |w| w.geometry)
    }

    pub fn placement_of(&self, id: WindowId) -> Option<Placement> {
        self.find(id, |w| w.placement)
    }

    fn find<T>(&self, id: WindowId, f: impl FnOnce(&FakeWindow) -> T) -> Option<T> {
        self.windows.borrow().iter().find(|w| w.id == id).map(f)
    }

    fn with_window<T>(
        &self,
        id: WindowId,
        f: impl FnOnce(&mut FakeWindow) -> T,
    ) -> Result<T, WindowError> {
        self.with_reachable(id, |vanished| vanished.is_none(), f)
    }

    fn with_title<T>(&self, id: WindowId, f: impl FnOnce(&mut FakeWindow) -> T) -> Result<T, WindowError> {
        self.with_reachable(id, |vanished| vanished != Some(Vanished::Entirely), f)
    }

    fn with_reachable<T>(
        &self,
        id: WindowId,
        reachable: impl FnOnce(Option<Vanished>) -> bool,
        f: impl FnOnce(&mut FakeWindow) -> T,
    ) -> Result<T, WindowError> {
        self.windows
            .borrow_mut()
            .iter_mut()
            .find(|w| w.id == id)
            .filter(|w| reachable(w.vanished))
            .map(f)
            .ok_or_else(|| WindowError::Unavailable {
                window: id,
                message: "BadWindow".to_string(),
            })
    }
}

impl WindowSystem for FakeWindowSystem {
    fn enumerate_windows(&self) -> Result<Vec<WindowId>, WindowError> {
        if self.fail_enumeration.get() {
            return Err(WindowError::EnumerationFailed {
                message: "rejected".to_string(),
            });
        }
        let count = self.enumerations.get() + 1;
        self.enumerations.set(count);

        let mut pending = self.pending.borrow_mut();
        let (ready, waiting): (Vec<_>, Vec<_>) = pending
            .drain(..)
            .partition(|p| p.after_enumerations < count);
        *pending = waiting;
        self.windows
            .borrow_mut()
            .extend(ready.into_iter().map(|p| p.window));

        Ok(self.windows.borrow().iter().map(|w| w.id).collect())
    }

    fn window_title(&self, window: WindowId) -> Result<String, WindowError> {
        self.with_title(window, |w| w.title.clone())
    }

    fn window_rect(&self, window: WindowId) -> Result<Rect, WindowError> {
        self.with_window(window, |w| Rect {
            left: w.geometry.x,
            top: w.geometry.y,
            right: w.geometry.x + w.geometry.width,
            bottom: w.geometry.y + w.geometry.height,
        })
    }

    fn window_placement(&self, window: WindowId) -> Result<Placement, WindowError> {
        self.with_window(window, |w| w.placement)
    }

    fn set_window_position(&self, window: WindowId, geometry: Geometry) -> Result<(), WindowError> {
        self.with_window(window, |w| w.geometry = geometry)?;
        self.mutations
            .borrow_mut()
            .push(Call::Position(window, geometry));
        Ok(())
    }

    fn set_window_show(&self, window: WindowId, command: ShowCommand) -> Result<(), WindowError> {
        self.with_window(window, |w| {
            w.placement = match command {
                ShowCommand::Restore => Placement::Normal,
                ShowCommand::Minimize => Placement::Minimized,
                ShowCommand::Maximize => Placement::Maximized,
            }
        })?;
        self.mutations.borrow_mut().push(Call::Show(window, command));
        Ok(())
    }
}
