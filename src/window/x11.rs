//! X11 backend for [`WindowSystem`], speaking EWMH to the running window manager

use anyhow::{Context, Result};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    self, Atom, AtomEnum, ClientMessageEvent, ConfigureWindowAux, ConnectionExt as _, EventMask,
};
use x11rb::rust_connection::RustConnection;

use super::{Rect, ShowCommand, WindowId, WindowSystem};
use crate::constants::x11;
use crate::errors::WindowError;
use crate::types::{Geometry, Placement};

/// `_NET_MOVERESIZE_WINDOW` gravity: coordinates describe the client window itself
const STATIC_GRAVITY: u32 = 10;

/// `_NET_MOVERESIZE_WINDOW` flags selecting x, y, width and height
const MOVERESIZE_ALL_FIELDS: u32 = 0b1111 << 8;

/// Pre-cached atoms to avoid a roundtrip per lookup
pub struct CachedAtoms {
    pub utf8_string: Atom,
    pub net_wm_name: Atom,
    pub net_client_list: Atom,
    pub net_supported: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_hidden: Atom,
    pub net_wm_state_maximized_vert: Atom,
    pub net_wm_state_maximized_horz: Atom,
    pub net_moveresize_window: Atom,
    pub net_frame_extents: Atom,
    pub wm_change_state: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .context(format!("Failed to intern {name} atom"))?
        .reply()
        .context(format!("Failed to get reply for {name} atom"))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            utf8_string: intern(conn, "UTF8_STRING")?,
            net_wm_name: intern(conn, "_NET_WM_NAME")?,
            net_client_list: intern(conn, "_NET_CLIENT_LIST")?,
            net_supported: intern(conn, "_NET_SUPPORTED")?,
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_hidden: intern(conn, "_NET_WM_STATE_HIDDEN")?,
            net_wm_state_maximized_vert: intern(conn, "_NET_WM_STATE_MAXIMIZED_VERT")?,
            net_wm_state_maximized_horz: intern(conn, "_NET_WM_STATE_MAXIMIZED_HORZ")?,
            net_moveresize_window: intern(conn, "_NET_MOVERESIZE_WINDOW")?,
            net_frame_extents: intern(conn, "_NET_FRAME_EXTENTS")?,
            wm_change_state: intern(conn, "WM_CHANGE_STATE")?,
        })
    }
}

/// Frame origin that puts the client's top-left corner at `geometry`
///
/// `extents` is `_NET_FRAME_EXTENTS` (left, right, top, bottom); missing
/// values count as no decoration.
fn frame_origin(geometry: Geometry, extents: &[u32]) -> (i32, i32) {
    let border = |index: usize| extents.get(index).map_or(0, |&v| i32::try_from(v).unwrap_or(0));
    (geometry.x - border(0), geometry.y - border(2))
}

pub struct X11WindowSystem {
    conn: RustConnection,
    root: xproto::Window,
    atoms: CachedAtoms,
    /// Whether the window manager advertises `_NET_MOVERESIZE_WINDOW`
    wm_moveresize: bool,
}

impl X11WindowSystem {
    /// Connect to the display named by `$DISPLAY`
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X11 display")?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = CachedAtoms::new(&conn)?;

        let supported = conn
            .get_property(false, root, atoms.net_supported, AtomEnum::ATOM, 0, u32::MAX)
            .context("Failed to query _NET_SUPPORTED")?
            .reply()
            .context("Failed to get reply for _NET_SUPPORTED")?;
        let wm_moveresize = supported
            .value32()
            .is_some_and(|mut atoms_iter| atoms_iter.any(|a| a == atoms.net_moveresize_window));

        info!(screen = screen_num, wm_moveresize, "successfully connected to x11");
        Ok(Self {
            conn,
            root,
            atoms,
            wm_moveresize,
        })
    }

    fn unavailable(window: WindowId) -> impl Fn(&dyn std::fmt::Display) -> WindowError {
        move |e: &dyn std::fmt::Display| WindowError::Unavailable {
            window,
            message: e.to_string(),
        }
    }

    fn read_string(&self, window: WindowId, property: Atom, type_: Atom) -> Result<String, WindowError> {
        let unavailable = Self::unavailable(window);
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, x11::MAX_TITLE_LENGTH)
            .map_err(|e| unavailable(&e))?
            .reply()
            .map_err(|e| unavailable(&e))?;
        Ok(String::from_utf8_lossy(&reply.value).into_owned())
    }

    fn wm_state(&self, window: WindowId) -> Result<Vec<Atom>, WindowError> {
        let unavailable = Self::unavailable(window);
        let reply = self
            .conn
            .get_property(false, window, self.atoms.net_wm_state, AtomEnum::ATOM, 0, 1024)
            .map_err(|e| unavailable(&e))?
            .reply()
            .map_err(|e| unavailable(&e))?;
        Ok(reply.value32().map(|v| v.collect()).unwrap_or_default())
    }

    /// Send a client message to the root window on behalf of `window`
    fn send_root_message(&self, window: WindowId, type_: Atom, data: [u32; 5]) -> Result<(), WindowError> {
        let unavailable = Self::unavailable(window);
        let event = ClientMessageEvent::new(32, window, type_, data);
        self.conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
                event,
            )
            .map_err(|e| unavailable(&e))?;
        Ok(())
    }

    fn change_maximized(&self, window: WindowId, action: u32) -> Result<(), WindowError> {
        self.send_root_message(
            window,
            self.atoms.net_wm_state,
            [
                action,
                self.atoms.net_wm_state_maximized_vert,
                self.atoms.net_wm_state_maximized_horz,
                x11::SOURCE_INDICATION_PAGER,
                0,
            ],
        )
    }

    fn frame_extents(&self, window: WindowId) -> Result<Vec<u32>, WindowError> {
        let unavailable = Self::unavailable(window);
        let reply = self
            .conn
            .get_property(false, window, self.atoms.net_frame_extents, AtomEnum::CARDINAL, 0, 4)
            .map_err(|e| unavailable(&e))?
            .reply()
            .map_err(|e| unavailable(&e))?;
        Ok(reply.value32().map(|v| v.collect()).unwrap_or_default())
    }

    fn flush(&self, window: WindowId) -> Result<(), WindowError> {
        self.conn.flush().map_err(|e| Self::unavailable(window)(&e))
    }
}

impl WindowSystem for X11WindowSystem {
    fn enumerate_windows(&self) -> Result<Vec<WindowId>, WindowError> {
        let failed = |e: &dyn std::fmt::Display| WindowError::EnumerationFailed {
            message: e.to_string(),
        };
        let prop = self
            .conn
            .get_property(false, self.root, self.atoms.net_client_list, AtomEnum::WINDOW, 0, u32::MAX)
            .map_err(|e| failed(&e))?
            .reply()
            .map_err(|e| failed(&e))?;
        let windows: Vec<WindowId> = prop
            .value32()
            .ok_or_else(|| WindowError::EnumerationFailed {
                message: "Invalid return from _NET_CLIENT_LIST".to_string(),
            })?
            .collect();
        debug!(count = windows.len(), "enumerated client windows");
        Ok(windows)
    }

    fn window_title(&self, window: WindowId) -> Result<String, WindowError> {
        let title = self.read_string(window, self.atoms.net_wm_name, self.atoms.utf8_string)?;
        if !title.is_empty() {
            return Ok(title);
        }
        self.read_string(window, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into())
    }

    fn window_rect(&self, window: WindowId) -> Result<Rect, WindowError> {
        let unavailable = Self::unavailable(window);
        let geometry = self
            .conn
            .get_geometry(window)
            .map_err(|e| unavailable(&e))?
            .reply()
            .map_err(|e| unavailable(&e))?;
        // Reparenting window managers report geometry relative to the frame
        let origin = self
            .conn
            .translate_coordinates(window, self.root, 0, 0)
            .map_err(|e| unavailable(&e))?
            .reply()
            .map_err(|e| unavailable(&e))?;

        let left = i32::from(origin.dst_x);
        let top = i32::from(origin.dst_y);
        Ok(Rect {
            left,
            top,
            right: left + i32::from(geometry.width),
            bottom: top + i32::from(geometry.height),
        })
    }

    fn window_placement(&self, window: WindowId) -> Result<Placement, WindowError> {
        let state = self.wm_state(window)?;
        if state.contains(&self.atoms.net_wm_state_hidden) {
            Ok(Placement::Minimized)
        } else if state.contains(&self.atoms.net_wm_state_maximized_vert)
            && state.contains(&self.atoms.net_wm_state_maximized_horz)
        {
            Ok(Placement::Maximized)
        } else {
            Ok(Placement::Normal)
        }
    }

    fn set_window_position(&self, window: WindowId, geometry: Geometry) -> Result<(), WindowError> {
        let width = geometry.width.max(1) as u32;
        let height = geometry.height.max(1) as u32;

        if self.wm_moveresize {
            self.send_root_message(
                window,
                self.atoms.net_moveresize_window,
                [
                    STATIC_GRAVITY | MOVERESIZE_ALL_FIELDS | (x11::SOURCE_INDICATION_PAGER << 12),
                    geometry.x as u32,
                    geometry.y as u32,
                    width,
                    height,
                ],
            )?;
        } else {
            // NorthWest gravity places the frame, not the client, at the requested origin
            let (x, y) = frame_origin(geometry, &self.frame_extents(window)?);
            let unavailable = Self::unavailable(window);
            self.conn
                .configure_window(
                    window,
                    &ConfigureWindowAux::new()
                        .x(x)
                        .y(y)
                        .width(width)
                        .height(height),
                )
                .map_err(|e| unavailable(&e))?;
        }
        self.flush(window)
    }

    fn set_window_show(&self, window: WindowId, command: ShowCommand) -> Result<(), WindowError> {
        let unavailable = Self::unavailable(window);
        match command {
            ShowCommand::Restore => {
                // Mapping an iconified client de-iconifies it (ICCCM 4.1.4)
                self.conn.map_window(window).map_err(|e| unavailable(&e))?;
                self.change_maximized(window, x11::NET_WM_STATE_REMOVE)?;
            }
            ShowCommand::Minimize => {
                self.send_root_message(
                    window,
                    self.atoms.wm_change_state,
                    [x11::ICONIC_STATE, 0, 0, 0, 0],
                )?;
            }
            ShowCommand::Maximize => {
                self.conn.map_window(window).map_err(|e| unavailable(&e))?;
                self.change_maximized(window, x11::NET_WM_STATE_ADD)?;
            }
        }
        self.flush(window)
    }
}
