use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Screen-relative window rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from an edge rectangle; width and height are derived from the edges
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x={} y={} w={} h={}", self.x, self.y, self.width, self.height)
    }
}

/// Normal/minimized/maximized classification of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Normal,
    Minimized,
    Maximized,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Normal => "normal",
            Placement::Minimized => "minimized",
            Placement::Maximized => "maximized",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Placement::Normal),
            "minimized" => Ok(Placement::Minimized),
            "maximized" => Ok(Placement::Maximized),
            other => Err(other.to_string()),
        }
    }
}

/// Live state of one window: rectangle plus placement
/// The rectangle is only meaningful when `placement` is `Normal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowState {
    #[serde(flatten)]
    pub geometry: Geometry,
    pub placement: Placement,
}

/// Whether a rule acts on the first matching window or on all of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    First,
    #[default]
    All,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(MatchMode::First),
            "all" => Ok(MatchMode::All),
            other => Err(other.to_string()),
        }
    }
}
