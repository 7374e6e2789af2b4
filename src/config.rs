//! The windowfixer.ini document
//!
//! One section per rule, in file order. Sections are handed to the rule
//! engine as raw `(key, value)` lists with lowercased keys. Captured positions
//! are written back by editing only the affected lines, so comments, blank
//! lines, key order and every other option survive a save.

use anyhow::{Context, Result};
use ini::{Ini, ParseOption};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::keys;
use crate::errors::FatalError;
use crate::types::{Placement, WindowState};

/// One rule section as written in the file
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub options: Vec<(String, String)>,
}

/// The raw lines of the file, edited in place
#[derive(Debug, Clone, PartialEq)]
struct Document {
    lines: Vec<String>,
    line_ending: &'static str,
    trailing_newline: bool,
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with(';') || trimmed.starts_with('#')
}

/// Section name of a `[name]` header line
fn header_name(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('[')?;
    let end = inner.find(']')?;
    Some(inner[..end].trim())
}

/// Byte offset of the `=` or `:` separating key and value
fn separator(line: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || is_comment(trimmed) || trimmed.starts_with('[') {
        return None;
    }
    line.find(['=', ':'])
}

fn line_key(line: &str) -> Option<String> {
    separator(line).map(|sep| line[..sep].trim().to_lowercase())
}

impl Document {
    fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
            line_ending: if text.contains("\r\n") { "\r\n" } else { "\n" },
            trailing_newline: text.is_empty() || text.ends_with('\n'),
        }
    }

    fn render(&self) -> String {
        let mut text = self.lines.join(self.line_ending);
        if self.trailing_newline && !self.lines.is_empty() {
            text.push_str(self.line_ending);
        }
        text
    }

    /// Body line range of the first section called `name`
    fn section_body(&self, name: &str) -> Option<(usize, usize)> {
        let header = self.lines.iter().position(|l| header_name(l) == Some(name))?;
        let end = self.lines[header + 1..]
            .iter()
            .position(|l| header_name(l).is_some())
            .map_or(self.lines.len(), |offset| header + 1 + offset);
        Some((header + 1, end))
    }

    /// Set `key` inside the section, rewriting only the value part of existing
    /// lines or appending after the section's last option
    fn set(&mut self, section: &str, key: &str, value: &str) -> bool {
        let Some((start, end)) = self.section_body(section) else {
            return false;
        };

        let mut found = false;
        for line in &mut self.lines[start..end] {
            if line_key(line).as_deref() != Some(key) {
                continue;
            }
            if let Some(sep) = separator(line) {
                let spacing = line[sep + 1..].len() - line[sep + 1..].trim_start().len();
                line.truncate(sep + 1 + spacing);
                line.push_str(value);
                found = true;
            }
        }

        if !found {
            let insert_at = self.lines[start..end]
                .iter()
                .rposition(|l| line_key(l).is_some())
                .map_or(start, |offset| start + offset + 1);
            self.lines.insert(insert_at, format!("{key}={value}"));
        }
        true
    }

    fn remove(&mut self, section: &str, key: &str) {
        let Some((start, end)) = self.section_body(section) else {
            return;
        };
        let mut index = start;
        let mut end = end;
        while index < end {
            if line_key(&self.lines[index]).as_deref() == Some(key) {
                self.lines.remove(index);
                end -= 1;
            } else {
                index += 1;
            }
        }
    }
}

pub struct ConfigFile {
    path: PathBuf,
    ini: Ini,
    document: Document,
}

impl ConfigFile {
    /// Load the config, failing before any rule runs if it is missing,
    /// unreadable, or (when `require_writable`) cannot be written back
    pub fn open(path: &Path, require_writable: bool) -> Result<Self, FatalError> {
        if !path.is_file() {
            return Err(FatalError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        if require_writable && OpenOptions::new().append(true).open(path).is_err() {
            return Err(FatalError::ConfigNotWritable {
                path: path.to_path_buf(),
            });
        }

        let unreadable = |message: String| FatalError::ConfigUnreadable {
            path: path.to_path_buf(),
            message,
        };
        let text = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;

        // Title patterns are regexes; backslashes must reach the regex engine untouched
        let parse_option = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(&text, parse_option).map_err(|e| unreadable(e.to_string()))?;

        info!(path = %path.display(), "Loaded config file");
        Ok(Self {
            path: path.to_path_buf(),
            ini,
            document: Document::parse(&text),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Named sections in file order, as loaded; a repeated section name keeps
    /// its first occurrence and option keys are lowercased
    pub fn sections(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();
        for (name, properties) in self.ini.iter() {
            let Some(name) = name else {
                if !properties.is_empty() {
                    warn!("Ignoring options outside of any [section]");
                }
                continue;
            };
            if sections.iter().any(|s| s.name == name) {
                warn!(section = %name, "Duplicate section, only the first one is used");
                continue;
            }
            sections.push(Section {
                name: name.to_string(),
                options: properties
                    .iter()
                    .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                    .collect(),
            });
        }
        sections
    }

    /// Store a captured state in its section
    ///
    /// `state` is always written; `x`,`y`,`w`,`h` are written for a normal
    /// window and removed otherwise. Other lines are left untouched.
    pub fn record_capture(&mut self, section: &str, state: &WindowState) {
        if !self.document.set(section, keys::STATE, state.placement.as_str()) {
            warn!(section = %section, "Captured section no longer exists in config");
            return;
        }

        if state.placement == Placement::Normal {
            let geometry = state.geometry;
            for (key, value) in [
                (keys::X, geometry.x),
                (keys::Y, geometry.y),
                (keys::W, geometry.width),
                (keys::H, geometry.height),
            ] {
                self.document.set(section, key, &value.to_string());
            }
        } else {
            for key in keys::GEOMETRY {
                self.document.remove(section, key);
            }
        }
        debug!(section = %section, placement = %state.placement, "Recorded capture");
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.document.render())
            .context(format!("Failed to write config file to {}", self.path.display()))?;
        info!(path = %self.path.display(), "Saved config file");
        Ok(())
    }
}
