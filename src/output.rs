//! Output formatting: grep-compatible (default) and JSON Lines (`--json`).
//!
//! All result data flows through a [`Formatter`] which writes to an
//! arbitrary [`std::io::Write`] destination (typically stdout).
//! Hints and errors always go to stderr via [`print_hint`] and [`print_error`].

use std::io::Write;

use serde::Serialize;

use crate::color;
use crate::engine::EngineState;
use crate::types::TagLocation;

// ---------------------------------------------------------------------------
// Serializable output types
// ---------------------------------------------------------------------------

/// A symbol name from a symbol listing or completion.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolEntry {
    pub name: String,
}

/// A file from a file listing.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub path: String,
}

/// Engine diagnostics for `codejumper status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusOutput {
    pub ready: bool,
    pub working_root: String,
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_root: Option<String>,
    /// Nearest directory holding the marker file, found without the tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub located_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusOutput {
    pub fn from_state(state: &EngineState, located_root: Option<String>) -> Self {
        Self {
            ready: state.is_ready(),
            working_root: state.working_root.display().to_string(),
            tool: state.tool_path.display().to_string(),
            tool_version: state.tool_version.clone(),
            tag_root: state.tag_root.as_ref().map(|p| p.display().to_string()),
            located_root,
            error: state.init_error.as_ref().map(ToString::to_string),
        }
    }
}

// ---------------------------------------------------------------------------
// Formatter
// ---------------------------------------------------------------------------

/// Output formatter that can render results in either grep-compatible text
/// or JSON Lines (one JSON object per line).
pub struct Formatter<W: Write> {
    writer: W,
    json: bool,
    color: bool,
}

impl<W: Write> Formatter<W> {
    /// Create a new formatter.
    ///
    /// * `writer` - The destination for output (e.g. `std::io::stdout()`).
    /// * `json`   - When `true`, emit JSON Lines; otherwise, emit grep-style text.
    /// * `color`  - When `true`, emit ANSI color codes in grep-style output.
    pub fn new(writer: W, json: bool, color: bool) -> Self {
        Self {
            writer,
            json,
            color,
        }
    }

    fn write_json<T: Serialize>(&mut self, value: &T) -> std::io::Result<()> {
        let line = serde_json::to_string(value).map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    fn write_colored(&mut self, code: &str, text: &str) -> std::io::Result<()> {
        if self.color {
            write!(self.writer, "{code}{text}{}", color::RESET)
        } else {
            write!(self.writer, "{text}")
        }
    }

    fn write_sep(&mut self) -> std::io::Result<()> {
        self.write_colored(color::SEP, ":")
    }

    /// Format one location as `file:LINE:snippet`, with the 1-based line.
    ///
    /// `display_path` replaces the stored path in text mode (e.g. a path
    /// relative to the tag root); JSON always carries the record as stored.
    pub fn format_location(
        &mut self,
        location: &TagLocation,
        display_path: &str,
    ) -> std::io::Result<()> {
        if self.json {
            return self.write_json(location);
        }
        self.write_colored(color::FILE, display_path)?;
        self.write_sep()?;
        self.write_colored(color::LINE_NO, &location.display_line().to_string())?;
        self.write_sep()?;
        writeln!(self.writer, "{}", location.snippet)
    }

    /// Format one symbol name.
    pub fn format_symbol(&mut self, entry: &SymbolEntry) -> std::io::Result<()> {
        if self.json {
            return self.write_json(entry);
        }
        self.write_colored(color::SYMBOL, &entry.name)?;
        writeln!(self.writer)
    }

    /// Format one file path.
    pub fn format_file(&mut self, entry: &FileEntry) -> std::io::Result<()> {
        if self.json {
            return self.write_json(entry);
        }
        self.write_colored(color::FILE, &entry.path)?;
        writeln!(self.writer)
    }

    /// Format engine diagnostics, one `key: value` line per field.
    pub fn format_status(&mut self, status: &StatusOutput) -> std::io::Result<()> {
        if self.json {
            return self.write_json(status);
        }
        let state = if status.ready { "ready" } else { "unavailable" };
        writeln!(self.writer, "engine: {state}")?;
        writeln!(self.writer, "working root: {}", status.working_root)?;
        writeln!(self.writer, "tool: {}", status.tool)?;
        if let Some(version) = &status.tool_version {
            writeln!(self.writer, "version: {version}")?;
        }
        if let Some(root) = &status.tag_root {
            writeln!(self.writer, "tag root: {root}")?;
        }
        if let Some(root) = &status.located_root {
            writeln!(self.writer, "GTAGS found in: {root}")?;
        }
        if let Some(err) = &status.error {
            writeln!(self.writer, "error: {err}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stderr helpers
// ---------------------------------------------------------------------------

/// Print a hint message to stderr (suppressed when `json` is true).
pub fn print_hint(msg: &str, json: bool) {
    if !json {
        eprintln!("hint: {msg}");
    }
}

/// Print an error message to stderr.
pub fn print_error(msg: &str) {
    eprintln!("error: {msg}");
}

/// Format a [`JumperError`](crate::errors::JumperError) to stderr with
/// structured `error:` / `hint:` lines and return the process exit code.
pub fn format_error(err: &crate::errors::JumperError, json: bool) -> i32 {
    // `:#` prints the whole context chain of wrapped anyhow errors.
    print_error(&format!("{err:#}"));
    if let Some(hint) = err.hint() {
        print_hint(hint, json);
    }
    err.exit_code()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
