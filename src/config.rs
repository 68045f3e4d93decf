//! Configuration file parsing, defaults, and merging.
//!
//! Configuration is loaded in layers (last wins):
//! 1. Built-in defaults
//! 2. Global config from `~/.codejumper/config.toml`
//! 3. Per-project config from `<root>/.codejumper/config.toml`
//!
//! Each layer only overrides fields it explicitly sets; absent fields
//! are left at their previous value.  Command-line flags are applied on
//! top by the router.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::color::ColorMode;
use crate::engine::ToolFlags;
use crate::locator::DEFAULT_MARKER;

/// Name of the per-user and per-project configuration directory.
pub const CONFIG_DIR: &str = ".codejumper";

// ---------------------------------------------------------------------------
// Public config types (fully resolved, no Options)
// ---------------------------------------------------------------------------

/// Top-level configuration, fully resolved with defaults applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub tool: ToolConfig,
    pub completion: CompletionConfig,
    pub output: OutputConfig,
}

/// How to run and interpret the external tagging tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    /// Explicit executable path; `None` resolves `global` through `PATH`.
    pub path: Option<PathBuf>,
    /// Substring the version output must contain.
    pub version_marker: String,
    /// Substring of the root query's output that means "no database".
    pub not_found_marker: String,
    /// File whose presence marks a tag-database root.
    pub marker_file: String,
    /// Argument lists for each query.
    pub flags: ToolFlags,
}

/// Interactive completion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    /// Whether completion suggestions are offered at all.
    pub enabled: bool,
    /// Upper bound for one completion lookup, in milliseconds.
    pub timeout_ms: u64,
}

/// Output / display settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    /// Default output format: `"grep"` or `"json"`.
    pub default_format: String,
    /// Color mode: `"auto"`, `"always"`, or `"never"`.
    pub color: String,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            path: None,
            version_marker: "(GNU GLOBAL)".to_string(),
            not_found_marker: "not found".to_string(),
            marker_file: DEFAULT_MARKER.to_string(),
            flags: ToolFlags::default(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 1500,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: "grep".to_string(),
            color: "auto".to_string(),
        }
    }
}

impl CompletionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl OutputConfig {
    /// The configured color mode; loading rejects values this cannot parse.
    pub fn color_mode(&self) -> Result<ColorMode> {
        self.color.parse().map_err(anyhow::Error::msg)
    }
}

// ---------------------------------------------------------------------------
// Option-based overlay types (for partial deserialization)
// ---------------------------------------------------------------------------

/// Mirror of [`Config`] where every field is `Option`, so we can
/// deserialize a partial TOML file and overlay only the keys that are
/// present.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigOverlay {
    tool: Option<ToolOverlay>,
    completion: Option<CompletionOverlay>,
    output: Option<OutputOverlay>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ToolOverlay {
    path: Option<PathBuf>,
    version_marker: Option<String>,
    not_found_marker: Option<String>,
    marker_file: Option<String>,
    flags: Option<FlagsOverlay>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FlagsOverlay {
    version: Option<Vec<String>>,
    root: Option<Vec<String>>,
    definition: Option<Vec<String>>,
    reference: Option<Vec<String>>,
    symbols: Option<Vec<String>>,
    completion: Option<Vec<String>>,
    files: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CompletionOverlay {
    enabled: Option<bool>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputOverlay {
    default_format: Option<String>,
    color: Option<String>,
}

// ---------------------------------------------------------------------------
// Merge helpers
// ---------------------------------------------------------------------------

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl Config {
    /// Apply an overlay on top of this config, replacing only the fields
    /// that are `Some` in the overlay.
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(tool) = overlay.tool {
            if tool.path.is_some() {
                self.tool.path = tool.path;
            }
            set(&mut self.tool.version_marker, tool.version_marker);
            set(&mut self.tool.not_found_marker, tool.not_found_marker);
            set(&mut self.tool.marker_file, tool.marker_file);
            if let Some(flags) = tool.flags {
                let target = &mut self.tool.flags;
                set(&mut target.version, flags.version);
                set(&mut target.root, flags.root);
                set(&mut target.definition, flags.definition);
                set(&mut target.reference, flags.reference);
                set(&mut target.symbols, flags.symbols);
                set(&mut target.completion, flags.completion);
                set(&mut target.files, flags.files);
            }
        }
        if let Some(c) = overlay.completion {
            set(&mut self.completion.enabled, c.enabled);
            set(&mut self.completion.timeout_ms, c.timeout_ms);
        }
        if let Some(out) = overlay.output {
            set(&mut self.output.default_format, out.default_format);
            set(&mut self.output.color, out.color);
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Return the user's home directory.
fn home_dir() -> Option<PathBuf> {
    #[allow(deprecated)]
    std::env::home_dir()
}

/// Parse a TOML string into a [`ConfigOverlay`], producing a clear error
/// message on malformed input.
fn parse_overlay(contents: &str, path: &Path) -> Result<ConfigOverlay> {
    toml::from_str(contents)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Reject values that parse as TOML but mean nothing to us.
fn validate_overlay(overlay: &ConfigOverlay, path: &Path) -> Result<()> {
    let color = overlay.output.as_ref().and_then(|out| out.color.as_deref());
    if let Some(mode) = color {
        mode.parse::<ColorMode>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid `output.color` in {}", path.display()))?;
    }
    Ok(())
}

/// Try to read a config file and parse it as an overlay.
/// Returns `Ok(None)` if the file does not exist.
fn load_overlay(path: &Path) -> Result<Option<ConfigOverlay>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let overlay = parse_overlay(&contents, path)?;
            validate_overlay(&overlay, path)?;
            Ok(Some(overlay))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(anyhow::anyhow!(
            "failed to read config file {}: {}",
            path.display(),
            e
        )),
    }
}

impl Config {
    /// Load configuration by merging layers:
    /// defaults -> global (`~/.codejumper/config.toml`) -> per-project
    /// (`<root>/.codejumper/config.toml`).
    pub fn load(project_root: Option<&Path>) -> Result<Config> {
        let global_dir = home_dir().map(|h| h.join(CONFIG_DIR));
        Self::load_with_global_dir(global_dir.as_deref(), project_root)
    }

    /// Load config with an explicit global config directory, so tests can
    /// supply a temporary directory instead of the real `~/.codejumper`.
    pub fn load_with_global_dir(
        global_dir: Option<&Path>,
        project_root: Option<&Path>,
    ) -> Result<Config> {
        let mut config = Config::default();

        if let Some(dir) = global_dir {
            let global_path = dir.join("config.toml");
            if let Some(overlay) = load_overlay(&global_path)? {
                config.apply_overlay(overlay);
            }
        }

        if let Some(root) = project_root {
            let project_path = root.join(CONFIG_DIR).join("config.toml");
            if let Some(overlay) = load_overlay(&project_path)? {
                config.apply_overlay(overlay);
            }
        }

        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
