//! ANSI colors for grep-style output and the rules for when to emit them.
//!
//! Precedence, highest first: `NO_COLOR`, `CLICOLOR_FORCE=1`, an explicit
//! `always`/`never` mode (flag or config), `CLICOLOR=0`, then whether stdout
//! is a terminal.

use std::io::IsTerminal;
use std::str::FromStr;

pub const RESET: &str = "\x1b[0m";
/// File paths: magenta + bold.
pub const FILE: &str = "\x1b[35m\x1b[1m";
/// Line numbers: green.
pub const LINE_NO: &str = "\x1b[32m";
/// Symbol names in listings: bold.
pub const SYMBOL: &str = "\x1b[1m";
/// Separators (colons): cyan.
pub const SEP: &str = "\x1b[36m";

/// Requested color behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" | "true" => Ok(ColorMode::Always),
            "never" | "false" => Ok(ColorMode::Never),
            other => Err(format!(
                "invalid color mode `{other}` (expected auto, always or never)"
            )),
        }
    }
}

/// Environment inputs to the color decision.
#[derive(Debug, Clone, Default)]
pub struct ColorEnv {
    pub no_color: bool,
    pub clicolor_force: Option<String>,
    pub clicolor: Option<String>,
    pub stdout_is_tty: bool,
}

impl ColorEnv {
    pub fn capture() -> Self {
        Self {
            no_color: std::env::var_os("NO_COLOR").is_some(),
            clicolor_force: std::env::var("CLICOLOR_FORCE").ok(),
            clicolor: std::env::var("CLICOLOR").ok(),
            stdout_is_tty: std::io::stdout().is_terminal(),
        }
    }

    pub fn use_color(&self, mode: ColorMode) -> bool {
        if self.no_color {
            return false;
        }
        if self.clicolor_force.as_deref() == Some("1") {
            return true;
        }
        match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => self.clicolor.as_deref() != Some("0") && self.stdout_is_tty,
        }
    }
}

/// Resolve color for the current process.
pub fn resolve_color(mode: ColorMode) -> bool {
    ColorEnv::capture().use_color(mode)
}
