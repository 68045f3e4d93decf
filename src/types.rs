//! Shared types and data structures.

use std::fmt;

use serde::Serialize;

/// The five lookups the engine can run against a tag database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Definition,
    Reference,
    Symbols,
    Files,
    Completion,
}

impl QueryKind {
    /// Plural noun used in user-facing messages ("no definitions found").
    pub fn noun(self) -> &'static str {
        match self {
            QueryKind::Definition => "definitions",
            QueryKind::Reference => "references",
            QueryKind::Symbols => "symbols",
            QueryKind::Files => "files",
            QueryKind::Completion => "completions",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryKind::Definition => "definition",
            QueryKind::Reference => "reference",
            QueryKind::Symbols => "symbols",
            QueryKind::Files => "files",
            QueryKind::Completion => "completion",
        };
        write!(f, "{s}")
    }
}

/// One symbol occurrence reported by a cross-reference query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagLocation {
    /// The symbol name as printed by the tool.
    pub symbol: String,
    /// 0-based line number (the tool prints 1-based lines).
    pub line: usize,
    /// Path of the file containing the occurrence.
    #[serde(rename = "file")]
    pub file_path: String,
    /// Source text of the matching line.
    pub snippet: String,
}

impl TagLocation {
    /// 1-based line number, for grep-style display.
    pub fn display_line(&self) -> usize {
        self.line + 1
    }
}
