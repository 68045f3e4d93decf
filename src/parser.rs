//! Parsing of the tagging tool's line-oriented output.
//!
//! Two grammars, picked by query kind:
//!
//! * cross-reference records, one per line:
//!   `SYMBOL <ws> LINE <ws> FILEPATH <ws> SNIPPET`
//! * line lists: one symbol name or file path per line.
//!
//! Both accept `\n` and `\r\n` terminators.  "Nothing to report" is always
//! `None`; a returned `Some` vector is never empty.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::TagLocation;

/// Anchored per line (`m`), with `\r\n` treated as a terminator (`R`) so a
/// carriage return never leaks into the snippet.  Group 4 is the separator
/// in front of the snippet.
static CXREF_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mR)^(\w+)[ \t]+(\d+)[ \t]+(\S+)([ \t])(.*)$")
        .expect("cross-reference pattern is valid")
});

/// Parse cross-reference output into locations, in the order the tool
/// printed them.
///
/// Lines that do not have the four-field shape are skipped, as are records
/// claiming line `0` or a line number too large to represent.  Line numbers
/// are converted from the tool's 1-based numbering to 0-based.
///
/// After a tab the snippet is the rest of the line, indentation included.
/// After a space the record is in `-x` column layout, where the path is
/// padded with spaces, so leading whitespace is dropped; that also drops the
/// source line's own indentation, which the layout cannot tell apart.
pub fn parse_cross_references(raw: &str) -> Option<Vec<TagLocation>> {
    let locations: Vec<TagLocation> = CXREF_LINE
        .captures_iter(raw)
        .filter_map(|caps| {
            let line: usize = caps[2].parse().ok()?;
            let snippet = match &caps[4] {
                "\t" => &caps[5],
                _ => caps[5].trim_start(),
            };
            Some(TagLocation {
                symbol: caps[1].to_string(),
                line: line.checked_sub(1)?,
                file_path: caps[3].to_string(),
                snippet: snippet.to_string(),
            })
        })
        .collect();
    non_empty(locations)
}

/// Parse one-value-per-line output.
///
/// Only the single empty entry produced by a final terminator is dropped;
/// everything else is returned as printed, duplicates included.
pub fn parse_line_list(raw: &str) -> Option<Vec<String>> {
    let mut entries: Vec<String> = raw
        .split('\n')
        .map(|entry| entry.strip_suffix('\r').unwrap_or(entry).to_string())
        .collect();
    if entries.last().is_some_and(String::is_empty) {
        entries.pop();
    }
    non_empty(entries)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}
