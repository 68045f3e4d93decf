//! Header lookup for `#include` lines.

use std::sync::LazyLock;

use regex::Regex;

static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"#\s*include\s*[<"]([^>"]+)[>"]"#).expect("include pattern is valid")
});

/// Header named by an `#include` directive in `line`, e.g. `sys/types.h`.
pub fn include_target(line: &str) -> Option<&str> {
    INCLUDE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|target| !target.is_empty())
}

/// File-list pattern matching indexed paths that end in `/<target>`.
///
/// The tool treats the keyword as a regular expression, so the target is
/// escaped before being anchored.
pub fn header_pattern(target: &str) -> String {
    format!("/{}$", regex::escape(target))
}
