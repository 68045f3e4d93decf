//! Application error types and user-facing error formatting.
//!
//! Provides structured error types for each layer:
//! - [`InvocationError`] for running the external tagging tool
//! - [`InitError`] for engine construction (tool or tag database missing)
//! - [`QueryError`] for a single failed lookup
//! - [`JumperError`] as the unified top-level error type
//!
//! The [`JumperError`] type carries contextual hints and exit codes so that
//! `main()` can present human-readable diagnostics on stderr without ever
//! exposing raw panics or debug formatting.

use std::time::Duration;

use thiserror::Error;

use crate::types::QueryKind;

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// Process exit codes for failures; a successful run exits with `0`.
///
/// * `1` - runtime error, or the lookup found nothing (like `grep`)
/// * `2` - usage / argument error (bad CLI invocation)
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

// ---------------------------------------------------------------------------
// Layer-specific error types
// ---------------------------------------------------------------------------

/// Errors arising from running the external tool as a subprocess.
#[derive(Error, Debug)]
pub enum InvocationError {
    /// The executable could not be started (missing, not executable, ...).
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but exited unsuccessfully.
    #[error("{program} exited with {}{}", status_label(.status), stderr_suffix(.stderr))]
    Exit {
        program: String,
        /// Exit code, or `None` when the process was killed by a signal.
        status: Option<i32>,
        stderr: String,
    },

    /// The tool did not finish within the allotted time and was killed.
    #[error("{program} did not finish within {}ms", .timeout.as_millis())]
    TimedOut { program: String, timeout: Duration },

    /// A newer request superseded this one and the tool was killed.
    #[error("{program} was cancelled")]
    Cancelled { program: String },
}

fn status_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Errors that make engine construction fail.
///
/// `Clone` so a failed engine can hand the stored error back on every query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// The executable is missing or its version output lacks the product
    /// marker.
    #[error("can't find GNU Global at `{tool}` ({reason}); set the global path or add it to PATH")]
    ToolNotFound { tool: String, reason: String },

    /// No tag database is reachable from the working root.
    #[error(
        "tag files (GTAGS, GRTAGS, GPATH) could not be found in {root} or any parent directory{}",
        stderr_suffix(.detail)
    )]
    DatabaseNotFound { root: String, detail: String },
}

/// Errors from a single lookup.  The engine stays usable afterwards.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Construction failed earlier; the stored error is returned without
    /// invoking the tool again.
    #[error("engine is not ready: {0}")]
    NotReady(InitError),

    /// The tool failed while answering the query.
    #[error("{kind} lookup for `{term}` failed: {source}")]
    QueryFailed {
        kind: QueryKind,
        term: String,
        #[source]
        source: InvocationError,
    },
}

impl QueryError {
    /// The underlying invocation failure, if any.
    pub fn invocation(&self) -> Option<&InvocationError> {
        match self {
            QueryError::QueryFailed { source, .. } => Some(source),
            QueryError::NotReady(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Unified application error
// ---------------------------------------------------------------------------

/// Unified error type for the entire application.
///
/// Allows callers to propagate any layer's error through a single `Result`
/// type while still enabling pattern matching on the specific variant.
#[derive(Error, Debug)]
pub enum JumperError {
    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The lookup ran fine but matched nothing.
    #[error("{}", no_results_message(.kind, .term))]
    NoResults { kind: QueryKind, term: String },

    /// A usage / argument error (exit code 2).
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn no_results_message(kind: &QueryKind, term: &str) -> String {
    if term.is_empty() {
        format!("no {} found", kind.noun())
    } else {
        format!("no {} found for `{term}`", kind.noun())
    }
}

impl JumperError {
    /// Return the appropriate process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            JumperError::Usage(_) => EXIT_USAGE,
            _ => EXIT_ERROR,
        }
    }

    /// Return an optional human-readable hint that may help the user fix
    /// the problem.  Returns `None` when no specific guidance applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            JumperError::Init(InitError::ToolNotFound { .. })
            | JumperError::Query(QueryError::NotReady(InitError::ToolNotFound { .. })) => {
                Some("install GNU Global or pass `--global-path` / set `tool.path` in config")
            }
            JumperError::Init(InitError::DatabaseNotFound { .. })
            | JumperError::Query(QueryError::NotReady(InitError::DatabaseNotFound { .. })) => {
                Some("run `gtags` in the project root to build the tag database")
            }
            JumperError::Query(QueryError::QueryFailed {
                source: InvocationError::TimedOut { .. },
                ..
            }) => Some("use a longer prefix or raise `completion.timeout_ms`"),
            JumperError::Query(QueryError::QueryFailed { .. }) => {
                Some("the tag database may be stale; try `global -u` or re-run `gtags`")
            }
            JumperError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Some("verify the file or directory exists")
            }
            JumperError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Some("check file permissions")
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
