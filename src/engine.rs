//! The tag query engine.
//!
//! An engine is built once per workspace.  Construction validates, in order,
//! that the tagging tool answers its version query with the expected product
//! marker and that its root query finds a tag database.  The outcome is
//! frozen into an [`EngineState`]; a failed engine never runs the tool again
//! and answers every query with the stored [`InitError`].
//!
//! Every query returns `Ok(None)` when the tool ran and found nothing, and
//! `Ok(Some(..))` with at least one entry otherwise.  Tool failures surface
//! as [`QueryError::QueryFailed`], never as an empty result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::ToolConfig;
use crate::errors::{InitError, InvocationError, QueryError};
use crate::parser;
use crate::runner::{CancelToken, Invocation, ProcessRunner, Runner};
use crate::types::{QueryKind, TagLocation};

/// Executable used when no explicit path is configured.
pub const DEFAULT_TOOL: &str = "global";

// ---------------------------------------------------------------------------
// Tool flags
// ---------------------------------------------------------------------------

/// Argument lists placed before the query term, one per tool query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFlags {
    pub version: Vec<String>,
    pub root: Vec<String>,
    pub definition: Vec<String>,
    pub reference: Vec<String>,
    pub symbols: Vec<String>,
    pub completion: Vec<String>,
    pub files: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ToolFlags {
    /// GNU Global flags: `-a` prints absolute paths, `-x` prints
    /// cross-reference records, `-r` looks up references, `-c` completes
    /// symbol names and `-P` lists indexed paths.
    fn default() -> Self {
        Self {
            version: strings(&["--version"]),
            root: strings(&["-p"]),
            definition: strings(&["-a", "-x"]),
            reference: strings(&["-a", "-r", "-x"]),
            symbols: strings(&["-c"]),
            completion: strings(&["-c"]),
            files: strings(&["-a", "-P"]),
        }
    }
}

impl ToolFlags {
    pub fn for_query(&self, kind: QueryKind) -> &[String] {
        match kind {
            QueryKind::Definition => &self.definition,
            QueryKind::Reference => &self.reference,
            QueryKind::Symbols => &self.symbols,
            QueryKind::Files => &self.files,
            QueryKind::Completion => &self.completion,
        }
    }
}

/// Build the argument vector for one query.  An empty term is omitted so
/// the tool sees "no pattern" (all symbols, all files) rather than `""`.
/// Otherwise `--` ends option parsing, so a term like `-u` stays a term.
fn query_args(flags: &[String], term: &str) -> Vec<String> {
    let mut args = flags.to_vec();
    if !term.is_empty() {
        args.push("--".to_string());
        args.push(term.to_string());
    }
    args
}

// ---------------------------------------------------------------------------
// Options and state
// ---------------------------------------------------------------------------

/// Everything the engine needs to know about the tool, read once at
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub tool_path: Option<PathBuf>,
    pub version_marker: String,
    pub not_found_marker: String,
    pub flags: ToolFlags,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&ToolConfig::default())
    }
}

impl From<&ToolConfig> for EngineOptions {
    fn from(tool: &ToolConfig) -> Self {
        Self {
            tool_path: tool.path.clone(),
            version_marker: tool.version_marker.clone(),
            not_found_marker: tool.not_found_marker.clone(),
            flags: tool.flags.clone(),
        }
    }
}

/// Result of engine validation.  Never changes after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    /// Directory every tool invocation runs in.
    pub working_root: PathBuf,
    /// Executable that is invoked.
    pub tool_path: PathBuf,
    pub tool_version_valid: bool,
    pub tag_root_found: bool,
    /// Why validation failed, if it did.
    pub init_error: Option<InitError>,
    /// First line of the tool's version output.
    pub tool_version: Option<String>,
    /// Database root as printed by the tool's root query.
    pub tag_root: Option<PathBuf>,
}

impl EngineState {
    pub fn is_ready(&self) -> bool {
        self.init_error.is_none()
    }

    /// Human-readable construction error, empty when the engine is ready.
    pub fn init_error_message(&self) -> String {
        self.init_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Cross-reference lookups against one tag database.
///
/// Holds no mutable state, so a shared reference can serve concurrent
/// queries.
#[derive(Debug)]
pub struct TagEngine<R = ProcessRunner> {
    state: EngineState,
    flags: ToolFlags,
    runner: R,
}

impl TagEngine<ProcessRunner> {
    /// Validate and return a ready engine, or the construction error.
    pub fn open(working_root: &Path, options: EngineOptions) -> Result<Self, InitError> {
        Self::open_with(ProcessRunner, working_root, options)
    }

    /// Validate and return the engine whatever the outcome; inspect
    /// [`TagEngine::state`] to see whether it is usable.
    pub fn validate(working_root: &Path, options: EngineOptions) -> Self {
        Self::validate_with(ProcessRunner, working_root, options)
    }
}

impl<R: Runner> TagEngine<R> {
    pub fn open_with(
        runner: R,
        working_root: &Path,
        options: EngineOptions,
    ) -> Result<Self, InitError> {
        let engine = Self::validate_with(runner, working_root, options);
        match &engine.state.init_error {
            Some(err) => Err(err.clone()),
            None => Ok(engine),
        }
    }

    pub fn validate_with(runner: R, working_root: &Path, options: EngineOptions) -> Self {
        let tool_path = options
            .tool_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL));
        let mut state = EngineState {
            working_root: working_root.to_path_buf(),
            tool_path,
            tool_version_valid: false,
            tag_root_found: false,
            init_error: None,
            tool_version: None,
            tag_root: None,
        };

        match check_version(&runner, &state, &options) {
            Ok(version) => {
                state.tool_version_valid = true;
                state.tool_version = Some(version);
            }
            Err(err) => {
                warn!(tool = %state.tool_path.display(), "tool validation failed: {err}");
                state.init_error = Some(err);
                return Self::assemble(state, options, runner);
            }
        }

        match check_database(&runner, &state, &options) {
            Ok(root) => {
                state.tag_root_found = true;
                state.tag_root = Some(root);
            }
            Err(err) => {
                warn!(root = %state.working_root.display(), "tag database validation failed: {err}");
                state.init_error = Some(err);
                return Self::assemble(state, options, runner);
            }
        }

        info!(
            version = state.tool_version.as_deref().unwrap_or_default(),
            tag_root = %state.tag_root.as_deref().unwrap_or(working_root).display(),
            "tag engine ready"
        );
        Self::assemble(state, options, runner)
    }

    fn assemble(state: EngineState, options: EngineOptions, runner: R) -> Self {
        Self {
            state,
            flags: options.flags,
            runner,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Definitions of `symbol`.
    pub fn find_definition(&self, symbol: &str) -> Result<Option<Vec<TagLocation>>, QueryError> {
        self.cross_reference(QueryKind::Definition, symbol)
    }

    /// References to `symbol`, as the tool defines them.
    pub fn find_reference(&self, symbol: &str) -> Result<Option<Vec<TagLocation>>, QueryError> {
        self.cross_reference(QueryKind::Reference, symbol)
    }

    /// Symbols starting with `prefix`.  An empty prefix lists every symbol
    /// in the database, which can be very large.
    pub fn list_symbols(&self, prefix: &str) -> Result<Option<Vec<String>>, QueryError> {
        self.line_list(QueryKind::Symbols, prefix, None, None)
    }

    /// Indexed files whose path contains `keyword`; all files when empty.
    ///
    /// The tool reads the file-list argument as a regular expression, so
    /// the keyword is escaped to match literally.
    pub fn list_files(&self, keyword: &str) -> Result<Option<Vec<String>>, QueryError> {
        self.line_list(QueryKind::Files, &regex::escape(keyword), None, None)
    }

    /// Indexed files whose path matches the regular expression `pattern`,
    /// handed to the tool as is.
    pub fn list_files_matching(&self, pattern: &str) -> Result<Option<Vec<String>>, QueryError> {
        self.line_list(QueryKind::Files, pattern, None, None)
    }

    /// Symbol names for interactive completion.  Blocks for exactly one
    /// tool invocation; see [`crate::completion::Completer`] for the
    /// bounded, supersedable form.
    pub fn complete_symbol(&self, prefix: &str) -> Result<Option<Vec<String>>, QueryError> {
        self.line_list(QueryKind::Completion, prefix, None, None)
    }

    /// [`TagEngine::complete_symbol`] with an optional deadline and
    /// cancellation token.
    pub fn complete_symbol_bounded(
        &self,
        prefix: &str,
        timeout: Option<Duration>,
        cancel: Option<&CancelToken>,
    ) -> Result<Option<Vec<String>>, QueryError> {
        self.line_list(QueryKind::Completion, prefix, timeout, cancel)
    }

    /// `path` relative to the tag root when it lies inside it, unchanged
    /// otherwise.
    pub fn relative_path<'a>(&self, path: &'a str) -> &'a str {
        let Some(root) = self.state.tag_root.as_deref() else {
            return path;
        };
        match Path::new(path).strip_prefix(root) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_str().unwrap_or(path),
            _ => path,
        }
    }

    fn cross_reference(
        &self,
        kind: QueryKind,
        term: &str,
    ) -> Result<Option<Vec<TagLocation>>, QueryError> {
        let raw = self.run_query(kind, term, None, None)?;
        let parsed = parser::parse_cross_references(&raw);
        debug!(%kind, term, hits = parsed.as_ref().map_or(0, Vec::len), "query finished");
        Ok(parsed)
    }

    fn line_list(
        &self,
        kind: QueryKind,
        term: &str,
        timeout: Option<Duration>,
        cancel: Option<&CancelToken>,
    ) -> Result<Option<Vec<String>>, QueryError> {
        let raw = self.run_query(kind, term, timeout, cancel)?;
        let parsed = parser::parse_line_list(&raw);
        debug!(%kind, term, hits = parsed.as_ref().map_or(0, Vec::len), "query finished");
        Ok(parsed)
    }

    fn run_query(
        &self,
        kind: QueryKind,
        term: &str,
        timeout: Option<Duration>,
        cancel: Option<&CancelToken>,
    ) -> Result<String, QueryError> {
        if let Some(err) = &self.state.init_error {
            return Err(QueryError::NotReady(err.clone()));
        }
        let args = query_args(self.flags.for_query(kind), term);
        let mut invocation =
            Invocation::new(&self.state.tool_path, &args, &self.state.working_root);
        invocation.timeout = timeout;
        invocation.cancel = cancel;

        self.runner.run(&invocation).map_err(|source| {
            if !matches!(source, InvocationError::Cancelled { .. }) {
                warn!(%kind, term, "query failed: {source}");
            }
            QueryError::QueryFailed {
                kind,
                term: term.to_string(),
                source,
            }
        })
    }
}

/// Step 1: the version query must run and mention the product marker.
fn check_version<R: Runner>(
    runner: &R,
    state: &EngineState,
    options: &EngineOptions,
) -> Result<String, InitError> {
    let tool = state.tool_path.display().to_string();
    let invocation = Invocation::new(&state.tool_path, &options.flags.version, &state.working_root);
    let output = runner.run(&invocation).map_err(|err| InitError::ToolNotFound {
        tool: tool.clone(),
        reason: err.to_string(),
    })?;
    if !output.contains(&options.version_marker) {
        return Err(InitError::ToolNotFound {
            tool,
            reason: format!("version output lacks `{}`", options.version_marker),
        });
    }
    let first_line = output.lines().next().unwrap_or_default().trim();
    Ok(first_line.to_string())
}

/// Step 2: the root query must name a database rather than report it
/// missing.
fn check_database<R: Runner>(
    runner: &R,
    state: &EngineState,
    options: &EngineOptions,
) -> Result<PathBuf, InitError> {
    let root = state.working_root.display().to_string();
    let invocation = Invocation::new(&state.tool_path, &options.flags.root, &state.working_root);
    let output = match runner.run(&invocation) {
        Ok(output) => output,
        Err(InvocationError::Exit { stderr, .. }) => {
            return Err(InitError::DatabaseNotFound {
                root,
                detail: stderr,
            });
        }
        Err(err) => {
            return Err(InitError::DatabaseNotFound {
                root,
                detail: err.to_string(),
            });
        }
    };
    let printed = output.lines().next().unwrap_or_default().trim();
    if printed.is_empty() || output.contains(&options.not_found_marker) {
        return Err(InitError::DatabaseNotFound {
            root,
            detail: output.trim().to_string(),
        });
    }
    Ok(PathBuf::from(printed))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted answers keyed by the space-joined argument vector; every
    /// call is recorded.
    #[derive(Debug, Default)]
    pub(crate) struct FakeRunner {
        answers: HashMap<String, Result<String, (Option<i32>, String)>>,
        pub(crate) calls: Mutex<Vec<Vec<String>>>,
    }

    impl FakeRunner {
        /// A runner for a healthy GNU Global with a database at `/work`.
        pub(crate) fn healthy() -> Self {
            Self::default()
                .answer("--version", "global (GNU GLOBAL) 6.6.10\nCopyright ...\n")
                .answer("-p", "/work\n")
        }

        pub(crate) fn answer(mut self, args: &str, stdout: &str) -> Self {
            self.answers.insert(args.to_string(), Ok(stdout.to_string()));
            self
        }

        pub(crate) fn fail(mut self, args: &str, status: i32, stderr: &str) -> Self {
            self.answers
                .insert(args.to_string(), Err((Some(status), stderr.to_string())));
            self
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Runner for FakeRunner {
        fn run(&self, invocation: &Invocation<'_>) -> Result<String, InvocationError> {
            self.calls.lock().unwrap().push(invocation.args.to_vec());
            let key = invocation.args.join(" ");
            match self.answers.get(&key) {
                Some(Ok(stdout)) => Ok(stdout.clone()),
                Some(Err((status, stderr))) => Err(InvocationError::Exit {
                    program: invocation.program.display().to_string(),
                    status: *status,
                    stderr: stderr.clone(),
                }),
                None => Ok(String::new()),
            }
        }
    }

    fn engine(runner: FakeRunner) -> TagEngine<FakeRunner> {
        TagEngine::validate_with(runner, Path::new("/work"), EngineOptions::default())
    }

    // -- construction -------------------------------------------------------

    #[test]
    fn healthy_tool_makes_ready_engine() {
        let e = engine(FakeRunner::healthy());
        let state = e.state();
        assert!(e.is_ready());
        assert!(state.tool_version_valid);
        assert!(state.tag_root_found);
        assert_eq!(state.tool_version.as_deref(), Some("global (GNU GLOBAL) 6.6.10"));
        assert_eq!(state.tag_root.as_deref(), Some(Path::new("/work")));
        assert_eq!(state.tool_path, PathBuf::from("global"));
        assert_eq!(state.init_error_message(), "");
    }

    #[test]
    fn validation_runs_version_then_root() {
        let e = engine(FakeRunner::healthy());
        let calls = e.runner.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![vec!["--version".to_string()], vec!["-p".to_string()]]);
    }

    #[test]
    fn explicit_tool_path_is_used() {
        let options = EngineOptions {
            tool_path: Some(PathBuf::from("/opt/bin/global")),
            ..EngineOptions::default()
        };
        let e = TagEngine::validate_with(FakeRunner::healthy(), Path::new("/work"), options);
        assert_eq!(e.state().tool_path, PathBuf::from("/opt/bin/global"));
    }

    #[test]
    fn missing_version_marker_is_tool_not_found() {
        let runner = FakeRunner::default()
            .answer("--version", "ctags 5.8\n")
            .answer("-p", "/work\n");
        let e = engine(runner);
        assert!(!e.is_ready());
        assert!(!e.state().tool_version_valid);
        assert!(matches!(e.state().init_error, Some(InitError::ToolNotFound { .. })));
        // The root query is never attempted.
        assert_eq!(e.runner.call_count(), 1);
    }

    #[test]
    fn version_failure_is_tool_not_found() {
        let runner = FakeRunner::default().fail("--version", 127, "sh: global: not found");
        let err = TagEngine::open_with(runner, Path::new("/work"), EngineOptions::default())
            .unwrap_err();
        assert!(matches!(err, InitError::ToolNotFound { .. }));
    }

    #[test]
    fn root_query_failure_is_database_not_found() {
        let runner = FakeRunner::default()
            .answer("--version", "global (GNU GLOBAL) 6.6.10\n")
            .fail("-p", 3, "global: GTAGS not found.\n");
        let e = engine(runner);
        assert!(e.state().tool_version_valid);
        assert!(!e.state().tag_root_found);
        match &e.state().init_error {
            Some(InitError::DatabaseNotFound { root, detail }) => {
                assert_eq!(root, "/work");
                assert!(detail.contains("GTAGS not found"));
            }
            other => panic!("expected DatabaseNotFound, got {other:?}"),
        }
    }

    #[test]
    fn not_found_marker_on_stdout_is_database_not_found() {
        let runner = FakeRunner::default()
            .answer("--version", "global (GNU GLOBAL) 6.6.10\n")
            .answer("-p", "global: GTAGS not found.\n");
        let e = engine(runner);
        assert!(matches!(
            e.state().init_error,
            Some(InitError::DatabaseNotFound { .. })
        ));
    }

    #[test]
    fn empty_root_output_is_database_not_found() {
        let runner = FakeRunner::default().answer("--version", "global (GNU GLOBAL) 6.6.10\n");
        let e = engine(runner);
        assert!(matches!(
            e.state().init_error,
            Some(InitError::DatabaseNotFound { .. })
        ));
    }

    #[test]
    fn failed_engine_never_invokes_tool_again() {
        let runner = FakeRunner::default().answer("--version", "nothing useful\n");
        let e = engine(runner);
        let before = e.runner.call_count();

        for result in [e.find_definition("main"), e.find_reference("main")] {
            assert!(matches!(
                result,
                Err(QueryError::NotReady(InitError::ToolNotFound { .. }))
            ));
        }
        assert!(matches!(e.list_symbols(""), Err(QueryError::NotReady(_))));
        assert!(matches!(e.list_files(""), Err(QueryError::NotReady(_))));
        assert!(matches!(e.complete_symbol("m"), Err(QueryError::NotReady(_))));
        assert_eq!(e.runner.call_count(), before);
    }

    #[test]
    fn open_returns_stored_error_message() {
        let runner = FakeRunner::default().answer("--version", "nothing useful\n");
        let e = engine(runner);
        assert!(e.state().init_error_message().contains("can't find GNU Global"));
    }

    // -- queries ------------------------------------------------------------

    #[test]
    fn definition_query_parses_locations() {
        let runner = FakeRunner::healthy()
            .answer("-a -x -- main", "main\t10\t/src/a.c\tint main() {}\n");
        let e = engine(runner);
        let locs = e.find_definition("main").unwrap().unwrap();
        assert_eq!(
            locs,
            vec![TagLocation {
                symbol: "main".into(),
                line: 9,
                file_path: "/src/a.c".into(),
                snippet: "int main() {}".into(),
            }]
        );
    }

    #[test]
    fn reference_query_uses_reference_flags() {
        let runner = FakeRunner::healthy()
            .answer("-a -r -x -- helper", "helper 3 /src/b.c helper();\nhelper 8 /src/c.c x = helper();\n");
        let e = engine(runner);
        let locs = e.find_reference("helper").unwrap().unwrap();
        assert_eq!(locs.len(), 2);
        assert_eq!(locs[1].file_path, "/src/c.c");
        assert_eq!(locs[1].line, 7);
    }

    #[test]
    fn definition_and_reference_flags_differ() {
        let flags = ToolFlags::default();
        assert_ne!(flags.definition, flags.reference);
    }

    #[test]
    fn empty_reference_output_is_none() {
        let e = engine(FakeRunner::healthy());
        assert_eq!(e.find_reference("nothing").unwrap(), None);
    }

    #[test]
    fn list_symbols_with_prefix() {
        let runner = FakeRunner::healthy().answer("-c -- ma", "main\nmalloc\nmain\n");
        let e = engine(runner);
        assert_eq!(
            e.list_symbols("ma").unwrap(),
            Some(vec!["main".to_string(), "malloc".to_string(), "main".to_string()])
        );
    }

    #[test]
    fn empty_prefix_omits_the_argument() {
        let runner = FakeRunner::healthy().answer("-c", "a\nb\n");
        let e = engine(runner);
        assert_eq!(
            e.list_symbols("").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        let calls = e.runner.calls.lock().unwrap();
        assert_eq!(calls.last().unwrap(), &vec!["-c".to_string()]);
    }

    #[test]
    fn list_files_with_keyword() {
        let runner = FakeRunner::healthy()
            .answer("-a -P", "/work/src/a.c\r\n/work/src/util.c\r\n/work/include/util.h\r\n")
            .answer("-a -P -- util", "/work/src/util.c\r\n/work/include/util.h\r\n");
        let e = engine(runner);

        let all = e.list_files("").unwrap().unwrap();
        assert_eq!(all.len(), 3);
        let some = e.list_files("util").unwrap().unwrap();
        assert!(some.iter().all(|p| p.contains("util")));
        assert!(some.iter().all(|p| all.contains(p)));
    }

    #[test]
    fn completion_uses_completion_flags() {
        let mut options = EngineOptions::default();
        options.flags.completion = vec!["-c".to_string(), "-i".to_string()];
        let runner = FakeRunner::healthy().answer("-c -i -- Ma", "MAX\nmain\n");
        let e = TagEngine::validate_with(runner, Path::new("/work"), options);
        assert_eq!(
            e.complete_symbol("Ma").unwrap(),
            Some(vec!["MAX".to_string(), "main".to_string()])
        );
    }

    #[test]
    fn term_is_a_single_argument() {
        let e = engine(FakeRunner::healthy());
        let _ = e.find_definition("a; rm -rf /").unwrap();
        let calls = e.runner.calls.lock().unwrap();
        assert_eq!(
            calls.last().unwrap(),
            &vec![
                "-a".to_string(),
                "-x".to_string(),
                "--".to_string(),
                "a; rm -rf /".to_string()
            ]
        );
    }

    #[test]
    fn dash_term_is_not_an_option() {
        let runner = FakeRunner::healthy().answer("-c --help", "usage: global [-adEFGilMnNqrstTvx]\n");
        let e = engine(runner);
        assert_eq!(e.list_symbols("--help").unwrap(), None);
        let _ = e.find_definition("-u").unwrap();
        let calls = e.runner.calls.lock().unwrap();
        let n = calls.len();
        assert_eq!(calls[n - 2], ["-c", "--", "--help"]);
        assert_eq!(calls[n - 1], ["-a", "-x", "--", "-u"]);
    }

    #[test]
    fn file_keyword_is_matched_literally() {
        let runner = FakeRunner::healthy()
            .answer(r"-a -P -- a\.c", "/work/src/a.c\n")
            .answer("-a -P -- a.c", "/work/src/abc\n/work/src/a.c\n");
        let e = engine(runner);
        assert_eq!(e.list_files("a.c").unwrap(), Some(vec!["/work/src/a.c".to_string()]));
        assert_eq!(
            e.list_files_matching("a.c").unwrap(),
            Some(vec!["/work/src/abc".to_string(), "/work/src/a.c".to_string()])
        );
        let calls = e.runner.calls.lock().unwrap();
        assert_eq!(calls[calls.len() - 2], ["-a", "-P", "--", r"a\.c"]);
    }

    #[test]
    fn tool_failure_is_query_failed_not_empty() {
        let runner = FakeRunner::healthy().fail("-a -x -- main", 1, "global: database corrupted");
        let e = engine(runner);
        match e.find_definition("main") {
            Err(QueryError::QueryFailed { kind, term, source }) => {
                assert_eq!(kind, QueryKind::Definition);
                assert_eq!(term, "main");
                assert!(matches!(source, InvocationError::Exit { status: Some(1), .. }));
            }
            other => panic!("expected QueryFailed, got {other:?}"),
        }
    }

    #[test]
    fn engine_survives_a_failed_query() {
        let runner = FakeRunner::healthy()
            .fail("-a -x -- broken", 1, "boom")
            .answer("-a -x -- main", "main 1 /a.c int main;\n");
        let e = engine(runner);
        assert!(e.find_definition("broken").is_err());
        assert!(e.find_definition("main").unwrap().is_some());
        assert!(e.is_ready());
    }

    #[test]
    fn relative_path_inside_tag_root() {
        let e = engine(FakeRunner::healthy());
        assert_eq!(e.relative_path("/work/src/a.c"), "src/a.c");
        assert_eq!(e.relative_path("/elsewhere/b.c"), "/elsewhere/b.c");
        assert_eq!(e.relative_path("/work"), "/work");
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TagEngine>();
        assert_send_sync::<TagEngine<FakeRunner>>();
    }
}
