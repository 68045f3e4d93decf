use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use codejumper::color;
use codejumper::completion::Completer;
use codejumper::config::Config;
use codejumper::engine::{EngineOptions, TagEngine};
use codejumper::errors::JumperError;
use codejumper::include;
use codejumper::locator::{self, DEFAULT_MARKER};
use codejumper::output::{FileEntry, Formatter, StatusOutput, SymbolEntry};
use codejumper::types::{QueryKind, TagLocation};

use crate::cli::{Cli, Command};

/// Where to run the tool from, and the settings that apply there.
struct Workspace {
    start: PathBuf,
    working_root: PathBuf,
    located_root: Option<PathBuf>,
    config: Config,
}

impl Workspace {
    /// Find the tag root from the start directory and load the layered
    /// config, then apply command-line overrides.
    fn discover(cli: &Cli) -> Result<Self, JumperError> {
        let start = match &cli.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        // The marker name itself is configurable, so locate once with the
        // default to find the project config, then again with the result.
        let project = locator::find_tag_root(&start, DEFAULT_MARKER);
        let mut config = Config::load(project.as_deref()).context("failed to load config")?;
        if let Some(path) = &cli.global_path {
            config.tool.path = Some(path.clone());
        }
        if let Some(mode) = &cli.color {
            mode.parse::<color::ColorMode>().map_err(JumperError::Usage)?;
            config.output.color = mode.clone();
        }
        if cli.no_completion {
            config.completion.enabled = false;
        }

        let located_root = if config.tool.marker_file == DEFAULT_MARKER {
            project
        } else {
            locator::find_tag_root(&start, &config.tool.marker_file)
        };
        let working_root = located_root.clone().unwrap_or_else(|| start.clone());
        debug!(
            start = %start.display(),
            working_root = %working_root.display(),
            "resolved workspace"
        );
        Ok(Self {
            start,
            working_root,
            located_root,
            config,
        })
    }

    fn engine_options(&self) -> EngineOptions {
        EngineOptions::from(&self.config.tool)
    }

    fn open_engine(&self) -> Result<TagEngine, JumperError> {
        Ok(TagEngine::open(&self.working_root, self.engine_options())?)
    }
}

pub fn dispatch(cli: Cli) -> Result<(), JumperError> {
    let workspace = Workspace::discover(&cli)?;
    let json = cli.json || workspace.config.output.default_format == "json";
    let use_color = !json && color::resolve_color(workspace.config.output.color_mode()?);
    let stdout = io::stdout();
    let mut fmt = Formatter::new(stdout.lock(), json, use_color);

    match cli.command {
        Command::Def(args) => {
            let engine = workspace.open_engine()?;
            let found = engine.find_definition(&args.symbol)?;
            print_locations(&mut fmt, &engine, QueryKind::Definition, &args.symbol, found, args.relative)?;
        }
        Command::Ref(args) => {
            let engine = workspace.open_engine()?;
            let found = engine.find_reference(&args.symbol)?;
            print_locations(&mut fmt, &engine, QueryKind::Reference, &args.symbol, found, args.relative)?;
        }
        Command::Symbols(args) => {
            let engine = workspace.open_engine()?;
            let found = engine.list_symbols(&args.prefix)?;
            print_symbols(&mut fmt, QueryKind::Symbols, &args.prefix, found)?;
        }
        Command::Files(args) => {
            let engine = workspace.open_engine()?;
            let found = engine.list_files(&args.keyword)?;
            print_files(&mut fmt, &engine, &args.keyword, found, args.relative)?;
        }
        Command::Complete(args) => {
            let engine = workspace.open_engine()?;
            let mut settings = workspace.config.completion.clone();
            if let Some(ms) = args.timeout_ms {
                settings.timeout_ms = ms;
            }
            let completer = Completer::new(Arc::new(engine), &settings);
            let found = completer.complete(&args.prefix)?;
            if completer.enabled() {
                print_symbols(&mut fmt, QueryKind::Completion, &args.prefix, found)?;
            }
        }
        Command::Include(args) => {
            let target = include::include_target(&args.line).ok_or_else(|| {
                JumperError::Usage(format!(
                    "no #include directive in `{}`; point at an #include line",
                    args.line.trim()
                ))
            })?;
            let engine = workspace.open_engine()?;
            let found = engine.list_files_matching(&include::header_pattern(target))?;
            print_files(&mut fmt, &engine, target, found, args.relative)?;
        }
        Command::Status => {
            let engine = TagEngine::validate(&workspace.working_root, workspace.engine_options());
            let located = workspace.located_root.as_deref().map(display);
            debug!(start = %workspace.start.display(), "status requested");
            fmt.format_status(&StatusOutput::from_state(engine.state(), located))?;
            if let Some(err) = &engine.state().init_error {
                return Err(err.clone().into());
            }
        }
    }
    Ok(())
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn print_locations<W: Write>(
    fmt: &mut Formatter<W>,
    engine: &TagEngine,
    kind: QueryKind,
    term: &str,
    found: Option<Vec<TagLocation>>,
    relative: bool,
) -> Result<(), JumperError> {
    let locations = found.ok_or_else(|| no_results(kind, term))?;
    for loc in &locations {
        let shown = if relative {
            engine.relative_path(&loc.file_path)
        } else {
            &loc.file_path
        };
        fmt.format_location(loc, shown)?;
    }
    Ok(())
}

fn print_symbols<W: Write>(
    fmt: &mut Formatter<W>,
    kind: QueryKind,
    term: &str,
    found: Option<Vec<String>>,
) -> Result<(), JumperError> {
    let names = found.ok_or_else(|| no_results(kind, term))?;
    for name in names {
        fmt.format_symbol(&SymbolEntry { name })?;
    }
    Ok(())
}

fn print_files<W: Write>(
    fmt: &mut Formatter<W>,
    engine: &TagEngine,
    term: &str,
    found: Option<Vec<String>>,
    relative: bool,
) -> Result<(), JumperError> {
    let paths = found.ok_or_else(|| no_results(QueryKind::Files, term))?;
    for path in &paths {
        let shown = if relative {
            engine.relative_path(path)
        } else {
            path.as_str()
        };
        fmt.format_file(&FileEntry {
            path: shown.to_string(),
        })?;
    }
    Ok(())
}

fn no_results(kind: QueryKind, term: &str) -> JumperError {
    JumperError::NoResults {
        kind,
        term: term.to_string(),
    }
}
