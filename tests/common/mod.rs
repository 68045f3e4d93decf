//! Shared fixtures: a scripted stand-in for GNU Global's `global`.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tempfile::TempDir;

/// Writing an executable while another test thread forks can make the
/// later exec fail with ETXTBSY, so tests that run fake tools hold this.
static SERIAL: Mutex<()> = Mutex::new(());

pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Answers keyed on the whole argument vector; anything unknown prints
/// nothing and succeeds, like a lookup with no matches.  Terms that reach
/// the tool without `--` are read as options, as `global` itself would:
/// `-u` updates the database and `--help` prints usage.  File listing
/// filters with an extended regular expression, like `global -P`.
const HEALTHY: &str = r#"#!/bin/sh
FILES='@ROOT@/include/util.h
@ROOT@/src/main.c
@ROOT@/src/util.c
@ROOT@/src/abc
@ROOT@/src/a.c'
case "$*" in
  "--version") echo "global (GNU GLOBAL) 6.6.10" ;;
  "-p") echo "@ROOT@" ;;
  "-a -x -- main") printf 'main               10 @ROOT@/src/main.c int main(int argc, char **argv)\n' ;;
  "-a -r -x -- helper") printf 'helper              4 @ROOT@/src/main.c     helper();\nhelper             12 @ROOT@/src/util.c     return helper() + 1;\n' ;;
  "-a -x -- broken") echo "global: GTAGS is corrupted." >&2; exit 3 ;;
  "-c") printf 'helper\nmain\nmalloc\n' ;;
  "-c -- ma") printf 'main\nmalloc\n' ;;
  "-c -- slow") exec sleep 5 ;;
  "-a -P") printf '%s\n' "$FILES" ;;
  "-a -P -- "*) printf '%s\n' "$FILES" | grep -E -e "$4" || true ;;
  "-a -x -u") touch "@ROOT@/UPDATED"; echo "updated" ;;
  "-c --help") echo "usage: global [-adEFGilMnNqrstTvx] [-e] pattern" ;;
esac
"#;

const NO_DATABASE: &str = r#"#!/bin/sh
case "$1" in
  --version) echo "global (GNU GLOBAL) 6.6.10" ;;
  -p) echo "global: GTAGS not found." >&2; exit 3 ;;
esac
"#;

const NOT_GLOBAL: &str = r#"#!/bin/sh
echo "Exuberant Ctags 5.8"
"#;

/// A project directory with a `GTAGS` marker, a nested source directory,
/// a fake `global`, and an empty home directory for config isolation.
pub struct Fixture {
    _dir: TempDir,
    pub root: PathBuf,
    pub tool: PathBuf,
    pub home: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_script(HEALTHY, true)
    }

    /// `global -p` reports that no database exists.
    pub fn without_database() -> Self {
        Self::with_script(NO_DATABASE, false)
    }

    /// The executable answers `--version` like a different tool.
    pub fn with_wrong_tool() -> Self {
        Self::with_script(NOT_GLOBAL, true)
    }

    fn with_script(script: &str, marker: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let base = fs::canonicalize(dir.path()).unwrap();
        let root = base.join("project");
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("include")).unwrap();
        if marker {
            fs::write(root.join("GTAGS"), b"").unwrap();
        }
        let home = base.join("home");
        fs::create_dir_all(&home).unwrap();

        let tool = base.join("bin").join("global");
        fs::create_dir_all(tool.parent().unwrap()).unwrap();
        write_executable(&tool, &script.replace("@ROOT@", &root.display().to_string()));

        Self {
            _dir: dir,
            root,
            tool,
            home,
        }
    }

    pub fn root_str(&self) -> String {
        self.root.display().to_string()
    }
}

fn write_executable(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}
