//! Subprocess invocation for the external tagging tool.
//!
//! Arguments are always passed as a discrete argument vector, never through
//! a shell, so a queried symbol is one opaque `argv` entry no matter what
//! characters it contains.
//!
//! A plain invocation blocks until the tool exits.  An invocation carrying a
//! timeout or a [`CancelToken`] is polled instead, and the child is killed as
//! soon as the deadline passes or the token is cancelled.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::errors::InvocationError;

/// How often a bounded invocation checks on its child.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Shared flag used to abandon an in-flight invocation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether both handles control the same request.
    pub fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// One run of the tool: program, argument vector, working directory and
/// optional bounds.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub program: &'a Path,
    pub args: &'a [String],
    pub cwd: &'a Path,
    pub timeout: Option<Duration>,
    pub cancel: Option<&'a CancelToken>,
}

impl<'a> Invocation<'a> {
    pub fn new(program: &'a Path, args: &'a [String], cwd: &'a Path) -> Self {
        Self {
            program,
            args,
            cwd,
            timeout: None,
            cancel: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_with(mut self, token: &'a CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

/// Runs the tagging tool and returns its standard output.
///
/// Implementations must be stateless with respect to individual calls so a
/// single runner can serve concurrent queries.
pub trait Runner: Send + Sync {
    fn run(&self, invocation: &Invocation<'_>) -> Result<String, InvocationError>;
}

/// [`Runner`] backed by real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    fn run(&self, invocation: &Invocation<'_>) -> Result<String, InvocationError> {
        debug!(
            program = %invocation.program.display(),
            args = ?invocation.args,
            cwd = %invocation.cwd.display(),
            "invoking tool"
        );

        let mut cmd = Command::new(invocation.program);
        cmd.args(invocation.args)
            .current_dir(invocation.cwd)
            .stdin(Stdio::null());

        if invocation.timeout.is_none() && invocation.cancel.is_none() {
            let output = cmd.output().map_err(|source| InvocationError::Spawn {
                program: invocation.program_name(),
                source,
            })?;
            return finish(
                invocation,
                output.status.success(),
                output.status.code(),
                &output.stdout,
                &output.stderr,
            );
        }

        let child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InvocationError::Spawn {
                program: invocation.program_name(),
                source,
            })?;
        run_bounded(invocation, child)
    }
}

/// Poll `child` until it exits, the deadline passes or the token is
/// cancelled.  Both pipes are drained on helper threads so a chatty tool
/// cannot block on a full pipe while we wait.
fn run_bounded(invocation: &Invocation<'_>, mut child: Child) -> Result<String, InvocationError> {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let deadline = invocation.timeout.map(|t| Instant::now() + t);

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(source) => {
                kill(&mut child);
                return Err(InvocationError::Spawn {
                    program: invocation.program_name(),
                    source,
                });
            }
        }

        if invocation.cancel.is_some_and(CancelToken::is_cancelled) {
            kill(&mut child);
            debug!(program = %invocation.program.display(), "invocation cancelled");
            return Err(InvocationError::Cancelled {
                program: invocation.program_name(),
            });
        }
        if let (Some(deadline), Some(timeout)) = (deadline, invocation.timeout)
            && Instant::now() >= deadline
        {
            kill(&mut child);
            debug!(program = %invocation.program.display(), ?timeout, "invocation timed out");
            return Err(InvocationError::TimedOut {
                program: invocation.program_name(),
                timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = collect(stdout);
    let stderr = collect(stderr);
    finish(invocation, status.success(), status.code(), &stdout, &stderr)
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        // A read error just truncates what we report.
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn finish(
    invocation: &Invocation<'_>,
    success: bool,
    code: Option<i32>,
    stdout: &[u8],
    stderr: &[u8],
) -> Result<String, InvocationError> {
    if !success {
        return Err(InvocationError::Exit {
            program: invocation.program_name(),
            status: code,
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        });
    }
    Ok(String::from_utf8_lossy(stdout).into_owned())
}
