//! Interactive symbol completion.
//!
//! Every request is bounded by the configured timeout, and a new request
//! cancels whichever request is still in flight, killing its subprocess.
//! Only the newest keystroke's answer is ever worth rendering.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use tracing::debug;

use crate::config::CompletionConfig;
use crate::engine::TagEngine;
use crate::errors::{InvocationError, QueryError};
use crate::runner::{CancelToken, ProcessRunner, Runner};
use crate::types::QueryKind;

type CompletionResult = Result<Option<Vec<String>>, QueryError>;

/// Token of the request currently in flight, if any.
#[derive(Debug, Default)]
struct InFlight {
    current: Mutex<Option<CancelToken>>,
}

impl InFlight {
    /// Register a new request, cancelling the previous one.
    fn supersede(&self) -> CancelToken {
        let token = CancelToken::new();
        let mut slot = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(token.clone()) {
            debug!("superseding in-flight completion");
            previous.cancel();
        }
        token
    }

    /// Forget `token` if it is still the current request.
    fn finish(&self, token: &CancelToken) {
        let mut slot = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|t| t.same_as(token)) {
            *slot = None;
        }
    }
}

/// Completion front end shared by every completion trigger of a workspace.
#[derive(Debug)]
pub struct Completer<R = ProcessRunner> {
    engine: Arc<TagEngine<R>>,
    enabled: bool,
    timeout: Duration,
    in_flight: Arc<InFlight>,
}

impl<R: Runner + 'static> Completer<R> {
    pub fn new(engine: Arc<TagEngine<R>>, config: &CompletionConfig) -> Self {
        Self {
            engine,
            enabled: config.enabled,
            timeout: config.timeout(),
            in_flight: Arc::default(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Complete `prefix`, blocking the caller for at most the timeout.
    ///
    /// Returns `Ok(None)` without running the tool when completion is
    /// disabled.  Fails with [`InvocationError::Cancelled`] if a newer
    /// request superseded this one, and [`InvocationError::TimedOut`] when
    /// the tool was too slow.
    pub fn complete(&self, prefix: &str) -> CompletionResult {
        if !self.enabled {
            debug!(prefix, "completion disabled");
            return Ok(None);
        }
        let token = self.in_flight.supersede();
        let result = self
            .engine
            .complete_symbol_bounded(prefix, Some(self.timeout), Some(&token));
        self.in_flight.finish(&token);
        result
    }

    /// Start completing `prefix` on a worker thread.
    pub fn submit(&self, prefix: &str) -> PendingCompletion {
        let (tx, rx) = crossbeam_channel::bounded(1);
        if !self.enabled {
            debug!(prefix, "completion disabled");
            let _ = tx.send(Ok(None));
            return PendingCompletion {
                prefix: prefix.to_string(),
                token: CancelToken::new(),
                rx,
            };
        }

        let token = self.in_flight.supersede();
        let engine = Arc::clone(&self.engine);
        let in_flight = Arc::clone(&self.in_flight);
        let worker_token = token.clone();
        let worker_prefix = prefix.to_string();
        let timeout = self.timeout;
        thread::spawn(move || {
            let result =
                engine.complete_symbol_bounded(&worker_prefix, Some(timeout), Some(&worker_token));
            in_flight.finish(&worker_token);
            // The caller may have dropped its handle; nobody to tell then.
            let _ = tx.send(result);
        });

        PendingCompletion {
            prefix: prefix.to_string(),
            token,
            rx,
        }
    }
}

/// Handle to a completion running on a worker thread.
#[derive(Debug)]
pub struct PendingCompletion {
    prefix: String,
    token: CancelToken,
    rx: Receiver<CompletionResult>,
}

impl PendingCompletion {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Abandon the request; its subprocess is killed.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Block until the worker reports.
    pub fn wait(self) -> CompletionResult {
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(self.lost()),
        }
    }

    /// The result if the worker has already reported.
    pub fn try_result(&self) -> Option<CompletionResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.lost())),
        }
    }

    /// The worker went away without answering.
    fn lost(&self) -> QueryError {
        QueryError::QueryFailed {
            kind: QueryKind::Completion,
            term: self.prefix.clone(),
            source: InvocationError::Cancelled {
                program: "completion worker".to_string(),
            },
        }
    }
}
