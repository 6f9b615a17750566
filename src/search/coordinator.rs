//! Background scan coordination.
//!
//! A [`ScanCoordinator`] runs one [`MatchEngine`] scan at a time on the tokio blocking
//! pool and reports its outcome through exactly one callback:
//!
//! ```text
//! Idle -> Running -> { Completed | Cancelled | Failed } -> Idle
//! ```
//!
//! A scan counts as back to `Idle` once its task has finished; the terminal state it
//! reached stays available from [`ScanCoordinator::last_outcome`].
//!
//! Starting a new scan first cancels the one in flight and waits (bounded by
//! [`ViewerConfig::cancel_wait`]) for it to stop, so results arrive in the order scans
//! were started. Cancellation is cooperative and polled after every scanned line; a
//! cancelled scan delivers nothing.

use crate::config::ViewerConfig;
use crate::error::{LogsiftError, Result};
use crate::filter::{FilterOptions, FilterSpec, MatchMode};
use crate::search::engine::{MatchEngine, MatchRecord};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Identifier attached to each scan so callers can correlate deliveries.
pub type ScanId = u64;

/// Shared cancellation flag polled by a running scan.
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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl ScanState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Everything a completed scan hands back to the caller.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub scan_id: ScanId,
    pub text: Arc<str>,
    pub filtered_lines: Vec<String>,
    pub line_mapping: Vec<usize>,
    pub matches: Vec<MatchRecord>,
    pub total_count: usize,
    pub keywords: BTreeSet<String>,
    pub options: FilterOptions,
}

/// Book-keeping for the scan in flight (or the last one to finish).
struct ActiveScan {
    id: ScanId,
    cancel: CancelToken,
    state: Arc<Mutex<ScanState>>,
    task: Option<JoinHandle<()>>,
}

impl ActiveScan {
    /// Flag the scan and, unless it already reached a terminal state, mark it
    /// cancelled so that nothing is delivered.
    fn cancel(&self) {
        self.cancel.cancel();
        let mut state = self.state.lock();
        if *state == ScanState::Running {
            *state = ScanState::Cancelled;
        }
    }

    fn state(&self) -> ScanState {
        *self.state.lock()
    }

    /// Whether the scan task has finished running, callbacks included.
    fn settled(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

pub struct ScanCoordinator {
    runtime: Handle,
    engine: Arc<Mutex<MatchEngine>>,
    config: ViewerConfig,
    current: Option<ActiveScan>,
    next_scan_id: ScanId,
}

impl ScanCoordinator {
    pub fn new(runtime: Handle) -> Self {
        Self::with_config(runtime, ViewerConfig::default())
    }

    pub fn with_config(runtime: Handle, config: ViewerConfig) -> Self {
        Self {
            runtime,
            engine: Arc::new(Mutex::new(MatchEngine::new())),
            config,
            current: None,
            next_scan_id: 1,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// `Running` while a scan is in flight. A terminal state is reported until the
    /// scan's task has finished, after which the coordinator is `Idle` again.
    pub fn state(&self) -> ScanState {
        match &self.current {
            None => ScanState::Idle,
            Some(scan) => {
                let state = scan.state();
                if state.is_terminal() && scan.settled() {
                    ScanState::Idle
                } else {
                    state
                }
            }
        }
    }

    /// Terminal state of the most recent scan, if it has reached one. Cleared by
    /// [`shutdown`](Self::shutdown).
    pub fn last_outcome(&self) -> Option<ScanState> {
        self.current
            .as_ref()
            .map(ActiveScan::state)
            .filter(|state| state.is_terminal())
    }

    pub fn is_running(&self) -> bool {
        self.state() == ScanState::Running
    }

    /// Run `f` against the engine, e.g. to read keywords or counts between scans.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut MatchEngine) -> R) -> R {
        f(&mut self.engine.lock())
    }

    /// Start scanning `text` for `spec`, superseding any scan in flight.
    ///
    /// Exactly one of `on_done` / `on_error` is called for this scan unless it is
    /// cancelled first, in which case neither is.
    pub async fn start_scan<D, E>(
        &mut self,
        text: Arc<str>,
        spec: FilterSpec,
        on_done: D,
        on_error: E,
    ) -> ScanId
    where
        D: FnOnce(ScanReport) + Send + 'static,
        E: FnOnce(LogsiftError) + Send + 'static,
    {
        if let Some(previous) = self.current.take() {
            self.supersede(previous).await;
        }

        let scan_id = self.next_scan_id;
        self.next_scan_id += 1;

        let cancel = CancelToken::new();
        let state = Arc::new(Mutex::new(ScanState::Running));
        let engine = Arc::clone(&self.engine);
        let scan_cancel = cancel.clone();
        let scan_state = Arc::clone(&state);

        log::debug!(
            "scan {} started ({} bytes, {:?} mode)",
            scan_id,
            text.len(),
            spec.mode
        );

        let task = self.runtime.spawn(async move {
            let result = tokio::task::spawn_blocking(move || {
                run_scan(scan_id, &engine, text, &spec, &scan_cancel)
            })
            .await;

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(join_err) => Err(LogsiftError::scan(format!(
                    "scan task terminated abnormally: {}",
                    join_err
                ))),
            };
            deliver(scan_id, &scan_state, outcome, on_done, on_error);
        });

        self.current = Some(ActiveScan {
            id: scan_id,
            cancel,
            state,
            task: Some(task),
        });
        scan_id
    }

    /// Request cancellation of the scan in flight. Does not wait.
    pub fn cancel_scan(&mut self) {
        if let Some(scan) = &self.current {
            log::debug!("scan {} cancellation requested", scan.id);
            scan.cancel();
        }
    }

    /// Cancel any scan in flight, wait for it within the configured bound and release
    /// it. Safe to call repeatedly.
    pub async fn shutdown(&mut self) {
        if let Some(scan) = self.current.take() {
            self.supersede(scan).await;
        }
    }

    async fn supersede(&self, mut scan: ActiveScan) {
        scan.cancel();
        if let Some(mut task) = scan.task.take() {
            match tokio::time::timeout(self.config.cancel_wait, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => log::debug!("scan {} task ended with {}", scan.id, err),
                Err(_) => log::warn!(
                    "scan {} did not stop within {:?}; continuing without it",
                    scan.id,
                    self.config.cancel_wait
                ),
            }
        }
    }

    /// Drop the scan handle without waiting. Idempotent.
    fn release(&mut self) {
        if let Some(scan) = self.current.take() {
            scan.cancel();
        }
    }
}

impl Drop for ScanCoordinator {
    fn drop(&mut self) {
        self.release();
    }
}

fn run_scan(
    scan_id: ScanId,
    engine: &Mutex<MatchEngine>,
    text: Arc<str>,
    spec: &FilterSpec,
    cancel: &CancelToken,
) -> Result<Option<ScanReport>> {
    if cancel.is_cancelled() {
        return Ok(None);
    }

    if spec.mode == MatchMode::Boolean {
        // Surface the typed parse error rather than the validation message.
        crate::expression::parse(&spec.expression)?;
    }

    let mut engine = engine.lock();
    let validation = engine.apply_spec(spec);
    if !validation.valid {
        return Err(LogsiftError::scan(validation.message));
    }

    let Some(view) = engine.filter_text_cancellable(&text, cancel) else {
        return Ok(None);
    };

    Ok(Some(ScanReport {
        scan_id,
        filtered_lines: view.lines,
        line_mapping: view.line_mapping,
        matches: engine.cached_matches().to_vec(),
        total_count: engine.get_keyword_total_count(),
        keywords: engine.get_keywords().clone(),
        options: engine.options(),
        text,
    }))
}

/// Move the scan to its terminal state and fire the matching callback, unless
/// cancellation got there first.
fn deliver<D, E>(
    scan_id: ScanId,
    state: &Mutex<ScanState>,
    outcome: Result<Option<ScanReport>>,
    on_done: D,
    on_error: E,
) where
    D: FnOnce(ScanReport),
    E: FnOnce(LogsiftError),
{
    let next = match &outcome {
        Ok(Some(_)) => ScanState::Completed,
        Ok(None) => ScanState::Cancelled,
        Err(_) => ScanState::Failed,
    };

    {
        let mut current = state.lock();
        if *current != ScanState::Running {
            log::debug!("scan {} finished after cancellation; result dropped", scan_id);
            return;
        }
        *current = next;
    }

    match outcome {
        Ok(Some(report)) => {
            log::debug!(
                "scan {} completed: {} matches on {} lines",
                scan_id,
                report.total_count,
                report.line_mapping.len()
            );
            on_done(report);
        }
        Ok(None) => log::debug!("scan {} cancelled", scan_id),
        Err(err) => {
            log::debug!("scan {} failed: {}", scan_id, err);
            on_error(err);
        }
    }
}
