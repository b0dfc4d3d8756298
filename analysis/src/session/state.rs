use std::collections::BTreeMap;

use cozy_chess::{Board, Color};
use engine::{EngineCommand, EngineEvent, EngineIo};
use tokio::sync::{broadcast, oneshot};
use tokio::time::Instant;

use crate::events::AnalysisLine;
use crate::options::AnalysisOptions;
use crate::session::commands::AnalysisError;
use crate::session::handle::Launcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Idle,
    Evaluating,
    Streaming,
}

/// All mutable session state. Owned by the actor; mutated only on its
/// single event-processing path.
pub(crate) struct SessionState {
    pub(crate) launcher: Launcher,
    pub(crate) mode: Mode,
    pub(crate) engine: Option<EngineIo>,
    /// Handshake acknowledged; configuration and search may be sent.
    pub(crate) ready: bool,
    /// Position captured when the session started, for notation
    /// translation of reported lines.
    pub(crate) board: Board,
    pub(crate) side: Color,
    pub(crate) fen: String,
    pub(crate) options: AnalysisOptions,
    /// Accumulated lines keyed by rank. Sparse while lower ranks have not
    /// reported yet; gaps never reach callers.
    pub(crate) ranked: BTreeMap<u32, AnalysisLine>,
    /// Reply slot for an in-flight one-shot evaluation.
    pub(crate) pending: Option<oneshot::Sender<Result<Vec<AnalysisLine>, AnalysisError>>>,
    /// One-shot deadline; unset while Idle or Streaming.
    pub(crate) deadline: Option<Instant>,
    pub(crate) update_tx: broadcast::Sender<Vec<AnalysisLine>>,
}

impl SessionState {
    pub(crate) fn new(launcher: Launcher) -> Self {
        let (update_tx, _) = broadcast::channel(64);
        Self {
            launcher,
            mode: Mode::Idle,
            engine: None,
            ready: false,
            board: Board::default(),
            side: Color::White,
            fen: String::new(),
            options: AnalysisOptions::default(),
            ranked: BTreeMap::new(),
            pending: None,
            deadline: None,
            update_tx,
        }
    }

    /// Ordered, gap-free view of what has accumulated so far.
    pub(crate) fn snapshot(&self) -> Vec<AnalysisLine> {
        self.ranked.values().cloned().collect()
    }

    /// Next engine event, or pending forever when no engine is attached
    /// (the select arm is guarded on that).
    pub(crate) async fn recv_engine(&mut self) -> Option<EngineEvent> {
        match self.engine.as_mut() {
            Some(io) => io.events.recv().await,
            None => std::future::pending().await,
        }
    }

    pub(crate) async fn send_engine(&self, cmd: EngineCommand) -> Result<(), AnalysisError> {
        match self.engine.as_ref() {
            Some(io) => io
                .commands
                .send(cmd)
                .await
                .map_err(|_| AnalysisError::Engine("engine command channel closed".to_string())),
            None => Err(AnalysisError::Engine("no engine process".to_string())),
        }
    }

    /// Release the engine and reset to Idle. Idempotent: a second call
    /// observes the cleared handle and only re-resets the flags.
    pub(crate) fn teardown(&mut self) {
        if let Some(io) = self.engine.take() {
            // Best effort; dropping the handle releases the process anyway.
            let _ = io.commands.try_send(EngineCommand::Quit);
        }
        self.ready = false;
        self.mode = Mode::Idle;
        self.deadline = None;
        self.ranked.clear();
    }

    /// Resolve the pending one-shot request, if any.
    pub(crate) fn resolve_pending(&mut self, result: Result<Vec<AnalysisLine>, AnalysisError>) {
        if let Some(reply) = self.pending.take() {
            let _ = reply.send(result);
        }
    }
}
