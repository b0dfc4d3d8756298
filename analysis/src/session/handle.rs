use std::sync::Arc;

use engine::{launch, EngineConfig, EngineError, EngineIo};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::events::AnalysisLine;
use crate::options::AnalysisOptions;
use crate::session::actor::run_session_actor;
use crate::session::commands::{AnalysisError, SessionCommand};
use crate::session::state::SessionState;

/// How the actor obtains a fresh engine process for each session.
pub type Launcher = Arc<dyn Fn() -> Result<EngineIo, EngineError> + Send + Sync>;

/// Cheap, cloneable handle to the analysis session actor.
#[derive(Clone)]
pub struct Analyzer {
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl Analyzer {
    /// Controller backed by a real engine process.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_launcher(Arc::new(move || launch(&config)))
    }

    /// Controller with a custom engine launcher. Lets tests substitute a
    /// scripted engine speaking the same protocol over the same channels.
    pub fn with_launcher(launcher: Launcher) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let state = SessionState::new(launcher);
        tokio::spawn(run_session_actor(state, cmd_rx));
        Self { cmd_tx }
    }

    /// One-shot evaluation. Resolves with the ranked lines once the search
    /// completes, or with whatever accumulated when the deadline passes.
    /// Fails immediately with [`AnalysisError::Busy`] if a session is
    /// already active.
    pub async fn evaluate_position(
        &self,
        fen: &str,
        options: AnalysisOptions,
    ) -> Result<Vec<AnalysisLine>, AnalysisError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Evaluate {
            fen: fen.to_string(),
            options,
            reply,
        })
        .await?;
        rx.await.map_err(|_| AnalysisError::Closed)?
    }

    /// Begin continuous analysis; snapshots go to subscribers on every
    /// update. Ignored (with a warning) if a session is already active.
    pub async fn start_analysis(&self, fen: &str, options: AnalysisOptions) {
        let (reply, rx) = oneshot::channel();
        let sent = self
            .send(SessionCommand::StartAnalysis {
                fen: fen.to_string(),
                options,
                reply,
            })
            .await;
        if sent.is_ok() {
            let _ = rx.await;
        }
    }

    /// Ask the engine to wind down a continuous analysis; teardown happens
    /// when it acknowledges with its final best line. No-op unless
    /// streaming.
    pub async fn stop_analysis(&self) {
        let (reply, rx) = oneshot::channel();
        if self.send(SessionCommand::StopAnalysis { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// Unconditional teardown of whatever session is active. Idempotent.
    pub async fn terminate(&self) {
        let (reply, rx) = oneshot::channel();
        if self.send(SessionCommand::Terminate { reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// Subscribe to analysis updates (ordered, gap-free snapshots).
    /// Unsubscribe by dropping the receiver.
    pub async fn subscribe(
        &self,
    ) -> Result<broadcast::Receiver<Vec<AnalysisLine>>, AnalysisError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Subscribe { reply }).await?;
        rx.await.map_err(|_| AnalysisError::Closed)
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), AnalysisError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| AnalysisError::Closed)
    }
}
