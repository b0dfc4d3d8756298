use tokio::sync::{broadcast, oneshot};

use crate::events::AnalysisLine;
use crate::options::AnalysisOptions;

/// Requests accepted by the session actor.
pub(crate) enum SessionCommand {
    Evaluate {
        fen: String,
        options: AnalysisOptions,
        reply: oneshot::Sender<Result<Vec<AnalysisLine>, AnalysisError>>,
    },
    StartAnalysis {
        fen: String,
        options: AnalysisOptions,
        reply: oneshot::Sender<()>,
    },
    StopAnalysis {
        reply: oneshot::Sender<()>,
    },
    Terminate {
        reply: oneshot::Sender<()>,
    },
    Subscribe {
        reply: oneshot::Sender<broadcast::Receiver<Vec<AnalysisLine>>>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// A session is already active. The one-shot path rejects instead of
    /// queuing; the streaming path never raises this.
    #[error("analysis already in progress")]
    Busy,
    #[error("invalid position: {0}")]
    InvalidPosition(String),
    /// The engine process could not be started.
    #[error(transparent)]
    Launch(#[from] engine::EngineError),
    /// The engine process failed mid-session.
    #[error("engine fault: {0}")]
    Engine(String),
    /// The controller task is gone.
    #[error("analysis controller closed")]
    Closed,
}
