use cozy_chess::Board;
use engine::uci::format_uci_move;
use engine::{EngineCommand, EngineEvent};
use tokio::sync::mpsc;
use tokio::time::{self, Duration, Instant};

use crate::events::{self, AnalysisLine};
use crate::notation;
use crate::options::AnalysisOptions;
use crate::session::commands::{AnalysisError, SessionCommand};
use crate::session::state::{Mode, SessionState};

/// The session actor loop. Owns all mutable state; commands and engine
/// events are processed strictly sequentially, commands first.
pub(crate) async fn run_session_actor(
    mut state: SessionState,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
) {
    tracing::debug!("Analysis session actor started");

    loop {
        let deadline = state
            .deadline
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(cmd) => handle_command(&mut state, cmd).await,
                    None => {
                        // Every handle dropped; release the engine and exit.
                        state.teardown();
                        break;
                    }
                }
            }

            event = state.recv_engine(), if state.engine.is_some() => {
                match event {
                    Some(event) => handle_engine_event(&mut state, event).await,
                    // Output stream closed without a completion: the
                    // process died or closed its pipes.
                    None => fail_session(&mut state, "engine terminated unexpectedly".to_string()),
                }
            }

            _ = time::sleep_until(deadline), if state.deadline.is_some() => {
                tracing::debug!("Evaluation deadline reached, resolving with partial results");
                finish_evaluation(&mut state);
            }
        }
    }

    tracing::debug!("Analysis session actor exited");
}

async fn handle_command(state: &mut SessionState, cmd: SessionCommand) {
    match cmd {
        SessionCommand::Evaluate {
            fen,
            options,
            reply,
        } => {
            if state.mode != Mode::Idle {
                let _ = reply.send(Err(AnalysisError::Busy));
                return;
            }
            match begin_session(state, fen, options, Mode::Evaluating).await {
                Ok(()) => state.pending = Some(reply),
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            }
        }
        SessionCommand::StartAnalysis {
            fen,
            options,
            reply,
        } => {
            if state.mode != Mode::Idle {
                tracing::warn!(mode = ?state.mode, "startAnalysis ignored: a session is already active");
                let _ = reply.send(());
                return;
            }
            if let Err(e) = begin_session(state, fen, options, Mode::Streaming).await {
                tracing::error!("Failed to start streaming analysis: {}", e);
            }
            let _ = reply.send(());
        }
        SessionCommand::StopAnalysis { reply } => {
            if state.mode == Mode::Streaming {
                // Cooperative stop: the engine answers with its final best
                // line, and that completion performs the teardown.
                if let Err(e) = state.send_engine(EngineCommand::Stop).await {
                    tracing::error!("Failed to send stop: {}", e);
                    state.teardown();
                }
            }
            let _ = reply.send(());
        }
        SessionCommand::Terminate { reply } => {
            let snapshot = state.snapshot();
            state.resolve_pending(Ok(snapshot));
            state.teardown();
            let _ = reply.send(());
        }
        SessionCommand::Subscribe { reply } => {
            let _ = reply.send(state.update_tx.subscribe());
        }
    }
}

/// Create the worker and send the handshake. Configuration and the search
/// directive wait for the ready acknowledgement.
async fn begin_session(
    state: &mut SessionState,
    fen: String,
    options: AnalysisOptions,
    mode: Mode,
) -> Result<(), AnalysisError> {
    let board: Board = fen
        .parse()
        .map_err(|e| AnalysisError::InvalidPosition(format!("{:?}", e)))?;

    let io = (state.launcher)()?;
    state.engine = Some(io);
    state.side = board.side_to_move();
    state.board = board;
    state.fen = fen;
    state.options = options;
    state.ready = false;
    state.ranked.clear();
    state.mode = mode;
    state.deadline = match mode {
        Mode::Evaluating => {
            Some(Instant::now() + Duration::from_millis(state.options.eval_timeout_ms()))
        }
        _ => None,
    };

    if let Err(e) = state.send_engine(EngineCommand::Uci).await {
        state.teardown();
        return Err(e);
    }
    Ok(())
}

async fn handle_engine_event(state: &mut SessionState, event: EngineEvent) {
    match event {
        EngineEvent::Ready => {
            if state.mode == Mode::Idle || state.ready {
                return;
            }
            state.ready = true;
            if let Err(e) = configure_and_search(state).await {
                fail_session(state, e.to_string());
            }
        }
        EngineEvent::Info(info) => {
            if state.mode == Mode::Idle {
                return;
            }
            let Some(update) = events::rank_update(&info, state.side) else {
                return;
            };
            let moves = notation::translate_line(&update.moves, &state.board);
            state.ranked.insert(
                update.rank,
                AnalysisLine {
                    rank: update.rank,
                    evaluation: update.evaluation,
                    moves,
                },
            );
            if state.mode == Mode::Streaming {
                let _ = state.update_tx.send(state.snapshot());
            }
        }
        EngineEvent::BestMove(mv) => {
            let best = mv
                .as_ref()
                .map(format_uci_move)
                .unwrap_or_else(|| "(none)".to_string());
            match state.mode {
                Mode::Evaluating => {
                    tracing::debug!(bestmove = %best, "Search complete");
                    finish_evaluation(state);
                }
                Mode::Streaming => {
                    // Arrives only after an explicit stop.
                    tracing::debug!(bestmove = %best, "Streaming analysis stopped");
                    let _ = state.update_tx.send(state.snapshot());
                    state.teardown();
                }
                Mode::Idle => {}
            }
        }
        EngineEvent::Error(message) => fail_session(state, message),
    }
}

/// Ready received: tuning options, position load, then exactly one search
/// directive.
async fn configure_and_search(state: &mut SessionState) -> Result<(), AnalysisError> {
    for cmd in state.options.setup_commands() {
        state.send_engine(cmd).await?;
    }
    state
        .send_engine(EngineCommand::SetPosition {
            fen: state.fen.clone(),
        })
        .await?;
    let infinite = state.mode == Mode::Streaming;
    state
        .send_engine(EngineCommand::Go(state.options.go_params(infinite)))
        .await?;
    Ok(())
}

/// Completion and timeout share this path; whichever runs second finds the
/// session already Idle and does nothing.
fn finish_evaluation(state: &mut SessionState) {
    let snapshot = state.snapshot();
    state.resolve_pending(Ok(snapshot));
    state.teardown();
}

fn fail_session(state: &mut SessionState, message: String) {
    if state.mode == Mode::Idle {
        return;
    }
    tracing::error!("Engine session failed: {}", message);
    state.resolve_pending(Err(AnalysisError::Engine(message)));
    state.teardown();
}
