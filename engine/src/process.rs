//! Engine process lifecycle.
//!
//! [`launch`] resolves the engine binary, spawns it with piped stdio and
//! bridges it onto channels: a reader task parses stdout lines into
//! [`EngineEvent`]s, a writer task owns the child and encodes
//! [`EngineCommand`]s onto stdin. Dropping the returned [`EngineIo`] (or
//! sending [`EngineCommand::Quit`]) releases the process: the writer asks
//! for a graceful exit, waits briefly, then kills.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::mpsc;

use crate::uci::parse_uci_message;
use crate::{EngineCommand, EngineEvent};

/// Environment variable naming the engine binary, checked first.
pub const ENGINE_PATH_ENV: &str = "KIBITZ_ENGINE";

/// Well-known install locations, probed after the env var and any
/// configured path.
const KNOWN_LOCATIONS: &[&str] = &[
    "/usr/local/bin/stockfish",
    "/usr/bin/stockfish",
    "/opt/homebrew/bin/stockfish",
    "/usr/games/stockfish",
];

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Explicit engine binary path. `KIBITZ_ENGINE` takes precedence.
    pub path: Option<PathBuf>,
    /// Label attached to this process's log lines.
    pub label: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine binary not found (set KIBITZ_ENGINE or install stockfish)")]
    NotFound,
    #[error("failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("engine stdio unavailable")]
    Stdio,
}

/// Channel pair connecting a session to one engine process.
pub struct EngineIo {
    pub commands: mpsc::Sender<EngineCommand>,
    pub events: mpsc::Receiver<EngineEvent>,
}

/// Start an engine process and return its channel pair.
///
/// Binary resolution failure is reported synchronously, before any engine
/// interaction. The handshake is not sent here; the session layer issues it
/// as its first command.
pub fn launch(config: &EngineConfig) -> Result<EngineIo, EngineError> {
    let path = resolve_engine_path(config).ok_or(EngineError::NotFound)?;
    let label = config.label.clone().unwrap_or_else(|| "engine".to_string());
    tracing::info!(engine = %path.display(), label = %label, "Launching engine process");

    let mut process = tokio::process::Command::new(&path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(EngineError::Spawn)?;

    let stdin = process.stdin.take().ok_or(EngineError::Stdio)?;
    let stdout = process.stdout.take().ok_or(EngineError::Stdio)?;

    let (command_tx, command_rx) = mpsc::channel::<EngineCommand>(32);
    let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(32);

    tokio::spawn(read_engine_output(stdout, event_tx, label.clone()));
    tokio::spawn(write_engine_input(process, stdin, command_rx, label));

    Ok(EngineIo {
        commands: command_tx,
        events: event_rx,
    })
}

/// Forward parsed stdout lines as events. Owns the sole event sender, so
/// EOF or a read error closes the event stream, which the session layer
/// observes as a worker fault.
async fn read_engine_output(
    stdout: ChildStdout,
    event_tx: mpsc::Sender<EngineEvent>,
    label: String,
) {
    let mut reader = BufReader::new(stdout);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                tracing::debug!(label = %label, "Engine stdout EOF");
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                tracing::trace!(label = %label, "UCI << {}", trimmed);

                // Lines the parser does not recognize are dropped.
                let Ok(msg) = parse_uci_message(trimmed) else {
                    continue;
                };
                let Some(event) = EngineEvent::from_message(msg) else {
                    continue;
                };
                if event_tx.send(event).await.is_err() {
                    // Session is gone; nobody left to deliver to.
                    break;
                }
            }
            Err(e) => {
                tracing::error!(label = %label, "Error reading engine stdout: {}", e);
                let _ = event_tx.send(EngineEvent::Error(e.to_string())).await;
                break;
            }
        }
    }
    tracing::debug!(label = %label, "Engine reader exiting");
}

/// Encode commands onto stdin. Owns the child handle: when a quit is sent
/// or the command channel closes, waits briefly for a clean exit and then
/// kills the process.
async fn write_engine_input(
    mut process: Child,
    mut stdin: ChildStdin,
    mut command_rx: mpsc::Receiver<EngineCommand>,
    label: String,
) {
    let mut quit_sent = false;

    while let Some(cmd) = command_rx.recv().await {
        let line = cmd.encode();
        tracing::trace!(label = %label, "UCI >> {}", line);

        if stdin
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .is_err()
            || stdin.flush().await.is_err()
        {
            tracing::error!(label = %label, "Failed to write to engine stdin");
            break;
        }

        if matches!(cmd, EngineCommand::Quit) {
            quit_sent = true;
            break;
        }
    }

    if !quit_sent {
        let _ = stdin.write_all(b"quit\n").await;
        let _ = stdin.flush().await;
    }
    let _ = tokio::time::timeout(Duration::from_secs(1), process.wait()).await;
    let _ = process.kill().await;
    tracing::debug!(label = %label, "Engine process released");
}

/// Resolve the engine binary: env var, then configured path, then
/// well-known locations, then a PATH lookup.
fn resolve_engine_path(config: &EngineConfig) -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENGINE_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    if let Some(ref path) = config.path {
        return Some(path.clone());
    }

    for candidate in KNOWN_LOCATIONS {
        if Path::new(candidate).exists() {
            return Some(PathBuf::from(candidate));
        }
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join("stockfish"))
        .find(|candidate| candidate.is_file())
}
