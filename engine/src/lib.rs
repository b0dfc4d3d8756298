pub mod process;
pub mod uci;

pub use process::{launch, EngineConfig, EngineError, EngineIo};
pub use uci::{parse_uci_message, UciError, UciMessage};

use cozy_chess::Move;

/// Search depth used when the caller requests no explicit limiter.
pub const DEFAULT_DEPTH: u32 = 15;

/// Commands sent to the engine. Each encodes to exactly one protocol line.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Handshake, sent once immediately after the process starts.
    Uci,
    SetOption { name: String, value: String },
    SetPosition { fen: String },
    Go(GoParams),
    Stop,
    Quit,
}

impl EngineCommand {
    pub fn encode(&self) -> String {
        match self {
            EngineCommand::Uci => "uci".to_string(),
            EngineCommand::SetOption { name, value } => {
                format!("setoption name {} value {}", name, value)
            }
            EngineCommand::SetPosition { fen } => format!("position fen {}", fen),
            EngineCommand::Go(params) => params.encode(),
            EngineCommand::Stop => "stop".to_string(),
            EngineCommand::Quit => "quit".to_string(),
        }
    }
}

/// Parameters for the "go" command.
///
/// Several limiters may be populated; exactly one is emitted, picked in
/// priority order: infinite, depth, clock, movetime, nodes. With nothing
/// set the search runs to [`DEFAULT_DEPTH`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<u32>,
    pub clock: Option<ClockParams>,
    pub movetime: Option<u64>,
    pub nodes: Option<u64>,
    /// Search until "stop".
    pub infinite: bool,
}

/// Remaining clock time per side, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockParams {
    pub wtime_ms: u64,
    pub btime_ms: u64,
}

impl GoParams {
    fn encode(&self) -> String {
        if self.infinite {
            "go infinite".to_string()
        } else if let Some(depth) = self.depth {
            format!("go depth {}", depth)
        } else if let Some(clock) = self.clock {
            format!("go wtime {} btime {}", clock.wtime_ms, clock.btime_ms)
        } else if let Some(movetime) = self.movetime {
            format!("go movetime {}", movetime)
        } else if let Some(nodes) = self.nodes {
            format!("go nodes {}", nodes)
        } else {
            format!("go depth {}", DEFAULT_DEPTH)
        }
    }
}

/// Events received from the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Handshake acknowledged; the engine accepts configuration and search
    /// commands from here on.
    Ready,
    Info(EngineInfo),
    /// Search completion. The move is `None` for `bestmove (none)`.
    BestMove(Option<Move>),
    Error(String),
}

impl EngineEvent {
    /// Map a parsed protocol message to an event, or `None` for messages
    /// the session layer has no use for.
    pub fn from_message(msg: UciMessage) -> Option<Self> {
        match msg {
            UciMessage::UciOk | UciMessage::ReadyOk => Some(EngineEvent::Ready),
            UciMessage::BestMove { mv, .. } => Some(EngineEvent::BestMove(mv)),
            UciMessage::Info(info) => Some(EngineEvent::Info(info)),
            UciMessage::Id { .. } => None,
        }
    }
}

/// Search progress reported by an "info" line.
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub score: Option<Score>,
    /// 1-based rank of this line in a ranked (MultiPV) search.
    pub multipv: Option<u32>,
    /// Principal variation in engine-native moves.
    pub pv: Vec<Move>,
}

/// Engine score, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Moves to mate; negative when the side to move is getting mated.
    Mate(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_handshake_and_teardown() {
        assert_eq!(EngineCommand::Uci.encode(), "uci");
        assert_eq!(EngineCommand::Stop.encode(), "stop");
        assert_eq!(EngineCommand::Quit.encode(), "quit");
    }

    #[test]
    fn encode_setoption() {
        let cmd = EngineCommand::SetOption {
            name: "MultiPV".to_string(),
            value: "3".to_string(),
        };
        assert_eq!(cmd.encode(), "setoption name MultiPV value 3");
    }

    #[test]
    fn encode_position() {
        let cmd = EngineCommand::SetPosition {
            fen: "8/8/8/8/8/8/8/4K2k w - - 0 1".to_string(),
        };
        assert_eq!(cmd.encode(), "position fen 8/8/8/8/8/8/8/4K2k w - - 0 1");
    }

    #[test]
    fn go_defaults_to_fixed_depth() {
        assert_eq!(GoParams::default().encode(), "go depth 15");
    }

    #[test]
    fn go_depth_beats_every_other_limiter() {
        let params = GoParams {
            depth: Some(22),
            clock: Some(ClockParams {
                wtime_ms: 60_000,
                btime_ms: 60_000,
            }),
            movetime: Some(500),
            nodes: Some(1_000_000),
            infinite: false,
        };
        assert_eq!(params.encode(), "go depth 22");
    }

    #[test]
    fn go_clock_beats_movetime_and_nodes() {
        let params = GoParams {
            depth: None,
            clock: Some(ClockParams {
                wtime_ms: 30_000,
                btime_ms: 45_000,
            }),
            movetime: Some(500),
            nodes: Some(1_000_000),
            infinite: false,
        };
        assert_eq!(params.encode(), "go wtime 30000 btime 45000");
    }

    #[test]
    fn go_movetime_beats_nodes() {
        let params = GoParams {
            movetime: Some(2500),
            nodes: Some(1_000_000),
            ..Default::default()
        };
        assert_eq!(params.encode(), "go movetime 2500");
    }

    #[test]
    fn go_nodes_alone() {
        let params = GoParams {
            nodes: Some(400_000),
            ..Default::default()
        };
        assert_eq!(params.encode(), "go nodes 400000");
    }

    #[test]
    fn go_infinite_overrides_limiters() {
        let params = GoParams {
            depth: Some(10),
            movetime: Some(100),
            infinite: true,
            ..Default::default()
        };
        assert_eq!(params.encode(), "go infinite");
    }
}
