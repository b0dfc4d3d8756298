//! Structured events extracted from engine output.
//!
//! The engine reports scores relative to the side to move; everything here
//! is normalized so that positive always favors White.

use cozy_chess::{Color, Move};
use engine::uci::parse_uci_message;
use engine::{EngineInfo, Score, UciMessage};
use serde::{Deserialize, Serialize};

/// Normalized evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evaluation {
    /// Pawn-unit advantage (centipawns / 100); positive favors White.
    Pawns(f64),
    /// Forced mate in N moves: +N mate for White, -N mate for Black.
    /// Kept as a tag, never merged into the numeric scale.
    Mate(i32),
}

impl Evaluation {
    pub fn display(&self) -> String {
        match self {
            Self::Pawns(pawns) => format!("{:+.2}", pawns),
            Self::Mate(m) if *m >= 0 => format!("+M{}", m),
            Self::Mate(m) => format!("-M{}", m.abs()),
        }
    }
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// One ranked candidate line, as exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisLine {
    /// 1-based rank within the current batch.
    pub rank: u32,
    pub evaluation: Evaluation,
    /// The line in display notation: the longest prefix of the engine's
    /// report that is legal from the analyzed position.
    pub moves: Vec<String>,
}

/// Outcome of parsing one line of engine output.
#[derive(Debug, Clone)]
pub enum ParsedEvent {
    /// Handshake acknowledged.
    Ready,
    /// A ranked search update.
    Line(RankUpdate),
    /// Search completion (best-move line).
    Done,
    /// Anything else; callers drop these.
    Ignored,
}

/// A ranked update, score-normalized but not yet translated to display
/// notation.
#[derive(Debug, Clone)]
pub struct RankUpdate {
    pub rank: u32,
    pub evaluation: Evaluation,
    /// Principal variation in engine-native moves.
    pub moves: Vec<Move>,
}

/// Parse one engine output line against the side to move of the analyzed
/// position. Malformed or irrelevant lines come back as [`ParsedEvent::Ignored`].
pub fn parse_line(line: &str, side_to_move: Color) -> ParsedEvent {
    match parse_uci_message(line) {
        Ok(UciMessage::UciOk) | Ok(UciMessage::ReadyOk) => ParsedEvent::Ready,
        Ok(UciMessage::BestMove { .. }) => ParsedEvent::Done,
        Ok(UciMessage::Info(info)) => match rank_update(&info, side_to_move) {
            Some(update) => ParsedEvent::Line(update),
            None => ParsedEvent::Ignored,
        },
        _ => ParsedEvent::Ignored,
    }
}

/// Extract a ranked update from an info payload. Transient info lines
/// (no score, or an empty move sequence) yield nothing. A missing rank
/// means a single-line search and defaults to 1.
pub fn rank_update(info: &EngineInfo, side_to_move: Color) -> Option<RankUpdate> {
    if info.pv.is_empty() {
        return None;
    }
    let score = info.score?;
    Some(RankUpdate {
        rank: info.multipv.unwrap_or(1).max(1),
        evaluation: normalize_score(score, side_to_move),
        moves: info.pv.clone(),
    })
}

/// Normalize an engine-relative score to the White-positive convention.
pub fn normalize_score(score: Score, side_to_move: Color) -> Evaluation {
    match score {
        Score::Centipawns(cp) => {
            let pawns = f64::from(cp) / 100.0;
            match side_to_move {
                Color::White => Evaluation::Pawns(pawns),
                Color::Black => Evaluation::Pawns(-pawns),
            }
        }
        Score::Mate(m) => {
            // Positive with White to move and negative with Black to move
            // both mean White delivers the mate.
            let white_mates = (m > 0) == (side_to_move == Color::White);
            let distance = m.abs();
            if white_mates {
                Evaluation::Mate(distance)
            } else {
                Evaluation::Mate(-distance)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line_update(line: &str, side: Color) -> RankUpdate {
        match parse_line(line, side) {
            ParsedEvent::Line(update) => update,
            other => panic!("expected a rank update, got {:?}", other),
        }
    }

    #[test]
    fn centipawns_normalize_to_white_perspective() {
        let update = line_update("info depth 10 multipv 1 score cp 13 pv e2e4", Color::White);
        assert_eq!(update.evaluation, Evaluation::Pawns(0.13));

        let update = line_update("info depth 10 multipv 1 score cp 13 pv e7e5", Color::Black);
        assert_eq!(update.evaluation, Evaluation::Pawns(-0.13));
    }

    #[test]
    fn mate_scores_resolve_the_mating_side() {
        let update = line_update("info multipv 1 score mate 3 pv e2e4", Color::White);
        assert_eq!(update.evaluation, Evaluation::Mate(3));

        let update = line_update("info multipv 1 score mate -1 pv e7e5", Color::Black);
        assert_eq!(update.evaluation, Evaluation::Mate(1));

        let update = line_update("info multipv 1 score mate 2 pv e7e5", Color::Black);
        assert_eq!(update.evaluation, Evaluation::Mate(-2));

        let update = line_update("info multipv 1 score mate -4 pv e2e4", Color::White);
        assert_eq!(update.evaluation, Evaluation::Mate(-4));
    }

    #[test]
    fn ready_and_done_lines() {
        assert!(matches!(parse_line("uciok", Color::White), ParsedEvent::Ready));
        assert!(matches!(
            parse_line("readyok", Color::White),
            ParsedEvent::Ready
        ));
        assert!(matches!(
            parse_line("bestmove e2e4 ponder e7e5", Color::White),
            ParsedEvent::Done
        ));
        assert!(matches!(
            parse_line("bestmove (none)", Color::White),
            ParsedEvent::Done
        ));
    }

    #[test]
    fn unrecognized_lines_are_ignored() {
        assert!(matches!(
            parse_line("Stockfish 16 by the Stockfish developers", Color::White),
            ParsedEvent::Ignored
        ));
        assert!(matches!(parse_line("", Color::White), ParsedEvent::Ignored));
    }

    #[test]
    fn info_without_moves_is_ignored() {
        assert!(matches!(
            parse_line("info depth 5 multipv 1 score cp 10", Color::White),
            ParsedEvent::Ignored
        ));
        assert!(matches!(
            parse_line("info depth 5 multipv 1 score cp 10 pv", Color::White),
            ParsedEvent::Ignored
        ));
    }

    #[test]
    fn info_without_score_is_ignored() {
        assert!(matches!(
            parse_line("info depth 5 currmove e2e4 currmovenumber 1", Color::White),
            ParsedEvent::Ignored
        ));
    }

    #[test]
    fn rank_defaults_to_one() {
        let update = line_update("info depth 8 score cp 7 pv e2e4", Color::White);
        assert_eq!(update.rank, 1);
    }

    #[test]
    fn evaluation_rendering() {
        assert_eq!(Evaluation::Pawns(0.35).display(), "+0.35");
        assert_eq!(Evaluation::Pawns(-1.5).display(), "-1.50");
        assert_eq!(Evaluation::Mate(3).display(), "+M3");
        assert_eq!(Evaluation::Mate(-2).display(), "-M2");
    }

    proptest! {
        #[test]
        fn centipawn_sign_flips_between_sides(cp in -10_000i32..10_000) {
            let white = normalize_score(Score::Centipawns(cp), Color::White);
            let black = normalize_score(Score::Centipawns(cp), Color::Black);
            match (white, black) {
                (Evaluation::Pawns(w), Evaluation::Pawns(b)) => {
                    prop_assert!((w + b).abs() < 1e-9);
                    prop_assert!((w - f64::from(cp) / 100.0).abs() < 1e-9);
                }
                _ => prop_assert!(false, "centipawns must stay numeric"),
            }
        }

        #[test]
        fn mate_magnitude_survives_normalization(m in -200i32..=200) {
            let white = normalize_score(Score::Mate(m), Color::White);
            let black = normalize_score(Score::Mate(m), Color::Black);
            match (white, black) {
                (Evaluation::Mate(w), Evaluation::Mate(b)) => {
                    prop_assert_eq!(w.abs(), m.abs());
                    prop_assert_eq!(b.abs(), m.abs());
                    prop_assert_eq!(w, -b);
                }
                _ => prop_assert!(false, "mates must stay tagged"),
            }
        }
    }
}
