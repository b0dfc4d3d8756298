use engine::{ClockParams, EngineCommand, GoParams};

/// Default one-shot evaluation timeout.
pub const DEFAULT_EVAL_TIMEOUT_MS: u64 = 10_000;

/// Immutable configuration snapshot for one analysis session.
///
/// Several search limiters may be populated; the engine receives exactly
/// one, picked in priority order depth > clock > movetime > nodes (and a
/// default depth when none is set). Tuning parameters are each optional
/// and sent only when present.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub depth: Option<u32>,
    pub clock: Option<ClockParams>,
    pub movetime_ms: Option<u64>,
    pub nodes: Option<u64>,
    /// Number of ranked lines to search (UCI MultiPV), at least 1.
    pub multipv: u32,
    pub skill_level: Option<u8>,
    pub contempt: Option<i32>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    /// Override for the one-shot evaluation timeout.
    pub timeout_ms: Option<u64>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            depth: None,
            clock: None,
            movetime_ms: None,
            nodes: None,
            multipv: 1,
            skill_level: None,
            contempt: None,
            threads: None,
            hash_mb: None,
            timeout_ms: None,
        }
    }
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_clock(mut self, wtime_ms: u64, btime_ms: u64) -> Self {
        self.clock = Some(ClockParams { wtime_ms, btime_ms });
        self
    }

    pub fn with_movetime(mut self, ms: u64) -> Self {
        self.movetime_ms = Some(ms);
        self
    }

    pub fn with_nodes(mut self, nodes: u64) -> Self {
        self.nodes = Some(nodes);
        self
    }

    pub fn with_multipv(mut self, lines: u32) -> Self {
        self.multipv = lines.max(1);
        self
    }

    pub fn with_skill_level(mut self, level: u8) -> Self {
        self.skill_level = Some(level);
        self
    }

    pub fn with_contempt(mut self, contempt: i32) -> Self {
        self.contempt = Some(contempt);
        self
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_hash_mb(mut self, hash_mb: u32) -> Self {
        self.hash_mb = Some(hash_mb);
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    /// Configuration commands for the non-default tuning parameters, in a
    /// fixed order: MultiPV, Skill Level, Contempt, Threads, Hash. Values
    /// are clamped to the ranges the engine accepts.
    pub(crate) fn setup_commands(&self) -> Vec<EngineCommand> {
        let mut commands = Vec::new();
        if self.multipv > 1 {
            commands.push(set_option("MultiPV", self.multipv.clamp(1, 500)));
        }
        if let Some(level) = self.skill_level {
            commands.push(set_option("Skill Level", level.min(20)));
        }
        if let Some(contempt) = self.contempt {
            commands.push(set_option("Contempt", contempt.clamp(-100, 100)));
        }
        if let Some(threads) = self.threads {
            commands.push(set_option("Threads", threads.clamp(1, 16)));
        }
        if let Some(hash_mb) = self.hash_mb {
            commands.push(set_option("Hash", hash_mb.clamp(1, 2048)));
        }
        commands
    }

    pub(crate) fn go_params(&self, infinite: bool) -> GoParams {
        GoParams {
            depth: self.depth,
            clock: self.clock,
            movetime: self.movetime_ms,
            nodes: self.nodes,
            infinite,
        }
    }

    /// One-shot deadline: the configured timeout (or the default), never
    /// longer than a requested fixed move time.
    pub(crate) fn eval_timeout_ms(&self) -> u64 {
        let base = self.timeout_ms.unwrap_or(DEFAULT_EVAL_TIMEOUT_MS);
        match self.movetime_ms {
            Some(movetime) => movetime.min(base),
            None => base,
        }
    }
}

fn set_option(name: &str, value: impl std::fmt::Display) -> EngineCommand {
    EngineCommand::SetOption {
        name: name.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_need_no_setup() {
        assert!(AnalysisOptions::new().setup_commands().is_empty());
    }

    #[test]
    fn setup_commands_are_ordered_and_clamped() {
        let options = AnalysisOptions::new()
            .with_multipv(600)
            .with_skill_level(33)
            .with_contempt(500)
            .with_threads(99)
            .with_hash_mb(1_000_000);
        let lines: Vec<String> = options
            .setup_commands()
            .iter()
            .map(|cmd| cmd.encode())
            .collect();
        assert_eq!(
            lines,
            vec![
                "setoption name MultiPV value 500",
                "setoption name Skill Level value 20",
                "setoption name Contempt value 100",
                "setoption name Threads value 16",
                "setoption name Hash value 2048",
            ]
        );
    }

    #[test]
    fn single_line_search_skips_multipv() {
        let options = AnalysisOptions::new().with_multipv(1).with_threads(4);
        let lines: Vec<String> = options
            .setup_commands()
            .iter()
            .map(|cmd| cmd.encode())
            .collect();
        assert_eq!(lines, vec!["setoption name Threads value 4"]);
    }

    #[test]
    fn go_params_carry_the_requested_limiters() {
        let options = AnalysisOptions::new().with_depth(18).with_movetime(2_000);
        assert_eq!(
            EngineCommand::Go(options.go_params(false)).encode(),
            "go depth 18"
        );
        assert_eq!(
            EngineCommand::Go(options.go_params(true)).encode(),
            "go infinite"
        );
    }

    #[test]
    fn eval_timeout_is_capped_by_movetime() {
        assert_eq!(
            AnalysisOptions::new().eval_timeout_ms(),
            DEFAULT_EVAL_TIMEOUT_MS
        );
        assert_eq!(
            AnalysisOptions::new().with_timeout_ms(3_000).eval_timeout_ms(),
            3_000
        );
        assert_eq!(
            AnalysisOptions::new().with_movetime(1_500).eval_timeout_ms(),
            1_500
        );
        assert_eq!(
            AnalysisOptions::new().with_movetime(60_000).eval_timeout_ms(),
            DEFAULT_EVAL_TIMEOUT_MS
        );
    }
}
