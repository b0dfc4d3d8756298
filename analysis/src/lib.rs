//! Engine analysis session control.
//!
//! Turns the raw UCI plumbing in the `engine` crate into caller-facing
//! ranked analysis: normalized evaluations, display-notation lines, and a
//! single-flight session controller with one-shot and streaming modes.

pub mod events;
pub mod notation;
pub mod options;
pub mod session;

pub use events::{parse_line, AnalysisLine, Evaluation, ParsedEvent, RankUpdate};
pub use options::AnalysisOptions;
pub use session::{AnalysisError, Analyzer, Launcher};
