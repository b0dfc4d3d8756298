//! The engine session state machine.
//!
//! One long-lived actor task owns the engine process handle and all mutable
//! session state, and serves at most one session at a time: either a
//! one-shot evaluation or a continuous streaming analysis. Callers talk to
//! it through the cloneable [`Analyzer`] handle.

mod actor;
mod commands;
mod handle;
mod state;

pub use commands::AnalysisError;
pub use handle::{Analyzer, Launcher};
