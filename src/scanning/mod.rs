//! Scanning
//!
//! - `engine`: dictionary build phase and per-window incremental descent
//! - `ledger`: occurrence counts and the final report
//! - `session`: per-stream windows, evaluation scheduling, finalization

pub mod engine;
pub mod ledger;
pub mod session;

pub use engine::{EngineBuilder, Evaluation, MatchEngine};
pub use ledger::{MatchCount, MatchLedger, Report};
pub use session::{ScanSession, ScanStats, SessionOptions, StreamId, StreamState};
