pub mod engine;
pub mod journal;
pub mod recorder;
pub mod risk;
pub mod runner;
pub mod signals;

pub use engine::DecisionEngine;
pub use journal::{DecisionJournal, JournalEntry};
pub use recorder::BoundedHistory;
pub use risk::{compute_position_size, respect_leverage, DailyLossBreaker};
pub use runner::{Backoff, CandleSource, DecisionLoop, LiveState};
