//! Momentum-breakout signal pipeline.
//!
//! Raw candles become an indicator table, the last two rows pass through the
//! quality gate, and the generator turns them into a LONG/SHORT/NONE
//! decision with bracket levels.

pub mod filter;
pub mod generator;
pub mod indicators;
pub mod table;

pub use filter::{check_filters, FilterRejection};
pub use generator::{generate_signal, MIN_CANDLES_REQUIRED};
pub use table::{build_table, compute_indicators, IndicatorRow};
