//! Mean-reversion signals and the long/flat stepper that replays them.

pub mod classify;
pub mod stepper;

pub use classify::{classify, classify_rolling, Signal};
pub use stepper::{step, Position, Stepper, TradeEvent};
