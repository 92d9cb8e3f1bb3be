//! Long/flat replay of a signal sequence.
//!
//! Long-only with two states. A `Buy` while flat opens a position and a
//! `Sell` while long closes it; any other combination is ignored.
//! Index 0 is never evaluated, since there is no prior bar to act from.

use super::classify::Signal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Position {
    #[default]
    Flat,
    Long,
}

/// A transition emitted by the stepper, tagged with the signal index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "side", content = "index", rename_all = "snake_case")]
pub enum TradeEvent {
    Buy(usize),
    Sell(usize),
}

impl TradeEvent {
    pub fn index(&self) -> usize {
        match *self {
            TradeEvent::Buy(i) | TradeEvent::Sell(i) => i,
        }
    }
}

/// Incremental form of [`step`], for callers feeding signals one at a time.
#[derive(Debug, Clone, Default)]
pub struct Stepper {
    position: Position,
}

impl Stepper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn on_signal(&mut self, index: usize, signal: Signal) -> Option<TradeEvent> {
        match (signal, self.position) {
            (Signal::Buy, Position::Flat) => {
                self.position = Position::Long;
                Some(TradeEvent::Buy(index))
            }
            (Signal::Sell, Position::Long) => {
                self.position = Position::Flat;
                Some(TradeEvent::Sell(index))
            }
            _ => None,
        }
    }
}

/// Replay `signals` from a flat start, skipping index 0.
pub fn step(signals: &[Signal]) -> Vec<TradeEvent> {
    let mut stepper = Stepper::new();
    signals
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(i, &s)| stepper.on_signal(i, s))
        .collect()
}
