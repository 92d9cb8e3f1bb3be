//! Brokerage position lookup.
//!
//! Standalone: nothing in the statistics pipeline depends on it.

pub mod alpaca;

pub use alpaca::{AlpacaClient, AlpacaCredentials, BrokerError, HeldPosition};
