//! PairLab Core: price series, quote fetching, pair statistics and signals.
//!
//! This crate contains everything the pipeline computes with:
//! - Domain types (intervals, validated price series)
//! - Quote provider trait, the Alpha Vantage client and trailing windows
//! - Date alignment of two legs
//! - Statistics: spread, SMA, mean, stddev, z-score, hedge ratio
//! - Mean-reversion classification and the long/flat stepper
//! - A read-only brokerage position lookup

pub mod broker;
pub mod data;
pub mod domain;
pub mod signals;
pub mod stats;
