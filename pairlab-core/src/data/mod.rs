//! Quote fetching and pair alignment

pub mod align;
pub mod alpha_vantage;
pub mod provider;

pub use align::{align_pair, AlignedPair};
pub use alpha_vantage::AlphaVantageProvider;
pub use provider::{fetch_series, DataError, FetchRequest, QuoteProvider, TrailingWindow};
