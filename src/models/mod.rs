//! Data models for chart requests and responses
//!
//! Input rows, the time-indexed candle table built from them, and the
//! envelope written back to the caller.

pub mod chart;
pub mod ohlc;
pub mod request;
pub mod response;

// Re-export commonly used types for convenience
pub use chart::{Candle, CandleSeries};
pub use ohlc::OhlcPoint;
pub use request::ChartRequest;
pub use response::{ChartResponse, Emission};
