use serde::Deserialize;

/// One input row as sent by the caller
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OhlcPoint {
    /// Unix epoch seconds
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}
