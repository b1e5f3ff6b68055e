//! Chart generation models

use chrono::{DateTime, Utc};

use crate::models::OhlcPoint;
use crate::utils::errors::RenderError;

/// A single row of the time-indexed candle table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

impl TryFrom<OhlcPoint> for Candle {
    type Error = RenderError;

    fn try_from(point: OhlcPoint) -> Result<Self, Self::Error> {
        let time = DateTime::<Utc>::from_timestamp(point.timestamp, 0)
            .ok_or(RenderError::InvalidTimestamp(point.timestamp))?;

        Ok(Self {
            time,
            open: point.open,
            high: point.high,
            low: point.low,
            close: point.close,
            volume: point.volume,
        })
    }
}

/// Candles in input order. Ordering is assumed chronological, not enforced.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// The last `n` candles, or all of them when there are fewer
    pub fn tail(&self, n: usize) -> &[Candle] {
        let start = self.candles.len().saturating_sub(n);
        &self.candles[start..]
    }
}
