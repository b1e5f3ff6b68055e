use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{Candle, CandleSeries, OhlcPoint};
use crate::utils::errors::RenderError;

/// Build the time-indexed candle table from raw request rows
pub fn build_series(rows: &[Value]) -> Result<CandleSeries, RenderError> {
    if rows.is_empty() {
        warn!("Request carried no OHLC rows");
        return Err(RenderError::EmptySeries);
    }

    let mut candles = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let point = OhlcPoint::deserialize(row)
            .map_err(|source| RenderError::InvalidRow { index, source })?;
        candles.push(Candle::try_from(point)?);
    }

    debug!("Built series of {} candles", candles.len());

    Ok(CandleSeries::new(candles))
}

/// The most recent `size` candles of the series
pub fn window(series: &CandleSeries, size: usize) -> &[Candle] {
    let view = series.tail(size);
    if view.len() < series.len() {
        debug!("Windowed {} candles down to the last {}", series.len(), view.len());
    }
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WINDOW_SIZE;
    use serde_json::json;

    fn rows(count: i64) -> Vec<Value> {
        (0..count)
            .map(|i| {
                json!({
                    "timestamp": 1_700_000_000 + i * 3600,
                    "open": 1.0,
                    "high": 1.2,
                    "low": 0.9,
                    "close": 1.1,
                    "volume": 1000
                })
            })
            .collect()
    }

    #[test]
    fn test_empty_rows() {
        assert!(matches!(build_series(&[]), Err(RenderError::EmptySeries)));
    }

    #[test]
    fn test_bad_row_names_index() {
        let mut data = rows(3);
        data[2] = json!({"timestamp": 1_700_000_000, "open": "one"});

        match build_series(&data) {
            Err(RenderError::InvalidRow { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected InvalidRow, got {:?}", other),
        }
    }

    #[test]
    fn test_row_that_is_not_an_object() {
        let data = vec![json!([1700000000, 1.0, 1.2, 0.9, 1.1, 1000])];
        assert!(matches!(
            build_series(&data),
            Err(RenderError::InvalidRow { index: 0, .. })
        ));
    }

    #[test]
    fn test_window_keeps_last_hundred() {
        let series = build_series(&rows(150)).unwrap();
        let view = window(&series, WINDOW_SIZE);

        assert_eq!(view.len(), 100);
        assert_eq!(view[0].time.timestamp(), 1_700_000_000 + 50 * 3600);
        assert_eq!(view[99].time.timestamp(), 1_700_000_000 + 149 * 3600);
        assert_eq!(series.len(), 150);
    }

    #[test]
    fn test_window_keeps_everything_when_short() {
        for count in [1, 99, 100] {
            let series = build_series(&rows(count)).unwrap();
            let view = window(&series, WINDOW_SIZE);
            assert_eq!(view.len(), count as usize);
            assert_eq!(view[0].time.timestamp(), 1_700_000_000);
        }
    }

    #[test]
    fn test_input_order_is_preserved() {
        let data = vec![
            json!({"timestamp": 20, "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 0}),
            json!({"timestamp": 10, "open": 1.0, "high": 1.0, "low": 1.0, "close": 1.0, "volume": 0}),
        ];
        let series = build_series(&data).unwrap();
        assert_eq!(series.tail(2)[0].time.timestamp(), 20);
    }
}
