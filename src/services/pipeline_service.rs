use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{ChartStyle, PanelLayout, WINDOW_SIZE};
use crate::models::{ChartRequest, ChartResponse, Emission};
use crate::services::chart_service::{chart_title, ChartRenderer};
use crate::services::series_service::{build_series, window};
use crate::utils::errors::RenderError;
use crate::utils::png::{crop_to_content, encode_png};

/// Render a request to a base64 PNG
pub fn generate_chart<R: ChartRenderer>(
    request: &ChartRequest,
    now: DateTime<Utc>,
    renderer: &R,
) -> Result<String, RenderError> {
    let series = build_series(&request.ohlc_data)?;
    let candles = window(&series, WINDOW_SIZE);

    let style = ChartStyle::default();
    let layout = PanelLayout::default();
    let title = chart_title(&request.token_name, &request.symbol, &request.timeframe, now);

    let frame = renderer.render(candles, &title, &style, &layout)?;
    let background = style.background;
    let frame = crop_to_content(
        frame,
        [background.0, background.1, background.2],
        layout.bbox_pad_px(),
    );
    let png = encode_png(&frame)?;

    debug!(
        "Encoded {}x{} chart into {} PNG bytes",
        frame.width,
        frame.height,
        png.len()
    );

    Ok(BASE64.encode(png))
}

/// Handle one raw stdin payload and decide what is written where.
///
/// A request that cannot be decoded is answered on stderr. Any failure after
/// that is answered on stdout with `success: false`.
pub fn run<R: ChartRenderer>(input: &str, now: DateTime<Utc>, renderer: &R) -> Emission {
    let request = match ChartRequest::from_json(input) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected chart request: {}", e);
            return Emission::stderr(ChartResponse::failure(e));
        }
    };

    info!(
        "📈 Chart requested for {} ({}) {} with {} rows",
        request.token_name,
        request.symbol,
        request.timeframe,
        request.ohlc_data.len()
    );

    match generate_chart(&request, now, renderer) {
        Ok(image) => {
            info!("Chart generated ({} base64 chars)", image.len());
            Emission::stdout(ChartResponse::success(image))
        }
        Err(e) => {
            warn!("Chart generation failed: {}", e);
            Emission::stdout(ChartResponse::failure(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::response::OutputStream;
    use crate::models::Candle;
    use crate::services::chart_service::PlottersRenderer;
    use crate::utils::png::RgbFrame;
    use chrono::TimeZone;
    use serde_json::{json, Value};
    use std::cell::RefCell;

    const EXAMPLE: &str = r#"{"ohlcData":[{"timestamp":1700000000,"open":1.0,"high":1.2,"low":0.9,"close":1.1,"volume":1000}], "tokenName":"Test","symbol":"TST","timeframe":"1h"}"#;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    fn request_json(count: i64) -> String {
        let rows: Vec<Value> = (0..count)
            .map(|i| {
                let open = 1.0 + (i % 7) as f64 * 0.01;
                json!({
                    "timestamp": 1_700_000_000 + i * 3600,
                    "open": open,
                    "high": open + 0.05,
                    "low": open - 0.05,
                    "close": open + if i % 2 == 0 { 0.02 } else { -0.02 },
                    "volume": 500 + i
                })
            })
            .collect();
        json!({"ohlcData": rows, "tokenName": "Test", "symbol": "TST", "timeframe": "1h"})
            .to_string()
    }

    /// Records what reaches the renderer and paints a tiny frame
    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<(Vec<Candle>, String)>>,
    }

    impl ChartRenderer for Recorder {
        fn render(
            &self,
            candles: &[Candle],
            title: &str,
            _style: &ChartStyle,
            _layout: &PanelLayout,
        ) -> Result<RgbFrame, RenderError> {
            self.seen.borrow_mut().push((candles.to_vec(), title.to_string()));
            Ok(RgbFrame {
                pixels: vec![0; 2 * 2 * 3],
                width: 2,
                height: 2,
            })
        }
    }

    struct Failing;

    impl ChartRenderer for Failing {
        fn render(
            &self,
            _candles: &[Candle],
            _title: &str,
            _style: &ChartStyle,
            _layout: &PanelLayout,
        ) -> Result<RgbFrame, RenderError> {
            Err(RenderError::Drawing("Failed to draw candles: no font".to_string()))
        }
    }

    fn decoded_png(emission: &Emission) -> Vec<u8> {
        match &emission.response {
            ChartResponse::Success { image } => BASE64.decode(image).expect("invalid base64"),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_example_request_renders_png() {
        let emission = run(EXAMPLE, fixed_now(), &PlottersRenderer);

        assert_eq!(emission.stream, OutputStream::Stdout);
        let png = decoded_png(&emission);
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let line = emission.to_line().unwrap();
        assert!(line.starts_with(r#"{"success":true,"image":""#));
    }

    #[test]
    fn test_same_input_same_second_is_byte_identical() {
        let input = request_json(30);
        let first = run(&input, fixed_now(), &PlottersRenderer);
        let second = run(&input, fixed_now(), &PlottersRenderer);
        assert_eq!(decoded_png(&first), decoded_png(&second));
    }

    #[test]
    fn test_only_last_hundred_reach_renderer() {
        let recorder = Recorder::default();
        run(&request_json(150), fixed_now(), &recorder);

        let seen = recorder.seen.borrow();
        let (candles, title) = &seen[0];
        assert_eq!(candles.len(), 100);
        assert_eq!(candles[0].time.timestamp(), 1_700_000_000 + 50 * 3600);
        assert_eq!(candles[99].time.timestamp(), 1_700_000_000 + 149 * 3600);
        assert_eq!(title, "Test (TST) - 1H Candlestick Chart • 2024-01-02 03:04 UTC");
    }

    #[test]
    fn test_short_series_reaches_renderer_whole() {
        let recorder = Recorder::default();
        let emission = run(&request_json(42), fixed_now(), &recorder);

        assert!(emission.response.is_success());
        assert_eq!(recorder.seen.borrow()[0].0.len(), 42);
    }

    #[test]
    fn test_missing_token_name_goes_to_stderr() {
        let input = r#"{"ohlcData":[],"symbol":"TST","timeframe":"1h"}"#;
        let emission = run(input, fixed_now(), &Recorder::default());

        assert_eq!(emission.stream, OutputStream::Stderr);
        match emission.response {
            ChartResponse::Failure { error } => assert!(error.contains("tokenName")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_goes_to_stderr() {
        let emission = run("not json", fixed_now(), &Recorder::default());
        assert_eq!(emission.stream, OutputStream::Stderr);
        assert!(!emission.response.is_success());
    }

    #[test]
    fn test_empty_data_is_render_failure_on_stdout() {
        let input = r#"{"ohlcData":[],"tokenName":"Test","symbol":"TST","timeframe":"1h"}"#;
        let recorder = Recorder::default();
        let emission = run(input, fixed_now(), &recorder);

        assert_eq!(emission.stream, OutputStream::Stdout);
        assert_eq!(emission.response, ChartResponse::failure("No OHLC data to plot"));
        assert!(recorder.seen.borrow().is_empty());
    }

    #[test]
    fn test_bad_row_is_render_failure_on_stdout() {
        let input = r#"{"ohlcData":[{"timestamp":"soon"}],"tokenName":"Test","symbol":"TST","timeframe":"1h"}"#;
        let emission = run(input, fixed_now(), &Recorder::default());

        assert_eq!(emission.stream, OutputStream::Stdout);
        match emission.response {
            ChartResponse::Failure { error } => assert!(error.starts_with("Invalid OHLC row 0")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_renderer_error_message_is_passed_through() {
        let emission = run(EXAMPLE, fixed_now(), &Failing);

        assert_eq!(emission.stream, OutputStream::Stdout);
        assert_eq!(
            emission.response,
            ChartResponse::failure("Failed to draw candles: no font")
        );
    }

    #[test]
    fn test_overflowing_values_answer_on_stdout() {
        let rows = [
            json!({"timestamp": 1_700_000_000, "open": 1.0, "high": 1e308, "low": -1e308, "close": 1.0, "volume": 1}),
            json!({"timestamp": 1_700_000_000, "open": 1.0, "high": 1.2, "low": 0.9, "close": 1.1, "volume": 1.7e308}),
        ];
        for row in rows {
            let input = json!({"ohlcData": [row], "tokenName": "Test", "symbol": "TST", "timeframe": "1h"})
                .to_string();
            let emission = run(&input, fixed_now(), &PlottersRenderer);

            assert_eq!(
                emission,
                Emission::stdout(ChartResponse::failure("Failed to scale axes: non-finite range"))
            );
        }
    }
}
