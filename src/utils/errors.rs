use thiserror::Error;

/// Failures while reading or decoding the request envelope.
/// These are reported on stderr.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Failures anywhere between series construction and encoding.
/// These are reported on stdout with `success: false`.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No OHLC data to plot")]
    EmptySeries,
    #[error("Invalid OHLC row {index}: {source}")]
    InvalidRow {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Timestamp out of range: {0}")]
    InvalidTimestamp(i64),
    #[error("{0}")]
    Drawing(String),
    #[error("{0}")]
    Encoding(String),
}
