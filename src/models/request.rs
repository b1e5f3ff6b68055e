use serde::Deserialize;
use serde_json::Value;

use crate::utils::errors::ParseError;

/// The envelope read from stdin.
/// Rows stay as raw JSON here; they are checked when the series is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    pub ohlc_data: Vec<Value>,
    pub token_name: String,
    pub symbol: String,
    pub timeframe: String,
}

impl ChartRequest {
    pub fn from_json(input: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(input)?)
    }
}
