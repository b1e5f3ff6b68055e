use std::io::{self, Read};

use chrono::Utc;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod config;
mod models;
mod services;
mod utils;

use models::{ChartResponse, Emission};
use services::chart_service::PlottersRenderer;
use services::pipeline_service;
use utils::ParseError;

fn main() {
    // stdout and stderr both carry the response, so logs stay off unless
    // RUST_LOG asks for them
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(true)
        .init();

    let mut input = String::new();
    let emission = match io::stdin().read_to_string(&mut input) {
        Ok(bytes) => {
            debug!("Read {} bytes from stdin", bytes);
            pipeline_service::run(&input, Utc::now(), &PlottersRenderer)
        }
        Err(e) => Emission::stderr(ChartResponse::failure(ParseError::from(e))),
    };

    // Exit status stays zero on every path; callers read the `success` field.
    debug!("Responding with success={}", emission.response.is_success());
    if let Err(e) = emission.write() {
        error!("Failed to write response: {}", e);
    }
}
