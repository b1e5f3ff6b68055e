use std::io::{self, Write};

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// The single result object written per invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ChartResponse {
    Success { image: String },
    Failure { error: String },
}

impl ChartResponse {
    pub fn success(image: impl Into<String>) -> Self {
        Self::Success { image: image.into() }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl Serialize for ChartResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChartResponse", 2)?;
        match self {
            Self::Success { image } => {
                state.serialize_field("success", &true)?;
                state.serialize_field("image", image)?;
            }
            Self::Failure { error } => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A response bound for a specific stream
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub stream: OutputStream,
    pub response: ChartResponse,
}

impl Emission {
    pub fn stdout(response: ChartResponse) -> Self {
        Self {
            stream: OutputStream::Stdout,
            response,
        }
    }

    pub fn stderr(response: ChartResponse) -> Self {
        Self {
            stream: OutputStream::Stderr,
            response,
        }
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.response)
    }

    /// Write the response as one line of JSON to its stream
    pub fn write(&self) -> io::Result<()> {
        let line = self.to_line()?;
        match self.stream {
            OutputStream::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{}", line)?;
                out.flush()
            }
            OutputStream::Stderr => {
                let mut out = io::stderr().lock();
                writeln!(out, "{}", line)?;
                out.flush()
            }
        }
    }
}
