//! Common error types for the simulator
//!
//! Configuration and input problems are reported here and turned into a
//! non-zero exit code by the binaries. Starvation, predation, and lost
//! same-species conflicts are normal simulation outcomes, not errors.

use std::fmt;

/// Core error type for the simulator
#[derive(Debug, Clone)]
pub enum EcosimError {
    /// Invalid run configuration (thread count, grid dimensions)
    Config(String),

    /// Malformed input text
    Parse(String),

    /// World loading errors (out-of-bounds placements, truncated files)
    WorldLoading(String),

    /// I/O errors while reading input or writing results
    Io(String),

    /// Stats sink errors
    Stats(String),
}

impl fmt::Display for EcosimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcosimError::Config(msg) => write!(f, "Configuration Error: {}", msg),
            EcosimError::Parse(msg) => write!(f, "Parse Error: {}", msg),
            EcosimError::WorldLoading(msg) => write!(f, "World Loading Error: {}", msg),
            EcosimError::Io(msg) => write!(f, "IO Error: {}", msg),
            EcosimError::Stats(msg) => write!(f, "Stats Error: {}", msg),
        }
    }
}

impl std::error::Error for EcosimError {}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, EcosimError>;

/// Error conversion helpers
impl EcosimError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a world loading error
    pub fn world_loading<S: Into<String>>(msg: S) -> Self {
        Self::WorldLoading(msg.into())
    }

    /// Create an I/O error
    pub fn io<S: Into<String>>(msg: S) -> Self {
        Self::Io(msg.into())
    }

    /// Create a stats sink error
    pub fn stats<S: Into<String>>(msg: S) -> Self {
        Self::Stats(msg.into())
    }
}

impl From<std::io::Error> for EcosimError {
    fn from(err: std::io::Error) -> Self {
        EcosimError::io(err.to_string())
    }
}

impl From<serde_json::Error> for EcosimError {
    fn from(err: serde_json::Error) -> Self {
        EcosimError::stats(format!("JSON serialization error: {}", err))
    }
}
