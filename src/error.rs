//! Error types for the vagas client resilience core.

use std::error::Error as StdError;
use std::fmt;
use std::result;

/// A specialized Result type for resilience-core operations.
pub type Result<T> = result::Result<T, Error>;

/// The error type for resilience-core operations.
#[derive(Debug)]
pub enum Error {
    /// The startup procedure failed on the given attempt (1-based)
    Initialization { attempt: u32, message: String },
    /// A cache store query failed
    CacheQuery(String),
    /// The runtime offers no background-worker capability
    UpdateCapabilityAbsent,
    /// A command could not be delivered to a background worker
    WorkerMessage(String),
    /// Configuration errors
    Config(String),
    /// I/O errors
    Io(std::io::Error),
    /// Serialization/deserialization errors
    Serialization(String),
}

impl Error {
    /// Coerce any initialization failure into the uniform representation.
    pub fn initialization(attempt: u32, err: &anyhow::Error) -> Self {
        Error::Initialization {
            attempt,
            message: format!("{:#}", err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Initialization { attempt, message } => {
                write!(f, "Initialization failed (attempt {}): {}", attempt, message)
            }
            Error::CacheQuery(msg) => write!(f, "Cache query error: {}", msg),
            Error::UpdateCapabilityAbsent => write!(f, "Background worker capability absent"),
            Error::WorkerMessage(msg) => write!(f, "Worker message error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
