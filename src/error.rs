use std::fmt;

/// Result type for danknn operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the network engine.
///
/// Every operation reports failure to its immediate caller; nothing is
/// retried internally.
#[derive(Debug)]
pub enum Error {
    /// Fewer than two layers, or a layer of width zero.
    InvalidTopology(String),

    /// A vector or matrix does not have the length the topology requires.
    Shape {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A layer index outside `[1, layer_count - 1]`.
    Range { index: usize, layer_count: usize },

    /// A batch of training contexts does not belong to the target network.
    Mismatch(String),

    /// Parameter storage could not be reserved.
    Allocation(String),

    /// File open/read/write failure.
    Io(std::io::Error),

    /// Bad magic number, truncated stream or a header the format cannot express.
    Format(String),

    /// A JSON network or training configuration that is malformed or holds
    /// unusable values.
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidTopology(msg) => write!(f, "invalid topology: {msg}"),
            Error::Shape { what, expected, actual } => {
                write!(f, "shape mismatch for {what}: expected {expected}, got {actual}")
            }
            Error::Range { index, layer_count } => write!(
                f,
                "layer index {index} out of range: must be in [1, {}]",
                layer_count.saturating_sub(1)
            ),
            Error::Mismatch(msg) => write!(f, "network mismatch: {msg}"),
            Error::Allocation(msg) => write!(f, "allocation failed: {msg}"),
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Format(msg) => write!(f, "format error: {msg}"),
            Error::Config(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
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

impl From<std::collections::TryReserveError> for Error {
    fn from(err: std::collections::TryReserveError) -> Self {
        Error::Allocation(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    pub(crate) fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        Error::Shape { what, expected, actual }
    }

    /// Fails with `Shape` unless `actual == expected`.
    pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Error::shape(what, expected, actual))
        }
    }
}
