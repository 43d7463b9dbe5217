use std::fmt;

/// Result type alias for tracegen core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for tracegen core operations
#[derive(Debug)]
pub enum Error {
    /// I/O errors while writing or reading trace files
    Io(std::io::Error),

    /// Configuration rejected before any generator state was built
    Config(String),

    /// Generation requested before `initialize()`
    NotInitialized,

    /// The operation mix could not place a draw (non-positive total weight or
    /// a corrupted proportion table)
    NoOperationSelected { draw: f64, total_weight: f64 },

    /// A rejection-sampling loop ran out of retries: the key distribution can
    /// not produce a key inside the visible range
    InfeasibleDistribution { operation: &'static str, attempts: u64, visible_limit: u64 },

    /// A trace line did not match the line grammar
    Parse { line: String, reason: String },

    /// Other errors
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Config(msg) => write!(f, "Configuration error: {msg}"),
            Error::NotInitialized => write!(f, "Workload generator is not initialized"),
            Error::NoOperationSelected { draw, total_weight } => write!(
                f,
                "No operation selected for draw {draw} (total proportion weight {total_weight})"
            ),
            Error::InfeasibleDistribution { operation, attempts, visible_limit } => write!(
                f,
                "Distribution configuration infeasible: no {operation} key below visible limit \
                 {visible_limit} after {attempts} attempts"
            ),
            Error::Parse { line, reason } => write!(f, "Invalid trace line '{line}': {reason}"),
            Error::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
