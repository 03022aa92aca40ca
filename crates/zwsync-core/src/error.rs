//! Unified error handling for zwsync.
//!
//! Every crate in the workspace returns [`Result`] so that failures coming
//! from value parsers, the transport or pending writes travel through `?`
//! without being translated along the way.

/// Unified error type for zwsync.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors (bad identifiers, unbound properties, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Already exists errors.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A raw protocol value could not be converted to or from a typed value.
    #[error("Parse error at {location}: {message}")]
    Parse { location: String, message: String },

    /// Errors reported by the hardware transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A pending write was not confirmed in time.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A pending write was dropped before the hardware confirmed it.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, Error>;

#[macro_export]
macro_rules! config_err {
    ($msg:expr) => {
        $crate::error::Error::Config($msg.into())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::Config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! not_found_err {
    ($msg:expr) => {
        $crate::error::Error::NotFound($msg.into())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::NotFound(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! validation_err {
    ($msg:expr) => {
        $crate::error::Error::Validation($msg.into())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::Validation(format!($fmt, $($arg)*))
    };
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(e: tokio::time::error::Elapsed) -> Self {
        Error::Timeout(e.to_string())
    }
}

// Convenience constructors for common errors
impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn parse(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }
}
