//! Error types for Stratum

use thiserror::Error;

/// The main error type for Stratum operations
#[derive(Error, Debug)]
pub enum Error {
    /// A prepare/execute call failed inside the database driver
    #[error("Driver error ({}): {}", .code.as_deref().unwrap_or("unknown"), .message)]
    Driver {
        code: Option<String>,
        message: String,
    },

    /// Invalid schema or engine configuration (unknown option, unsupported type, ...)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The caller broke a usage contract (UPDATE without WHERE, ...)
    #[error("Logic error: {message}")]
    Logic { message: String },

    /// An argument had the wrong shape for the requested operation
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A lookup that requires a result found none
    #[error("No results found in table '{table}'")]
    NotFound { table: String },

    /// Persisting a record failed
    #[error("Failed to save record into '{table}': {source}")]
    Save {
        table: String,
        #[source]
        source: Box<Error>,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience Result type for Stratum operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new driver error
    pub fn driver(code: Option<String>, message: impl Into<String>) -> Self {
        Self::Driver {
            code,
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new logic error
    pub fn logic(message: impl Into<String>) -> Self {
        Self::Logic {
            message: message.into(),
        }
    }

    /// Create a new invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new not found error
    pub fn not_found(table: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
        }
    }

    /// Wrap an error raised while saving a record
    pub fn save(table: impl Into<String>, source: Error) -> Self {
        Self::Save {
            table: table.into(),
            source: Box::new(source),
        }
    }

    /// HTTP-style status code for errors the web layer translates directly
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Driver error code, looking through save wrappers
    pub fn driver_code(&self) -> Option<&str> {
        match self {
            Error::Driver { code, .. } => code.as_deref(),
            Error::Save { source, .. } => source.driver_code(),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => Error::Driver {
                code: db.code().map(|code| code.into_owned()),
                message: db.message().to_string(),
            },
            other => Error::Driver {
                code: None,
                message: other.to_string(),
            },
        }
    }
}
