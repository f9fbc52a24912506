//! Error types for awplus-resources.
//!
//! [`ModuleError`](crate::modules::ModuleError) covers a single reconciliation;
//! [`Error`] wraps it together with the file, configuration and serialization
//! failures of the surrounding tooling.

use crate::modules::ModuleError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for awplus-resources operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for awplus-resources.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Module Errors
    // ========================================================================
    /// No module manages the requested resource.
    #[error("Unknown resource '{0}'")]
    UnknownResource(String),

    /// Reconciliation failed.
    #[error("Module '{module}' failed: {source}")]
    Module {
        /// Module name
        module: String,
        /// Underlying module error
        #[source]
        source: ModuleError,
    },

    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Error parsing a want or facts document.
    #[error("Failed to parse '{path}': {message}")]
    InputParse {
        /// Path to the document
        path: PathBuf,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// Generic error with source.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new module error.
    pub fn module(module: impl Into<String>, source: ModuleError) -> Self {
        Self::Module {
            module: module.into(),
            source,
        }
    }

    /// Creates a new input parse error.
    pub fn input_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InputParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Module { source, .. } => match source {
                ModuleError::InvariantViolation(_) => 3,
                ModuleError::MissingResource(_) => 4,
                _ => 2,
            },
            Error::UnknownResource(_) => 2,
            Error::InputParse { .. }
            | Error::YamlParse(_)
            | Error::JsonParse(_)
            | Error::TomlParse(_) => 5,
            Error::Config(_) | Error::InvalidConfig { .. } => 6,
            Error::FileNotFound(_) => 7,
            _ => 1,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}
