//! Lighting error handling
//!
//! Error taxonomy shared by every executor. Accelerated executors surface
//! `ResourceInitialization` at construction and `Computation` per frame; both
//! are recoverable by switching to the reference executor.

use std::path::PathBuf;

/// Lighting-specific result type
pub type LightingResult<T> = Result<T, LightingError>;

/// Errors produced by the lighting subsystem
#[derive(Debug, thiserror::Error)]
pub enum LightingError {
    #[error("{backend} initialization failed: {message}")]
    ResourceInitialization { backend: String, message: String },

    #[error("{backend} lightmap computation failed: {message}")]
    Computation { backend: String, message: String },

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Failed to read config {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(String),
}

impl LightingError {
    /// Whether a caller can recover by switching executors
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LightingError::ResourceInitialization { .. } | LightingError::Computation { .. }
        )
    }
}

impl From<toml::de::Error> for LightingError {
    fn from(error: toml::de::Error) -> Self {
        LightingError::ConfigParse(error.to_string())
    }
}

impl From<serde_json::Error> for LightingError {
    fn from(error: serde_json::Error) -> Self {
        LightingError::ConfigParse(error.to_string())
    }
}

/// Create an initialization error for a backend
pub fn init_error(backend: &str, message: impl std::fmt::Display) -> LightingError {
    LightingError::ResourceInitialization {
        backend: backend.to_string(),
        message: message.to_string(),
    }
}

/// Create a per-frame computation error for a backend
pub fn computation_error(backend: &str, message: impl std::fmt::Display) -> LightingError {
    LightingError::Computation {
        backend: backend.to_string(),
        message: message.to_string(),
    }
}

/// Error context for lighting operations
pub trait LightingErrorContext<T> {
    fn computation_context(self, backend: &str, context: &str) -> LightingResult<T>;
}

impl<T> LightingErrorContext<T> for Option<T> {
    fn computation_context(self, backend: &str, context: &str) -> LightingResult<T> {
        self.ok_or_else(|| computation_error(backend, context))
    }
}

impl<T, E> LightingErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn computation_context(self, backend: &str, context: &str) -> LightingResult<T> {
        self.map_err(|e| computation_error(backend, format!("{}: {}", context, e)))
    }
}
