//! VS-002: Error taxonomy.
//!
//! Construction is deterministic, so there is no retry path: every
//! [`ConfigurationError`] is fatal to synthesis.

use std::path::PathBuf;
use thiserror::Error;

/// Graph-construction errors raised while building a stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("parameter '{0}' is already defined in this stack")]
    DuplicateParameter(String),

    #[error("stack '{0}' already has a backend")]
    DuplicateBackend(String),

    #[error("stack '{0}' already has a provider")]
    DuplicateProvider(String),

    #[error("logical id '{0}' is already declared in this stack")]
    DuplicateLogicalId(String),

    #[error("output '{0}' is already registered")]
    DuplicateOutput(String),

    #[error("stack '{0}' is already registered with the app")]
    DuplicateStack(String),

    #[error("{kind} handle '{name}' belongs to a different stack than '{stack}'")]
    ForeignHandle {
        kind: &'static str,
        name: String,
        stack: String,
    },

    #[error("parameter '{name}' has type {actual}, expected {expected}")]
    ParameterType {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),
}

/// Top-level error for configuration loading and synthesis.
#[derive(Error, Debug)]
pub enum SynthError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SynthError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, SynthError>;
