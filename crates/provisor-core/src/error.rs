//! Error types for provisor core

use thiserror::Error;

use crate::plan::StepKind;

/// Failures reported by a database session implementation.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to open session: {0}")]
    Open(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Object does not exist: {0}")]
    ObjectNotFound(String),

    #[error("Driver error: {0}")]
    Driver(String),
}

/// A fatal provisioning failure. Every variant aborts the run.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(#[source] SessionError),

    #[error("Liveness error: {0}")]
    Liveness(#[source] SessionError),

    #[error("Metadata query error ({query}): {source}")]
    Query {
        query: &'static str,
        #[source]
        source: SessionError,
    },

    #[error("Provisioning error ({step}): {source}")]
    Exec {
        step: StepKind,
        #[source]
        source: SessionError,
    },

    /// Not raised by the quoting logic, which accepts every input.
    #[error("Invalid identifier `{identifier}`: {reason}")]
    Identifier { identifier: String, reason: String },
}

impl ProvisionError {
    /// Name of the stage that failed, as used in log output.
    pub fn stage(&self) -> &'static str {
        match self {
            ProvisionError::Config(_) => "config",
            ProvisionError::Connection(_) => "connect",
            ProvisionError::Liveness(_) => "ping",
            ProvisionError::Query { query, .. } => *query,
            ProvisionError::Exec { step, .. } => step.as_str(),
            ProvisionError::Identifier { .. } => "identifier",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
