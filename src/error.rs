use thiserror::Error;

/// Crate-wide error taxonomy. The first four variants are terminal for the
/// request that raised them and are always surfaced to the caller; none is
/// retried automatically.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("invalid score vector: {0}")]
    InvalidScoreVector(String),

    #[error("invalid label: {0}")]
    InvalidLabel(String),

    #[error("policy calibration failed: {0}")]
    PolicyCalibrationFailed(String),

    #[error("service not ready: no decision policy has been installed")]
    ServiceNotReady,

    #[error("invalid policy config: {0}")]
    InvalidPolicyConfig(String),

    #[error("audit write failed: {0}")]
    AuditWrite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, TriageError>;
