//! Error types for kubecert

use std::io;

use thiserror::Error;

/// Result type alias for kubecert
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the issuance and revocation workflows.
///
/// Absence of an idempotent-delete target is deliberately *not* represented
/// here — deletes return [`crate::client::DeleteOutcome`] so callers can log
/// a warning and continue.
#[derive(Error, Debug)]
pub enum Error {
    /// Key or CSR generation failed (crypto toolchain unavailable,
    /// unwritable output directory, malformed key material).
    #[error("Key material generation failed: {0}")]
    Generation(String),

    /// The control plane rejected the signing-request submission.
    #[error("Signing request submission failed: {0}")]
    Submission(String),

    /// The control plane refused to approve the signing request, or the
    /// request resource does not exist.
    #[error("Signing request approval failed: {0}")]
    Approval(String),

    /// The signed certificate has not been issued yet. Retryable — the
    /// fetch poll converts exhausted `Pending` into [`Error::Timeout`].
    #[error("Certificate for '{0}' not issued yet")]
    Pending(String),

    /// The signed certificate never materialised within the poll bound.
    #[error("Timed out waiting for certificate: {0}")]
    Timeout(String),

    /// The control plane could not be reached or returned an unexpected
    /// response outside the submit/approve paths.
    #[error("Control plane error: {0}")]
    ControlPlane(String),

    /// The subject name is unusable as a resource name or path segment.
    #[error("Invalid identity: {0}")]
    Identity(String),

    /// The advisory certificate/key integrity check could not run.
    #[error("Integrity verification failed: {0}")]
    Verification(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
