//! Control-plane client abstraction.
//!
//! The orchestrators drive the cluster exclusively through the
//! [`ControlPlaneClient`] trait so the same sequencing runs against the
//! real cluster ([`KubectlClient`]) and against the in-memory double
//! ([`InMemoryControlPlane`]) used by the test suite.
//!
//! Deletes are idempotent by contract: a missing target is reported as
//! [`DeleteOutcome::Absent`], never as an error.

mod kubectl;
mod memory;

pub use kubectl::KubectlClient;
pub use memory::InMemoryControlPlane;

use async_trait::async_trait;

use crate::Result;
use crate::resources::{BindingDocument, CsrDocument};

// ─────────────────────────────────────────────────────────────────────────────
// Contract types
// ─────────────────────────────────────────────────────────────────────────────

/// Result of an idempotent delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The resource existed and was removed.
    Deleted,
    /// The resource did not exist; nothing to do.
    Absent,
}

impl DeleteOutcome {
    /// Returns `true` if the target was actually removed.
    pub fn was_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// Connection metadata of the target cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterInfo {
    /// API server endpoint URL.
    pub server: String,
    /// Base64-encoded CA bundle (`certificate-authority-data`).
    pub ca_data: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────────────────────────────────

/// Operations the issuance and revocation workflows require from the
/// cluster-management control plane.
///
/// Implementations must be `Send + Sync + 'static` so they can be stored
/// in `Arc<dyn ControlPlaneClient>` and shared across async tasks.
#[async_trait]
pub trait ControlPlaneClient: Send + Sync + 'static {
    /// Delete the signing-request resource `name`, tolerating absence.
    async fn delete_signing_request(&self, name: &str) -> Result<DeleteOutcome>;

    /// Submit a signing-request envelope.
    ///
    /// # Errors
    ///
    /// Returns `Error::Submission` on a malformed envelope or API rejection.
    async fn submit_signing_request(&self, envelope: &CsrDocument) -> Result<()>;

    /// Approve the signing request `name`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Approval` if the resource does not exist or policy
    /// rejects the approval.
    async fn approve_signing_request(&self, name: &str) -> Result<()>;

    /// Fetch the signed certificate for `name`, if issued.
    ///
    /// Returns `Ok(None)` while the control plane has approved but not yet
    /// populated the certificate field; the orchestrator owns the bounded
    /// poll around this call.
    async fn fetch_certificate(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Read the cluster endpoint and CA data.
    async fn cluster_info(&self) -> Result<ClusterInfo>;

    /// Apply an authorization binding.
    async fn apply_binding(&self, binding: &BindingDocument) -> Result<()>;

    /// Delete the authorization binding `name`, tolerating absence.
    async fn delete_binding(&self, name: &str) -> Result<DeleteOutcome>;
}
