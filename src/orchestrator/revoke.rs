//! Revocation workflow.
//!
//! Tears down everything issuance created: the signing-request resource,
//! the role binding, and the local artifact directory. Every step is
//! independently idempotent — a missing target is a warning, not an error —
//! and no step is skipped because an earlier one failed. A hard step
//! failure is recorded in the report and surfaces as a non-zero exit, but
//! the remaining steps still run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::client::{ControlPlaneClient, DeleteOutcome};
use crate::identity::Identity;

// ─────────────────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of one revocation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The target existed and was removed.
    Deleted,
    /// The target did not exist.
    Absent,
    /// The step hard-failed; later steps still ran.
    Failed(String),
}

impl StepOutcome {
    /// `true` for [`StepOutcome::Failed`].
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<DeleteOutcome> for StepOutcome {
    fn from(outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted => Self::Deleted,
            DeleteOutcome::Absent => Self::Absent,
        }
    }
}

/// Per-step outcomes of a revocation run.
#[derive(Debug)]
pub struct RevocationReport {
    /// Signing-request resource deletion.
    pub signing_request: StepOutcome,
    /// Role-binding resource deletion.
    pub binding: StepOutcome,
    /// Local artifact cleanup.
    pub local_files: StepOutcome,
    /// Number of local files removed.
    pub files_removed: usize,
}

impl RevocationReport {
    /// `true` if any step hard-failed (absence does not count).
    pub fn has_failures(&self) -> bool {
        self.signing_request.is_failure()
            || self.binding.is_failure()
            || self.local_files.is_failure()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Drives the revocation sequence.
pub struct RevocationOrchestrator {
    client: Arc<dyn ControlPlaneClient>,
}

impl RevocationOrchestrator {
    /// Create a revocation orchestrator.
    pub fn new(client: Arc<dyn ControlPlaneClient>) -> Self {
        Self { client }
    }

    /// Run the full teardown for `identity`.
    ///
    /// Never returns `Err`: failures are isolated per step and reported in
    /// the [`RevocationReport`].
    pub async fn run(&self, identity: &Identity, output_dir: &Path) -> RevocationReport {
        let signing_request = self.delete_signing_request(identity).await;
        let binding = self.delete_binding(identity).await;
        let (local_files, files_removed) = delete_local_artifacts(identity, output_dir);

        info!(user = %identity, files_removed, "Revocation complete");

        RevocationReport {
            signing_request,
            binding,
            local_files,
            files_removed,
        }
    }

    async fn delete_signing_request(&self, identity: &Identity) -> StepOutcome {
        info!(step = "delete-csr", user = %identity, "Deleting signing request");
        match self.client.delete_signing_request(identity.csr_name()).await {
            Ok(DeleteOutcome::Deleted) => StepOutcome::Deleted,
            Ok(DeleteOutcome::Absent) => {
                warn!(step = "delete-csr", user = %identity, "Signing request not found, nothing to delete");
                StepOutcome::Absent
            }
            Err(e) => {
                warn!(step = "delete-csr", user = %identity, error = %e, "Signing request deletion failed");
                StepOutcome::Failed(e.to_string())
            }
        }
    }

    async fn delete_binding(&self, identity: &Identity) -> StepOutcome {
        let name = identity.binding_name();
        info!(step = "delete-binding", user = %identity, binding = %name, "Deleting role binding");
        match self.client.delete_binding(&name).await {
            Ok(DeleteOutcome::Deleted) => StepOutcome::Deleted,
            Ok(DeleteOutcome::Absent) => {
                warn!(step = "delete-binding", user = %identity, binding = %name,
                    "Role binding not found, nothing to delete");
                StepOutcome::Absent
            }
            Err(e) => {
                warn!(step = "delete-binding", user = %identity, error = %e, "Role binding deletion failed");
                StepOutcome::Failed(e.to_string())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Local cleanup
// ─────────────────────────────────────────────────────────────────────────────

/// Remove `<user>*` files under the identity's artifact directory, then the
/// directory itself. A leftover non-empty or inaccessible directory is a
/// warning, not fatal.
fn delete_local_artifacts(identity: &Identity, output_dir: &Path) -> (StepOutcome, usize) {
    let dir: PathBuf = output_dir.join(identity.name());
    if !dir.exists() {
        warn!(step = "delete-files", user = %identity, dir = %dir.display(),
            "No local artifacts found");
        return (StepOutcome::Absent, 0);
    }

    info!(step = "delete-files", user = %identity, dir = %dir.display(), "Removing local artifacts");

    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(step = "delete-files", user = %identity, error = %e, "Cannot read artifact directory");
            return (StepOutcome::Failed(e.to_string()), 0);
        }
    };

    let mut removed = 0usize;
    let mut failed = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(identity.name()) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => {
                warn!(step = "delete-files", file = %entry.path().display(), error = %e,
                    "Failed to delete artifact");
                failed = Some(e.to_string());
            }
        }
    }

    if let Err(e) = std::fs::remove_dir(&dir) {
        warn!(step = "delete-files", dir = %dir.display(), error = %e,
            "Artifact directory not removed (non-empty or inaccessible)");
        failed = Some(e.to_string());
    }

    match failed {
        Some(e) => (StepOutcome::Failed(e), removed),
        None => (StepOutcome::Deleted, removed),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryControlPlane;

    fn alice() -> Identity {
        Identity::new("alice").unwrap()
    }

    #[tokio::test]
    async fn revoking_nothing_reports_absence_everywhere() {
        // GIVEN: an empty control plane and no local artifacts
        let plane = Arc::new(InMemoryControlPlane::new());
        let dir = tempfile::tempdir().unwrap();
        // WHEN: revoking
        let report = RevocationOrchestrator::new(plane)
            .run(&alice(), dir.path())
            .await;
        // THEN: warnings only, never failures
        assert_eq!(report.signing_request, StepOutcome::Absent);
        assert_eq!(report.binding, StepOutcome::Absent);
        assert_eq!(report.local_files, StepOutcome::Absent);
        assert!(!report.has_failures());
    }

    #[tokio::test]
    async fn local_cleanup_removes_matching_files_and_directory() {
        let plane = Arc::new(InMemoryControlPlane::new());
        let base = tempfile::tempdir().unwrap();
        let user_dir = base.path().join("alice");
        std::fs::create_dir_all(&user_dir).unwrap();
        std::fs::write(user_dir.join("alice.key"), b"k").unwrap();
        std::fs::write(user_dir.join("alice.crt"), b"c").unwrap();
        std::fs::write(user_dir.join("alice-kubeconfig.yaml"), b"y").unwrap();

        let report = RevocationOrchestrator::new(plane)
            .run(&alice(), base.path())
            .await;

        assert_eq!(report.local_files, StepOutcome::Deleted);
        assert_eq!(report.files_removed, 3);
        assert!(!user_dir.exists());
    }

    #[tokio::test]
    async fn unmatched_files_keep_the_directory_and_warn() {
        // A stray file that does not match `<user>*` stays behind, so the
        // directory removal degrades to a warning outcome.
        let plane = Arc::new(InMemoryControlPlane::new());
        let base = tempfile::tempdir().unwrap();
        let user_dir = base.path().join("alice");
        std::fs::create_dir_all(&user_dir).unwrap();
        std::fs::write(user_dir.join("alice.key"), b"k").unwrap();
        std::fs::write(user_dir.join("stray.txt"), b"s").unwrap();

        let report = RevocationOrchestrator::new(plane)
            .run(&alice(), base.path())
            .await;

        assert!(report.local_files.is_failure());
        assert_eq!(report.files_removed, 1);
        assert!(user_dir.exists());
    }
}
