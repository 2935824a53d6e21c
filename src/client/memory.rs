//! In-memory control-plane double.
//!
//! Models just enough cluster behaviour to exercise the orchestrators:
//! submitted envelopes are stored by name, resubmission of an existing name
//! conflicts, approval populates the certificate (optionally after a number
//! of empty fetches, to exercise the bounded poll), and deletes report
//! absence instead of failing.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::{ClusterInfo, ControlPlaneClient, DeleteOutcome};
use crate::resources::{BindingDocument, CsrDocument};
use crate::{Error, Result};

/// Certificate returned for every approved request unless overridden.
pub const DEFAULT_ISSUED_CERT: &[u8] =
    b"-----BEGIN CERTIFICATE-----\nc3R1YiBjZXJ0aWZpY2F0ZQ==\n-----END CERTIFICATE-----\n";

#[derive(Debug)]
struct StoredRequest {
    envelope: CsrDocument,
    approved: bool,
    fetches_until_issued: u32,
}

#[derive(Debug, Default)]
struct State {
    requests: HashMap<String, StoredRequest>,
    bindings: HashMap<String, BindingDocument>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Double
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory [`ControlPlaneClient`] variant for tests.
#[derive(Debug)]
pub struct InMemoryControlPlane {
    state: Mutex<State>,
    info: ClusterInfo,
    issued_cert: Vec<u8>,
    issue_after_fetches: u32,
    reject_approvals: bool,
}

impl InMemoryControlPlane {
    /// Create a double that auto-issues [`DEFAULT_ISSUED_CERT`] on approval.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            info: ClusterInfo {
                server: "https://10.0.0.1:6443".to_string(),
                ca_data: "c3R1YiBjYSBidW5kbGU=".to_string(),
            },
            issued_cert: DEFAULT_ISSUED_CERT.to_vec(),
            issue_after_fetches: 0,
            reject_approvals: false,
        }
    }

    /// Override the certificate handed out after approval.
    #[must_use]
    pub fn with_issued_certificate(mut self, pem: Vec<u8>) -> Self {
        self.issued_cert = pem;
        self
    }

    /// Leave the certificate field empty for the first `n` fetches after
    /// approval, simulating asynchronous issuance.
    #[must_use]
    pub fn with_issue_after_fetches(mut self, n: u32) -> Self {
        self.issue_after_fetches = n;
        self
    }

    /// Reject every approval, simulating signer policy.
    #[must_use]
    pub fn with_rejecting_approver(mut self) -> Self {
        self.reject_approvals = true;
        self
    }

    /// Whether a signing request named `name` currently exists.
    pub fn has_signing_request(&self, name: &str) -> bool {
        self.state.lock().requests.contains_key(name)
    }

    /// Whether a binding named `name` currently exists.
    pub fn has_binding(&self, name: &str) -> bool {
        self.state.lock().bindings.contains_key(name)
    }

    /// The envelope submitted under `name`, if any.
    pub fn submitted_envelope(&self, name: &str) -> Option<CsrDocument> {
        self.state
            .lock()
            .requests
            .get(name)
            .map(|r| r.envelope.clone())
    }

    /// The binding applied under `name`, if any.
    pub fn applied_binding(&self, name: &str) -> Option<BindingDocument> {
        self.state.lock().bindings.get(name).cloned()
    }
}

impl Default for InMemoryControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControlPlaneClient for InMemoryControlPlane {
    async fn delete_signing_request(&self, name: &str) -> Result<DeleteOutcome> {
        if self.state.lock().requests.remove(name).is_some() {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Absent)
        }
    }

    async fn submit_signing_request(&self, envelope: &CsrDocument) -> Result<()> {
        let mut state = self.state.lock();
        let name = envelope.metadata.name.clone();
        if state.requests.contains_key(&name) {
            return Err(Error::Submission(format!(
                "certificatesigningrequests \"{name}\" already exists"
            )));
        }
        state.requests.insert(
            name,
            StoredRequest {
                envelope: envelope.clone(),
                approved: false,
                fetches_until_issued: self.issue_after_fetches,
            },
        );
        Ok(())
    }

    async fn approve_signing_request(&self, name: &str) -> Result<()> {
        if self.reject_approvals {
            return Err(Error::Approval(format!(
                "signer refused to approve \"{name}\""
            )));
        }
        let mut state = self.state.lock();
        let request = state
            .requests
            .get_mut(name)
            .ok_or_else(|| Error::Approval(format!("csr \"{name}\" not found")))?;
        request.approved = true;
        Ok(())
    }

    async fn fetch_certificate(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut state = self.state.lock();
        let request = state
            .requests
            .get_mut(name)
            .ok_or_else(|| Error::ControlPlane(format!("csr \"{name}\" not found")))?;

        if !request.approved {
            return Ok(None);
        }
        if request.fetches_until_issued > 0 {
            request.fetches_until_issued -= 1;
            return Ok(None);
        }
        Ok(Some(self.issued_cert.clone()))
    }

    async fn cluster_info(&self) -> Result<ClusterInfo> {
        Ok(self.info.clone())
    }

    async fn apply_binding(&self, binding: &BindingDocument) -> Result<()> {
        self.state
            .lock()
            .bindings
            .insert(binding.metadata.name.clone(), binding.clone());
        Ok(())
    }

    async fn delete_binding(&self, name: &str) -> Result<DeleteOutcome> {
        if self.state.lock().bindings.remove(name).is_some() {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::Absent)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    fn envelope(name: &str) -> CsrDocument {
        CsrDocument::build(&Identity::new(name).unwrap(), b"csr", 86_400).unwrap()
    }

    #[tokio::test]
    async fn resubmitting_same_name_conflicts() {
        let plane = InMemoryControlPlane::new();
        plane.submit_signing_request(&envelope("alice")).await.unwrap();
        let second = plane.submit_signing_request(&envelope("alice")).await;
        assert!(matches!(second, Err(Error::Submission(_))));
    }

    #[tokio::test]
    async fn delete_reports_absent_for_unknown_name() {
        let plane = InMemoryControlPlane::new();
        let outcome = plane.delete_signing_request("ghost").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Absent);
    }

    #[tokio::test]
    async fn certificate_appears_only_after_approval() {
        let plane = InMemoryControlPlane::new();
        plane.submit_signing_request(&envelope("alice")).await.unwrap();

        assert!(plane.fetch_certificate("alice").await.unwrap().is_none());

        plane.approve_signing_request("alice").await.unwrap();
        let cert = plane.fetch_certificate("alice").await.unwrap();
        assert_eq!(cert.as_deref(), Some(DEFAULT_ISSUED_CERT));
    }

    #[tokio::test]
    async fn deferred_issuance_returns_none_for_first_fetches() {
        let plane = InMemoryControlPlane::new().with_issue_after_fetches(2);
        plane.submit_signing_request(&envelope("alice")).await.unwrap();
        plane.approve_signing_request("alice").await.unwrap();

        assert!(plane.fetch_certificate("alice").await.unwrap().is_none());
        assert!(plane.fetch_certificate("alice").await.unwrap().is_none());
        assert!(plane.fetch_certificate("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn approving_unknown_request_fails() {
        let plane = InMemoryControlPlane::new();
        let result = plane.approve_signing_request("ghost").await;
        assert!(matches!(result, Err(Error::Approval(_))));
    }
}
