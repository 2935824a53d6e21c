//! Issuance workflow.
//!
//! Fixed sequence per invocation, no internal parallelism:
//!
//! ```text
//! generate key+CSR → build envelope → delete stale CSR (idempotent)
//!   → submit → approve → fetch certificate (bounded poll)
//!   → assemble kubeconfig → apply role binding → [verify]
//! ```
//!
//! Every step after key generation aborts the run on failure; nothing is
//! rolled back — partially created remote resources are the operator's to
//! clean up via revocation. The delete-before-submit step is the only one
//! that tolerates absence: it exists to avoid "already exists" conflicts,
//! not because the control plane requires it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::{debug, error, info, warn};

use crate::client::ControlPlaneClient;
use crate::identity::Identity;
use crate::keygen::KeyMaterialGenerator;
use crate::resources::{BindingDocument, CsrDocument, KubeconfigDocument};
use crate::verify::{VerifyReport, verify_pair};
use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Options / report
// ─────────────────────────────────────────────────────────────────────────────

/// Parameters of one issuance run.
#[derive(Debug, Clone)]
pub struct IssueOptions {
    /// Subject identity.
    pub identity: Identity,
    /// Base output directory; artifacts land in `<output_dir>/<user>/`.
    pub output_dir: PathBuf,
    /// Resolved validity in seconds.
    pub expiration_seconds: u32,
    /// Cluster role to bind.
    pub role: String,
    /// Run the advisory integrity check after issuance.
    pub verify: bool,
}

/// Artifacts produced by a successful issuance run.
#[derive(Debug)]
pub struct IssueReport {
    /// Per-identity artifact directory.
    pub artifact_dir: PathBuf,
    /// Signed certificate path (`<user>.crt`).
    pub cert_path: PathBuf,
    /// Access profile path (`<user>-kubeconfig.yaml`).
    pub kubeconfig_path: PathBuf,
    /// Binding document path (`<user>-crb.yaml`).
    pub binding_path: PathBuf,
    /// Advisory integrity result, if requested and runnable.
    pub verification: Option<VerifyReport>,
}

/// Bounds of the post-approval certificate poll.
///
/// The control plane may issue asynchronously after approval, so the fetch
/// retries while the certificate field is empty — but never indefinitely.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: usize,
    /// Initial backoff delay.
    pub min_delay: Duration,
    /// Backoff delay cap.
    pub max_delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Drives the issuance sequence against a control plane and key backend.
pub struct IssuanceOrchestrator {
    client: Arc<dyn ControlPlaneClient>,
    generator: Arc<dyn KeyMaterialGenerator>,
    poll: PollPolicy,
}

impl IssuanceOrchestrator {
    /// Create an orchestrator with the default poll policy.
    pub fn new(
        client: Arc<dyn ControlPlaneClient>,
        generator: Arc<dyn KeyMaterialGenerator>,
    ) -> Self {
        Self {
            client,
            generator,
            poll: PollPolicy::default(),
        }
    }

    /// Replace the certificate-fetch poll bounds.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Run the full issuance sequence.
    ///
    /// # Errors
    ///
    /// Propagates the first failing step's error; the log line emitted by
    /// [`abort`] names the step.
    pub async fn run(&self, options: &IssueOptions) -> Result<IssueReport> {
        let identity = &options.identity;
        let dir = options.output_dir.join(identity.name());
        std::fs::create_dir_all(&dir).map_err(|e| abort("prepare", e.into()))?;

        // 1. Key material
        let material = self
            .generator
            .generate(identity, &dir)
            .await
            .map_err(|e| abort("generate", e))?;

        // 2. Request envelope
        info!(step = "envelope", user = %identity, expiration_seconds = options.expiration_seconds,
            "Building signing-request envelope");
        let envelope =
            CsrDocument::build(identity, material.csr_pem.as_bytes(), options.expiration_seconds)
                .map_err(|e| abort("envelope", e))?;
        let envelope_path = dir.join(identity.envelope_file());
        std::fs::write(&envelope_path, envelope.to_yaml().map_err(|e| abort("envelope", e))?)
            .map_err(|e| abort("envelope", e.into()))?;

        // 3. Conflict avoidance: drop any stale request with the same name.
        match self
            .client
            .delete_signing_request(identity.csr_name())
            .await
            .map_err(|e| abort("delete-stale", e))?
        {
            crate::client::DeleteOutcome::Deleted => {
                info!(step = "delete-stale", user = %identity, "Removed pre-existing signing request");
            }
            crate::client::DeleteOutcome::Absent => {
                debug!(step = "delete-stale", user = %identity, "No pre-existing signing request");
            }
        }

        // 4. Submit
        info!(step = "submit", user = %identity, "Submitting signing request");
        self.client
            .submit_signing_request(&envelope)
            .await
            .map_err(|e| abort("submit", e))?;

        // 5. Approve
        info!(step = "approve", user = %identity, "Approving signing request");
        self.client
            .approve_signing_request(identity.csr_name())
            .await
            .map_err(|e| abort("approve", e))?;

        // 6. Fetch the signed certificate (bounded poll)
        info!(step = "fetch", user = %identity, "Fetching signed certificate");
        let cert_pem = self
            .fetch_certificate_bounded(identity)
            .await
            .map_err(|e| abort("fetch", e))?;
        let cert_path = dir.join(identity.cert_file());
        std::fs::write(&cert_path, &cert_pem).map_err(|e| abort("fetch", e.into()))?;

        // 7. Access profile
        info!(step = "kubeconfig", user = %identity, "Assembling access profile");
        let cluster = self
            .client
            .cluster_info()
            .await
            .map_err(|e| abort("kubeconfig", e))?;
        let kubeconfig = KubeconfigDocument::assemble(
            identity,
            &cert_pem,
            material.key_pem.as_bytes(),
            &cluster.server,
            &cluster.ca_data,
        );
        let kubeconfig_path = dir.join(identity.kubeconfig_file());
        std::fs::write(
            &kubeconfig_path,
            kubeconfig.to_yaml().map_err(|e| abort("kubeconfig", e))?,
        )
        .map_err(|e| abort("kubeconfig", e.into()))?;

        // 8. Authorization binding
        info!(step = "bind", user = %identity, role = %options.role, "Applying role binding");
        let binding = BindingDocument::build(identity, &options.role);
        let binding_path = dir.join(identity.binding_file());
        std::fs::write(&binding_path, binding.to_yaml().map_err(|e| abort("bind", e))?)
            .map_err(|e| abort("bind", e.into()))?;
        self.client
            .apply_binding(&binding)
            .await
            .map_err(|e| abort("bind", e))?;

        // 9. Optional advisory verification — never gates success.
        let verification = if options.verify {
            self.run_verification(identity, &cert_pem, &material.key_pem)
        } else {
            None
        };

        info!(user = %identity, kubeconfig = %kubeconfig_path.display(), "Issuance complete");

        Ok(IssueReport {
            artifact_dir: dir,
            cert_path,
            kubeconfig_path,
            binding_path,
            verification,
        })
    }

    /// Poll the certificate field with exponential backoff until it is
    /// populated or the bound is exhausted.
    async fn fetch_certificate_bounded(&self, identity: &Identity) -> Result<Vec<u8>> {
        let name = identity.csr_name().to_string();
        let fetch = || async {
            match self.client.fetch_certificate(&name).await? {
                Some(pem) => Ok(pem),
                None => Err(Error::Pending(name.clone())),
            }
        };

        fetch
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(self.poll.min_delay)
                    .with_max_delay(self.poll.max_delay)
                    .with_max_times(self.poll.max_retries),
            )
            .when(|e| matches!(e, Error::Pending(_)))
            .notify(|err, delay| {
                debug!(error = %err, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Certificate not ready, retrying");
            })
            .await
            .map_err(|e| match e {
                Error::Pending(name) => {
                    Error::Timeout(format!("certificate for '{name}' was never issued"))
                }
                other => other,
            })
    }

    /// Run the advisory integrity check; failures are logged, not raised.
    fn run_verification(
        &self,
        identity: &Identity,
        cert_pem: &[u8],
        key_pem: &str,
    ) -> Option<VerifyReport> {
        match verify_pair(cert_pem, key_pem) {
            Ok(report) => {
                if report.is_match() {
                    info!(step = "verify", user = %identity,
                        fingerprint = %report.certificate_fingerprint, "Certificate/key pair matches");
                } else {
                    warn!(step = "verify", user = %identity,
                        cert_fingerprint = %report.certificate_fingerprint,
                        key_fingerprint = %report.key_fingerprint,
                        "Certificate/key pair MISMATCH");
                }
                Some(report)
            }
            Err(e) => {
                warn!(step = "verify", user = %identity, error = %e,
                    "Integrity check could not run");
                None
            }
        }
    }
}

/// Log the failing step and pass the error through unchanged.
fn abort(step: &str, e: Error) -> Error {
    error!(step, error = %e, "Issuance aborted");
    e
}
