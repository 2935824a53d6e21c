//! Real control-plane client driving the `kubectl` binary.
//!
//! Each contract operation maps to one `kubectl` invocation; documents are
//! piped through stdin (`apply -f -`) so nothing extra touches the
//! filesystem, and status reads use `-o json` so responses are parsed
//! structurally instead of scraping text output.

use std::process::Stdio;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::client::{ClusterInfo, ControlPlaneClient, DeleteOutcome};
use crate::resources::{BindingDocument, CsrDocument};
use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Control-plane client shelling out to `kubectl`.
#[derive(Debug, Clone)]
pub struct KubectlClient {
    kubectl_path: String,
}

impl KubectlClient {
    /// Create a client invoking `kubectl_path`.
    pub fn new(kubectl_path: impl Into<String>) -> Self {
        Self {
            kubectl_path: kubectl_path.into(),
        }
    }

    async fn run(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<CommandResult> {
        debug!(kubectl = %self.kubectl_path, ?args, "Invoking kubectl");

        let mut command = tokio::process::Command::new(&self.kubectl_path);
        command
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = if let Some(input) = stdin {
            command.stdin(Stdio::piped());
            let mut child = command
                .spawn()
                .map_err(|e| Error::ControlPlane(format!("Cannot run '{}': {e}", self.kubectl_path)))?;
            if let Some(mut handle) = child.stdin.take() {
                handle.write_all(input).await?;
            }
            child.wait_with_output().await?
        } else {
            command
                .output()
                .await
                .map_err(|e| Error::ControlPlane(format!("Cannot run '{}': {e}", self.kubectl_path)))?
        };

        Ok(CommandResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn delete_resource(&self, kind: &str, name: &str) -> Result<DeleteOutcome> {
        let result = self.run(&["delete", kind, name], None).await?;
        if result.success {
            return Ok(DeleteOutcome::Deleted);
        }
        if is_not_found(&result.stderr) {
            return Ok(DeleteOutcome::Absent);
        }
        Err(Error::ControlPlane(format!(
            "delete {kind}/{name} failed: {}",
            result.stderr.trim()
        )))
    }
}

impl Default for KubectlClient {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

#[async_trait]
impl ControlPlaneClient for KubectlClient {
    async fn delete_signing_request(&self, name: &str) -> Result<DeleteOutcome> {
        self.delete_resource("csr", name).await
    }

    async fn submit_signing_request(&self, envelope: &CsrDocument) -> Result<()> {
        let yaml = envelope.to_yaml()?;
        let result = self.run(&["apply", "-f", "-"], Some(yaml.as_bytes())).await?;
        if result.success {
            Ok(())
        } else {
            Err(Error::Submission(result.stderr.trim().to_string()))
        }
    }

    async fn approve_signing_request(&self, name: &str) -> Result<()> {
        let result = self.run(&["certificate", "approve", name], None).await?;
        if result.success {
            Ok(())
        } else {
            Err(Error::Approval(result.stderr.trim().to_string()))
        }
    }

    async fn fetch_certificate(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let result = self.run(&["get", "csr", name, "-o", "json"], None).await?;
        if !result.success {
            return Err(Error::ControlPlane(format!(
                "get csr/{name} failed: {}",
                result.stderr.trim()
            )));
        }

        let doc: serde_json::Value = serde_json::from_str(&result.stdout)?;
        let Some(cert_b64) = doc
            .pointer("/status/certificate")
            .and_then(serde_json::Value::as_str)
        else {
            return Ok(None);
        };

        let pem = STANDARD
            .decode(cert_b64)
            .map_err(|e| Error::ControlPlane(format!("Malformed certificate field: {e}")))?;
        Ok(Some(pem))
    }

    async fn cluster_info(&self) -> Result<ClusterInfo> {
        let result = self
            .run(&["config", "view", "--minify", "--raw", "-o", "json"], None)
            .await?;
        if !result.success {
            return Err(Error::ControlPlane(format!(
                "config view failed: {}",
                result.stderr.trim()
            )));
        }

        let doc: serde_json::Value = serde_json::from_str(&result.stdout)?;
        let server = doc
            .pointer("/clusters/0/cluster/server")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| Error::ControlPlane("No cluster server in kubeconfig".to_string()))?;
        let ca_data = doc
            .pointer("/clusters/0/cluster/certificate-authority-data")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                Error::ControlPlane("No certificate-authority-data in kubeconfig".to_string())
            })?;

        Ok(ClusterInfo {
            server: server.to_string(),
            ca_data: ca_data.to_string(),
        })
    }

    async fn apply_binding(&self, binding: &BindingDocument) -> Result<()> {
        let yaml = binding.to_yaml()?;
        let result = self.run(&["apply", "-f", "-"], Some(yaml.as_bytes())).await?;
        if result.success {
            Ok(())
        } else {
            Err(Error::ControlPlane(format!(
                "apply binding failed: {}",
                result.stderr.trim()
            )))
        }
    }

    async fn delete_binding(&self, name: &str) -> Result<DeleteOutcome> {
        self.delete_resource("clusterrolebinding", name).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Private helpers
// ─────────────────────────────────────────────────────────────────────────────

struct CommandResult {
    success: bool,
    stdout: String,
    stderr: String,
}

/// Classify a kubectl failure as "target absent".
///
/// kubectl reports missing resources as
/// `Error from server (NotFound): ... "<name>" not found`.
fn is_not_found(stderr: &str) -> bool {
    stderr.contains("(NotFound)") || stderr.contains("not found")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_stderr_is_classified_as_absent() {
        let stderr = r#"Error from server (NotFound): certificatesigningrequests.certificates.k8s.io "alice" not found"#;
        assert!(is_not_found(stderr));
    }

    #[test]
    fn other_failures_are_not_classified_as_absent() {
        assert!(!is_not_found("Unable to connect to the server: dial tcp: lookup cluster"));
        assert!(!is_not_found("error: You must be logged in to the server"));
    }

    #[tokio::test]
    async fn missing_kubectl_binary_is_a_control_plane_error() {
        let client = KubectlClient::new("/nonexistent/kubectl");
        let result = client.delete_signing_request("alice").await;
        assert!(matches!(result, Err(Error::ControlPlane(_))));
    }
}
