//! Signing-request envelope — the `CertificateSigningRequest` document.
//!
//! Wraps raw CSR PEM bytes into the resource representation the cluster
//! API expects: base64 request, fixed client-auth signer and usages, and
//! the resolved validity duration.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::resources::Metadata;
use crate::{Error, Result};

/// API version of the signing-request resource.
pub const API_VERSION: &str = "certificates.k8s.io/v1";
/// Resource kind.
pub const KIND: &str = "CertificateSigningRequest";
/// Signer handling client certificates for API access.
pub const SIGNER_NAME: &str = "kubernetes.io/kube-apiserver-client";
/// Group claimed by the requesting subject.
pub const GROUPS: &[&str] = &["system:authenticated"];
/// Key usages for client authentication.
pub const USAGES: &[&str] = &["digital signature", "key encipherment", "client auth"];

// ─────────────────────────────────────────────────────────────────────────────
// Document model
// ─────────────────────────────────────────────────────────────────────────────

/// A complete `CertificateSigningRequest` resource document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrDocument {
    /// `apiVersion: certificates.k8s.io/v1`
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    /// `kind: CertificateSigningRequest`
    pub kind: String,
    /// Resource metadata; the name is the subject identity.
    pub metadata: Metadata,
    /// Request spec.
    pub spec: CsrSpec,
}

/// `spec` block of the signing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrSpec {
    /// Groups claimed by the requester.
    pub groups: Vec<String>,
    /// Base64 of the raw PEM CSR.
    pub request: String,
    /// Signer that will issue the certificate.
    pub signer_name: String,
    /// Requested validity in seconds.
    pub expiration_seconds: u32,
    /// Requested key usages.
    pub usages: Vec<String>,
}

impl CsrDocument {
    /// Build the envelope for `identity` from raw CSR PEM bytes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Submission` if `expiration_seconds` is zero — the
    /// control plane rejects non-positive validity, so the malformed
    /// envelope is refused before it leaves the process.
    pub fn build(identity: &Identity, csr_pem: &[u8], expiration_seconds: u32) -> Result<Self> {
        if expiration_seconds == 0 {
            return Err(Error::Submission(
                "expirationSeconds must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: Metadata {
                name: identity.csr_name().to_string(),
            },
            spec: CsrSpec {
                groups: GROUPS.iter().map(ToString::to_string).collect(),
                request: STANDARD.encode(csr_pem),
                signer_name: SIGNER_NAME.to_string(),
                expiration_seconds,
                usages: USAGES.iter().map(ToString::to_string).collect(),
            },
        })
    }

    /// Serialize to the YAML submission format.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use pretty_assertions::assert_eq;

    fn alice() -> Identity {
        Identity::new("alice").unwrap()
    }

    #[test]
    fn build_embeds_base64_request_and_fixed_constants() {
        // GIVEN: raw CSR bytes
        let doc = CsrDocument::build(&alice(), b"FAKE CSR PEM", 86_400).unwrap();
        // THEN: request round-trips through base64 and constants are pinned
        assert_eq!(STANDARD.decode(&doc.spec.request).unwrap(), b"FAKE CSR PEM");
        assert_eq!(doc.spec.signer_name, "kubernetes.io/kube-apiserver-client");
        assert_eq!(doc.spec.groups, vec!["system:authenticated"]);
        assert_eq!(
            doc.spec.usages,
            vec!["digital signature", "key encipherment", "client auth"]
        );
        assert_eq!(doc.metadata.name, "alice");
    }

    #[test]
    fn zero_expiration_is_rejected() {
        let result = CsrDocument::build(&alice(), b"x", 0);
        assert!(matches!(result, Err(Error::Submission(_))));
    }

    #[test]
    fn yaml_uses_camel_case_api_field_names() {
        let doc = CsrDocument::build(&alice(), b"x", 86_400).unwrap();
        let yaml = doc.to_yaml().unwrap();
        assert!(yaml.contains("apiVersion: certificates.k8s.io/v1"));
        assert!(yaml.contains("kind: CertificateSigningRequest"));
        assert!(yaml.contains("signerName: kubernetes.io/kube-apiserver-client"));
        assert!(yaml.contains("expirationSeconds: 86400"));
    }

    #[test]
    fn yaml_round_trips() {
        let doc = CsrDocument::build(&alice(), b"FAKE CSR PEM", 604_800).unwrap();
        let parsed: CsrDocument = serde_yaml::from_str(&doc.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }
}
