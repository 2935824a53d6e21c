//! Access profile assembly — the kubeconfig `Config` document.
//!
//! A pure function of (certificate, key, cluster endpoint, CA data,
//! identity): identical inputs always produce an identical document. The
//! certificate and key are embedded base64; the CA data arrives already
//! base64-encoded from the control plane and is passed through untouched.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::identity::Identity;

/// Cluster entry name used in the generated profile.
pub const CLUSTER_NAME: &str = "cluster";

// ─────────────────────────────────────────────────────────────────────────────
// Document model
// ─────────────────────────────────────────────────────────────────────────────

/// A complete kubeconfig `Config` document for a single identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubeconfigDocument {
    /// `apiVersion: v1`
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    /// `kind: Config`
    pub kind: String,
    /// Cluster entries (exactly one).
    pub clusters: Vec<ClusterEntry>,
    /// User entries (exactly one).
    pub users: Vec<UserEntry>,
    /// Context entries (exactly one, `<user>@cluster`).
    pub contexts: Vec<ContextEntry>,
    /// `current-context: <user>@cluster`
    #[serde(rename = "current-context")]
    pub current_context: String,
}

/// Named cluster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEntry {
    /// Entry name.
    pub name: String,
    /// Connection details.
    pub cluster: ClusterDetails,
}

/// Endpoint and trust anchor of the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDetails {
    /// API server URL.
    pub server: String,
    /// Base64 CA bundle.
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: String,
}

/// Named user entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Entry name (the identity).
    pub name: String,
    /// Client credentials.
    pub user: UserDetails,
}

/// Embedded client credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetails {
    /// Base64 client certificate PEM.
    #[serde(rename = "client-certificate-data")]
    pub client_certificate_data: String,
    /// Base64 client key PEM.
    #[serde(rename = "client-key-data")]
    pub client_key_data: String,
}

/// Named context entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Entry name (`<user>@cluster`).
    pub name: String,
    /// Cluster/user pair.
    pub context: ContextDetails,
}

/// The cluster/user pair a context selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDetails {
    /// Referenced cluster entry.
    pub cluster: String,
    /// Referenced user entry.
    pub user: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Assembly
// ─────────────────────────────────────────────────────────────────────────────

impl KubeconfigDocument {
    /// Assemble a self-contained access profile.
    ///
    /// `ca_data` must already be base64 (as returned by the control plane);
    /// `cert_pem` and `key_pem` are raw PEM bytes and are encoded here.
    pub fn assemble(
        identity: &Identity,
        cert_pem: &[u8],
        key_pem: &[u8],
        server: &str,
        ca_data: &str,
    ) -> Self {
        let context = identity.context_name();
        Self {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            clusters: vec![ClusterEntry {
                name: CLUSTER_NAME.to_string(),
                cluster: ClusterDetails {
                    server: server.to_string(),
                    certificate_authority_data: ca_data.to_string(),
                },
            }],
            users: vec![UserEntry {
                name: identity.name().to_string(),
                user: UserDetails {
                    client_certificate_data: STANDARD.encode(cert_pem),
                    client_key_data: STANDARD.encode(key_pem),
                },
            }],
            contexts: vec![ContextEntry {
                name: context.clone(),
                context: ContextDetails {
                    cluster: CLUSTER_NAME.to_string(),
                    user: identity.name().to_string(),
                },
            }],
            current_context: context,
        }
    }

    /// Serialize to YAML.
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

    fn sample() -> KubeconfigDocument {
        KubeconfigDocument::assemble(
            &alice(),
            b"CERT PEM",
            b"KEY PEM",
            "https://10.0.0.1:6443",
            "Q0EgREFUQQ==",
        )
    }

    #[test]
    fn current_context_is_user_at_cluster() {
        let doc = sample();
        assert_eq!(doc.current_context, "alice@cluster");
        assert_eq!(doc.contexts[0].name, "alice@cluster");
        assert_eq!(doc.contexts[0].context.cluster, "cluster");
        assert_eq!(doc.contexts[0].context.user, "alice");
    }

    #[test]
    fn credentials_are_base64_of_the_pem_inputs() {
        let doc = sample();
        let user = &doc.users[0].user;
        assert_eq!(STANDARD.decode(&user.client_certificate_data).unwrap(), b"CERT PEM");
        assert_eq!(STANDARD.decode(&user.client_key_data).unwrap(), b"KEY PEM");
    }

    #[test]
    fn ca_data_passes_through_unmodified() {
        let doc = sample();
        assert_eq!(doc.clusters[0].cluster.certificate_authority_data, "Q0EgREFUQQ==");
        assert_eq!(doc.clusters[0].cluster.server, "https://10.0.0.1:6443");
    }

    #[test]
    fn assembly_is_deterministic() {
        // Pure function: identical inputs, byte-identical output.
        assert_eq!(sample().to_yaml().unwrap(), sample().to_yaml().unwrap());
    }

    #[test]
    fn yaml_uses_kebab_case_field_names() {
        let yaml = sample().to_yaml().unwrap();
        assert!(yaml.contains("certificate-authority-data:"));
        assert!(yaml.contains("client-certificate-data:"));
        assert!(yaml.contains("client-key-data:"));
        assert!(yaml.contains("current-context: alice@cluster"));
    }
}
