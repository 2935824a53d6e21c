//! Authorization binding — the `ClusterRoleBinding` document.
//!
//! Associates the issued identity with a cluster role. One binding per
//! identity, named `crb-<user>`, independently deletable.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::identity::Identity;
use crate::resources::Metadata;

/// API group of RBAC resources.
pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";
/// API version of the binding resource.
pub const API_VERSION: &str = "rbac.authorization.k8s.io/v1";
/// Resource kind.
pub const KIND: &str = "ClusterRoleBinding";

// ─────────────────────────────────────────────────────────────────────────────
// Document model
// ─────────────────────────────────────────────────────────────────────────────

/// A complete `ClusterRoleBinding` resource document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingDocument {
    /// `apiVersion: rbac.authorization.k8s.io/v1`
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    /// `kind: ClusterRoleBinding`
    pub kind: String,
    /// Resource metadata; the name is `crb-<user>`.
    pub metadata: Metadata,
    /// Bound subjects — exactly one `User` entry for the identity.
    pub subjects: Vec<Subject>,
    /// Referenced cluster role.
    #[serde(rename = "roleRef")]
    pub role_ref: RoleRef,
}

/// A subject entry of the binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Subject kind, always `User`.
    pub kind: String,
    /// Subject name (the identity).
    pub name: String,
    /// `apiGroup: rbac.authorization.k8s.io`
    #[serde(rename = "apiGroup")]
    pub api_group: String,
}

/// The `roleRef` block of the binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    /// Role kind, always `ClusterRole`.
    pub kind: String,
    /// Cluster role name being granted.
    pub name: String,
    /// `apiGroup: rbac.authorization.k8s.io`
    #[serde(rename = "apiGroup")]
    pub api_group: String,
}

impl BindingDocument {
    /// Build the binding granting `role` to `identity`.
    pub fn build(identity: &Identity, role: &str) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: Metadata {
                name: identity.binding_name(),
            },
            subjects: vec![Subject {
                kind: "User".to_string(),
                name: identity.name().to_string(),
                api_group: RBAC_API_GROUP.to_string(),
            }],
            role_ref: RoleRef {
                kind: "ClusterRole".to_string(),
                name: role.to_string(),
                api_group: RBAC_API_GROUP.to_string(),
            },
        }
    }

    /// Serialize to the YAML submission format.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
