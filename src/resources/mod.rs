//! Control-plane resource documents.
//!
//! Serde models for the three YAML documents the workflow produces: the
//! signing-request envelope, the ClusterRoleBinding, and the kubeconfig
//! access profile. Field names are pinned with serde renames so the emitted
//! documents match the cluster API shapes byte-for-byte.

pub mod binding;
pub mod csr;
pub mod kubeconfig;

pub use binding::BindingDocument;
pub use csr::CsrDocument;
pub use kubeconfig::KubeconfigDocument;

use serde::{Deserialize, Serialize};

/// `metadata` block shared by the cluster resource documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Resource name.
    pub name: String,
}
