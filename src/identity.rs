//! Subject identity — the single name everything else derives from.
//!
//! One `Identity` names the certificate Common Name, the signing-request
//! resource, the ClusterRoleBinding subject, and the local artifact
//! directory. Validation therefore has to satisfy the strictest consumer:
//! the name must be a safe filesystem path segment *and* a valid cluster
//! resource name.

use std::fmt;

use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// A validated subject name.
///
/// Derived names (`csr_name`, `binding_name`, `context_name`, artifact file
/// names) are methods rather than stored fields so two `Identity` values
/// with the same name are always interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Validate and wrap a subject name.
    ///
    /// # Errors
    ///
    /// Returns `Error::Identity` if the name is empty, contains path
    /// separators, whitespace or control characters, or is a dot segment.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(Error::Identity("name must not be empty".to_string()));
        }
        if name == "." || name == ".." {
            return Err(Error::Identity(format!(
                "'{name}' is not a usable path segment"
            )));
        }
        if let Some(c) = name
            .chars()
            .find(|c| matches!(c, '/' | '\\' | ':') || c.is_whitespace() || c.is_control())
        {
            return Err(Error::Identity(format!(
                "name '{name}' contains forbidden character {c:?}"
            )));
        }

        Ok(Self(name))
    }

    /// The raw subject name (certificate CN).
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Signing-request resource name (same as the subject name).
    pub fn csr_name(&self) -> &str {
        &self.0
    }

    /// ClusterRoleBinding resource name: `crb-<name>`.
    pub fn binding_name(&self) -> String {
        format!("crb-{}", self.0)
    }

    /// Kubeconfig context name: `<name>@cluster`.
    pub fn context_name(&self) -> String {
        format!("{}@cluster", self.0)
    }

    /// Private key artifact file name: `<name>.key`.
    pub fn key_file(&self) -> String {
        format!("{}.key", self.0)
    }

    /// CSR artifact file name: `<name>.csr`.
    pub fn csr_file(&self) -> String {
        format!("{}.csr", self.0)
    }

    /// Request envelope artifact file name: `<name>-csr.yaml`.
    pub fn envelope_file(&self) -> String {
        format!("{}-csr.yaml", self.0)
    }

    /// Signed certificate artifact file name: `<name>.crt`.
    pub fn cert_file(&self) -> String {
        format!("{}.crt", self.0)
    }

    /// Access profile artifact file name: `<name>-kubeconfig.yaml`.
    pub fn kubeconfig_file(&self) -> String {
        format!("{}-kubeconfig.yaml", self.0)
    }

    /// Authorization binding artifact file name: `<name>-crb.yaml`.
    pub fn binding_file(&self) -> String {
        format!("{}-crb.yaml", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_user_name() {
        let id = Identity::new("alice").unwrap();
        assert_eq!(id.name(), "alice");
    }

    #[test]
    fn accepts_dns_style_names() {
        assert!(Identity::new("deploy-bot.ci").is_ok());
        assert!(Identity::new("team_ops-01").is_ok());
    }

    #[test]
    fn rejects_empty_name() {
        assert!(Identity::new("").is_err());
    }

    #[test]
    fn rejects_path_separators() {
        assert!(Identity::new("a/b").is_err());
        assert!(Identity::new("a\\b").is_err());
    }

    #[test]
    fn rejects_dot_segments() {
        assert!(Identity::new(".").is_err());
        assert!(Identity::new("..").is_err());
    }

    #[test]
    fn rejects_whitespace_and_control_chars() {
        assert!(Identity::new("a b").is_err());
        assert!(Identity::new("a\tb").is_err());
        assert!(Identity::new("a\nb").is_err());
    }

    #[test]
    fn derived_names_follow_the_subject() {
        // GIVEN: a validated identity
        let id = Identity::new("alice").unwrap();
        // THEN: every derived name embeds the subject
        assert_eq!(id.binding_name(), "crb-alice");
        assert_eq!(id.context_name(), "alice@cluster");
        assert_eq!(id.key_file(), "alice.key");
        assert_eq!(id.csr_file(), "alice.csr");
        assert_eq!(id.envelope_file(), "alice-csr.yaml");
        assert_eq!(id.cert_file(), "alice.crt");
        assert_eq!(id.kubeconfig_file(), "alice-kubeconfig.yaml");
        assert_eq!(id.binding_file(), "alice-crb.yaml");
    }
}
