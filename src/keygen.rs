//! Key material generation — private key plus certificate signing request.
//!
//! Two backends sit behind the [`KeyMaterialGenerator`] trait:
//!
//! - [`RcgenGenerator`] — in-process `rcgen` generation (ECDSA P-256),
//!   no external tooling required. This is the default.
//! - [`OpensslGenerator`] — drives the system `openssl` binary
//!   (RSA-4096, PKCS#8) for operators that require RSA keys.
//!
//! Both write `<user>.key` and `<user>.csr` into the identity's artifact
//! directory and hand the PEM bytes back for the envelope builder.
//!
//! Generation failures are terminal: the orchestrator aborts, no retries.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use tracing::{debug, info};

use crate::identity::Identity;
use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Generated material
// ─────────────────────────────────────────────────────────────────────────────

/// Private key and CSR produced for one identity, in PEM form, already
/// persisted to the artifact directory.
#[derive(Debug)]
pub struct KeyMaterial {
    /// PEM-encoded private key.
    pub key_pem: String,
    /// PEM-encoded certificate signing request.
    pub csr_pem: String,
    /// Path of the written `<user>.key` file.
    pub key_path: PathBuf,
    /// Path of the written `<user>.csr` file.
    pub csr_path: PathBuf,
}

/// A source of key pairs and CSRs bound to a subject identity.
///
/// Implementations must be `Send + Sync + 'static` so they can be stored in
/// `Arc<dyn KeyMaterialGenerator>` and shared with the orchestrator.
#[async_trait]
pub trait KeyMaterialGenerator: Send + Sync + 'static {
    /// Generate a key pair and CSR with subject `CN=<identity>` and write
    /// both artifacts into `dir`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Generation` if the cryptographic backend is
    /// unavailable or the directory is not writable.
    async fn generate(&self, identity: &Identity, dir: &Path) -> Result<KeyMaterial>;
}

// ─────────────────────────────────────────────────────────────────────────────
// rcgen backend (default)
// ─────────────────────────────────────────────────────────────────────────────

/// In-process generator backed by `rcgen` (ECDSA P-256).
#[derive(Debug, Default)]
pub struct RcgenGenerator;

#[async_trait]
impl KeyMaterialGenerator for RcgenGenerator {
    async fn generate(&self, identity: &Identity, dir: &Path) -> Result<KeyMaterial> {
        info!(user = %identity, backend = "rcgen", "Generating private key and CSR");

        let key_pair = KeyPair::generate()
            .map_err(|e| Error::Generation(format!("Key generation failed: {e}")))?;

        let mut params = CertificateParams::default();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, identity.name());
        params.distinguished_name = dn;

        let csr = params
            .serialize_request(&key_pair)
            .map_err(|e| Error::Generation(format!("CSR generation failed: {e}")))?;
        let csr_pem = csr
            .pem()
            .map_err(|e| Error::Generation(format!("CSR PEM encoding failed: {e}")))?;

        let key_pem = key_pair.serialize_pem();

        write_material(identity, dir, &key_pem, &csr_pem)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// openssl backend
// ─────────────────────────────────────────────────────────────────────────────

/// System-toolchain generator driving the `openssl` binary (RSA-4096).
///
/// Keys are emitted in PKCS#8 (`genpkey`) so downstream parsing does not
/// have to deal with the legacy PKCS#1 container.
#[derive(Debug, Clone)]
pub struct OpensslGenerator {
    openssl_path: String,
}

impl OpensslGenerator {
    /// Create a generator using `openssl_path` as the binary to invoke.
    pub fn new(openssl_path: impl Into<String>) -> Self {
        Self {
            openssl_path: openssl_path.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<()> {
        debug!(openssl = %self.openssl_path, ?args, "Invoking openssl");
        let output = tokio::process::Command::new(&self.openssl_path)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                Error::Generation(format!("Cannot run '{}': {e}", self.openssl_path))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Generation(format!(
                "openssl {} failed: {}",
                args.first().unwrap_or(&""),
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl Default for OpensslGenerator {
    fn default() -> Self {
        Self::new("openssl")
    }
}

#[async_trait]
impl KeyMaterialGenerator for OpensslGenerator {
    async fn generate(&self, identity: &Identity, dir: &Path) -> Result<KeyMaterial> {
        info!(user = %identity, backend = "openssl", "Generating private key and CSR");

        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Generation(format!("Cannot create '{}': {e}", dir.display())))?;

        let key_path = dir.join(identity.key_file());
        let csr_path = dir.join(identity.csr_file());
        let key_str = key_path.to_string_lossy().into_owned();
        let csr_str = csr_path.to_string_lossy().into_owned();
        let subject = format!("/CN={}", identity.name());

        self.run(&[
            "genpkey",
            "-algorithm",
            "RSA",
            "-pkeyopt",
            "rsa_keygen_bits:4096",
            "-out",
            key_str.as_str(),
        ])
        .await?;

        self.run(&[
            "req",
            "-new",
            "-key",
            key_str.as_str(),
            "-subj",
            subject.as_str(),
            "-out",
            csr_str.as_str(),
        ])
        .await?;

        let key_pem = std::fs::read_to_string(&key_path)
            .map_err(|e| Error::Generation(format!("Cannot read generated key: {e}")))?;
        let csr_pem = std::fs::read_to_string(&csr_path)
            .map_err(|e| Error::Generation(format!("Cannot read generated CSR: {e}")))?;

        debug!(key = %key_path.display(), csr = %csr_path.display(), "Key material written");

        Ok(KeyMaterial {
            key_pem,
            csr_pem,
            key_path,
            csr_path,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Private helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Persist already-generated PEM material into the artifact directory.
fn write_material(
    identity: &Identity,
    dir: &Path,
    key_pem: &str,
    csr_pem: &str,
) -> Result<KeyMaterial> {
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Generation(format!("Cannot create '{}': {e}", dir.display())))?;

    let key_path = dir.join(identity.key_file());
    let csr_path = dir.join(identity.csr_file());

    std::fs::write(&key_path, key_pem)
        .map_err(|e| Error::Generation(format!("Cannot write key: {e}")))?;
    std::fs::write(&csr_path, csr_pem)
        .map_err(|e| Error::Generation(format!("Cannot write CSR: {e}")))?;

    debug!(key = %key_path.display(), csr = %csr_path.display(), "Key material written");

    Ok(KeyMaterial {
        key_pem: key_pem.to_string(),
        csr_pem: csr_pem.to_string(),
        key_path,
        csr_path,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> Identity {
        Identity::new(name).unwrap()
    }

    #[tokio::test]
    async fn rcgen_generates_pem_key_and_csr() {
        // GIVEN: an empty artifact directory
        let dir = tempfile::tempdir().unwrap();
        // WHEN: generating for alice
        let material = RcgenGenerator
            .generate(&identity("alice"), dir.path())
            .await
            .unwrap();
        // THEN: PEM blocks present
        assert!(material.key_pem.contains("PRIVATE KEY"));
        assert!(material.csr_pem.contains("CERTIFICATE REQUEST"));
    }

    #[tokio::test]
    async fn rcgen_writes_key_and_csr_files() {
        let dir = tempfile::tempdir().unwrap();
        let material = RcgenGenerator
            .generate(&identity("alice"), dir.path())
            .await
            .unwrap();

        assert!(dir.path().join("alice.key").exists());
        assert!(dir.path().join("alice.csr").exists());
        assert_eq!(material.key_path, dir.path().join("alice.key"));
    }

    #[tokio::test]
    async fn rcgen_generates_unique_keys_on_each_call() {
        let dir = tempfile::tempdir().unwrap();
        let id = identity("alice");
        let first = RcgenGenerator.generate(&id, dir.path()).await.unwrap();
        let second = RcgenGenerator.generate(&id, dir.path()).await.unwrap();
        assert_ne!(first.key_pem, second.key_pem);
    }

    #[tokio::test]
    async fn unwritable_directory_is_a_generation_error() {
        // GIVEN: a "directory" path that is actually a file
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let result = RcgenGenerator
            .generate(&identity("alice"), &blocker.join("sub"))
            .await;

        assert!(matches!(result, Err(Error::Generation(_))));
    }

    #[tokio::test]
    async fn missing_openssl_binary_is_a_generation_error() {
        let dir = tempfile::tempdir().unwrap();
        let generator = OpensslGenerator::new("/nonexistent/openssl");
        let result = generator.generate(&identity("alice"), dir.path()).await;
        assert!(matches!(result, Err(Error::Generation(_))));
    }
}
