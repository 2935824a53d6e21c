//! Post-issuance integrity check.
//!
//! Confirms that a signed certificate and a private key form a matching
//! pair by fingerprinting the SubjectPublicKeyInfo on both sides: once
//! extracted from the certificate, once derived from the private key. The
//! check is advisory — the orchestrator surfaces a mismatch to the
//! operator but does not abort on it.

use sha2::{Digest, Sha256};
use x509_parser::pem::parse_x509_pem;

use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Report
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of an integrity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Hex SHA-256 of the certificate's SubjectPublicKeyInfo.
    pub certificate_fingerprint: String,
    /// Hex SHA-256 of the SubjectPublicKeyInfo derived from the key.
    pub key_fingerprint: String,
}

impl VerifyReport {
    /// `true` when the certificate embeds the key's public half.
    pub fn is_match(&self) -> bool {
        self.certificate_fingerprint == self.key_fingerprint
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Verification
// ─────────────────────────────────────────────────────────────────────────────

/// Fingerprint a certificate/key pair.
///
/// # Errors
///
/// Returns `Error::Verification` if either PEM input cannot be parsed.
pub fn verify_pair(cert_pem: &[u8], key_pem: &str) -> Result<VerifyReport> {
    Ok(VerifyReport {
        certificate_fingerprint: certificate_spki_fingerprint(cert_pem)?,
        key_fingerprint: key_spki_fingerprint(key_pem)?,
    })
}

/// SHA-256 over the SPKI block of a PEM certificate.
fn certificate_spki_fingerprint(cert_pem: &[u8]) -> Result<String> {
    let (_, pem) = parse_x509_pem(cert_pem)
        .map_err(|e| Error::Verification(format!("Cannot parse certificate PEM: {e}")))?;
    let cert = pem
        .parse_x509()
        .map_err(|e| Error::Verification(format!("Cannot parse certificate: {e}")))?;
    Ok(fingerprint(cert.public_key().raw))
}

/// SHA-256 over the SPKI derived from a PEM private key.
fn key_spki_fingerprint(key_pem: &str) -> Result<String> {
    use rcgen::PublicKeyData as _;
    let key_pair = rcgen::KeyPair::from_pem(key_pem)
        .map_err(|e| Error::Verification(format!("Cannot parse private key: {e}")))?;
    Ok(fingerprint(&key_pair.subject_public_key_info()))
}

fn fingerprint(spki_der: &[u8]) -> String {
    hex::encode(Sha256::digest(spki_der))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
