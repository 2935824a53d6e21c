//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::expiration::ValidityProfile;

/// Kubernetes x509 client-certificate issuance via the cluster CSR API
#[derive(Parser, Debug)]
#[command(name = "kubecert")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Username to include in the certificate CN
    #[arg(long, required = true)]
    pub user: String,

    /// Delete the user's CSR, role binding, and local files instead of issuing
    #[arg(long)]
    pub delete: bool,

    /// Output directory for per-user artifacts
    #[arg(long, default_value = "./export", env = "KUBECERT_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Explicit expiration in seconds (wins over --expire-profile; 0 = unset)
    #[arg(long)]
    pub expire: Option<u32>,

    /// Predefined expiration profile
    #[arg(long, value_enum, default_value = "default")]
    pub expire_profile: ValidityProfile,

    /// ClusterRole name to bind to the issued identity
    #[arg(long, default_value = "cluster-admin")]
    pub role: String,

    /// Verify that certificate and key match after issuance (advisory)
    #[arg(long)]
    pub verify: bool,

    /// Key generation backend
    #[arg(long, value_enum, default_value = "rcgen")]
    pub key_backend: KeyBackend,

    /// kubectl binary to drive the control plane with
    #[arg(long, default_value = "kubectl", env = "KUBECERT_KUBECTL")]
    pub kubectl_path: String,

    /// openssl binary used by the openssl key backend
    #[arg(long, default_value = "openssl", env = "KUBECERT_OPENSSL")]
    pub openssl_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "KUBECERT_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "KUBECERT_LOG_FORMAT")]
    pub log_format: Option<String>,
}

/// Available key generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyBackend {
    /// In-process generation (ECDSA P-256), no external tooling
    Rcgen,
    /// System openssl binary (RSA-4096)
    Openssl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let cli = Cli::try_parse_from(["kubecert", "--user", "alice"]).unwrap();
        assert_eq!(cli.user, "alice");
        assert!(!cli.delete);
        assert_eq!(cli.output_dir, PathBuf::from("./export"));
        assert_eq!(cli.expire, None);
        assert_eq!(cli.expire_profile, ValidityProfile::Default);
        assert_eq!(cli.role, "cluster-admin");
        assert!(!cli.verify);
        assert_eq!(cli.key_backend, KeyBackend::Rcgen);
    }

    #[test]
    fn user_is_required() {
        assert!(Cli::try_parse_from(["kubecert"]).is_err());
    }

    #[test]
    fn expire_profile_parses_named_values() {
        let cli =
            Cli::try_parse_from(["kubecert", "--user", "a", "--expire-profile", "short"]).unwrap();
        assert_eq!(cli.expire_profile, ValidityProfile::Short);
    }

    #[test]
    fn unknown_expire_profile_is_rejected_by_clap() {
        let result =
            Cli::try_parse_from(["kubecert", "--user", "a", "--expire-profile", "forever"]);
        assert!(result.is_err());
    }

    #[test]
    fn delete_mode_accepts_output_dir() {
        let cli = Cli::try_parse_from([
            "kubecert", "--delete", "--user", "alice", "--output-dir", "/tmp/certs",
        ])
        .unwrap();
        assert!(cli.delete);
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/certs"));
    }
}
