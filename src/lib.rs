//! kubecert — short-lived Kubernetes client certificates via the CSR API.
//!
//! Generates a key pair and CSR for a user, submits and approves the
//! signing request through the cluster control plane, fetches the signed
//! certificate, assembles a ready-to-use kubeconfig, and binds the
//! identity to a cluster role. The `--delete` mode reverses the process.
//!
//! The control plane is a collaborator behind
//! [`client::ControlPlaneClient`]; the shipped variants are a
//! kubectl-driving client and an in-memory test double.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod error;
pub mod expiration;
pub mod identity;
pub mod keygen;
pub mod orchestrator;
pub mod resources;
pub mod verify;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
