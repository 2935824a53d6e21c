//! kubecert — Kubernetes x509 client-certificate issuance CLI.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use kubecert::{
    cli::{Cli, KeyBackend},
    client::{ControlPlaneClient, KubectlClient},
    expiration::resolve_expiration,
    identity::Identity,
    keygen::{KeyMaterialGenerator, OpensslGenerator, RcgenGenerator},
    orchestrator::{IssuanceOrchestrator, IssueOptions, RevocationOrchestrator},
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        user = %cli.user,
        mode = if cli.delete { "revoke" } else { "issue" },
        "Starting kubecert"
    );

    let identity = match Identity::new(&cli.user) {
        Ok(id) => id,
        Err(e) => {
            error!("Invalid --user value: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client: Arc<dyn ControlPlaneClient> = Arc::new(KubectlClient::new(&cli.kubectl_path));

    if cli.delete {
        run_revocation(client, &cli, &identity).await
    } else {
        run_issuance(client, &cli, &identity).await
    }
}

/// Run the issuance workflow.
async fn run_issuance(
    client: Arc<dyn ControlPlaneClient>,
    cli: &Cli,
    identity: &Identity,
) -> ExitCode {
    let generator: Arc<dyn KeyMaterialGenerator> = match cli.key_backend {
        KeyBackend::Rcgen => Arc::new(RcgenGenerator),
        KeyBackend::Openssl => Arc::new(OpensslGenerator::new(&cli.openssl_path)),
    };

    let options = IssueOptions {
        identity: identity.clone(),
        output_dir: cli.output_dir.clone(),
        expiration_seconds: resolve_expiration(cli.expire_profile, cli.expire),
        role: cli.role.clone(),
        verify: cli.verify,
    };

    match IssuanceOrchestrator::new(client, generator).run(&options).await {
        Ok(report) => {
            println!("[✓] kubeconfig written to: {}", report.kubeconfig_path.display());
            println!("[✓] ClusterRoleBinding applied & written to: {}", report.binding_path.display());
            if let Some(verification) = report.verification {
                if verification.is_match() {
                    println!("[✓] Cert/Key match.");
                } else {
                    println!("[!] Cert/Key mismatch!");
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Issuance failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run the revocation workflow.
async fn run_revocation(
    client: Arc<dyn ControlPlaneClient>,
    cli: &Cli,
    identity: &Identity,
) -> ExitCode {
    let report = RevocationOrchestrator::new(client)
        .run(identity, &cli.output_dir)
        .await;

    println!("[✓] Local files for user {identity} removed ({}).", report.files_removed);

    if report.has_failures() {
        error!("Revocation finished with failed steps");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
