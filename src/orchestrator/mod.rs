//! Workflow orchestration.
//!
//! Two fixed sequences, one per CLI mode: [`IssuanceOrchestrator`] walks
//! generation → submission → approval → retrieval → profile assembly →
//! binding, and [`RevocationOrchestrator`] reverses it. Both drive the
//! control plane only through the [`crate::client::ControlPlaneClient`]
//! seam.

mod issue;
mod revoke;

pub use issue::{IssuanceOrchestrator, IssueOptions, IssueReport, PollPolicy};
pub use revoke::{RevocationOrchestrator, RevocationReport, StepOutcome};
