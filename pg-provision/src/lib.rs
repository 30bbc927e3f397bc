//! Idempotent local PostgreSQL provisioning
//!
//! Installs the engine when `psql` is missing, then makes sure one login role
//! and two databases owned by it exist. Every mutation is preceded by a
//! read-only check, so rerunning against a provisioned host changes nothing.

pub mod checks;
pub mod dry_run;
pub mod error;
pub mod provisioner;
pub mod report;
pub mod settings;
pub mod sql;

#[cfg(test)]
mod testing;

pub use checks::{ExistenceChecks, Presence};
pub use error::{ProvisionError, EXIT_CONFIGURATION, EXIT_EXECUTION, EXIT_OK};
pub use provisioner::{Provisioner, Stage};
pub use report::{connection_url, ProvisioningOutcome, ReportFormat};
pub use settings::{Credential, DatabaseSpec, Plan, Settings};
