//! Provisioning error taxonomy

use common::ExecError;
use thiserror::Error;

/// Process exit code for a successful run.
pub const EXIT_OK: i32 = 0;
/// Process exit code when a command could not be spawned or exited non-zero.
pub const EXIT_EXECUTION: i32 = 1;
/// Process exit code when required configuration is missing.
pub const EXIT_CONFIGURATION: i32 = 2;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Required settings are absent or empty. Raised before any command runs.
    #[error("missing required configuration: {}", .missing.join(", "))]
    Configuration { missing: Vec<&'static str> },

    /// An install or creation command failed to start or exited non-zero.
    #[error(transparent)]
    Execution(#[from] ExecError),
}

impl ProvisionError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration { .. } => EXIT_CONFIGURATION,
            Self::Execution(_) => EXIT_EXECUTION,
        }
    }
}
