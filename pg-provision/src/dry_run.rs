//! Dry-run wrapper: read-only checks run for real, mutations are only logged

use common::{CommandResult, CommandRunner, ExecError, Invocation};
use tracing::info;

pub struct DryRun<R> {
    inner: R,
    enabled: bool,
}

impl<R> DryRun<R> {
    pub fn new(inner: R, enabled: bool) -> Self {
        Self { inner, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl<R: CommandRunner> CommandRunner for DryRun<R> {
    fn run(&self, invocation: &Invocation) -> Result<(), ExecError> {
        if self.enabled {
            info!(cmd = %invocation, "Dry run, not executing");
            return Ok(());
        }
        self.inner.run(invocation)
    }

    fn run_capture(&self, invocation: &Invocation) -> Result<CommandResult, ExecError> {
        self.inner.run_capture(invocation)
    }
}
