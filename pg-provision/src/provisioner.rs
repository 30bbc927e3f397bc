//! Idempotent provisioning sequence
//!
//! Runs as a fixed sequence of stages, each gated by an existence check:
//!
//! `Start -> InstallChecked -> RoleChecked -> PrimaryDbChecked -> SecondaryDbChecked -> Done`
//!
//! Any error moves to `Failed` and stops the run. Completed stages are not
//! rolled back, so a failed run can leave the role created without its
//! databases; rerunning picks up where it stopped.

use crate::checks::ExistenceChecks;
use crate::dry_run::DryRun;
use crate::error::ProvisionError;
use crate::report::{Action, Decision, ProvisioningOutcome, Resource};
use crate::settings::{Plan, Settings};
use crate::sql::{install_package, refresh_package_index, Psql};
use common::CommandRunner;
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    InstallChecked,
    RoleChecked,
    PrimaryDbChecked,
    SecondaryDbChecked,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

pub struct Provisioner<R> {
    runner: DryRun<R>,
    plan: Plan,
    stage: Stage,
    actions: Vec<Action>,
}

impl<R: CommandRunner> Provisioner<R> {
    /// Validate `settings` and prepare a run. Executes nothing.
    pub fn new(runner: R, settings: &Settings) -> Result<Self, ProvisionError> {
        let plan = settings.validate()?;
        Ok(Self {
            runner: DryRun::new(runner, settings.dry_run),
            plan,
            stage: Stage::Start,
            actions: Vec::new(),
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Perform exactly one transition and return the new stage.
    ///
    /// Terminal stages are returned unchanged.
    pub fn step(&mut self) -> Result<Stage, ProvisionError> {
        let result = match self.stage {
            Stage::Start => self.ensure_engine().map(|a| (Stage::InstallChecked, Some(a))),
            Stage::InstallChecked => self.ensure_role().map(|a| (Stage::RoleChecked, Some(a))),
            Stage::RoleChecked => self
                .ensure_database(0)
                .map(|a| (Stage::PrimaryDbChecked, Some(a))),
            Stage::PrimaryDbChecked => self
                .ensure_database(1)
                .map(|a| (Stage::SecondaryDbChecked, Some(a))),
            Stage::SecondaryDbChecked => Ok((Stage::Done, None)),
            Stage::Done | Stage::Failed => return Ok(self.stage),
        };

        match result {
            Ok((next, action)) => {
                self.actions.extend(action);
                self.stage = next;
                Ok(next)
            }
            Err(e) => {
                error!(stage = ?self.stage, error = %e, "Provisioning stage failed");
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }

    /// Drive every stage to completion and build the connection report.
    pub fn run(mut self) -> Result<ProvisioningOutcome, ProvisionError> {
        let start = Instant::now();

        info!(
            user = %self.plan.credential.username,
            primary = %self.plan.databases[0].name,
            secondary = %self.plan.databases[1].name,
            dry_run = self.runner.is_enabled(),
            "Provisioning PostgreSQL"
        );

        while !self.stage.is_terminal() {
            self.step()?;
        }

        let outcome =
            ProvisioningOutcome::new(self.plan.credential, self.plan.databases, self.actions);

        info!(
            changes = outcome.changes(),
            duration_ms = start.elapsed().as_millis() as u64,
            "PostgreSQL provisioning complete"
        );

        Ok(outcome)
    }

    fn checks(&self) -> ExistenceChecks<'_, DryRun<R>> {
        ExistenceChecks::new(&self.runner, &self.plan.system_user)
    }

    fn mutated(&self) -> Decision {
        if self.runner.is_enabled() {
            Decision::Planned
        } else {
            Decision::Created
        }
    }

    fn ensure_engine(&self) -> Result<Action, ProvisionError> {
        let resource = Resource::Engine {
            package: self.plan.package.clone(),
        };

        if self.checks().engine_installed().is_present() {
            info!("PostgreSQL is already installed, skipping installation");
            return Ok(Action {
                resource,
                decision: Decision::Skipped,
            });
        }

        info!("Updating package index");
        self.runner.run(&refresh_package_index())?;

        info!(package = %self.plan.package, "Installing PostgreSQL");
        self.runner.run(&install_package(&self.plan.package))?;

        info!("PostgreSQL installed");
        Ok(Action {
            resource,
            decision: self.mutated(),
        })
    }

    fn ensure_role(&self) -> Result<Action, ProvisionError> {
        let credential = &self.plan.credential;
        let resource = Resource::Role {
            name: credential.username.clone(),
        };

        if self.checks().role_exists(&credential.username).is_present() {
            info!(role = %credential.username, "Role already exists, skipping creation");
            return Ok(Action {
                resource,
                decision: Decision::Skipped,
            });
        }

        info!(role = %credential.username, "Creating role");
        self.runner
            .run(&Psql::new(&self.plan.system_user).create_role(credential))?;

        Ok(Action {
            resource,
            decision: self.mutated(),
        })
    }

    fn ensure_database(&self, index: usize) -> Result<Action, ProvisionError> {
        let database = &self.plan.databases[index];
        let resource = Resource::Database {
            name: database.name.clone(),
        };

        if self.checks().database_exists(&database.name).is_present() {
            info!(database = %database.name, "Database already exists, skipping creation");
            return Ok(Action {
                resource,
                decision: Decision::Skipped,
            });
        }

        info!(database = %database.name, owner = %database.owner, "Creating database");
        self.runner
            .run(&Psql::new(&self.plan.system_user).create_database(database))?;

        Ok(Action {
            resource,
            decision: self.mutated(),
        })
    }
}
