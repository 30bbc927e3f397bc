//! Read-only existence checks
//!
//! Checks never fail and never mutate. Anything they cannot determine comes
//! back as `Presence::Unknown`, which callers treat as absent: a false negative
//! only costs a redundant creation attempt.

use crate::sql::{which_client, Psql};
use common::{CommandResult, CommandRunner, Invocation};
use serde::Serialize;
use tracing::warn;

/// Outcome of an existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Exists,
    Absent,
    /// The check could not run or its command failed.
    Unknown,
}

impl Presence {
    /// Only a confirmed `Exists` lets a stage be skipped.
    pub fn is_present(self) -> bool {
        self == Self::Exists
    }

    /// Classify the output of a `SELECT 1 ...` query.
    pub fn from_query(result: &CommandResult) -> Self {
        match (result.success(), result.captured_output.trim()) {
            (true, "1") => Self::Exists,
            (true, _) => Self::Absent,
            (false, _) => Self::Unknown,
        }
    }
}

pub struct ExistenceChecks<'a, R> {
    runner: &'a R,
    psql: Psql<'a>,
}

impl<'a, R: CommandRunner> ExistenceChecks<'a, R> {
    pub fn new(runner: &'a R, system_user: &'a str) -> Self {
        Self {
            runner,
            psql: Psql::new(system_user),
        }
    }

    /// Is the database client on PATH?
    pub fn engine_installed(&self) -> Presence {
        match self.runner.run_capture(&which_client()) {
            Ok(result) if result.success() => Presence::Exists,
            Ok(_) => Presence::Absent,
            Err(e) => {
                warn!(error = %e, "PATH lookup could not run, assuming engine is absent");
                Presence::Unknown
            }
        }
    }

    pub fn role_exists(&self, username: &str) -> Presence {
        self.query("role", username, &self.psql.role_exists(username))
    }

    pub fn database_exists(&self, name: &str) -> Presence {
        self.query("database", name, &self.psql.database_exists(name))
    }

    fn query(&self, kind: &str, name: &str, invocation: &Invocation) -> Presence {
        let presence = match self.runner.run_capture(invocation) {
            Ok(result) => Presence::from_query(&result),
            Err(e) => {
                warn!(kind, name, error = %e, "Existence check could not run");
                return Presence::Unknown;
            }
        };

        if presence == Presence::Unknown {
            warn!(kind, name, cmd = %invocation, "Existence check failed, treating as absent");
        }
        presence
    }
}
