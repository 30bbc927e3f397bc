//! Final connection report

use crate::settings::{Credential, DatabaseSpec};
use serde::Serialize;
use std::fmt;

pub const JDBC_SCHEME: &str = "jdbc:postgresql";
pub const POSTGRES_HOST: &str = "localhost";
pub const POSTGRES_PORT: u16 = 5432;

/// How the report is printed on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// `jdbc:postgresql://localhost:5432/<database>`
pub fn connection_url(database: &str) -> String {
    format!(
        "{}://{}:{}/{}",
        JDBC_SCHEME, POSTGRES_HOST, POSTGRES_PORT, database
    )
}

/// Resource touched by a provisioning stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "resource", rename_all = "snake_case")]
pub enum Resource {
    Engine { package: String },
    Role { name: String },
    Database { name: String },
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine { package } => write!(f, "package '{}'", package),
            Self::Role { name } => write!(f, "role '{}'", name),
            Self::Database { name } => write!(f, "database '{}'", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Check confirmed the resource, nothing ran.
    Skipped,
    /// Mutating commands ran and succeeded.
    Created,
    /// Mutating commands were only logged.
    Planned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    #[serde(flatten)]
    pub resource: Resource,
    pub decision: Decision,
}

/// Everything the operator needs after a fully successful run.
///
/// Only built once every stage succeeded, so it is never partial.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningOutcome {
    pub credential: Credential,
    pub databases: [DatabaseSpec; 2],
    pub urls: [String; 2],
    pub actions: Vec<Action>,
}

impl ProvisioningOutcome {
    pub fn new(credential: Credential, databases: [DatabaseSpec; 2], actions: Vec<Action>) -> Self {
        let urls = [
            connection_url(&databases[0].name),
            connection_url(&databases[1].name),
        ];
        Self {
            credential,
            databases,
            urls,
            actions,
        }
    }

    /// Number of stages that changed (or would change) the system.
    pub fn changes(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| a.decision != Decision::Skipped)
            .count()
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.to_string()),
            ReportFormat::Json => serde_json::to_string_pretty(self),
        }
    }
}

impl fmt::Display for ProvisioningOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PostgreSQL connection details:")?;
        writeln!(f, "  User: {}", self.credential.username)?;
        writeln!(f, "  Password: {}", self.credential.password)?;
        writeln!(f, "  Primary database: {}", self.databases[0].name)?;
        writeln!(f, "    URL: {}", self.urls[0])?;
        writeln!(f, "  Secondary database: {}", self.databases[1].name)?;
        write!(f, "    URL: {}", self.urls[1])
    }
}
