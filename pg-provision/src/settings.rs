//! Provisioning settings from environment variables
//!
//! Values are read once in the binary and handed to the provisioner as an
//! explicit value. Nothing here touches the system beyond `std::env`.

use crate::error::ProvisionError;
use crate::report::ReportFormat;
use common::ConfigExt;
use serde::Serialize;

pub const USER_VAR: &str = "POSTGRES_USER";
pub const PASSWORD_VAR: &str = "POSTGRES_PASSWORD";
pub const PRIMARY_DB_VAR: &str = "MAIN_DB_NAME";
pub const SECONDARY_DB_VAR: &str = "BILLING_DB_NAME";

pub const DEFAULT_PACKAGE: &str = "postgresql";
pub const DEFAULT_SYSTEM_USER: &str = "postgres";

/// Raw settings as found in the environment. Required values may be absent.
#[derive(Clone)]
pub struct Settings {
    pub username: Option<String>,
    pub password: Option<String>,
    pub primary_db: Option<String>,
    pub secondary_db: Option<String>,
    /// apt package providing the engine and `psql`
    pub package: String,
    /// OS account allowed to administer the engine through `psql`
    pub system_user: String,
    pub dry_run: bool,
    pub report_format: ReportFormat,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("primary_db", &self.primary_db)
            .field("secondary_db", &self.secondary_db)
            .field("package", &self.package)
            .field("system_user", &self.system_user)
            .field("dry_run", &self.dry_run)
            .field("report_format", &self.report_format)
            .finish()
    }
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Self {
        Self {
            username: String::env_non_empty(USER_VAR),
            password: String::env_non_empty(PASSWORD_VAR),
            primary_db: String::env_non_empty(PRIMARY_DB_VAR),
            secondary_db: String::env_non_empty(SECONDARY_DB_VAR),
            package: String::env_or("PROVISION_PACKAGE", DEFAULT_PACKAGE),
            system_user: String::env_or("PROVISION_SYSTEM_USER", DEFAULT_SYSTEM_USER),
            dry_run: bool::env_bool("PROVISION_DRY_RUN", false),
            report_format: ReportFormat::parse(&String::env_or("PROVISION_REPORT_FORMAT", "text")),
        }
    }

    /// Settings with the four required values filled in and defaults elsewhere.
    pub fn new(username: &str, password: &str, primary_db: &str, secondary_db: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            primary_db: Some(primary_db.to_string()),
            secondary_db: Some(secondary_db.to_string()),
            package: DEFAULT_PACKAGE.to_string(),
            system_user: DEFAULT_SYSTEM_USER.to_string(),
            dry_run: false,
            report_format: ReportFormat::Text,
        }
    }

    /// Check that every required value is present and non-empty.
    ///
    /// Reports all missing variables at once rather than the first one.
    pub fn validate(&self) -> Result<Plan, ProvisionError> {
        let required = [
            (USER_VAR, &self.username),
            (PASSWORD_VAR, &self.password),
            (PRIMARY_DB_VAR, &self.primary_db),
            (SECONDARY_DB_VAR, &self.secondary_db),
        ];

        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(ProvisionError::Configuration { missing });
        }

        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        let credential = Credential {
            username: value(&self.username),
            password: value(&self.password),
        };
        let databases = [
            DatabaseSpec::new(value(&self.primary_db), &credential),
            DatabaseSpec::new(value(&self.secondary_db), &credential),
        ];

        Ok(Plan {
            credential,
            databases,
            package: self.package.clone(),
            system_user: self.system_user.clone(),
        })
    }
}

/// Login role credentials. The password is only ever printed in the final report.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSpec {
    pub name: String,
    pub owner: String,
}

impl DatabaseSpec {
    pub fn new(name: String, owner: &Credential) -> Self {
        Self {
            name,
            owner: owner.username.clone(),
        }
    }
}

/// Validated settings: everything a provisioning run needs.
#[derive(Debug, Clone)]
pub struct Plan {
    pub credential: Credential,
    /// Primary first, secondary second.
    pub databases: [DatabaseSpec; 2],
    pub package: String,
    pub system_user: String,
}
