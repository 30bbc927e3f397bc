//! Command builders for apt and psql
//!
//! SQL is fed to psql on stdin and values are bound with `-v name=value`,
//! then referenced as `:'name'` (literal) or `:"name"` (identifier) so psql
//! does the quoting. `-c` would skip that interpolation, so it is never used.

use crate::settings::{Credential, DatabaseSpec};
use common::Invocation;

/// Client binary whose presence on PATH means the engine is installed.
pub const CLIENT_BINARY: &str = "psql";

pub const ROLE_EXISTS_SQL: &str = "SELECT 1 FROM pg_roles WHERE rolname = :'name';\n";
pub const DATABASE_EXISTS_SQL: &str = "SELECT 1 FROM pg_database WHERE datname = :'name';\n";
pub const CREATE_ROLE_SQL: &str = "CREATE USER :\"username\" WITH PASSWORD :'password';\n";
pub const CREATE_DATABASE_SQL: &str = "CREATE DATABASE :\"name\" OWNER :\"owner\";\n";

/// PATH lookup for the client binary.
pub fn which_client() -> Invocation {
    Invocation::new("which").arg(CLIENT_BINARY)
}

pub fn refresh_package_index() -> Invocation {
    Invocation::new("sudo").args(["apt", "update"])
}

pub fn install_package(package: &str) -> Invocation {
    Invocation::new("sudo").args(["apt", "install", "-y", package])
}

/// psql running as the privileged system account.
#[derive(Debug, Clone)]
pub struct Psql<'a> {
    system_user: &'a str,
}

impl<'a> Psql<'a> {
    pub fn new(system_user: &'a str) -> Self {
        Self { system_user }
    }

    fn base(&self) -> Invocation {
        Invocation::new("sudo").args([
            "-u",
            self.system_user,
            CLIENT_BINARY,
            "-X",
            "-v",
            "ON_ERROR_STOP=1",
        ])
    }

    /// Unaligned, tuples-only query whose stdout is the bare result.
    fn query(&self, sql: &str, name: &str) -> Invocation {
        self.base()
            .args(["-t", "-A", "-v"])
            .arg(format!("name={}", name))
            .stdin(sql)
    }

    pub fn role_exists(&self, username: &str) -> Invocation {
        self.query(ROLE_EXISTS_SQL, username)
    }

    pub fn database_exists(&self, name: &str) -> Invocation {
        self.query(DATABASE_EXISTS_SQL, name)
    }

    pub fn create_role(&self, credential: &Credential) -> Invocation {
        self.base()
            .args(["-v".to_string(), format!("username={}", credential.username)])
            .args(["-v".to_string(), format!("password={}", credential.password)])
            .secret(credential.password.as_str())
            .stdin(CREATE_ROLE_SQL)
    }

    pub fn create_database(&self, database: &DatabaseSpec) -> Invocation {
        self.base()
            .args(["-v".to_string(), format!("name={}", database.name)])
            .args(["-v".to_string(), format!("owner={}", database.owner)])
            .stdin(CREATE_DATABASE_SQL)
    }
}

/// Value bound to `-v <name>=...` in an invocation, if any.
pub fn bound_var<'i>(invocation: &'i Invocation, name: &str) -> Option<&'i str> {
    let prefix = format!("{}=", name);
    invocation
        .args
        .windows(2)
        .filter(|pair| pair[0] == "-v")
        .find_map(|pair| pair[1].strip_prefix(prefix.as_str()))
}
