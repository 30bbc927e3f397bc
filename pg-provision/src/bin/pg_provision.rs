//! Local PostgreSQL provisioner
//!
//! Loads settings from the environment (and `.env`), runs the provisioning
//! sequence once and prints the connection report on stdout.
//! Exit codes: 0 success, 1 command failure, 2 missing or unreadable configuration.

use anyhow::{Context, Result};
use common::{init_logging, load_env_file, ConfigExt, LogFormat, SystemRunner};
use pg_provision::{
    ProvisionError, Provisioner, ProvisioningOutcome, Settings, EXIT_CONFIGURATION, EXIT_EXECUTION,
};
use tracing::{error, info};

fn provision(settings: &Settings) -> Result<ProvisioningOutcome, ProvisionError> {
    Provisioner::new(SystemRunner, settings)?.run()
}

fn main() -> Result<()> {
    // Must run before logging so LOG_FORMAT can come from the file.
    let env_file = String::env_or("PROVISION_ENV_FILE", ".env");
    let loaded = load_env_file(&env_file);

    let _guard = init_logging(
        "pg-provision",
        LogFormat::parse(&String::env_or("LOG_FORMAT", "")),
    );

    info!("Starting PostgreSQL installation and configuration");
    match loaded {
        Ok(Some(path)) => info!(path = %path.display(), "Loaded settings file"),
        Ok(None) => info!(path = %env_file, "No settings file, using process environment"),
        Err(e) => {
            error!(path = %env_file, error = %e, "Failed to parse settings file");
            std::process::exit(EXIT_CONFIGURATION);
        }
    }

    let settings = Settings::from_env();

    match provision(&settings) {
        Ok(outcome) => {
            let report = outcome
                .render(settings.report_format)
                .context("Failed to render connection report")?;
            println!("{}", report);
            info!("PostgreSQL installation and configuration finished");
            Ok(())
        }
        Err(e @ ProvisionError::Configuration { .. }) => {
            error!(error = %e, "Configuration error");
            std::process::exit(e.exit_code());
        }
        Err(ProvisionError::Execution(e)) => {
            error!(
                cmd = %e.command(),
                exit_code = ?e.exit_code(),
                error = %e,
                "PostgreSQL provisioning failed"
            );
            std::process::exit(EXIT_EXECUTION);
        }
    }
}
