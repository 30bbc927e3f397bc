//! Command execution utilities
//!
//! Provides consistent command execution with proper error handling and logging.
//! Every call blocks the calling thread until the child exits; there is no timeout.

use std::fmt;
use std::io::{self, Write};
use std::process::{Child, Command, Stdio};
use thiserror::Error;
use tracing::{debug, instrument};

const MASK: &str = "****";

/// A fully described external command.
///
/// `secrets` lists values that must never be rendered: any argument or
/// script fragment containing one of them is masked by `Display`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub secrets: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feed `script` to the child's stdin instead of `/dev/null`.
    pub fn stdin(mut self, script: impl Into<String>) -> Self {
        self.stdin = Some(script.into());
        self
    }

    /// Register a value to be masked whenever this invocation is displayed.
    pub fn secret(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.secrets.push(value);
        }
        self
    }

    fn mask(&self, text: &str) -> String {
        self.secrets
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), MASK))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", self.mask(arg))?;
        }
        Ok(())
    }
}

/// Result of a capturing command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
    pub captured_output: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Failure to execute an external command.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed (exit {})", display_code(.code))]
    Exit { command: String, code: Option<i32> },
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

impl ExecError {
    /// Masked command line of the failing invocation.
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. } | Self::Exit { command, .. } => command,
        }
    }

    /// Exit status of the child, if it ran and exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Spawn { .. } => None,
            Self::Exit { code, .. } => *code,
        }
    }
}

/// Executes external commands.
///
/// `run` lets the child write straight to our stdout/stderr and fails on a
/// non-zero exit. `run_capture` buffers stdout and reports any exit status;
/// it only fails when the process could not be started.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ExecError>;

    fn run_capture(&self, invocation: &Invocation) -> Result<CommandResult, ExecError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<(), ExecError> {
        (**self).run(invocation)
    }

    fn run_capture(&self, invocation: &Invocation) -> Result<CommandResult, ExecError> {
        (**self).run_capture(invocation)
    }
}

/// Runs commands on the local system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn spawn(invocation: &Invocation, capture: bool) -> Result<Child, ExecError> {
        let mut cmd = invocation.command();
        cmd.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(if capture {
            Stdio::piped()
        } else {
            Stdio::inherit()
        })
        .stderr(Stdio::inherit());

        let spawn_error = |source| ExecError::Spawn {
            command: invocation.to_string(),
            source,
        };

        let mut child = cmd.spawn().map_err(spawn_error)?;

        if let (Some(script), Some(mut stdin)) = (&invocation.stdin, child.stdin.take()) {
            match stdin.write_all(script.as_bytes()) {
                // Child stopped reading; its exit status tells the real story.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("Child closed stdin before the script was written");
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(spawn_error(e));
                }
                Ok(()) => {}
            }
        }

        Ok(child)
    }
}

impl CommandRunner for SystemRunner {
    #[instrument(skip_all, fields(cmd = %invocation))]
    fn run(&self, invocation: &Invocation) -> Result<(), ExecError> {
        debug!("Running command");

        let status = Self::spawn(invocation, false)?
            .wait()
            .map_err(|source| ExecError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecError::Exit {
                command: invocation.to_string(),
                code: status.code(),
            })
        }
    }

    #[instrument(skip_all, fields(cmd = %invocation))]
    fn run_capture(&self, invocation: &Invocation) -> Result<CommandResult, ExecError> {
        debug!("Running command (captured)");

        let output = Self::spawn(invocation, true)?
            .wait_with_output()
            .map_err(|source| ExecError::Spawn {
                command: invocation.to_string(),
                source,
            })?;

        Ok(CommandResult {
            exit_code: output.status.code(),
            captured_output: String::from_utf8_lossy(&output.stdout).to_string(),
        })
    }
}
