//! In-memory command runners for tests

use crate::sql::{
    bound_var, CREATE_DATABASE_SQL, CREATE_ROLE_SQL, DATABASE_EXISTS_SQL, ROLE_EXISTS_SQL,
};
use common::{CommandResult, CommandRunner, ExecError, Invocation};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Run,
    Capture,
}

#[derive(Debug, Default, Clone)]
struct HostState {
    installed: bool,
    roles: BTreeSet<String>,
    databases: BTreeSet<String>,
}

type FailRule = Box<dyn Fn(&Invocation) -> bool>;

/// `sudo -u <account> psql ...`, as opposed to the `which psql` lookup.
pub fn is_psql(inv: &Invocation) -> bool {
    inv.program == "sudo" && inv.args.get(2).map(String::as_str) == Some("psql")
}

/// `sudo apt ...`
pub fn is_apt(inv: &Invocation) -> bool {
    inv.program == "sudo" && inv.args.first().map(String::as_str) == Some("apt")
}

/// Simulates a machine with apt, `which` and a PostgreSQL engine.
///
/// psql calls fail with exit 1 until the engine is installed, and creating an
/// existing role or database fails the way the real engine would.
#[derive(Default)]
pub struct FakeHost {
    state: RefCell<HostState>,
    calls: RefCell<Vec<(Mode, Invocation)>>,
    fail_rules: Vec<(FailRule, i32)>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn installed(self) -> Self {
        self.state.borrow_mut().installed = true;
        self
    }

    pub fn with_role(self, name: &str) -> Self {
        self.state.borrow_mut().roles.insert(name.to_string());
        self
    }

    pub fn with_database(self, name: &str) -> Self {
        self.state.borrow_mut().databases.insert(name.to_string());
        self
    }

    /// Make every invocation matching `rule` exit with `code`.
    pub fn fail_on(mut self, rule: impl Fn(&Invocation) -> bool + 'static, code: i32) -> Self {
        self.fail_rules.push((Box::new(rule), code));
        self
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.state.borrow().roles.contains(name)
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.state.borrow().databases.contains(name)
    }

    pub fn is_installed(&self) -> bool {
        self.state.borrow().installed
    }

    pub fn calls(&self) -> Vec<(Mode, Invocation)> {
        self.calls.borrow().clone()
    }

    /// Rendered command lines of every `run` call, in order.
    pub fn mutating_commands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|(mode, _)| *mode == Mode::Run)
            .map(|(_, inv)| inv.to_string())
            .collect()
    }

    pub fn mutations(&self) -> usize {
        self.mutating_commands().len()
    }

    /// Execute against the simulated state and return `(exit code, stdout)`.
    fn execute(&self, inv: &Invocation) -> (i32, String) {
        if let Some((_, code)) = self.fail_rules.iter().find(|(rule, _)| rule(inv)) {
            return (*code, String::new());
        }

        let mut state = self.state.borrow_mut();
        let args: Vec<&str> = inv.args.iter().map(String::as_str).collect();

        match (inv.program.as_str(), args.as_slice()) {
            ("which", ["psql"]) => (if state.installed { 0 } else { 1 }, String::new()),
            ("sudo", ["apt", "update"]) => (0, String::new()),
            ("sudo", ["apt", "install", "-y", _]) => {
                state.installed = true;
                (0, String::new())
            }
            ("sudo", ["-u", _, "psql", ..]) if !state.installed => (1, String::new()),
            ("sudo", ["-u", _, "psql", ..]) => {
                let var = |name| bound_var(inv, name).unwrap_or_default().to_string();
                let found = |set: &BTreeSet<String>| {
                    if set.contains(&var("name")) {
                        "1\n".to_string()
                    } else {
                        String::new()
                    }
                };

                match inv.stdin.as_deref() {
                    Some(ROLE_EXISTS_SQL) => (0, found(&state.roles)),
                    Some(DATABASE_EXISTS_SQL) => (0, found(&state.databases)),
                    Some(CREATE_ROLE_SQL) => {
                        let created = state.roles.insert(var("username"));
                        (if created { 0 } else { 1 }, String::new())
                    }
                    Some(CREATE_DATABASE_SQL) => {
                        if !state.roles.contains(&var("owner")) {
                            return (1, String::new());
                        }
                        let created = state.databases.insert(var("name"));
                        (if created { 0 } else { 1 }, String::new())
                    }
                    _ => (1, String::new()),
                }
            }
            _ => (127, String::new()),
        }
    }
}

impl CommandRunner for FakeHost {
    fn run(&self, invocation: &Invocation) -> Result<(), ExecError> {
        self.calls
            .borrow_mut()
            .push((Mode::Run, invocation.clone()));
        match self.execute(invocation) {
            (0, _) => Ok(()),
            (code, _) => Err(ExecError::Exit {
                command: invocation.to_string(),
                code: Some(code),
            }),
        }
    }

    fn run_capture(&self, invocation: &Invocation) -> Result<CommandResult, ExecError> {
        self.calls
            .borrow_mut()
            .push((Mode::Capture, invocation.clone()));
        let (code, output) = self.execute(invocation);
        Ok(CommandResult {
            exit_code: Some(code),
            captured_output: output,
        })
    }
}

/// Returns the same canned answer to every call.
pub struct ScriptedRunner {
    capture: Option<CommandResult>,
    calls: Cell<usize>,
}

impl ScriptedRunner {
    /// Every command fails to spawn.
    pub fn spawn_failures() -> Self {
        Self {
            capture: None,
            calls: Cell::new(0),
        }
    }

    /// Every capture returns `result`; every `run` succeeds.
    pub fn capturing(result: CommandResult) -> Self {
        Self {
            capture: Some(result),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn spawn_error(invocation: &Invocation) -> ExecError {
        ExecError::Spawn {
            command: invocation.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ExecError> {
        self.calls.set(self.calls.get() + 1);
        match self.capture {
            Some(_) => Ok(()),
            None => Err(Self::spawn_error(invocation)),
        }
    }

    fn run_capture(&self, invocation: &Invocation) -> Result<CommandResult, ExecError> {
        self.calls.set(self.calls.get() + 1);
        self.capture
            .clone()
            .ok_or_else(|| Self::spawn_error(invocation))
    }
}

/// Log sink shared between a scoped subscriber and the test.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a thread-local subscriber and return what it logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);
    (value, capture.contents())
}
