use crate::error::{DeployError, DeployResult};
use colored::Colorize;
use log::debug;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

/// One argument, possibly hidden from logs (API keys and the like)
#[derive(Debug, Clone)]
struct CommandArg {
    value: OsString,
    secret: bool,
}

/// A blocking invocation of an external tool.
///
/// Output is relayed line by line with a `[name]` prefix while the pipeline
/// waits for the process to exit; stdout lines are also kept for the caller.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: PathBuf,
    args: Vec<CommandArg>,
    working_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct CommandOutcome {
    pub status: ExitStatus,
    pub stdout: Vec<String>,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

impl ExternalCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    // RUST LEARNING: Builder methods take `mut self` and return `Self`
    // - Lets callers chain `.arg(..).arg(..).current_dir(..)` like std's Command
    pub fn arg(mut self, value: impl Into<OsString>) -> Self {
        self.args.push(CommandArg {
            value: value.into(),
            secret: false,
        });
        self
    }

    pub fn args<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        values.into_iter().fold(self, |command, value| command.arg(value))
    }

    /// Like [`arg`](Self::arg), but shown as `****` in logs
    pub fn secret_arg(mut self, value: impl Into<OsString>) -> Self {
        self.args.push(CommandArg {
            value: value.into(),
            secret: true,
        });
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Short name used to prefix relayed output
    pub fn name(&self) -> String {
        self.program
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    pub fn display(&self) -> String {
        let mut shown = self.program.display().to_string();
        for arg in &self.args {
            shown.push(' ');
            if arg.secret {
                shown.push_str("****");
            } else {
                shown.push_str(&arg.value.to_string_lossy());
            }
        }
        shown
    }

    /// Spawn, relay output and wait. Only a failure to start the process is an error.
    pub fn run(&self) -> DeployResult<CommandOutcome> {
        debug!("Running: {}", self.display());
        if let Some(dir) = &self.working_dir {
            debug!("Working directory: {}", dir.display());
        }

        let mut command = Command::new(&self.program);
        command
            .args(self.args.iter().map(|arg| &arg.value))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn()?;
        let name = self.name();

        // RUST LEARNING: `take()` moves the pipe out of the Option so a thread can own it
        let stdout_relay = child
            .stdout
            .take()
            .map(|stdout| relay_lines(stdout, name.clone(), false));
        let stderr_relay = child
            .stderr
            .take()
            .map(|stderr| relay_lines(stderr, name.clone(), true));

        let status = child.wait()?;

        let stdout = stdout_relay
            .map(|handle| handle.join().unwrap_or_default())
            .unwrap_or_default();
        if let Some(handle) = stderr_relay {
            let _ = handle.join();
        }

        debug!("{} exited with code: {:?}", name, status.code());
        Ok(CommandOutcome { status, stdout })
    }

    /// Like [`run`](Self::run), but a non-zero exit becomes an
    /// [`DeployError::ExternalProcessFailure`]
    pub fn run_checked(&self) -> DeployResult<CommandOutcome> {
        let outcome = self.run()?;
        if !outcome.success() {
            return Err(DeployError::external(
                self.name(),
                format!("exited with {}", outcome.status),
            ));
        }
        Ok(outcome)
    }
}

fn relay_lines<R>(pipe: R, name: String, is_stderr: bool) -> JoinHandle<Vec<String>>
where
    R: Read + Send + 'static,
{
    // RUST LEARNING: `move` transfers ownership of the pipe and name into the thread
    thread::spawn(move || {
        let prefix = format!("[{}]", name);
        let prefix = if is_stderr {
            prefix.red()
        } else {
            prefix.bright_black()
        };

        let mut captured = Vec::new();
        for line in BufReader::new(pipe).lines().map_while(Result::ok) {
            println!("{} {}", prefix, line);
            if !is_stderr {
                captured.push(line);
            }
        }
        captured
    })
}
