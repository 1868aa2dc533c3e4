#![allow(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::command;
use crate::error::{Error, Result};
use crate::paths;

/// Variable holding the trigger's parent directory, `./`-prefixed.
pub const DIRECTORY_VAR: &str = "TEST_DIRECTORY";
/// Variable holding the trigger path, `./`-prefixed.
pub const FILENAME_VAR: &str = "TEST_FILENAME";

/// Where one of the child's standard streams goes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sink {
    Inherit,
    Null,
}

impl Sink {
    fn stdio(self) -> Stdio {
        match self {
            Self::Inherit => Stdio::inherit(),
            Self::Null => Stdio::null(),
        }
    }
}

/// Outcome of one command execution.
#[derive(Debug)]
pub struct RunRecord {
    pub elapsed: Duration,
    pub trigger: PathBuf,
    pub result: Result<()>,
}

/// Runs expanded commands to completion.
///
/// Standard input is closed by default so that children never compete with
/// the interactive input reader; output streams are inherited.
#[derive(Clone, Debug)]
pub struct Executor {
    pub stdin: Sink,
    pub stdout: Sink,
    pub stderr: Sink,
}

impl Default for Executor {
    fn default() -> Self {
        Self {
            stdin: Sink::Null,
            stdout: Sink::Inherit,
            stderr: Sink::Inherit,
        }
    }
}

impl Executor {
    /// Runs `argv` and blocks until it exits.
    ///
    /// `environ` holds `KEY=VALUE` entries layered over the inherited
    /// environment in order, so later entries win. The trigger's directory
    /// and file name are always added on top.
    pub fn run(&self, argv: &[String], trigger: &Path, environ: &[String]) -> RunRecord {
        let clock = Instant::now();
        let result = self.execute(argv, trigger, environ);

        RunRecord {
            elapsed: clock.elapsed(),
            trigger: trigger.to_path_buf(),
            result,
        }
    }

    fn execute(&self, argv: &[String], trigger: &Path, environ: &[String]) -> Result<()> {
        let (program, args) = argv.split_first().ok_or(Error::EmptyCommand)?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(self.stdin.stdio())
            .stdout(self.stdout.stdio())
            .stderr(self.stderr.stdio());

        for (name, value) in collect_env_vars(environ, trigger) {
            command.env(name, value);
        }

        imp::prepare(&mut command);
        debug!("Assembled command {:?}", command);

        let status = command
            .status()
            .map_err(|err| Error::Spawn(program.clone(), err))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Exit(status))
        }
    }
}

/// Splits overlay entries into name/value pairs and appends the trigger
/// variables. Entries without `=` are skipped.
fn collect_env_vars(environ: &[String], trigger: &Path) -> Vec<(String, String)> {
    let trigger = trigger.to_string_lossy();

    let mut vars: Vec<(String, String)> = environ
        .iter()
        .filter_map(|entry| {
            let mut parts = entry.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(name), Some(value)) if !name.is_empty() => {
                    Some((name.to_string(), value.to_string()))
                }
                _ => None,
            }
        })
        .collect();

    vars.push((
        DIRECTORY_VAR.to_string(),
        paths::dot_slash(&command::parent_dir(&trigger)),
    ));
    vars.push((FILENAME_VAR.to_string(), paths::dot_slash(&trigger)));
    vars
}

#[cfg(target_family = "unix")]
mod imp {
    use nix::sys::signal::{SigSet, SIGINT, SIGTERM};
    use nix::{self, Error};
    use std::io;
    use std::os::unix::process::CommandExt;
    use std::process::Command;

    pub fn from_nix_error(err: nix::Error) -> io::Error {
        match err {
            Error::Sys(errno) => io::Error::from_raw_os_error(errno as i32),
            Error::InvalidPath => io::Error::new(io::ErrorKind::InvalidInput, err),
            _ => io::Error::new(io::ErrorKind::Other, err),
        }
    }

    /// The interrupt handler blocks SIGINT and SIGTERM in every thread, and
    /// the mask survives exec: lift it in the child.
    pub fn prepare(command: &mut Command) {
        unsafe {
            command.pre_exec(|| {
                let mut mask = SigSet::empty();
                mask.add(SIGINT);
                mask.add(SIGTERM);
                mask.thread_unblock().map_err(from_nix_error)
            });
        }
    }
}

#[cfg(target_family = "unix")]
pub(crate) use imp::from_nix_error;

#[cfg(not(target_family = "unix"))]
mod imp {
    use std::process::Command;

    pub fn prepare(_command: &mut Command) {}
}
