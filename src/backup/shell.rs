//! External command execution.
//!
//! Commands are always passed to the OS as an argument vector, never through a
//! shell. Failures only ever report the executable name and exit code, since
//! the remaining arguments may carry credentials.

use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use std::ffi::{OsStr, OsString};
use std::io;
use std::process::Command;

/// Exit status of a finished command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandStatus {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Runs a program with literal arguments and waits for it to exit
pub trait CommandExecutor {
    fn execute(&self, program: &OsStr, args: &[OsString]) -> io::Result<CommandStatus>;
}

/// Spawns real processes, stdio is inherited from the caller
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    fn execute(&self, program: &OsStr, args: &[OsString]) -> io::Result<CommandStatus> {
        let status = Command::new(program).args(args).status()?;
        Ok(CommandStatus {
            code: status.code(),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShellRunner<E> {
    executor: E,
}

impl<E: CommandExecutor> ShellRunner<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Runs `argv[0]` with the rest of `argv` as its arguments
    ///
    /// Returns [`Error::CommandFailure`] on a non-zero exit, holding only the
    /// tool name and exit code.
    pub fn run<I, S>(&self, argv: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv.next().ok_or(Error::EmptyCommand)?;
        let args: Vec<OsString> = argv.collect();
        let tool = program.to_string_lossy().into_owned();

        tracing::debug!("Running {tool} with {} arguments", args.len());
        let status = self
            .executor
            .execute(&program, &args)
            .map_err(|e| Error::spawn(e, tool.as_str()))?;

        if status.is_success() {
            Ok(())
        } else {
            Err(Error::command_failure(tool, status.code))
        }
    }
}
