//! Test doubles shared by the module tests.

use crate::backup::shell::{CommandExecutor, CommandStatus};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::Path;

/// Records every invocation and fakes the side effects of the tools we call
///
/// `tar --create` writes a small archive to `--file`, `tar --extract` drops a
/// file into `--directory` and `mongodump` fills `--out` with a collection dump.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    invocations: RefCell<Vec<Vec<String>>>,
    exit_codes: RefCell<HashMap<String, Option<i32>>>,
}

pub const FAKE_ARCHIVE_BYTES: &[u8] = b"BZh91AY&SY fake archive";

impl RecordingExecutor {
    pub fn fail_tool(&self, tool: &str, code: i32) {
        self.exit_codes
            .borrow_mut()
            .insert(tool.to_string(), Some(code));
    }

    pub fn kill_tool(&self, tool: &str) {
        self.exit_codes.borrow_mut().insert(tool.to_string(), None);
    }

    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.borrow().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .filter_map(|argv| argv.first().cloned())
            .collect()
    }

    fn simulate(argv: &[String]) -> io::Result<()> {
        let value_of = |flag: &str| {
            argv.iter()
                .position(|arg| arg == flag)
                .and_then(|idx| argv.get(idx + 1))
                .map(Path::new)
        };
        let has = |flag: &str| argv.iter().any(|arg| arg == flag);

        match argv.first().map(String::as_str) {
            Some("tar") if has("--create") => {
                if let Some(file) = value_of("--file") {
                    std::fs::write(file, FAKE_ARCHIVE_BYTES)?;
                }
            }
            Some("tar") if has("--extract") => {
                if let Some(dir) = value_of("--directory") {
                    std::fs::create_dir_all(dir.join("admin"))?;
                    std::fs::write(dir.join("admin").join("system.version.bson"), b"{}")?;
                }
            }
            Some("mongodump") => {
                if let Some(dir) = value_of("--out") {
                    std::fs::create_dir_all(dir.join("app"))?;
                    std::fs::write(dir.join("app").join("users.bson"), b"{}")?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl CommandExecutor for RecordingExecutor {
    fn execute(&self, program: &OsStr, args: &[OsString]) -> io::Result<CommandStatus> {
        let argv: Vec<String> = std::iter::once(program)
            .chain(args.iter().map(OsString::as_os_str))
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        self.invocations.borrow_mut().push(argv.clone());

        let tool = argv.first().cloned().unwrap_or_default();
        if let Some(code) = self.exit_codes.borrow().get(&tool) {
            return Ok(CommandStatus { code: *code });
        }

        Self::simulate(&argv)?;
        Ok(CommandStatus { code: Some(0) })
    }
}
