//! Child command building logic

use std::process::Stdio;
use tokio::process::Command;

use crate::VERSION;
use crate::error::{Result, SupervisorError};
use crate::types::options::{LaunchCommand, SupervisorOptions};

use super::config::{DANGEROUS_ENV_VARS, SUPERVISOR_VERSION_ENV};

/// Command builder for the supervised child
pub(super) struct CommandBuilder<'a> {
    options: &'a SupervisorOptions,
}

impl<'a> CommandBuilder<'a> {
    /// Create a new command builder
    pub(super) fn new(options: &'a SupervisorOptions) -> Self {
        Self { options }
    }

    /// Build the command with piped stdio, ready to spawn
    ///
    /// # Errors
    /// Returns `SupervisorError::Launch` if a `Program` launch cannot be resolved on `PATH`
    pub(super) fn build(&self) -> Result<Command> {
        let mut cmd = match &self.options.command {
            LaunchCommand::Shell { command } => shell_command(command),
            LaunchCommand::Program { program, args } => {
                let path = which::which(program).map_err(|e| {
                    SupervisorError::launch(format!("'{program}' not found on PATH: {e}"))
                })?;
                let mut cmd = Command::new(path);
                cmd.args(args);
                cmd
            }
        };

        // The child inherits our environment; only user-provided entries are filtered
        for (key, value) in &self.options.env {
            if DANGEROUS_ENV_VARS.contains(&key.as_str()) {
                log::warn!("Refusing to pass {key} to the MCP process");
                continue;
            }
            cmd.env(key, value);
        }
        cmd.env(SUPERVISOR_VERSION_ENV, VERSION);

        if let Some(ref cwd) = self.options.cwd {
            cmd.current_dir(cwd);
        }

        // stderr is piped, never inherited, so the drain task owns it
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so termination reaches everything the shell started
        #[cfg(unix)]
        cmd.process_group(0);

        Ok(cmd)
    }
}

#[cfg(unix)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}
