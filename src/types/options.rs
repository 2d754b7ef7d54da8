//! Supervisor options and configuration
//!
//! This module contains the configuration for a [`ProcessSupervisor`](crate::ProcessSupervisor),
//! including a builder and an environment loader for the binary.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticSink;
use crate::error::{Result, SupervisorError};
use crate::supervisor::config::{
    DEFAULT_GRACE_PERIOD, DEFAULT_LAUNCH_COMMAND, DEFAULT_MAX_LINE_BYTES,
    DEFAULT_READER_JOIN_TIMEOUT, DEFAULT_RESPONSE_TIMEOUT, DEFAULT_SETTLE_DELAY,
};

/// Environment variable holding the shell command line of the child
pub const ENV_COMMAND: &str = "MCP_SUPERVISOR_COMMAND";
/// Environment variable holding the post-spawn settle delay in milliseconds
pub const ENV_SETTLE_MS: &str = "MCP_SUPERVISOR_SETTLE_MS";
/// Environment variable holding the response timeout in milliseconds
pub const ENV_TIMEOUT_MS: &str = "MCP_SUPERVISOR_TIMEOUT_MS";
/// Environment variable holding the termination grace period in milliseconds
pub const ENV_GRACE_MS: &str = "MCP_SUPERVISOR_GRACE_MS";
/// Environment variable selecting the correlation mode (`positional` or `id`)
pub const ENV_CORRELATION: &str = "MCP_SUPERVISOR_CORRELATION";

// ============================================================================
// Launch command and correlation mode
// ============================================================================

/// How the child process is launched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LaunchCommand {
    /// Command line interpreted by the platform shell (`sh -c` / `cmd /C`)
    Shell {
        /// Full command line
        command: String,
    },
    /// Program resolved on `PATH` and run with explicit arguments
    Program {
        /// Program name or path
        program: String,
        /// Arguments passed verbatim
        args: Vec<String>,
    },
}

impl LaunchCommand {
    /// Shell command line
    pub fn shell(command: impl Into<String>) -> Self {
        Self::Shell {
            command: command.into(),
        }
    }

    /// Program with arguments
    pub fn program<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Program {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Human readable rendering for logs
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Shell { command } => command.clone(),
            Self::Program { program, args } if args.is_empty() => program.clone(),
            Self::Program { program, args } => format!("{program} {}", args.join(" ")),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Self::Shell { command } => command.trim().is_empty(),
            Self::Program { program, .. } => program.trim().is_empty(),
        }
    }
}

impl Default for LaunchCommand {
    fn default() -> Self {
        Self::shell(DEFAULT_LAUNCH_COMMAND)
    }
}

/// How replies are matched to commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correlation {
    /// The next line on stdout is the reply to the last command written
    #[default]
    Positional,
    /// Commands are stamped with an `id` and only a line echoing it is accepted
    ById,
}

impl std::str::FromStr for Correlation {
    type Err = SupervisorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positional" | "fifo" => Ok(Self::Positional),
            "id" | "by_id" | "by-id" => Ok(Self::ById),
            other => Err(SupervisorError::invalid_config(format!(
                "unknown correlation mode '{other}' (expected 'positional' or 'id')"
            ))),
        }
    }
}

// ============================================================================
// Supervisor Options
// ============================================================================

/// Main options for a process supervisor
#[derive(Clone)]
pub struct SupervisorOptions {
    /// How to launch the child
    pub command: LaunchCommand,
    /// Extra environment variables for the child
    pub env: HashMap<String, String>,
    /// Working directory for the child
    pub cwd: Option<PathBuf>,
    /// Delay after spawning before `start` returns
    pub settle_delay: Duration,
    /// How long `send` waits for a reply
    pub response_timeout: Duration,
    /// How long `stop` waits after the graceful signal before killing
    pub grace_period: Duration,
    /// How long `stop` waits for each pipe reader to finish
    pub reader_join_timeout: Duration,
    /// Longest accepted line on stdout or stderr, in bytes
    pub max_line_bytes: usize,
    /// Reply matching strategy
    pub correlation: Correlation,
    /// Where stderr lines go (defaults to the log sink)
    pub diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            command: LaunchCommand::default(),
            env: HashMap::new(),
            cwd: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
            reader_join_timeout: DEFAULT_READER_JOIN_TIMEOUT,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            correlation: Correlation::default(),
            diagnostics: None,
        }
    }
}

impl SupervisorOptions {
    /// Create a new builder for `SupervisorOptions`
    #[must_use]
    pub fn builder() -> SupervisorOptionsBuilder {
        SupervisorOptionsBuilder::default()
    }

    /// Load options from the process environment
    ///
    /// # Errors
    /// Returns `SupervisorError::InvalidConfig` if a variable is present but malformed
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load options through an arbitrary key lookup
    ///
    /// Unset keys keep their defaults.
    ///
    /// # Errors
    /// Returns `SupervisorError::InvalidConfig` if a value is present but malformed
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(command) = lookup(ENV_COMMAND) {
            options.command = LaunchCommand::shell(command);
        }
        if let Some(ms) = lookup(ENV_SETTLE_MS) {
            options.settle_delay = parse_millis(ENV_SETTLE_MS, &ms)?;
        }
        if let Some(ms) = lookup(ENV_TIMEOUT_MS) {
            options.response_timeout = parse_millis(ENV_TIMEOUT_MS, &ms)?;
        }
        if let Some(ms) = lookup(ENV_GRACE_MS) {
            options.grace_period = parse_millis(ENV_GRACE_MS, &ms)?;
        }
        if let Some(mode) = lookup(ENV_CORRELATION) {
            options.correlation = mode.parse()?;
        }

        options.validate()?;
        Ok(options)
    }

    /// Check the options for values that can never work
    ///
    /// # Errors
    /// Returns `SupervisorError::InvalidConfig` describing the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.command.is_blank() {
            return Err(SupervisorError::invalid_config("launch command is empty"));
        }
        if self.response_timeout.is_zero() {
            return Err(SupervisorError::invalid_config(
                "response timeout must be greater than zero",
            ));
        }
        if self.max_line_bytes == 0 {
            return Err(SupervisorError::invalid_config(
                "max line length must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| SupervisorError::invalid_config(format!("{key}={value:?}: {e}")))
}

impl std::fmt::Debug for SupervisorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisorOptions")
            .field("command", &self.command)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("cwd", &self.cwd)
            .field("settle_delay", &self.settle_delay)
            .field("response_timeout", &self.response_timeout)
            .field("grace_period", &self.grace_period)
            .field("reader_join_timeout", &self.reader_join_timeout)
            .field("max_line_bytes", &self.max_line_bytes)
            .field("correlation", &self.correlation)
            .field(
                "diagnostics",
                &self.diagnostics.as_ref().map(|_| "<sink>"),
            )
            .finish()
    }
}

// ============================================================================
// Builder for SupervisorOptions
// ============================================================================

/// Builder for `SupervisorOptions`
#[derive(Debug, Default)]
pub struct SupervisorOptionsBuilder {
    options: SupervisorOptions,
}

impl SupervisorOptionsBuilder {
    /// Launch the child through the shell
    #[must_use]
    pub fn shell_command(mut self, command: impl Into<String>) -> Self {
        self.options.command = LaunchCommand::shell(command);
        self
    }

    /// Launch a program resolved on `PATH`
    #[must_use]
    pub fn program<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.command = LaunchCommand::program(program, args);
        self
    }

    /// Set an environment variable for the child
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    /// Set working directory
    #[must_use]
    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(path.into());
        self
    }

    /// Set the post-spawn settle delay
    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.options.settle_delay = delay;
        self
    }

    /// Set the reply timeout for `send`
    #[must_use]
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.options.response_timeout = timeout;
        self
    }

    /// Set the graceful termination window for `stop`
    #[must_use]
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.options.grace_period = grace;
        self
    }

    /// Set the bounded wait for pipe readers during `stop`
    #[must_use]
    pub fn reader_join_timeout(mut self, timeout: Duration) -> Self {
        self.options.reader_join_timeout = timeout;
        self
    }

    /// Set the longest accepted line
    #[must_use]
    pub fn max_line_bytes(mut self, bytes: usize) -> Self {
        self.options.max_line_bytes = bytes;
        self
    }

    /// Set the correlation mode
    #[must_use]
    pub fn correlation(mut self, correlation: Correlation) -> Self {
        self.options.correlation = correlation;
        self
    }

    /// Route stderr lines to a custom sink
    #[must_use]
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.options.diagnostics = Some(sink);
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> SupervisorOptions {
        self.options
    }
}
