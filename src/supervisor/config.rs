//! Configuration constants for the process supervisor

use std::time::Duration;

/// Child launched when no command is configured
pub const DEFAULT_LAUNCH_COMMAND: &str = "npx -y @mobilenext/mobile-mcp@latest";

/// Time given to the child to become ready after spawning
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// How long `send` waits for a reply line
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Window between the graceful termination request and the forced kill
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Bounded wait for each pipe reader during `stop`
pub const DEFAULT_READER_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Default maximum line length on stdout/stderr (64MB, room for base64 screenshots)
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024 * 1024;

/// Environment variables that are never forwarded from the options to the child
///
/// These variables change how the child loads and executes code.
pub const DANGEROUS_ENV_VARS: &[&str] = &[
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    "NODE_OPTIONS",
];

/// Environment variable telling the child which supervisor version launched it
pub const SUPERVISOR_VERSION_ENV: &str = "MCP_SUPERVISOR_VERSION";
