// Line-oriented front end for the MCP process supervisor
//
// Reads one JSON command per line from stdin, forwards it to the supervised
// child, and prints each reply as one JSON line on stdout. Configuration comes
// from MCP_SUPERVISOR_* environment variables; any command-line arguments
// replace the launch command.

use anyhow::{Context, Result};
use mcp_process_supervisor::{LaunchCommand, ProcessSupervisor, SupervisorOptions};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut options = SupervisorOptions::from_env().context("invalid supervisor configuration")?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        options.command = LaunchCommand::shell(args.join(" "));
    }

    let supervisor = ProcessSupervisor::new(options);
    supervisor
        .start()
        .await
        .context("failed to start MCP process")?;
    log::info!("Supervisor {} ready; reading commands from stdin", supervisor.id());

    let result = tokio::select! {
        result = forward_stdin(&supervisor) => result,
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted");
            Ok(())
        }
    };

    supervisor.stop().await;
    result
}

async fn forward_stdin(supervisor: &ProcessSupervisor) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let output = match serde_json::from_str::<Value>(line) {
            Ok(command) => match supervisor.send(&command).await {
                Ok(reply) => reply.into_value(),
                Err(e) => json!({ "status": "error", "message": e.to_string() }),
            },
            Err(e) => json!({ "status": "error", "message": format!("input is not JSON: {e}") }),
        };

        let mut rendered = serde_json::to_string(&output)?;
        rendered.push('\n');
        stdout.write_all(rendered.as_bytes()).await?;
        stdout.flush().await?;

        if !supervisor.is_running() {
            log::warn!("MCP process is no longer running");
            break;
        }
    }

    Ok(())
}
