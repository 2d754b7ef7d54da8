//! Lifecycle management for the supervised child (start, stop, reap)

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SupervisorError};
use crate::types::SupervisorState;

use super::channel::response_channel;
use super::command::CommandBuilder;
use super::reader::{ReaderExit, spawn_stderr_reader, spawn_stdout_reader};
use super::signal;
use super::{ChildProcess, CommandPipe, ProcessSupervisor};

impl ProcessSupervisor {
    /// Spawn the child, wire up its pipes, and wait out the settle delay
    ///
    /// # Errors
    /// Returns error if the options are invalid, the child cannot be spawned,
    /// or it exits before the settle delay is over
    pub(super) async fn start_impl(&self) -> Result<()> {
        let mut process = self.process.lock().await;
        if process.is_some() {
            log::info!("[{}] MCP process is already running.", self.tag());
            return Ok(());
        }

        self.options.validate()?;

        let (running, pipe) = match self.spawn_child() {
            Ok(spawned) => spawned,
            Err(e) => {
                log::error!("[{}] Failed to start MCP process: {e}", self.tag());
                return Err(e);
            }
        };

        // Starting only once a handle exists
        self.set_state(SupervisorState::Starting);
        {
            let mut run = self.run.lock();
            run.pid = running.pid;
            run.started_at = Some(Utc::now());
        }
        *self.pipe.lock().await = Some(pipe);
        let running = process.insert(running);
        self.set_state(SupervisorState::Running);
        log::info!(
            "[{}] MCP process started successfully (pid {:?}).",
            self.tag(),
            running.pid
        );

        if !self.options.settle_delay.is_zero() {
            tokio::time::sleep(self.options.settle_delay).await;
        }

        // A child that died while settling never became ready
        if let Ok(Some(status)) = running.child.try_wait() {
            if let Some(running) = process.take() {
                self.teardown(running).await;
            }
            return Err(SupervisorError::launch(format!(
                "MCP process exited during startup with {status}"
            )));
        }

        Ok(())
    }

    fn spawn_child(&self) -> Result<(ChildProcess, CommandPipe)> {
        let mut cmd = CommandBuilder::new(&self.options).build()?;
        log::info!(
            "[{}] Starting MCP process with command: {}",
            self.tag(),
            self.options.command.display()
        );

        let mut child = cmd.spawn().map_err(|e| {
            if let Some(ref cwd) = self.options.cwd
                && !cwd.exists()
            {
                return SupervisorError::launch(format!(
                    "Working directory does not exist: {}",
                    cwd.display()
                ));
            }
            SupervisorError::launch(format!(
                "Failed to spawn '{}': {e}",
                self.options.command.display()
            ))
        })?;

        // kill_on_drop reaps the child if any of these are missing
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SupervisorError::launch("Failed to get stdin handle"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SupervisorError::launch("Failed to get stdout handle"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SupervisorError::launch("Failed to get stderr handle"))?;

        let cancel = CancellationToken::new();
        let (responses_tx, responses) = response_channel();

        let stdout_task = spawn_stdout_reader(
            stdout,
            responses_tx,
            cancel.clone(),
            self.options.max_line_bytes,
            self.tag(),
        );
        let stderr_task = spawn_stderr_reader(
            stderr,
            Arc::clone(&self.sink),
            cancel.clone(),
            self.options.max_line_bytes,
            self.tag(),
        );

        let pid = child.id();
        Ok((
            ChildProcess {
                child,
                pid,
                cancel: cancel.clone(),
                stdout_task,
                stderr_task,
            },
            CommandPipe {
                stdin,
                responses,
                cancel,
            },
        ))
    }

    /// Stop the child if there is one
    pub(super) async fn stop_impl(&self) {
        let mut process = self.process.lock().await;
        let Some(running) = process.take() else {
            log::debug!("[{}] stop requested but MCP process is not running", self.tag());
            return;
        };

        log::info!("[{}] Stopping MCP process...", self.tag());
        self.teardown(running).await;
        log::info!("[{}] MCP process stopped.", self.tag());
    }

    /// Verify the child is alive, tearing everything down if it exited on its own
    ///
    /// # Errors
    /// Returns `SupervisorError::NotRunning` if there is no live child
    pub(super) async fn ensure_running(&self) -> Result<()> {
        if self.state() == SupervisorState::Stopped {
            return Err(SupervisorError::NotRunning);
        }

        let mut process = self.process.lock().await;
        let exited = match process.as_mut() {
            None => return Err(SupervisorError::NotRunning),
            Some(running) => running.child.try_wait()?,
        };

        match exited {
            None => Ok(()),
            Some(status) => {
                log::warn!(
                    "[{}] MCP process exited unexpectedly with {status}",
                    self.tag()
                );
                if let Some(running) = process.take() {
                    self.teardown(running).await;
                }
                Err(SupervisorError::NotRunning)
            }
        }
    }

    /// Release everything tied to one running period
    ///
    /// Callers hold the `process` lock and have already taken `running` out of it.
    async fn teardown(&self, mut running: ChildProcess) {
        self.set_state(SupervisorState::Stopping);

        // Readers first, then EOF on stdin as the gentlest request to exit
        running.cancel.cancel();
        drop(self.pipe.lock().await.take());

        terminate(
            &mut running.child,
            running.pid,
            self.options.grace_period,
            &self.tag(),
        )
        .await;

        let join_timeout = self.options.reader_join_timeout;
        let tag = self.tag();
        futures::future::join(
            join_reader(running.stdout_task, join_timeout, &tag, "stdout"),
            join_reader(running.stderr_task, join_timeout, &tag, "stderr"),
        )
        .await;

        self.set_state(SupervisorState::Stopped);
    }

    /// Best-effort cleanup when the supervisor is dropped while running
    pub(super) fn drop_impl(&mut self) {
        drop(self.pipe.get_mut().take());

        if let Some(mut running) = self.process.get_mut().take() {
            running.cancel.cancel();
            if let Some(pid) = running.pid {
                signal::kill_group(pid);
            }
            let _ = running.child.start_kill();
            running.stdout_task.abort();
            running.stderr_task.abort();
        }
    }
}

/// Graceful termination request, bounded wait, then forced kill
async fn terminate(child: &mut Child, pid: Option<u32>, grace: Duration, tag: &str) {
    match child.try_wait() {
        Ok(Some(status)) => {
            log::debug!("[{tag}] MCP process already exited with {status}");
            // Descendants of the shell may outlive it; the group id stays
            // reserved while any member is alive
            if let Some(pid) = pid {
                signal::kill_group(pid);
            }
            return;
        }
        Ok(None) => {}
        Err(e) => log::warn!("[{tag}] Failed to poll MCP process: {e}"),
    }

    if let Some(pid) = pid {
        signal::request_termination(pid);
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => {
            log::debug!("[{tag}] MCP process exited with {status}");
            return;
        }
        Ok(Err(e)) => log::warn!("[{tag}] Failed to wait for MCP process: {e}"),
        Err(_) => log::warn!(
            "[{tag}] MCP process did not exit within {grace:?}, killing it"
        ),
    }

    if let Some(pid) = pid {
        signal::kill_group(pid);
    }
    if let Err(e) = child.kill().await {
        log::warn!("[{tag}] Failed to kill MCP process: {e}");
    }
}

async fn join_reader(task: JoinHandle<ReaderExit>, timeout: Duration, tag: &str, stream: &str) {
    let abort = task.abort_handle();
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(exit)) => log::debug!("[{tag}] {stream} reader joined: {exit:?}"),
        Ok(Err(e)) => log::warn!("[{tag}] {stream} reader panicked or was aborted: {e}"),
        Err(_) => {
            log::warn!("[{tag}] {stream} reader did not finish within {timeout:?}, aborting");
            abort.abort();
        }
    }
}
