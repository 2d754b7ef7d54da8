//! Termination signals for the child's process group
//!
//! The child is spawned as the leader of its own process group, so signalling
//! the group also reaches whatever the launch shell started (e.g. `npx` and
//! the node process behind it).

/// Ask the child's process group to terminate (SIGTERM)
#[cfg(unix)]
pub(super) fn request_termination(pid: u32) {
    send_to_group(pid, nix::sys::signal::Signal::SIGTERM);
}

/// Kill the child's process group outright (SIGKILL)
#[cfg(unix)]
pub(super) fn kill_group(pid: u32) {
    send_to_group(pid, nix::sys::signal::Signal::SIGKILL);
}

#[cfg(unix)]
fn send_to_group(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::errno::Errno;
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), signal) {
        // Group already gone
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => log::warn!("Failed to send {signal:?} to process group {pid}: {e}"),
    }
}

/// Closing stdin is the only graceful request available off unix
#[cfg(not(unix))]
pub(super) fn request_termination(_pid: u32) {}

/// `Child::kill` handles the forced path off unix
#[cfg(not(unix))]
pub(super) fn kill_group(_pid: u32) {}
