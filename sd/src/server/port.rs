//! Port reclaim - terminate whatever already listens on our port

use std::process::Command;
use std::time::Duration;

use eyre::{Context, Result};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

/// Time given to terminated processes to release the port
pub const RECLAIM_GRACE: Duration = Duration::from_millis(500);

/// Parse `lsof -t` output into PIDs
pub fn parse_pids(output: &str) -> Vec<i32> {
    let mut pids: Vec<i32> = output
        .lines()
        .filter_map(|line| line.trim().parse::<i32>().ok())
        .filter(|pid| *pid > 0)
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}

/// PIDs listening on a TCP port, via `lsof`
pub fn listening_pids(port: u16) -> Result<Vec<i32>> {
    debug!(port, "listening_pids: called");
    let output = Command::new("lsof")
        .args(["-t", &format!("-iTCP:{}", port), "-sTCP:LISTEN"])
        .output()
        .context("Failed to run lsof")?;

    // lsof exits 1 when nothing matches
    Ok(parse_pids(&String::from_utf8_lossy(&output.stdout)))
}

/// Send SIGTERM to every other process listening on `port`
///
/// Returns the PIDs that were signalled. The current process is never
/// signalled.
pub fn reclaim_port(port: u16) -> Result<Vec<i32>> {
    let own = std::process::id() as i32;
    let mut signalled = Vec::new();

    for pid in listening_pids(port)? {
        if pid == own {
            debug!(pid, "reclaim_port: skipping self");
            continue;
        }
        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) => {
                info!(pid, port, "Sent SIGTERM to process holding port");
                signalled.push(pid);
            }
            Err(e) => warn!(pid, port, error = %e, "Failed to signal process holding port"),
        }
    }

    Ok(signalled)
}
