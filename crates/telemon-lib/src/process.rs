//! Process termination action
//!
//! Graceful termination with forced escalation: SIGTERM first, a short
//! wait for the process to exit, then SIGKILL. Not-found and delivery
//! failure are reported distinctly so callers can map them to different
//! responses.

use std::time::Duration;
use sysinfo::{Pid, ProcessesToUpdate, Signal, System};
use thiserror::Error;
use tracing::debug;

/// How long to wait for an exit after each signal
pub const DEFAULT_TERMINATION_GRACE: Duration = Duration::from_secs(2);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How a process ended up terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// Exited after the graceful signal
    Terminated,
    /// Survived the grace period and was force-killed
    ForceKilled,
}

#[derive(Debug, Error)]
pub enum TerminationError {
    #[error("process {0} not found")]
    NotFound(u32),
    #[error("failed to signal process {0}")]
    SignalFailed(u32),
    #[error("process {0} survived forced termination")]
    Unkillable(u32),
}

/// Terminate a process by PID, escalating to a forced kill on timeout
pub async fn terminate_process(
    pid: u32,
    grace: Duration,
) -> Result<TerminationOutcome, TerminationError> {
    let target = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[target]), true);

    let process = sys
        .process(target)
        .ok_or(TerminationError::NotFound(pid))?;

    // SIGTERM where supported, otherwise straight to a hard kill
    let signalled = process
        .kill_with(Signal::Term)
        .unwrap_or_else(|| process.kill());
    if !signalled {
        return Err(TerminationError::SignalFailed(pid));
    }

    if wait_for_exit(&mut sys, target, grace).await {
        debug!(pid, "Process exited after graceful signal");
        return Ok(TerminationOutcome::Terminated);
    }

    let force_sent = match sys.process(target) {
        None => return Ok(TerminationOutcome::Terminated),
        Some(process) => process.kill(),
    };
    if !force_sent {
        return Err(TerminationError::SignalFailed(pid));
    }

    if wait_for_exit(&mut sys, target, grace).await {
        debug!(pid, "Process exited after forced kill");
        Ok(TerminationOutcome::ForceKilled)
    } else {
        Err(TerminationError::Unkillable(pid))
    }
}

/// Poll until the process disappears or the grace period elapses
async fn wait_for_exit(sys: &mut System, target: Pid, grace: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + grace;
    loop {
        tokio::time::sleep(EXIT_POLL_INTERVAL).await;
        sys.refresh_processes(ProcessesToUpdate::Some(&[target]), true);
        if sys.process(target).is_none() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_pid_reports_not_found() {
        // a PID far beyond any real pid_max
        let result = terminate_process(999_999_999, Duration::from_millis(50)).await;

        assert!(matches!(result, Err(TerminationError::NotFound(999_999_999))));
    }
}
