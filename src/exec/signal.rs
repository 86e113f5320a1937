// src/exec/signal.rs

//! Platform glue for interrupting a child and reading its exit status.

use std::io;
use std::process::ExitStatus;

use tokio::process::Child;

use super::handle::{ExitCode, UNKNOWN_EXIT_CODE};

/// Send an advisory interrupt (SIGINT) to a still-unreaped child.
///
/// Fails with `NotFound` once the child has been reaped.
#[cfg(unix)]
pub fn interrupt(child: &mut Child) -> io::Result<()> {
    let pid = child
        .id()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "process already reaped"))?;
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    // SAFETY: kill(2) has no memory-safety preconditions; a positive pid
    // targets exactly our unreaped child.
    let rc = unsafe { libc::kill(pid, libc::SIGINT) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Without POSIX signals the closest equivalent is a termination request.
#[cfg(not(unix))]
pub fn interrupt(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

/// Map an exit status to the integer reported to clients.
pub fn exit_code(status: ExitStatus) -> ExitCode {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    UNKNOWN_EXIT_CODE
}
