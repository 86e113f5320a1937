// src/exec/output.rs

//! Turning raw process output into text lines.
//!
//! A child's stdout and stderr are both pointed at the write end of one OS
//! pipe, so the lines read back keep the order the process wrote them in.

use std::io;
use std::process::Stdio;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Strip one trailing `\n` (or `\r\n`) and replace invalid UTF-8 with U+FFFD.
pub fn sanitize_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if raw[..end].ends_with(b"\n") {
        end -= 1;
        if raw[..end].ends_with(b"\r") {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Read end of the pipe shared by a child's stdout and stderr.
#[derive(Debug)]
pub struct MergedOutput {
    #[cfg(unix)]
    reader: tokio::net::unix::pipe::Receiver,
    #[cfg(not(unix))]
    reader: io::PipeReader,
}

/// Write handles for the child's stdout and stderr.
#[derive(Debug)]
pub struct OutputWriters {
    pub stdout: Stdio,
    pub stderr: Stdio,
}

/// Create the shared pipe.
///
/// Must be called inside a Tokio runtime. The writers must be handed to the
/// command and the command dropped after spawning, otherwise the reader
/// never sees EOF.
pub fn merged_pipe() -> io::Result<(MergedOutput, OutputWriters)> {
    let (reader, writer) = io::pipe()?;
    let writers = OutputWriters {
        stderr: Stdio::from(writer.try_clone()?),
        stdout: Stdio::from(writer),
    };

    #[cfg(unix)]
    let reader =
        tokio::net::unix::pipe::Receiver::from_owned_fd(std::os::fd::OwnedFd::from(reader))?;

    Ok((MergedOutput { reader }, writers))
}

impl MergedOutput {
    /// Forward every line into `tx` until EOF.
    ///
    /// Once the receiving side is gone the reader keeps draining so the
    /// child never blocks on a full pipe.
    #[cfg(unix)]
    pub fn spawn_reader(self, pid: Option<u32>, tx: mpsc::Sender<String>) -> JoinHandle<()> {
        use tokio::io::{AsyncBufReadExt, BufReader};

        tokio::spawn(async move {
            let mut reader = BufReader::new(self.reader);
            let mut buf = Vec::with_capacity(256);
            let mut forwarding = true;

            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        if forwarding && tx.send(sanitize_line(&buf)).await.is_err() {
                            debug!(?pid, "output receiver dropped; draining");
                            forwarding = false;
                        }
                    }
                    Err(e) => {
                        warn!(?pid, error = %e, "reading process output failed");
                        break;
                    }
                }
            }

            debug!(?pid, "output stream closed");
        })
    }

    /// Without a pollable pipe the read end is drained on the blocking pool.
    #[cfg(not(unix))]
    pub fn spawn_reader(self, pid: Option<u32>, tx: mpsc::Sender<String>) -> JoinHandle<()> {
        use std::io::BufRead;

        tokio::task::spawn_blocking(move || {
            let mut reader = io::BufReader::new(self.reader);
            let mut buf = Vec::with_capacity(256);
            let mut forwarding = true;

            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        if forwarding && tx.blocking_send(sanitize_line(&buf)).is_err() {
                            debug!(?pid, "output receiver dropped; draining");
                            forwarding = false;
                        }
                    }
                    Err(e) => {
                        warn!(?pid, error = %e, "reading process output failed");
                        break;
                    }
                }
            }

            debug!(?pid, "output stream closed");
        })
    }
}
