//! Running external tools under a [`RunControl`].

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::pipeline::RunControl;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Resolve a tool binary: explicit path first, then `PATH`.
pub fn locate_tool(tool: &str, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        log::warn!(
            "Configured {tool} binary {} does not exist, searching PATH",
            path.display()
        );
    }
    which::which(tool).map_err(|_| Error::ToolNotFound {
        tool: tool.to_string(),
    })
}

/// Run `cmd` to completion, failing on nonzero exit.
///
/// The child is polled so that cancellation and the run deadline are observed
/// while it runs; in either case it is killed and reaped before returning.
pub fn run_tool(tool: &str, mut cmd: Command, control: &RunControl) -> Result<()> {
    control.check()?;
    log::debug!("Running {tool}: {cmd:?}");

    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ToolNotFound {
                tool: tool.to_string(),
            }
        } else {
            Error::Spawn {
                tool: tool.to_string(),
                source: e,
            }
        }
    })?;

    // Drain stderr concurrently so a chatty tool cannot block on a full pipe.
    let stderr_reader = child.stderr.take().map(|mut err| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = err.read_to_string(&mut buf);
            buf
        })
    });

    // On cancellation the reader is left detached: grandchildren of a killed
    // tool may still hold the pipe open.
    let status = wait_controlled(&mut child, control).map_err(|e| match e {
        Error::Io(source) => Error::Spawn {
            tool: tool.to_string(),
            source,
        },
        other => other,
    })?;
    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    if !status.success() {
        return Err(Error::ExternalProcess {
            tool: tool.to_string(),
            exit_code: status.code(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(())
}

fn wait_controlled(child: &mut Child, control: &RunControl) -> Result<ExitStatus> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if let Err(stop) = control.check() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(stop);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::pipeline::CancelToken;
    use std::time::Instant;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }

    #[test]
    fn successful_command() {
        run_tool("sh", sh("exit 0"), &RunControl::unbounded()).unwrap();
    }

    #[test]
    fn nonzero_exit_captures_stderr() {
        let err = run_tool("sh", sh("echo broken >&2; exit 3"), &RunControl::unbounded())
            .unwrap_err();
        match err {
            Error::ExternalProcess {
                tool,
                exit_code,
                stderr,
            } => {
                assert_eq!(tool, "sh");
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn missing_binary_is_tool_not_found() {
        let cmd = Command::new("definitely-not-a-real-tool-xyz");
        let err = run_tool("fake", cmd, &RunControl::unbounded()).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[test]
    fn deadline_kills_long_running_tool() {
        let control = RunControl::new(None, Some(Duration::from_millis(100)));
        let start = Instant::now();
        let err = run_tool("sh", sh("sleep 5"), &control).unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn cancellation_stops_tool() {
        let interrupt = CancelToken::new();
        let control = RunControl::new(Some(interrupt.clone()), None);
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            interrupt.cancel();
        });
        let start = Instant::now();
        let err = run_tool("sh", sh("sleep 5"), &control).unwrap_err();
        canceller.join().unwrap();
        assert!(matches!(err, Error::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn already_cancelled_run_spawns_nothing() {
        let interrupt = CancelToken::new();
        interrupt.cancel();
        let control = RunControl::new(Some(interrupt), None);
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let err = run_tool("sh", sh(&format!("touch {}", marker.display())), &control)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(!marker.exists());
    }

    #[test]
    fn locate_prefers_existing_explicit_path() {
        let found = locate_tool("sh", Some(Path::new("/bin/sh"))).unwrap();
        assert_eq!(found, PathBuf::from("/bin/sh"));
        assert!(locate_tool("definitely-not-a-real-tool-xyz", None).is_err());
    }
}
