//! FFmpeg execution adapter
//!
//! Resolves the encoder binary and wraps every encoder subprocess in a
//! single process-handle abstraction: spawn, await, cancel with a
//! bounded grace period, then force-kill. The encoding pipeline, the
//! compression ladder and the preview renderer all go through this
//! handle rather than spawning processes themselves.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::error::{StickClipError, StickClipResult};

/// Grace period between the termination signal and a force-kill
pub const CANCEL_GRACE: Duration = Duration::from_secs(3);

/// A resolved encoder (or probe) executable
#[derive(Debug, Clone)]
pub struct FfmpegBinary {
    path: PathBuf,
}

impl FfmpegBinary {
    /// Resolve an executable by precedence: explicit configuration, then
    /// the given environment variable, then a PATH search.
    pub fn resolve(
        name: &str,
        configured: Option<&str>,
        env_var: &str,
    ) -> StickClipResult<Self> {
        if let Some(configured) = configured {
            let path = PathBuf::from(configured);
            if path.exists() {
                return Ok(Self { path });
            }
            return Err(StickClipError::Configuration {
                message: format!("configured {} binary not found at {}", name, configured),
            });
        }

        if let Some(from_env) = std::env::var_os(env_var) {
            let path = PathBuf::from(&from_env);
            if path.exists() {
                return Ok(Self { path });
            }
            return Err(StickClipError::Configuration {
                message: format!(
                    "{} pointed {} at {}, which does not exist",
                    env_var,
                    name,
                    path.display()
                ),
            });
        }

        search_path(name).map(|path| Self { path }).ok_or_else(|| {
            StickClipError::Configuration {
                message: format!("{} not found on PATH; install it or set {}", name, env_var),
            }
        })
    }

    /// Wrap a path without checking it exists. Used by tests and by
    /// callers that already validated the path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Search PATH entries for an executable
fn search_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let with_exe = dir.join(format!("{}.exe", name));
            if with_exe.is_file() {
                return Some(with_exe);
            }
        }
    }
    None
}

/// Cooperative cancellation signal for one subprocess invocation.
///
/// Cloned by whoever may need to abort; the permit is stored, so a
/// cancel that races ahead of the spawn is still observed.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<Notify>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination of the associated process
    pub fn cancel(&self) {
        self.inner.notify_one();
    }

    async fn cancelled(&self) {
        self.inner.notified().await;
    }
}

/// Completed subprocess outcome: exit status plus captured stderr
#[derive(Debug)]
pub struct ProcessOutcome {
    pub success: bool,
    pub stderr: String,
}

/// One spawned subprocess, awaited to completion or cancelled.
pub struct FfmpegInvocation {
    child: Child,
    stderr_task: tokio::task::JoinHandle<String>,
}

impl FfmpegInvocation {
    /// Spawn the binary with the given arguments. stderr is captured
    /// concurrently so a chatty process can never fill the pipe and
    /// stall.
    pub fn spawn(binary: &FfmpegBinary, args: &[String]) -> StickClipResult<Self> {
        debug!("spawning {} {}", binary.path().display(), args.join(" "));
        let mut child = Command::new(binary.path())
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    StickClipError::Configuration {
                        message: format!("failed to launch {}: {}", binary.path().display(), e),
                    }
                } else {
                    StickClipError::Io(e)
                }
            })?;

        let stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_end(&mut buf).await;
            }
            String::from_utf8_lossy(&buf).into_owned()
        });

        Ok(Self { child, stderr_task })
    }

    /// Await the process, or tear it down when `cancel` fires.
    ///
    /// Cancellation sends the termination signal, waits out the grace
    /// period, force-kills if necessary, and always surfaces as
    /// `Cancelled`.
    pub async fn run(mut self, cancel: &CancelHandle) -> StickClipResult<ProcessOutcome> {
        let waited = tokio::select! {
            status = self.child.wait() => Some(status),
            _ = cancel.cancelled() => None,
        };

        match waited {
            Some(status) => {
                let status = status?;
                let stderr = self.stderr_task.await.unwrap_or_default();
                Ok(ProcessOutcome {
                    success: status.success(),
                    stderr,
                })
            }
            None => {
                self.terminate_with_grace().await;
                self.stderr_task.abort();
                Err(StickClipError::Cancelled)
            }
        }
    }

    /// Await the process without a cancellation path
    pub async fn run_to_completion(self) -> StickClipResult<ProcessOutcome> {
        let never = CancelHandle::new();
        self.run(&never).await
    }

    async fn terminate_with_grace(&mut self) {
        #[cfg(unix)]
        {
            if let Some(pid) = self.child.id() {
                // SAFETY: plain signal send to our own child's pid.
                unsafe {
                    libc::kill(pid as libc::pid_t, libc::SIGTERM);
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.start_kill();
        }

        match tokio::time::timeout(CANCEL_GRACE, self.child.wait()).await {
            Ok(_) => debug!("subprocess exited within the cancellation grace period"),
            Err(_) => {
                warn!("subprocess ignored termination; force-killing");
                let _ = self.child.kill().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[cfg(unix)]
    fn sleep_binary() -> FfmpegBinary {
        let path = if Path::new("/bin/sleep").exists() {
            "/bin/sleep"
        } else {
            "/usr/bin/sleep"
        };
        FfmpegBinary::at(path)
    }

    #[test]
    fn test_resolve_missing_configured_path_is_configuration_error() {
        let err = FfmpegBinary::resolve(
            "ffmpeg",
            Some("/nonexistent/ffmpeg"),
            "STICKCLIP_TEST_UNSET_VAR",
        )
        .unwrap_err();
        assert!(matches!(err, StickClipError::Configuration { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_completed_process_reports_status() {
        let invocation = FfmpegInvocation::spawn(&sleep_binary(), &["0".to_string()]).unwrap();
        let outcome = invocation.run_to_completion().await.unwrap();
        assert!(outcome.success);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_yields_cancelled_within_grace() {
        let cancel = CancelHandle::new();
        let invocation = FfmpegInvocation::spawn(&sleep_binary(), &["30".to_string()]).unwrap();

        let started = Instant::now();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let err = invocation.run(&cancel).await.unwrap_err();
        assert!(matches!(err, StickClipError::Cancelled));
        assert!(started.elapsed() < CANCEL_GRACE + Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_before_spawn_is_still_observed() {
        let cancel = CancelHandle::new();
        cancel.cancel();
        let invocation = FfmpegInvocation::spawn(&sleep_binary(), &["30".to_string()]).unwrap();
        let err = invocation.run(&cancel).await.unwrap_err();
        assert!(matches!(err, StickClipError::Cancelled));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_process_surfaces_stderr() {
        // `sleep` with a bogus argument exits non-zero and complains on
        // stderr.
        let invocation =
            FfmpegInvocation::spawn(&sleep_binary(), &["--bogus-flag".to_string()]).unwrap();
        let outcome = invocation.run_to_completion().await.unwrap();
        assert!(!outcome.success);
        assert!(!outcome.stderr.is_empty());
    }
}
