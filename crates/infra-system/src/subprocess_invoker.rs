// Subprocess invoker implementation
// reason: async-trait, tokio for async process management
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use adb_dispatch_core::port::{
    InvocationError, InvokeOptions, ProcessInvoker, RawOutput, TimeProvider,
};

/// Subprocess invoker
/// Runs the tool as a direct child (no shell), capturing both streams under a cap
pub struct SubprocessInvoker {
    time_provider: Arc<dyn TimeProvider>,
}

impl SubprocessInvoker {
    /// Create a new subprocess invoker
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    /// Spawn the child and collect its streams and exit status
    ///
    /// The child is killed when dropped, so a timeout or an overrun stream
    /// never leaves it running.
    async fn spawn_and_collect(
        &self,
        executable: &str,
        args: &[String],
        options: &InvokeOptions,
    ) -> Result<(Vec<u8>, Vec<u8>, std::process::ExitStatus), InvocationError> {
        let mut child = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| InvocationError::SpawnFailed(e.to_string()))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = options.max_output_bytes;

        let collect = async {
            tokio::try_join!(
                read_capped(stdout, limit),
                read_capped(stderr, limit),
                async {
                    child
                        .wait()
                        .await
                        .map_err(|e| InvocationError::IoError(e.to_string()))
                },
            )
        };

        match timeout(options.timeout, collect).await {
            Ok(result) => result,
            Err(_) => Err(InvocationError::Timeout(options.timeout.as_millis() as u64)),
        }
    }
}

/// Read a whole stream, failing once it exceeds `limit` bytes
async fn read_capped<R>(reader: Option<R>, limit: usize) -> Result<Vec<u8>, InvocationError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let Some(reader) = reader else {
        return Ok(buf);
    };

    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut buf)
        .await
        .map_err(|e| InvocationError::IoError(e.to_string()))?;

    if buf.len() > limit {
        return Err(InvocationError::OutputLimitExceeded { limit });
    }
    Ok(buf)
}

#[async_trait]
impl ProcessInvoker for SubprocessInvoker {
    async fn invoke(
        &self,
        executable: &str,
        args: &[String],
        options: &InvokeOptions,
    ) -> Result<RawOutput, InvocationError> {
        let start_time = self.time_provider.now_millis();

        debug!(
            executable = %executable,
            args = ?args,
            timeout_ms = options.timeout.as_millis() as u64,
            "Starting subprocess"
        );

        let result = self.spawn_and_collect(executable, args, options).await;
        let duration_ms = self.time_provider.now_millis() - start_time;

        let (stdout, stderr, status) = match result {
            Ok(collected) => collected,
            Err(e) => {
                warn!(executable = %executable, args = ?args, error = %e, "Subprocess failed");
                return Err(e);
            }
        };

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        info!(
            args = ?args,
            duration_ms = %duration_ms,
            exit_code = ?status.code(),
            "Subprocess completed"
        );

        if !status.success() {
            return Err(InvocationError::NonZeroExit {
                code: status.code(),
                stdout,
                stderr,
            });
        }

        Ok(RawOutput {
            exit_code: status.code(),
            stdout,
            stderr,
            duration_ms,
        })
    }
}
