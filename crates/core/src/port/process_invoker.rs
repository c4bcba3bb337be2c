// Process Invoker Port
// Abstraction for running one external command to completion

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Per-invocation limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeOptions {
    pub timeout: Duration,
    /// Cap applied to each captured stream
    pub max_output_bytes: usize,
}

impl InvokeOptions {
    pub const fn new(timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            timeout,
            max_output_bytes,
        }
    }
}

/// Captured streams of a process that exited successfully
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: i64,
}

/// Process-level failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Command timed out after {0}ms")]
    Timeout(u64),

    #[error("Output exceeded buffer limit of {limit} bytes")]
    OutputLimitExceeded { limit: usize },

    #[error("Command failed with {}: {}", describe_exit(.code), .stderr.trim())]
    NonZeroExit {
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    IoError(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    }
}

impl InvocationError {
    /// Error stream captured before the failure, if the process got that far
    pub fn stderr(&self) -> Option<&str> {
        match self {
            InvocationError::NonZeroExit { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Process Invoker trait
///
/// Implementations:
/// - SubprocessInvoker: spawns a real child process (infra-system)
/// - MockProcessInvoker: scripted responses for tests
#[async_trait]
pub trait ProcessInvoker: Send + Sync {
    /// Run `executable` with `args` to completion
    ///
    /// # Errors
    /// - InvocationError::SpawnFailed if the process cannot be started
    /// - InvocationError::Timeout if it outlives `options.timeout`
    /// - InvocationError::OutputLimitExceeded if a stream exceeds `options.max_output_bytes`
    /// - InvocationError::NonZeroExit if it exits unsuccessfully
    async fn invoke(
        &self,
        executable: &str,
        args: &[String],
        options: &InvokeOptions,
    ) -> Result<RawOutput, InvocationError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Semaphore;

    /// Scripted response
    #[derive(Debug, Clone)]
    pub enum MockResponse {
        /// Exit 0 with the given streams
        Output { stdout: String, stderr: String },
        /// Exit with a non-zero code
        Exit {
            code: i32,
            stdout: String,
            stderr: String,
        },
        /// Report a timeout
        Timeout(u64),
        /// Report a spawn failure
        SpawnFailed(String),
    }

    impl MockResponse {
        pub fn stdout(stdout: impl Into<String>) -> Self {
            MockResponse::Output {
                stdout: stdout.into(),
                stderr: String::new(),
            }
        }

        pub fn streams(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
            MockResponse::Output {
                stdout: stdout.into(),
                stderr: stderr.into(),
            }
        }

        pub fn exit(code: i32, stderr: impl Into<String>) -> Self {
            MockResponse::Exit {
                code,
                stdout: String::new(),
                stderr: stderr.into(),
            }
        }

        fn into_result(self) -> Result<RawOutput, InvocationError> {
            match self {
                MockResponse::Output { stdout, stderr } => Ok(RawOutput {
                    exit_code: Some(0),
                    stdout,
                    stderr,
                    duration_ms: 1,
                }),
                MockResponse::Exit {
                    code,
                    stdout,
                    stderr,
                } => Err(InvocationError::NonZeroExit {
                    code: Some(code),
                    stdout,
                    stderr,
                }),
                MockResponse::Timeout(ms) => Err(InvocationError::Timeout(ms)),
                MockResponse::SpawnFailed(msg) => Err(InvocationError::SpawnFailed(msg)),
            }
        }
    }

    struct Script {
        pattern: String,
        responses: VecDeque<MockResponse>,
    }

    struct Hold {
        pattern: String,
        gate: Arc<Semaphore>,
    }

    /// Mock Process Invoker for testing
    ///
    /// Responses are matched by substring against the space-joined argument list.
    /// The first matching script with a response left wins; otherwise the
    /// fallback is returned.
    pub struct MockProcessInvoker {
        scripts: Mutex<Vec<Script>>,
        holds: Mutex<Vec<Hold>>,
        fallback: MockResponse,
        calls: Mutex<Vec<String>>,
        running: AtomicUsize,
        peak_running: AtomicUsize,
    }

    impl MockProcessInvoker {
        pub fn new(fallback: MockResponse) -> Self {
            Self {
                scripts: Mutex::new(Vec::new()),
                holds: Mutex::new(Vec::new()),
                fallback,
                calls: Mutex::new(Vec::new()),
                running: AtomicUsize::new(0),
                peak_running: AtomicUsize::new(0),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockResponse::stdout(""))
        }

        /// Queue one response for invocations containing `pattern`
        pub fn respond(&self, pattern: impl Into<String>, response: MockResponse) -> &Self {
            let pattern = pattern.into();
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.iter_mut().find(|s| s.pattern == pattern) {
                Some(script) => script.responses.push_back(response),
                None => scripts.push(Script {
                    pattern,
                    responses: VecDeque::from([response]),
                }),
            }
            self
        }

        /// Block invocations containing `pattern` until permits are added to the returned gate
        pub fn hold(&self, pattern: impl Into<String>) -> Arc<Semaphore> {
            let gate = Arc::new(Semaphore::new(0));
            self.holds.lock().unwrap().push(Hold {
                pattern: pattern.into(),
                gate: Arc::clone(&gate),
            });
            gate
        }

        /// Command lines seen so far, in invocation order
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Highest number of invocations observed running at once
        pub fn peak_running(&self) -> usize {
            self.peak_running.load(Ordering::SeqCst)
        }

        fn next_response(&self, line: &str) -> MockResponse {
            let mut scripts = self.scripts.lock().unwrap();
            scripts
                .iter_mut()
                .filter(|s| line.contains(&s.pattern))
                .find_map(|s| s.responses.pop_front())
                .unwrap_or_else(|| self.fallback.clone())
        }

        fn gate_for(&self, line: &str) -> Option<Arc<Semaphore>> {
            self.holds
                .lock()
                .unwrap()
                .iter()
                .find(|h| line.contains(&h.pattern))
                .map(|h| Arc::clone(&h.gate))
        }
    }

    #[async_trait]
    impl ProcessInvoker for MockProcessInvoker {
        async fn invoke(
            &self,
            _executable: &str,
            args: &[String],
            _options: &InvokeOptions,
        ) -> Result<RawOutput, InvocationError> {
            let line = args.join(" ");
            self.calls.lock().unwrap().push(line.clone());

            let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_running.fetch_max(running, Ordering::SeqCst);

            if let Some(gate) = self.gate_for(&line) {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }

            let response = self.next_response(&line);
            self.running.fetch_sub(1, Ordering::SeqCst);
            response.into_result()
        }
    }
}
