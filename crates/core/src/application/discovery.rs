//! Device discovery with one-shot server recovery
//!
//! ```text
//! Attempt -> Detect --benign--------------------------> Done(success)
//!              |----other stderr / process failure--> Done(failure)
//!              '----server conflict--> Recover -> Retry -> Done(success | wrapped failure)
//! ```
//!
//! Exactly one recovery cycle per call; a failure after it is terminal.

use crate::application::config::DispatchConfig;
use crate::application::server_lifecycle::ServerLifecycle;
use crate::domain::Outcome;
use crate::port::{InvocationError, InvokeOptions, ProcessInvoker, RawOutput};
use std::sync::Arc;
use tracing::{info, warn};

pub const DISCOVERY_ARGS: &[&str] = &["devices", "-l"];

/// Stderr markers of a port conflict or an unreachable daemon
const SERVER_CONFLICT_MARKERS: &[&str] = &[
    "Address already in use",
    "failed to start daemon",
    "cannot connect to daemon",
];

/// Stderr markers that do not make discovery fail
const BENIGN_MARKERS: &[&str] = &["Warning", "daemon started successfully"];

enum DiscoveryState {
    Attempt,
    Detect(Result<RawOutput, InvocationError>),
    Recover { symptom: String },
    Retry { symptom: String },
    Done(Outcome),
}

pub struct DiscoveryService {
    invoker: Arc<dyn ProcessInvoker>,
    lifecycle: Arc<ServerLifecycle>,
    executable: String,
    options: InvokeOptions,
}

impl DiscoveryService {
    pub fn new(
        invoker: Arc<dyn ProcessInvoker>,
        lifecycle: Arc<ServerLifecycle>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            invoker,
            lifecycle,
            executable: config.executable.clone(),
            options: config.discovery,
        }
    }

    /// List attached devices, restarting the server once if it is unreachable
    pub async fn discover(&self) -> Outcome {
        let mut state = DiscoveryState::Attempt;
        loop {
            state = match state {
                DiscoveryState::Attempt => DiscoveryState::Detect(self.run_discovery().await),
                DiscoveryState::Detect(result) => detect(result),
                DiscoveryState::Recover { symptom } => {
                    warn!(symptom = %symptom, "Server problem detected, restarting");
                    match self.lifecycle.restart().await {
                        Ok(()) => DiscoveryState::Retry { symptom },
                        Err(e) => DiscoveryState::Done(recovery_failed(&symptom, &e)),
                    }
                }
                DiscoveryState::Retry { symptom } => match self.run_discovery().await {
                    Ok(raw) => {
                        info!("Device discovery succeeded after server restart");
                        DiscoveryState::Done(Outcome::success(raw.stdout.trim(), raw.stderr))
                    }
                    Err(e) => DiscoveryState::Done(recovery_failed(&symptom, &e)),
                },
                DiscoveryState::Done(outcome) => return outcome,
            };
        }
    }

    async fn run_discovery(&self) -> Result<RawOutput, InvocationError> {
        let args: Vec<String> = DISCOVERY_ARGS.iter().map(|a| a.to_string()).collect();
        self.invoker
            .invoke(&self.executable, &args, &self.options)
            .await
    }
}

fn detect(result: Result<RawOutput, InvocationError>) -> DiscoveryState {
    let stderr = match &result {
        Ok(raw) => raw.stderr.as_str(),
        Err(e) => e.stderr().unwrap_or_default(),
    };

    if SERVER_CONFLICT_MARKERS.iter().any(|m| stderr.contains(m)) {
        return DiscoveryState::Recover {
            symptom: stderr.trim().to_string(),
        };
    }

    let outcome = match result {
        Err(e) => {
            let stderr = e.stderr().unwrap_or_default().to_string();
            Outcome::failure_with_streams(e.to_string(), String::new(), stderr)
        }
        Ok(raw) if !raw.stderr.is_empty() && !BENIGN_MARKERS.iter().any(|m| raw.stderr.contains(m)) => {
            Outcome::failure_with_streams(raw.stderr.clone(), raw.stdout.trim(), raw.stderr)
        }
        Ok(raw) => Outcome::success(raw.stdout.trim(), raw.stderr),
    };
    DiscoveryState::Done(outcome)
}

fn recovery_failed(symptom: &str, error: &InvocationError) -> Outcome {
    warn!(symptom = %symptom, error = %error, "Device discovery failed after server restart");
    Outcome::failure(format!(
        "Server restart attempted after \"{}\" but discovery still failed: {}",
        symptom, error
    ))
}
