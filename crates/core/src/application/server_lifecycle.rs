// Server lifecycle - stop/start of the tool's background daemon

use crate::application::config::DispatchConfig;
use crate::domain::Outcome;
use crate::port::{InvocationError, InvokeOptions, ProcessInvoker, RawOutput};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

const STOP_SERVER_ARG: &str = "kill-server";
const START_SERVER_ARG: &str = "start-server";

/// Reported on a successful restart
pub const RESTART_SUCCESS_MESSAGE: &str = "Server restarted successfully";

/// Restarts the background server: stop, fixed delay, start
pub struct ServerLifecycle {
    invoker: Arc<dyn ProcessInvoker>,
    executable: String,
    stop_options: InvokeOptions,
    start_options: InvokeOptions,
    restart_delay: Duration,
}

impl ServerLifecycle {
    pub fn new(invoker: Arc<dyn ProcessInvoker>, config: &DispatchConfig) -> Self {
        Self {
            invoker,
            executable: config.executable.clone(),
            stop_options: config.stop_server,
            start_options: config.start_server,
            restart_delay: config.restart_delay,
        }
    }

    /// Stop the server; failures are logged and ignored (it may already be down)
    pub async fn stop(&self) {
        let args = [STOP_SERVER_ARG.to_string()];
        match self
            .invoker
            .invoke(&self.executable, &args, &self.stop_options)
            .await
        {
            Ok(_) => info!("Server stopped"),
            Err(e) => warn!(error = %e, "Stopping server failed (it may already be stopped)"),
        }
    }

    pub async fn start(&self) -> Result<RawOutput, InvocationError> {
        let args = [START_SERVER_ARG.to_string()];
        let output = self
            .invoker
            .invoke(&self.executable, &args, &self.start_options)
            .await?;
        info!(
            stdout = %output.stdout.trim(),
            stderr = %output.stderr.trim(),
            "Server started"
        );
        Ok(output)
    }

    /// Stop, wait the fixed delay, start
    pub async fn restart(&self) -> Result<(), InvocationError> {
        info!(delay_ms = self.restart_delay.as_millis() as u64, "Restarting server");
        self.stop().await;
        sleep(self.restart_delay).await;
        self.start().await.map(|_| ())
    }

    /// Restart for the exposed operation, reported as an outcome
    pub async fn restart_outcome(&self) -> Outcome {
        match self.restart().await {
            Ok(()) => Outcome::success(RESTART_SUCCESS_MESSAGE, String::new()),
            Err(e) => {
                warn!(error = %e, "Server restart failed");
                Outcome::failure(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::process_invoker::mocks::{MockProcessInvoker, MockResponse};

    fn lifecycle(invoker: Arc<MockProcessInvoker>) -> ServerLifecycle {
        let config = DispatchConfig::default().with_restart_delay(Duration::from_millis(1));
        ServerLifecycle::new(invoker, &config)
    }

    #[tokio::test]
    async fn test_restart_sequence() {
        let invoker = Arc::new(MockProcessInvoker::new_success());
        let outcome = lifecycle(invoker.clone()).restart_outcome().await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.output(), RESTART_SUCCESS_MESSAGE);
        assert_eq!(invoker.calls(), vec!["kill-server", "start-server"]);
    }

    #[tokio::test]
    async fn test_stop_failure_is_ignored() {
        let invoker = Arc::new(MockProcessInvoker::new_success());
        invoker.respond("kill-server", MockResponse::exit(1, "cannot connect to daemon"));

        let outcome = lifecycle(invoker.clone()).restart_outcome().await;
        assert!(outcome.succeeded());
        assert_eq!(invoker.call_count(), 2);
    }

    #[tokio::test]
    async fn test_start_failure_reported() {
        let invoker = Arc::new(MockProcessInvoker::new_success());
        invoker.respond("start-server", MockResponse::Timeout(10_000));

        let outcome = lifecycle(invoker).restart_outcome().await;
        assert!(!outcome.succeeded());
        assert_eq!(outcome.error_message(), Some("Command timed out after 10000ms"));
    }
}
