// Dispatch Context - entry point for every exposed operation
//
// Owns the three admission queues and routes each operation to one of them.
// Queues are independent: saturating one never delays admission in another.

use crate::application::admission_queue::{AdmissionQueue, Completion};
use crate::application::config::DispatchConfig;
use crate::application::discovery::DiscoveryService;
use crate::application::package_install::{self, InstallRequest};
use crate::application::server_lifecycle::ServerLifecycle;
use crate::application::{command_classifier, outcome_classifier};
use crate::domain::{CommandLine, Outcome, QueueClass, QueuesStatus};
use crate::error::{AppError, Result};
use crate::port::{FileStager, ProcessInvoker};
use std::sync::Arc;
use tracing::{debug, error};

pub struct DispatchContext {
    fast: AdmissionQueue,
    normal: AdmissionQueue,
    bulk: AdmissionQueue,
    invoker: Arc<dyn ProcessInvoker>,
    stager: Arc<dyn FileStager>,
    lifecycle: Arc<ServerLifecycle>,
    discovery: Arc<DiscoveryService>,
    config: Arc<DispatchConfig>,
}

impl DispatchContext {
    /// Build the three queues from `config`
    ///
    /// # Errors
    /// - AppError::Domain if a queue capacity is zero
    pub fn new(
        config: DispatchConfig,
        invoker: Arc<dyn ProcessInvoker>,
        stager: Arc<dyn FileStager>,
    ) -> Result<Self> {
        let lifecycle = Arc::new(ServerLifecycle::new(Arc::clone(&invoker), &config));
        let discovery = Arc::new(DiscoveryService::new(
            Arc::clone(&invoker),
            Arc::clone(&lifecycle),
            &config,
        ));

        Ok(Self {
            fast: AdmissionQueue::new(config.fast_queue.clone())?,
            normal: AdmissionQueue::new(config.normal_queue.clone())?,
            bulk: AdmissionQueue::new(config.bulk_queue.clone())?,
            invoker,
            stager,
            lifecycle,
            discovery,
            config: Arc::new(config),
        })
    }

    pub fn queue(&self, class: QueueClass) -> &AdmissionQueue {
        match class {
            QueueClass::Fast => &self.fast,
            QueueClass::Normal => &self.normal,
            QueueClass::Bulk => &self.bulk,
        }
    }

    /// Classify, queue and run arbitrary command text
    pub async fn execute_command(&self, text: &str) -> Outcome {
        let command = match CommandLine::parse(text) {
            Ok(command) => command,
            Err(e) => return Outcome::failure(e.to_string()),
        };

        let class = command_classifier::classify(text);
        debug!(command = %text, queue = %class, "Command classified");

        let invoker = Arc::clone(&self.invoker);
        let config = Arc::clone(&self.config);
        let completion = self.queue(class).submit(move || async move {
            let result = invoker
                .invoke(&config.executable, command.args(), &config.command)
                .await;
            outcome_classifier::classify(command.text(), result)
        });

        settle(completion).await
    }

    /// Device discovery in the Fast queue, with server recovery
    pub async fn list_devices(&self) -> Outcome {
        let discovery = Arc::clone(&self.discovery);
        let completion = self
            .queue(QueueClass::Fast)
            .submit(move || async move { discovery.discover().await });

        settle(completion).await
    }

    /// Stop, wait, start; runs outside the queues
    pub async fn restart_server(&self) -> Outcome {
        self.lifecycle.restart_outcome().await
    }

    pub fn queue_status(&self) -> QueuesStatus {
        QueuesStatus {
            fast: self.fast.status(),
            normal: self.normal.status(),
            bulk: self.bulk.status(),
        }
    }

    /// Stage, push and install a package as one Bulk task
    pub async fn install_package(&self, req: InstallRequest) -> Outcome {
        if let Err(e) = req.validate() {
            return Outcome::failure(e.to_string());
        }

        let invoker = Arc::clone(&self.invoker);
        let stager = Arc::clone(&self.stager);
        let config = Arc::clone(&self.config);
        let completion = self.queue(QueueClass::Bulk).submit(move || async move {
            package_install::execute(
                invoker.as_ref(),
                stager.as_ref(),
                &config.executable,
                &config.command,
                req,
            )
            .await
        });

        settle(completion).await
    }
}

async fn settle(completion: Completion<Outcome>) -> Outcome {
    completion.await.unwrap_or_else(|e| {
        let err = AppError::from(e);
        error!(error = %err, "Dispatched task aborted");
        Outcome::failure(err.to_string())
    })
}
