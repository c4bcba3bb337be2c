// Dispatch configuration
//
// Defaults are the fixed production values; the struct exists so the daemon can
// point at a different executable and tests can shorten the restart delay.

use super::constants::*;
use crate::domain::{QueueClass, QueueConfig};
use crate::port::InvokeOptions;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Tool executable, resolved through PATH when not absolute
    pub executable: String,
    pub fast_queue: QueueConfig,
    pub normal_queue: QueueConfig,
    pub bulk_queue: QueueConfig,
    pub command: InvokeOptions,
    pub discovery: InvokeOptions,
    pub stop_server: InvokeOptions,
    pub start_server: InvokeOptions,
    pub restart_delay: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            executable: "adb".to_string(),
            fast_queue: QueueConfig::new(FAST_QUEUE_NAME, FAST_QUEUE_CAPACITY),
            normal_queue: QueueConfig::new(NORMAL_QUEUE_NAME, NORMAL_QUEUE_CAPACITY),
            bulk_queue: QueueConfig::new(BULK_QUEUE_NAME, BULK_QUEUE_CAPACITY),
            command: InvokeOptions::new(DEFAULT_TIMEOUT, DEFAULT_MAX_OUTPUT_BYTES),
            discovery: InvokeOptions::new(DISCOVERY_TIMEOUT, LIFECYCLE_MAX_OUTPUT_BYTES),
            stop_server: InvokeOptions::new(STOP_SERVER_TIMEOUT, LIFECYCLE_MAX_OUTPUT_BYTES),
            start_server: InvokeOptions::new(START_SERVER_TIMEOUT, LIFECYCLE_MAX_OUTPUT_BYTES),
            restart_delay: SERVER_RESTART_DELAY,
        }
    }
}

impl DispatchConfig {
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    pub fn queue(&self, class: QueueClass) -> &QueueConfig {
        match class {
            QueueClass::Fast => &self.fast_queue,
            QueueClass::Normal => &self.normal_queue,
            QueueClass::Bulk => &self.bulk_queue,
        }
    }
}
