//! RPC Request/Response Types
//!
//! Method parameters. `adb.devices.v1`, `adb.server.restart.v1` and
//! `queue.status.v1` take none. Results reuse the core wire shapes:
//! `CommandResponse` (`{success, data?, error?}`) and `QueuesStatus`.

use serde::{Deserialize, Serialize};

pub use adb_dispatch_core::domain::{CommandResponse, QueueStatus, QueuesStatus};

/// adb.exec.v1 - Execute arbitrary command text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecRequest {
    pub command: String,
}

/// apk.install.v1 - Install a package on one device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRequest {
    pub device_id: String,
    pub file_name: String,
    pub file_data: Vec<u8>,
}
