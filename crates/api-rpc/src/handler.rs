//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC params to the dispatch context.

use crate::error::to_rpc_error;
use crate::types::{CommandResponse, ExecRequest, InstallRequest, QueuesStatus};
use adb_dispatch_core::application::{self, DispatchContext};
use adb_dispatch_core::error::AppError;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use tracing::info;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    context: Arc<DispatchContext>,
}

impl RpcHandler {
    pub fn new(context: Arc<DispatchContext>) -> Self {
        Self { context }
    }

    /// adb.exec.v1
    pub async fn exec(&self, params: ExecRequest) -> Result<CommandResponse, ErrorObjectOwned> {
        if params.command.trim().is_empty() {
            return Err(to_rpc_error(AppError::Validation(
                "command must not be empty".to_string(),
            )));
        }

        info!(command = %params.command, "adb.exec.v1");
        let outcome = self.context.execute_command(&params.command).await;
        Ok(outcome.into())
    }

    /// adb.devices.v1
    pub async fn devices(&self) -> Result<CommandResponse, ErrorObjectOwned> {
        Ok(self.context.list_devices().await.into())
    }

    /// adb.server.restart.v1
    pub async fn restart_server(&self) -> Result<CommandResponse, ErrorObjectOwned> {
        info!("adb.server.restart.v1");
        Ok(self.context.restart_server().await.into())
    }

    /// queue.status.v1
    pub fn queue_status(&self) -> QueuesStatus {
        self.context.queue_status()
    }

    /// apk.install.v1
    pub async fn install(&self, params: InstallRequest) -> Result<CommandResponse, ErrorObjectOwned> {
        info!(
            device_id = %params.device_id,
            file_name = %params.file_name,
            bytes = params.file_data.len(),
            "apk.install.v1"
        );

        let req = application::InstallRequest {
            device_id: params.device_id,
            file_name: params.file_name,
            file_data: params.file_data,
        };
        Ok(self.context.install_package(req).await.into())
    }
}
