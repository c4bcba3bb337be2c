//! JSON-RPC Server
//!
//! Serves the dispatch operations over TCP on localhost.

use crate::handler::RpcHandler;
use crate::types::{ExecRequest, InstallRequest};
use adb_dispatch_core::application::DispatchContext;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9617;

/// Package uploads travel inline as byte arrays
const MAX_REQUEST_BODY_BYTES: u32 = 512 * 1024 * 1024;

pub mod method {
    pub const EXEC: &str = "adb.exec.v1";
    pub const DEVICES: &str = "adb.devices.v1";
    pub const RESTART_SERVER: &str = "adb.server.restart.v1";
    pub const QUEUE_STATUS: &str = "queue.status.v1";
    pub const INSTALL: &str = "apk.install.v1";
}

#[derive(Error, Debug)]
pub enum RpcServerError {
    #[error("Failed to bind server on {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Failed to register method: {0}")]
    Register(String),
}

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, context: Arc<DispatchContext>) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(context)),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the handle and the bound address (port 0 picks a free port).
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), RpcServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP"
        );

        let server = Server::builder()
            .max_request_body_size(MAX_REQUEST_BODY_BYTES)
            .build(&addr)
            .await
            .map_err(|e| RpcServerError::Bind {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;

        let local_addr = server.local_addr().map_err(|e| RpcServerError::Bind {
            addr,
            reason: e.to_string(),
        })?;

        let module = self.build_module()?;
        let handle = server.start(module);

        info!(addr = %local_addr, "JSON-RPC server started successfully");
        Ok((handle, local_addr))
    }

    fn build_module(&self) -> Result<RpcModule<()>, RpcServerError> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method(method::EXEC, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ExecRequest = params.parse()?;
                    handler.exec(req).await
                }
            })
            .map_err(register_failed)?;

        let handler = self.handler.clone();
        module
            .register_async_method(method::DEVICES, move |_, _, _| {
                let handler = handler.clone();
                async move { handler.devices().await }
            })
            .map_err(register_failed)?;

        let handler = self.handler.clone();
        module
            .register_async_method(method::RESTART_SERVER, move |_, _, _| {
                let handler = handler.clone();
                async move { handler.restart_server().await }
            })
            .map_err(register_failed)?;

        let handler = self.handler.clone();
        module
            .register_method(method::QUEUE_STATUS, move |_, _, _| {
                Ok::<_, ErrorObjectOwned>(handler.queue_status())
            })
            .map_err(register_failed)?;

        let handler = self.handler.clone();
        module
            .register_async_method(method::INSTALL, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: InstallRequest = params.parse()?;
                    handler.install(req).await
                }
            })
            .map_err(register_failed)?;

        Ok(module)
    }
}

fn register_failed(e: impl std::fmt::Display) -> RpcServerError {
    RpcServerError::Register(e.to_string())
}
