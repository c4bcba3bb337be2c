//! ADB Dispatch - Main Entry Point
//! JSON-RPC server in front of the dispatch queues

mod config;
mod logging;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

// Import workspace crates
use adb_dispatch_api_rpc::RpcServer;
use adb_dispatch_core::application::{DispatchConfig, DispatchContext};
use adb_dispatch_core::port::time_provider::SystemTimeProvider;
use adb_dispatch_infra_system::{SubprocessInvoker, TempDirStager};
use config::DaemonConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env()?;

    // 2. Initialize logging (guard flushes the file log on exit)
    let _log_guard = logging::init(config.log_format, config.log_dir.as_deref())?;

    info!("ADB Dispatch v{} starting...", VERSION);
    info!(adb_path = %config.adb_path, "Using tool executable");

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let invoker = Arc::new(SubprocessInvoker::new(time_provider));
    let stager = Arc::new(match &config.staging_dir {
        Some(dir) => TempDirStager::new(dir.clone()),
        None => TempDirStager::in_temp_dir(),
    });
    info!(staging_dir = %stager.root().display(), "Package staging ready");

    let dispatch_config = DispatchConfig::default().with_executable(config.adb_path.clone());
    let context = DispatchContext::new(dispatch_config, invoker, stager)
        .context("Invalid dispatch configuration")?;

    // 4. Start JSON-RPC server
    let (rpc_handle, addr) = RpcServer::new(config.rpc.clone(), Arc::new(context))
        .start()
        .await
        .context("RPC server start failed")?;

    info!(addr = %addr, "System ready. Waiting for commands...");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;

    info!("Shutdown complete.");

    Ok(())
}
