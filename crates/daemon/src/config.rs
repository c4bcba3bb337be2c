//! Daemon configuration from the environment
//!
//! | Variable                   | Default          |
//! |----------------------------|------------------|
//! | `ADB_DISPATCH_ADB_PATH`    | `adb` (via PATH) |
//! | `ADB_DISPATCH_RPC_HOST`    | `127.0.0.1`      |
//! | `ADB_DISPATCH_RPC_PORT`    | `9617`           |
//! | `ADB_DISPATCH_STAGING_DIR` | OS temp dir      |
//! | `ADB_DISPATCH_LOG_FORMAT`  | `pretty`         |
//! | `ADB_DISPATCH_LOG_DIR`     | unset (no file)  |

use adb_dispatch_api_rpc::RpcServerConfig;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

const DEFAULT_ADB_PATH: &str = "adb";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub adb_path: String,
    pub rpc: RpcServerConfig,
    pub staging_dir: Option<PathBuf>,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let expand = |value: String| shellexpand::tilde(&value).into_owned();

        let adb_path = lookup("ADB_DISPATCH_ADB_PATH")
            .map(expand)
            .unwrap_or_else(|| DEFAULT_ADB_PATH.to_string());

        let mut rpc = RpcServerConfig::default();
        if let Some(host) = lookup("ADB_DISPATCH_RPC_HOST") {
            rpc.host = host;
        }
        if let Some(port) = lookup("ADB_DISPATCH_RPC_PORT") {
            rpc.port = port
                .parse()
                .with_context(|| format!("ADB_DISPATCH_RPC_PORT is not a valid port: {:?}", port))?;
        }

        let log_format = match lookup("ADB_DISPATCH_LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("ADB_DISPATCH_LOG_FORMAT must be pretty or json, got {:?}", other),
        };

        Ok(Self {
            adb_path,
            rpc,
            staging_dir: lookup("ADB_DISPATCH_STAGING_DIR").map(|d| expand(d).into()),
            log_format,
            log_dir: lookup("ADB_DISPATCH_LOG_DIR").map(|d| expand(d).into()),
        })
    }
}
