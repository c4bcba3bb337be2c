//! ADB Dispatch CLI - Command-line interface for the dispatch daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9617";

#[derive(Parser)]
#[command(name = "adb-dispatch")]
#[command(about = "ADB Dispatch CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "ADB_DISPATCH_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute arbitrary command text (e.g. `exec shell getprop ro.product.model`)
    Exec {
        /// Command text; words are re-quoted where needed and joined with spaces
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// List attached devices
    Devices,

    /// Restart the tool's background server
    RestartServer,

    /// Show queue status
    Status,

    /// Install a package on a device
    Install {
        /// Target device serial
        #[arg(short, long)]
        device: String,

        /// Path to the package file
        apk: PathBuf,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize)]
struct CommandResponse {
    success: bool,
    data: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct QueueStatus {
    name: String,
    pending: usize,
    in_flight: usize,
    max_concurrency: usize,
}

#[derive(Deserialize)]
struct QueuesStatus {
    fast: QueueStatus,
    normal: QueueStatus,
    bulk: QueueStatus,
}

#[derive(Tabled)]
struct QueueRow {
    #[tabled(rename = "Queue")]
    name: String,
    #[tabled(rename = "Pending")]
    pending: usize,
    #[tabled(rename = "In flight")]
    in_flight: usize,
    #[tabled(rename = "Capacity")]
    capacity: usize,
}

impl From<QueueStatus> for QueueRow {
    fn from(status: QueueStatus) -> Self {
        Self {
            name: status.name,
            pending: status.pending,
            in_flight: status.in_flight,
            capacity: status.max_concurrency,
        }
    }
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

async fn call_command(url: &str, method: &str, params: serde_json::Value) -> Result<()> {
    let result = call_rpc(url, method, params).await?;
    let response: CommandResponse = serde_json::from_value(result)?;

    if response.success {
        if let Some(data) = response.data.filter(|d| !d.is_empty()) {
            println!("{}", data);
        }
        println!("{}", "✓ Done".green().bold());
        Ok(())
    } else {
        let error = response.error.unwrap_or_default();
        eprintln!("{} {}", "✗".red().bold(), error.red());
        anyhow::bail!("command failed")
    }
}

/// Rebuild command text from words the invoking shell already split
fn join_command(words: &[String]) -> String {
    words
        .iter()
        .map(|w| quote_word(w))
        .collect::<Vec<_>>()
        .join(" ")
}

// Inside double quotes the daemon only unescapes `"` and `\`
fn quote_word(word: &str) -> String {
    let plain = !word.is_empty()
        && !word
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\'));
    if plain {
        return word.to_string();
    }
    format!("\"{}\"", word.replace('\\', "\\\\").replace('"', "\\\""))
}

fn package_file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("Not a file path: {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Exec { command } => {
            let params = json!({ "command": join_command(&command) });
            call_command(&cli.rpc_url, "adb.exec.v1", params).await?;
        }

        Commands::Devices => {
            call_command(&cli.rpc_url, "adb.devices.v1", json!({})).await?;
        }

        Commands::RestartServer => {
            println!("{}", "Restarting server...".cyan().bold());
            call_command(&cli.rpc_url, "adb.server.restart.v1", json!({})).await?;
        }

        Commands::Status => {
            println!("{}", "Queue Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "queue.status.v1", json!({})).await {
                Ok(result) => {
                    let status: QueuesStatus = serde_json::from_value(result)?;
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();

                    let rows: Vec<QueueRow> = vec![
                        status.fast.into(),
                        status.normal.into(),
                        status.bulk.into(),
                    ];
                    println!("{}", Table::new(rows));
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::Install { device, apk } => {
            let file_name = package_file_name(&apk)?;
            let file_data = tokio::fs::read(&apk)
                .await
                .with_context(|| format!("Failed to read {}", apk.display()))?;

            println!(
                "{}",
                format!("Installing {} on {}...", file_name, device).cyan().bold()
            );

            let params = json!({
                "device_id": device,
                "file_name": file_name,
                "file_data": file_data,
            });
            call_command(&cli.rpc_url, "apk.install.v1", params).await?;
        }
    }

    Ok(())
}
