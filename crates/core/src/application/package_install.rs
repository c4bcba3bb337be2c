// Package Install Use Case
//
// stage locally -> push to device -> install -> remove both copies

use crate::application::constants::{DEVICE_STAGING_PATH, INSTALL_COMPLETE_MESSAGE};
use crate::domain::{DomainError, Outcome};
use crate::port::{FileStager, InvocationError, InvokeOptions, ProcessInvoker, RawOutput};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Install request as received from a caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRequest {
    pub device_id: String,
    pub file_name: String,
    pub file_data: Vec<u8>,
}

impl InstallRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.device_id.is_empty() || self.device_id.chars().any(char::is_whitespace) {
            return Err(DomainError::ValidationError(format!(
                "Invalid device id: {:?}",
                self.device_id
            )));
        }

        let bare_name = !self.file_name.is_empty()
            && self.file_name != "."
            && self.file_name != ".."
            && !self.file_name.contains(['/', '\\']);
        if !bare_name {
            return Err(DomainError::ValidationError(format!(
                "Invalid file name: {:?}",
                self.file_name
            )));
        }

        if self.file_data.is_empty() {
            return Err(DomainError::ValidationError(
                "Package data is empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Execute install use case
///
/// Local and device-side copies are removed whether or not the install
/// succeeded; cleanup failures are logged only.
pub async fn execute(
    invoker: &dyn ProcessInvoker,
    stager: &dyn FileStager,
    executable: &str,
    options: &InvokeOptions,
    req: InstallRequest,
) -> Outcome {
    if let Err(e) = req.validate() {
        return Outcome::failure(e.to_string());
    }

    let local_path = match stager.stage(&req.file_name, &req.file_data).await {
        Ok(path) => path,
        Err(e) => return Outcome::failure(e.to_string()),
    };

    info!(
        device_id = %req.device_id,
        file_name = %req.file_name,
        bytes = req.file_data.len(),
        "Installing package"
    );

    let result = push_and_install(invoker, executable, options, &req.device_id, &local_path).await;

    if let Err(e) = stager.remove(&local_path).await {
        warn!(error = %e, "Failed to remove staged package");
    }

    match result {
        Ok(raw) => {
            let data = [raw.stdout.trim(), raw.stderr.trim()]
                .into_iter()
                .find(|s| !s.is_empty())
                .unwrap_or(INSTALL_COMPLETE_MESSAGE)
                .to_string();
            info!(device_id = %req.device_id, "Package installed");
            Outcome::success(data, raw.stderr)
        }
        Err(e) => {
            warn!(device_id = %req.device_id, error = %e, "Package install failed");
            let stderr = e.stderr().unwrap_or_default().to_string();
            Outcome::failure_with_streams(e.to_string(), String::new(), stderr)
        }
    }
}

async fn push_and_install(
    invoker: &dyn ProcessInvoker,
    executable: &str,
    options: &InvokeOptions,
    device_id: &str,
    local_path: &Path,
) -> Result<RawOutput, InvocationError> {
    let local = local_path.to_string_lossy();
    let push = device_args(device_id, &["push", local.as_ref(), DEVICE_STAGING_PATH]);
    invoker.invoke(executable, &push, options).await?;

    let install = device_args(
        device_id,
        &["shell", "pm", "install", "-r", DEVICE_STAGING_PATH],
    );
    let result = invoker.invoke(executable, &install, options).await;

    // Pushed copy is removed even when the install failed
    let remove = device_args(device_id, &["shell", "rm", DEVICE_STAGING_PATH]);
    if let Err(e) = invoker.invoke(executable, &remove, options).await {
        warn!(device_id = %device_id, error = %e, "Failed to remove pushed package");
    }

    result
}

fn device_args(device_id: &str, rest: &[&str]) -> Vec<String> {
    ["-s", device_id]
        .iter()
        .chain(rest)
        .map(|s| s.to_string())
        .collect()
}
