// Dispatch constants (no magic values)
use std::time::Duration;

/// Fast queue: device discovery, connect/disconnect, property reads
pub const FAST_QUEUE_NAME: &str = "fast";
pub const FAST_QUEUE_CAPACITY: usize = 2;

/// Normal queue: single shell commands, log streaming
pub const NORMAL_QUEUE_NAME: &str = "normal";
pub const NORMAL_QUEUE_CAPACITY: usize = 2;

/// Bulk queue: listings, package queries, file transfers
pub const BULK_QUEUE_NAME: &str = "bulk";
pub const BULK_QUEUE_CAPACITY: usize = 4;

/// Default per-invocation timeout (30s)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-stream output cap (10MB)
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Device discovery timeout (10s)
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Stop-server timeout (5s)
pub const STOP_SERVER_TIMEOUT: Duration = Duration::from_secs(5);

/// Start-server timeout (10s)
pub const START_SERVER_TIMEOUT: Duration = Duration::from_secs(10);

/// Output cap for discovery and server lifecycle commands (1MB)
pub const LIFECYCLE_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Pause between stopping and starting the server (1s)
pub const SERVER_RESTART_DELAY: Duration = Duration::from_secs(1);

/// Reported when a noisy command succeeds without printing anything
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Command executed successfully";

/// Device-side path packages are pushed to before installation
pub const DEVICE_STAGING_PATH: &str = "/data/local/tmp/temp_install.apk";

/// Reported when an install prints nothing on either stream
pub const INSTALL_COMPLETE_MESSAGE: &str = "Install complete";
