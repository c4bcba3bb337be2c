//! Fake tool fixture
//!
//! A shell script standing in for the real tool. It appends every invocation
//! to `calls.log` and keeps the background server state as a marker file, so
//! tests can observe the exact command sequence a dispatch produced.

#![allow(dead_code)]

use adb_dispatch_core::application::{DispatchConfig, DispatchContext};
use adb_dispatch_core::port::time_provider::SystemTimeProvider;
use adb_dispatch_infra_system::{SubprocessInvoker, TempDirStager};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const SCRIPT: &str = r#"#!/bin/sh
DIR="$(dirname "$0")"
[ "$1" = "--probe" ] && exit 0
echo "$*" >> "$DIR/calls.log"
if [ "$1" = "-s" ]; then
    shift 2
fi
case "$1" in
    devices)
        if [ -f "$DIR/server.up" ]; then
            echo "List of devices attached"
            echo "emulator-5554          device product:sdk_gphone64 model:Pixel_7"
        else
            echo "* cannot connect to daemon at tcp:5037: Connection refused" >&2
            exit 1
        fi
        ;;
    kill-server)
        rm -f "$DIR/server.up"
        ;;
    start-server)
        if [ -f "$DIR/server.broken" ]; then
            echo "could not install *smartsocket* listener: Address already in use" >&2
            exit 1
        fi
        touch "$DIR/server.up"
        echo "* daemon started successfully" >&2
        ;;
    push)
        if [ -f "$2" ]; then
            echo "$2: 1 file pushed"
        else
            echo "adb: error: cannot stat '$2': No such file or directory" >&2
            exit 1
        fi
        ;;
    shell)
        shift
        case "$1" in
            echo) shift; echo "$*" ;;
            warn) echo "result"; echo "Warning: deprecated option" >&2 ;;
            deny) echo "Error: permission denied" >&2 ;;
            sleep) sleep "$2" ;;
            du) sleep 1; printf '4096\t/sdcard\n' ;;
            pm) echo "Performing Streamed Install"; echo "Success" ;;
            rm) ;;
            *) echo "/system/bin/sh: $1: inaccessible or not found" >&2; exit 127 ;;
        esac
        ;;
    *)
        echo "adb: unknown command $1" >&2
        exit 1
        ;;
esac
"#;

pub struct FakeTool {
    dir: PathBuf,
    path: PathBuf,
}

impl FakeTool {
    /// Install the script in a fresh directory with the server running
    pub fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("adb-dispatch-it-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("adb");
        std::fs::write(&path, SCRIPT).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        wait_until_executable(&path);

        std::fs::write(dir.join("server.up"), b"").unwrap();
        Self { dir, path }
    }

    pub fn stop_server(&self) {
        let _ = std::fs::remove_file(self.dir.join("server.up"));
    }

    pub fn break_server(&self) {
        std::fs::write(self.dir.join("server.broken"), b"").unwrap();
    }

    pub fn server_running(&self) -> bool {
        self.dir.join("server.up").exists()
    }

    pub fn executable(&self) -> String {
        self.path.display().to_string()
    }

    pub fn staging_root(&self) -> PathBuf {
        self.dir.join("staging")
    }

    /// Invocations seen by the script, one line per call
    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn config(&self) -> DispatchConfig {
        DispatchConfig::default()
            .with_executable(self.executable())
            .with_restart_delay(Duration::from_millis(10))
    }

    pub fn context_with(&self, config: DispatchConfig) -> DispatchContext {
        let invoker = Arc::new(SubprocessInvoker::new(Arc::new(SystemTimeProvider)));
        let stager = Arc::new(TempDirStager::new(self.staging_root()));
        DispatchContext::new(config, invoker, stager).unwrap()
    }

    pub fn context(&self) -> DispatchContext {
        self.context_with(self.config())
    }
}

impl Drop for FakeTool {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

// A concurrent fork can briefly hold the freshly written script open (ETXTBSY)
fn wait_until_executable(path: &Path) {
    for _ in 0..100 {
        if std::process::Command::new(path).arg("--probe").status().is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("fake tool never became executable: {}", path.display());
}
