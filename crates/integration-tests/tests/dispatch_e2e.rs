//! Command dispatch through the real subprocess invoker

#![cfg(unix)]

mod common;

use adb_dispatch_core::port::InvokeOptions;
use common::FakeTool;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_exec_returns_trimmed_stdout() {
    let tool = FakeTool::new();
    let ctx = tool.context();

    let outcome = ctx.execute_command("adb shell echo \"hello   world\"").await;

    assert!(outcome.succeeded(), "{:?}", outcome);
    assert_eq!(outcome.output(), "hello   world");
    assert_eq!(tool.calls(), vec!["shell echo hello   world"]);
}

#[tokio::test]
async fn test_warning_on_shell_command_tolerated() {
    let tool = FakeTool::new();
    let outcome = tool.context().execute_command("adb shell warn").await;

    assert!(outcome.succeeded());
    assert_eq!(outcome.output(), "result");
    assert!(outcome.diagnostic().contains("Warning"));
}

#[tokio::test]
async fn test_error_stream_surfaced_verbatim() {
    let tool = FakeTool::new();
    let outcome = tool.context().execute_command("adb shell deny").await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.error_message(), Some("Error: permission denied\n"));
}

#[tokio::test]
async fn test_non_zero_exit_is_failure() {
    let tool = FakeTool::new();
    let outcome = tool.context().execute_command("adb shell missing-binary").await;

    assert!(!outcome.succeeded());
    let message = outcome.error_message().unwrap();
    assert!(message.contains("exit code 127"), "{}", message);
    assert!(message.contains("inaccessible or not found"), "{}", message);
}

#[tokio::test]
async fn test_timeout_is_failure() {
    let tool = FakeTool::new();
    let mut config = tool.config();
    config.command = InvokeOptions::new(Duration::from_millis(300), 1024 * 1024);
    let ctx = tool.context_with(config);

    let outcome = ctx.execute_command("adb shell sleep 5").await;

    assert!(!outcome.succeeded());
    assert_eq!(outcome.error_message(), Some("Command timed out after 300ms"));
}

#[tokio::test]
async fn test_missing_executable_is_failure() {
    let tool = FakeTool::new();
    let config = tool.config().with_executable("/nonexistent/platform-tools/adb");
    let ctx = tool.context_with(config);

    let outcome = ctx.execute_command("adb devices").await;

    assert!(!outcome.succeeded());
    assert!(outcome.error_message().unwrap().starts_with("Spawn failed"));
}

#[tokio::test]
async fn test_bulk_saturation_leaves_fast_free() {
    let tool = FakeTool::new();
    let ctx = Arc::new(tool.context());

    // Each disk-usage listing takes a second on the fake tool
    let mut listings = Vec::new();
    for _ in 0..6 {
        let ctx = Arc::clone(&ctx);
        listings.push(tokio::spawn(async move {
            ctx.execute_command("adb shell du -s /sdcard").await
        }));
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    let status = ctx.queue_status();
    assert_eq!(status.bulk.in_flight, 4);
    assert_eq!(status.bulk.pending, 2);

    let started = std::time::Instant::now();
    let devices = ctx.list_devices().await;
    assert!(devices.succeeded(), "{:?}", devices);
    assert!(started.elapsed() < Duration::from_millis(700));

    for listing in listings {
        let outcome = listing.await.unwrap();
        assert_eq!(outcome.output(), "4096\t/sdcard");
    }
    let status = ctx.queue_status();
    assert_eq!(status.bulk.in_flight + status.bulk.pending, 0);
}
