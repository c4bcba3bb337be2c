//! Outcome Classifier - decides success/failure from raw process output
//!
//! The tool writes warnings, progress counters and event statistics to stderr
//! even when a command worked, and offers no structured status on this path.
//! The policy below is a table-driven heuristic and must keep its substrings
//! and precedence: callers depend on its exact verdicts.
//!
//! Known weak spots: an ignorable substring anywhere in stderr masks a real
//! error printed next to it for shell commands, and non-shell commands with
//! ignorable stderr fall through to success.

use crate::application::constants::DEFAULT_SUCCESS_MESSAGE;
use crate::domain::Outcome;
use crate::port::{InvocationError, RawOutput};
use tracing::debug;

/// Stderr substrings that do not indicate failure
pub const IGNORABLE_PATTERNS: &[&str] = &[
    "Warning",
    "args:",
    "arg:",
    "data=",
    "Events injected:",
    "Network speed:",
    "Dropped:",
];

/// Stress/fuzz subcommand whose stderr is mostly statistics
const NOISY_COMMAND_MARKER: &str = "monkey";
const SHELL_COMMAND_MARKER: &str = "shell";
const HARD_FAILURE_MARKERS: &[&str] = &["Error:", "CRASH"];

/// Normalize the result of invoking `command_text`
pub fn classify(command_text: &str, raw: Result<RawOutput, InvocationError>) -> Outcome {
    let raw = match raw {
        Ok(raw) => raw,
        Err(e) => {
            let stderr = e.stderr().unwrap_or_default().to_string();
            return Outcome::failure_with_streams(e.to_string(), String::new(), stderr);
        }
    };

    let stdout = raw.stdout.trim();
    let stderr = raw.stderr.as_str();

    if !stderr.is_empty() {
        let ignorable = IGNORABLE_PATTERNS.iter().any(|p| stderr.contains(p));
        let is_noisy = command_text.contains(NOISY_COMMAND_MARKER);
        let is_shell = command_text.contains(SHELL_COMMAND_MARKER);

        if is_noisy && ignorable && !HARD_FAILURE_MARKERS.iter().any(|m| stderr.contains(m)) {
            debug!(command = %command_text, "Noisy command wrote diagnostics only");
            let output = if stdout.is_empty() {
                DEFAULT_SUCCESS_MESSAGE
            } else {
                stdout
            };
            return Outcome::success(output, stderr);
        }

        if is_shell && ignorable {
            return Outcome::success(stdout, stderr);
        }

        if !ignorable {
            return Outcome::failure_with_streams(stderr, stdout, stderr);
        }
    }

    Outcome::success(stdout, stderr)
}
