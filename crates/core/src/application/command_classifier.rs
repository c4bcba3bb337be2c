//! Command Classifier - maps command text to a queue class
//!
//! Rules are evaluated in table order and the first match wins. The function is
//! total: anything no rule claims lands in `QueueClass::Normal`.

use crate::domain::QueueClass;

/// One classification rule: any listed substring selects `class`
struct ClassRule {
    class: QueueClass,
    patterns: &'static [&'static str],
}

const FAST_PATTERNS: &[&str] = &[
    "devices",
    "connect",
    "disconnect",
    "tcpip",
    "getprop ro.build.version",
    "getprop ro.product.manufacturer",
    "getprop ro.build.version.sdk",
];

// "shell pm path com." is the package-prefix query; listed for completeness
// even though "shell pm path" already claims it.
const BULK_PATTERNS: &[&str] = &[
    "shell ls",
    "shell pm list",
    "shell pm path",
    "shell pm dump",
    "shell dumpsys package",
    "shell stat",
    "shell find",
    "shell du",
    "push",
    "pull",
    "shell pm path com.",
];

const RULES: &[ClassRule] = &[
    ClassRule {
        class: QueueClass::Fast,
        patterns: FAST_PATTERNS,
    },
    ClassRule {
        class: QueueClass::Bulk,
        patterns: BULK_PATTERNS,
    },
];

/// Pick the queue class for `command_text`
pub fn classify(command_text: &str) -> QueueClass {
    RULES
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| command_text.contains(p)))
        .map(|rule| rule.class)
        .unwrap_or(QueueClass::Normal)
}
