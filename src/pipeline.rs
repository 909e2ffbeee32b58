use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::constants::COMMAND_FAILURE_MESSAGE;
use crate::protocol::{CommandResponse, TimerWarning};
use crate::types::CommandHistoryEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    Blank,
    NoSession,
    InFlight,
    NotNavigable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecuteOutcome {
    Rejected { reason: RejectReason },
    Completed { success: bool },
    TransportFailed,
    /// A new game started while the request was in flight.
    Discarded,
}

impl ExecuteOutcome {
    pub fn rejected(reason: RejectReason) -> Self {
        Self::Rejected { reason }
    }
}

/// Trimmed command, or `None` when nothing is left to send.
pub fn normalize_command(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn warning_lines(warnings: &[TimerWarning]) -> Vec<String> {
    warnings
        .iter()
        .map(|warning| format!("[{}] {}", warning.level.to_ascii_uppercase(), warning.message))
        .collect()
}

/// Timer warnings stacked above the command's own output.
pub fn compose_output(response: &CommandResponse) -> String {
    let mut lines = warning_lines(&response.timer_warnings);
    if !response.output.is_empty() {
        lines.push(response.output.clone());
    }
    lines.join("\n")
}

pub fn success_entry(command: &str, response: &CommandResponse) -> CommandHistoryEntry {
    CommandHistoryEntry::new(command, compose_output(response), response.success)
}

pub fn failure_entry(command: &str) -> CommandHistoryEntry {
    CommandHistoryEntry::new(command, COMMAND_FAILURE_MESSAGE, false)
}

/// Append-only log of confirmed responses.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CommandHistory {
    entries: Vec<CommandHistoryEntry>,
}

impl CommandHistory {
    pub fn push(&mut self, entry: CommandHistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[CommandHistoryEntry] {
        &self.entries
    }
}

/// Holds the in-flight flag for one command; dropping it clears the flag
/// whether the request finished, failed or was cancelled.
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    pub fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
