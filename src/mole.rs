use serde::Serialize;
use tracing::{debug, info};

use crate::config::MoleOptions;
use crate::constants::get_timer_reason;
use crate::protocol::{CheckTimerResponse, CommandResponse, TimerStatus};
use crate::tree::{first_mole_path, with_mole_at};
use crate::types::{CommandHistoryEntry, MoleDirection, MoleSnapshot, MoleState, TreeNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Caught,
    Fled,
}

/// Clear-and-reassign scheduled on the coordinator clock.
#[derive(Clone, Debug, PartialEq)]
struct PendingEffect {
    kind: EffectKind,
    due_ms: u64,
    next_location: Option<String>,
    next_timer: Option<i64>,
}

#[derive(Clone, Debug, PartialEq)]
struct DirectionIndicator {
    direction: MoleDirection,
    expires_at_ms: u64,
}

/// Lifecycle events drained by the client for logging and tests.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MoleEvent {
    Spawned { path: String },
    Caught { path: String, score: i64 },
    Escaped { from: Option<String>, to: String, distance: u32 },
    Settled { kind: EffectKind, path: Option<String> },
    DirectionCleared,
}

/// Owns every mole flag in the tree along with the countdown and transient
/// effect state. Time only moves through [`MoleCoordinator::advance`].
#[derive(Debug)]
pub struct MoleCoordinator {
    options: MoleOptions,
    now_ms: u64,
    state: MoleState,
    mole_path: Option<String>,
    remaining_seconds: i64,
    total_seconds: i64,
    expired: bool,
    paused: bool,
    caught: bool,
    fleeing: bool,
    timer_reason: Option<String>,
    score: i64,
    moles_killed: u32,
    moles_escaped: u32,
    direction: Option<DirectionIndicator>,
    pending: Option<PendingEffect>,
    events: Vec<MoleEvent>,
}

impl MoleCoordinator {
    pub fn new(options: MoleOptions) -> Self {
        Self {
            options,
            now_ms: 0,
            state: MoleState::None,
            mole_path: None,
            remaining_seconds: options.default_timer_secs,
            total_seconds: options.default_timer_secs,
            expired: false,
            paused: false,
            caught: false,
            fleeing: false,
            timer_reason: None,
            score: 0,
            moles_killed: 0,
            moles_escaped: 0,
            direction: None,
            pending: None,
            events: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.options);
    }

    /// Adopts a fresh session tree. A tree arriving with several flagged
    /// nodes keeps only the first one in pre-order.
    pub fn begin(
        &mut self,
        tree: &mut TreeNode,
        initial_timer: Option<i64>,
        timer_reason: Option<String>,
    ) {
        self.reset();
        self.mole_path = first_mole_path(tree);
        *tree = with_mole_at(tree, self.mole_path.as_deref());
        let seconds = initial_timer.unwrap_or(self.options.default_timer_secs);
        self.remaining_seconds = seconds;
        self.total_seconds = seconds;
        self.timer_reason = timer_reason;
        if let Some(path) = &self.mole_path {
            self.state = MoleState::Active;
            self.events.push(MoleEvent::Spawned { path: path.clone() });
        }
    }

    pub fn state(&self) -> MoleState {
        self.state
    }

    pub fn mole_path(&self) -> Option<&str> {
        self.mole_path.as_deref()
    }

    pub fn is_settling(&self) -> bool {
        self.pending.is_some()
    }

    pub fn drain_events(&mut self) -> Vec<MoleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Folds a confirmed command response into mole state. Returns true when
    /// the tree was rebuilt.
    pub fn apply_command(&mut self, tree: &mut TreeNode, response: &CommandResponse) -> bool {
        if let Some(remaining) = response.timer_remaining {
            self.set_remaining(remaining);
        }
        // every response carries a score field; only kills and `score` fill it in
        if reports_score(response) {
            if let Some(score) = response.score {
                self.score = score;
            }
        }
        if let Some(direction) = &response.mole_direction {
            self.set_direction(direction.clone());
        }
        if !response.mole_spawned {
            return false;
        }

        self.flush_pending(tree);

        let killed = response.current_path.clone();
        *tree = with_mole_at(tree, Some(&killed));
        self.state = MoleState::Caught;
        self.caught = true;
        self.fleeing = false;
        self.mole_path = Some(killed.clone());
        self.moles_killed = response
            .moles_killed
            .unwrap_or(self.moles_killed.saturating_add(1));
        self.timer_reason = reason_for(response.timer_reason.as_deref(), response.timer_distance)
            .or_else(|| self.timer_reason.take());
        self.pending = Some(PendingEffect {
            kind: EffectKind::Caught,
            due_ms: self.now_ms + self.options.caught_settle_ms,
            next_location: response.new_mole_location.clone(),
            next_timer: response.new_timer,
        });
        info!(path = %killed, score = self.score, "mole caught");
        self.events.push(MoleEvent::Caught {
            path: killed,
            score: self.score,
        });
        true
    }

    /// Applies a countdown poll. Returns true when the server should be asked
    /// whether the mole escaped.
    pub fn apply_timer_status(&mut self, status: &TimerStatus) -> bool {
        if status.total > 0 {
            self.total_seconds = status.total;
        }
        self.paused = status.paused;
        self.set_remaining(status.remaining);
        self.expired = self.expired || status.expired;
        self.expired && self.state == MoleState::Active && self.pending.is_none()
    }

    /// Folds a `check_timer` answer. An escape starts the flee effect and
    /// yields the narrative history line.
    pub fn apply_escape(
        &mut self,
        tree: &mut TreeNode,
        response: &CheckTimerResponse,
    ) -> Option<CommandHistoryEntry> {
        if let Some(remaining) = response.timer_remaining {
            self.set_remaining(remaining);
        }
        self.paused = response.timer_paused;
        if !response.mole_escaped {
            self.expired = response.timer_expired;
            return None;
        }
        let Some(escape) = response.escape_data.as_ref() else {
            debug!("escape reported without escape data");
            return None;
        };

        self.flush_pending(tree);

        let from = escape
            .old_location
            .clone()
            .or_else(|| self.mole_path.clone());
        let direction = escape
            .mole_direction
            .clone()
            .or_else(|| response.mole_direction.clone());
        if let Some(direction) = &direction {
            self.set_direction(direction.clone());
        }
        self.timer_reason = reason_for(escape.timer_reason.as_deref(), Some(escape.distance));
        self.state = MoleState::Fleeing;
        self.fleeing = true;
        self.caught = false;
        self.moles_escaped = self.moles_escaped.saturating_add(1);
        self.pending = Some(PendingEffect {
            kind: EffectKind::Fled,
            due_ms: self.now_ms + self.options.flee_settle_ms,
            next_location: Some(escape.new_location.clone()),
            next_timer: escape.new_timer,
        });
        info!(
            from = from.as_deref().unwrap_or("?"),
            to = %escape.new_location,
            distance = escape.distance,
            "mole escaped"
        );
        self.events.push(MoleEvent::Escaped {
            from,
            to: escape.new_location.clone(),
            distance: escape.distance,
        });
        Some(CommandHistoryEntry::new(
            "",
            escape_narrative(direction.as_ref(), escape.distance, response.message.as_deref()),
            false,
        ))
    }

    /// Moves the coordinator clock forward, firing due effects. Returns true
    /// when anything visible changed.
    pub fn advance(&mut self, dt_ms: u64, tree: &mut TreeNode) -> bool {
        self.now_ms = self.now_ms.saturating_add(dt_ms);
        let mut changed = false;
        if self
            .direction
            .as_ref()
            .is_some_and(|indicator| indicator.expires_at_ms <= self.now_ms)
        {
            self.direction = None;
            self.events.push(MoleEvent::DirectionCleared);
            changed = true;
        }
        if self
            .pending
            .as_ref()
            .is_some_and(|effect| effect.due_ms <= self.now_ms)
        {
            self.flush_pending(tree);
            changed = true;
        }
        changed
    }

    pub fn snapshot(&self) -> MoleSnapshot {
        let remaining = self.remaining_seconds.max(0);
        MoleSnapshot {
            state: self.state,
            mole_path: self.mole_path.clone(),
            remaining_seconds: remaining,
            total_seconds: self.total_seconds,
            warning_level: self.options.thresholds.level_for(remaining),
            expired: self.expired,
            paused: self.paused,
            direction: self
                .direction
                .as_ref()
                .map(|indicator| indicator.direction.clone()),
            caught: self.caught,
            fleeing: self.fleeing,
            timer_reason: self.timer_reason.clone(),
            score: self.score,
            moles_killed: self.moles_killed,
            moles_escaped: self.moles_escaped,
        }
    }

    fn set_remaining(&mut self, remaining: i64) {
        self.remaining_seconds = remaining;
        if remaining > 0 {
            self.expired = false;
        }
    }

    fn set_direction(&mut self, direction: MoleDirection) {
        self.direction = Some(DirectionIndicator {
            direction,
            expires_at_ms: self.now_ms + self.options.direction_ttl_ms,
        });
    }

    fn flush_pending(&mut self, tree: &mut TreeNode) {
        let Some(effect) = self.pending.take() else {
            return;
        };
        self.caught = false;
        self.fleeing = false;
        *tree = with_mole_at(tree, effect.next_location.as_deref());
        self.mole_path = effect.next_location.clone();
        self.state = if self.mole_path.is_some() {
            MoleState::Active
        } else {
            MoleState::None
        };
        if let Some(seconds) = effect.next_timer {
            self.remaining_seconds = seconds;
            self.total_seconds = seconds;
        }
        self.expired = false;
        debug!(kind = ?effect.kind, path = ?self.mole_path, "mole effect settled");
        self.events.push(MoleEvent::Settled {
            kind: effect.kind,
            path: effect.next_location,
        });
    }
}

fn reports_score(response: &CommandResponse) -> bool {
    response.mole_spawned
        || response
            .command
            .as_deref()
            .and_then(|command| command.split_whitespace().next())
            == Some("score")
}

fn reason_for(reason: Option<&str>, distance: Option<u32>) -> Option<String> {
    reason
        .map(str::to_string)
        .or_else(|| distance.map(|distance| get_timer_reason(distance).to_string()))
}

fn escape_narrative(direction: Option<&MoleDirection>, distance: u32, message: Option<&str>) -> String {
    let hops = if distance == 1 { "directory" } else { "directories" };
    let line = match direction {
        Some(direction) => format!(
            "The mole escaped and burrowed {} to a new hiding spot {distance} {hops} away.",
            direction.compass
        ),
        None => format!("The mole escaped to a new hiding spot {distance} {hops} away."),
    };
    match message {
        Some(message) if !message.is_empty() => format!("{message}\n{line}"),
        _ => line,
    }
}
