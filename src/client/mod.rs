//! Async facade tying the engine pieces to a [`GameService`].
//!
//! All mutable state sits behind one `tokio::sync::Mutex`. The lock is taken
//! in short synchronous sections and released before every service call;
//! each section re-checks the session generation so responses that outlive
//! their game are dropped.

mod state;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::adjacency::is_navigable;
use crate::config::EngineConfig;
use crate::error::{ClientError, ServiceResult};
use crate::pipeline::{failure_entry, normalize_command, ExecuteOutcome, InFlightGuard, RejectReason};
use crate::protocol::{CommandReference, CreateGameRequest, ExecuteCommandRequest, FhsReference};
use crate::scheduler::IntervalTask;
use crate::service::GameService;
use crate::types::{CommandHistoryEntry, GameSession};

use self::state::ClientState;
pub use self::state::ViewSnapshot;

pub const HINT_COMMAND: &str = "hint";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    NoSession,
    Updated,
    Escaped,
    Failed,
    Discarded,
}

struct Shared {
    service: Arc<dyn GameService>,
    state: Mutex<ClientState>,
}

#[derive(Clone)]
pub struct GameClient {
    inner: Arc<Shared>,
}

impl GameClient {
    pub fn new(service: Arc<dyn GameService>, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Shared {
                service,
                state: Mutex::new(ClientState::new(config)),
            }),
        }
    }

    /// Whether a command of the current game is awaiting its response.
    pub async fn is_command_in_flight(&self) -> bool {
        self.inner.state.lock().await.in_flight.load(Ordering::Acquire)
    }

    /// Tears down the current game, creates a new one and restarts the
    /// countdown poll.
    pub async fn new_game(&self, player_name: &str) -> Result<GameSession, ClientError> {
        let generation = self.inner.state.lock().await.teardown();
        info!(player = player_name, generation, "starting new game");

        let response = self
            .inner
            .service
            .create_game(&CreateGameRequest::new(player_name))
            .await?;

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            return Err(ClientError::Superseded);
        }
        let session = state.install(response, player_name)?;
        let period = Duration::from_millis(state.config.poll_interval_ms);
        state.poll_task = Some(self.spawn_poll(period));
        Ok(session)
    }

    /// Ends the current game without starting another.
    pub async fn end_game(&self) {
        self.inner.state.lock().await.teardown();
    }

    pub async fn execute(&self, raw: &str) -> ExecuteOutcome {
        let Some(command) = normalize_command(raw) else {
            debug!("ignoring blank command");
            return ExecuteOutcome::rejected(RejectReason::Blank);
        };
        let (tree_id, session_id, generation, _guard) = {
            let state = self.inner.state.lock().await;
            let Some((tree_id, session_id)) = state.session_ids() else {
                debug!(%command, "no session; command ignored");
                return ExecuteOutcome::rejected(RejectReason::NoSession);
            };
            // the flag belongs to this game; teardown swaps in a fresh one
            let Some(guard) = InFlightGuard::try_acquire(&state.in_flight) else {
                debug!(%command, "command already in flight; ignored");
                return ExecuteOutcome::rejected(RejectReason::InFlight);
            };
            (tree_id, session_id, state.generation, guard)
        };

        let request = ExecuteCommandRequest {
            command: command.clone(),
            session_id: Some(session_id),
        };
        let result = self.inner.service.execute_command(tree_id, &request).await;

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            debug!(%command, "response for a previous game discarded");
            return ExecuteOutcome::Discarded;
        }
        match result {
            Ok(response) => {
                state.merge_command(&command, &response);
                ExecuteOutcome::Completed {
                    success: response.success,
                }
            }
            Err(err) => {
                warn!(%command, error = %err, transport = err.is_transport(), "command failed");
                state.history.push(failure_entry(&command));
                ExecuteOutcome::TransportFailed
            }
        }
    }

    /// Click handler for the view: only parent and direct children react.
    pub async fn on_node_click(&self, path: &str) -> ExecuteOutcome {
        let current = {
            let state = self.inner.state.lock().await;
            match state.player_path() {
                Some(current) => current.to_string(),
                None => return ExecuteOutcome::rejected(RejectReason::NoSession),
            }
        };
        if !is_navigable(path, &current) {
            debug!(path, current = %current, "click on non-adjacent node ignored");
            return ExecuteOutcome::rejected(RejectReason::NotNavigable);
        }
        self.execute(&format!("cd {path}")).await
    }

    /// One countdown poll, followed by an escape check when the countdown
    /// ran out.
    pub async fn poll_timer_once(&self) -> PollOutcome {
        let (tree_id, session_id, generation) = {
            let state = self.inner.state.lock().await;
            match state.session_ids() {
                Some((tree_id, session_id)) => (tree_id, session_id, state.generation),
                None => return PollOutcome::NoSession,
            }
        };

        let status = match self.inner.service.timer_status(tree_id).await {
            Ok(status) => status,
            Err(err) => {
                warn!(error = %err, "timer poll failed");
                return PollOutcome::Failed;
            }
        };

        {
            let mut state = self.inner.state.lock().await;
            if state.generation != generation {
                return PollOutcome::Discarded;
            }
            let wants_check = state.mole.apply_timer_status(&status);
            if !wants_check || state.escape_check_in_flight {
                return PollOutcome::Updated;
            }
            state.escape_check_in_flight = true;
        }

        let result = self
            .inner
            .service
            .check_timer(tree_id, Some(session_id))
            .await;

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            return PollOutcome::Discarded;
        }
        state.escape_check_in_flight = false;
        match result {
            Ok(response) if state.merge_escape(&response) => PollOutcome::Escaped,
            Ok(_) => PollOutcome::Updated,
            Err(err) => {
                warn!(error = %err, "escape check failed");
                PollOutcome::Failed
            }
        }
    }

    /// Advances animation and deferred effects by `dt_ms`.
    pub async fn tick(&self, dt_ms: u64) -> bool {
        self.inner.state.lock().await.tick(dt_ms)
    }

    pub async fn request_hint(&self) -> ExecuteOutcome {
        let (tree_id, generation) = {
            let state = self.inner.state.lock().await;
            match state.session_ids() {
                Some((tree_id, _)) => (tree_id, state.generation),
                None => return ExecuteOutcome::rejected(RejectReason::NoSession),
            }
        };
        let result = self.inner.service.hint(tree_id).await;

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            return ExecuteOutcome::Discarded;
        }
        match result {
            Ok(hint) => {
                let output = hint.lines().join("\n");
                state
                    .history
                    .push(CommandHistoryEntry::new(HINT_COMMAND, output, true));
                ExecuteOutcome::Completed { success: true }
            }
            Err(err) => {
                warn!(error = %err, "hint request failed");
                state.history.push(failure_entry(HINT_COMMAND));
                ExecuteOutcome::TransportFailed
            }
        }
    }

    pub async fn command_reference(&self) -> ServiceResult<CommandReference> {
        self.inner.service.command_reference().await
    }

    pub async fn fhs_reference(&self) -> ServiceResult<FhsReference> {
        self.inner.service.fhs_reference().await
    }

    pub async fn view(&self) -> ViewSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    /// Drives [`GameClient::tick`] at the configured frame rate until the
    /// returned task is dropped or the client goes away.
    pub async fn spawn_frame_loop(&self) -> IntervalTask {
        let frame_ms = self.inner.state.lock().await.config.frame_ms;
        let weak = Arc::downgrade(&self.inner);
        IntervalTask::spawn(Duration::from_millis(frame_ms), move || {
            let weak = weak.clone();
            async move {
                if let Some(client) = upgrade(&weak) {
                    client.tick(frame_ms).await;
                }
            }
        })
    }

    fn spawn_poll(&self, period: Duration) -> IntervalTask {
        let weak = Arc::downgrade(&self.inner);
        IntervalTask::spawn(period, move || {
            let weak = weak.clone();
            async move {
                if let Some(client) = upgrade(&weak) {
                    client.poll_timer_once().await;
                }
            }
        })
    }
}

fn upgrade(weak: &Weak<Shared>) -> Option<GameClient> {
    weak.upgrade().map(|inner| GameClient { inner })
}
