use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adjacency::navigable_paths;
use crate::camera::{CameraMode, Choreographer};
use crate::config::EngineConfig;
use crate::error::ClientError;
use crate::layout::{layout, TreeLayout};
use crate::mole::MoleCoordinator;
use crate::pipeline::{success_entry, CommandHistory};
use crate::protocol::{CheckTimerResponse, CommandResponse, CreateGameResponse};
use crate::scheduler::IntervalTask;
use crate::tree::contains;
use crate::types::{
    CameraTransform, CommandHistoryEntry, GameSession, MoleSnapshot, PositionedNode, TreeNode,
};

/// Read-only picture handed to the view layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViewSnapshot {
    pub generation: u64,
    pub session: Option<GameSession>,
    pub nodes: Vec<PositionedNode>,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub navigable: Vec<String>,
    pub camera: CameraTransform,
    pub camera_mode: CameraMode,
    pub mole: MoleSnapshot,
    pub history: Vec<CommandHistoryEntry>,
    pub command_in_flight: bool,
}

impl ViewSnapshot {
    pub fn player_path(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|session| session.player_path.as_str())
    }
}

/// Everything behind the client mutex. Methods here never await.
pub(crate) struct ClientState {
    pub(crate) config: EngineConfig,
    pub(crate) generation: u64,
    pub(crate) session: Option<GameSession>,
    pub(crate) tree: Option<TreeNode>,
    pub(crate) layout: TreeLayout,
    pub(crate) camera: Choreographer,
    pub(crate) mole: MoleCoordinator,
    pub(crate) history: CommandHistory,
    pub(crate) escape_check_in_flight: bool,
    pub(crate) in_flight: Arc<AtomicBool>,
    pub(crate) poll_task: Option<IntervalTask>,
}

impl ClientState {
    pub(crate) fn new(config: EngineConfig) -> Self {
        Self {
            config,
            generation: 0,
            session: None,
            tree: None,
            layout: TreeLayout::default(),
            camera: Choreographer::new(config.camera),
            mole: MoleCoordinator::new(config.mole),
            history: CommandHistory::default(),
            escape_check_in_flight: false,
            in_flight: Arc::new(AtomicBool::new(false)),
            poll_task: None,
        }
    }

    /// Drops the session and everything scheduled for it. Returns the new
    /// generation; responses tagged with an older one are discarded.
    pub(crate) fn teardown(&mut self) -> u64 {
        self.poll_task = None;
        self.session = None;
        self.tree = None;
        self.layout = TreeLayout::default();
        self.camera.reset();
        self.mole.reset();
        self.history = CommandHistory::default();
        self.escape_check_in_flight = false;
        // a request still out for the old game keeps only the old flag
        self.in_flight = Arc::new(AtomicBool::new(false));
        self.generation += 1;
        self.generation
    }

    pub(crate) fn session_ids(&self) -> Option<(i64, i64)> {
        self.session
            .as_ref()
            .map(|session| (session.tree_id, session.session_id))
    }

    pub(crate) fn player_path(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|session| session.player_path.as_str())
    }

    pub(crate) fn install(
        &mut self,
        response: CreateGameResponse,
        player_name: &str,
    ) -> Result<GameSession, ClientError> {
        let mut tree = response.tree.tree_data;
        let player_path = response.tree.player_location;
        if !contains(&tree, &player_path) {
            return Err(ClientError::MissingPlayerNode(player_path));
        }

        self.mole
            .begin(&mut tree, response.initial_timer, response.timer_reason);
        let session = GameSession {
            tree_id: response.tree.id,
            session_id: response.session_id,
            player_name: player_name.to_string(),
            player_path: player_path.clone(),
            home_directory: response.home_directory,
            mole_hint: response.mole_hint,
            completed: false,
            started_at: Utc::now(),
        };
        self.layout = layout(&tree, &self.config.layout);
        self.camera.begin(
            &self.layout,
            &player_path,
            self.mole.mole_path(),
            self.config.intro_enabled,
        );
        self.tree = Some(tree);
        self.session = Some(session.clone());
        self.log_mole_events();
        info!(
            tree_id = session.tree_id,
            session_id = session.session_id,
            player = %session.player_path,
            mole = self.mole.mole_path().unwrap_or("-"),
            nodes = self.layout.nodes.len(),
            "game installed"
        );
        Ok(session)
    }

    /// Recomputes positions and lets the camera react.
    pub(crate) fn render(&mut self, location_changed: bool) {
        let (Some(tree), Some(session)) = (self.tree.as_ref(), self.session.as_ref()) else {
            return;
        };
        self.layout = layout(tree, &self.config.layout);
        self.camera
            .on_render(&self.layout, &session.player_path, location_changed);
    }

    /// Folds one confirmed command response: location first, then mole
    /// state, then the history line.
    pub(crate) fn merge_command(&mut self, command: &str, response: &CommandResponse) {
        let moved = match self.session.as_mut() {
            Some(session) if session.player_path != response.current_path => {
                session.player_path = response.current_path.clone();
                true
            }
            _ => false,
        };
        if moved {
            if let Some(tree) = &self.tree {
                if !contains(tree, &response.current_path) {
                    warn!(path = %response.current_path, "moved to a path outside the tree");
                }
            }
            debug!(path = %response.current_path, "player moved");
            self.render(true);
        }

        let rebuilt = match self.tree.as_mut() {
            Some(tree) => self.mole.apply_command(tree, response),
            None => false,
        };
        if rebuilt {
            self.render(false);
        }
        self.log_mole_events();
        self.history.push(success_entry(command, response));
    }

    pub(crate) fn merge_escape(&mut self, response: &CheckTimerResponse) -> bool {
        let Some(tree) = self.tree.as_mut() else {
            return false;
        };
        let entry = self.mole.apply_escape(tree, response);
        self.log_mole_events();
        match entry {
            Some(entry) => {
                self.history.push(entry);
                self.render(false);
                true
            }
            None => false,
        }
    }

    /// Advances camera and mole clocks. Returns whether anything visible
    /// changed.
    pub(crate) fn tick(&mut self, dt_ms: u64) -> bool {
        let moved = self.camera.step(dt_ms);
        let rebuilt = match self.tree.as_mut() {
            Some(tree) => self.mole.advance(dt_ms, tree),
            None => false,
        };
        if rebuilt {
            self.render(false);
            self.log_mole_events();
        }
        moved || rebuilt
    }

    pub(crate) fn snapshot(&self) -> ViewSnapshot {
        let navigable = match (self.tree.as_ref(), self.player_path()) {
            (Some(tree), Some(player)) => navigable_paths(tree, player),
            _ => Vec::new(),
        };
        ViewSnapshot {
            generation: self.generation,
            session: self.session.clone(),
            nodes: self.layout.nodes.clone(),
            canvas_width: self.layout.width,
            canvas_height: self.layout.height,
            navigable,
            camera: self.camera.transform(),
            camera_mode: self.camera.mode(),
            mole: self.mole.snapshot(),
            history: self.history.entries().to_vec(),
            command_in_flight: self.in_flight.load(Ordering::Acquire),
        }
    }

    fn log_mole_events(&mut self) {
        for event in self.mole.drain_events() {
            debug!(?event, "mole event");
        }
    }
}
