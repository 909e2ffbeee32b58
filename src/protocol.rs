//! Wire shapes exchanged with the game service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{MoleDirection, TreeNode};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreateGameRequest {
    pub name: String,
    pub player_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirs_per_level: Option<u32>,
}

impl CreateGameRequest {
    pub fn new(player_name: &str) -> Self {
        Self {
            name: "FHS Game Tree".to_string(),
            player_name: player_name.to_string(),
            max_depth: None,
            dirs_per_level: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameTree {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub player_location: String,
    pub tree_data: TreeNode,
    #[serde(default)]
    pub total_directories: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateGameResponse {
    pub tree: GameTree,
    pub session_id: i64,
    #[serde(default)]
    pub mole_hint: String,
    #[serde(default)]
    pub home_directory: String,
    #[serde(default)]
    pub initial_timer: Option<i64>,
    #[serde(default)]
    pub timer_reason: Option<String>,
    #[serde(default)]
    pub timer_distance: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecuteCommandRequest {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimerWarning {
    pub level: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub command: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub output: String,
    pub current_path: String,
    #[serde(default)]
    pub mole_spawned: bool,
    #[serde(default)]
    pub new_mole_location: Option<String>,
    #[serde(default)]
    pub mole_direction: Option<MoleDirection>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub moles_killed: Option<u32>,
    #[serde(default)]
    pub timer_remaining: Option<i64>,
    #[serde(default)]
    pub timer_warnings: Vec<TimerWarning>,
    #[serde(default)]
    pub new_timer: Option<i64>,
    #[serde(default)]
    pub timer_reason: Option<String>,
    #[serde(default)]
    pub timer_distance: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub remaining: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub warning_level: Option<String>,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub paused: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscapeData {
    #[serde(default)]
    pub old_location: Option<String>,
    pub new_location: String,
    #[serde(default)]
    pub mole_direction: Option<MoleDirection>,
    #[serde(default)]
    pub timer_reason: Option<String>,
    #[serde(default)]
    pub distance: u32,
    #[serde(default)]
    pub new_timer: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckTimerResponse {
    #[serde(default)]
    pub timer_remaining: Option<i64>,
    #[serde(default)]
    pub timer_expired: bool,
    #[serde(default)]
    pub mole_location: Option<String>,
    #[serde(default)]
    pub timer_paused: bool,
    #[serde(default)]
    pub mole_escaped: bool,
    #[serde(default)]
    pub escape_data: Option<EscapeData>,
    #[serde(default)]
    pub mole_direction: Option<MoleDirection>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HintResponse {
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl HintResponse {
    /// Both response spellings flattened into one list.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.hints.clone();
        if let Some(hint) = &self.hint {
            lines.push(hint.clone());
        }
        lines
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FhsDirectory {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FhsReference {
    #[serde(default)]
    pub directories: Vec<FhsDirectory>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandReferenceEntry {
    pub command: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// Reference entries grouped by category ("navigation", "exploration", ...).
pub type CommandReference = BTreeMap<String, Vec<CommandReferenceEntry>>;
