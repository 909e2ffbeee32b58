use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "is_fhs", alias = "is_standard_path", default)]
    pub is_standard_path: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub has_mole: bool,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            is_standard_path: false,
            description: String::new(),
            has_mole: false,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children;
        self
    }
}

/// Flat copy of a tree node as handed to the view layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeSummary {
    pub name: String,
    pub path: String,
    pub is_standard_path: bool,
    pub description: String,
    pub has_mole: bool,
    pub child_count: usize,
}

impl From<&TreeNode> for NodeSummary {
    fn from(node: &TreeNode) -> Self {
        Self {
            name: node.name.clone(),
            path: node.path.clone(),
            is_standard_path: node.is_standard_path,
            description: node.description.clone(),
            has_mole: node.has_mole,
            child_count: node.children.len(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PositionedNode {
    pub node: NodeSummary,
    pub x: f64,
    pub y: f64,
    pub depth: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CameraTransform {
    #[serde(rename = "translateX")]
    pub translate_x: f64,
    #[serde(rename = "translateY")]
    pub translate_y: f64,
    pub scale: f64,
}

impl CameraTransform {
    pub const IDENTITY: Self = Self {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    pub fn lerp(&self, to: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            translate_x: self.translate_x + (to.translate_x - self.translate_x) * t,
            translate_y: self.translate_y + (to.translate_y - self.translate_y) * t,
            scale: self.scale + (to.scale - self.scale) * t,
        }
    }
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoleDirection {
    pub angle: f64,
    pub compass: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    #[default]
    None,
    Warning,
    Alert,
    Critical,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoleState {
    #[default]
    None,
    Active,
    Fleeing,
    Caught,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHistoryEntry {
    pub command: String,
    pub output: String,
    pub success: bool,
}

impl CommandHistoryEntry {
    pub fn new(command: &str, output: impl Into<String>, success: bool) -> Self {
        Self {
            command: command.to_string(),
            output: output.into(),
            success,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameSession {
    pub tree_id: i64,
    pub session_id: i64,
    pub player_name: String,
    pub player_path: String,
    pub home_directory: String,
    pub mole_hint: String,
    pub completed: bool,
    pub started_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MoleSnapshot {
    pub state: MoleState,
    pub mole_path: Option<String>,
    pub remaining_seconds: i64,
    pub total_seconds: i64,
    pub warning_level: WarningLevel,
    pub expired: bool,
    pub paused: bool,
    pub direction: Option<MoleDirection>,
    pub caught: bool,
    pub fleeing: bool,
    pub timer_reason: Option<String>,
    pub score: i64,
    pub moles_killed: u32,
    pub moles_escaped: u32,
}
