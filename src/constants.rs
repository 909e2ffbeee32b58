pub const FRAME_MS: u64 = 16;
pub const TIMER_POLL_INTERVAL_MS: u64 = 1_000;

pub const DEFAULT_MOLE_TIMER_SECS: i64 = 60;
pub const WARNING_THRESHOLD_SECS: i64 = 30;
pub const ALERT_THRESHOLD_SECS: i64 = 15;
pub const CRITICAL_THRESHOLD_SECS: i64 = 5;

pub const DIRECTION_INDICATOR_TTL_MS: u64 = 5_000;
pub const CAUGHT_EFFECT_MS: u64 = 1_500;
pub const CAUGHT_SETTLE_MS: u64 = 2_000;
pub const FLEE_EFFECT_MS: u64 = 800;
pub const FLEE_SETTLE_MS: u64 = 1_000;

pub const VIEWPORT_WIDTH: f64 = 1_280.0;
pub const VIEWPORT_HEIGHT: f64 = 720.0;

pub const CANVAS_WIDTH_MULTIPLIER: f64 = 1.5;
pub const NODE_SPACING: f64 = 120.0;
pub const LEVEL_HEIGHT: f64 = 140.0;
pub const LAYOUT_MARGIN: f64 = 60.0;

pub const TOP_LEVEL_SEPARATION: f64 = 3.5;
pub const CROWDED_LEAF_SEPARATION: f64 = 2.25;
pub const SIBLING_SEPARATION: f64 = 1.75;
pub const COUSIN_SEPARATION: f64 = 2.0;
pub const CROWDED_CHILD_COUNT: usize = 3;
pub const TOP_LEVEL_MAX_DEPTH: usize = 2;

pub const INTRO_ROOT_SCALE: f64 = 2.5;
pub const INTRO_FIT_MS: u64 = 2_000;
pub const INTRO_HOLD_MS: u64 = 1_000;
pub const INTRO_MOLE_MS: u64 = 1_500;
pub const INTRO_MOLE_HOLD_MS: u64 = 1_200;
pub const INTRO_SETTLE_MS: u64 = 1_500;
pub const NAVIGATE_MS: u64 = 750;

pub const PLAYER_SCALE: f64 = 1.2;
pub const MOLE_SCALE: f64 = 1.5;
pub const PLAYER_OFFSET_X: f64 = 0.0;
pub const PLAYER_OFFSET_Y: f64 = -0.15;
pub const FIT_PADDING: f64 = 80.0;
pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 4.0;

pub const COMMAND_FAILURE_MESSAGE: &str = "Error: Failed to execute command";

pub fn get_timer_reason(distance: u32) -> &'static str {
    if distance <= 1 {
        return "nearby";
    }
    if distance <= 3 {
        return "close";
    }
    if distance <= 5 {
        return "moderate distance";
    }
    "far away"
}
