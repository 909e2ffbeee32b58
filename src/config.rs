use crate::constants::{
    ALERT_THRESHOLD_SECS, CANVAS_WIDTH_MULTIPLIER, CAUGHT_SETTLE_MS, COUSIN_SEPARATION,
    CRITICAL_THRESHOLD_SECS, CROWDED_CHILD_COUNT, CROWDED_LEAF_SEPARATION,
    DEFAULT_MOLE_TIMER_SECS, DIRECTION_INDICATOR_TTL_MS, FIT_PADDING, FLEE_SETTLE_MS, FRAME_MS,
    INTRO_FIT_MS, INTRO_HOLD_MS, INTRO_MOLE_HOLD_MS, INTRO_MOLE_MS, INTRO_ROOT_SCALE,
    INTRO_SETTLE_MS, LAYOUT_MARGIN, LEVEL_HEIGHT, MAX_SCALE, MIN_SCALE, MOLE_SCALE, NAVIGATE_MS,
    NODE_SPACING, PLAYER_OFFSET_X, PLAYER_OFFSET_Y, PLAYER_SCALE, SIBLING_SEPARATION,
    TIMER_POLL_INTERVAL_MS, TOP_LEVEL_MAX_DEPTH, TOP_LEVEL_SEPARATION, VIEWPORT_HEIGHT,
    VIEWPORT_WIDTH, WARNING_THRESHOLD_SECS,
};
use crate::types::{Margin, Viewport, WarningLevel};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeparationOptions {
    pub top_level: f64,
    pub top_level_max_depth: usize,
    pub crowded_leaf: f64,
    pub crowded_child_count: usize,
    pub sibling: f64,
    pub cousin: f64,
}

impl Default for SeparationOptions {
    fn default() -> Self {
        Self {
            top_level: TOP_LEVEL_SEPARATION,
            top_level_max_depth: TOP_LEVEL_MAX_DEPTH,
            crowded_leaf: CROWDED_LEAF_SEPARATION,
            crowded_child_count: CROWDED_CHILD_COUNT,
            sibling: SIBLING_SEPARATION,
            cousin: COUSIN_SEPARATION,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
    pub container_width: f64,
    pub width_multiplier: f64,
    pub node_spacing: f64,
    pub level_height: f64,
    pub margin: Margin,
    pub separation: SeparationOptions,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            container_width: VIEWPORT_WIDTH,
            width_multiplier: CANVAS_WIDTH_MULTIPLIER,
            node_spacing: NODE_SPACING,
            level_height: LEVEL_HEIGHT,
            margin: Margin::uniform(LAYOUT_MARGIN),
            separation: SeparationOptions::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraOptions {
    pub viewport: Viewport,
    pub intro_root_scale: f64,
    pub intro_fit_ms: u64,
    pub intro_hold_ms: u64,
    pub intro_mole_ms: u64,
    pub intro_mole_hold_ms: u64,
    pub intro_settle_ms: u64,
    pub navigate_ms: u64,
    pub player_scale: f64,
    pub mole_scale: f64,
    /// Fraction of the viewport size added to the player-centred translation.
    pub player_offset: (f64, f64),
    pub fit_padding: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport {
                width: VIEWPORT_WIDTH,
                height: VIEWPORT_HEIGHT,
            },
            intro_root_scale: INTRO_ROOT_SCALE,
            intro_fit_ms: INTRO_FIT_MS,
            intro_hold_ms: INTRO_HOLD_MS,
            intro_mole_ms: INTRO_MOLE_MS,
            intro_mole_hold_ms: INTRO_MOLE_HOLD_MS,
            intro_settle_ms: INTRO_SETTLE_MS,
            navigate_ms: NAVIGATE_MS,
            player_scale: PLAYER_SCALE,
            mole_scale: MOLE_SCALE,
            player_offset: (PLAYER_OFFSET_X, PLAYER_OFFSET_Y),
            fit_padding: FIT_PADDING,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerThresholds {
    pub warning_secs: i64,
    pub alert_secs: i64,
    pub critical_secs: i64,
}

impl TimerThresholds {
    pub fn level_for(&self, remaining_secs: i64) -> WarningLevel {
        if remaining_secs <= 0 {
            return WarningLevel::None;
        }
        if remaining_secs <= self.critical_secs {
            return WarningLevel::Critical;
        }
        if remaining_secs <= self.alert_secs {
            return WarningLevel::Alert;
        }
        if remaining_secs <= self.warning_secs {
            return WarningLevel::Warning;
        }
        WarningLevel::None
    }
}

impl Default for TimerThresholds {
    fn default() -> Self {
        Self {
            warning_secs: WARNING_THRESHOLD_SECS,
            alert_secs: ALERT_THRESHOLD_SECS,
            critical_secs: CRITICAL_THRESHOLD_SECS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoleOptions {
    pub thresholds: TimerThresholds,
    pub caught_settle_ms: u64,
    pub flee_settle_ms: u64,
    pub direction_ttl_ms: u64,
    pub default_timer_secs: i64,
}

impl Default for MoleOptions {
    fn default() -> Self {
        Self {
            thresholds: TimerThresholds::default(),
            caught_settle_ms: CAUGHT_SETTLE_MS,
            flee_settle_ms: FLEE_SETTLE_MS,
            direction_ttl_ms: DIRECTION_INDICATOR_TTL_MS,
            default_timer_secs: DEFAULT_MOLE_TIMER_SECS,
        }
    }
}

/// Immutable settings handed to every component at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub layout: LayoutOptions,
    pub camera: CameraOptions,
    pub mole: MoleOptions,
    pub intro_enabled: bool,
    pub poll_interval_ms: u64,
    pub frame_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutOptions::default(),
            camera: CameraOptions::default(),
            mole: MoleOptions::default(),
            intro_enabled: true,
            poll_interval_ms: TIMER_POLL_INTERVAL_MS,
            frame_ms: FRAME_MS,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `MOLE_SKIP_INTRO` and `MOLE_VIEWPORT` (`WIDTHxHEIGHT`).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("MOLE_SKIP_INTRO") {
            config.intro_enabled = !parse_flag(&raw);
        }
        if let Some((width, height)) = std::env::var("MOLE_VIEWPORT")
            .ok()
            .and_then(|raw| parse_viewport(&raw))
        {
            config = config.with_viewport(width, height);
        }
        config
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.camera.viewport = Viewport { width, height };
        self.layout.container_width = width;
        self
    }

    pub fn without_intro(mut self) -> Self {
        self.intro_enabled = false;
        self
    }
}

pub fn parse_viewport(raw: &str) -> Option<(f64, f64)> {
    let (width, height) = raw.trim().split_once(['x', 'X'])?;
    let width = width.trim().parse::<f64>().ok()?;
    let height = height.trim().parse::<f64>().ok()?;
    if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some((width, height))
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
