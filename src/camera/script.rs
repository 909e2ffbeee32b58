use serde::Serialize;

use super::easing::Easing;
use super::framing::{fit_tree, focus_transform, player_transform};
use crate::config::CameraOptions;
use crate::layout::TreeLayout;
use crate::tree::ROOT_PATH;
use crate::types::CameraTransform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    SnapRoot,
    FitTree,
    Hold,
    FocusMole,
    SettlePlayer,
    Navigate,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Phase {
    pub kind: PhaseKind,
    pub target: CameraTransform,
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Phase {
    fn hold(target: CameraTransform, duration_ms: u64) -> Self {
        Self {
            kind: PhaseKind::Hold,
            target,
            duration_ms,
            easing: Easing::Linear,
        }
    }
}

/// Opening flyover: root close-up, whole tree, optional mole, then the player.
pub fn intro_script(
    layout: &TreeLayout,
    player_path: &str,
    mole_path: Option<&str>,
    options: &CameraOptions,
) -> Vec<Phase> {
    let mut phases = Vec::with_capacity(6);
    phases.push(Phase {
        kind: PhaseKind::SnapRoot,
        target: focus_transform(layout, ROOT_PATH, options.intro_root_scale, options),
        duration_ms: 0,
        easing: Easing::Linear,
    });

    let overview = fit_tree(layout, options);
    phases.push(Phase {
        kind: PhaseKind::FitTree,
        target: overview,
        duration_ms: options.intro_fit_ms,
        easing: Easing::CubicInOut,
    });
    phases.push(Phase::hold(overview, options.intro_hold_ms));

    if let Some(mole_path) = mole_path {
        let mole_view = focus_transform(layout, mole_path, options.mole_scale, options);
        phases.push(Phase {
            kind: PhaseKind::FocusMole,
            target: mole_view,
            duration_ms: options.intro_mole_ms,
            easing: Easing::CubicInOut,
        });
        phases.push(Phase::hold(mole_view, options.intro_mole_hold_ms));
    }

    phases.push(Phase {
        kind: PhaseKind::SettlePlayer,
        target: player_transform(layout, player_path, options),
        duration_ms: options.intro_settle_ms,
        easing: Easing::CubicInOut,
    });
    phases
}

pub fn navigate_phase(target: CameraTransform, options: &CameraOptions) -> Phase {
    Phase {
        kind: PhaseKind::Navigate,
        target,
        duration_ms: options.navigate_ms,
        easing: Easing::CubicOut,
    }
}
