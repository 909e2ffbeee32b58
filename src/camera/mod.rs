//! Camera choreography.
//!
//! The camera is a pure state machine: scripted phases sit in a queue and
//! `step` consumes elapsed time, finishing each phase exactly on its target
//! before the next one starts. Nothing here schedules callbacks; whoever
//! owns the clock drives `step`.

use std::collections::VecDeque;

use serde::Serialize;

use crate::config::CameraOptions;
use crate::layout::TreeLayout;
use crate::types::CameraTransform;

pub mod easing;
pub mod framing;
pub mod script;

use self::framing::player_transform;
use self::script::{intro_script, navigate_phase, Phase, PhaseKind};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    #[default]
    Idle,
    IntroPlaying,
    NavigationTransition,
}

#[derive(Clone, Debug)]
struct ActivePhase {
    phase: Phase,
    from: CameraTransform,
    elapsed_ms: u64,
}

#[derive(Clone, Debug)]
pub struct Choreographer {
    options: CameraOptions,
    mode: CameraMode,
    transform: CameraTransform,
    queue: VecDeque<Phase>,
    active: Option<ActivePhase>,
    settle_path: Option<String>,
    // Latest player framing seen while the intro was running.
    deferred_target: Option<(String, CameraTransform)>,
}

impl Choreographer {
    pub fn new(options: CameraOptions) -> Self {
        Self {
            options,
            mode: CameraMode::Idle,
            transform: CameraTransform::IDENTITY,
            queue: VecDeque::new(),
            active: None,
            settle_path: None,
            deferred_target: None,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn transform(&self) -> CameraTransform {
        self.transform
    }

    pub fn active_phase(&self) -> Option<PhaseKind> {
        self.active.as_ref().map(|active| active.phase.kind)
    }

    pub fn pending_phases(&self) -> usize {
        self.queue.len() + usize::from(self.active.is_some())
    }

    /// Drops any running sequence and returns to an unframed idle camera.
    pub fn reset(&mut self) {
        self.mode = CameraMode::Idle;
        self.transform = CameraTransform::IDENTITY;
        self.queue.clear();
        self.active = None;
        self.settle_path = None;
        self.deferred_target = None;
    }

    /// First framing for a freshly loaded tree.
    pub fn begin(
        &mut self,
        layout: &TreeLayout,
        player_path: &str,
        mole_path: Option<&str>,
        intro: bool,
    ) {
        self.reset();
        if !intro || layout.is_empty() {
            self.transform = player_transform(layout, player_path, &self.options);
            self.settle_path = Some(player_path.to_string());
            return;
        }
        self.queue
            .extend(intro_script(layout, player_path, mole_path, &self.options));
        self.mode = CameraMode::IntroPlaying;
        self.settle_path = Some(player_path.to_string());
        self.step(0);
    }

    /// Reacts to a re-render. A location change animates unless the intro
    /// owns the camera; anything else reframes the player without animation.
    pub fn on_render(&mut self, layout: &TreeLayout, player_path: &str, location_changed: bool) {
        let target = player_transform(layout, player_path, &self.options);
        match self.mode {
            CameraMode::IntroPlaying => {
                self.deferred_target = Some((player_path.to_string(), target));
            }
            CameraMode::NavigationTransition if !location_changed => {
                if let Some(active) = self.active.as_mut() {
                    active.phase.target = target;
                }
            }
            CameraMode::NavigationTransition | CameraMode::Idle if location_changed => {
                self.start_transition(player_path, target);
            }
            CameraMode::NavigationTransition | CameraMode::Idle => {
                self.transform = target;
                self.settle_path = Some(player_path.to_string());
            }
        }
    }

    /// Advances the running sequence by `dt_ms`. Returns whether the
    /// transform moved.
    pub fn step(&mut self, dt_ms: u64) -> bool {
        if self.mode == CameraMode::Idle {
            return false;
        }
        let before = self.transform;
        let mut budget = dt_ms;
        loop {
            if self.active.is_none() {
                match self.queue.pop_front() {
                    Some(phase) => {
                        self.active = Some(ActivePhase {
                            phase,
                            from: self.transform,
                            elapsed_ms: 0,
                        });
                    }
                    None => {
                        self.finish_sequence();
                        if self.queue.is_empty() {
                            break;
                        }
                        continue;
                    }
                }
            }
            let Some(active) = self.active.as_mut() else {
                break;
            };
            let remaining = active.phase.duration_ms.saturating_sub(active.elapsed_ms);
            if budget >= remaining {
                budget -= remaining;
                self.transform = active.phase.target;
                self.active = None;
                continue;
            }
            active.elapsed_ms += budget;
            let progress = active.elapsed_ms as f64 / active.phase.duration_ms as f64;
            self.transform = active
                .from
                .lerp(&active.phase.target, active.phase.easing.apply(progress));
            break;
        }
        self.transform != before
    }

    fn start_transition(&mut self, player_path: &str, target: CameraTransform) {
        self.queue.clear();
        self.active = None;
        self.queue.push_back(navigate_phase(target, &self.options));
        self.mode = CameraMode::NavigationTransition;
        self.settle_path = Some(player_path.to_string());
    }

    fn finish_sequence(&mut self) {
        let was_intro = self.mode == CameraMode::IntroPlaying;
        self.mode = CameraMode::Idle;
        if !was_intro {
            return;
        }
        if let Some((path, target)) = self.deferred_target.take() {
            if self.settle_path.as_deref() != Some(path.as_str()) {
                self.start_transition(&path, target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutOptions;
    use crate::layout::layout;
    use crate::tree::fixtures::{dir, sample_tree};
    use crate::tree::with_mole_at;

    fn setup() -> (Choreographer, TreeLayout, CameraOptions) {
        let options = CameraOptions::default();
        let tree_layout = layout(&sample_tree(), &LayoutOptions::default());
        (Choreographer::new(options), tree_layout, options)
    }

    fn intro_length(options: &CameraOptions, with_mole: bool) -> u64 {
        let mut total = options.intro_fit_ms + options.intro_hold_ms + options.intro_settle_ms;
        if with_mole {
            total += options.intro_mole_ms + options.intro_mole_hold_ms;
        }
        total
    }

    #[test]
    fn without_intro_camera_starts_idle_on_player() {
        let (mut camera, tree_layout, options) = setup();
        camera.begin(&tree_layout, "/usr/bin", None, false);
        assert_eq!(camera.mode(), CameraMode::Idle);
        assert_eq!(
            camera.transform(),
            player_transform(&tree_layout, "/usr/bin", &options)
        );
    }

    #[test]
    fn intro_snaps_to_root_immediately() {
        let (mut camera, tree_layout, options) = setup();
        camera.begin(&tree_layout, "/home", Some("/var/log"), true);
        assert_eq!(camera.mode(), CameraMode::IntroPlaying);
        assert_eq!(camera.active_phase(), Some(PhaseKind::FitTree));
        assert_eq!(camera.transform().scale, options.intro_root_scale);
    }

    #[test]
    fn intro_ends_idle_on_player() {
        let (mut camera, tree_layout, options) = setup();
        camera.begin(&tree_layout, "/home", Some("/var/log"), true);
        let mut elapsed = 0;
        while camera.mode() == CameraMode::IntroPlaying {
            camera.step(16);
            elapsed += 16;
            assert!(elapsed <= intro_length(&options, true) + 16);
        }
        assert_eq!(camera.mode(), CameraMode::Idle);
        assert_eq!(
            camera.transform(),
            player_transform(&tree_layout, "/home", &options)
        );
    }

    #[test]
    fn phases_run_one_at_a_time_in_order() {
        let (mut camera, tree_layout, options) = setup();
        camera.begin(&tree_layout, "/home", Some("/var/log"), true);
        let mut seen = vec![];
        while let Some(kind) = camera.active_phase() {
            if seen.last() != Some(&kind) {
                seen.push(kind);
            }
            camera.step(options.intro_hold_ms / 4);
        }
        assert_eq!(
            seen,
            vec![
                PhaseKind::FitTree,
                PhaseKind::Hold,
                PhaseKind::FocusMole,
                PhaseKind::Hold,
                PhaseKind::SettlePlayer
            ]
        );
    }

    #[test]
    fn one_large_step_lands_exactly_on_final_target() {
        let (mut camera, tree_layout, options) = setup();
        camera.begin(&tree_layout, "/home", None, true);
        camera.step(60_000);
        assert_eq!(camera.mode(), CameraMode::Idle);
        assert_eq!(camera.pending_phases(), 0);
        assert_eq!(
            camera.transform(),
            player_transform(&tree_layout, "/home", &options)
        );
    }

    #[test]
    fn navigation_transitions_to_new_player() {
        let (mut camera, tree_layout, options) = setup();
        camera.begin(&tree_layout, "/home", None, false);
        let start = camera.transform();
        camera.on_render(&tree_layout, "/home/alice", true);
        assert_eq!(camera.mode(), CameraMode::NavigationTransition);

        camera.step(options.navigate_ms / 2);
        let midway = camera.transform();
        assert_ne!(midway, start);
        assert_eq!(camera.mode(), CameraMode::NavigationTransition);

        camera.step(options.navigate_ms);
        assert_eq!(camera.mode(), CameraMode::Idle);
        assert_eq!(
            camera.transform(),
            player_transform(&tree_layout, "/home/alice", &options)
        );
    }

    #[test]
    fn idle_framing_is_idempotent() {
        let (mut camera, tree_layout, _) = setup();
        camera.begin(&tree_layout, "/usr", None, false);
        camera.on_render(&tree_layout, "/usr", false);
        let first = camera.transform();
        camera.on_render(&tree_layout, "/usr", false);
        assert_eq!(camera.transform(), first);
        assert_eq!(camera.mode(), CameraMode::Idle);
    }

    #[test]
    fn structural_render_snaps_idle_camera_back_to_player() {
        let (mut camera, _, options) = setup();
        let tree = sample_tree();
        let before = layout(&tree, &LayoutOptions::default());
        camera.begin(&before, "/var", None, false);

        let with_mole = with_mole_at(&tree, Some("/usr/lib"));
        let after = layout(&with_mole, &LayoutOptions::default());
        camera.on_render(&after, "/var", false);
        assert_eq!(camera.mode(), CameraMode::Idle);
        assert_eq!(camera.transform(), player_transform(&after, "/var", &options));
    }

    #[test]
    fn navigation_waits_for_intro_then_follows_player() {
        let (mut camera, tree_layout, options) = setup();
        camera.begin(&tree_layout, "/home", None, true);
        camera.step(100);
        camera.on_render(&tree_layout, "/usr", true);
        assert_eq!(camera.mode(), CameraMode::IntroPlaying);

        camera.step(intro_length(&options, false));
        assert_eq!(camera.mode(), CameraMode::NavigationTransition);
        camera.step(options.navigate_ms);
        assert_eq!(camera.mode(), CameraMode::Idle);
        assert_eq!(
            camera.transform(),
            player_transform(&tree_layout, "/usr", &options)
        );
    }

    #[test]
    fn structural_render_during_transition_retargets_without_restarting() {
        let (mut camera, tree_layout, options) = setup();
        camera.begin(&tree_layout, "/home", None, false);
        camera.on_render(&tree_layout, "/", true);
        camera.step(options.navigate_ms / 3);
        camera.on_render(&tree_layout, "/", false);
        assert_eq!(camera.mode(), CameraMode::NavigationTransition);
        assert_eq!(camera.pending_phases(), 1);
        camera.step(options.navigate_ms);
        assert_eq!(camera.transform(), player_transform(&tree_layout, "/", &options));
    }

    #[test]
    fn missing_player_frames_root() {
        let (mut camera, tree_layout, options) = setup();
        camera.begin(&tree_layout, "/does/not/exist", None, false);
        assert_eq!(camera.transform(), player_transform(&tree_layout, "/", &options));
    }

    #[test]
    fn single_node_intro_completes() {
        let options = CameraOptions::default();
        let tree_layout = layout(&dir("/", vec![]), &LayoutOptions::default());
        let mut camera = Choreographer::new(options);
        camera.begin(&tree_layout, "/", None, true);
        camera.step(intro_length(&options, false));
        assert_eq!(camera.mode(), CameraMode::Idle);
        assert!(camera.transform().scale.is_finite());
    }

    #[test]
    fn reset_cancels_running_sequence() {
        let (mut camera, tree_layout, _) = setup();
        camera.begin(&tree_layout, "/home", Some("/var"), true);
        camera.reset();
        assert_eq!(camera.mode(), CameraMode::Idle);
        assert_eq!(camera.pending_phases(), 0);
        assert!(!camera.step(1_000));
        assert_eq!(camera.transform(), CameraTransform::IDENTITY);
    }
}
