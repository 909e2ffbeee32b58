use chrono::{DateTime, Utc};
use clap::Parser;
use fhs_mole_client::adjacency::{is_navigable, navigable_paths};
use fhs_mole_client::camera::framing::player_transform;
use fhs_mole_client::camera::script::PhaseKind;
use fhs_mole_client::camera::{CameraMode, Choreographer};
use fhs_mole_client::config::{parse_viewport, EngineConfig};
use fhs_mole_client::layout::{layout, TreeLayout};
use fhs_mole_client::tree::{contains, first_mole_path, level_widths, random_tree, ROOT_PATH};
use fhs_mole_client::types::{CameraTransform, TreeNode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

const SAFETY_FRAMES: u64 = 60 * 60;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replays camera choreography over a directory tree")]
struct Cli {
    /// Tree JSON file (`name`, `path`, `is_fhs`, `has_mole`, `children`).
    #[arg(long)]
    tree: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    depth: Option<usize>,
    #[arg(long)]
    fanout: Option<usize>,
    /// Explicit click route, comma separated.
    #[arg(long, value_delimiter = ',')]
    route: Vec<String>,
    #[arg(long, default_value_t = 6)]
    hops: usize,
    #[arg(long)]
    skip_intro: bool,
    /// Viewport as WIDTHxHEIGHT.
    #[arg(long)]
    viewport: Option<String>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug)]
struct Scenario {
    name: String,
    seed: u64,
    tree: TreeNode,
    route: Option<Vec<String>>,
    hops: usize,
    intro: bool,
}

#[derive(Clone, Debug, Serialize)]
struct Keyframe {
    scenario: String,
    #[serde(rename = "tMs")]
    t_ms: u64,
    mode: CameraMode,
    phase: Option<PhaseKind>,
    player: String,
    transform: CameraTransform,
}

#[derive(Clone, Debug, Serialize)]
struct ReplayResultLine {
    scenario: String,
    seed: u64,
    intro: bool,
    nodes: usize,
    depth: usize,
    #[serde(rename = "canvasWidth")]
    canvas_width: f64,
    #[serde(rename = "canvasHeight")]
    canvas_height: f64,
    hops: usize,
    keyframes: usize,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    #[serde(rename = "finalPlayer")]
    final_player: String,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: DateTime<Utc>,
    #[serde(rename = "finishedAt")]
    finished_at: DateTime<Utc>,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    scenarios: Vec<ReplayResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    timestamp: DateTime<Utc>,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let run_started_at = Utc::now();
    let seed = cli
        .seed
        .unwrap_or_else(|| run_started_at.timestamp_millis() as u64);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed, run_started_at));

    let mut config = EngineConfig::from_env();
    if let Some((width, height)) = cli.viewport.as_deref().and_then(parse_viewport) {
        config = config.with_viewport(width, height);
    }

    let scenarios = match resolve_scenarios(&cli, seed) {
        Ok(scenarios) => scenarios,
        Err(error) => {
            emit_log(
                "error",
                "tree_load_failed",
                &match_id,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    let mut results = Vec::new();
    let mut has_anomaly = false;
    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            json!({ "seed": scenario.seed, "intro": scenario.intro }),
        );
        let mut scenario_config = config;
        scenario_config.intro_enabled = scenario.intro;
        let (result, keyframes) = run_replay(&scenario, &scenario_config);
        for keyframe in &keyframes {
            println!(
                "{}",
                serde_json::to_string(keyframe).expect("keyframe should serialize")
            );
        }
        for anomaly in &result.anomalies {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                json!({ "message": anomaly }),
            );
        }
        has_anomaly |= !result.anomalies.is_empty();
        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            json!({
                "durationMs": result.duration_ms,
                "keyframes": result.keyframes,
                "finalPlayer": result.final_player,
            }),
        );
        println!(
            "{}",
            serde_json::to_string(&result).expect("replay result should serialize")
        );
        results.push(result);
    }

    let summary = build_run_summary(match_id.clone(), run_started_at, Utc::now(), results);
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageDurationMs": summary.average_duration_ms,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn resolve_scenarios(cli: &Cli, seed: u64) -> io::Result<Vec<Scenario>> {
    let route = (!cli.route.is_empty()).then(|| cli.route.clone());
    if let Some(path) = cli.tree.as_ref() {
        return Ok(vec![Scenario {
            name: format!("file-{}", path.file_stem().unwrap_or_default().to_string_lossy()),
            seed,
            tree: load_tree(path)?,
            route,
            hops: cli.hops,
            intro: !cli.skip_intro,
        }]);
    }
    if cli.depth.is_some() || cli.fanout.is_some() || route.is_some() {
        let depth = cli.depth.unwrap_or(4).clamp(1, 8);
        let fanout = cli.fanout.unwrap_or(4).clamp(1, 10);
        return Ok(vec![Scenario {
            name: format!("custom-d{depth}-f{fanout}"),
            seed,
            tree: random_tree(seed, depth, fanout),
            route,
            hops: cli.hops,
            intro: !cli.skip_intro,
        }]);
    }
    Ok(vec![
        Scenario {
            name: "intro-walk".to_string(),
            seed,
            tree: random_tree(seed, 4, 4),
            route: None,
            hops: cli.hops,
            intro: !cli.skip_intro,
        },
        Scenario {
            name: "wide-walk".to_string(),
            seed: seed.wrapping_add(1),
            tree: random_tree(seed.wrapping_add(1), 3, 8),
            route: None,
            hops: cli.hops,
            intro: false,
        },
    ])
}

fn load_tree(path: &Path) -> io::Result<TreeNode> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(io::Error::from)
}

fn random_route(tree: &TreeNode, seed: u64, hops: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut current = ROOT_PATH.to_string();
    let mut route = Vec::with_capacity(hops);
    for _ in 0..hops {
        let options = navigable_paths(tree, &current);
        if options.is_empty() {
            break;
        }
        current = options[rng.random_range(0..options.len())].clone();
        route.push(current.clone());
    }
    route
}

struct Recorder {
    scenario: String,
    elapsed_ms: u64,
    last: Option<(CameraMode, Option<PhaseKind>)>,
    keyframes: Vec<Keyframe>,
}

impl Recorder {
    fn observe(&mut self, camera: &Choreographer, player: &str) {
        let key = (camera.mode(), camera.active_phase());
        if self.last == Some(key) {
            return;
        }
        self.last = Some(key);
        self.keyframes.push(Keyframe {
            scenario: self.scenario.clone(),
            t_ms: self.elapsed_ms,
            mode: key.0,
            phase: key.1,
            player: player.to_string(),
            transform: camera.transform(),
        });
    }
}

fn run_replay(scenario: &Scenario, config: &EngineConfig) -> (ReplayResultLine, Vec<Keyframe>) {
    let tree_layout = layout(&scenario.tree, &config.layout);
    let route = scenario
        .route
        .clone()
        .unwrap_or_else(|| random_route(&scenario.tree, scenario.seed, scenario.hops));
    let mut anomalies = Vec::new();
    let mut seen = HashSet::new();
    let mut recorder = Recorder {
        scenario: scenario.name.clone(),
        elapsed_ms: 0,
        last: None,
        keyframes: Vec::new(),
    };

    let mut player = ROOT_PATH.to_string();
    let mole = first_mole_path(&scenario.tree);
    let mut camera = Choreographer::new(config.camera);
    camera.begin(&tree_layout, &player, mole.as_deref(), config.intro_enabled);
    recorder.observe(&camera, &player);
    drive(&mut camera, config.frame_ms, &player, &mut recorder, &mut |message: String| {
        push_anomaly(&mut anomalies, &mut seen, message)
    });
    check_settled(&mut camera, &tree_layout, &player, config, &mut |message: String| {
        push_anomaly(&mut anomalies, &mut seen, message)
    });

    let mut hops = 0;
    for hop in &route {
        if !contains(&scenario.tree, hop) || !is_navigable(hop, &player) {
            push_anomaly(
                &mut anomalies,
                &mut seen,
                format!("route step {hop} is not reachable from {player}"),
            );
            continue;
        }
        player = hop.clone();
        hops += 1;
        camera.on_render(&tree_layout, &player, true);
        recorder.observe(&camera, &player);
        drive(&mut camera, config.frame_ms, &player, &mut recorder, &mut |message: String| {
            push_anomaly(&mut anomalies, &mut seen, message)
        });
        check_settled(&mut camera, &tree_layout, &player, config, &mut |message: String| {
            push_anomaly(&mut anomalies, &mut seen, message)
        });
    }

    let widths = level_widths(&scenario.tree);
    let result = ReplayResultLine {
        scenario: scenario.name.clone(),
        seed: scenario.seed,
        intro: config.intro_enabled,
        nodes: tree_layout.nodes.len(),
        depth: widths.len().saturating_sub(1),
        canvas_width: tree_layout.width,
        canvas_height: tree_layout.height,
        hops,
        keyframes: recorder.keyframes.len(),
        duration_ms: recorder.elapsed_ms,
        final_player: player,
        anomalies,
    };
    (result, recorder.keyframes)
}

fn drive(
    camera: &mut Choreographer,
    frame_ms: u64,
    player: &str,
    recorder: &mut Recorder,
    report: &mut dyn FnMut(String),
) {
    let mut frames = 0u64;
    while camera.mode() != CameraMode::Idle {
        camera.step(frame_ms);
        recorder.elapsed_ms += frame_ms;
        recorder.observe(camera, player);
        let transform = camera.transform();
        if !transform.translate_x.is_finite()
            || !transform.translate_y.is_finite()
            || !transform.scale.is_finite()
        {
            report(format!("non-finite camera transform near {player}"));
        }
        frames += 1;
        if frames > SAFETY_FRAMES {
            report("frame safety limit exceeded".to_string());
            break;
        }
    }
}

fn check_settled(
    camera: &mut Choreographer,
    tree_layout: &TreeLayout,
    player: &str,
    config: &EngineConfig,
    report: &mut dyn FnMut(String),
) {
    let settled = camera.transform();
    if settled != player_transform(tree_layout, player, &config.camera) {
        report(format!("camera did not settle on {player}"));
    }
    camera.on_render(tree_layout, player, false);
    if camera.transform() != settled {
        report(format!("idle reframing moved the camera at {player}"));
    }
}

fn push_anomaly(anomalies: &mut Vec<String>, seen: &mut HashSet<String>, message: String) {
    if seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u64, started_at: DateTime<Utc>) -> String {
    format!("replay-{seed}-{}", started_at.format("%Y%m%dT%H%M%S"))
}

fn build_run_summary(
    match_id: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    scenarios: Vec<ReplayResultLine>,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let anomaly_count = scenarios.iter().map(|s| s.anomalies.len()).sum();
    let total_duration_ms: u64 = scenarios.iter().map(|s| s.duration_ms).sum();
    let average_duration_ms = if scenario_count == 0 {
        0
    } else {
        total_duration_ms / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at,
        finished_at,
        scenario_count,
        anomaly_count,
        average_duration_ms,
        scenarios,
    }
}

fn emit_log(level: &str, event: &str, match_id: &str, scenario: Option<&str>, details: Value) {
    let log_line = StructuredLogLine {
        timestamp: Utc::now(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
