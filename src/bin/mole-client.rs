use std::sync::Arc;

use clap::Parser;
use fhs_mole_client::client::{GameClient, ViewSnapshot};
use fhs_mole_client::config::EngineConfig;
use fhs_mole_client::pipeline::ExecuteOutcome;
use fhs_mole_client::service::HttpGameService;
use fhs_mole_client::types::CommandHistoryEntry;
use futures_util::future::join;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal front end for the FHS mole hunt")]
struct Cli {
    #[arg(long, env = "GAME_SERVICE_URL", default_value = "http://localhost:8000/api")]
    service_url: String,
    #[arg(long)]
    player: Option<String>,
    #[arg(long)]
    skip_intro: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = EngineConfig::from_env();
    if cli.skip_intro {
        config = config.without_intro();
    }
    let player = cli.player.clone().unwrap_or_else(make_player_name);

    let service = HttpGameService::new(&cli.service_url)?;
    let client = GameClient::new(Arc::new(service), config);
    let session = client.new_game(&player).await?;
    info!(service = %cli.service_url, player = %player, "connected");
    println!("{} starts at {}", session.player_name, session.player_path);
    if !session.mole_hint.is_empty() {
        println!("hint: {}", session.mole_hint);
    }
    let _frames = client.spawn_frame_loop().await;

    let mut printed = 0usize;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        let input = line.trim();
        match input.split_once(' ').unwrap_or((input, "")) {
            (":quit", _) | (":q", _) => break,
            (":hint", _) => report(client.request_hint().await),
            (":click", path) => report(client.on_node_click(path.trim()).await),
            (":view", _) => print_view(&client.view().await),
            (":new", _) => {
                printed = 0;
                match client.new_game(&player).await {
                    Ok(session) => {
                        println!("new game: {} at {}", session.player_name, session.player_path)
                    }
                    Err(error) => warn!(%error, "could not start a new game"),
                }
            }
            (":refs", _) => {
                let (commands, directories) =
                    join(client.command_reference(), client.fhs_reference()).await;
                match (commands, directories) {
                    (Ok(commands), Ok(directories)) => {
                        for (category, entries) in commands {
                            println!("[{category}]");
                            for entry in entries {
                                println!("  {:<24} {}", entry.command, entry.description);
                            }
                        }
                        for directory in directories.directories {
                            println!("  {:<10} {}", directory.path, directory.desc);
                        }
                    }
                    (Err(error), _) | (_, Err(error)) => warn!(%error, "reference lookup failed"),
                }
            }
            _ => report(client.execute(input).await),
        }

        let view = client.view().await;
        for entry in view.history.iter().skip(printed) {
            print_entry(entry);
        }
        printed = view.history.len();
    }

    client.end_game().await;
    Ok(())
}

fn report(outcome: ExecuteOutcome) {
    if let ExecuteOutcome::Rejected { reason } = outcome {
        println!("({reason:?})");
    }
}

fn print_entry(entry: &CommandHistoryEntry) {
    if !entry.command.is_empty() {
        println!("$ {}", entry.command);
    }
    let marker = if entry.success { "" } else { "! " };
    for line in entry.output.lines() {
        println!("{marker}{line}");
    }
}

fn print_view(view: &ViewSnapshot) {
    let summary = json!({
        "player": view.player_path(),
        "navigable": view.navigable,
        "camera": view.camera,
        "cameraMode": view.camera_mode,
        "mole": view.mole,
        "nodes": view.nodes.len(),
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{text}"),
        Err(error) => warn!(%error, "view did not serialize"),
    }
}

fn make_player_name() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("player-{suffix}")
}
