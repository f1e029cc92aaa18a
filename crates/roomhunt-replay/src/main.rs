//! Roomhunt Replay
//!
//! Plays a JSON input script against a headless session and prints a JSON
//! summary to stdout.
//!
//! Usage: `roomhunt-replay <script.json>`. The game configuration is read
//! from `ROOMHUNT_CONFIG` and the room from `ROOMHUNT_ROOM`; both fall back
//! to the built-in defaults.

use std::path::PathBuf;

use anyhow::Context;
use roomhunt_core::{GameConfig, RoomAsset};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod script;

use script::ReplayScript;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let script_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: roomhunt-replay <script.json>")?;
    let json = std::fs::read_to_string(&script_path)
        .with_context(|| format!("reading script {}", script_path.display()))?;
    let script = ReplayScript::from_json(&json)
        .with_context(|| format!("parsing script {}", script_path.display()))?;

    let config = match std::env::var_os("ROOMHUNT_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            GameConfig::load(&path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    let asset = match std::env::var_os("ROOMHUNT_ROOM") {
        Some(path) => {
            let path = PathBuf::from(path);
            RoomAsset::load(&path).with_context(|| format!("loading room {}", path.display()))?
        }
        None => RoomAsset::default_living_room(),
    };

    tracing::info!(
        "[replay] {} steps from {}",
        script.steps.len(),
        script_path.display()
    );
    let summary = script::run(config, &asset, &script).context("session failed to start")?;
    tracing::info!(
        "[replay] finished: {} ({}/{} found, {} obstacles)",
        summary.phase,
        summary.found,
        summary.targets,
        summary.obstacles
    );

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
