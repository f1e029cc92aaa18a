//! Roomhunt
//!
//! Windowed client. Configuration is read from the path given as the first
//! argument or `ROOMHUNT_CONFIG`; the room from `ROOMHUNT_ROOM`. Without
//! either, the default living room and target list are used.
//!
//! Arrow keys and Q/E tilt a simulated motion sensor. Click or touch to guess.

use std::path::PathBuf;

use anyhow::Context;
use bevy::prelude::*;
use roomhunt_core::bevy::{RoomHuntPlugin, SessionSetup};
use roomhunt_core::{GameConfig, RoomAsset};

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("ROOMHUNT_CONFIG").map(PathBuf::from))
}

fn load_setup() -> anyhow::Result<SessionSetup> {
    let config = match config_path() {
        Some(path) => GameConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    let asset = match std::env::var_os("ROOMHUNT_ROOM") {
        Some(path) => {
            let path = PathBuf::from(path);
            RoomAsset::load(&path).with_context(|| format!("loading room {}", path.display()))?
        }
        None => RoomAsset::default_living_room(),
    };
    config.validate().context("invalid config")?;

    Ok(SessionSetup {
        config,
        asset,
        // Replaced by the primary window size at startup
        viewport: None,
    })
}

fn main() -> anyhow::Result<()> {
    let setup = load_setup()?;

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Roomhunt".to_string(),
            resolution: (800, 600).into(),
            ..default()
        }),
        ..default()
    }));
    app.add_plugins(RoomHuntPlugin {
        setup,
        command_queue: None,
    });

    tracing::info!("[roomhunt] starting");
    match app.run() {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => anyhow::bail!("exited with code {code}"),
    }
}
