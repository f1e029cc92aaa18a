//! Test utilities for headless Bevy integration tests.
//!
//! Provides `TestApp`, a wrapper around `bevy::app::App` that uses
//! `MinimalPlugins` + `RoomHuntHeadlessPlugin` for testing game logic
//! without a rendering or windowing backend.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use crate::bevy::components::Obstacle;
use crate::bevy::plugin::RoomHuntHeadlessPlugin;
use crate::bevy::resources::{CommandQueue, SessionCommand, SessionRes, SessionSetup};
use crate::config::GameConfig;
use crate::session::GameSession;

/// Virtual time advanced per frame.
const FRAME: Duration = Duration::from_millis(100);

/// A headless Bevy app wrapper for testing.
///
/// Every `update` advances time by exactly [`FRAME`], so session delays and
/// fixed physics steps are deterministic.
pub(crate) struct TestApp {
    pub app: App,
}

impl TestApp {
    /// Create a test app with the default room and the given targets.
    pub fn with_targets(targets: &[&str]) -> Self {
        Self::with_setup(SessionSetup {
            config: GameConfig::with_targets(targets.iter().copied()),
            ..SessionSetup::default()
        })
    }

    pub fn with_setup(setup: SessionSetup) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::input::InputPlugin);
        app.add_plugins(RoomHuntHeadlessPlugin {
            setup,
            command_queue: None,
            simulate_motion: true,
        });
        app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
        // Run one update to start the session
        app.update();
        Self { app }
    }

    /// Run a single frame update.
    pub fn update(&mut self) {
        self.app.update();
    }

    /// Run frames until at least `secs` of virtual time have passed.
    pub fn advance_secs(&mut self, secs: f32) {
        let frames = (secs / FRAME.as_secs_f32()).ceil() as u32;
        for _ in 0..frames {
            self.app.update();
        }
    }

    /// Push a command to the command queue.
    pub fn push_command(&mut self, cmd: SessionCommand) {
        self.app.world().resource::<CommandQueue>().push(cmd);
    }

    /// Tap at viewport coordinates and run one frame.
    pub fn tap(&mut self, (x, y): (f32, f32)) {
        self.push_command(SessionCommand::Tap { x, y });
        self.update();
    }

    pub fn press(&mut self, key: KeyCode) {
        self.app
            .world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(key);
    }

    pub fn session(&self) -> &GameSession {
        &self.app.world().resource::<SessionRes>().session
    }

    /// Scene-space translations of all obstacle entities.
    pub fn obstacle_translations(&mut self) -> Vec<Vec3> {
        self.app
            .world_mut()
            .query_filtered::<&Transform, With<Obstacle>>()
            .iter(self.app.world())
            .map(|t| t.translation)
            .collect()
    }

    /// Get a reference to the World.
    pub fn world(&self) -> &World {
        self.app.world()
    }

    /// Get a mutable reference to the World.
    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }
}
