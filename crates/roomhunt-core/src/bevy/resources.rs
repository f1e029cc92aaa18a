//! ECS Resources for the room hunt game.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;
use parking_lot::Mutex;

use crate::asset::RoomAsset;
use crate::config::GameConfig;
use crate::hit_test::Viewport;
use crate::motion::{Attitude, MotionSample};
use crate::session::GameSession;

/// The running session. Absent until startup succeeds and after the app is
/// torn down.
#[derive(Resource, Debug)]
pub struct SessionRes {
    pub session: GameSession,
}

impl SessionRes {
    pub fn new(session: GameSession) -> Self {
        Self { session }
    }
}

/// Inputs needed to start a session.
#[derive(Resource, Debug, Clone)]
pub struct SessionSetup {
    pub config: GameConfig,
    pub asset: RoomAsset,
    /// Display size used when no window is available.
    pub viewport: Option<Viewport>,
}

impl Default for SessionSetup {
    fn default() -> Self {
        Self {
            config: GameConfig::default(),
            asset: RoomAsset::default_living_room(),
            viewport: Some(Viewport::new(800.0, 600.0)),
        }
    }
}

/// Inputs applied to the session by `process_commands`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Tap at viewport coordinates (top-left origin).
    Tap { x: f32, y: f32 },
    /// One tick of the device-motion stream.
    Motion(Option<MotionSample>),
    /// Display surface changed size.
    Resize { width: f32, height: f32 },
    /// Exit action from the HUD.
    Exit,
}

/// Thread-safe command queue feeding the session.
///
/// Input systems, tests and embedders push commands; they are applied in
/// order on the next frame.
#[derive(Resource, Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<SessionCommand>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a command to be processed.
    pub fn push(&self, command: SessionCommand) {
        self.inner.lock().push_back(command);
    }

    /// Drain all pending commands.
    pub fn drain(&self) -> Vec<SessionCommand> {
        self.inner.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Keyboard-driven stand-in for a device-motion sensor.
///
/// Arrow keys tilt the device; samples are emitted at the configured motion
/// interval.
#[derive(Resource, Debug, Clone)]
pub struct SimulatedDevice {
    pub attitude: Attitude,
    /// Radians per second while a key is held.
    pub turn_rate: f64,
    pub timer: Timer,
}

impl SimulatedDevice {
    pub fn new(sample_interval: Duration) -> Self {
        Self {
            attitude: Attitude::default(),
            turn_rate: 0.8,
            timer: Timer::new(sample_interval, TimerMode::Repeating),
        }
    }

    /// Current reading. Gravity is derived from pitch and roll of a device
    /// held upright.
    pub fn sample(&self) -> MotionSample {
        let Attitude { roll, pitch, .. } = self.attitude;
        let gravity = [
            roll.sin() * pitch.cos(),
            -pitch.sin(),
            -roll.cos() * pitch.cos(),
        ];
        MotionSample::new(self.attitude, gravity)
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new(Duration::from_secs_f64(1.0 / 30.0))
    }
}
