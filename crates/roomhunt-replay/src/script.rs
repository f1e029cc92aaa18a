//! Replay scripts: timed inputs fed to a headless session.
//!
//! ```json
//! {
//!   "viewport": [800, 600],
//!   "steps": [
//!     { "at_secs": 1.2, "action": { "tap": [400, 397.4] } },
//!     { "at_secs": 1.5, "action": { "motion": { "attitude": { "roll": 0, "pitch": 0.1, "yaw": 0 } } } },
//!     { "at_secs": 3.0, "action": "exit" }
//!   ],
//!   "tail_secs": 1.0
//! }
//! ```

use std::time::Duration;

use bevy::math::Vec2;
use roomhunt_core::{
    GameConfig, GameSession, MotionSample, RoomAsset, SessionError, SessionEvent, TapOutcome,
    Viewport,
};
use serde::{Deserialize, Serialize};

/// Longest time any script value may span, in seconds.
pub const MAX_SCRIPT_SECS: f64 = 86_400.0;

fn default_viewport() -> [f32; 2] {
    [800.0, 600.0]
}

fn default_frame_secs() -> f64 {
    1.0 / 60.0
}

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Tap at viewport coordinates.
    Tap([f32; 2]),
    /// Motion stream tick; `null` is a tick without data.
    Motion(Option<MotionSample>),
    Resize([f32; 2]),
    Exit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Session time at which the action is applied.
    pub at_secs: f64,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default = "default_viewport")]
    pub viewport: [f32; 2],
    /// Simulated frame length between steps.
    #[serde(default = "default_frame_secs")]
    pub frame_secs: f64,
    /// Time simulated after the last step.
    #[serde(default)]
    pub tail_secs: f64,
    pub steps: Vec<Step>,
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("invalid script JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("step {index} has invalid time {at_secs}")]
    InvalidTime { index: usize, at_secs: f64 },
    #[error("step {index} at {at_secs}s comes before the previous step")]
    OutOfOrder { index: usize, at_secs: f64 },
    #[error("frame_secs must be positive and at most {MAX_SCRIPT_SECS}, got {0}")]
    InvalidFrame(f64),
    #[error("tail_secs must be between 0 and {MAX_SCRIPT_SECS}, got {0}")]
    InvalidTail(f64),
}

impl ReplayScript {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let script: Self = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    /// Steps must have non-decreasing times within `0..=MAX_SCRIPT_SECS`.
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.frame_secs <= 0.0 || !(0.0..=MAX_SCRIPT_SECS).contains(&self.frame_secs) {
            return Err(ScriptError::InvalidFrame(self.frame_secs));
        }
        if !(0.0..=MAX_SCRIPT_SECS).contains(&self.tail_secs) {
            return Err(ScriptError::InvalidTail(self.tail_secs));
        }
        let mut previous = 0.0;
        for (index, step) in self.steps.iter().enumerate() {
            let at_secs = step.at_secs;
            if !(0.0..=MAX_SCRIPT_SECS).contains(&at_secs) {
                return Err(ScriptError::InvalidTime { index, at_secs });
            }
            if at_secs < previous {
                return Err(ScriptError::OutOfOrder { index, at_secs });
            }
            previous = at_secs;
        }
        Ok(())
    }
}

/// Serializable form of [`SessionEvent`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordedEvent {
    TargetChanged { index: usize, target: String },
    Feedback { text: String },
    FeedbackCleared,
    ObstacleSpawned { position: [f32; 3] },
    GameComplete,
    ExitRequested,
}

impl From<SessionEvent> for RecordedEvent {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::TargetChanged { index, target } => Self::TargetChanged { index, target },
            SessionEvent::Feedback { text } => Self::Feedback { text },
            SessionEvent::FeedbackCleared => Self::FeedbackCleared,
            SessionEvent::ObstacleSpawned { position, .. } => Self::ObstacleSpawned {
                position: position.to_array(),
            },
            SessionEvent::GameComplete => Self::GameComplete,
            SessionEvent::ExitRequested => Self::ExitRequested,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedEvent {
    pub at_secs: f64,
    #[serde(flatten)]
    pub event: RecordedEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TapRecord {
    pub at_secs: f64,
    pub point: [f32; 2],
    pub outcome: String,
}

/// Final state of a replayed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub phase: String,
    pub found: usize,
    pub targets: usize,
    pub obstacles: usize,
    pub live: bool,
    pub elapsed_secs: f64,
    pub physics_frames: u64,
    /// Obstacle state fingerprint; identical scripts replay to the same value.
    pub physics_hash: u64,
    pub taps: Vec<TapRecord>,
    pub events: Vec<TimedEvent>,
}

struct Recorder {
    session: GameSession,
    frame: Duration,
    elapsed: Duration,
    taps: Vec<TapRecord>,
    events: Vec<TimedEvent>,
}

impl Recorder {
    fn run_until(&mut self, until: Duration) {
        while self.elapsed < until {
            let dt = self.frame.min(until - self.elapsed);
            self.session.tick(dt);
            self.elapsed += dt;
            self.collect();
        }
    }

    fn apply(&mut self, action: &Action) {
        match action {
            Action::Tap([x, y]) => {
                let outcome = self.session.tap(Vec2::new(*x, *y));
                self.record_tap([*x, *y], outcome);
            }
            Action::Motion(sample) => {
                self.session.on_motion(sample.as_ref());
            }
            Action::Resize([width, height]) => {
                self.session.set_viewport(Viewport::new(*width, *height));
            }
            Action::Exit => {
                if !self.session.request_exit() {
                    tracing::debug!("[replay] exit ignored at {:.2}s", self.elapsed.as_secs_f64());
                }
            }
        }
        self.collect();
    }

    fn record_tap(&mut self, point: [f32; 2], outcome: TapOutcome) {
        tracing::debug!("[replay] tap {:?} -> {:?}", point, outcome);
        self.taps.push(TapRecord {
            at_secs: self.elapsed.as_secs_f64(),
            point,
            outcome: format!("{outcome:?}"),
        });
    }

    fn collect(&mut self) {
        let at_secs = self.elapsed.as_secs_f64();
        self.events.extend(
            self.session
                .drain_events()
                .into_iter()
                .map(|event| TimedEvent {
                    at_secs,
                    event: event.into(),
                }),
        );
    }

    fn finish(self) -> ReplaySummary {
        let sequence = self.session.sequence();
        let physics = self.session.physics();
        ReplaySummary {
            phase: format!("{:?}", sequence.phase()),
            found: sequence.found_count(),
            targets: sequence.len(),
            obstacles: self.session.obstacle_count(),
            live: self.session.is_live(),
            elapsed_secs: self.elapsed.as_secs_f64(),
            physics_frames: physics.frame(),
            physics_hash: physics.state_hash(),
            taps: self.taps,
            events: self.events,
        }
    }
}

/// Starts a session and plays `script` against it, frame by frame.
pub fn run(
    config: GameConfig,
    asset: &RoomAsset,
    script: &ReplayScript,
) -> Result<ReplaySummary, SessionError> {
    let [width, height] = script.viewport;
    let session = GameSession::start(config, asset, Some(Viewport::new(width, height)))?;

    let mut recorder = Recorder {
        session,
        frame: Duration::from_secs_f64(script.frame_secs),
        elapsed: Duration::ZERO,
        taps: Vec::new(),
        events: Vec::new(),
    };

    for step in &script.steps {
        recorder.run_until(Duration::from_secs_f64(step.at_secs));
        recorder.apply(&step.action);
    }
    let end = recorder.elapsed + Duration::from_secs_f64(script.tail_secs);
    recorder.run_until(end);

    Ok(recorder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANDLES_TAP: [f32; 2] = [400.0, 397.4];
    const MISS_TAP: [f32; 2] = [0.0, 0.0];

    fn step(at_secs: f64, action: Action) -> Step {
        Step { at_secs, action }
    }

    fn script(steps: Vec<Step>, tail_secs: f64) -> ReplayScript {
        ReplayScript {
            viewport: default_viewport(),
            frame_secs: default_frame_secs(),
            tail_secs,
            steps,
        }
    }

    #[test]
    fn test_parse_script() {
        let json = r#"{
            "steps": [
                { "at_secs": 1.2, "action": { "tap": [400, 397.4] } },
                { "at_secs": 1.5, "action": { "motion": null } },
                { "at_secs": 1.6, "action": { "motion": { "attitude": { "roll": 0.0, "pitch": 0.1, "yaw": 0.0 } } } },
                { "at_secs": 2.0, "action": { "resize": [1024, 768] } },
                { "at_secs": 3.0, "action": "exit" }
            ]
        }"#;
        let script = ReplayScript::from_json(json).unwrap();

        assert_eq!(script.viewport, [800.0, 600.0]);
        assert_eq!(script.steps.len(), 5);
        assert_eq!(script.steps[0].action, Action::Tap(CANDLES_TAP));
        assert_eq!(script.steps[1].action, Action::Motion(None));
        assert!(matches!(script.steps[2].action, Action::Motion(Some(_))));
        assert_eq!(script.steps[4].action, Action::Exit);
    }

    #[test]
    fn test_out_of_order_steps_rejected() {
        let bad = script(
            vec![step(2.0, Action::Exit), step(1.0, Action::Exit)],
            0.0,
        );
        assert!(matches!(
            bad.validate(),
            Err(ScriptError::OutOfOrder { index: 1, .. })
        ));

        let negative = script(vec![step(-1.0, Action::Exit)], 0.0);
        assert!(matches!(
            negative.validate(),
            Err(ScriptError::InvalidTime { index: 0, .. })
        ));
    }

    #[test]
    fn test_oversized_times_rejected() {
        let late = script(vec![step(1e300, Action::Exit)], 0.0);
        assert!(matches!(
            late.validate(),
            Err(ScriptError::InvalidTime { index: 0, .. })
        ));

        let long_tail = script(Vec::new(), 1e300);
        assert!(matches!(long_tail.validate(), Err(ScriptError::InvalidTail(_))));

        let mut huge_frame = script(Vec::new(), 0.0);
        huge_frame.frame_secs = 1e300;
        assert!(matches!(huge_frame.validate(), Err(ScriptError::InvalidFrame(_))));

        let json = r#"{ "steps": [ { "at_secs": 1e300, "action": "exit" } ] }"#;
        assert!(ReplayScript::from_json(json).is_err());
    }

    #[test]
    fn test_replay_completes_game_and_exits() {
        let config = GameConfig::with_targets(["Candles"]);
        let asset = RoomAsset::default_living_room();
        let script = script(
            vec![
                step(1.2, Action::Tap(CANDLES_TAP)),
                step(2.5, Action::Exit),
            ],
            0.5,
        );

        let summary = run(config, &asset, &script).unwrap();

        assert_eq!(summary.phase, "Complete");
        assert_eq!(summary.found, 1);
        assert_eq!(summary.obstacles, 0);
        assert!(!summary.live);
        assert_eq!(summary.taps.len(), 1);
        assert_eq!(summary.taps[0].outcome, "Found");
        let kinds: Vec<&RecordedEvent> = summary.events.iter().map(|e| &e.event).collect();
        assert!(kinds.contains(&&RecordedEvent::GameComplete));
        assert_eq!(kinds.last(), Some(&&RecordedEvent::ExitRequested));
    }

    #[test]
    fn test_replay_miss_spawns_obstacle() {
        let config = GameConfig::with_targets(["Candles", "Table"]);
        let asset = RoomAsset::default_living_room();
        let script = script(vec![step(1.2, Action::Tap(MISS_TAP))], 1.0);

        let summary = run(config, &asset, &script).unwrap();

        assert_eq!(summary.phase, "InProgress(0)");
        assert_eq!(summary.obstacles, 1);
        assert_eq!(summary.taps[0].outcome, "NotFound");
        assert!(summary.events.iter().any(|e| matches!(
            e.event,
            RecordedEvent::ObstacleSpawned { .. }
        )));
    }

    #[test]
    fn test_replay_physics_hash_is_reproducible() {
        let asset = RoomAsset::default_living_room();
        let misses = script(
            vec![
                step(1.2, Action::Tap(MISS_TAP)),
                step(1.5, Action::Tap([120.0, 80.0])),
            ],
            2.0,
        );
        let config = || GameConfig::with_targets(["Candles", "Table"]);

        let first = run(config(), &asset, &misses).unwrap();
        let second = run(config(), &asset, &misses).unwrap();
        assert!(first.physics_frames > 0);
        assert_eq!(first.physics_frames, second.physics_frames);
        assert_eq!(first.physics_hash, second.physics_hash);

        let calm = run(config(), &asset, &script(Vec::new(), 3.5)).unwrap();
        assert_ne!(calm.physics_hash, first.physics_hash);
    }

    #[test]
    fn test_summary_serializes_event_kind() {
        let event = TimedEvent {
            at_secs: 1.0,
            event: RecordedEvent::Feedback {
                text: "Correct!".to_string(),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "feedback");
        assert_eq!(json["text"], "Correct!");
        assert_eq!(json["at_secs"], 1.0);
    }
}
