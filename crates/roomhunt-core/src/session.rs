//! Game session: owns every piece of mutable state for one play-through.
//!
//! All inputs (taps, motion samples, clock ticks) are applied serially through
//! `&mut self`. Deferred work is queued on the session's own [`Scheduler`] and
//! runs from [`GameSession::advance_clock`].

use std::time::Duration;

use bevy::math::{Quat, Vec2, Vec3};

use crate::asset::RoomAsset;
use crate::config::{ConfigError, GameConfig};
use crate::escalator::{DifficultyEscalator, sync_obstacles};
use crate::hit_test::{HitTester, Viewport};
use crate::hud::{CORRECT_TEXT, Hud, RETRY_TEXT};
use crate::loader::{LoadError, SceneLoader};
use crate::motion::{MotionSample, MotionTracker, MotionUpdate};
use crate::physics::{PHYSICS_DT, PhysicsWorld};
use crate::scene::{NodeId, SceneGraph};
use crate::scheduler::{Deferred, Liveness, Scheduler};
use crate::sequence::{SequencePhase, SequenceTransition, TargetSequence};
use crate::tap::{TapOutcome, TapResolver};

/// Fatal errors at session start.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to load scene: {0}")]
    Load(#[from] LoadError),
}

/// Notifications for the presentation layer, drained with
/// [`GameSession::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TargetChanged { index: usize, target: String },
    Feedback { text: String },
    FeedbackCleared,
    ObstacleSpawned { node: NodeId, position: Vec3 },
    GameComplete,
    ExitRequested,
}

#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    scene: SceneGraph,
    camera: NodeId,
    camera_base_rotation: Quat,
    texture_surface: Option<NodeId>,
    viewport: Viewport,
    physics: PhysicsWorld,
    sequence: TargetSequence,
    tracker: MotionTracker,
    resolver: TapResolver,
    escalator: DifficultyEscalator,
    hud: Hud,
    scheduler: Scheduler,
    liveness: Liveness,
    locked: bool,
    clock: Duration,
    physics_accumulator: Duration,
    events: Vec<SessionEvent>,
}

impl GameSession {
    /// Validates the configuration, builds the scene and physics world, and
    /// schedules the first target prompt after the start delay.
    pub fn start(
        config: GameConfig,
        asset: &RoomAsset,
        display: Option<Viewport>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let loaded = SceneLoader::load(asset, &config.nodes, &config.image_to_show, display)?;

        let mut physics = PhysicsWorld::new();
        for static_box in &loaded.static_boxes {
            physics.add_static_box(
                static_box.center.to_array(),
                static_box.half_extents.to_array(),
            );
        }

        let liveness = Liveness::new();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(config.timing.start_delay(), Deferred::StartGame, liveness.token());

        tracing::info!(
            "[session] started: {} targets, image '{}'",
            config.objects_to_find.len(),
            config.image_to_show
        );

        Ok(Self {
            sequence: TargetSequence::new(config.objects_to_find.clone()),
            tracker: MotionTracker::new(config.motion.gravity_magnitude, config.motion.gravity_mode),
            escalator: DifficultyEscalator::new(config.obstacle.clone()),
            hud: Hud::new(config.timing.transition()),
            resolver: TapResolver::default(),
            scene: loaded.scene,
            camera: loaded.camera,
            camera_base_rotation: loaded.camera_base_rotation,
            texture_surface: loaded.texture_surface,
            viewport: loaded.viewport,
            physics,
            scheduler,
            liveness,
            locked: false,
            clock: Duration::ZERO,
            physics_accumulator: Duration::ZERO,
            events: Vec::new(),
            config,
        })
    }

    /// Replaces the hit-test backend.
    #[must_use]
    pub fn with_hit_tester(mut self, tester: Box<dyn HitTester>) -> Self {
        self.resolver = TapResolver::new(tester);
        self
    }

    /// Moves to the next target, or completes the game after the last one.
    ///
    /// Returns `None` without touching any state while the input lock is held
    /// or after the session has ended.
    pub fn advance(&mut self) -> Option<SequenceTransition> {
        if !self.is_live() {
            return None;
        }
        if self.locked {
            tracing::trace!("[session] advance skipped, input locked");
            return None;
        }

        let transition = self.sequence.advance();
        match &transition {
            SequenceTransition::Advanced { index, target } => {
                tracing::info!("[session] target {}: {}", index, target);
                self.hud.show_target(target, self.clock);
                self.events.push(SessionEvent::TargetChanged {
                    index: *index,
                    target: target.clone(),
                });
            }
            SequenceTransition::Completed => {
                tracing::info!(
                    "[session] all {} targets found, {} obstacles spawned",
                    self.sequence.len(),
                    self.escalator.spawned()
                );
                self.hud.show_completion(self.clock);
                self.hud.reveal_exit();
                self.events.push(SessionEvent::GameComplete);
            }
            SequenceTransition::AlreadyComplete => {}
        }
        self.locked = false;
        Some(transition)
    }

    /// Handles a tap at `point` in viewport coordinates.
    pub fn tap(&mut self, point: Vec2) -> TapOutcome {
        if !self.is_live() || self.locked {
            tracing::trace!("[session] tap dropped");
            return TapOutcome::Ignored;
        }
        self.locked = true;

        let found = self.resolver.resolve(
            &self.scene,
            self.camera,
            self.viewport,
            point,
            self.sequence.current_target(),
        );

        if found {
            tracing::info!(
                "[tap] found {:?}",
                self.sequence.current_target().unwrap_or_default()
            );
            self.flash(CORRECT_TEXT);
            let due = self.clock + self.config.timing.advance_delay();
            self.scheduler
                .schedule(due, Deferred::Advance, self.liveness.token());
            TapOutcome::Found
        } else {
            tracing::debug!("[tap] miss at ({:.1}, {:.1})", point.x, point.y);
            self.flash(RETRY_TEXT);
            self.locked = false;
            self.spawn_obstacle();
            TapOutcome::NotFound
        }
    }

    /// Applies one tick of the motion stream to the camera and gravity.
    pub fn on_motion(&mut self, sample: Option<&MotionSample>) -> Option<MotionUpdate> {
        if !self.is_live() {
            return None;
        }
        let update = self.tracker.on_sample(sample)?;

        let rotation = Quat::from_rotation_z(update.yaw_offset)
            * self.camera_base_rotation
            * Quat::from_rotation_x(update.pitch_offset);
        if let Some(camera) = self.scene.node_mut(self.camera) {
            camera.rotation = rotation;
        }
        let g = update.gravity;
        self.physics.set_gravity(g.x, g.y, g.z);
        Some(update)
    }

    /// Advances the session clock and physics by `dt`.
    pub fn tick(&mut self, dt: Duration) {
        self.advance_clock(dt);

        self.physics_accumulator += dt;
        let step = Duration::from_secs_f32(PHYSICS_DT);
        while self.physics_accumulator >= step {
            self.physics_accumulator -= step;
            self.step_physics();
        }
    }

    /// Advances the session clock and runs every deferred task that came due.
    pub fn advance_clock(&mut self, dt: Duration) {
        self.clock += dt;
        // Deferred tasks never schedule work that is already due
        for task in self.scheduler.drain_due(self.clock) {
            self.run_deferred(task);
        }
    }

    /// Runs one fixed physics step and moves obstacle nodes to their bodies.
    pub fn step_physics(&mut self) {
        self.physics.step();
        sync_obstacles(&mut self.scene, &self.physics);
    }

    /// Exit action. Only available once the exit control is visible; ends the
    /// session when taken.
    pub fn request_exit(&mut self) -> bool {
        if !self.is_live() || !self.hud.exit_visible() {
            return false;
        }
        self.events.push(SessionEvent::ExitRequested);
        self.end();
        true
    }

    /// Ends the session. Pending deferred tasks will be discarded unrun.
    pub fn end(&mut self) {
        if self.is_live() {
            tracing::info!("[session] ended at {:.2}s", self.clock.as_secs_f32());
        }
        self.liveness.kill();
    }

    pub fn is_live(&self) -> bool {
        self.liveness.is_alive()
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Updates the display surface size. Empty sizes are ignored.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.is_valid() {
            self.viewport = viewport;
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn current_target(&self) -> Option<&str> {
        self.sequence.current_target()
    }

    pub fn phase(&self) -> SequencePhase {
        self.sequence.phase()
    }

    pub fn sequence(&self) -> &TargetSequence {
        &self.sequence
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn obstacle_count(&self) -> usize {
        self.scene.obstacle_count()
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn camera(&self) -> NodeId {
        self.camera
    }

    pub fn texture_surface(&self) -> Option<NodeId> {
        self.texture_surface
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::from_array(self.physics.gravity())
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn motion(&self) -> &MotionTracker {
        &self.tracker
    }

    fn flash(&mut self, text: &str) {
        self.hud.flash(text, self.clock);
        self.events.push(SessionEvent::Feedback {
            text: text.to_string(),
        });
        let due = self.clock + self.config.timing.feedback_duration();
        self.scheduler
            .schedule(due, Deferred::ClearFeedback, self.liveness.token());
    }

    fn spawn_obstacle(&mut self) {
        let position = self.scene.world_position(self.camera);
        let node = self
            .escalator
            .spawn_obstacle(&mut self.scene, &mut self.physics, position);
        self.events
            .push(SessionEvent::ObstacleSpawned { node, position });
    }

    fn run_deferred(&mut self, task: Deferred) {
        match task {
            Deferred::StartGame => {
                self.advance();
            }
            Deferred::Advance => {
                self.locked = false;
                self.advance();
            }
            Deferred::ClearFeedback => {
                self.hud.clear_feedback(self.clock);
                self.events.push(SessionEvent::FeedbackCleared);
            }
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.liveness.kill();
    }
}
