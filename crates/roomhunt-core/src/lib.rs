//! Roomhunt Core Library
//!
//! Game logic for a motion-steered "find the object" room scene using `Rapier3D`
//! for obstacle physics.
//!
//! This library provides two modes of operation:
//! - Session mode: drive a [`GameSession`] directly (replays, tests)
//! - Bevy mode: the session wrapped in ECS resources and systems (headless or `windowed`)

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod config;
pub mod escalator;
pub mod hud;
pub mod loader;
pub mod motion;
pub mod physics;
pub mod scene;
pub mod scheduler;
pub mod sequence;
pub mod session;
pub mod tap;

// Bevy integration
pub mod bevy;

pub use asset::{AssetKind, AssetNode, RoomAsset};
pub use config::{ConfigError, GameConfig, MotionConfig, SceneNodeNames, TimingConfig};
pub use escalator::{DifficultyEscalator, ObstacleParams};
pub use hit_test::{Hit, HitTester, Ray, RayHitTester, Viewport};
pub use hud::{Hud, Label, LabelTransition};
pub use loader::{LoadError, LoadedScene, SceneLoader, StaticBox};
pub use motion::{Attitude, GravityMode, MotionSample, MotionTracker, MotionUpdate};
pub use physics::{PHYSICS_DT, PhysicsWorld};
pub use scene::{Color, Material, NodeId, NodeKind, SceneGraph, SceneNode};
pub use scheduler::{Deferred, Liveness, LivenessToken, Scheduler};
pub use sequence::{SequencePhase, SequenceTransition, TargetSequence};
pub use session::{GameSession, SessionError, SessionEvent};
pub use tap::{MAX_ANCESTOR_DEPTH, TapOutcome, TapResolver};
