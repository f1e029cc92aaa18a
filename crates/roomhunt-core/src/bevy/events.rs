//! ECS Messages published from session events.
//!
//! Note: In Bevy 0.18+, buffered events use Message trait instead of Event.

use bevy::prelude::*;

use crate::scene::NodeId;

/// Message fired when a new target is prompted.
#[derive(Message, Debug, Clone)]
pub struct TargetChangedEvent {
    pub index: usize,
    pub target: String,
}

/// Message fired when feedback text is flashed.
#[derive(Message, Debug, Clone)]
pub struct FeedbackEvent {
    pub text: String,
}

/// Message fired when the feedback label is blanked.
#[derive(Message, Debug, Clone, Default)]
pub struct FeedbackClearedEvent;

/// Message fired when a wrong guess added an obstacle.
#[derive(Message, Debug, Clone)]
pub struct ObstacleSpawnedEvent {
    /// Scene node of the obstacle.
    pub node: NodeId,
    /// Spawn position in scene space (Z-up).
    pub position: Vec3,
}

/// Message fired when every target has been found.
#[derive(Message, Debug, Clone, Default)]
pub struct GameCompleteEvent;

/// Message fired when the player took the exit action.
#[derive(Message, Debug, Clone, Default)]
pub struct ExitRequestedEvent;
