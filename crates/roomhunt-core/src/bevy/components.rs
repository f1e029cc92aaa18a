//! ECS Components for the room hunt game.

use bevy::prelude::*;

use crate::scene::NodeId;

/// Parent of every entity mirroring a scene node.
///
/// The scene is authored Z-up; this entity rotates it into Bevy's Y-up space.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct RoomRoot;

impl RoomRoot {
    /// Transform mapping scene space (Z-up) onto Bevy world space (Y-up).
    pub fn transform() -> Transform {
        Transform::from_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2))
    }
}

/// Links an entity to the scene node it mirrors.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneNodeRef(pub NodeId);

/// Marker for obstacle entities.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Obstacle {
    pub radius: f32,
}

/// Marker for the camera following the session camera node.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MainCamera;

/// Which HUD label a text entity shows.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudLabel {
    /// Current target or completion message.
    Top,
    /// Transient feedback.
    Middle,
}

/// Marker for the exit control, shown once the game is complete.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ExitButton;
