//! Obstacles spawned on wrong guesses.

use bevy::math::Vec3;
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::physics::PhysicsWorld;
use crate::scene::{Color, Material, NodeId, NodeKind, SceneGraph, SceneNode};

/// Physical parameters of a spawned obstacle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObstacleParams {
    pub radius: f32,
    pub friction: f32,
    /// Values above 1 gain energy on every bounce.
    pub restitution: f32,
    pub mass: f32,
    pub affected_by_gravity: bool,
    pub color: Color,
}

impl Default for ObstacleParams {
    fn default() -> Self {
        Self {
            radius: 5.0,
            friction: 1.0,
            restitution: 2.5,
            mass: 3.0,
            affected_by_gravity: true,
            color: Color::RED,
        }
    }
}

/// Adds one bouncing sphere per wrong guess. Obstacles are never removed.
#[derive(Debug, Clone, Default)]
pub struct DifficultyEscalator {
    params: ObstacleParams,
    spawned: usize,
}

impl DifficultyEscalator {
    pub fn new(params: ObstacleParams) -> Self {
        Self { params, spawned: 0 }
    }

    pub fn params(&self) -> &ObstacleParams {
        &self.params
    }

    pub fn spawned(&self) -> usize {
        self.spawned
    }

    /// Creates a dynamic sphere at `position` and attaches it, unnamed, to the
    /// scene root.
    pub fn spawn_obstacle(
        &mut self,
        scene: &mut SceneGraph,
        physics: &mut PhysicsWorld,
        position: Vec3,
    ) -> NodeId {
        let params = &self.params;
        let body = RigidBodyBuilder::dynamic()
            .translation(Vector::new(position.x, position.y, position.z))
            .gravity_scale(if params.affected_by_gravity { 1.0 } else { 0.0 })
            .build();
        let collider = ColliderBuilder::ball(params.radius)
            .friction(params.friction)
            .restitution(params.restitution)
            .mass(params.mass)
            .build();
        let handle = physics.add_body(body, collider);

        let node = SceneNode::new(
            None,
            NodeKind::Obstacle {
                body: handle,
                radius: params.radius,
            },
        )
        .with_translation(position)
        .with_material(Material::Color(params.color));
        let id = scene.add_child(scene.root(), node);

        self.spawned += 1;
        tracing::debug!(
            "[escalator] obstacle #{} at ({:.1}, {:.1}, {:.1}), {} live bodies",
            self.spawned,
            position.x,
            position.y,
            position.z,
            physics.dynamic_body_count()
        );
        id
    }
}

/// Copies obstacle body translations back into their scene nodes.
pub fn sync_obstacles(scene: &mut SceneGraph, physics: &PhysicsWorld) {
    let updates: Vec<(NodeId, [f32; 3])> = scene
        .obstacles()
        .filter_map(|(id, node)| match node.kind {
            NodeKind::Obstacle { body, .. } => Some((id, physics.body_translation(body)?)),
            _ => None,
        })
        .collect();
    for (id, translation) in updates {
        if let Some(node) = scene.node_mut(id) {
            node.translation = Vec3::from_array(translation);
        }
    }
}
