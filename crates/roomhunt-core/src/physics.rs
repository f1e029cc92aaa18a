//! Obstacle physics using `Rapier3D` with a fixed timestep.
//!
//! The room is static geometry; the only dynamic bodies are obstacles spawned
//! on wrong taps. World axes are Z-up.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use rapier3d::prelude::*;

/// Fixed timestep for physics simulation (60Hz).
pub const PHYSICS_DT: f32 = 1.0 / 60.0;

/// Gravity until the first motion sample arrives, in m/s².
pub const REST_GRAVITY: [f32; 3] = [0.0, 0.0, -9.8];

/// Rapier state for one session: static boxes for the room, dynamic spheres
/// for obstacles.
pub struct PhysicsWorld {
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    pub(crate) params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    gravity: Vector,
    frame: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("frame", &self.frame)
            .field("bodies", &self.bodies.len())
            .field("colliders", &self.colliders.len())
            .field("gravity", &self.gravity())
            .finish_non_exhaustive()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        let [x, y, z] = REST_GRAVITY;
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            params: IntegrationParameters {
                dt: PHYSICS_DT,
                ..Default::default()
            },
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            gravity: Vector::new(x, y, z),
            frame: 0,
        }
    }

    /// Advances the simulation by one [`PHYSICS_DT`].
    pub fn step(&mut self) {
        self.pipeline.step(
            self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            &(),
            &(),
        );
        self.frame += 1;
    }

    /// Replaces the world gravity. Sleeping obstacles are woken so a tilt
    /// takes effect immediately.
    pub fn set_gravity(&mut self, x: f32, y: f32, z: f32) {
        self.gravity = Vector::new(x, y, z);
        tracing::trace!("[physics] gravity ({:.2}, {:.2}, {:.2})", x, y, z);
        for (_, body) in self.bodies.iter_mut().filter(|(_, b)| b.is_dynamic()) {
            body.wake_up(true);
        }
    }

    pub fn gravity(&self) -> [f32; 3] {
        [self.gravity.x, self.gravity.y, self.gravity.z]
    }

    /// Adds a fixed axis-aligned box centered at `center`.
    pub fn add_static_box(&mut self, center: [f32; 3], half_extents: [f32; 3]) -> ColliderHandle {
        let [hx, hy, hz] = half_extents;
        let [x, y, z] = center;
        self.colliders.insert(
            ColliderBuilder::cuboid(hx, hy, hz)
                .translation(Vector::new(x, y, z))
                .friction(1.0)
                .build(),
        )
    }

    /// Inserts a body together with its single collider.
    pub fn add_body(&mut self, body: RigidBody, collider: Collider) -> RigidBodyHandle {
        let handle = self.bodies.insert(body);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    /// World translation of a body as `[x, y, z]`.
    pub fn body_translation(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        let t = self.body(handle)?.translation();
        Some([t.x, t.y, t.z])
    }

    pub fn dynamic_body_count(&self) -> usize {
        self.bodies.iter().filter(|(_, b)| b.is_dynamic()).count()
    }

    /// Number of steps taken so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Fingerprint of the obstacle state: frame, gravity and every dynamic
    /// body's position and velocity. Equal inputs replay to equal hashes.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.frame.hash(&mut hasher);
        let bits = |values: [f32; 3]| values.map(f32::to_bits);
        bits(self.gravity()).hash(&mut hasher);

        for (handle, body) in self.bodies.iter().filter(|(_, b)| b.is_dynamic()) {
            handle.into_raw_parts().hash(&mut hasher);
            let t = body.translation();
            let v = body.linvel();
            bits([t.x, t.y, t.z]).hash(&mut hasher);
            bits([v.x, v.y, v.z]).hash(&mut hasher);
        }
        hasher.finish()
    }
}
