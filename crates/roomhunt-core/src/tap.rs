//! Tap resolution: hit-test a screen point and match hits against the target.

use std::fmt;

use bevy::math::Vec2;

use crate::hit_test::{Hit, HitTester, RayHitTester, Viewport};
use crate::scene::{NodeId, SceneGraph};

/// Upper bound on parent links followed from a hit node.
pub const MAX_ANCESTOR_DEPTH: usize = 256;

/// Result of a tap handed to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Dropped because another tap or advance was in flight.
    Ignored,
    Found,
    NotFound,
}

pub struct TapResolver {
    tester: Box<dyn HitTester>,
}

impl Default for TapResolver {
    fn default() -> Self {
        Self::new(Box::new(RayHitTester))
    }
}

impl fmt::Debug for TapResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapResolver").finish_non_exhaustive()
    }
}

impl TapResolver {
    pub fn new(tester: Box<dyn HitTester>) -> Self {
        Self { tester }
    }

    /// Runs the hit-test for a screen point.
    pub fn hits(
        &self,
        scene: &SceneGraph,
        camera: NodeId,
        viewport: Viewport,
        point: Vec2,
    ) -> Vec<Hit> {
        self.tester.hit_test(scene, camera, viewport, point)
    }

    /// Hit-tests `point` and reports whether any hit belongs to `target`.
    pub fn resolve(
        &self,
        scene: &SceneGraph,
        camera: NodeId,
        viewport: Viewport,
        point: Vec2,
        target: Option<&str>,
    ) -> bool {
        let hits = self.hits(scene, camera, viewport, point);
        tracing::debug!("[tap] {} hits at ({:.1}, {:.1})", hits.len(), point.x, point.y);
        Self::matches(scene, &hits, target)
    }

    /// True if any hit has an ancestor (itself included) whose name contains
    /// `target`. Hit order does not matter. A `None` target matches nothing.
    pub fn matches(scene: &SceneGraph, hits: &[Hit], target: Option<&str>) -> bool {
        let Some(target) = target else {
            return false;
        };
        hits.iter().any(|hit| Self::node_matches(scene, hit.node, target))
    }

    /// Walks from `node` toward the root looking for a name containing `target`.
    pub fn node_matches(scene: &SceneGraph, node: NodeId, target: &str) -> bool {
        scene
            .ancestors(node)
            .filter_map(|(_, node)| node.name.as_deref())
            .any(|name| name.contains(target))
    }
}
