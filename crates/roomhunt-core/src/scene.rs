//! Scene graph: an arena of named nodes linked by parent references.
//!
//! World axes are Z-up. Cameras look along their local -Z with local +Y up.

use bevy::math::{Affine3A, Quat, Vec3};
use rapier3d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};

use crate::tap::MAX_ANCESTOR_DEPTH;

/// Index of a node inside a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// RGBA color representation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
}

/// Surface material of a mesh node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    /// Flat diffuse color.
    Color(Color),
    /// Diffuse image, referenced by its bundled identifier.
    Image(String),
}

/// Light variants carried over from the room asset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    Omni,
    Directional,
}

/// What a node is, beyond its place in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    /// Box geometry centered on the node origin.
    Mesh { half_extents: Vec3 },
    /// Perspective camera with a vertical field of view in radians.
    Camera { fov_y: f32 },
    Light { kind: LightKind, intensity: f32 },
    /// Physics-driven sphere spawned during play.
    Obstacle {
        body: RigidBodyHandle,
        radius: f32,
    },
}

/// A single node of the scene tree.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: Option<String>,
    pub kind: NodeKind,
    pub translation: Vec3,
    pub rotation: Quat,
    pub material: Option<Material>,
    /// Whether the room geometry should collide with obstacles.
    pub solid: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(name: Option<String>, kind: NodeKind) -> Self {
        Self {
            name,
            kind,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            material: None,
            solid: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn named(name: impl Into<String>, kind: NodeKind) -> Self {
        Self::new(Some(name.into()), kind)
    }

    #[must_use]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Local transform relative to the parent node.
    pub fn local_transform(&self) -> Affine3A {
        Affine3A::from_rotation_translation(self.rotation, self.translation)
    }

    pub fn is_obstacle(&self) -> bool {
        matches!(self.kind, NodeKind::Obstacle { .. })
    }
}

/// Tree of scene nodes rooted at an unnamed group.
///
/// Nodes are never freed. Detaching a node unlinks it from its parent, after
/// which it is unreachable from the root but its id stays valid.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates an empty scene containing only the root group.
    pub fn new() -> Self {
        Self {
            nodes: vec![SceneNode::new(None, NodeKind::Group)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever allocated, including detached ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    /// Appends `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Unlinks `id` from its parent. The root cannot be detached.
    pub fn detach(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let Some(parent) = self.nodes.get_mut(id.0).and_then(|n| n.parent.take()) else {
            return;
        };
        self.nodes[parent.0].children.retain(|child| *child != id);
    }

    /// Depth-first search from the root for a node with exactly this name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .find(|id| self.nodes[id.0].name.as_deref() == Some(name))
    }

    /// Moves the subtree at `src_id` out of `src` and appends a copy of it under
    /// `parent` in this graph. Returns the id of the copied subtree root.
    ///
    /// After the move the subtree is no longer reachable in `src`.
    pub fn graft_from(&mut self, src: &mut SceneGraph, src_id: NodeId, parent: NodeId) -> NodeId {
        src.detach(src_id);

        let new_root = self.add_child(parent, src.nodes[src_id.0].clone());
        let mut stack = vec![(src_id, new_root)];
        while let Some((from, to)) = stack.pop() {
            for &child in &src.nodes[from.0].children {
                let copied = self.add_child(to, src.nodes[child.0].clone());
                stack.push((child, copied));
            }
        }
        new_root
    }

    /// Iterates `id` and all nodes below it, depth-first, parents before children.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            graph: self,
            stack: vec![id],
        }
    }

    /// Walks from `id` up to the root (inclusive), stopping after
    /// [`MAX_ANCESTOR_DEPTH`] steps on malformed graphs.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.node(id).map(|_| id),
            remaining: MAX_ANCESTOR_DEPTH,
        }
    }

    /// Composes local transforms from the root down to `id`.
    pub fn world_transform(&self, id: NodeId) -> Affine3A {
        let chain: Vec<NodeId> = self.ancestors(id).map(|(id, _)| id).collect();
        chain
            .iter()
            .rev()
            .fold(Affine3A::IDENTITY, |acc, id| {
                acc * self.nodes[id.0].local_transform()
            })
    }

    pub fn world_position(&self, id: NodeId) -> Vec3 {
        Vec3::from(self.world_transform(id).translation)
    }

    /// Obstacle nodes attached to the scene, in spawn order.
    pub fn obstacles(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.descendants(self.root)
            .map(|id| (id, &self.nodes[id.0]))
            .filter(|(_, node)| node.is_obstacle())
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles().count()
    }
}

/// Iterator over a node and its parents.
pub struct Ancestors<'a> {
    graph: &'a SceneGraph,
    next: Option<NodeId>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (NodeId, &'a SceneNode);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.next?;
        let node = self.graph.node(id)?;
        self.remaining -= 1;
        self.next = node.parent;
        Some((id, node))
    }
}

/// Depth-first iterator over a subtree.
pub struct Descendants<'a> {
    graph: &'a SceneGraph,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        if let Some(node) = self.graph.node(id) {
            // Reverse so the first child is visited first
            self.stack.extend(node.children.iter().rev());
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh() -> NodeKind {
        NodeKind::Mesh {
            half_extents: Vec3::ONE,
        }
    }

    #[test]
    fn test_add_and_find() {
        let mut scene = SceneGraph::new();
        let group = scene.add_child(scene.root(), SceneNode::named("Table", NodeKind::Group));
        let top = scene.add_child(group, SceneNode::named("Table_top", mesh()));

        assert_eq!(scene.find_by_name("Table"), Some(group));
        assert_eq!(scene.find_by_name("Table_top"), Some(top));
        assert_eq!(scene.find_by_name("Couch"), None);
        assert_eq!(scene.node(top).unwrap().parent(), Some(group));
    }

    #[test]
    fn test_detach_hides_subtree() {
        let mut scene = SceneGraph::new();
        let group = scene.add_child(scene.root(), SceneNode::named("SketchUp", NodeKind::Group));
        scene.add_child(group, SceneNode::named("camera", NodeKind::Camera { fov_y: 1.0 }));

        scene.detach(group);

        assert_eq!(scene.find_by_name("SketchUp"), None);
        assert_eq!(scene.find_by_name("camera"), None);
        assert!(scene.node(scene.root()).unwrap().children().is_empty());
    }

    #[test]
    fn test_graft_moves_subtree() {
        let mut asset = SceneGraph::new();
        let group = asset.add_child(asset.root(), SceneNode::named("TV", NodeKind::Group));
        asset.add_child(group, SceneNode::named("TV_frame", mesh()));

        let mut scene = SceneGraph::new();
        let grafted = scene.graft_from(&mut asset, group, scene.root());

        assert_eq!(asset.find_by_name("TV"), None);
        assert_eq!(scene.find_by_name("TV"), Some(grafted));
        let frame = scene.find_by_name("TV_frame").unwrap();
        assert_eq!(scene.node(frame).unwrap().parent(), Some(grafted));
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let mut scene = SceneGraph::new();
        let a = scene.add_child(scene.root(), SceneNode::named("a", NodeKind::Group));
        let b = scene.add_child(a, SceneNode::named("b", NodeKind::Group));
        let c = scene.add_child(b, SceneNode::named("c", mesh()));

        let chain: Vec<NodeId> = scene.ancestors(c).map(|(id, _)| id).collect();
        assert_eq!(chain, vec![c, b, a, scene.root()]);
    }

    #[test]
    fn test_ancestors_depth_cap_on_cycle() {
        let mut scene = SceneGraph::new();
        let a = scene.add_child(scene.root(), SceneNode::named("a", NodeKind::Group));
        let b = scene.add_child(a, SceneNode::named("b", NodeKind::Group));
        // Corrupt the graph into a cycle a -> b -> a
        scene.node_mut(a).unwrap().parent = Some(b);

        assert_eq!(scene.ancestors(b).count(), MAX_ANCESTOR_DEPTH);
    }

    #[test]
    fn test_world_transform_composes_parents() {
        let mut scene = SceneGraph::new();
        let group = scene.add_child(
            scene.root(),
            SceneNode::named("g", NodeKind::Group).with_translation(Vec3::new(10.0, 0.0, 0.0)),
        );
        let child = scene.add_child(
            group,
            SceneNode::named("c", mesh()).with_translation(Vec3::new(0.0, 5.0, 1.0)),
        );

        let pos = scene.world_position(child);
        assert!((pos - Vec3::new(10.0, 5.0, 1.0)).length() < 1e-5);
    }
}
