//! One-shot construction of the session scene from the room asset.

use std::path::PathBuf;

use bevy::math::{Quat, Vec3};

use crate::asset::RoomAsset;
use crate::config::SceneNodeNames;
use crate::hit_test::Viewport;
use crate::scene::{Material, NodeId, NodeKind, SceneGraph};

/// Fatal scene-loading errors. A session cannot start after any of them.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("display surface is missing or has zero size")]
    MissingDisplaySurface,
    #[error("required scene node '{0}' not found in room asset")]
    MissingNode(String),
    #[error("node '{0}' is not a camera")]
    NotACamera(String),
    #[error("failed to read room asset {path}: {source}")]
    Asset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

/// Axis-aligned static collider derived from a solid mesh node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticBox {
    pub center: Vec3,
    pub half_extents: Vec3,
}

/// Scene ready for play, bound to a display surface.
#[derive(Debug, Clone)]
pub struct LoadedScene {
    pub scene: SceneGraph,
    pub camera: NodeId,
    /// Camera orientation as authored, before any motion is applied.
    pub camera_base_rotation: Quat,
    pub lighting: Option<NodeId>,
    /// Set when the caller's image was applied to the texture surface.
    pub texture_surface: Option<NodeId>,
    pub static_boxes: Vec<StaticBox>,
    pub viewport: Viewport,
}

pub struct SceneLoader;

impl SceneLoader {
    /// Builds the session scene.
    ///
    /// Nodes are moved out of the asset one after another, so a node nested
    /// inside an earlier moved subtree can no longer be found. A camera placed
    /// inside the root group is therefore reported as missing.
    pub fn load(
        asset: &RoomAsset,
        names: &SceneNodeNames,
        image_to_show: &str,
        display: Option<Viewport>,
    ) -> Result<LoadedScene, LoadError> {
        let viewport = display
            .filter(Viewport::is_valid)
            .ok_or(LoadError::MissingDisplaySurface)?;

        let mut room = asset.to_scene_graph();
        let mut scene = SceneGraph::new();
        let root = scene.root();

        let room_group = room
            .find_by_name(&names.root_group)
            .ok_or_else(|| LoadError::MissingNode(names.root_group.clone()))?;
        scene.graft_from(&mut room, room_group, root);
        tracing::debug!("[loader] grafted room group '{}'", names.root_group);

        let texture_surface = match room.find_by_name(&names.texture_surface) {
            Some(surface) if asset.has_image(image_to_show) => {
                let id = scene.graft_from(&mut room, surface, root);
                if let Some(node) = scene.node_mut(id) {
                    node.material = Some(Material::Image(image_to_show.to_string()));
                }
                tracing::debug!(
                    "[loader] applied image '{}' to '{}'",
                    image_to_show,
                    names.texture_surface
                );
                Some(id)
            }
            _ => {
                tracing::debug!(
                    "[loader] texture surface '{}' or image '{}' unavailable, skipping",
                    names.texture_surface,
                    image_to_show
                );
                None
            }
        };

        let camera_src = room
            .find_by_name(&names.camera)
            .ok_or_else(|| LoadError::MissingNode(names.camera.clone()))?;
        let camera = scene.graft_from(&mut room, camera_src, root);
        let camera_node = scene
            .node(camera)
            .ok_or_else(|| LoadError::MissingNode(names.camera.clone()))?;
        if !matches!(camera_node.kind, NodeKind::Camera { .. }) {
            return Err(LoadError::NotACamera(names.camera.clone()));
        }
        let camera_base_rotation = camera_node.rotation;

        let lighting = room
            .find_by_name(&names.lighting)
            .map(|lighting| scene.graft_from(&mut room, lighting, root));

        let static_boxes = collect_static_boxes(&scene);

        tracing::info!(
            "[loader] loaded '{}': {} nodes, {} static boxes, lighting={}, texture={}",
            asset.name,
            scene.descendants(root).count(),
            static_boxes.len(),
            lighting.is_some(),
            texture_surface.is_some()
        );

        Ok(LoadedScene {
            scene,
            camera,
            camera_base_rotation,
            lighting,
            texture_surface,
            static_boxes,
            viewport,
        })
    }
}

/// World-space bounding boxes of every solid mesh node.
fn collect_static_boxes(scene: &SceneGraph) -> Vec<StaticBox> {
    scene
        .descendants(scene.root())
        .filter_map(|id| {
            let node = scene.node(id)?;
            let NodeKind::Mesh { half_extents } = node.kind else {
                return None;
            };
            if !node.solid {
                return None;
            }
            let world = scene.world_transform(id);
            let m = world.matrix3;
            let half = m.x_axis.abs() * half_extents.x
                + m.y_axis.abs() * half_extents.y
                + m.z_axis.abs() * half_extents.z;
            Some(StaticBox {
                center: Vec3::from(world.translation),
                half_extents: Vec3::from(half),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetNode;
    use crate::scene::Color;

    fn viewport() -> Option<Viewport> {
        Some(Viewport::new(800.0, 600.0))
    }

    fn load(asset: &RoomAsset, image: &str) -> Result<LoadedScene, LoadError> {
        SceneLoader::load(asset, &SceneNodeNames::default(), image, viewport())
    }

    #[test]
    fn test_load_default_room() {
        let loaded = load(&RoomAsset::default_living_room(), "texture").unwrap();

        let scene = &loaded.scene;
        assert_eq!(scene.node(loaded.camera).unwrap().parent(), Some(scene.root()));
        assert!(loaded.lighting.is_some());
        assert!(scene.find_by_name("SketchUp").is_some());
        assert!(scene.find_by_name("Candles_mesh").is_some());
        assert!(!loaded.static_boxes.is_empty());
    }

    #[test]
    fn test_texture_applied_to_surface() {
        let loaded = load(&RoomAsset::default_living_room(), "texture").unwrap();

        let surface = loaded.texture_surface.unwrap();
        let node = loaded.scene.node(surface).unwrap();
        assert_eq!(node.material, Some(Material::Image("texture".to_string())));
        assert_eq!(node.parent(), Some(loaded.scene.root()));
    }

    #[test]
    fn test_unknown_image_leaves_surface_behind() {
        let loaded = load(&RoomAsset::default_living_room(), "no-such-image").unwrap();

        assert!(loaded.texture_surface.is_none());
        assert!(loaded.scene.find_by_name("screen").is_none());
    }

    #[test]
    fn test_missing_display_surface_is_fatal() {
        let asset = RoomAsset::default_living_room();
        let names = SceneNodeNames::default();

        let none = SceneLoader::load(&asset, &names, "texture", None);
        assert!(matches!(none, Err(LoadError::MissingDisplaySurface)));

        let empty = SceneLoader::load(&asset, &names, "texture", Some(Viewport::new(0.0, 600.0)));
        assert!(matches!(empty, Err(LoadError::MissingDisplaySurface)));
    }

    #[test]
    fn test_missing_camera_is_fatal() {
        let mut asset = RoomAsset::default_living_room();
        asset.nodes.retain(|node| node.name.as_deref() != Some("camera"));

        let result = load(&asset, "texture");
        assert!(matches!(result, Err(LoadError::MissingNode(name)) if name == "camera"));
    }

    #[test]
    fn test_missing_room_group_is_fatal() {
        let mut asset = RoomAsset::default_living_room();
        asset.nodes.retain(|node| node.name.as_deref() != Some("SketchUp"));

        let result = load(&asset, "texture");
        assert!(matches!(result, Err(LoadError::MissingNode(name)) if name == "SketchUp"));
    }

    #[test]
    fn test_camera_inside_room_group_is_missing() {
        let mut asset = RoomAsset::default_living_room();
        let camera_index = asset
            .nodes
            .iter()
            .position(|node| node.name.as_deref() == Some("camera"))
            .unwrap();
        let camera = asset.nodes.remove(camera_index);
        asset.nodes[0].children.push(camera);

        let result = load(&asset, "texture");
        assert!(matches!(result, Err(LoadError::MissingNode(_))));
    }

    #[test]
    fn test_lighting_is_optional() {
        let mut asset = RoomAsset::default_living_room();
        asset.nodes.retain(|node| node.name.as_deref() != Some("Lighting"));

        let loaded = load(&asset, "texture").unwrap();
        assert!(loaded.lighting.is_none());
    }

    #[test]
    fn test_camera_name_on_mesh_rejected() {
        let mut asset = RoomAsset::default_living_room();
        asset.nodes.retain(|node| node.name.as_deref() != Some("camera"));
        asset
            .nodes
            .push(AssetNode::mesh("camera", [0.0; 3], [1.0; 3], Color::WHITE));

        let result = load(&asset, "texture");
        assert!(matches!(result, Err(LoadError::NotACamera(_))));
    }

    #[test]
    fn test_static_box_world_bounds() {
        let loaded = load(&RoomAsset::default_living_room(), "texture").unwrap();

        // Table_top: table group at y=40, top at z=28
        let table_top = loaded
            .static_boxes
            .iter()
            .find(|b| (b.center - Vec3::new(0.0, 40.0, 28.0)).length() < 1e-3)
            .expect("table top collider");
        assert!((table_top.half_extents - Vec3::new(30.0, 20.0, 2.0)).length() < 1e-3);
    }
}
