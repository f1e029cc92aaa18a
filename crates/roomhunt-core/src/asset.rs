//! Room asset description.
//!
//! The bundled room is a tree of named nodes authored Z-up. Node rotations are
//! XYZ Euler angles in radians; mesh nodes are boxes given by their half extents.

use std::f32::consts::FRAC_PI_2;
use std::path::Path;

use bevy::math::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::loader::LoadError;
use crate::scene::{Color, LightKind, Material, NodeId, NodeKind, SceneGraph, SceneNode};

/// Node kind as written in the asset file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetKind {
    Group,
    Mesh {
        half_extents: [f32; 3],
    },
    Camera {
        #[serde(default = "default_fov_degrees")]
        fov_y_degrees: f32,
    },
    Light {
        light: LightKind,
        #[serde(default = "default_intensity")]
        intensity: f32,
    },
}

fn default_fov_degrees() -> f32 {
    60.0
}

fn default_intensity() -> f32 {
    1.0
}

/// One node of the asset tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: AssetKind,
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Material>,
    #[serde(default)]
    pub solid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AssetNode>,
}

impl AssetNode {
    pub fn group(name: &str, translation: [f32; 3], children: Vec<AssetNode>) -> Self {
        Self {
            name: Some(name.to_string()),
            kind: AssetKind::Group,
            translation,
            rotation: [0.0; 3],
            material: None,
            solid: false,
            children,
        }
    }

    pub fn mesh(name: &str, translation: [f32; 3], half_extents: [f32; 3], color: Color) -> Self {
        Self {
            name: Some(name.to_string()),
            kind: AssetKind::Mesh { half_extents },
            translation,
            rotation: [0.0; 3],
            material: Some(Material::Color(color)),
            solid: false,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn solid(mut self) -> Self {
        self.solid = true;
        self
    }

    fn to_scene_node(&self) -> SceneNode {
        let kind = match &self.kind {
            AssetKind::Group => NodeKind::Group,
            AssetKind::Mesh { half_extents } => NodeKind::Mesh {
                half_extents: Vec3::from_array(*half_extents),
            },
            AssetKind::Camera { fov_y_degrees } => NodeKind::Camera {
                fov_y: fov_y_degrees.to_radians(),
            },
            AssetKind::Light { light, intensity } => NodeKind::Light {
                kind: *light,
                intensity: *intensity,
            },
        };
        let [x, y, z] = self.rotation;
        let mut node = SceneNode::new(self.name.clone(), kind)
            .with_translation(Vec3::from_array(self.translation))
            .with_rotation(Quat::from_euler(EulerRot::XYZ, x, y, z));
        node.material = self.material.clone();
        node.solid = self.solid;
        node
    }
}

/// A bundled room scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomAsset {
    pub name: String,
    /// Image identifiers bundled with the room.
    #[serde(default)]
    pub images: Vec<String>,
    pub nodes: Vec<AssetNode>,
}

impl RoomAsset {
    /// Parses an asset from JSON.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the asset to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reads and parses an asset file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Asset {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn has_image(&self, id: &str) -> bool {
        self.images.iter().any(|image| image == id)
    }

    /// Instantiates the asset tree as a scene graph.
    pub fn to_scene_graph(&self) -> SceneGraph {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let mut stack: Vec<(&AssetNode, NodeId)> =
            self.nodes.iter().rev().map(|node| (node, root)).collect();
        while let Some((node, parent)) = stack.pop() {
            let id = graph.add_child(parent, node.to_scene_node());
            stack.extend(node.children.iter().rev().map(|child| (child, id)));
        }
        graph
    }

    /// The built-in living room.
    ///
    /// Units follow the modelling tool the room came from (roughly inches).
    /// The camera stands near the south wall looking north at the TV.
    pub fn default_living_room() -> Self {
        let wall = Color::rgb(214, 206, 190);
        let wood = Color::rgb(120, 78, 45);
        let fabric = Color::rgb(70, 90, 130);
        let brick = Color::rgb(150, 70, 50);

        let sketchup = AssetNode::group(
            "SketchUp",
            [0.0, 0.0, 0.0],
            vec![
                AssetNode::mesh("Floor", [0.0, 0.0, -1.0], [120.0, 100.0, 1.0], wood).solid(),
                AssetNode::mesh("Ceiling", [0.0, 0.0, 101.0], [120.0, 100.0, 1.0], wall).solid(),
                AssetNode::mesh("Wall_North", [0.0, 101.0, 50.0], [120.0, 1.0, 50.0], wall)
                    .solid(),
                AssetNode::mesh("Wall_South", [0.0, -101.0, 50.0], [120.0, 1.0, 50.0], wall)
                    .solid(),
                AssetNode::mesh("Wall_East", [121.0, 0.0, 50.0], [1.0, 100.0, 50.0], wall)
                    .solid(),
                AssetNode::mesh("Wall_West", [-121.0, 0.0, 50.0], [1.0, 100.0, 50.0], wall)
                    .solid(),
                AssetNode::mesh("Rug", [0.0, 0.0, 0.5], [60.0, 40.0, 0.5], Color::rgb(160, 40, 60)),
                AssetNode::group(
                    "Table",
                    [0.0, 40.0, 0.0],
                    vec![
                        AssetNode::mesh("Table_top", [0.0, 0.0, 28.0], [30.0, 20.0, 2.0], wood)
                            .solid(),
                        AssetNode::mesh("Table_base", [0.0, 0.0, 13.0], [4.0, 4.0, 13.0], wood)
                            .solid(),
                    ],
                ),
                AssetNode::group(
                    "Candles",
                    [0.0, 40.0, 30.0],
                    vec![AssetNode::mesh(
                        "Candles_mesh",
                        [0.0, 0.0, 5.0],
                        [10.0, 3.0, 5.0],
                        Color::rgb(250, 240, 210),
                    )],
                ),
                AssetNode::group(
                    "Couch",
                    [0.0, -70.0, 0.0],
                    vec![
                        AssetNode::mesh("Couch_seat", [0.0, 0.0, 10.0], [50.0, 15.0, 10.0], fabric)
                            .solid(),
                        AssetNode::mesh("Couch_back", [0.0, -15.0, 25.0], [50.0, 5.0, 15.0], fabric)
                            .solid(),
                    ],
                ),
                AssetNode::group(
                    "TV",
                    [0.0, 97.0, 0.0],
                    vec![
                        AssetNode::mesh("TV_stand", [0.0, 0.0, 15.0], [25.0, 3.0, 15.0], wood)
                            .solid(),
                        AssetNode::mesh(
                            "TV_frame",
                            [0.0, 0.0, 50.0],
                            [30.0, 2.0, 18.0],
                            Color::rgb(30, 30, 30),
                        ),
                    ],
                ),
                AssetNode::group(
                    "Fireplace",
                    [-115.0, 0.0, 0.0],
                    vec![
                        AssetNode::mesh("Fireplace_mantel", [0.0, 0.0, 25.0], [4.0, 30.0, 25.0], brick)
                            .solid(),
                        AssetNode::mesh("Fireplace_hearth", [6.0, 0.0, 1.0], [6.0, 30.0, 1.0], brick)
                            .solid(),
                    ],
                ),
            ],
        );

        let screen = AssetNode::mesh("screen", [0.0, 94.5, 50.0], [27.0, 0.5, 15.0], Color::BLACK);

        let camera = AssetNode {
            name: Some("camera".to_string()),
            kind: AssetKind::Camera {
                fov_y_degrees: default_fov_degrees(),
            },
            translation: [0.0, -40.0, 50.0],
            // Tilt the default -Z view direction up to the horizon (+Y)
            rotation: [FRAC_PI_2, 0.0, 0.0],
            material: None,
            solid: false,
            children: Vec::new(),
        };

        let light = |name: &str, light: LightKind, translation: [f32; 3], intensity: f32| AssetNode {
            name: Some(name.to_string()),
            kind: AssetKind::Light { light, intensity },
            translation,
            rotation: [0.0; 3],
            material: None,
            solid: false,
            children: Vec::new(),
        };
        let lighting = AssetNode::group(
            "Lighting",
            [0.0, 0.0, 0.0],
            vec![
                light("Sun", LightKind::Directional, [0.0, 0.0, 200.0], 0.6),
                light("Lamp", LightKind::Omni, [0.0, 0.0, 90.0], 1.0),
            ],
        );

        Self {
            name: "Living Room".to_string(),
            images: vec!["texture".to_string()],
            nodes: vec![sketchup, screen, camera, lighting],
        }
    }
}
