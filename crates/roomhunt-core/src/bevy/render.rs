//! Windowed systems: 3D scene mirror, pointer and window input, HUD.

use bevy::color::Alpha;
use bevy::input::touch::Touches;
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::bevy::components::{ExitButton, HudLabel, MainCamera, Obstacle, RoomRoot, SceneNodeRef};
use crate::bevy::resources::{CommandQueue, SessionCommand, SessionRes, SessionSetup};
use crate::hit_test::Viewport;
use crate::hud::Label;
use crate::scene::{Color as SceneColor, LightKind, Material, NodeKind};

/// Scales asset light intensity to Bevy photometric units.
const POINT_LIGHT_LUMENS: f32 = 400_000.0;
const DIRECTIONAL_LIGHT_LUX: f32 = 2_000.0;
/// Distance a label slides in from while its transition runs.
const LABEL_SLIDE_PX: f32 = 24.0;
const TOP_LABEL_PX: f32 = 32.0;
const MIDDLE_LABEL_PERCENT: f32 = 45.0;

fn to_bevy_color(color: SceneColor) -> Color {
    Color::srgba_u8(color.r, color.g, color.b, color.a)
}

/// Uses the primary window as the display surface.
pub fn use_window_viewport(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut setup: ResMut<SessionSetup>,
) {
    let Ok(window) = windows.single() else {
        tracing::warn!("[render] no primary window, keeping configured viewport");
        return;
    };
    setup.viewport = Some(Viewport::new(window.width(), window.height()));
}

/// Spawns drawable entities for the room meshes, camera and lights.
pub fn spawn_scene_entities(
    mut commands: Commands,
    session: Option<Res<SessionRes>>,
    roots: Query<Entity, With<RoomRoot>>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(res) = session else {
        return;
    };
    let Ok(root) = roots.single() else {
        return;
    };
    commands.entity(root).insert(Visibility::default());

    let scene = res.session.scene();
    for id in scene.descendants(scene.root()) {
        let Some(node) = scene.node(id) else {
            continue;
        };
        let (_, rotation, translation) = scene.world_transform(id).to_scale_rotation_translation();
        let transform = Transform::from_translation(translation).with_rotation(rotation);
        let base = (SceneNodeRef(id), transform, ChildOf(root));

        match &node.kind {
            NodeKind::Mesh { half_extents } => {
                let material = match &node.material {
                    Some(Material::Image(image)) => StandardMaterial {
                        base_color_texture: Some(asset_server.load(format!("{image}.png"))),
                        ..default()
                    },
                    Some(Material::Color(color)) => StandardMaterial::from(to_bevy_color(*color)),
                    None => StandardMaterial::default(),
                };
                let size = *half_extents * 2.0;
                commands.spawn((
                    base,
                    Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
                    MeshMaterial3d(materials.add(material)),
                ));
            }
            NodeKind::Camera { fov_y } => {
                commands.spawn((
                    base,
                    Camera3d::default(),
                    Projection::from(PerspectiveProjection {
                        fov: *fov_y,
                        ..default()
                    }),
                    MainCamera,
                ));
            }
            NodeKind::Light { kind, intensity } => match kind {
                LightKind::Omni => {
                    commands.spawn((
                        base,
                        PointLight {
                            intensity: intensity * POINT_LIGHT_LUMENS,
                            range: 500.0,
                            ..default()
                        },
                    ));
                }
                LightKind::Directional => {
                    commands.spawn((
                        base,
                        DirectionalLight {
                            illuminance: intensity * DIRECTIONAL_LIGHT_LUX,
                            ..default()
                        },
                    ));
                }
            },
            NodeKind::Group | NodeKind::Obstacle { .. } => {}
        }
    }
    tracing::info!("[render] scene entities spawned");
}

/// Spawns the target label, feedback label and the hidden exit button.
pub fn spawn_hud(mut commands: Commands) {
    let label_row = |top: Val| Node {
        position_type: PositionType::Absolute,
        top,
        width: Val::Percent(100.0),
        justify_content: JustifyContent::Center,
        ..default()
    };

    commands
        .spawn(label_row(Val::Px(TOP_LABEL_PX)))
        .with_child((
            HudLabel::Top,
            Text::new(""),
            TextFont {
                font_size: 36.0,
                ..default()
            },
            TextColor(Color::WHITE),
        ));

    commands
        .spawn(label_row(Val::Percent(MIDDLE_LABEL_PERCENT)))
        .with_child((
            HudLabel::Middle,
            Text::new(""),
            TextFont {
                font_size: 48.0,
                ..default()
            },
            TextColor(Color::WHITE),
        ));

    commands
        .spawn((
            ExitButton,
            Button,
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(40.0),
                left: Val::Percent(50.0),
                margin: UiRect::left(Val::Px(-60.0)),
                width: Val::Px(120.0),
                height: Val::Px(48.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::srgba(0.1, 0.1, 0.1, 0.8)),
            Visibility::Hidden,
        ))
        .with_child((
            Text::new("Exit"),
            TextFont {
                font_size: 28.0,
                ..default()
            },
            TextColor(Color::WHITE),
        ));
}

/// Turns left clicks and touches into taps.
pub fn handle_pointer_input(
    mouse_button: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    exit_button: Query<&Interaction, With<ExitButton>>,
    queue: Res<CommandQueue>,
) {
    // Presses on the exit button are not guesses
    if exit_button.iter().any(|i| *i != Interaction::None) {
        return;
    }

    if mouse_button.just_pressed(MouseButton::Left)
        && let Ok(window) = windows.single()
        && let Some(cursor) = window.cursor_position()
    {
        queue.push(SessionCommand::Tap {
            x: cursor.x,
            y: cursor.y,
        });
    }

    for touch in touches.iter_just_pressed() {
        let position = touch.position();
        queue.push(SessionCommand::Tap {
            x: position.x,
            y: position.y,
        });
    }
}

pub fn track_window_size(mut resized: MessageReader<WindowResized>, queue: Res<CommandQueue>) {
    if let Some(last) = resized.read().last() {
        queue.push(SessionCommand::Resize {
            width: last.width,
            height: last.height,
        });
    }
}

/// Exit button press or Escape.
pub fn handle_exit_input(
    buttons: Query<&Interaction, (Changed<Interaction>, With<ExitButton>)>,
    keys: Res<ButtonInput<KeyCode>>,
    queue: Res<CommandQueue>,
) {
    let pressed = buttons.iter().any(|i| *i == Interaction::Pressed);
    if pressed || keys.just_pressed(KeyCode::Escape) {
        queue.push(SessionCommand::Exit);
    }
}

/// Gives newly spawned obstacles a sphere mesh.
pub fn attach_obstacle_meshes(
    mut commands: Commands,
    added: Query<(Entity, &Obstacle), Added<Obstacle>>,
    session: Option<Res<SessionRes>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(res) = session else {
        return;
    };
    let color = to_bevy_color(res.session.config().obstacle.color);
    for (entity, obstacle) in &added {
        commands.entity(entity).insert((
            Mesh3d(meshes.add(Sphere::new(obstacle.radius))),
            MeshMaterial3d(materials.add(StandardMaterial::from(color))),
        ));
    }
}

/// Mirrors HUD label text and fade/slide transitions, and the exit control.
pub fn update_hud(
    session: Option<Res<SessionRes>>,
    mut labels: Query<(&HudLabel, &mut Text, &mut TextColor, &ChildOf)>,
    mut rows: Query<&mut Node, Without<ExitButton>>,
    mut exit_button: Query<&mut Visibility, With<ExitButton>>,
) {
    let Some(res) = session else {
        return;
    };
    let hud = res.session.hud();
    let now = res.session.clock();

    for (which, mut text, mut color, parent) in &mut labels {
        let (label, base_top): (&Label, Val) = match which {
            HudLabel::Top => (hud.top(), Val::Px(TOP_LABEL_PX)),
            HudLabel::Middle => (hud.middle(), Val::Percent(MIDDLE_LABEL_PERCENT)),
        };
        if text.0 != label.text() {
            text.0 = label.text().to_string();
        }
        let progress = label.progress(now);
        color.0.set_alpha(progress);

        if let Ok(mut row) = rows.get_mut(parent.parent()) {
            let slide = (1.0 - progress) * LABEL_SLIDE_PX;
            row.margin = UiRect::top(Val::Px(-slide));
            row.top = base_top;
        }
    }

    let wanted = if hud.exit_visible() {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut visibility in &mut exit_button {
        if *visibility != wanted {
            *visibility = wanted;
        }
    }
}
