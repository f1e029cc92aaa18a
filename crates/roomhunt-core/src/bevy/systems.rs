//! Headless systems: session lifecycle, command processing, clock, physics
//! and the entity mirror of dynamic scene nodes.

use bevy::prelude::*;

use crate::bevy::components::{Obstacle, RoomRoot, SceneNodeRef};
use crate::bevy::events::*;
use crate::bevy::resources::{
    CommandQueue, SessionCommand, SessionRes, SessionSetup, SimulatedDevice,
};
use crate::hit_test::Viewport;
use crate::session::{GameSession, SessionEvent};

/// Starts the session from [`SessionSetup`]. Startup errors are fatal and
/// request an error exit.
pub fn start_session(
    mut commands: Commands,
    setup: Res<SessionSetup>,
    mut exit: MessageWriter<AppExit>,
) {
    match GameSession::start(setup.config.clone(), &setup.asset, setup.viewport) {
        Ok(session) => {
            commands.insert_resource(SessionRes::new(session));
        }
        Err(err) => {
            tracing::error!("[session] failed to start: {}", err);
            exit.write(AppExit::error());
        }
    }
}

pub fn spawn_room_root(mut commands: Commands) {
    commands.spawn((RoomRoot, RoomRoot::transform(), Name::new("RoomRoot")));
}

/// Applies queued inputs to the session in arrival order.
pub fn process_commands(queue: Res<CommandQueue>, session: Option<ResMut<SessionRes>>) {
    let Some(mut res) = session else {
        return;
    };
    let session = &mut res.session;

    for command in queue.drain() {
        match command {
            SessionCommand::Tap { x, y } => {
                let outcome = session.tap(Vec2::new(x, y));
                tracing::debug!("[command] Tap ({:.1}, {:.1}) -> {:?}", x, y, outcome);
            }
            SessionCommand::Motion(sample) => {
                session.on_motion(sample.as_ref());
            }
            SessionCommand::Resize { width, height } => {
                tracing::debug!("[command] Resize {}x{}", width, height);
                session.set_viewport(Viewport::new(width, height));
            }
            SessionCommand::Exit => {
                if !session.request_exit() {
                    tracing::debug!("[command] Exit ignored, game not complete");
                }
            }
        }
    }
}

/// Runs deferred session work against virtual time.
pub fn advance_session_clock(time: Res<Time>, session: Option<ResMut<SessionRes>>) {
    if let Some(mut res) = session {
        res.session.advance_clock(time.delta());
    }
}

/// Fixed-step physics for obstacles.
pub fn step_session_physics(session: Option<ResMut<SessionRes>>) {
    if let Some(mut res) = session {
        res.session.step_physics();
    }
}

/// Forwards drained session events as messages.
pub fn publish_session_events(
    session: Option<ResMut<SessionRes>>,
    mut target_changed: MessageWriter<TargetChangedEvent>,
    mut feedback: MessageWriter<FeedbackEvent>,
    mut feedback_cleared: MessageWriter<FeedbackClearedEvent>,
    mut obstacle_spawned: MessageWriter<ObstacleSpawnedEvent>,
    mut game_complete: MessageWriter<GameCompleteEvent>,
    mut exit_requested: MessageWriter<ExitRequestedEvent>,
) {
    let Some(mut res) = session else {
        return;
    };
    for event in res.session.drain_events() {
        match event {
            SessionEvent::TargetChanged { index, target } => {
                target_changed.write(TargetChangedEvent { index, target });
            }
            SessionEvent::Feedback { text } => {
                feedback.write(FeedbackEvent { text });
            }
            SessionEvent::FeedbackCleared => {
                feedback_cleared.write(FeedbackClearedEvent);
            }
            SessionEvent::ObstacleSpawned { node, position } => {
                obstacle_spawned.write(ObstacleSpawnedEvent { node, position });
            }
            SessionEvent::GameComplete => {
                game_complete.write(GameCompleteEvent);
            }
            SessionEvent::ExitRequested => {
                exit_requested.write(ExitRequestedEvent);
            }
        }
    }
}

/// Spawns an entity under the room root for every new obstacle.
pub fn spawn_obstacle_entities(
    mut commands: Commands,
    mut events: MessageReader<ObstacleSpawnedEvent>,
    roots: Query<Entity, With<RoomRoot>>,
    session: Option<Res<SessionRes>>,
) {
    let Some(res) = session else {
        return;
    };
    let Ok(root) = roots.single() else {
        return;
    };
    let radius = res.session.config().obstacle.radius;
    for event in events.read() {
        commands.spawn((
            Obstacle { radius },
            SceneNodeRef(event.node),
            Transform::from_translation(event.position),
            ChildOf(root),
        ));
    }
}

/// Copies scene-space node transforms onto their mirror entities.
pub fn sync_node_transforms(
    session: Option<Res<SessionRes>>,
    mut nodes: Query<(&SceneNodeRef, &mut Transform)>,
) {
    let Some(res) = session else {
        return;
    };
    let scene = res.session.scene();
    for (node_ref, mut transform) in &mut nodes {
        let (_, rotation, translation) = scene
            .world_transform(node_ref.0)
            .to_scale_rotation_translation();
        if transform.translation != translation || transform.rotation != rotation {
            transform.translation = translation;
            transform.rotation = rotation;
        }
    }
}

/// Turns arrow keys into motion samples at the sampling interval.
///
/// Up/Down pitch, Left/Right yaw, Q/E roll.
pub fn simulate_device_motion(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut device: ResMut<SimulatedDevice>,
    queue: Res<CommandQueue>,
) {
    let step = device.turn_rate * time.delta_secs_f64();
    let axis = |positive: KeyCode, negative: KeyCode| -> f64 {
        f64::from(i8::from(keys.pressed(positive)) - i8::from(keys.pressed(negative)))
    };
    let pitch = axis(KeyCode::ArrowUp, KeyCode::ArrowDown) * step;
    let yaw = axis(KeyCode::ArrowLeft, KeyCode::ArrowRight) * step;
    let roll = axis(KeyCode::KeyE, KeyCode::KeyQ) * step;
    device.attitude.pitch += pitch;
    device.attitude.yaw += yaw;
    device.attitude.roll += roll;

    device.timer.tick(time.delta());
    if device.timer.just_finished() {
        queue.push(SessionCommand::Motion(Some(device.sample())));
    }
}

/// Ends the app once the player took the exit action.
pub fn exit_on_request(
    mut events: MessageReader<ExitRequestedEvent>,
    mut exit: MessageWriter<AppExit>,
) {
    if events.read().next().is_some() {
        tracing::info!("[session] exit requested");
        exit.write(AppExit::Success);
    }
}
