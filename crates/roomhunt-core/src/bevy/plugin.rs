//! Bevy plugins for the room hunt game.
//!
//! Provides:
//! - `RoomHuntHeadlessPlugin`: Logic-only plugin (no rendering/window dependencies) for headless testing
//! - `RoomHuntPlugin`: `RoomHuntHeadlessPlugin` + window input, 3D scene and HUD (feature `windowed`)

use bevy::prelude::*;

use crate::bevy::events::*;
use crate::bevy::resources::*;
use crate::bevy::systems;
use crate::physics::PHYSICS_DT;

// ============================================================================
// Headless Plugin (logic only, no rendering/window dependencies)
// ============================================================================

/// Headless plugin containing all game logic without rendering or window dependencies.
///
/// Use this plugin in tests with `MinimalPlugins` to run ECS systems
/// without requiring a windowing or rendering backend. Keyboard motion
/// simulation additionally needs `InputPlugin`.
pub struct RoomHuntHeadlessPlugin {
    pub setup: SessionSetup,
    pub command_queue: Option<CommandQueue>,
    /// Drive the motion stream from the arrow keys.
    pub simulate_motion: bool,
}

impl Default for RoomHuntHeadlessPlugin {
    fn default() -> Self {
        Self {
            setup: SessionSetup::default(),
            command_queue: None,
            simulate_motion: false,
        }
    }
}

impl Plugin for RoomHuntHeadlessPlugin {
    fn build(&self, app: &mut App) {
        // ====================================================================
        // Physics
        // ====================================================================
        app.insert_resource(Time::<Fixed>::from_seconds(f64::from(PHYSICS_DT)));

        // ====================================================================
        // Resources
        // ====================================================================
        app.insert_resource(self.setup.clone())
            .insert_resource(self.command_queue.clone().unwrap_or_default());
        if self.simulate_motion {
            app.insert_resource(SimulatedDevice::new(
                self.setup.config.motion.sample_interval(),
            ));
        }

        // ====================================================================
        // Messages
        // ====================================================================
        app.add_message::<TargetChangedEvent>()
            .add_message::<FeedbackEvent>()
            .add_message::<FeedbackClearedEvent>()
            .add_message::<ObstacleSpawnedEvent>()
            .add_message::<GameCompleteEvent>()
            .add_message::<ExitRequestedEvent>();

        // ====================================================================
        // Systems
        // ====================================================================
        app.add_systems(
            Startup,
            (systems::start_session, systems::spawn_room_root),
        );

        app.add_systems(FixedUpdate, systems::step_session_physics);

        app.add_systems(
            Update,
            (
                systems::simulate_device_motion.run_if(resource_exists::<SimulatedDevice>),
                systems::process_commands,
                systems::advance_session_clock,
                systems::publish_session_events,
                systems::spawn_obstacle_entities,
                systems::sync_node_transforms,
                systems::exit_on_request,
            )
                .chain(),
        );
    }
}

// ============================================================================
// Windowed Plugin (headless + input, rendering and HUD)
// ============================================================================

/// Full interactive plugin. Requires `DefaultPlugins`.
#[cfg(feature = "windowed")]
#[derive(Default)]
pub struct RoomHuntPlugin {
    pub setup: SessionSetup,
    pub command_queue: Option<CommandQueue>,
}

#[cfg(feature = "windowed")]
impl Plugin for RoomHuntPlugin {
    fn build(&self, app: &mut App) {
        use crate::bevy::render;

        app.add_plugins(RoomHuntHeadlessPlugin {
            setup: self.setup.clone(),
            command_queue: self.command_queue.clone(),
            simulate_motion: true,
        });

        app.insert_resource(ClearColor(Color::srgb(0.08, 0.08, 0.1)));

        app.add_systems(PreStartup, render::use_window_viewport);
        app.add_systems(
            Startup,
            (render::spawn_scene_entities, render::spawn_hud)
                .after(systems::start_session)
                .after(systems::spawn_room_root),
        );
        app.add_systems(
            Update,
            (
                render::handle_pointer_input,
                render::track_window_size,
                render::handle_exit_input,
            )
                .before(systems::process_commands),
        );
        app.add_systems(
            Update,
            (render::attach_obstacle_meshes, render::update_hud)
                .after(systems::spawn_obstacle_entities),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::input::keyboard::KeyCode;

    use super::*;
    use crate::bevy::components::RoomRoot;
    use crate::bevy::test_utils::TestApp;
    use crate::hud::{CORRECT_TEXT, RETRY_TEXT};
    use crate::sequence::SequencePhase;

    /// Through the candles on the table, in the default room at 800x600.
    const CANDLES_TAP: (f32, f32) = (400.0, 397.4);
    /// Top-left corner: ceiling only.
    const MISS_TAP: (f32, f32) = (0.0, 0.0);

    #[test]
    fn test_session_starts_headless() {
        let mut app = TestApp::with_targets(&["Candles", "Table"]);

        assert!(app.world().get_resource::<SessionRes>().is_some());
        let roots = app
            .world_mut()
            .query_filtered::<Entity, With<RoomRoot>>()
            .iter(app.world())
            .count();
        assert_eq!(roots, 1);
        assert_eq!(app.session().current_target(), None);
    }

    #[test]
    fn test_invalid_config_exits_with_error() {
        let app = TestApp::with_targets(&[]);

        assert!(app.world().get_resource::<SessionRes>().is_none());
        assert!(matches!(app.app.should_exit(), Some(AppExit::Error(_))));
    }

    #[test]
    fn test_first_target_after_start_delay() {
        let mut app = TestApp::with_targets(&["Candles", "Table"]);

        app.advance_secs(0.7);
        assert_eq!(app.session().current_target(), None);

        app.advance_secs(0.5);
        assert_eq!(app.session().current_target(), Some("Candles"));
        assert_eq!(app.session().hud().top().text(), "Candles");
    }

    #[test]
    fn test_correct_tap_advances_after_one_second() {
        let mut app = TestApp::with_targets(&["Candles", "Table"]);
        app.advance_secs(1.2);

        app.tap(CANDLES_TAP);
        assert_eq!(app.session().hud().middle().text(), CORRECT_TEXT);
        assert!(app.session().is_locked());

        app.advance_secs(0.7);
        assert_eq!(app.session().current_target(), Some("Candles"));

        app.advance_secs(0.5);
        assert_eq!(app.session().current_target(), Some("Table"));
        assert!(!app.session().is_locked());
    }

    #[test]
    fn test_miss_spawns_obstacle_entity() {
        let mut app = TestApp::with_targets(&["Candles"]);
        app.advance_secs(1.2);

        app.tap(MISS_TAP);
        app.update();

        assert_eq!(app.session().hud().middle().text(), RETRY_TEXT);
        assert_eq!(app.session().obstacle_count(), 1);
        assert_eq!(app.obstacle_translations().len(), 1);

        app.advance_secs(1.0);
        let z = app.obstacle_translations()[0].z;
        assert!(z < 50.0, "obstacle should fall, z={z}");
        assert_eq!(app.session().phase(), SequencePhase::InProgress(0));
    }

    #[test]
    fn test_tap_while_locked_is_dropped() {
        let mut app = TestApp::with_targets(&["Candles", "Table"]);
        app.advance_secs(1.2);

        app.push_command(SessionCommand::Tap {
            x: CANDLES_TAP.0,
            y: CANDLES_TAP.1,
        });
        app.push_command(SessionCommand::Tap {
            x: MISS_TAP.0,
            y: MISS_TAP.1,
        });
        app.update();

        assert_eq!(app.session().obstacle_count(), 0);
        assert_eq!(app.session().hud().middle().text(), CORRECT_TEXT);
    }

    #[test]
    fn test_exit_after_completion() {
        let mut app = TestApp::with_targets(&["Candles"]);
        app.advance_secs(1.2);

        app.push_command(SessionCommand::Exit);
        app.update();
        assert!(app.app.should_exit().is_none());

        app.tap(CANDLES_TAP);
        app.advance_secs(1.2);
        assert!(app.session().hud().exit_visible());

        app.push_command(SessionCommand::Exit);
        app.update();
        assert_eq!(app.app.should_exit(), Some(AppExit::Success));
        assert!(!app.session().is_live());
    }

    #[test]
    fn test_simulated_device_turns_camera() {
        let mut app = TestApp::with_targets(&["Candles"]);
        let camera = app.session().camera();
        let base = app.session().scene().node(camera).unwrap().rotation;

        app.advance_secs(0.2);
        app.press(KeyCode::ArrowLeft);
        app.advance_secs(0.5);

        assert!(app.session().motion().reference().is_some());
        let rotation = app.session().scene().node(camera).unwrap().rotation;
        assert!(rotation.angle_between(base) > 0.1);
    }

    #[test]
    fn test_fixed_step_matches_physics_dt() {
        let app = TestApp::with_targets(&["Candles"]);
        let fixed = app.world().resource::<Time<Fixed>>();
        assert_eq!(fixed.timestep(), Duration::from_secs_f64(f64::from(PHYSICS_DT)));
    }
}
