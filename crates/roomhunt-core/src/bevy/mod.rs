//! Bevy integration for roomhunt.
//!
//! The session stays the source of truth. ECS resources wrap it, systems feed
//! it inputs and time, and entities mirror the scene nodes that need drawing.
//! Rendering, window input and HUD systems are gated behind `windowed`.

pub mod components;
pub mod events;
pub mod plugin;
pub mod resources;
pub mod systems;

#[cfg(feature = "windowed")]
pub mod render;

#[cfg(test)]
pub(crate) mod test_utils;

pub use components::*;
pub use events::*;
#[cfg(feature = "windowed")]
pub use plugin::RoomHuntPlugin;
pub use plugin::RoomHuntHeadlessPlugin;
pub use resources::*;
