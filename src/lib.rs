//! This is a plugin for Bevy game engine to setup and handle the logic for calculating a single grid-wide pathfinding FlowField shared by a crowd of actors
//!

pub mod flowfields;
pub mod plugin;

pub mod prelude;
