//! Debug visualization and world-step driver for 2D rigid-body simulations.
//!
//! The debug view walks a [`physics::PhysicsWorld`] each frame and turns its
//! shapes, joints, contacts, bounding boxes and controllers into batched
//! vertices plus queued text, with an optional stats panel and rolling
//! performance graph. The world stepper advances the simulation by a clamped
//! delta and drives a temporary mouse joint for drag interaction.
//!
//! [`simulation::PhysicsDebugPlugin`] wires both into a Bevy app.

pub mod batch;
pub mod config;
pub mod constants;
pub mod contacts;
pub mod controls;
pub mod debug_view;
pub mod draw;
pub mod error;
pub mod graph;
pub mod graphics;
pub mod panel;
pub mod physics;
pub mod rapier_world;
pub mod rendering;
pub mod simulation;
pub mod stepper;
#[cfg(test)]
pub(crate) mod testing;
pub mod text;
pub mod units;
