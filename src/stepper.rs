//! World-step driver with pointer picking.
//!
//! Each frame [`WorldStepper::update`] first runs the pick state machine
//! against the pointer, then steps the world by the frame delta clamped to
//! `minimum_update_delta_time`.
//!
//! ```text
//!          press over dynamic body
//!   Idle ───────────────────────────▶ Picking { joint }
//!    ▲                                   │  held: move target
//!    └───────────────────────────────────┘
//!        release, or joint gone from world
//! ```

use bevy::prelude::*;

use crate::config::DebugViewConfig;
use crate::constants::{ENABLE_MOUSE_PICKING, MINIMUM_UPDATE_DELTA_TIME};
use crate::physics::{BodyType, JointDef, JointId, PhysicsWorld};
use crate::units::UnitConverter;

/// Pointer state for one frame, position in display units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerInput {
    pub position: Vec2,
    /// Button went down this frame.
    pub pressed: bool,
    /// Button is down.
    pub held: bool,
    /// Button went up this frame.
    pub released: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickState {
    #[default]
    Idle,
    Picking {
        joint: JointId,
    },
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct WorldStepper {
    /// Upper bound on the delta handed to `step`, seconds.
    pub minimum_update_delta_time: f32,
    pub enable_mouse_picking: bool,
    /// When false, `update` still handles the pointer but never steps.
    pub enabled: bool,
    units: UnitConverter,
    state: PickState,
}

impl Default for WorldStepper {
    fn default() -> Self {
        Self {
            minimum_update_delta_time: MINIMUM_UPDATE_DELTA_TIME,
            enable_mouse_picking: ENABLE_MOUSE_PICKING,
            enabled: true,
            units: UnitConverter::default(),
            state: PickState::Idle,
        }
    }
}

impl WorldStepper {
    pub fn new(config: &DebugViewConfig) -> Self {
        Self {
            minimum_update_delta_time: config.minimum_update_delta_time,
            enable_mouse_picking: config.enable_mouse_picking,
            enabled: true,
            units: UnitConverter::new(config.display_per_sim),
            state: PickState::Idle,
        }
    }

    pub fn with_units(mut self, units: UnitConverter) -> Self {
        self.units = units;
        self
    }

    pub fn state(&self) -> PickState {
        self.state
    }

    /// The active pick joint, if any.
    pub fn mouse_joint(&self) -> Option<JointId> {
        match self.state {
            PickState::Picking { joint } => Some(joint),
            PickState::Idle => None,
        }
    }

    /// Delta that `update` would step by for `frame_delta`.
    pub fn step_delta(&self, frame_delta: f32) -> f32 {
        frame_delta.min(self.minimum_update_delta_time).max(0.0)
    }

    /// Handle the pointer, then step.  Returns the delta applied (0 when disabled).
    pub fn update<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        frame_delta: f32,
        pointer: Option<PointerInput>,
    ) -> f32 {
        if self.enable_mouse_picking {
            if let Some(pointer) = pointer {
                self.handle_pointer(world, pointer);
            }
        }

        if !self.enabled {
            return 0.0;
        }
        let dt = self.step_delta(frame_delta);
        world.step(dt);
        dt
    }

    fn handle_pointer<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, pointer: PointerInput) {
        let target = self.units.to_sim(pointer.position);

        if pointer.pressed && self.state == PickState::Idle {
            self.pick(world, target);
        }

        if let PickState::Picking { joint } = self.state {
            if (pointer.held || pointer.pressed) && !world.set_joint_target(joint, target) {
                debug!("pick joint {:?} no longer in world", joint);
                self.state = PickState::Idle;
            }
        }

        if pointer.released {
            self.release(world);
        }
    }

    fn pick<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, target: Vec2) {
        let Some(fixture) = world.test_point(target) else {
            return;
        };
        let Some(body) = world.body(fixture.body) else {
            return;
        };
        if body.body_type != BodyType::Dynamic {
            return;
        }
        let def = JointDef::mouse(body, target);
        let joint = world.add_joint(def);
        debug!("picked body {:?} with joint {:?}", fixture.body, joint);
        self.state = PickState::Picking { joint };
    }

    /// Remove the pick joint, if any.
    pub fn release<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        if let PickState::Picking { joint } = self.state {
            if world.remove_joint(joint) {
                debug!("released pick joint {:?}", joint);
            } else {
                debug!("pick joint {:?} already gone at release", joint);
            }
        }
        self.state = PickState::Idle;
    }
}
