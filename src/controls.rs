//! Keyboard toggles for the debug view and the step driver.
//!
//! | Key   | Effect                    |
//! |-------|---------------------------|
//! | F1    | Shapes                    |
//! | F2    | Joints                    |
//! | F3    | AABBs                     |
//! | F4    | Centres of mass           |
//! | F5    | Debug panel               |
//! | F6    | Contact points            |
//! | F7    | Contact normals           |
//! | F8    | Polygon points            |
//! | F9    | Performance graph         |
//! | F10   | Controllers               |
//! | Space | Pause / resume stepping   |

use bevy::input::ButtonInput;
use bevy::prelude::*;

use crate::debug_view::{DebugView, DebugViewFlags};
use crate::stepper::WorldStepper;

/// One hotkey-bound debug view channel.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FlagToggle {
    Shape,
    Joint,
    Aabb,
    CenterOfMass,
    DebugPanel,
    ContactPoints,
    ContactNormals,
    PolygonPoints,
    PerformanceGraph,
    Controllers,
}

impl FlagToggle {
    pub const ALL: [Self; 10] = [
        Self::Shape,
        Self::Joint,
        Self::Aabb,
        Self::CenterOfMass,
        Self::DebugPanel,
        Self::ContactPoints,
        Self::ContactNormals,
        Self::PolygonPoints,
        Self::PerformanceGraph,
        Self::Controllers,
    ];

    pub fn flag(self) -> DebugViewFlags {
        match self {
            Self::Shape => DebugViewFlags::SHAPE,
            Self::Joint => DebugViewFlags::JOINT,
            Self::Aabb => DebugViewFlags::AABB,
            Self::CenterOfMass => DebugViewFlags::CENTER_OF_MASS,
            Self::DebugPanel => DebugViewFlags::DEBUG_PANEL,
            Self::ContactPoints => DebugViewFlags::CONTACT_POINTS,
            Self::ContactNormals => DebugViewFlags::CONTACT_NORMALS,
            Self::PolygonPoints => DebugViewFlags::POLYGON_POINTS,
            Self::PerformanceGraph => DebugViewFlags::PERFORMANCE_GRAPH,
            Self::Controllers => DebugViewFlags::CONTROLLERS,
        }
    }

    pub fn key(self) -> KeyCode {
        match self {
            Self::Shape => KeyCode::F1,
            Self::Joint => KeyCode::F2,
            Self::Aabb => KeyCode::F3,
            Self::CenterOfMass => KeyCode::F4,
            Self::DebugPanel => KeyCode::F5,
            Self::ContactPoints => KeyCode::F6,
            Self::ContactNormals => KeyCode::F7,
            Self::PolygonPoints => KeyCode::F8,
            Self::PerformanceGraph => KeyCode::F9,
            Self::Controllers => KeyCode::F10,
        }
    }

    /// Human-readable label used in log output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Shape => "Shapes",
            Self::Joint => "Joints",
            Self::Aabb => "AABBs",
            Self::CenterOfMass => "Centres of Mass",
            Self::DebugPanel => "Debug Panel",
            Self::ContactPoints => "Contact Points",
            Self::ContactNormals => "Contact Normals",
            Self::PolygonPoints => "Polygon Points",
            Self::PerformanceGraph => "Performance Graph",
            Self::Controllers => "Controllers",
        }
    }

    pub fn get(self, view: &DebugView) -> bool {
        view.flags().contains(self.flag())
    }

    pub fn toggle(self, view: &mut DebugView) {
        if self.get(view) {
            view.remove_flags(self.flag());
        } else {
            view.append_flags(self.flag());
        }
    }
}

/// Flip debug view channels on F1–F10 and stepping on Space.
pub fn debug_hotkey_system(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut view: ResMut<DebugView>,
    mut stepper: ResMut<WorldStepper>,
) {
    let Some(keys) = keys else {
        return;
    };
    for toggle in FlagToggle::ALL {
        if keys.just_pressed(toggle.key()) {
            toggle.toggle(&mut view);
            info!(
                "{}: {}",
                toggle.label(),
                if toggle.get(&view) { "ON" } else { "OFF" }
            );
        }
    }
    if keys.just_pressed(KeyCode::Space) {
        stepper.enabled = !stepper.enabled;
        info!("Stepping {}", if stepper.enabled { "resumed" } else { "paused" });
    }
}
