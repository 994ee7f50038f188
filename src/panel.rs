//! Text panel with world counters and step timings.

use bevy::prelude::*;

use crate::constants::{DEBUG_PANEL_COLUMN_OFFSET, DEBUG_PANEL_POSITION};
use crate::physics::{PhysicsWorld, StepProfile};
use crate::text::StringQueue;

/// Object counts read from the world for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelCounters {
    pub bodies: usize,
    pub fixtures: usize,
    pub contacts: usize,
    pub joints: usize,
    pub controllers: usize,
    pub proxies: usize,
}

impl PanelCounters {
    pub fn gather<W: PhysicsWorld + ?Sized>(world: &W) -> Self {
        Self {
            bodies: world.bodies().len(),
            fixtures: world.bodies().iter().map(|b| b.fixtures.len()).sum(),
            contacts: world.contact_count(),
            joints: world.joints().len(),
            controllers: world.controllers().len(),
            proxies: world.proxy_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugPanel {
    /// Top-left of the counters block, display units.
    pub position: Vec2,
    /// Offset of the timings block from `position`.
    pub column_offset: f32,
}

impl Default for DebugPanel {
    fn default() -> Self {
        Self {
            position: Vec2::from(DEBUG_PANEL_POSITION),
            column_offset: DEBUG_PANEL_COLUMN_OFFSET,
        }
    }
}

impl DebugPanel {
    pub fn render<W: PhysicsWorld + ?Sized>(&self, world: &W, strings: &mut StringQueue, color: Color) {
        let counters = PanelCounters::gather(world);
        strings.push(self.position, format_counters(&counters), color);

        let timings = self.position + Vec2::new(self.column_offset, 0.0);
        strings.push(timings, format_profile(&world.profile()), color);
    }
}

fn format_counters(c: &PanelCounters) -> String {
    format!(
        "Objects:\n- Bodies: {}\n- Fixtures: {}\n- Contacts: {}\n- Joints: {}\n- Controllers: {}\n- Proxies: {}",
        c.bodies, c.fixtures, c.contacts, c.joints, c.controllers, c.proxies
    )
}

fn format_profile(p: &StepProfile) -> String {
    format!(
        "Update time:\n- Body: {:.2} ms\n- Contact: {:.2} ms\n- CCD: {:.2} ms\n- Joint: {:.2} ms\n- Controller: {:.2} ms\n- Total: {:.2} ms",
        p.body_ms, p.contact_ms, p.ccd_ms, p.joint_ms, p.controller_ms, p.total_ms
    )
}
