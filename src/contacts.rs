//! Contact point recorder.
//!
//! Filled from the simulation's presolve callback during `step` and drained
//! once per render frame.  The buffer is allocated once at construction and
//! never grows: once full, further points are dropped until the next
//! [`ContactRecorder::reset`].

use std::sync::Arc;

use bevy::prelude::*;
use parking_lot::Mutex;

use crate::physics::{point_states, Contact, Manifold, PointState};

/// One classified contact point, in simulation units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactPoint {
    pub position: Vec2,
    pub normal: Vec2,
    pub state: PointState,
}

/// Recorder shared between the debug view and the presolve callback.
pub type SharedContactRecorder = Arc<Mutex<ContactRecorder>>;

#[derive(Debug)]
pub struct ContactRecorder {
    points: Vec<ContactPoint>,
    count: usize,
    enabled: bool,
}

impl ContactRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: vec![ContactPoint::default(); capacity],
            count: 0,
            enabled: false,
        }
    }

    pub fn shared(capacity: usize) -> SharedContactRecorder {
        Arc::new(Mutex::new(Self::new(capacity)))
    }

    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.points.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Points recorded since the last reset.
    pub fn points(&self) -> &[ContactPoint] {
        &self.points[..self.count]
    }

    /// Presolve hook: classify the new manifold's points against `old_manifold`
    /// and append them while there is room.
    pub fn record_pre_solve(&mut self, contact: &Contact, old_manifold: &Manifold) {
        if !self.enabled || contact.manifold.point_count == 0 {
            return;
        }

        let (_, new_states) = point_states(old_manifold, &contact.manifold);
        let world = &contact.world_manifold;

        for (i, state) in new_states
            .iter()
            .enumerate()
            .take(contact.manifold.points().len())
        {
            if self.is_full() {
                return;
            }
            self.points[self.count] = ContactPoint {
                position: world.points[i],
                normal: world.normal,
                state: *state,
            };
            self.count += 1;
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}
