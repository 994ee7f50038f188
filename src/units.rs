//! Conversion between simulation units (meters) and display units (pixels).
//!
//! Everything read from the simulation goes through [`UnitConverter::to_display`]
//! before it reaches a batch sink; every pointer position goes through
//! [`UnitConverter::to_sim`] before it reaches the simulation.

use bevy::math::bounding::Aabb2d;
use bevy::prelude::*;

use crate::constants::DISPLAY_PER_SIM;

/// A value that can be uniformly scaled between unit systems.
pub trait Scalable: Copy {
    fn scaled(self, factor: f32) -> Self;
}

impl Scalable for f32 {
    #[inline]
    fn scaled(self, factor: f32) -> Self {
        self * factor
    }
}

impl Scalable for Vec2 {
    #[inline]
    fn scaled(self, factor: f32) -> Self {
        self * factor
    }
}

impl Scalable for Aabb2d {
    #[inline]
    fn scaled(self, factor: f32) -> Self {
        Aabb2d {
            min: self.min * factor,
            max: self.max * factor,
        }
    }
}

/// Single global scale between simulation space and display space.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    display_per_sim: f32,
}

impl UnitConverter {
    /// Converter for passes whose input is already in display units.
    pub const IDENTITY: Self = Self {
        display_per_sim: 1.0,
    };

    /// Build a converter; `display_per_sim` must be positive (validated by config).
    pub fn new(display_per_sim: f32) -> Self {
        Self { display_per_sim }
    }

    pub fn display_per_sim(&self) -> f32 {
        self.display_per_sim
    }

    pub fn sim_per_display(&self) -> f32 {
        1.0 / self.display_per_sim
    }

    #[inline]
    pub fn to_display<T: Scalable>(&self, value: T) -> T {
        value.scaled(self.display_per_sim)
    }

    #[inline]
    pub fn to_sim<T: Scalable>(&self, value: T) -> T {
        value.scaled(self.sim_per_display())
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::new(DISPLAY_PER_SIM)
    }
}
