//! Shape/joint draw dispatcher.
//!
//! [`DrawContext`] turns simulation geometry into colored vertices for a
//! [`PrimitiveBatch`].  Every helper takes its inputs in the context's source
//! space (simulation units for world passes, display units for the graph pass)
//! and converts on emission, so nothing upstream has to think about pixels.
//!
//! | Helper             | Topology  | Notes                                   |
//! |--------------------|-----------|-----------------------------------------|
//! | `segment`          | lines     | one pair                                |
//! | `polygon`          | lines     | optional closing edge                   |
//! | `solid_polygon`    | triangles | fan from vertex 0, half alpha outlined  |
//! | `circle`           | lines     | `circle_segments` pairs                 |
//! | `solid_circle`     | both      | fan + outline + orientation radius      |
//! | `point`            | both      | solid square marker                     |
//! | `aabb`             | lines     | closed 4-vertex outline                 |
//! | `transform`        | lines     | red x axis, green y axis                |

use std::f32::consts::TAU;

use bevy::color::Alpha;
use bevy::math::bounding::Aabb2d;
use bevy::prelude::*;

use crate::batch::{PrimitiveBatch, PrimitiveKind};
use crate::constants::{
    JOINT_COLOR, MOUSE_ANCHOR_COLOR, MOUSE_ANCHOR_MARKER_SIZE, MOUSE_LINE_COLOR,
    REVOLUTE_ANCHOR_A_COLOR, REVOLUTE_ANCHOR_B_COLOR, REVOLUTE_ANCHOR_RADIUS,
    TRANSFORM_AXIS_SCALE,
};
use crate::physics::{Joint, JointKind, PhysicsWorld, Shape};
use crate::units::UnitConverter;

/// Fill alpha multiplier for outlined solids.
const FILL_ALPHA: f32 = 0.5;

/// Colors used by [`DrawContext::joint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointColors {
    pub joint: Color,
    pub mouse_anchor: Color,
    pub mouse_line: Color,
    pub revolute_anchor_a: Color,
    pub revolute_anchor_b: Color,
}

impl Default for JointColors {
    fn default() -> Self {
        Self {
            joint: srgba(JOINT_COLOR),
            mouse_anchor: srgba(MOUSE_ANCHOR_COLOR),
            mouse_line: srgba(MOUSE_LINE_COLOR),
            revolute_anchor_a: srgba(REVOLUTE_ANCHOR_A_COLOR),
            revolute_anchor_b: srgba(REVOLUTE_ANCHOR_B_COLOR),
        }
    }
}

/// Build a [`Color`] from an sRGBA array.
pub fn srgba(c: [f32; 4]) -> Color {
    Color::srgba(c[0], c[1], c[2], c[3])
}

pub struct DrawContext<'a, B: PrimitiveBatch + ?Sized> {
    batch: &'a mut B,
    units: UnitConverter,
    circle_segments: u32,
    scratch: &'a mut Vec<Vec2>,
}

impl<'a, B: PrimitiveBatch + ?Sized> DrawContext<'a, B> {
    /// `circle_segments` is clamped to at least 3.
    pub fn new(
        batch: &'a mut B,
        units: UnitConverter,
        circle_segments: u32,
        scratch: &'a mut Vec<Vec2>,
    ) -> Self {
        Self {
            batch,
            units,
            circle_segments: circle_segments.max(3),
            scratch,
        }
    }

    pub fn units(&self) -> UnitConverter {
        self.units
    }

    /// Close the pass this context was opened for.
    pub fn end(self) {
        self.batch.end();
    }

    #[inline]
    fn emit(&mut self, p: Vec2, color: Color, kind: PrimitiveKind) {
        self.batch.add_vertex(self.units.to_display(p), color, kind);
    }

    // ── Primitives ────────────────────────────────────────────────────────────

    pub fn segment(&mut self, a: Vec2, b: Vec2, color: Color) {
        self.emit(a, color, PrimitiveKind::Line);
        self.emit(b, color, PrimitiveKind::Line);
    }

    pub fn polygon(&mut self, vertices: &[Vec2], color: Color, closed: bool) {
        for pair in vertices.windows(2) {
            self.segment(pair[0], pair[1], color);
        }
        if closed && vertices.len() > 2 {
            self.segment(vertices[vertices.len() - 1], vertices[0], color);
        }
    }

    pub fn solid_polygon(&mut self, vertices: &[Vec2], color: Color, outline: bool) {
        match vertices.len() {
            0 | 1 => return,
            2 => {
                self.polygon(vertices, color, true);
                return;
            }
            _ => {}
        }

        let fill = if outline {
            color.with_alpha(color.alpha() * FILL_ALPHA)
        } else {
            color
        };
        for i in 1..vertices.len() - 1 {
            self.emit(vertices[0], fill, PrimitiveKind::Triangle);
            self.emit(vertices[i], fill, PrimitiveKind::Triangle);
            self.emit(vertices[i + 1], fill, PrimitiveKind::Triangle);
        }

        if outline {
            self.polygon(vertices, color, true);
        }
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let step = TAU / self.circle_segments as f32;
        for i in 0..self.circle_segments {
            let a = center + radius * Vec2::from_angle(step * i as f32);
            let b = center + radius * Vec2::from_angle(step * (i + 1) as f32);
            self.segment(a, b, color);
        }
    }

    /// Filled circle with an orientation line from `center` along `axis`.
    pub fn solid_circle(&mut self, center: Vec2, radius: f32, axis: Vec2, color: Color) {
        let fill = color.with_alpha(color.alpha() * FILL_ALPHA);
        let step = TAU / self.circle_segments as f32;
        for i in 0..self.circle_segments {
            let a = center + radius * Vec2::from_angle(step * i as f32);
            let b = center + radius * Vec2::from_angle(step * (i + 1) as f32);
            self.emit(center, fill, PrimitiveKind::Triangle);
            self.emit(a, fill, PrimitiveKind::Triangle);
            self.emit(b, fill, PrimitiveKind::Triangle);
        }
        self.circle(center, radius, color);
        self.segment(center, center + radius * axis, color);
    }

    /// Solid square of side `size` centered on `p`.
    pub fn point(&mut self, p: Vec2, size: f32, color: Color) {
        let h = size * 0.5;
        let corners = [
            p + Vec2::new(-h, -h),
            p + Vec2::new(h, -h),
            p + Vec2::new(h, h),
            p + Vec2::new(-h, h),
        ];
        self.solid_polygon(&corners, color, true);
    }

    pub fn aabb(&mut self, aabb: Aabb2d, color: Color) {
        let corners = [
            aabb.min,
            Vec2::new(aabb.max.x, aabb.min.y),
            aabb.max,
            Vec2::new(aabb.min.x, aabb.max.y),
        ];
        self.polygon(&corners, color, true);
    }

    pub fn transform(&mut self, xf: Isometry2d) {
        let p = xf.translation;
        self.segment(p, p + TRANSFORM_AXIS_SCALE * (xf.rotation * Vec2::X), Color::srgb(1.0, 0.0, 0.0));
        self.segment(p, p + TRANSFORM_AXIS_SCALE * (xf.rotation * Vec2::Y), Color::srgb(0.0, 1.0, 0.0));
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Draw `shape` placed by `xf`.
    pub fn shape(&mut self, shape: &Shape, xf: Isometry2d, color: Color) {
        match shape {
            Shape::Circle { center, radius } => {
                let c = xf.transform_point(*center);
                let axis = xf.rotation * Vec2::X;
                self.solid_circle(c, *radius, axis, color);
            }
            Shape::Polygon { vertices } => {
                let mut world = std::mem::take(self.scratch);
                world.clear();
                world.extend(vertices.iter().map(|v| xf.transform_point(*v)));
                self.solid_polygon(&world, color, true);
                *self.scratch = world;
            }
            Shape::Edge { v1, v2 } => {
                let a = xf.transform_point(*v1);
                let b = xf.transform_point(*v2);
                self.segment(a, b, color);
            }
            Shape::Chain { vertices } => {
                for pair in vertices.windows(2) {
                    let a = xf.transform_point(pair[0]);
                    let b = xf.transform_point(pair[1]);
                    self.segment(a, b, color);
                }
            }
        }
    }

    /// Draw `joint` using body state from `world`.
    ///
    /// Disabled joints and joints whose body A is gone draw nothing.
    pub fn joint<W: PhysicsWorld + ?Sized>(&mut self, joint: &Joint, world: &W, colors: &JointColors) {
        if !joint.enabled {
            return;
        }
        let Some(body_a) = world.body(joint.body_a) else {
            return;
        };
        let body_b = joint.body_b.and_then(|id| world.body(id));

        let x1 = body_a.position();
        let x2 = body_b.map_or(Vec2::ZERO, |b| b.position());
        let p1 = body_a.world_point(joint.local_anchor_a);
        let p2 = match joint.kind {
            JointKind::FixedMouse { target } => target,
            _ => body_b.map_or(joint.local_anchor_b, |b| b.world_point(joint.local_anchor_b)),
        };

        match joint.kind {
            JointKind::Distance => {
                self.segment(p1, p2, colors.joint);
            }
            JointKind::Pulley { pulley_a, pulley_b } => {
                let s1 = body_a.world_point(pulley_a);
                let s2 = body_b.map_or(pulley_b, |b| b.world_point(pulley_b));
                self.segment(p1, p2, colors.joint);
                self.segment(p1, s1, colors.joint);
                self.segment(p2, s2, colors.joint);
            }
            JointKind::FixedMouse { .. } => {
                self.point(p1, MOUSE_ANCHOR_MARKER_SIZE, colors.mouse_anchor);
                self.segment(p1, p2, colors.mouse_line);
            }
            JointKind::Revolute => {
                self.anchor_chain(x1, p1, p2, x2, colors.joint);
                self.solid_circle(p2, REVOLUTE_ANCHOR_RADIUS, Vec2::X, colors.revolute_anchor_b);
                self.solid_circle(p1, REVOLUTE_ANCHOR_RADIUS, Vec2::X, colors.revolute_anchor_a);
            }
            JointKind::Gear => {
                self.segment(x1, x2, colors.joint);
            }
            JointKind::Prismatic
            | JointKind::Weld
            | JointKind::Wheel
            | JointKind::Rope
            | JointKind::Friction
            | JointKind::Motor
            | JointKind::Angle => {
                self.anchor_chain(x1, p1, p2, x2, colors.joint);
            }
        }
    }

    fn anchor_chain(&mut self, x1: Vec2, p1: Vec2, p2: Vec2, x2: Vec2, color: Color) {
        self.segment(x1, p1, color);
        self.segment(p1, p2, color);
        self.segment(x2, p2, color);
    }
}
