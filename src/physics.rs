//! Simulation collaborator interface.
//!
//! The debug view never owns the simulation.  It reads bodies, joints and
//! controllers through [`PhysicsWorld`] and calls the few mutators the step
//! driver needs.  Shapes, joints and controllers are closed enums so the draw
//! dispatcher matches them exhaustively; a new kind is a compile error in the
//! dispatcher, not a silently skipped object.
//!
//! All positions in this module are in simulation units.

use bevy::math::bounding::Aabb2d;
use bevy::prelude::*;

// ── Identifiers ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureId {
    pub body: BodyId,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub u32);

/// Broad-phase proxy handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(pub u32);

/// Handle returned by [`PhysicsWorld::subscribe_pre_solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

// ── Bodies & fixtures ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyType {
    Static,
    Kinematic,
    #[default]
    Dynamic,
}

/// Collision geometry in body-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { center: Vec2, radius: f32 },
    /// Convex polygon, counter-clockwise winding.
    Polygon { vertices: Vec<Vec2> },
    Edge { v1: Vec2, v2: Vec2 },
    /// Open polyline.
    Chain { vertices: Vec<Vec2> },
}

impl Shape {
    /// Axis-aligned bounds of the shape under `xf`.
    pub fn compute_aabb(&self, xf: Isometry2d) -> Aabb2d {
        match self {
            Shape::Circle { center, radius } => {
                let c = xf.transform_point(*center);
                Aabb2d {
                    min: c - Vec2::splat(*radius),
                    max: c + Vec2::splat(*radius),
                }
            }
            Shape::Edge { v1, v2 } => points_aabb([*v1, *v2].into_iter().map(|v| xf.transform_point(v))),
            Shape::Polygon { vertices } | Shape::Chain { vertices } => {
                points_aabb(vertices.iter().map(|v| xf.transform_point(*v)))
            }
        }
    }
}

fn points_aabb(points: impl Iterator<Item = Vec2>) -> Aabb2d {
    let mut min = Vec2::splat(f32::MAX);
    let mut max = Vec2::splat(f32::MIN);
    let mut any = false;
    for p in points {
        min = min.min(p);
        max = max.max(p);
        any = true;
    }
    if any {
        Aabb2d { min, max }
    } else {
        Aabb2d {
            min: Vec2::ZERO,
            max: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub id: FixtureId,
    pub shape: Shape,
    /// Broad-phase proxies owned by this fixture (one per child shape).
    pub proxies: Vec<ProxyId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: BodyId,
    pub body_type: BodyType,
    pub enabled: bool,
    pub awake: bool,
    pub transform: Isometry2d,
    /// Centre of mass in body-local coordinates.
    pub local_center: Vec2,
    pub fixtures: Vec<Fixture>,
}

impl Body {
    pub fn position(&self) -> Vec2 {
        self.transform.translation
    }

    pub fn world_point(&self, local: Vec2) -> Vec2 {
        self.transform.transform_point(local)
    }

    pub fn local_point(&self, world: Vec2) -> Vec2 {
        self.transform.inverse_transform_point(world)
    }

    pub fn world_center(&self) -> Vec2 {
        self.world_point(self.local_center)
    }

    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    pub fn is_kinematic(&self) -> bool {
        self.body_type == BodyType::Kinematic
    }
}

// ── Joints ────────────────────────────────────────────────────────────────────

/// Joint variant plus the data that only some variants carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointKind {
    Distance,
    /// `pulley_a` / `pulley_b` are local to body A / body B.
    Pulley { pulley_a: Vec2, pulley_b: Vec2 },
    /// Pointer-driven joint; `target` is the world-space anchor B.
    FixedMouse { target: Vec2 },
    Revolute,
    Prismatic,
    Weld,
    Wheel,
    Rope,
    Friction,
    Motor,
    Angle,
    Gear,
}

/// Everything needed to create a joint; the world assigns the id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDef {
    pub kind: JointKind,
    pub body_a: BodyId,
    /// `None` for anchor-fixed joints.
    pub body_b: Option<BodyId>,
    pub local_anchor_a: Vec2,
    /// Local to body B, or a world point when `body_b` is `None`.
    pub local_anchor_b: Vec2,
}

impl JointDef {
    /// Mouse joint grabbing `body` at world point `target`.
    pub fn mouse(body: &Body, target: Vec2) -> Self {
        Self {
            kind: JointKind::FixedMouse { target },
            body_a: body.id,
            body_b: None,
            local_anchor_a: body.local_point(target),
            local_anchor_b: target,
        }
    }

    /// Joint of `kind` between two bodies with anchors given in world space.
    pub fn between(kind: JointKind, body_a: &Body, body_b: &Body, anchor_a: Vec2, anchor_b: Vec2) -> Self {
        Self {
            kind,
            body_a: body_a.id,
            body_b: Some(body_b.id),
            local_anchor_a: body_a.local_point(anchor_a),
            local_anchor_b: body_b.local_point(anchor_b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    pub id: JointId,
    pub kind: JointKind,
    pub body_a: BodyId,
    pub body_b: Option<BodyId>,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub enabled: bool,
}

impl Joint {
    pub fn from_def(id: JointId, def: JointDef) -> Self {
        Self {
            id,
            kind: def.kind,
            body_a: def.body_a,
            body_b: def.body_b,
            local_anchor_a: def.local_anchor_a,
            local_anchor_b: def.local_anchor_b,
            enabled: true,
        }
    }

    /// Anchor-fixed joints have no second body.
    pub fn is_fixed_type(&self) -> bool {
        self.body_b.is_none()
    }
}

// ── Controllers ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerKind {
    /// Fluid volume pushing bodies whose centre lies inside `container`.
    Buoyancy {
        container: Aabb2d,
        density: f32,
        linear_drag: f32,
    },
    /// Caps body speeds.
    VelocityLimit {
        max_linear_velocity: f32,
        max_angular_velocity: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controller {
    pub enabled: bool,
    pub kind: ControllerKind,
}

// ── Contacts & manifolds ──────────────────────────────────────────────────────

/// Upper bound on points per manifold.
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// How a manifold point changed between two steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointState {
    #[default]
    None,
    Added,
    Persisted,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ManifoldPoint {
    /// Point in body A's local frame.
    pub local_point: Vec2,
    /// Contact feature key; equal keys across steps mean the same point.
    pub id: u32,
}

/// Fixed-capacity contact manifold.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Manifold {
    /// Normal in body A's local frame.
    pub local_normal: Vec2,
    pub points: [ManifoldPoint; MAX_MANIFOLD_POINTS],
    pub point_count: usize,
}

impl Manifold {
    pub fn from_points(local_normal: Vec2, points: &[ManifoldPoint]) -> Self {
        let mut manifold = Manifold {
            local_normal,
            ..Default::default()
        };
        for (slot, point) in manifold.points.iter_mut().zip(points) {
            *slot = *point;
            manifold.point_count += 1;
        }
        manifold
    }

    pub fn points(&self) -> &[ManifoldPoint] {
        &self.points[..self.point_count.min(MAX_MANIFOLD_POINTS)]
    }

    fn contains_id(&self, id: u32) -> bool {
        self.points().iter().any(|p| p.id == id)
    }
}

/// Classify points of `old` and `new` by feature id.
///
/// Returns `(old_states, new_states)`: old points are `Persisted` or
/// `Removed`; new points are `Persisted` or `Added`; unused slots are `None`.
pub fn point_states(
    old: &Manifold,
    new: &Manifold,
) -> ([PointState; MAX_MANIFOLD_POINTS], [PointState; MAX_MANIFOLD_POINTS]) {
    let mut old_states = [PointState::None; MAX_MANIFOLD_POINTS];
    let mut new_states = [PointState::None; MAX_MANIFOLD_POINTS];

    for (state, point) in old_states.iter_mut().zip(old.points()) {
        *state = if new.contains_id(point.id) {
            PointState::Persisted
        } else {
            PointState::Removed
        };
    }
    for (state, point) in new_states.iter_mut().zip(new.points()) {
        *state = if old.contains_id(point.id) {
            PointState::Persisted
        } else {
            PointState::Added
        };
    }
    (old_states, new_states)
}

/// World-space view of a manifold, computed by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldManifold {
    pub normal: Vec2,
    pub points: [Vec2; MAX_MANIFOLD_POINTS],
}

/// A touching fixture pair as reported to presolve listeners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub fixture_a: Option<FixtureId>,
    pub fixture_b: Option<FixtureId>,
    pub manifold: Manifold,
    pub world_manifold: WorldManifold,
}

/// Listener invoked once per touching pair before it is solved, with the
/// manifold from the previous step.
pub type PreSolveCallback = Box<dyn FnMut(&Contact, &Manifold) + Send + Sync>;

// ── Timings ───────────────────────────────────────────────────────────────────

/// Per-step subsystem timings in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepProfile {
    pub body_ms: f32,
    pub contact_ms: f32,
    pub ccd_ms: f32,
    pub joint_ms: f32,
    pub controller_ms: f32,
    pub total_ms: f32,
}

// ── World trait ───────────────────────────────────────────────────────────────

/// The simulation as seen by the debug view and the step driver.
pub trait PhysicsWorld {
    fn bodies(&self) -> &[Body];

    fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies().iter().find(|b| b.id == id)
    }

    fn joints(&self) -> &[Joint];

    fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints().iter().find(|j| j.id == id)
    }

    fn controllers(&self) -> &[Controller];

    /// Number of touching contacts after the last step.
    fn contact_count(&self) -> usize;

    fn proxy_count(&self) -> usize;

    /// Fattened broad-phase bounds of `proxy`.
    fn fat_aabb(&self, proxy: ProxyId) -> Option<Aabb2d>;

    /// Timings of the last step.
    fn profile(&self) -> StepProfile;

    /// First fixture containing `point`.
    fn test_point(&self, point: Vec2) -> Option<FixtureId>;

    fn add_joint(&mut self, def: JointDef) -> JointId;

    /// Returns `false` if the joint was unknown.
    fn remove_joint(&mut self, id: JointId) -> bool;

    /// Move a mouse joint's target.  Returns `false` if the joint is unknown or
    /// not a mouse joint.
    fn set_joint_target(&mut self, id: JointId, target: Vec2) -> bool;

    fn subscribe_pre_solve(&mut self, callback: PreSolveCallback) -> SubscriptionId;

    /// Returns `false` if `id` was not subscribed.
    fn unsubscribe_pre_solve(&mut self, id: SubscriptionId) -> bool;

    fn step(&mut self, dt: f32);
}
