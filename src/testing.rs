//! Scripted [`PhysicsWorld`] for unit tests.
//!
//! Bodies never move and nothing collides.  Contacts are queued by hand and
//! re-reported to presolve listeners on every step, so draw and recorder
//! tests get exact, repeatable vertex output.  The demo and integration tests
//! run on [`crate::rapier_world::RapierWorld`] instead.

use bevy::math::bounding::{Aabb2d, BoundingVolume};
use bevy::prelude::*;

use crate::physics::{
    Body, BodyId, BodyType, Contact, Controller, Fixture, FixtureId, Joint, JointDef, JointId,
    JointKind, Manifold, ManifoldPoint, PhysicsWorld, PreSolveCallback, ProxyId, Shape,
    StepProfile, SubscriptionId, WorldManifold, MAX_MANIFOLD_POINTS,
};

/// Growth applied to every proxy box.
pub(crate) const PROXY_MARGIN: f32 = 0.1;

/// A touching pair re-reported on every step.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScriptedContact {
    pub fixture_a: FixtureId,
    pub fixture_b: FixtureId,
    /// World-space normal from A to B.
    pub normal: Vec2,
    /// `(feature id, world point)`.
    pub points: Vec<(u32, Vec2)>,
}

#[derive(Default)]
pub(crate) struct ScriptedWorld {
    bodies: Vec<Body>,
    joints: Vec<Joint>,
    next_joint: u32,
    controllers: Vec<Controller>,
    proxies: Vec<Aabb2d>,
    contacts: Vec<(ScriptedContact, Manifold)>,
    listeners: Vec<(SubscriptionId, PreSolveCallback)>,
    next_subscription: u64,
    step_count: u64,
    last_step_dt: f32,
}

impl ScriptedWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn last_step_dt(&self) -> f32 {
        self.last_step_dt
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn add_body(&mut self, body_type: BodyType, position: Vec2) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        self.bodies.push(Body {
            id,
            body_type,
            enabled: true,
            awake: true,
            transform: Isometry2d::from_translation(position),
            local_center: Vec2::ZERO,
            fixtures: Vec::new(),
        });
        id
    }

    /// One proxy per chain segment, one for every other shape.
    pub fn add_fixture(&mut self, body: BodyId, shape: Shape) -> Option<FixtureId> {
        let b = self.bodies.get_mut(body.0 as usize)?;
        let id = FixtureId {
            body,
            index: b.fixtures.len() as u32,
        };
        let children: Vec<Aabb2d> = match &shape {
            Shape::Chain { vertices } => vertices
                .windows(2)
                .map(|pair| Shape::Edge { v1: pair[0], v2: pair[1] }.compute_aabb(b.transform))
                .collect(),
            _ => vec![shape.compute_aabb(b.transform)],
        };
        let mut proxies = Vec::with_capacity(children.len());
        for aabb in children {
            proxies.push(ProxyId(self.proxies.len() as u32));
            self.proxies.push(aabb.grow(Vec2::splat(PROXY_MARGIN)));
        }
        b.fixtures.push(Fixture { id, shape, proxies });
        Some(id)
    }

    pub fn add_controller(&mut self, controller: Controller) {
        self.controllers.push(controller);
    }

    pub fn set_body_enabled(&mut self, id: BodyId, enabled: bool) {
        if let Some(body) = self.bodies.get_mut(id.0 as usize) {
            body.enabled = enabled;
        }
    }

    pub fn set_joint_enabled(&mut self, id: JointId, enabled: bool) {
        if let Some(joint) = self.joints.iter_mut().find(|j| j.id == id) {
            joint.enabled = enabled;
        }
    }

    pub fn queue_contact(&mut self, script: ScriptedContact) {
        self.contacts.push((script, Manifold::default()));
    }
}

fn contains(shape: &Shape, local: Vec2) -> bool {
    match shape {
        Shape::Circle { center, radius } => local.distance_squared(*center) <= radius * radius,
        Shape::Polygon { vertices } if vertices.len() >= 3 => (0..vertices.len()).all(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % vertices.len()];
            (b - a).perp_dot(local - a) >= 0.0
        }),
        _ => false,
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    fn joints(&self) -> &[Joint] {
        &self.joints
    }

    fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    fn fat_aabb(&self, proxy: ProxyId) -> Option<Aabb2d> {
        self.proxies.get(proxy.0 as usize).copied()
    }

    fn profile(&self) -> StepProfile {
        StepProfile::default()
    }

    fn test_point(&self, point: Vec2) -> Option<FixtureId> {
        self.bodies
            .iter()
            .filter(|b| b.enabled)
            .flat_map(|b| b.fixtures.iter().map(move |f| (b, f)))
            .find(|(b, f)| contains(&f.shape, b.local_point(point)))
            .map(|(_, f)| f.id)
    }

    fn add_joint(&mut self, def: JointDef) -> JointId {
        let id = JointId(self.next_joint);
        self.next_joint += 1;
        self.joints.push(Joint::from_def(id, def));
        id
    }

    fn remove_joint(&mut self, id: JointId) -> bool {
        let before = self.joints.len();
        self.joints.retain(|j| j.id != id);
        self.joints.len() != before
    }

    fn set_joint_target(&mut self, id: JointId, target: Vec2) -> bool {
        let Some(joint) = self.joints.iter_mut().find(|j| j.id == id) else {
            return false;
        };
        let JointKind::FixedMouse { target: t } = &mut joint.kind else {
            return false;
        };
        *t = target;
        joint.local_anchor_b = target;
        true
    }

    fn subscribe_pre_solve(&mut self, callback: PreSolveCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, callback));
        id
    }

    fn unsubscribe_pre_solve(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn step(&mut self, dt: f32) {
        for (script, previous) in &mut self.contacts {
            let body_a = self.bodies.get(script.fixture_a.body.0 as usize);
            let points: Vec<ManifoldPoint> = script
                .points
                .iter()
                .map(|(id, p)| ManifoldPoint {
                    local_point: body_a.map_or(*p, |b| b.local_point(*p)),
                    id: *id,
                })
                .collect();
            let local_normal = body_a.map_or(script.normal, |b| b.transform.rotation.inverse() * script.normal);
            let manifold = Manifold::from_points(local_normal, &points);
            let mut world_manifold = WorldManifold {
                normal: script.normal,
                ..Default::default()
            };
            for (slot, (_, p)) in script.points.iter().take(MAX_MANIFOLD_POINTS).enumerate() {
                world_manifold.points[slot] = *p;
            }
            let contact = Contact {
                fixture_a: Some(script.fixture_a),
                fixture_b: Some(script.fixture_b),
                manifold,
                world_manifold,
            };
            for (_, listener) in self.listeners.iter_mut() {
                listener(&contact, previous);
            }
            *previous = manifold;
        }
        self.step_count += 1;
        self.last_step_dt = dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{point_states, PointState};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn chain_gets_one_proxy_per_segment() {
        let mut world = ScriptedWorld::new();
        let body = world.add_body(BodyType::Static, Vec2::ZERO);
        world.add_fixture(
            body,
            Shape::Chain {
                vertices: vec![Vec2::ZERO, Vec2::X, Vec2::new(2.0, 1.0)],
            },
        );
        assert_eq!(world.proxy_count(), 2);
        assert_eq!(world.fat_aabb(ProxyId(0)).unwrap().min, Vec2::splat(-PROXY_MARGIN));
    }

    #[test]
    fn queued_contact_reports_previous_manifold() {
        let mut world = ScriptedWorld::new();
        let a = world.add_body(BodyType::Static, Vec2::ZERO);
        let b = world.add_body(BodyType::Dynamic, Vec2::Y);
        let fa = world.add_fixture(a, Shape::Circle { center: Vec2::ZERO, radius: 0.5 }).unwrap();
        let fb = world.add_fixture(b, Shape::Circle { center: Vec2::ZERO, radius: 0.5 }).unwrap();
        world.queue_contact(ScriptedContact {
            fixture_a: fa,
            fixture_b: fb,
            normal: Vec2::Y,
            points: vec![(3, Vec2::new(0.0, 0.5))],
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = world.subscribe_pre_solve(Box::new(move |contact, old| {
            let (_, states) = point_states(old, &contact.manifold);
            sink.lock().push(states[0]);
        }));
        world.step(0.01);
        world.step(0.01);

        assert_eq!(*seen.lock(), vec![PointState::Added, PointState::Persisted]);
        assert!(world.unsubscribe_pre_solve(sub));
        assert!(!world.unsubscribe_pre_solve(sub));
    }
}
