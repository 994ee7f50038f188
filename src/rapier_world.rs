//! [`PhysicsWorld`] backed by Rapier.
//!
//! [`RapierWorld`] owns the full rapier2d pipeline (body, collider and joint
//! sets, broad and narrow phase, CCD solver) and keeps a flattened cache of
//! [`Body`] and [`Joint`] records that the debug view reads.  The cache is
//! refreshed after every step.
//!
//! Mapping onto Rapier:
//!
//! | Concern            | Rapier side                                           |
//! |--------------------|-------------------------------------------------------|
//! | Fixtures           | One collider each, tagged through `user_data`         |
//! | Proxies            | One per collider; bounds from `compute_aabb`          |
//! | Presolve           | `PhysicsHooks::modify_solver_contacts`                |
//! | Mouse joint        | Spring joint to a kinematic anchor body               |
//! | Anchor-fixed joint | Joint to a hidden fixed body at the origin            |
//! | Controllers        | Impulses and velocity clamps applied before each step |
//!
//! Pulley, gear, friction, motor and angle joints have no Rapier counterpart.
//! They are kept as records so they still draw, but constrain nothing.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use bevy::math::bounding::Aabb2d;
use bevy::prelude::*;
use bevy_rapier2d::rapier::parry::query::PointQuery;
use bevy_rapier2d::rapier::prelude::*;
use bevy_rapier2d::rapier::prelude::Real;
use parking_lot::Mutex;

use crate::physics::{
    Body, BodyId, BodyType, Contact, Controller, ControllerKind, Fixture, FixtureId, Joint,
    JointDef, JointId, JointKind, Manifold, ManifoldPoint, PhysicsWorld, PreSolveCallback,
    ProxyId, Shape, StepProfile, SubscriptionId, WorldManifold, MAX_MANIFOLD_POINTS,
};

/// Growth applied to collider bounds when reporting proxies.
pub const PROXY_MARGIN: f32 = 0.1;

/// Mouse joint spring frequency, Hz.
pub const MOUSE_JOINT_FREQUENCY: f32 = 5.0;

/// Mouse joint damping ratio.
pub const MOUSE_JOINT_DAMPING_RATIO: f32 = 0.7;

/// Distance joint spring frequency, Hz.
pub const DISTANCE_JOINT_FREQUENCY: f32 = 4.0;

/// Everything needed to create a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDef {
    pub body_type: BodyType,
    pub position: Vec2,
    /// Radians.
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub enabled: bool,
    pub awake: bool,
}

impl BodyDef {
    pub fn new(body_type: BodyType, position: Vec2) -> Self {
        Self {
            body_type,
            position,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            enabled: true,
            awake: true,
        }
    }

    pub fn dynamic(position: Vec2) -> Self {
        Self::new(BodyType::Dynamic, position)
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_point(v: Vec2) -> Point<Real> {
    point![v.x, v.y]
}

fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn from_point(p: &Point<Real>) -> Vec2 {
    Vec2::new(p.x, p.y)
}

fn rigid_body_type(body_type: BodyType) -> RigidBodyType {
    match body_type {
        BodyType::Static => RigidBodyType::Fixed,
        BodyType::Kinematic => RigidBodyType::KinematicVelocityBased,
        BodyType::Dynamic => RigidBodyType::Dynamic,
    }
}

fn fixture_user_data(id: FixtureId) -> u128 {
    ((id.body.0 as u128) << 32) | id.index as u128
}

fn fixture_from_user_data(data: u128) -> FixtureId {
    FixtureId {
        body: BodyId((data >> 32) as u32),
        index: (data & 0xffff_ffff) as u32,
    }
}

/// Collider geometry for `shape`; `None` for degenerate polygons and chains.
fn collider_for(shape: &Shape) -> Option<ColliderBuilder> {
    match shape {
        Shape::Circle { center, radius } => {
            Some(ColliderBuilder::new(SharedShape::ball(*radius)).translation(to_vector(*center)))
        }
        Shape::Polygon { vertices } => {
            let points = vertices.iter().map(|v| to_point(*v)).collect();
            SharedShape::convex_polyline(points).map(ColliderBuilder::new)
        }
        Shape::Edge { v1, v2 } => Some(ColliderBuilder::new(SharedShape::segment(
            to_point(*v1),
            to_point(*v2),
        ))),
        Shape::Chain { vertices } if vertices.len() >= 2 => {
            let points = vertices.iter().map(|v| to_point(*v)).collect();
            Some(ColliderBuilder::new(SharedShape::polyline(points, None)))
        }
        Shape::Chain { .. } => None,
    }
}

/// Spring stiffness and damping for a mass-spring at `frequency` Hz.
fn spring_coefficients(mass: f32, frequency: f32, damping_ratio: f32) -> (f32, f32) {
    let omega = std::f32::consts::TAU * frequency;
    let mass = if mass > 0.0 { mass } else { 1.0 };
    (mass * omega * omega, 2.0 * mass * damping_ratio * omega)
}

// ── Presolve hook ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct PreSolveState {
    listeners: Vec<(SubscriptionId, PreSolveCallback)>,
    /// Manifold reported for each pair on its last presolve.
    previous: HashMap<(ColliderHandle, ColliderHandle), Manifold>,
    touched: HashSet<(ColliderHandle, ColliderHandle)>,
    elapsed: Duration,
}

/// Forwards Rapier's solver-contact hook to the presolve listeners.
#[derive(Default)]
struct PreSolveHooks {
    state: Mutex<PreSolveState>,
}

impl PreSolveHooks {
    /// Reset per-step bookkeeping.
    fn begin_step(&self) {
        let mut state = self.state.lock();
        state.touched.clear();
        state.elapsed = Duration::ZERO;
    }

    /// Forget pairs that were not reported this step; returns callback time.
    fn end_step(&self) -> Duration {
        let mut state = self.state.lock();
        let PreSolveState {
            previous, touched, ..
        } = &mut *state;
        previous.retain(|pair, _| touched.contains(pair));
        state.elapsed
    }
}

impl PhysicsHooks for PreSolveHooks {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        if context.solver_contacts.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        if state.listeners.is_empty() {
            return;
        }
        let start = Instant::now();

        let collider1 = context.colliders.get(context.collider1);
        let collider2 = context.colliders.get(context.collider2);
        let body1 = context.rigid_body1.and_then(|h| context.bodies.get(h));
        let Some(collider1) = collider1 else {
            return;
        };

        let world_normal = *context.normal;
        let body_frame = body1.map(|b| *b.position());
        let mut manifold = Manifold {
            local_normal: from_vector(&match body_frame {
                Some(frame) => frame.inverse_transform_vector(&world_normal),
                None => world_normal,
            }),
            ..Default::default()
        };
        let mut world_manifold = WorldManifold {
            normal: from_vector(&world_normal),
            ..Default::default()
        };
        for (slot, tracked) in context
            .manifold
            .points
            .iter()
            .take(MAX_MANIFOLD_POINTS)
            .enumerate()
        {
            let world = collider1.position() * tracked.local_p1;
            let local = match body_frame {
                Some(frame) => frame.inverse_transform_point(&world),
                None => world,
            };
            manifold.points[slot] = ManifoldPoint {
                local_point: from_point(&local),
                id: tracked.fid1.0 ^ tracked.fid2.0.rotate_left(16),
            };
            world_manifold.points[slot] = from_point(&world);
            manifold.point_count += 1;
        }

        let contact = Contact {
            fixture_a: Some(fixture_from_user_data(collider1.user_data)),
            fixture_b: collider2.map(|c| fixture_from_user_data(c.user_data)),
            manifold,
            world_manifold,
        };
        let pair = (context.collider1, context.collider2);
        let PreSolveState {
            listeners,
            previous,
            touched,
            elapsed,
        } = &mut *state;
        let old = previous.get(&pair).copied().unwrap_or_default();
        for (_, listener) in listeners.iter_mut() {
            listener(&contact, &old);
        }
        previous.insert(pair, manifold);
        touched.insert(pair);
        *elapsed += start.elapsed();
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

/// Rapier handles behind one [`Joint`] record.
#[derive(Debug, Clone, Copy, Default)]
struct JointLink {
    constraint: Option<ImpulseJointHandle>,
    /// Kinematic body carrying a mouse joint's target.
    anchor: Option<RigidBodyHandle>,
}

#[derive(Resource)]
pub struct RapierWorld {
    gravity: Vec2,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    hooks: PreSolveHooks,
    /// Fixed body at the origin for joints without a body B.
    ground: RigidBodyHandle,

    bodies: Vec<Body>,
    body_handles: Vec<RigidBodyHandle>,
    /// Indexed by [`ProxyId`].
    collider_handles: Vec<ColliderHandle>,
    joints: Vec<Joint>,
    joint_links: HashMap<JointId, JointLink>,
    next_joint: u32,
    controllers: Vec<Controller>,
    next_subscription: u64,
    profile: StepProfile,
    step_count: u64,
    last_step_dt: f32,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, -10.0))
    }
}

impl RapierWorld {
    pub fn new(gravity: Vec2) -> Self {
        let mut rigid_bodies = RigidBodySet::new();
        let ground = rigid_bodies.insert(RigidBodyBuilder::fixed().build());
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies,
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            hooks: PreSolveHooks::default(),
            ground,
            bodies: Vec::new(),
            body_handles: Vec::new(),
            collider_handles: Vec::new(),
            joints: Vec::new(),
            joint_links: HashMap::new(),
            next_joint: 0,
            controllers: Vec::new(),
            next_subscription: 0,
            profile: StepProfile::default(),
            step_count: 0,
            last_step_dt: 0.0,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Delta passed to the most recent [`PhysicsWorld::step`].
    pub fn last_step_dt(&self) -> f32 {
        self.last_step_dt
    }

    pub fn listener_count(&self) -> usize {
        self.hooks.state.lock().listeners.len()
    }

    fn handle(&self, id: BodyId) -> Option<RigidBodyHandle> {
        self.body_handles.get(id.0 as usize).copied()
    }

    // ── Building ──────────────────────────────────────────────────────────────

    pub fn add_body(&mut self, def: BodyDef) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        let rb = RigidBodyBuilder::new(rigid_body_type(def.body_type))
            .translation(to_vector(def.position))
            .rotation(def.angle)
            .linvel(to_vector(def.linear_velocity))
            .angvel(def.angular_velocity)
            .enabled(def.enabled)
            .sleeping(!def.awake)
            .build();
        let handle = self.rigid_bodies.insert(rb);
        self.body_handles.push(handle);
        self.bodies.push(Body {
            id,
            body_type: def.body_type,
            enabled: def.enabled,
            awake: def.awake,
            transform: Isometry2d::new(def.position, Rot2::radians(def.angle)),
            local_center: Vec2::ZERO,
            fixtures: Vec::new(),
        });
        id
    }

    /// Attach `shape` to `body` as a new collider.
    ///
    /// `None` if the body is unknown or the shape is degenerate.
    pub fn add_fixture(&mut self, body: BodyId, shape: Shape) -> Option<FixtureId> {
        let handle = self.handle(body)?;
        let index = self.bodies.get(body.0 as usize)?.fixtures.len() as u32;
        let id = FixtureId { body, index };
        let Some(builder) = collider_for(&shape) else {
            warn!("Degenerate {:?} shape not added to body {:?}", shape, body);
            return None;
        };
        let collider = builder
            .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
            .user_data(fixture_user_data(id))
            .build();
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, handle, &mut self.rigid_bodies);

        let proxy = ProxyId(self.collider_handles.len() as u32);
        self.collider_handles.push(collider_handle);
        self.bodies[body.0 as usize].fixtures.push(Fixture {
            id,
            shape,
            proxies: vec![proxy],
        });
        self.sync_body(body.0 as usize);
        Some(id)
    }

    pub fn add_controller(&mut self, controller: Controller) -> usize {
        self.controllers.push(controller);
        self.controllers.len() - 1
    }

    pub fn set_body_enabled(&mut self, id: BodyId, enabled: bool) {
        let Some(handle) = self.handle(id) else {
            return;
        };
        if let Some(rb) = self.rigid_bodies.get_mut(handle) {
            rb.set_enabled(enabled);
        }
        self.sync_body(id.0 as usize);
    }

    pub fn set_awake(&mut self, id: BodyId, awake: bool) {
        let Some(handle) = self.handle(id) else {
            return;
        };
        if let Some(rb) = self.rigid_bodies.get_mut(handle) {
            if awake {
                rb.wake_up(true);
            } else {
                rb.sleep();
            }
        }
        self.sync_body(id.0 as usize);
    }

    pub fn set_velocity(&mut self, id: BodyId, linear: Vec2, angular: f32) {
        let Some(handle) = self.handle(id) else {
            return;
        };
        if let Some(rb) = self.rigid_bodies.get_mut(handle) {
            rb.set_linvel(to_vector(linear), true);
            rb.set_angvel(angular, true);
        }
    }

    pub fn velocity(&self, id: BodyId) -> Option<Vec2> {
        let rb = self.rigid_bodies.get(self.handle(id)?)?;
        Some(from_vector(rb.linvel()))
    }

    // ── Step phases ───────────────────────────────────────────────────────────

    fn apply_controllers(&mut self, dt: f32) {
        let gravity = self.gravity;
        for controller in self.controllers.iter().filter(|c| c.enabled) {
            for handle in &self.body_handles {
                let Some(rb) = self.rigid_bodies.get_mut(*handle) else {
                    continue;
                };
                if !rb.is_dynamic() || !rb.is_enabled() || rb.is_sleeping() {
                    continue;
                }
                match controller.kind {
                    ControllerKind::Buoyancy {
                        container,
                        density,
                        linear_drag,
                    } => {
                        let c = from_point(rb.center_of_mass());
                        if c.cmpge(container.min).all() && c.cmple(container.max).all() {
                            let velocity = from_vector(rb.linvel());
                            let impulse = (-gravity * density - velocity * linear_drag) * rb.mass() * dt;
                            rb.apply_impulse(to_vector(impulse), true);
                        }
                    }
                    ControllerKind::VelocityLimit {
                        max_linear_velocity,
                        max_angular_velocity,
                    } => {
                        let linear = from_vector(rb.linvel()).clamp_length_max(max_linear_velocity);
                        let angular = rb.angvel().clamp(-max_angular_velocity, max_angular_velocity);
                        rb.set_linvel(to_vector(linear), false);
                        rb.set_angvel(angular, false);
                    }
                }
            }
        }
    }

    /// Copy Rapier's state for body `index` into the cache.
    fn sync_body(&mut self, index: usize) {
        let (Some(body), Some(handle)) = (self.bodies.get_mut(index), self.body_handles.get(index))
        else {
            return;
        };
        let Some(rb) = self.rigid_bodies.get(*handle) else {
            return;
        };
        body.transform = Isometry2d::new(from_vector(rb.translation()), Rot2::radians(rb.rotation().angle()));
        body.enabled = rb.is_enabled();
        body.awake = !rb.is_sleeping();
        body.local_center = body.local_point(from_point(rb.center_of_mass()));
    }

    fn constraint_for(&self, joint: &Joint, body_a: RigidBodyHandle) -> Option<GenericJoint> {
        let anchor_a = to_point(joint.local_anchor_a);
        let anchor_b = to_point(joint.local_anchor_b);
        let world_a = self.rigid_bodies.get(body_a)?.position() * anchor_a;
        let world_b = match joint.body_b.and_then(|id| self.handle(id)) {
            Some(handle) => self.rigid_bodies.get(handle)?.position() * anchor_b,
            None => anchor_b,
        };
        let length = (world_b - world_a).norm();

        let constraint: GenericJoint = match joint.kind {
            JointKind::Revolute | JointKind::Wheel => RevoluteJointBuilder::new()
                .local_anchor1(anchor_a)
                .local_anchor2(anchor_b)
                .into(),
            JointKind::Weld => FixedJointBuilder::new()
                .local_anchor1(anchor_a)
                .local_anchor2(anchor_b)
                .into(),
            JointKind::Prismatic => PrismaticJointBuilder::new(Vector::x_axis())
                .local_anchor1(anchor_a)
                .local_anchor2(anchor_b)
                .into(),
            JointKind::Rope => RopeJointBuilder::new(length)
                .local_anchor1(anchor_a)
                .local_anchor2(anchor_b)
                .into(),
            JointKind::Distance => {
                let mass = self.rigid_bodies.get(body_a).map_or(1.0, |rb| rb.mass());
                let (stiffness, damping) = spring_coefficients(mass, DISTANCE_JOINT_FREQUENCY, 1.0);
                SpringJointBuilder::new(length, stiffness, damping)
                    .local_anchor1(anchor_a)
                    .local_anchor2(anchor_b)
                    .into()
            }
            JointKind::FixedMouse { .. } => {
                let mass = self.rigid_bodies.get(body_a).map_or(1.0, |rb| rb.mass());
                let (stiffness, damping) =
                    spring_coefficients(mass, MOUSE_JOINT_FREQUENCY, MOUSE_JOINT_DAMPING_RATIO);
                SpringJointBuilder::new(0.0, stiffness, damping)
                    .local_anchor1(anchor_a)
                    .local_anchor2(Point::origin())
                    .into()
            }
            JointKind::Pulley { .. }
            | JointKind::Gear
            | JointKind::Friction
            | JointKind::Motor
            | JointKind::Angle => return None,
        };
        Some(constraint)
    }
}

impl PhysicsWorld for RapierWorld {
    fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0 as usize)
    }

    fn joints(&self) -> &[Joint] {
        &self.joints
    }

    fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    fn contact_count(&self) -> usize {
        self.narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact)
            .count()
    }

    fn proxy_count(&self) -> usize {
        self.collider_handles.len()
    }

    fn fat_aabb(&self, proxy: ProxyId) -> Option<Aabb2d> {
        let handle = self.collider_handles.get(proxy.0 as usize)?;
        let aabb = self.colliders.get(*handle)?.compute_aabb().loosened(PROXY_MARGIN);
        Some(Aabb2d {
            min: from_point(&aabb.mins),
            max: from_point(&aabb.maxs),
        })
    }

    fn profile(&self) -> StepProfile {
        self.profile
    }

    fn test_point(&self, point: Vec2) -> Option<FixtureId> {
        let point = to_point(point);
        self.bodies
            .iter()
            .filter(|b| b.enabled)
            .flat_map(|b| b.fixtures.iter())
            .find(|fixture| {
                fixture.proxies.iter().any(|proxy| {
                    self.collider_handles
                        .get(proxy.0 as usize)
                        .and_then(|h| self.colliders.get(*h))
                        .is_some_and(|c| c.shape().contains_point(c.position(), &point))
                })
            })
            .map(|fixture| fixture.id)
    }

    fn add_joint(&mut self, def: JointDef) -> JointId {
        let id = JointId(self.next_joint);
        self.next_joint += 1;
        let joint = Joint::from_def(id, def);
        let mut link = JointLink::default();

        let body_a = self.handle(def.body_a);
        let constraint = body_a.and_then(|h| self.constraint_for(&joint, h));
        match (body_a, constraint) {
            (Some(handle_a), Some(constraint)) => {
                let handle_b = match (joint.kind, def.body_b.and_then(|b| self.handle(b))) {
                    (JointKind::FixedMouse { target }, _) => {
                        let anchor = self.rigid_bodies.insert(
                            RigidBodyBuilder::kinematic_position_based()
                                .translation(to_vector(target))
                                .build(),
                        );
                        link.anchor = Some(anchor);
                        anchor
                    }
                    (_, Some(handle_b)) => handle_b,
                    (_, None) => self.ground,
                };
                link.constraint = Some(self.impulse_joints.insert(handle_a, handle_b, constraint, true));
            }
            _ => debug!("joint {:?} ({:?}) is drawn but not simulated", id, joint.kind),
        }

        self.joints.push(joint);
        self.joint_links.insert(id, link);
        id
    }

    fn remove_joint(&mut self, id: JointId) -> bool {
        let Some(link) = self.joint_links.remove(&id) else {
            return false;
        };
        if let Some(handle) = link.constraint {
            self.impulse_joints.remove(handle, true);
        }
        if let Some(anchor) = link.anchor {
            self.rigid_bodies.remove(
                anchor,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }
        self.joints.retain(|j| j.id != id);
        true
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
        let body_a = joint.body_a;

        let anchor = self.joint_links.get(&id).and_then(|link| link.anchor);
        if let Some(rb) = anchor.and_then(|h| self.rigid_bodies.get_mut(h)) {
            rb.set_next_kinematic_translation(to_vector(target));
        }
        if let Some(rb) = self.handle(body_a).and_then(|h| self.rigid_bodies.get_mut(h)) {
            rb.wake_up(true);
        }
        true
    }

    fn subscribe_pre_solve(&mut self, callback: PreSolveCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.hooks.state.lock().listeners.push((id, callback));
        id
    }

    fn unsubscribe_pre_solve(&mut self, id: SubscriptionId) -> bool {
        let mut state = self.hooks.state.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(sid, _)| *sid != id);
        state.listeners.len() != before
    }

    fn step(&mut self, dt: f32) {
        let total = Instant::now();

        let t = Instant::now();
        self.apply_controllers(dt);
        let controller_ms = t.elapsed().as_secs_f32() * 1000.0;

        // A zero delta would divide by zero inside the solver.
        let mut pipeline_ms = 0.0;
        let mut contact_ms = 0.0;
        if dt > 0.0 {
            self.integration_parameters.dt = dt;
            let gravity = to_vector(self.gravity);
            self.hooks.begin_step();
            let t = Instant::now();
            self.pipeline.step(
                &gravity,
                &self.integration_parameters,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                &self.hooks,
                &(),
            );
            pipeline_ms = t.elapsed().as_secs_f32() * 1000.0;
            contact_ms = self.hooks.end_step().as_secs_f32() * 1000.0;
        }

        let t = Instant::now();
        for index in 0..self.bodies.len() {
            self.sync_body(index);
        }
        let sync_ms = t.elapsed().as_secs_f32() * 1000.0;

        // Joint and CCD time are folded into `body_ms`.
        self.profile = StepProfile {
            body_ms: (pipeline_ms - contact_ms).max(0.0) + sync_ms,
            contact_ms,
            ccd_ms: 0.0,
            joint_ms: 0.0,
            controller_ms,
            total_ms: total.elapsed().as_secs_f32() * 1000.0,
        };
        self.step_count += 1;
        self.last_step_dt = dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{point_states, PointState};
    use std::sync::Arc;

    fn square(half: f32) -> Shape {
        Shape::Polygon {
            vertices: vec![
                Vec2::new(-half, -half),
                Vec2::new(half, -half),
                Vec2::new(half, half),
                Vec2::new(-half, half),
            ],
        }
    }

    fn ball(radius: f32) -> Shape {
        Shape::Circle {
            center: Vec2::ZERO,
            radius,
        }
    }

    #[test]
    fn dynamic_bodies_fall_static_bodies_stay() {
        let mut world = RapierWorld::new(Vec2::new(0.0, -10.0));
        let ground = world.add_body(BodyDef::new(BodyType::Static, Vec2::ZERO));
        let falling = world.add_body(BodyDef::dynamic(Vec2::new(0.0, 5.0)));
        world.add_fixture(falling, ball(0.5));
        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }

        assert_eq!(world.body(ground).unwrap().position(), Vec2::ZERO);
        assert!(world.body(falling).unwrap().position().y < 5.0);
        assert_eq!(world.step_count(), 10);
        assert!((world.last_step_dt() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn zero_delta_leaves_bodies_in_place() {
        let mut world = RapierWorld::default();
        let id = world.add_body(BodyDef::dynamic(Vec2::new(1.0, 2.0)));
        world.add_fixture(id, ball(0.5));
        world.step(0.0);

        assert_eq!(world.step_count(), 1);
        assert_eq!(world.body(id).unwrap().position(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_point_finds_polygons_and_offset_circles() {
        let mut world = RapierWorld::new(Vec2::ZERO);
        let a = world.add_body(BodyDef::dynamic(Vec2::new(10.0, 0.0)));
        let fa = world.add_fixture(a, square(1.0)).unwrap();
        let b = world.add_body(BodyDef::dynamic(Vec2::ZERO));
        let fb = world
            .add_fixture(b, Shape::Circle { center: Vec2::new(0.0, 3.0), radius: 0.5 })
            .unwrap();

        assert_eq!(world.test_point(Vec2::new(10.5, 0.5)), Some(fa));
        assert_eq!(world.test_point(Vec2::new(0.2, 3.2)), Some(fb));
        assert_eq!(world.test_point(Vec2::ZERO), None);
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        let mut world = RapierWorld::new(Vec2::ZERO);
        let body = world.add_body(BodyDef::dynamic(Vec2::ZERO));
        let flat = Shape::Polygon {
            vertices: vec![Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0)],
        };
        assert_eq!(world.add_fixture(body, flat), None);
        assert_eq!(world.proxy_count(), 0);
        assert!(world.body(body).unwrap().fixtures.is_empty());
    }

    #[test]
    fn proxies_are_loosened_collider_bounds() {
        let mut world = RapierWorld::new(Vec2::ZERO);
        let body = world.add_body(BodyDef::new(BodyType::Static, Vec2::new(2.0, 0.0)));
        world.add_fixture(body, square(0.5));

        assert_eq!(world.proxy_count(), 1);
        let fat = world.fat_aabb(ProxyId(0)).unwrap();
        assert!((fat.min - Vec2::new(1.5 - PROXY_MARGIN, -0.5 - PROXY_MARGIN)).length() < 1e-4);
        assert!((fat.max - Vec2::new(2.5 + PROXY_MARGIN, 0.5 + PROXY_MARGIN)).length() < 1e-4);
        assert!(world.fat_aabb(ProxyId(1)).is_none());
    }

    #[test]
    fn mouse_joint_drags_body_toward_target() {
        let mut world = RapierWorld::new(Vec2::ZERO);
        let id = world.add_body(BodyDef::dynamic(Vec2::ZERO));
        world.add_fixture(id, ball(0.5));
        let body = world.body(id).unwrap().clone();
        let joint = world.add_joint(JointDef::mouse(&body, Vec2::ZERO));
        assert!(world.set_joint_target(joint, Vec2::new(2.0, 0.0)));
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        assert!(world.body(id).unwrap().position().x > 0.5);

        assert!(world.remove_joint(joint));
        assert!(!world.remove_joint(joint));
        assert!(!world.set_joint_target(joint, Vec2::ZERO));
        assert!(world.joints().is_empty());
    }

    #[test]
    fn unsupported_joint_kinds_are_still_listed() {
        let mut world = RapierWorld::new(Vec2::ZERO);
        let a = world.add_body(BodyDef::dynamic(Vec2::ZERO));
        let b = world.add_body(BodyDef::dynamic(Vec2::X));
        let (body_a, body_b) = (world.body(a).unwrap().clone(), world.body(b).unwrap().clone());
        let gear = world.add_joint(JointDef::between(JointKind::Gear, &body_a, &body_b, Vec2::ZERO, Vec2::X));
        world.step(1.0 / 60.0);

        assert_eq!(world.joints().len(), 1);
        assert!(world.remove_joint(gear));
    }

    #[test]
    fn velocity_limit_caps_speed() {
        let mut world = RapierWorld::new(Vec2::ZERO);
        let id = world.add_body(BodyDef::dynamic(Vec2::ZERO));
        world.add_fixture(id, ball(0.5));
        world.set_velocity(id, Vec2::new(30.0, 40.0), 0.0);
        world.add_controller(Controller {
            enabled: true,
            kind: ControllerKind::VelocityLimit {
                max_linear_velocity: 5.0,
                max_angular_velocity: 1.0,
            },
        });
        world.step(0.01);
        assert!((world.velocity(id).unwrap().length() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn resting_contact_is_added_then_persisted() {
        let mut world = RapierWorld::new(Vec2::new(0.0, -10.0));
        let floor = world.add_body(BodyDef::new(BodyType::Static, Vec2::ZERO));
        world.add_fixture(floor, square(1.0));
        let resting = world.add_body(BodyDef::dynamic(Vec2::new(0.0, 1.5)));
        world.add_fixture(resting, ball(0.5));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = world.subscribe_pre_solve(Box::new(move |contact, old| {
            let (_, states) = point_states(old, &contact.manifold);
            sink.lock().push((contact.fixture_a, contact.fixture_b, states[0]));
        }));
        assert_eq!(world.listener_count(), 1);
        for _ in 0..5 {
            world.step(1.0 / 60.0);
        }

        let seen = seen.lock();
        assert!(seen.len() >= 2, "the resting pair is reported every step");
        assert_eq!(seen[0].2, PointState::Added);
        assert_eq!(seen[seen.len() - 1].2, PointState::Persisted);
        let bodies: HashSet<BodyId> = seen[0]
            .0
            .into_iter()
            .chain(seen[0].1)
            .map(|f| f.body)
            .collect();
        assert_eq!(bodies, HashSet::from([floor, resting]));
        assert_eq!(world.contact_count(), 1);

        drop(seen);
        assert!(world.unsubscribe_pre_solve(sub));
        assert!(!world.unsubscribe_pre_solve(sub));
        assert_eq!(world.listener_count(), 0);
    }
}
