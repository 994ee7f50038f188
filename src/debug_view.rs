//! Debug view orchestrator.
//!
//! [`DebugView`] owns the flag set and every sub-collector (contact recorder,
//! performance graph, panel, string queue) and renders them in a fixed order
//! each frame:
//!
//! | Order | Flag                | Source                                  |
//! |-------|---------------------|-----------------------------------------|
//! | 1     | `SHAPE`             | every fixture of every body             |
//! | 2     | `CONTACT_POINTS`    | recorder, then reset                    |
//! |       | `CONTACT_NORMALS`   | only together with `CONTACT_POINTS`     |
//! | 3     | `POLYGON_POINTS`    | vertices of polygon fixtures            |
//! | 4     | `JOINT`             | every joint                             |
//! | 5     | `AABB`              | fat proxy bounds of enabled bodies      |
//! | 6     | `CENTER_OF_MASS`    | axes at each body's world centre        |
//! | 7     | `CONTROLLERS`       | buoyancy containers                     |
//! | 8     | `DEBUG_PANEL`       | counters and timings (text only)        |
//! | 9     | `PERFORMANCE_GRAPH` | second pass, screen projection          |
//!
//! An empty flag set, or a disabled view, renders nothing and never touches
//! the batch or the text renderer.

use std::sync::Arc;

use bevy::prelude::*;
use bitflags::bitflags;
use parking_lot::Mutex;

use crate::batch::PrimitiveBatch;
use crate::config::{DebugColors, DebugViewConfig};
use crate::constants::{CONTACT_NORMAL_SCALE, POINT_MARKER_SIZE};
use crate::contacts::{ContactRecorder, SharedContactRecorder};
use crate::draw::{srgba, DrawContext, JointColors};
use crate::error::{DebugResult, DebugViewError};
use crate::graph::{GraphColors, PerformanceGraph};
use crate::panel::DebugPanel;
use crate::physics::{Body, ControllerKind, PhysicsWorld, PointState, Shape, SubscriptionId};
use crate::text::{StringQueue, TextRenderer};
use crate::units::UnitConverter;

bitflags! {
    /// Independently toggleable overlay channels.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DebugViewFlags: u32 {
        const SHAPE = 1 << 0;
        const JOINT = 1 << 1;
        const AABB = 1 << 2;
        const CENTER_OF_MASS = 1 << 3;
        const DEBUG_PANEL = 1 << 4;
        const CONTACT_POINTS = 1 << 5;
        const CONTACT_NORMALS = 1 << 6;
        const POLYGON_POINTS = 1 << 7;
        const PERFORMANCE_GRAPH = 1 << 8;
        const CONTROLLERS = 1 << 9;
    }
}

impl Default for DebugViewFlags {
    fn default() -> Self {
        Self::SHAPE | Self::CONTROLLERS | Self::JOINT
    }
}

impl DebugViewFlags {
    /// Union of the named flags; names are case-insensitive.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> DebugResult<Self> {
        names.iter().try_fold(Self::empty(), |acc, name| {
            let name = name.as_ref();
            Self::from_name(&name.to_ascii_uppercase())
                .map(|flag| acc | flag)
                .ok_or_else(|| DebugViewError::UnknownFlag {
                    name: name.to_owned(),
                })
        })
    }
}

/// Resolved colours for one view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPalette {
    pub default_shape: Color,
    pub inactive_shape: Color,
    pub kinematic_shape: Color,
    pub sleeping_shape: Color,
    pub static_shape: Color,
    pub text: Color,
    pub contact_added: Color,
    pub contact_persisted: Color,
    pub contact_normal: Color,
    pub polygon_point: Color,
    pub aabb: Color,
    pub buoyancy: Color,
    pub joints: JointColors,
    pub graph: GraphColors,
}

impl From<&DebugColors> for ViewPalette {
    fn from(c: &DebugColors) -> Self {
        Self {
            default_shape: srgba(c.default_shape),
            inactive_shape: srgba(c.inactive_shape),
            kinematic_shape: srgba(c.kinematic_shape),
            sleeping_shape: srgba(c.sleeping_shape),
            static_shape: srgba(c.static_shape),
            text: srgba(c.text),
            contact_added: srgba(c.contact_added),
            contact_persisted: srgba(c.contact_persisted),
            contact_normal: srgba(c.contact_normal),
            polygon_point: srgba(c.polygon_point),
            aabb: srgba(c.aabb),
            buoyancy: srgba(c.buoyancy),
            joints: c.joint_colors(),
            graph: c.graph_colors(),
        }
    }
}

impl ViewPalette {
    /// Shape colour by body state; the first matching state wins.
    pub fn shape_color(&self, body: &Body) -> Color {
        if !body.enabled {
            self.inactive_shape
        } else if body.is_static() {
            self.static_shape
        } else if body.is_kinematic() {
            self.kinematic_shape
        } else if !body.awake {
            self.sleeping_shape
        } else {
            self.default_shape
        }
    }
}

#[derive(Resource)]
pub struct DebugView {
    flags: DebugViewFlags,
    enabled: bool,
    palette: ViewPalette,
    circle_segments: u32,
    units: UnitConverter,
    recorder: SharedContactRecorder,
    subscription: Option<SubscriptionId>,
    graph: PerformanceGraph,
    panel: DebugPanel,
    strings: StringQueue,
    scratch: Vec<Vec2>,
    screen_projection: Mat4,
    font: Handle<Font>,
}

impl Default for DebugView {
    fn default() -> Self {
        Self::build(&DebugViewConfig::default(), DebugViewFlags::default())
    }
}

impl DebugView {
    /// Build a view from a validated configuration.
    pub fn new(config: &DebugViewConfig) -> DebugResult<Self> {
        config.validate()?;
        let flags = config.flags()?;
        Ok(Self::build(config, flags))
    }

    fn build(config: &DebugViewConfig, flags: DebugViewFlags) -> Self {
        let mut view = Self {
            flags,
            enabled: true,
            palette: ViewPalette::from(&config.colors),
            circle_segments: config.circle_segments,
            units: UnitConverter::new(config.display_per_sim),
            recorder: ContactRecorder::shared(config.max_contact_points),
            subscription: None,
            graph: PerformanceGraph::new(
                config.values_to_graph,
                config.adaptive_limits,
                config.graph_minimum_value,
                config.graph_maximum_value,
                config.performance_panel_rect(),
            ),
            panel: DebugPanel {
                position: Vec2::from(config.debug_panel_position),
                column_offset: config.debug_panel_column_offset,
            },
            strings: StringQueue::default(),
            scratch: Vec::with_capacity(16),
            screen_projection: Mat4::IDENTITY,
            font: Handle::default(),
        };
        view.sync_recorder();
        view
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Subscribe the contact recorder to `world`'s presolve events.
    pub fn attach<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> DebugResult<()> {
        if self.subscription.is_some() {
            warn!("DebugView::attach called while already attached");
            return Err(DebugViewError::AlreadyAttached);
        }
        let recorder = Arc::clone(&self.recorder);
        let id = world.subscribe_pre_solve(Box::new(move |contact, old_manifold| {
            recorder.lock().record_pre_solve(contact, old_manifold);
        }));
        self.subscription = Some(id);
        debug!("DebugView attached (subscription {:?})", id);
        Ok(())
    }

    /// Release the presolve subscription taken by [`Self::attach`].
    pub fn detach<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> DebugResult<()> {
        let Some(id) = self.subscription.take() else {
            warn!("DebugView::detach called while not attached");
            return Err(DebugViewError::NotAttached);
        };
        if !world.unsubscribe_pre_solve(id) {
            warn!("world did not know presolve subscription {:?}", id);
        }
        self.recorder.lock().reset();
        debug!("DebugView detached (subscription {:?})", id);
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    // ── Flags ─────────────────────────────────────────────────────────────────

    pub fn flags(&self) -> DebugViewFlags {
        self.flags
    }

    pub fn append_flags(&mut self, flags: DebugViewFlags) {
        self.flags |= flags;
        self.sync_recorder();
    }

    pub fn remove_flags(&mut self, flags: DebugViewFlags) {
        self.flags &= !flags;
        self.sync_recorder();
    }

    pub fn set_flags(&mut self, flags: DebugViewFlags) {
        self.flags = flags;
        self.sync_recorder();
    }

    /// Contacts are only captured while they will be drawn.
    fn sync_recorder(&mut self) {
        let capture = self.enabled && self.flags.contains(DebugViewFlags::CONTACT_POINTS);
        let mut recorder = self.recorder.lock();
        if !capture {
            recorder.reset();
        }
        recorder.set_enabled(capture);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.sync_recorder();
    }

    /// Whether the next [`Self::render`] will do any work.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.flags.is_empty()
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn units(&self) -> UnitConverter {
        self.units
    }

    pub fn palette(&self) -> &ViewPalette {
        &self.palette
    }

    pub fn graph(&self) -> &PerformanceGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut PerformanceGraph {
        &mut self.graph
    }

    pub fn panel_mut(&mut self) -> &mut DebugPanel {
        &mut self.panel
    }

    pub fn recorder(&self) -> SharedContactRecorder {
        Arc::clone(&self.recorder)
    }

    pub fn font(&self) -> &Handle<Font> {
        &self.font
    }

    pub fn set_font(&mut self, font: Handle<Font>) {
        self.font = font;
    }

    pub fn screen_projection(&self) -> Mat4 {
        self.screen_projection
    }

    /// Rebuild the projection used by screen-fixed passes: display units,
    /// origin top-left, y down.
    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.screen_projection = Mat4::orthographic_rh(0.0, width, height, 0.0, 0.0, 1.0);
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render one frame of every enabled channel.
    pub fn render<W, B, T>(
        &mut self,
        world: &W,
        batch: &mut B,
        text: &mut T,
        projection: Mat4,
        view: Mat4,
    ) where
        W: PhysicsWorld + ?Sized,
        B: PrimitiveBatch + ?Sized,
        T: TextRenderer + ?Sized,
    {
        if !self.is_active() {
            self.strings = StringQueue::default();
            self.recorder.lock().reset();
            return;
        }
        let flags = self.flags;

        batch.begin(projection, view);
        let mut ctx = DrawContext::new(
            &mut *batch,
            self.units,
            self.circle_segments,
            &mut self.scratch,
        );

        if flags.contains(DebugViewFlags::SHAPE) {
            draw_shapes(&mut ctx, world, &self.palette);
        }
        if flags.contains(DebugViewFlags::CONTACT_POINTS) {
            let mut recorder = self.recorder.lock();
            draw_contact_points(
                &mut ctx,
                &recorder,
                &self.palette,
                flags.contains(DebugViewFlags::CONTACT_NORMALS),
            );
            recorder.reset();
        }
        if flags.contains(DebugViewFlags::POLYGON_POINTS) {
            draw_polygon_points(&mut ctx, world, self.palette.polygon_point);
        }
        if flags.contains(DebugViewFlags::JOINT) {
            for joint in world.joints() {
                ctx.joint(joint, world, &self.palette.joints);
            }
        }
        if flags.contains(DebugViewFlags::AABB) {
            draw_fat_aabbs(&mut ctx, world, self.palette.aabb);
        }
        if flags.contains(DebugViewFlags::CENTER_OF_MASS) {
            for body in world.bodies() {
                ctx.transform(Isometry2d::new(body.world_center(), body.transform.rotation));
            }
        }
        if flags.contains(DebugViewFlags::CONTROLLERS) {
            draw_controllers(&mut ctx, world, self.palette.buoyancy);
        }
        if flags.contains(DebugViewFlags::DEBUG_PANEL) {
            self.panel.render(world, &mut self.strings, self.palette.text);
        }
        ctx.end();

        if flags.contains(DebugViewFlags::PERFORMANCE_GRAPH) {
            self.graph.record_sample(world.profile().total_ms);
            batch.begin(self.screen_projection, Mat4::IDENTITY);
            let mut ctx = DrawContext::new(
                &mut *batch,
                UnitConverter::IDENTITY,
                self.circle_segments,
                &mut self.scratch,
            );
            self.graph.render(&mut ctx, &mut self.strings, &self.palette.graph);
            ctx.end();
        }

        self.strings.flush(text, &self.font);
    }

    /// Open a pass for caller-drawn primitives in simulation units.
    pub fn begin_custom_draw<'a, B: PrimitiveBatch + ?Sized>(
        &'a mut self,
        batch: &'a mut B,
        projection: Mat4,
        view: Mat4,
    ) -> DrawContext<'a, B> {
        batch.begin(projection, view);
        DrawContext::new(batch, self.units, self.circle_segments, &mut self.scratch)
    }

    /// Close a pass opened by [`Self::begin_custom_draw`].
    pub fn end_custom_draw<B: PrimitiveBatch + ?Sized>(ctx: DrawContext<'_, B>) {
        ctx.end();
    }

    /// Queue `text` in display units; flushed by the next active render.
    pub fn draw_string(&mut self, position: Vec2, text: impl Into<String>) {
        self.strings.push(position, text, self.palette.text);
    }
}

impl Drop for DebugView {
    fn drop(&mut self) {
        if let Some(id) = self.subscription {
            error!(
                "DebugView dropped while still subscribed ({:?}); call detach before the world goes away",
                id
            );
        }
    }
}

// ── Channel passes ────────────────────────────────────────────────────────────

fn draw_shapes<W, B>(ctx: &mut DrawContext<'_, B>, world: &W, palette: &ViewPalette)
where
    W: PhysicsWorld + ?Sized,
    B: PrimitiveBatch + ?Sized,
{
    for body in world.bodies() {
        let color = palette.shape_color(body);
        for fixture in &body.fixtures {
            ctx.shape(&fixture.shape, body.transform, color);
        }
    }
}

fn draw_contact_points<B: PrimitiveBatch + ?Sized>(
    ctx: &mut DrawContext<'_, B>,
    recorder: &ContactRecorder,
    palette: &ViewPalette,
    normals: bool,
) {
    for point in recorder.points() {
        match point.state {
            PointState::Added => ctx.point(point.position, POINT_MARKER_SIZE, palette.contact_added),
            PointState::Persisted => {
                ctx.point(point.position, POINT_MARKER_SIZE, palette.contact_persisted)
            }
            PointState::None | PointState::Removed => {}
        }
        if normals {
            let tip = point.position + CONTACT_NORMAL_SCALE * point.normal;
            ctx.segment(point.position, tip, palette.contact_normal);
        }
    }
}

fn draw_polygon_points<W, B>(ctx: &mut DrawContext<'_, B>, world: &W, color: Color)
where
    W: PhysicsWorld + ?Sized,
    B: PrimitiveBatch + ?Sized,
{
    for body in world.bodies() {
        for fixture in &body.fixtures {
            if let Shape::Polygon { vertices } = &fixture.shape {
                for v in vertices {
                    ctx.point(body.world_point(*v), POINT_MARKER_SIZE, color);
                }
            }
        }
    }
}

fn draw_fat_aabbs<W, B>(ctx: &mut DrawContext<'_, B>, world: &W, color: Color)
where
    W: PhysicsWorld + ?Sized,
    B: PrimitiveBatch + ?Sized,
{
    for body in world.bodies().iter().filter(|b| b.enabled) {
        for fixture in &body.fixtures {
            for proxy in &fixture.proxies {
                if let Some(aabb) = world.fat_aabb(*proxy) {
                    ctx.aabb(aabb, color);
                }
            }
        }
    }
}

fn draw_controllers<W, B>(ctx: &mut DrawContext<'_, B>, world: &W, color: Color)
where
    W: PhysicsWorld + ?Sized,
    B: PrimitiveBatch + ?Sized,
{
    for controller in world.controllers().iter().filter(|c| c.enabled) {
        match controller.kind {
            ControllerKind::Buoyancy { container, .. } => ctx.aabb(container, color),
            ControllerKind::VelocityLimit { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::tests::RecordingBatch;
    use crate::physics::{BodyType, Controller, FixtureId, JointDef, JointKind};
    use crate::testing::{ScriptedContact, ScriptedWorld};
    use crate::text::PendingText;
    use bevy::math::bounding::Aabb2d;

    fn box_vertices(half: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(-half, -half),
            Vec2::new(half, -half),
            Vec2::new(half, half),
            Vec2::new(-half, half),
        ]
    }

    fn scene() -> ScriptedWorld {
        let mut world = ScriptedWorld::new();
        let ground = world.add_body(BodyType::Static, Vec2::ZERO);
        world.add_fixture(ground, Shape::Polygon { vertices: box_vertices(1.0) });
        let ball = world.add_body(BodyType::Dynamic, Vec2::new(0.0, 2.0));
        world.add_fixture(ball, Shape::Circle { center: Vec2::ZERO, radius: 0.5 });
        world
    }

    fn view_with(flags: DebugViewFlags) -> DebugView {
        let mut config = DebugViewConfig::default();
        config.display_per_sim = 1.0;
        config.circle_segments = 8;
        config.max_contact_points = 4;
        let mut view = DebugView::new(&config).unwrap();
        view.set_flags(flags);
        view
    }

    fn render(view: &mut DebugView, world: &ScriptedWorld) -> (RecordingBatch, PendingText) {
        let mut batch = RecordingBatch::default();
        let mut text = PendingText::default();
        view.render(world, &mut batch, &mut text, Mat4::IDENTITY, Mat4::IDENTITY);
        (batch, text)
    }

    #[test]
    fn empty_flags_touch_nothing() {
        let world = scene();
        let mut view = view_with(DebugViewFlags::empty());
        view.draw_string(Vec2::ZERO, "ignored");
        let (batch, text) = render(&mut view, &world);
        assert_eq!(batch.begins, 0);
        assert_eq!(batch.ends, 0);
        assert!(batch.vertices.is_empty());
        assert!(text.entries.is_empty());
    }

    #[test]
    fn disabled_view_is_inert() {
        let world = scene();
        let mut view = view_with(DebugViewFlags::all());
        view.set_enabled(false);
        let (batch, _) = render(&mut view, &world);
        assert_eq!(batch.begins, 0);
    }

    #[test]
    fn shape_channel_draws_each_fixture() {
        let world = scene();
        let mut view = view_with(DebugViewFlags::SHAPE);
        let (batch, text) = render(&mut view, &world);

        assert_eq!((batch.begins, batch.ends), (1, 1));
        // Box fan (2 tris) + circle fan (8 tris).
        assert_eq!(batch.triangles().len(), (2 + 8) * 3);
        // Box outline (4) + circle outline (8) + radius line (1).
        assert_eq!(batch.lines().len(), (4 + 8 + 1) * 2);
        assert!(text.entries.is_empty());
    }

    #[test]
    fn shape_colors_follow_body_state() {
        let world = scene();
        let mut view = view_with(DebugViewFlags::SHAPE);
        let palette = *view.palette();
        let (batch, _) = render(&mut view, &world);
        let first_line = batch.vertices.iter().find(|v| v.2 == crate::batch::PrimitiveKind::Line);
        assert_eq!(first_line.map(|v| v.1), Some(palette.static_shape));

        let ball = &world.bodies()[1];
        assert_eq!(palette.shape_color(ball), palette.default_shape);
        let mut asleep = ball.clone();
        asleep.awake = false;
        assert_eq!(palette.shape_color(&asleep), palette.sleeping_shape);
        asleep.enabled = false;
        assert_eq!(palette.shape_color(&asleep), palette.inactive_shape);
    }

    #[test]
    fn panel_only_emits_text() {
        let world = scene();
        let mut view = view_with(DebugViewFlags::DEBUG_PANEL);
        let (batch, text) = render(&mut view, &world);
        assert_eq!(batch.begins, 1);
        assert!(batch.vertices.is_empty());
        assert_eq!(text.entries.len(), 2);
        assert!(text.entries[0].text.contains("- Bodies: 2"));
    }

    #[test]
    fn graph_uses_second_pass_and_records_sample() {
        let mut world = scene();
        world.step(1.0 / 60.0);
        let mut view = view_with(DebugViewFlags::PERFORMANCE_GRAPH);
        view.set_viewport_size(800.0, 600.0);
        let (batch, text) = render(&mut view, &world);

        assert_eq!((batch.begins, batch.ends), (2, 2));
        assert_eq!(view.graph().len(), 1);
        assert_eq!(text.entries.len(), 3);
    }

    #[test]
    fn contact_points_are_drawn_then_reset() {
        let mut world = scene();
        let mut view = view_with(DebugViewFlags::CONTACT_POINTS | DebugViewFlags::CONTACT_NORMALS);
        view.attach(&mut world).unwrap();

        world.queue_contact(ScriptedContact {
            fixture_a: FixtureId { body: world.bodies()[0].id, index: 0 },
            fixture_b: FixtureId { body: world.bodies()[1].id, index: 0 },
            normal: Vec2::Y,
            points: vec![(1, Vec2::new(0.0, 1.0))],
        });
        world.step(1.0 / 60.0);
        assert_eq!(view.recorder().lock().len(), 1);

        let (batch, _) = render(&mut view, &world);
        // One point marker + one normal.
        assert_eq!(batch.triangles().len(), 6);
        assert_eq!(batch.lines().len(), 8 + 2);
        assert!(view.recorder().lock().is_empty());

        // Second step: the same feature id now persists.
        world.step(1.0 / 60.0);
        assert_eq!(view.recorder().lock().points()[0].state, PointState::Persisted);

        view.detach(&mut world).unwrap();
    }

    #[test]
    fn removing_contact_flag_stops_capture() {
        let mut world = scene();
        let mut view = view_with(DebugViewFlags::CONTACT_POINTS);
        view.attach(&mut world).unwrap();
        view.remove_flags(DebugViewFlags::CONTACT_POINTS);
        view.append_flags(DebugViewFlags::SHAPE);

        world.queue_contact(ScriptedContact {
            fixture_a: FixtureId { body: world.bodies()[0].id, index: 0 },
            fixture_b: FixtureId { body: world.bodies()[1].id, index: 0 },
            normal: Vec2::Y,
            points: vec![(1, Vec2::ZERO)],
        });
        world.step(1.0 / 60.0);
        assert!(view.recorder().lock().is_empty());
        view.detach(&mut world).unwrap();
    }

    #[test]
    fn disabled_view_discards_contacts_until_reenabled() {
        let mut world = scene();
        let mut view = view_with(DebugViewFlags::CONTACT_POINTS);
        view.attach(&mut world).unwrap();
        world.queue_contact(ScriptedContact {
            fixture_a: FixtureId { body: world.bodies()[0].id, index: 0 },
            fixture_b: FixtureId { body: world.bodies()[1].id, index: 0 },
            normal: Vec2::Y,
            points: vec![(1, Vec2::new(0.0, 1.0))],
        });

        view.set_enabled(false);
        for _ in 0..10 {
            world.step(1.0 / 60.0);
            let (batch, _) = render(&mut view, &world);
            assert_eq!(batch.begins, 0);
        }
        assert!(view.recorder().lock().is_empty());

        view.set_enabled(true);
        world.step(1.0 / 60.0);
        let (batch, _) = render(&mut view, &world);
        // Only this frame's single point is marked.
        assert_eq!(batch.triangles().len(), 6);
        view.detach(&mut world).unwrap();
    }

    #[test]
    fn attach_and_detach_are_checked() {
        let mut world = scene();
        let mut view = view_with(DebugViewFlags::default());
        view.attach(&mut world).unwrap();
        assert_eq!(view.attach(&mut world), Err(DebugViewError::AlreadyAttached));
        view.detach(&mut world).unwrap();
        assert_eq!(view.detach(&mut world), Err(DebugViewError::NotAttached));
        assert_eq!(world.listener_count(), 0);
    }

    #[test]
    fn aabbs_skip_disabled_bodies() {
        let mut world = scene();
        let id = world.bodies()[1].id;
        world.set_body_enabled(id, false);
        let mut view = view_with(DebugViewFlags::AABB);
        let (batch, _) = render(&mut view, &world);
        assert_eq!(batch.lines().len(), 8);
    }

    #[test]
    fn polygon_points_mark_each_vertex() {
        let world = scene();
        let mut view = view_with(DebugViewFlags::POLYGON_POINTS);
        let (batch, _) = render(&mut view, &world);
        // Four box corners, each a filled square marker; the circle has none.
        assert_eq!(batch.triangles().len(), 4 * 6);
        assert_eq!(batch.lines().len(), 4 * 8);
    }

    #[test]
    fn center_of_mass_draws_axes_per_body() {
        let world = scene();
        let mut view = view_with(DebugViewFlags::CENTER_OF_MASS);
        let (batch, _) = render(&mut view, &world);
        let lines = batch.lines();
        assert_eq!(lines.len(), 2 * 4);
        assert_eq!(lines[0], Vec2::ZERO);
        assert!((lines[1] - Vec2::new(crate::constants::TRANSFORM_AXIS_SCALE, 0.0)).length() < 1e-5);
        assert_eq!(lines[4], Vec2::new(0.0, 2.0));
    }

    #[test]
    fn only_enabled_buoyancy_controllers_draw() {
        let mut world = scene();
        let container = Aabb2d {
            min: Vec2::new(-5.0, -5.0),
            max: Vec2::new(5.0, 0.0),
        };
        world.add_controller(Controller {
            enabled: true,
            kind: ControllerKind::Buoyancy { container, density: 2.0, linear_drag: 1.0 },
        });
        world.add_controller(Controller {
            enabled: false,
            kind: ControllerKind::Buoyancy { container, density: 2.0, linear_drag: 1.0 },
        });
        world.add_controller(Controller {
            enabled: true,
            kind: ControllerKind::VelocityLimit { max_linear_velocity: 1.0, max_angular_velocity: 1.0 },
        });
        let mut view = view_with(DebugViewFlags::CONTROLLERS);
        let (batch, _) = render(&mut view, &world);
        assert_eq!(batch.lines().len(), 8);
        assert_eq!(batch.lines()[0], container.min);
    }

    #[test]
    fn joint_channel_walks_world_joints() {
        let mut world = scene();
        let (a, b) = (world.bodies()[0].clone(), world.bodies()[1].clone());
        world.add_joint(JointDef::between(JointKind::Distance, &a, &b, a.position(), b.position()));
        let mut view = view_with(DebugViewFlags::JOINT);
        let (batch, _) = render(&mut view, &world);
        assert_eq!(batch.lines(), vec![Vec2::ZERO, Vec2::new(0.0, 2.0)]);
    }

    #[test]
    fn custom_draw_wraps_a_pass() {
        let mut view = view_with(DebugViewFlags::empty());
        let mut batch = RecordingBatch::default();
        let mut ctx = view.begin_custom_draw(&mut batch, Mat4::IDENTITY, Mat4::IDENTITY);
        ctx.segment(Vec2::ZERO, Vec2::X, Color::WHITE);
        DebugView::end_custom_draw(ctx);
        assert_eq!((batch.begins, batch.ends), (1, 1));
        assert_eq!(batch.lines().len(), 2);
    }

    #[test]
    fn flag_names_parse_case_insensitively() {
        assert_eq!(
            DebugViewFlags::from_names(&["shape", "CENTER_OF_MASS"]),
            Ok(DebugViewFlags::SHAPE | DebugViewFlags::CENTER_OF_MASS)
        );
        assert!(DebugViewFlags::from_names(&["bogus"]).is_err());
        assert_eq!(DebugViewFlags::from_names::<&str>(&[]), Ok(DebugViewFlags::empty()));
    }
}
