//! Debug view plugin and systems for Bevy ECS.
//!
//! [`PhysicsDebugPlugin`] is generic over the world resource, so any type that
//! implements [`PhysicsWorld`] and [`Resource`] can be stepped and drawn.
//!
//! | System                          | Schedule  | Purpose                               |
//! |---------------------------------|-----------|---------------------------------------|
//! | `load_debug_view_config`        | Startup   | Read `assets/debug_view.toml`         |
//! | `load_debug_font`               | Startup   | Load the configured font              |
//! | `setup_debug_view`              | Startup   | Build and attach the view and stepper |
//! | `step_world_system`             | PreUpdate | Pointer picking + clamped step        |
//! | `debug_hotkey_system`           | Update    | F1–F10 flags, Space pause             |
//! | `sync_viewport_size_system`     | Update    | Screen projection follows the window  |
//! | `render_debug_view_system`      | Last      | Fill `VertexBatch` and `PendingText`  |
//! | `flush_debug_batch_system`      | Last      | Batch → gizmos + fill mesh            |
//! | `flush_debug_text_system`       | Last      | Text → UI nodes                       |
//! | `teardown_debug_view_system`    | Last      | Detach and drop the pick on `AppExit` |

use std::marker::PhantomData;

use bevy::input::{ButtonInput, InputSystems};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::batch::VertexBatch;
use crate::config::{load_debug_view_config, DebugViewConfig};
use crate::controls::debug_hotkey_system;
use crate::debug_view::DebugView;
use crate::graphics::{load_debug_font, DebugFont};
use crate::physics::PhysicsWorld;
use crate::rendering::{
    flush_debug_batch_system, flush_debug_text_system, setup_debug_fill_mesh, DebugTextPool,
};
use crate::stepper::{PointerInput, WorldStepper};
use crate::text::PendingText;
use crate::units::UnitConverter;

pub struct PhysicsDebugPlugin<W> {
    /// Register the gizmo/mesh/UI sinks. Off for headless hosts that read
    /// `VertexBatch` and `PendingText` themselves.
    pub render_adapters: bool,
    marker: PhantomData<fn() -> W>,
}

impl<W> Default for PhysicsDebugPlugin<W> {
    fn default() -> Self {
        Self {
            render_adapters: true,
            marker: PhantomData,
        }
    }
}

impl<W> PhysicsDebugPlugin<W> {
    pub fn headless() -> Self {
        Self {
            render_adapters: false,
            marker: PhantomData,
        }
    }
}

impl<W: PhysicsWorld + Resource> Plugin for PhysicsDebugPlugin<W> {
    fn build(&self, app: &mut App) {
        app.init_resource::<DebugViewConfig>()
            .init_resource::<DebugFont>()
            .init_resource::<VertexBatch>()
            .init_resource::<PendingText>()
            .add_systems(
                Startup,
                (
                    load_debug_view_config,
                    load_debug_font,
                    setup_debug_view::<W>,
                )
                    .chain(),
            )
            .add_systems(PreUpdate, step_world_system::<W>.after(InputSystems))
            .add_systems(Update, (debug_hotkey_system, sync_viewport_size_system))
            .add_systems(
                Last,
                (render_debug_view_system::<W>, teardown_debug_view_system::<W>).chain(),
            );

        if self.render_adapters {
            app.init_resource::<DebugTextPool>()
                .add_systems(Startup, setup_debug_fill_mesh)
                .add_systems(
                    Last,
                    (flush_debug_batch_system, flush_debug_text_system)
                        .after(render_debug_view_system::<W>),
                );
        }
    }
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// Build the [`DebugView`] and [`WorldStepper`] from the loaded config and
/// subscribe the view to the world.
///
/// An invalid config falls back to defaults with an `error!`; the app keeps
/// running.
pub fn setup_debug_view<W: PhysicsWorld + Resource>(
    mut commands: Commands,
    config: Res<DebugViewConfig>,
    font: Res<DebugFont>,
    mut world: ResMut<W>,
) {
    let (mut view, config) = match DebugView::new(&config) {
        Ok(view) => (view, (*config).clone()),
        Err(e) => {
            error!("{e}; using default debug view settings");
            (DebugView::default(), DebugViewConfig::default())
        }
    };
    view.set_font(font.0.clone());
    if let Err(e) = view.attach(&mut *world) {
        warn!("{e}");
    }

    commands.insert_resource(WorldStepper::new(&config));
    commands.insert_resource(UnitConverter::new(config.display_per_sim));
    commands.insert_resource(view);
    info!("Debug view ready ({:?})", config.initial_flags);
}

// ── PreUpdate ─────────────────────────────────────────────────────────────────

/// Advance the world by the clamped frame delta, handling mouse picking first.
pub fn step_world_system<W: PhysicsWorld + Resource>(
    mut world: ResMut<W>,
    mut stepper: ResMut<WorldStepper>,
    time: Res<Time>,
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
) {
    let mut pointer = None;
    if let Some(buttons) = buttons {
        pointer = cursor_world_position(&windows, &cameras).map(|position| PointerInput {
            position,
            pressed: buttons.just_pressed(MouseButton::Left),
            held: buttons.pressed(MouseButton::Left),
            released: buttons.just_released(MouseButton::Left),
        });
        // A release outside the window must still drop the pick.
        if pointer.is_none() && buttons.just_released(MouseButton::Left) {
            stepper.release(&mut *world);
        }
    }
    stepper.update(&mut *world, time.delta_secs(), pointer);
}

fn cursor_world_position(
    windows: &Query<&Window, With<PrimaryWindow>>,
    cameras: &Query<(&Camera, &GlobalTransform), With<Camera2d>>,
) -> Option<Vec2> {
    let window = windows.iter().next()?;
    let cursor = window.cursor_position()?;
    let (camera, cam_tf) = cameras.iter().next()?;
    camera.viewport_to_world_2d(cam_tf, cursor).ok()
}

// ── Update ────────────────────────────────────────────────────────────────────

/// Rebuild the screen projection whenever the primary window resizes.
pub fn sync_viewport_size_system(
    windows: Query<&Window, (With<PrimaryWindow>, Changed<Window>)>,
    mut view: ResMut<DebugView>,
) {
    if let Some(window) = windows.iter().next() {
        view.set_viewport_size(window.width(), window.height());
    }
}

// ── Last ──────────────────────────────────────────────────────────────────────

/// Render the debug view with the first 2D camera's projection and view.
/// Without a camera the world pass uses identity matrices.
pub fn render_debug_view_system<W: PhysicsWorld + Resource>(
    world: Res<W>,
    mut view: ResMut<DebugView>,
    mut batch: ResMut<VertexBatch>,
    mut text: ResMut<PendingText>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
) {
    let (projection, view_matrix) = cameras
        .iter()
        .next()
        .map(|(camera, cam_tf)| {
            (
                camera.clip_from_view(),
                Mat4::from(cam_tf.affine().inverse()),
            )
        })
        .unwrap_or((Mat4::IDENTITY, Mat4::IDENTITY));

    view.render(&*world, &mut *batch, &mut *text, projection, view_matrix);
}

/// On [`AppExit`], drop any pick joint and release the presolve subscription
/// while the world still exists.
pub fn teardown_debug_view_system<W: PhysicsWorld + Resource>(
    mut exits: MessageReader<AppExit>,
    mut world: ResMut<W>,
    mut view: ResMut<DebugView>,
    mut stepper: ResMut<WorldStepper>,
) {
    if exits.read().next().is_none() {
        return;
    }
    stepper.release(&mut *world);
    if view.is_attached() {
        if let Err(e) = view.detach(&mut *world) {
            warn!("{e}");
        }
    }
}
