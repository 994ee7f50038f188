//! Bevy sinks for the debug view: batched vertices and queued text.
//!
//! ## Layer Model
//!
//! | Layer          | Technology | Source                         |
//! |----------------|------------|--------------------------------|
//! | Lines          | Gizmos     | `BatchPass::lines`             |
//! | Filled solids  | `Mesh2d`   | `BatchPass::triangles`         |
//! | Panel & labels | Bevy UI    | `PendingText` via a node pool  |
//!
//! ## System Responsibilities
//!
//! | System                     | Schedule | Purpose                                |
//! |----------------------------|----------|----------------------------------------|
//! | `setup_debug_fill_mesh`    | Startup  | Spawn the retained triangle mesh       |
//! | `flush_debug_batch_system` | Last     | Drain `VertexBatch` into gizmos + mesh |
//! | `flush_debug_text_system`  | Last     | Drain `PendingText` into UI text nodes |
//!
//! Every pass is mapped back to world space through its own
//! projection/view pair, so the screen-fixed graph pass stays put while the
//! camera moves.

use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_mesh::PrimitiveTopology;

use crate::batch::VertexBatch;
use crate::config::DebugViewConfig;
use crate::text::PendingText;

/// Z of the fill mesh; above typical sprites.
const DEBUG_FILL_Z: f32 = 10.0;

/// Marks the entity carrying the batched triangle mesh.
#[derive(Component)]
pub struct DebugFillMesh;

/// Marks a pooled overlay text node.
#[derive(Component)]
pub struct DebugTextNode;

/// Text nodes reused across frames, in spawn order.
#[derive(Resource, Default)]
pub struct DebugTextPool {
    nodes: Vec<Entity>,
}

impl DebugTextPool {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// Spawn the fill-mesh entity; hidden until a frame has triangles.
pub fn setup_debug_fill_mesh(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let mesh = meshes.add(vertex_color_mesh(Vec::new(), Vec::new()));
    // White so vertex colours pass through unchanged.
    let mat = materials.add(ColorMaterial::from_color(Color::WHITE));
    commands.spawn((
        Mesh2d(mesh),
        MeshMaterial2d(mat),
        Transform::from_translation(Vec3::new(0.0, 0.0, DEBUG_FILL_Z)),
        Visibility::Hidden,
        DebugFillMesh,
    ));
}

// ── Per-frame flush ───────────────────────────────────────────────────────────

/// Drain every completed batch pass: lines become gizmos, triangles are
/// rebuilt into the fill mesh.
pub fn flush_debug_batch_system(
    mut batch: ResMut<VertexBatch>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera2d>>,
    mut gizmos: Gizmos,
    mut meshes: ResMut<Assets<Mesh>>,
    mut fill: Query<(&Mesh2d, &mut Visibility), With<DebugFillMesh>>,
) {
    let passes = batch.take_passes();
    let Some((camera, cam_tf)) = cameras.iter().next() else {
        return;
    };
    let world_from_clip = Mat4::from(cam_tf.affine()) * camera.clip_from_view().inverse();

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut colors: Vec<[f32; 4]> = Vec::new();
    for pass in &passes {
        let world_from_display = world_from_clip * pass.clip_from_display();
        for pair in pass.lines.chunks_exact(2) {
            gizmos.line_2d(
                project(world_from_display, pair[0].position),
                project(world_from_display, pair[1].position),
                pair[0].color,
            );
        }
        for v in pass.triangles.chunks_exact(3).flatten() {
            let p = project(world_from_display, v.position);
            positions.push([p.x, p.y, 0.0]);
            let c = v.color.to_linear();
            colors.push([c.red, c.green, c.blue, c.alpha]);
        }
    }

    let Ok((mesh2d, mut visibility)) = fill.single_mut() else {
        return;
    };
    if positions.is_empty() {
        *visibility = Visibility::Hidden;
        return;
    }
    if let Some(mesh) = meshes.get_mut(&mesh2d.0) {
        *mesh = vertex_color_mesh(positions, colors);
        *visibility = Visibility::Visible;
    }
}

/// Move queued strings into pooled UI text nodes; spawn nodes on demand and
/// hide the ones not needed this frame.
pub fn flush_debug_text_system(
    mut commands: Commands,
    mut pending: ResMut<PendingText>,
    mut pool: ResMut<DebugTextPool>,
    config: Res<DebugViewConfig>,
    mut nodes: Query<
        (&mut Text, &mut TextFont, &mut Node, &mut TextColor, &mut Visibility),
        With<DebugTextNode>,
    >,
) {
    let font = pending.font.clone();
    let used = pending.entries.len();

    for (i, entry) in pending.entries.drain(..).enumerate() {
        let existing = pool.nodes.get(i).copied();
        match existing.and_then(|e| nodes.get_mut(e).ok()) {
            Some((mut text, mut text_font, mut node, mut color, mut visibility)) => {
                if text.0 != entry.text {
                    text.0 = entry.text;
                }
                if text_font.font != font {
                    text_font.font = font.clone();
                }
                if text_font.font_size != config.font_size {
                    text_font.font_size = config.font_size;
                }
                node.left = Val::Px(entry.position.x);
                node.top = Val::Px(entry.position.y);
                color.0 = entry.color;
                *visibility = Visibility::Visible;
            }
            None => {
                let entity = commands
                    .spawn((
                        Text::new(entry.text),
                        TextFont {
                            font: font.clone(),
                            font_size: config.font_size,
                            ..default()
                        },
                        TextColor(entry.color),
                        Node {
                            position_type: PositionType::Absolute,
                            left: Val::Px(entry.position.x),
                            top: Val::Px(entry.position.y),
                            ..default()
                        },
                        Visibility::Visible,
                        DebugTextNode,
                    ))
                    .id();
                if i < pool.nodes.len() {
                    pool.nodes[i] = entity;
                } else {
                    pool.nodes.push(entity);
                }
            }
        }
    }

    for &entity in pool.nodes.iter().skip(used) {
        if let Ok((_, _, _, _, mut visibility)) = nodes.get_mut(entity) {
            *visibility = Visibility::Hidden;
        }
    }
}

// ── Geometry helpers ──────────────────────────────────────────────────────────

fn project(m: Mat4, p: Vec2) -> Vec2 {
    m.project_point3(p.extend(0.0)).truncate()
}

/// Non-indexed triangle list with per-vertex colours.
///
/// Kept in the main world as well so it can be rebuilt in place each frame.
pub fn vertex_color_mesh(positions: Vec<[f32; 3]>, colors: Vec<[f32; 4]>) -> Mesh {
    let normals: Vec<[f32; 3]> = vec![[0.0, 0.0, 1.0]; positions.len()];
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextRenderer;

    #[test]
    fn mesh_has_one_colour_per_vertex() {
        let mesh = vertex_color_mesh(vec![[0.0; 3]; 6], vec![[1.0; 4]; 6]);
        assert_eq!(mesh.count_vertices(), 6);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_COLOR).is_some());
    }

    #[test]
    fn identity_pass_projects_unchanged() {
        let p = Vec2::new(12.0, -4.0);
        assert_eq!(project(Mat4::IDENTITY, p), p);
    }

    #[test]
    fn text_nodes_are_pooled_and_hidden() {
        let mut world = World::new();
        world.insert_resource(DebugViewConfig::default());
        world.init_resource::<DebugTextPool>();
        let mut pending = PendingText::default();
        pending.draw_string(&Handle::default(), "a", Vec2::ZERO, Color::WHITE);
        pending.draw_string(&Handle::default(), "b", Vec2::Y, Color::WHITE);
        world.insert_resource(pending);

        let mut schedule = Schedule::default();
        schedule.add_systems(flush_debug_text_system);
        schedule.run(&mut world);
        assert_eq!(world.resource::<DebugTextPool>().len(), 2);

        world
            .resource_mut::<PendingText>()
            .draw_string(&Handle::default(), "c", Vec2::ZERO, Color::WHITE);
        schedule.run(&mut world);

        assert_eq!(world.resource::<DebugTextPool>().len(), 2);
        let mut query = world.query_filtered::<(&Text, &Visibility), With<DebugTextNode>>();
        let mut visible: Vec<String> = query
            .iter(&world)
            .filter(|(_, v)| **v == Visibility::Visible)
            .map(|(t, _)| t.0.clone())
            .collect();
        visible.sort();
        assert_eq!(visible, vec!["c".to_string()]);
    }

    #[test]
    fn reused_nodes_pick_up_new_font_size() {
        let mut world = World::new();
        world.insert_resource(DebugViewConfig::default());
        world.init_resource::<DebugTextPool>();
        let mut pending = PendingText::default();
        pending.draw_string(&Handle::default(), "fps", Vec2::ZERO, Color::WHITE);
        world.insert_resource(pending);

        let mut schedule = Schedule::default();
        schedule.add_systems(flush_debug_text_system);
        schedule.run(&mut world);

        world.resource_mut::<DebugViewConfig>().font_size = 24.0;
        world
            .resource_mut::<PendingText>()
            .draw_string(&Handle::default(), "fps", Vec2::ZERO, Color::WHITE);
        schedule.run(&mut world);

        assert_eq!(world.resource::<DebugTextPool>().len(), 1);
        let mut query = world.query_filtered::<&TextFont, With<DebugTextNode>>();
        let sizes: Vec<f32> = query.iter(&world).map(|f| f.font_size).collect();
        assert_eq!(sizes, vec![24.0]);
    }
}
