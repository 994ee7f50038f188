use bevy::math::bounding::Aabb2d;
use bevy::prelude::*;
use bevy::window::WindowResolution;
use rand::Rng;
use std::env;

use physview::config::DebugViewConfig;
use physview::graphics;
use physview::physics::{
    BodyId, BodyType, Controller, ControllerKind, JointDef, JointKind, PhysicsWorld, Shape,
};
use physview::rapier_world::{BodyDef, RapierWorld};
use physview::simulation::PhysicsDebugPlugin;

/// Scene selected with `PHYSVIEW_SCENE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scene {
    /// Scattered boxes and balls bobbing in a fluid volume.
    Playground,
    /// One of every drawable joint type.
    Joints,
    /// Box stacks settling on the floor, for the contact channels.
    Contacts,
}

impl Scene {
    fn from_env() -> Self {
        match env::var("PHYSVIEW_SCENE").ok().as_deref() {
            Some("joints") => Scene::Joints,
            Some("contacts") => Scene::Contacts,
            Some("playground") | None => Scene::Playground,
            Some(other) => {
                eprintln!("Unknown scene '{other}', using playground");
                Scene::Playground
            }
        }
    }
}

fn box_shape(half: Vec2) -> Shape {
    Shape::Polygon {
        vertices: vec![
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ],
    }
}

fn ball(radius: f32) -> Shape {
    Shape::Circle {
        center: Vec2::ZERO,
        radius,
    }
}

/// Static frame shared by every scene: floor box, wall edge and a chain.
fn spawn_ground(world: &mut RapierWorld) -> BodyId {
    let ground = world.add_body(BodyDef::new(BodyType::Static, Vec2::new(0.0, -3.0)));
    world.add_fixture(ground, box_shape(Vec2::new(5.5, 0.15)));
    world.add_fixture(
        ground,
        Shape::Edge {
            v1: Vec2::new(-5.5, 0.15),
            v2: Vec2::new(-5.5, 5.8),
        },
    );
    world.add_fixture(
        ground,
        Shape::Chain {
            vertices: vec![
                Vec2::new(5.5, 5.8),
                Vec2::new(5.5, 1.0),
                Vec2::new(5.0, 0.5),
                Vec2::new(4.0, 0.15),
            ],
        },
    );
    ground
}

fn connect(
    world: &mut RapierWorld,
    kind: JointKind,
    a: BodyId,
    b: BodyId,
    anchor_a: Vec2,
    anchor_b: Vec2,
) {
    let def = match (world.body(a), world.body(b)) {
        (Some(body_a), Some(body_b)) => JointDef::between(kind, body_a, body_b, anchor_a, anchor_b),
        _ => {
            warn!("Cannot join {:?} and {:?}: body missing", a, b);
            return;
        }
    };
    world.add_joint(def);
}

fn build_playground(world: &mut RapierWorld) {
    let mut rng = rand::thread_rng();
    spawn_ground(world);

    for _ in 0..12 {
        let position = Vec2::new(rng.gen_range(-4.5..4.5), rng.gen_range(-1.0..3.0));
        let mut def = BodyDef::dynamic(position);
        def.angle = rng.gen_range(0.0..std::f32::consts::TAU);
        def.angular_velocity = rng.gen_range(-1.0..1.0);
        let body = world.add_body(def);
        if rng.gen_bool(0.5) {
            world.add_fixture(body, ball(rng.gen_range(0.15..0.35)));
        } else {
            let half = Vec2::new(rng.gen_range(0.15..0.35), rng.gen_range(0.15..0.35));
            world.add_fixture(body, box_shape(half));
        }
    }

    // One sleeping and one disabled body so every shape colour shows up.
    let sleeper = world.add_body(BodyDef::dynamic(Vec2::new(-3.0, -2.5)));
    world.add_fixture(sleeper, box_shape(Vec2::splat(0.25)));
    world.set_awake(sleeper, false);
    let disabled = world.add_body(BodyDef::dynamic(Vec2::new(-2.0, -2.5)));
    world.add_fixture(disabled, ball(0.25));
    world.set_body_enabled(disabled, false);

    let platform = world.add_body(BodyDef::new(BodyType::Kinematic, Vec2::new(0.0, 2.5)));
    world.add_fixture(platform, box_shape(Vec2::new(1.0, 0.1)));
    world.set_velocity(platform, Vec2::ZERO, 0.5);

    world.add_controller(Controller {
        enabled: true,
        kind: ControllerKind::Buoyancy {
            container: Aabb2d::new(Vec2::new(0.0, -1.9), Vec2::new(5.5, 0.95)),
            density: 1.5,
            linear_drag: 2.0,
        },
    });
    world.add_controller(Controller {
        enabled: true,
        kind: ControllerKind::VelocityLimit {
            max_linear_velocity: 6.0,
            max_angular_velocity: 4.0,
        },
    });
}

fn build_joints(world: &mut RapierWorld) {
    let ground = spawn_ground(world);
    world.set_gravity(Vec2::ZERO);

    let hub = world.add_body(BodyDef::dynamic(Vec2::new(-4.0, 1.5)));
    world.add_fixture(hub, ball(0.3));
    world.set_velocity(hub, Vec2::ZERO, 1.5);
    connect(world, JointKind::Revolute, ground, hub, Vec2::new(-4.0, 1.5), Vec2::new(-4.0, 1.5));

    let bob = world.add_body(BodyDef::dynamic(Vec2::new(-2.5, 0.0)));
    world.add_fixture(bob, ball(0.2));
    connect(world, JointKind::Distance, hub, bob, Vec2::new(-4.0, 1.5), Vec2::new(-2.5, 0.0));

    let left = world.add_body(BodyDef::dynamic(Vec2::new(-1.0, 0.0)));
    world.add_fixture(left, box_shape(Vec2::splat(0.2)));
    let right = world.add_body(BodyDef::dynamic(Vec2::new(1.0, -0.5)));
    world.add_fixture(right, box_shape(Vec2::splat(0.2)));
    let def = match (world.body(left), world.body(right)) {
        (Some(a), Some(b)) => Some(JointDef::between(
            JointKind::Pulley {
                pulley_a: a.local_point(Vec2::new(-1.0, 2.5)),
                pulley_b: b.local_point(Vec2::new(1.0, 2.5)),
            },
            a,
            b,
            a.position(),
            b.position(),
        )),
        _ => None,
    };
    if let Some(def) = def {
        world.add_joint(def);
    }

    let gear_a = world.add_body(BodyDef::dynamic(Vec2::new(2.5, 1.0)));
    world.add_fixture(gear_a, ball(0.4));
    let gear_b = world.add_body(BodyDef::dynamic(Vec2::new(3.5, 1.0)));
    world.add_fixture(gear_b, ball(0.4));
    connect(world, JointKind::Gear, gear_a, gear_b, Vec2::new(2.5, 1.0), Vec2::new(3.5, 1.0));

    let plank = world.add_body(BodyDef::dynamic(Vec2::new(2.5, -1.5)));
    world.add_fixture(plank, box_shape(Vec2::new(0.5, 0.1)));
    connect(world, JointKind::Weld, plank, ground, Vec2::new(2.5, -1.5), Vec2::new(2.5, -1.5));

    let anchor = world.add_body(BodyDef::new(BodyType::Static, Vec2::new(0.0, 3.0)));
    let swing = world.add_body(BodyDef::dynamic(Vec2::new(0.5, 1.8)));
    world.add_fixture(swing, ball(0.15));
    connect(world, JointKind::Rope, anchor, swing, Vec2::new(0.0, 3.0), Vec2::new(0.5, 1.8));
}

fn build_contacts(world: &mut RapierWorld) {
    spawn_ground(world);

    for column in 0..4 {
        let x = -3.0 + column as f32 * 2.0;
        for row in 0..(column + 1) {
            let y = -2.6 + row as f32 * 0.5;
            let body = world.add_body(BodyDef::dynamic(Vec2::new(x, y)));
            world.add_fixture(body, box_shape(Vec2::new(0.4, 0.25)));
        }
    }

    let dropped = world.add_body(BodyDef::dynamic(Vec2::new(-2.0, 3.0)));
    world.add_fixture(dropped, ball(0.3));
}

fn main() {
    let scene = Scene::from_env();

    let mut world = RapierWorld::default();
    match scene {
        Scene::Playground => build_playground(&mut world),
        Scene::Joints => build_joints(&mut world),
        Scene::Contacts => build_contacts(&mut world),
    }

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Physview".into(),
            resolution: WindowResolution::new(1200, 680),
            ..Default::default()
        }),
        ..Default::default()
    }))
    .insert_resource(ClearColor(Color::BLACK))
    // Compiled defaults; load_debug_view_config overwrites them from
    // assets/debug_view.toml (if present) during Startup.
    .insert_resource(DebugViewConfig::default())
    .insert_resource(world)
    .add_plugins(PhysicsDebugPlugin::<RapierWorld>::default())
    .add_systems(Startup, graphics::setup_camera);

    println!("Running scene: {:?}", scene);
    app.run();
}
