//! Demo content: camera, lights, and a small interaction scene
//!
//! Extra hotkeys:
//! - Delete: Unload the selected node and release its resources
//! - H: Toggle visibility of the selected nodes

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::GlobalAmbientLight;
use bevy::prelude::*;
use vista_interaction::markers::{self, POINT_COLOR};
use vista_interaction::shapes::{cuboid, uv_sphere};
use vista_interaction::{Material, NodeDesc, NodeTransform, SceneGraph, SelectionContext};
use vista_viewer::{InteractionLayer, MainCamera, OrbitCamera, ViewerSet};

pub struct DemoScenePlugin;

impl Plugin for DemoScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_view, populate_scene))
            .add_systems(Update, handle_demo_hotkeys.before(ViewerSet::Input));
    }
}

/// Camera with orbit controls, sun, ambient light, and a ground plane
fn setup_view(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let orbit_camera = OrbitCamera::default();
    let camera_position = orbit_camera.calculate_position();
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(camera_position).looking_at(orbit_camera.target, Vec3::Y),
        Tonemapping::Reinhard,
        MainCamera,
        orbit_camera,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::default().looking_to(Vec3::new(-0.4, -1.0, -0.3), Vec3::Y),
    ));
    commands.insert_resource(GlobalAmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
        ..default()
    });

    // Ground is Bevy-only, so it is never picked
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(20.0, 20.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.3, 0.3, 0.3),
            perceptual_roughness: 0.8,
            ..default()
        })),
        Transform::from_xyz(0.0, -0.001, 0.0),
        Name::new("Ground"),
    ));
}

/// Meshes, a grouped model, a point, and a measurement
fn build_demo(scene: &mut SceneGraph, marker_radius: f32) -> vista_interaction::Result<()> {
    let root = scene.root();

    let resources = scene.resources_mut();
    let cube_geometry = resources.add_geometry(cuboid(Vec3::splat(0.5)));
    let cube_material = resources.add_material(Material::from_color(Vec4::new(0.8, 0.2, 0.2, 1.0)));
    scene.add(root, NodeDesc::mesh("Cube", cube_geometry, cube_material).at(Vec3::new(0.0, 0.5, 0.0)))?;

    let resources = scene.resources_mut();
    let sphere_geometry = resources.add_geometry(uv_sphere(0.5, 32, 18));
    let sphere_material = resources.add_material(Material::from_color(Vec4::new(0.2, 0.6, 0.8, 1.0)));
    scene.add(
        root,
        NodeDesc::mesh("Sphere", sphere_geometry, sphere_material).at(Vec3::new(2.0, 0.5, 0.0)),
    )?;

    // A loaded model: one group, two parts
    let model = scene.add(
        root,
        NodeDesc::group("Model").with_transform(NodeTransform {
            translation: Vec3::new(-2.5, 0.0, 0.5),
            rotation: Quat::from_rotation_y(0.4),
            scale: Vec3::ONE,
        }),
    )?;
    let resources = scene.resources_mut();
    let base_geometry = resources.add_geometry(cuboid(Vec3::new(0.6, 0.15, 0.6)));
    let post_geometry = resources.add_geometry(cuboid(Vec3::new(0.1, 0.6, 0.1)));
    let model_material = resources.add_material(Material::from_color(Vec4::new(0.2, 0.8, 0.3, 1.0)));
    let post_material = resources.add_material(Material::from_color(Vec4::new(0.9, 0.8, 0.2, 1.0)));
    scene.add(model, NodeDesc::mesh("Base", base_geometry, model_material).at(Vec3::new(0.0, 0.15, 0.0)))?;
    scene.add(model, NodeDesc::mesh("Post", post_geometry, post_material).at(Vec3::new(0.0, 0.9, 0.0)))?;

    scene.add(root, NodeDesc::light("Sun"))?;

    markers::add_point_marker(scene, root, "Point 0", Vec3::new(1.0, 0.0, 2.0), marker_radius, POINT_COLOR)?;
    markers::add_measurement(scene, root, Vec3::new(-1.0, 0.0, 2.5), Vec3::new(1.5, 0.0, 3.0), marker_radius)?;
    Ok(())
}

fn populate_scene(mut layer: ResMut<InteractionLayer>) {
    let InteractionLayer { scene, controller } = &mut *layer;

    match build_demo(scene, controller.config().marker_radius) {
        Ok(()) => info!("Demo scene initialized with {} nodes", scene.len()),
        Err(err) => error!("Failed to build demo scene: {}", err),
    }
    controller.notify_scene_changed();
}

/// Delete unloads the selection; H toggles its visibility
fn handle_demo_hotkeys(key_input: Res<ButtonInput<KeyCode>>, mut layer: ResMut<InteractionLayer>) {
    let InteractionLayer { scene, controller } = &mut *layer;

    if key_input.just_pressed(KeyCode::Delete) {
        for node in controller.selection().nodes() {
            controller.unload(scene, node);
        }
    }

    if key_input.just_pressed(KeyCode::KeyH) {
        for node in controller.selection().nodes() {
            let visible = scene.node(node).is_some_and(|n| n.visible);
            if let Err(err) = scene.set_visible(node, !visible) {
                warn!("Failed to toggle visibility: {}", err);
            }
        }
    }
}
