//! Second camera for highlight overlays.
//!
//! Overlay meshes (hover fills, selection outlines) live on their own render
//! layer and are drawn by a camera that renders after the main one without
//! clearing colour. It starts from an empty depth buffer, so scene geometry
//! never hides an overlay.

use bevy::camera::ClearColorConfig;
use bevy::camera::visibility::RenderLayers;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::prelude::*;

use crate::ViewerSet;
use crate::camera::MainCamera;

/// Render layer carrying meshes whose material ignores depth
pub const OVERLAY_LAYER: usize = 1;

/// Marker for the overlay camera
#[derive(Component)]
pub struct OverlayCamera;

pub struct OverlayCameraPlugin;

impl Plugin for OverlayCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (spawn_overlay_camera, sync_overlay_camera)
                .chain()
                .in_set(ViewerSet::Mirror),
        );
    }
}

/// Give each new main camera an overlay companion
fn spawn_overlay_camera(
    mut commands: Commands,
    added: Query<(Entity, &Transform, &Projection), Added<MainCamera>>,
) {
    for (entity, transform, projection) in &added {
        commands.spawn((
            Camera3d::default(),
            Camera {
                // After the main camera, over its image
                order: 1,
                clear_color: ClearColorConfig::None,
                ..default()
            },
            // Overlay colours are exact
            Tonemapping::None,
            *transform,
            projection.clone(),
            RenderLayers::layer(OVERLAY_LAYER),
            OverlayCamera,
            Name::new("Overlay Camera"),
        ));
        debug!("Spawned overlay camera for {:?}", entity);
    }
}

/// Keep the overlay camera looking through the main camera
fn sync_overlay_camera(
    main_camera: Query<(&Transform, &Projection), (With<MainCamera>, Without<OverlayCamera>)>,
    mut overlay_camera: Query<(&mut Transform, &mut Projection), (With<OverlayCamera>, Without<MainCamera>)>,
) {
    let Ok((main_transform, main_projection)) = main_camera.single() else {
        return;
    };
    for (mut transform, mut projection) in &mut overlay_camera {
        if *transform != *main_transform {
            *transform = *main_transform;
        }
        // Window resizes change the aspect ratio
        if let (Projection::Perspective(main), Projection::Perspective(current)) = (main_projection, &*projection)
            && main.aspect_ratio == current.aspect_ratio
            && main.fov == current.fov
        {
            continue;
        }
        *projection = main_projection.clone();
    }
}
