//! Orbit camera controller
//!
//! Controls:
//! - Middle mouse drag: Orbit around target
//! - Shift + Middle mouse drag: Pan
//! - Scroll wheel: Dolly (zoom)
//!
//! The interaction layer can suspend the controller (e.g. while the move
//! tool drags a node) through [`OrbitControls`].

use bevy::input::mouse::{MouseButton, MouseMotion, MouseWheel};
use bevy::prelude::*;
use vista_interaction::{OrbitControls, PickCamera, PickProjection};

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Camera orbit controller state
#[derive(Component)]
pub struct OrbitCamera {
    /// Point the camera orbits around
    pub target: Vec3,
    /// Distance from target
    pub distance: f32,
    /// Horizontal angle (yaw) in radians
    pub yaw: f32,
    /// Vertical angle (pitch) in radians
    pub pitch: f32,
    /// Orbit sensitivity (radians per pixel)
    pub orbit_sensitivity: f32,
    /// Pan sensitivity (units per pixel, scaled by distance)
    pub pan_sensitivity: f32,
    /// Zoom sensitivity (distance units per scroll line)
    pub zoom_sensitivity: f32,
    /// Minimum distance from target
    pub min_distance: f32,
    /// Maximum distance from target
    pub max_distance: f32,
    /// When false all input is ignored
    pub enabled: bool,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        // (6, 5, 6) looking at the origin
        Self {
            target: Vec3::ZERO,
            distance: 9.85,
            yaw: std::f32::consts::FRAC_PI_4,
            pitch: 0.53,
            orbit_sensitivity: 0.005,
            pan_sensitivity: 0.002,
            zoom_sensitivity: 1.0,
            min_distance: 0.5,
            max_distance: 200.0,
            enabled: true,
        }
    }
}

impl OrbitCamera {
    /// Calculate camera position from orbit parameters
    pub fn calculate_position(&self) -> Vec3 {
        // Pitch is the angle from horizontal, yaw the angle around Y
        let horizontal_distance = self.distance * self.pitch.cos();
        let y = self.distance * self.pitch.sin();
        let x = horizontal_distance * self.yaw.sin();
        let z = horizontal_distance * self.yaw.cos();

        self.target + Vec3::new(x, y, z)
    }
}

impl OrbitControls for OrbitCamera {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Snapshot of a Bevy camera for picking
pub fn pick_camera(transform: &GlobalTransform, projection: &Projection) -> PickCamera {
    let projection = match projection {
        // `area` already includes the projection's scale
        Projection::Orthographic(ortho) => PickProjection::Orthographic {
            half_width: ortho.area.width() * 0.5,
            half_height: ortho.area.height() * 0.5,
        },
        Projection::Perspective(perspective) => PickProjection::Perspective {
            fov_y: perspective.fov,
            aspect: perspective.aspect_ratio,
        },
        // Custom projections are treated as the default perspective
        _ => {
            let perspective = PerspectiveProjection::default();
            PickProjection::Perspective {
                fov_y: perspective.fov,
                aspect: perspective.aspect_ratio,
            }
        }
    };

    PickCamera {
        world_from_view: transform.affine(),
        projection,
    }
}

/// Plugin for orbit camera controls
pub struct CameraControllerPlugin;

impl Plugin for CameraControllerPlugin {
    fn build(&self, app: &mut App) {
        // Orbit and pan both read MouseMotion, so they run sequentially
        app.add_systems(
            Update,
            (
                camera_orbit_system,
                camera_pan_system.after(camera_orbit_system),
                camera_zoom_system,
                update_camera_transform
                    .after(camera_orbit_system)
                    .after(camera_pan_system)
                    .after(camera_zoom_system),
            ),
        );
    }
}

fn shift_held(key_input: &ButtonInput<KeyCode>) -> bool {
    key_input.pressed(KeyCode::ShiftLeft) || key_input.pressed(KeyCode::ShiftRight)
}

/// Handle orbit (middle mouse drag without shift)
fn camera_orbit_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    key_input: Res<ButtonInput<KeyCode>>,
    mut motion_events: MessageReader<MouseMotion>,
    mut camera_query: Query<&mut OrbitCamera>,
) {
    if !mouse_button.pressed(MouseButton::Middle) || shift_held(&key_input) {
        motion_events.clear();
        return;
    }

    let mut delta = Vec2::ZERO;
    for event in motion_events.read() {
        delta += event.delta;
    }

    if delta == Vec2::ZERO {
        return;
    }

    for mut orbit in camera_query.iter_mut() {
        if !orbit.enabled {
            continue;
        }
        orbit.yaw -= delta.x * orbit.orbit_sensitivity;
        orbit.pitch -= delta.y * orbit.orbit_sensitivity;

        // Just below straight up/down
        orbit.pitch = orbit.pitch.clamp(-1.5, 1.5);
    }
}

/// Handle pan (shift + middle mouse drag)
fn camera_pan_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    key_input: Res<ButtonInput<KeyCode>>,
    mut motion_events: MessageReader<MouseMotion>,
    mut camera_query: Query<(&mut OrbitCamera, &Transform)>,
) {
    if !mouse_button.pressed(MouseButton::Middle) || !shift_held(&key_input) {
        motion_events.clear();
        return;
    }

    let mut delta = Vec2::ZERO;
    for event in motion_events.read() {
        delta += event.delta;
    }

    if delta == Vec2::ZERO {
        return;
    }

    for (mut orbit, transform) in camera_query.iter_mut() {
        if !orbit.enabled {
            continue;
        }
        let right = transform.rotation * Vec3::X;
        let up = transform.rotation * Vec3::Y;

        // Scale pan by distance so it feels consistent at different zoom levels
        let pan_scale = orbit.pan_sensitivity * orbit.distance;
        let pan_offset = (-right * delta.x + up * delta.y) * pan_scale;
        orbit.target += pan_offset;
    }
}

/// Handle zoom (scroll wheel)
fn camera_zoom_system(
    mut scroll_events: MessageReader<MouseWheel>,
    mut camera_query: Query<&mut OrbitCamera>,
) {
    let mut scroll_delta = 0.0;
    for event in scroll_events.read() {
        scroll_delta += event.y;
    }

    if scroll_delta == 0.0 {
        return;
    }

    for mut orbit in camera_query.iter_mut() {
        if !orbit.enabled {
            continue;
        }
        let zoom_amount = scroll_delta * orbit.zoom_sensitivity * (orbit.distance * 0.1);
        orbit.distance = (orbit.distance - zoom_amount).clamp(orbit.min_distance, orbit.max_distance);
    }
}

/// Update camera transform from orbit state
fn update_camera_transform(
    mut camera_query: Query<(&OrbitCamera, &mut Transform), (With<MainCamera>, Changed<OrbitCamera>)>,
) {
    for (orbit, mut transform) in camera_query.iter_mut() {
        let position = orbit.calculate_position();
        *transform = Transform::from_translation(position).looking_at(orbit.target, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_position_is_above_ground() {
        let orbit = OrbitCamera::default();
        let position = orbit.calculate_position();
        assert!(position.y > 0.0);
        assert!((position.length() - orbit.distance).abs() < 1e-4);
    }

    #[test]
    fn test_pick_camera_follows_transform() {
        let transform = GlobalTransform::from(Transform::from_xyz(0.0, 2.0, 5.0).looking_at(Vec3::ZERO, Vec3::Y));
        let camera = pick_camera(&transform, &Projection::Perspective(PerspectiveProjection::default()));
        assert!((camera.position() - Vec3::new(0.0, 2.0, 5.0)).length() < 1e-5);

        let ray = camera.ray_from_ndc(Vec2::ZERO);
        let expected = (Vec3::ZERO - Vec3::new(0.0, 2.0, 5.0)).normalize();
        assert!(ray.direction.dot(expected) > 0.999);
    }
}
