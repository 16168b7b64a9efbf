//! Camera, viewport, and reference-plane models used to build pick rays.
//!
//! The renderer owns the real camera; it hands the interaction layer a
//! [`PickCamera`] snapshot each frame.

use glam::{Affine3A, Vec2, Vec3};

use crate::ray::{ray_plane, Ray};

/// Projection parameters of the active camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickProjection {
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
        aspect: f32,
    },
    Orthographic {
        /// Half the visible width and height in world units
        half_width: f32,
        half_height: f32,
    },
}

/// Snapshot of the camera used for picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickCamera {
    /// Camera-to-world transform; the camera looks down its local -Z
    pub world_from_view: Affine3A,
    pub projection: PickProjection,
}

impl PickCamera {
    /// Perspective camera at `eye` looking at `target`
    pub fn perspective_looking_at(eye: Vec3, target: Vec3, fov_y: f32, aspect: f32) -> Self {
        let view_from_world = Affine3A::look_at_rh(eye, target, Vec3::Y);
        Self {
            world_from_view: view_from_world.inverse(),
            projection: PickProjection::Perspective { fov_y, aspect },
        }
    }

    pub fn position(&self) -> Vec3 {
        self.world_from_view.translation.into()
    }

    /// Write the world-space ray through normalized device coordinates into `ray`
    pub fn set_ray_from_ndc(&self, ndc: Vec2, ray: &mut Ray) {
        match self.projection {
            PickProjection::Perspective { fov_y, aspect } => {
                let tan_half = (fov_y * 0.5).tan();
                let view_dir = Vec3::new(ndc.x * tan_half * aspect, ndc.y * tan_half, -1.0);
                ray.origin = self.position();
                ray.direction = self
                    .world_from_view
                    .transform_vector3(view_dir)
                    .normalize_or(Vec3::NEG_Z);
            }
            PickProjection::Orthographic {
                half_width,
                half_height,
            } => {
                let view_origin = Vec3::new(ndc.x * half_width, ndc.y * half_height, 0.0);
                ray.origin = self.world_from_view.transform_point3(view_origin);
                ray.direction = self
                    .world_from_view
                    .transform_vector3(Vec3::NEG_Z)
                    .normalize_or(Vec3::NEG_Z);
            }
        }
    }

    /// Ray through normalized device coordinates
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let mut ray = Ray::default();
        self.set_ray_from_ndc(ndc, &mut ray);
        ray
    }
}

/// Bounding rectangle of the pointer-capturing surface, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewportRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rectangle at the origin with the given size
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width * 0.5, self.top + self.height * 0.5)
    }

    /// Pixel position to normalized device coordinates (x right, y up, -1..1).
    ///
    /// `None` for a degenerate rectangle.
    pub fn to_ndc(&self, pointer: Vec2) -> Option<Vec2> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            ((pointer.x - self.left) / self.width) * 2.0 - 1.0,
            -((pointer.y - self.top) / self.height) * 2.0 + 1.0,
        ))
    }
}

/// Horizontal plane the point and measure tools place onto
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPlane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl GroundPlane {
    /// Plane `y = height`
    pub fn at_height(height: f32) -> Self {
        Self {
            point: Vec3::new(0.0, height, 0.0),
            normal: Vec3::Y,
        }
    }

    /// Where `ray` crosses the plane
    pub fn intersect(&self, ray: &Ray) -> Option<Vec3> {
        ray_plane(ray, self.point, self.normal).map(|t| ray.at(t))
    }
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self::at_height(0.0)
    }
}

/// Orbit-control collaborator; the move tool suspends it while dragging
pub trait OrbitControls {
    fn set_enabled(&mut self, enabled: bool);
    fn is_enabled(&self) -> bool;
}

/// Orbit controls with no camera behind them, for hosts without orbiting
#[derive(Debug, Clone, Copy)]
pub struct FixedCamera {
    enabled: bool,
}

impl Default for FixedCamera {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl OrbitControls for FixedCamera {
    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_pixel_maps_to_ndc_origin() {
        let rect = ViewportRect::new(10.0, 20.0, 800.0, 600.0);
        let ndc = rect.to_ndc(Vec2::new(410.0, 320.0)).unwrap();
        assert!(ndc.length() < 1e-6);

        let top_left = rect.to_ndc(Vec2::new(10.0, 20.0)).unwrap();
        assert!((top_left - Vec2::new(-1.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_degenerate_rect_has_no_ndc() {
        assert!(ViewportRect::sized(0.0, 600.0).to_ndc(Vec2::ZERO).is_none());
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = PickCamera::perspective_looking_at(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            std::f32::consts::FRAC_PI_3,
            1.5,
        );
        let ray = camera.ray_from_ndc(Vec2::ZERO);
        assert!((ray.origin - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-5);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_orthographic_rays_are_parallel() {
        let mut camera = PickCamera::perspective_looking_at(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, 1.0, 1.0);
        camera.projection = PickProjection::Orthographic {
            half_width: 4.0,
            half_height: 4.0,
        };
        // Looking straight down: up vector Y is degenerate, so build the transform directly
        camera.world_from_view = Affine3A::from_rotation_translation(
            glam::Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
            Vec3::new(0.0, 5.0, 0.0),
        );

        let a = camera.ray_from_ndc(Vec2::new(-1.0, 0.0));
        let b = camera.ray_from_ndc(Vec2::new(1.0, 0.0));
        assert!((a.direction - b.direction).length() < 1e-5);
        assert!((a.origin.x - -4.0).abs() < 1e-5);
        assert!((b.origin.x - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_ground_plane_intersection() {
        let plane = GroundPlane::at_height(1.0);
        let ray = Ray::new(Vec3::new(3.0, 5.0, 2.0), Vec3::NEG_Y);
        let hit = plane.intersect(&ray).unwrap();
        assert!((hit - Vec3::new(3.0, 1.0, 2.0)).length() < 1e-5);
    }
}
