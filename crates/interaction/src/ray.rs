//! Ray type and ray-primitive intersection tests.

use glam::{Affine3A, Vec3};

use crate::resources::Aabb;

/// Epsilon for floating point comparisons in ray intersection
pub const EPSILON: f32 = 1e-6;

/// Half-line from `origin` along `direction`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit-length direction
    pub direction: Vec3,
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or(Vec3::NEG_Z),
        }
    }

    /// Point at parameter `t` along the ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// This ray expressed in the space described by `inverse`.
    ///
    /// The direction is re-normalized, so distances measured on the result are
    /// local-space distances.
    pub fn transformed(&self, inverse: &Affine3A) -> Self {
        Self::new(
            inverse.transform_point3(self.origin),
            inverse.transform_vector3(self.direction),
        )
    }
}

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

/// Moller-Trumbore ray-triangle intersection, double-sided.
pub fn ray_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let pvec = ray.direction.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray lies in the triangle's plane or misses it
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray.origin - v0;

    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray.direction.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    if t < EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Slab test. Returns the entry distance (0 when the origin is inside).
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv = ray.direction.recip();
    let t1 = (aabb.min - ray.origin) * inv;
    let t2 = (aabb.max - ray.origin) * inv;

    let t_near = t1.min(t2).max_element();
    let t_far = t1.max(t2).min_element();

    if t_near > t_far || t_far < 0.0 {
        return None;
    }
    Some(t_near.max(0.0))
}

/// Ray-sphere intersection; closest positive distance.
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - c;

    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t1 = -b - sqrt_d;
    let t2 = -b + sqrt_d;

    if t1 > EPSILON {
        Some(t1)
    } else if t2 > EPSILON {
        Some(t2)
    } else {
        None
    }
}

/// Intersection with the plane through `point` with normal `normal`.
pub fn ray_plane(ray: &Ray, point: Vec3, normal: Vec3) -> Option<f32> {
    let denom = normal.dot(ray.direction);
    if denom.abs() < EPSILON {
        return None;
    }
    let t = (point - ray.origin).dot(normal) / denom;
    (t >= 0.0).then_some(t)
}

/// Closest approach between the ray and segment `a`-`b`.
///
/// Returns `(t, distance)`: the ray parameter at the closest point and the gap
/// between ray and segment there. `None` when the closest point is behind the
/// ray origin.
pub fn ray_segment(ray: &Ray, a: Vec3, b: Vec3) -> Option<(f32, f32)> {
    let seg = b - a;
    let w0 = ray.origin - a;
    let seg_len_sq = seg.dot(seg);
    let d_dot_seg = ray.direction.dot(seg);
    let d_dot_w0 = ray.direction.dot(w0);
    let seg_dot_w0 = seg.dot(w0);

    let denom = seg_len_sq - d_dot_seg * d_dot_seg;

    // Parameter along the segment, clamped to its extent
    let s = if seg_len_sq < EPSILON {
        0.0
    } else if denom.abs() < EPSILON {
        // Parallel: any point works, project the origin
        (seg_dot_w0 / seg_len_sq).clamp(0.0, 1.0)
    } else {
        ((seg_dot_w0 - d_dot_seg * d_dot_w0) / denom).clamp(0.0, 1.0)
    };

    let on_segment = a + seg * s;
    let t = (on_segment - ray.origin).dot(ray.direction);
    if t < 0.0 {
        return None;
    }
    let distance = ray.at(t).distance(on_segment);
    Some((t, distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_triangle_hit() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::NEG_Z);
        let hit = ray_triangle(&ray, Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        assert!((hit.t - 1.0).abs() < EPSILON);
        assert!((hit.u - 0.25).abs() < EPSILON);
        assert!((hit.v - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_ray_triangle_behind() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::Z);
        assert!(ray_triangle(&ray, Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn test_ray_aabb_inside_and_outside() {
        let aabb = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let outside = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!((ray_aabb(&outside, &aabb).unwrap() - 4.0).abs() < 1e-5);

        let inside = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray_aabb(&inside, &aabb), Some(0.0));

        let miss = Ray::new(Vec3::new(0.0, 3.0, 5.0), Vec3::NEG_Z);
        assert!(ray_aabb(&miss, &aabb).is_none());
    }

    #[test]
    fn test_ray_sphere_hit() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let t = ray_sphere(&ray, Vec3::ZERO, 1.0).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_plane_parallel_misses() {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(ray_plane(&ray, Vec3::ZERO, Vec3::Y).is_none());

        let down = Ray::new(Vec3::new(2.0, 3.0, -1.0), Vec3::NEG_Y);
        let t = ray_plane(&down, Vec3::ZERO, Vec3::Y).unwrap();
        assert!((down.at(t) - Vec3::new(2.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_ray_segment_distance() {
        let ray = Ray::new(Vec3::new(0.0, 0.1, 5.0), Vec3::NEG_Z);
        let (t, distance) = ray_segment(&ray, Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)).unwrap();
        assert!((t - 5.0).abs() < 1e-5);
        assert!((distance - 0.1).abs() < 1e-5);
    }
}
