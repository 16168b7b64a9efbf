//! Pointer-to-scene picking.
//!
//! Converts a pointer position into a world-space ray through the active
//! camera and returns the nearest pickable node it hits. Picking only reads
//! the scene; pooled primitives are leased so they return to their pool on
//! every exit path.

use glam::{Vec2, Vec3};
use tracing::trace;
use vista_config::InteractionConfig;

use crate::camera::{GroundPlane, PickCamera, ViewportRect};
use crate::pickable::PickableSet;
use crate::pool::PrimitivePools;
use crate::ray::{ray_aabb, ray_segment, ray_sphere, ray_triangle, Ray};
use crate::resources::Topology;
use crate::scene::{NodeId, NodeKind, SceneGraph};

/// Nearest intersection found by [`PickingService::pick`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// The pickable entry that was hit; hover and selection apply to this node
    pub node: NodeId,
    /// The node whose geometry the ray actually struck (the entry or a descendant)
    pub part: NodeId,
    /// World-space distance from the ray origin
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
}

/// World-space tolerances for geometry without surface area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickTolerance {
    /// Max ray-to-segment gap that counts as a line hit
    pub line: f32,
    /// Radius of the sphere tested for points and mesh-less markers
    pub point: f32,
}

impl Default for PickTolerance {
    fn default() -> Self {
        let config = InteractionConfig::default();
        Self {
            line: config.line_pick_threshold,
            point: config.point_pick_radius,
        }
    }
}

#[derive(Debug)]
pub struct PickingService {
    pools: PrimitivePools,
    cache: PickableSet,
    tolerance: PickTolerance,
}

impl Default for PickingService {
    fn default() -> Self {
        Self::new(&InteractionConfig::default())
    }
}

impl PickingService {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            pools: PrimitivePools::with_prewarm(config.pool_prewarm),
            cache: PickableSet::new(),
            tolerance: PickTolerance {
                line: config.line_pick_threshold,
                point: config.point_pick_radius,
            },
        }
    }

    pub fn pools(&self) -> &PrimitivePools {
        &self.pools
    }

    pub fn cache(&self) -> &PickableSet {
        &self.cache
    }

    /// Mark the pickable set stale after a scene mutation
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Nearest pickable node under `pointer`, or `None`
    pub fn pick(
        &mut self,
        pointer: Vec2,
        camera: &PickCamera,
        rect: &ViewportRect,
        scene: &SceneGraph,
    ) -> Option<PickHit> {
        let mut ndc = self.pools.vec2s.lease();
        let mut ray = self.pools.rays.lease();

        *ndc = rect.to_ndc(pointer)?;
        camera.set_ray_from_ndc(*ndc, &mut ray);

        let tolerance = self.tolerance;
        let mut nearest: Option<PickHit> = None;
        for &candidate in self.cache.get(scene, false) {
            let Some((part, distance, point)) = intersect_candidate(scene, candidate, &ray, tolerance)
            else {
                continue;
            };
            if nearest.is_none_or(|best| distance < best.distance) {
                nearest = Some(PickHit {
                    node: candidate,
                    part,
                    distance,
                    point,
                });
            }
        }

        if let Some(hit) = &nearest {
            trace!("Picked {:?} at distance {:.3}", hit.node, hit.distance);
        }
        nearest
    }

    /// Where the pointer ray crosses `plane`, ignoring scene content
    pub fn pick_plane(
        &mut self,
        pointer: Vec2,
        camera: &PickCamera,
        rect: &ViewportRect,
        plane: &GroundPlane,
    ) -> Option<Vec3> {
        let mut ndc = self.pools.vec2s.lease();
        let mut ray = self.pools.rays.lease();
        let mut point = self.pools.vec3s.lease();

        *ndc = rect.to_ndc(pointer)?;
        camera.set_ray_from_ndc(*ndc, &mut ray);
        *point = plane.intersect(&ray)?;
        Some(*point)
    }
}

/// Nearest hit for one pickable entry.
///
/// Markers and measurement groups are hit through their parts. A mesh is
/// hit through its own geometry only: meshes nested under it are entries
/// of their own, and the deepest struck mesh owns the hit.
fn intersect_candidate(
    scene: &SceneGraph,
    candidate: NodeId,
    ray: &Ray,
    tolerance: PickTolerance,
) -> Option<(NodeId, f32, Vec3)> {
    match scene.node(candidate)?.kind {
        NodeKind::Mesh => {
            intersect_node(scene, candidate, ray, tolerance).map(|(distance, point)| (candidate, distance, point))
        }
        _ => intersect_subtree(scene, candidate, ray, tolerance),
    }
}

/// Nearest hit among `root` and its visible, pickable descendants
fn intersect_subtree(
    scene: &SceneGraph,
    root: NodeId,
    ray: &Ray,
    tolerance: PickTolerance,
) -> Option<(NodeId, f32, Vec3)> {
    let mut best: Option<(NodeId, f32, Vec3)> = None;
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let Some(node) = scene.node(id) else {
            continue;
        };
        if !node.visible || !node.pickable {
            continue;
        }
        stack.extend(node.children.iter().copied());

        if let Some((distance, point)) = intersect_node(scene, id, ray, tolerance)
            && best.is_none_or(|(_, d, _)| distance < d)
        {
            best = Some((id, distance, point));
        }
    }
    best
}

/// World distance and point where `ray` hits one node's own geometry
fn intersect_node(
    scene: &SceneGraph,
    id: NodeId,
    ray: &Ray,
    tolerance: PickTolerance,
) -> Option<(f32, Vec3)> {
    let node = scene.node(id)?;
    let world = scene.world_transform(id)?;

    let Some(renderable) = &node.renderable else {
        // Bare markers are picked as a small sphere around their origin
        if node.kind != NodeKind::PointMarker {
            return None;
        }
        let center = world.transform_point3(Vec3::ZERO);
        let t = ray_sphere(ray, center, tolerance.point)?;
        return Some((t, ray.at(t)));
    };

    let Some(geometry) = scene.resources().geometry(renderable.geometry) else {
        trace!("Skipping {:?}: geometry {:?} is gone", id, renderable.geometry);
        return None;
    };

    match geometry.topology {
        Topology::TriangleList => {
            let local_ray = ray.transformed(&world.inverse());
            let bounds = geometry.bounds()?;
            ray_aabb(&local_ray, &bounds)?;

            let mut nearest_local: Option<f32> = None;
            for tri_index in 0..geometry.triangle_count() {
                let Some([v0, v1, v2]) = geometry.triangle(tri_index) else {
                    continue;
                };
                if let Some(hit) = ray_triangle(&local_ray, v0, v1, v2)
                    && nearest_local.is_none_or(|t| hit.t < t)
                {
                    nearest_local = Some(hit.t);
                }
            }

            // Local distances are not comparable across scaled nodes; measure in world space
            let point = world.transform_point3(local_ray.at(nearest_local?));
            Some((point.distance(ray.origin), point))
        }
        Topology::LineList | Topology::LineStrip => geometry
            .segments()
            .into_iter()
            .filter_map(|(a, b)| {
                let (t, gap) = ray_segment(ray, world.transform_point3(a), world.transform_point3(b))?;
                (gap <= tolerance.line).then_some(t)
            })
            .min_by(f32::total_cmp)
            .map(|t| (t, ray.at(t))),
        Topology::Points => geometry
            .positions
            .iter()
            .filter_map(|p| ray_sphere(ray, world.transform_point3(*p), tolerance.point))
            .min_by(f32::total_cmp)
            .map(|t| (t, ray.at(t))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Geometry, Material};
    use crate::scene::NodeDesc;
    use crate::shapes::cuboid;

    fn camera() -> PickCamera {
        PickCamera::perspective_looking_at(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            std::f32::consts::FRAC_PI_4,
            1.0,
        )
    }

    fn add_cube(scene: &mut SceneGraph, name: &str, half: f32, at: Vec3) -> NodeId {
        let geometry = scene.resources_mut().add_geometry(cuboid(Vec3::splat(half)));
        let material = scene.resources_mut().add_material(Material::default());
        scene
            .add(scene.root(), NodeDesc::mesh(name, geometry, material).at(at))
            .unwrap()
    }

    const RECT: ViewportRect = ViewportRect {
        left: 0.0,
        top: 0.0,
        width: 800.0,
        height: 800.0,
    };

    #[test]
    fn test_nearest_mesh_wins_over_larger_farther_mesh() {
        let mut scene = SceneGraph::new();
        let far = add_cube(&mut scene, "far", 3.0, Vec3::new(0.0, 0.0, -5.0));
        let near = add_cube(&mut scene, "near", 0.5, Vec3::ZERO);

        let mut picking = PickingService::default();
        let hit = picking.pick(RECT.center(), &camera(), &RECT, &scene).unwrap();
        assert_eq!(hit.node, near);
        assert!((hit.distance - 9.5).abs() < 1e-3);

        scene.set_visible(near, false).unwrap();
        let hit = picking.pick(RECT.center(), &camera(), &RECT, &scene).unwrap();
        assert_eq!(hit.node, far);
    }

    #[test]
    fn test_child_mesh_of_pickable_group_is_reachable() {
        let mut scene = SceneGraph::new();
        let marker = scene.add(scene.root(), NodeDesc::measurement_group("m")).unwrap();
        let geometry = scene.resources_mut().add_geometry(cuboid(Vec3::splat(0.5)));
        let material = scene.resources_mut().add_material(Material::default());
        let child = scene.add(marker, NodeDesc::mesh("end", geometry, material)).unwrap();

        let mut picking = PickingService::default();
        let hit = picking.pick(RECT.center(), &camera(), &RECT, &scene).unwrap();
        assert_eq!(hit.node, marker);
        assert_eq!(hit.part, child);
    }

    #[test]
    fn test_nested_mesh_is_reported_as_itself() {
        let mut scene = SceneGraph::new();
        let body = add_cube(&mut scene, "body", 0.5, Vec3::new(0.0, 0.0, -2.0));
        let geometry = scene.resources_mut().add_geometry(cuboid(Vec3::splat(0.25)));
        let material = scene.resources_mut().add_material(Material::default());
        let handle = scene
            .add(body, NodeDesc::mesh("handle", geometry, material).at(Vec3::new(0.0, 0.0, 2.0)))
            .unwrap();

        let mut picking = PickingService::default();
        let hit = picking.pick(RECT.center(), &camera(), &RECT, &scene).unwrap();
        assert_eq!(hit.node, handle);
        assert_eq!(hit.part, handle);
        assert!((hit.distance - 9.75).abs() < 1e-3);

        scene.set_visible(handle, false).unwrap();
        let hit = picking.pick(RECT.center(), &camera(), &RECT, &scene).unwrap();
        assert_eq!(hit.node, body);
    }

    #[test]
    fn test_line_within_threshold_is_hit() {
        let mut scene = SceneGraph::new();
        let group = scene.add(scene.root(), NodeDesc::measurement_group("m")).unwrap();
        let geometry = scene
            .resources_mut()
            .add_geometry(Geometry::line_list(vec![Vec3::new(-1.0, 0.01, 0.0), Vec3::new(1.0, 0.01, 0.0)]));
        let material = scene.resources_mut().add_material(Material::default());
        scene.add(group, NodeDesc::line("line", geometry, material)).unwrap();

        let mut picking = PickingService::default();
        let hit = picking.pick(RECT.center(), &camera(), &RECT, &scene).unwrap();
        assert_eq!(hit.node, group);
    }

    #[test]
    fn test_miss_and_degenerate_rect_release_primitives() {
        let scene = SceneGraph::new();
        let mut picking = PickingService::default();
        let before = picking.pools().rays.available();

        assert!(picking.pick(RECT.center(), &camera(), &RECT, &scene).is_none());
        let empty = ViewportRect::sized(0.0, 0.0);
        assert!(picking.pick(Vec2::ZERO, &camera(), &empty, &scene).is_none());

        assert_eq!(picking.pools().rays.available(), before);
        assert_eq!(picking.pools().vec2s.available(), before);
    }

    #[test]
    fn test_pick_plane_hits_ground_below_camera() {
        let camera = PickCamera::perspective_looking_at(
            Vec3::new(0.0, 5.0, 5.0),
            Vec3::ZERO,
            std::f32::consts::FRAC_PI_4,
            1.0,
        );
        let mut picking = PickingService::default();
        let point = picking
            .pick_plane(RECT.center(), &camera, &RECT, &GroundPlane::default())
            .unwrap();
        assert!(point.length() < 1e-3);
        assert_eq!(picking.pools().vec3s.available(), 5);
    }
}
