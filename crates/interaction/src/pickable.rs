//! Cached list of scene nodes eligible for pointer intersection.
//!
//! The list is rebuilt lazily: on a forced refresh, when the scene's
//! topology version moved past the cached token, or when the cache is
//! empty. Scene-mutating collaborators still call [`PickableSet::invalidate`]
//! after model swaps so the next pick starts from a full traversal.

use tracing::debug;

use crate::scene::{NodeId, NodeKind, SceneGraph};

#[derive(Debug, Default)]
pub struct PickableSet {
    nodes: Vec<NodeId>,
    /// Scene version the list was built from; `None` after invalidation
    version: Option<u64>,
    rebuilds: u64,
}

impl PickableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pickable nodes, rebuilding first when stale
    pub fn get(&mut self, scene: &SceneGraph, force_refresh: bool) -> &[NodeId] {
        let stale = self.version != Some(scene.version());
        if force_refresh || stale || self.nodes.is_empty() {
            self.rebuild(scene);
        }
        &self.nodes
    }

    /// Drop the cached list; the next `get` rebuilds unconditionally
    pub fn invalidate(&mut self) {
        self.nodes.clear();
        self.version = None;
    }

    /// Number of full traversals performed so far
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    fn rebuild(&mut self, scene: &SceneGraph) {
        self.nodes.clear();

        let mut stack: Vec<NodeId> = scene.children(scene.root()).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = scene.node(id) else {
                continue;
            };
            // Hidden subtrees are never hit
            if !node.visible || !node.pickable {
                continue;
            }

            match node.kind {
                // Picked as a whole; children are reached through descendant tests
                NodeKind::PointMarker | NodeKind::MeasurementGroup => {
                    self.nodes.push(id);
                    continue;
                }
                NodeKind::Mesh if node.renderable.is_some() => self.nodes.push(id),
                _ => {}
            }
            stack.extend(node.children.iter().rev());
        }

        self.version = Some(scene.version());
        self.rebuilds += 1;
        debug!("Rebuilt pickable set: {} nodes", self.nodes.len());
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::resources::{Geometry, Material};
    use crate::scene::NodeDesc;

    fn mesh_desc(scene: &mut SceneGraph, name: &str) -> NodeDesc {
        let geometry = scene
            .resources_mut()
            .add_geometry(Geometry::triangles(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]));
        let material = scene.resources_mut().add_material(Material::default());
        NodeDesc::mesh(name, geometry, material)
    }

    #[test]
    fn test_collects_meshes_markers_and_measurements() {
        let mut scene = SceneGraph::new();
        let model = scene.add(scene.root(), NodeDesc::group("model")).unwrap();
        let desc = mesh_desc(&mut scene, "body");
        let body = scene.add(model, desc).unwrap();
        let desc = mesh_desc(&mut scene, "grid");
        scene.add(scene.root(), desc.non_pickable()).unwrap();
        scene.add(scene.root(), NodeDesc::helper("axes")).unwrap();

        let measurement = scene.add(scene.root(), NodeDesc::measurement_group("m")).unwrap();
        let desc = mesh_desc(&mut scene, "end");
        scene.add(measurement, desc).unwrap();

        let mut cache = PickableSet::new();
        assert_eq!(cache.get(&scene, false), &[body, measurement]);
    }

    #[test]
    fn test_hidden_meshes_are_skipped() {
        let mut scene = SceneGraph::new();
        let parent = scene.add(scene.root(), NodeDesc::group("p").hidden()).unwrap();
        let desc = mesh_desc(&mut scene, "inside");
        scene.add(parent, desc).unwrap();

        let mut cache = PickableSet::new();
        assert!(cache.get(&scene, false).is_empty());
    }

    #[test]
    fn test_repeated_get_does_not_rebuild() {
        let mut scene = SceneGraph::new();
        let desc = mesh_desc(&mut scene, "a");
        scene.add(scene.root(), desc).unwrap();

        let mut cache = PickableSet::new();
        let first = cache.get(&scene, false).to_vec();
        let second = cache.get(&scene, false).to_vec();
        assert_eq!(first, second);
        assert_eq!(cache.rebuild_count(), 1);
    }

    #[test]
    fn test_invalidate_forces_rebuild_without_scene_change() {
        let mut scene = SceneGraph::new();
        let desc = mesh_desc(&mut scene, "a");
        scene.add(scene.root(), desc).unwrap();

        let mut cache = PickableSet::new();
        cache.get(&scene, false);
        cache.invalidate();
        cache.get(&scene, false);
        assert_eq!(cache.rebuild_count(), 2);

        cache.get(&scene, true);
        assert_eq!(cache.rebuild_count(), 3);
    }

    #[test]
    fn test_visibility_toggle_is_noticed() {
        let mut scene = SceneGraph::new();
        let desc = mesh_desc(&mut scene, "a");
        let a = scene.add(scene.root(), desc).unwrap();
        let desc = mesh_desc(&mut scene, "b");
        let b = scene.add(scene.root(), desc).unwrap();

        let mut cache = PickableSet::new();
        assert_eq!(cache.get(&scene, false), &[a, b]);

        // Same root child count, different pickable set
        scene.set_visible(a, false).unwrap();
        assert_eq!(cache.get(&scene, false), &[b]);
    }
}
