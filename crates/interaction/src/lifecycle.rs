//! Disposal of GPU resources held by scene subtrees.
//!
//! Disposal is best-effort: a resource that is already gone is logged and
//! skipped, never propagated, so cleanup can always run to completion.

use tracing::{debug, warn};

use crate::error::{InteractionError, Result};
use crate::resources::{GeometryHandle, MaterialHandle};
use crate::scene::{NodeId, SceneGraph};

/// What a [`dispose`] call released
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisposalReport {
    pub nodes: usize,
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
    /// Resources that were already disposed and got skipped
    pub skipped: usize,
}

impl DisposalReport {
    pub fn is_empty(&self) -> bool {
        self.geometries == 0 && self.materials == 0 && self.textures == 0
    }
}

/// Dispose the geometry, materials, and texture maps of `node` and its descendants.
///
/// The nodes stay in the graph; call [`remove_and_dispose`] to detach them in the
/// same step. A node that no longer exists is a no-op.
pub fn dispose(scene: &mut SceneGraph, node: NodeId) -> DisposalReport {
    let mut report = DisposalReport::default();

    // Collect first; the resource registry is borrowed mutably below
    let mut geometries: Vec<GeometryHandle> = Vec::new();
    let mut materials: Vec<MaterialHandle> = Vec::new();
    for id in scene.descendants(node) {
        report.nodes += 1;
        let Some(renderable) = scene.node(id).and_then(|n| n.renderable.as_ref()) else {
            continue;
        };
        geometries.push(renderable.geometry);
        materials.extend(renderable.materials.handles());
    }

    let resources = scene.resources_mut();
    for handle in geometries {
        match resources.dispose_geometry(handle) {
            Ok(()) => report.geometries += 1,
            Err(err) => {
                warn!("Skipping geometry during disposal: {}", err);
                report.skipped += 1;
            }
        }
    }

    for handle in materials {
        let material = match resources.dispose_material(handle) {
            Ok(material) => material,
            Err(err) => {
                warn!("Skipping material during disposal: {}", err);
                report.skipped += 1;
                continue;
            }
        };
        report.materials += 1;

        for map in material.maps {
            match resources.dispose_texture(map) {
                Ok(()) => report.textures += 1,
                Err(err) => {
                    warn!("Skipping texture map during disposal: {}", err);
                    report.skipped += 1;
                }
            }
        }
    }

    if report.nodes > 0 {
        debug!(
            "Disposed {:?}: {} nodes, {} geometries, {} materials, {} textures",
            node, report.nodes, report.geometries, report.materials, report.textures
        );
    }
    report
}

/// Dispose a subtree's resources and detach it from the graph.
///
/// Returns the ids that were removed, in pre-order.
pub fn remove_and_dispose(scene: &mut SceneGraph, node: NodeId) -> Result<Vec<NodeId>> {
    if node == scene.root() {
        return Err(InteractionError::RootNode(node));
    }
    if !scene.contains(node) {
        return Ok(Vec::new());
    }
    dispose(scene, node);
    scene.detach(node)
}

#[cfg(test)]
mod tests {
    use glam::{UVec2, Vec3};

    use super::*;
    use crate::resources::{Geometry, Material, Texture};
    use crate::scene::NodeDesc;
    use crate::shapes::cuboid;

    /// A group with `n` textured meshes and one line
    fn textured_model(scene: &mut SceneGraph, n: usize) -> NodeId {
        let group = scene.add(scene.root(), NodeDesc::group("model")).unwrap();
        for i in 0..n {
            let resources = scene.resources_mut();
            let geometry = resources.add_geometry(cuboid(Vec3::ONE));
            let albedo = resources.add_texture(Texture {
                label: format!("albedo-{i}"),
                size: UVec2::new(64, 64),
            });
            let normal = resources.add_texture(Texture {
                label: format!("normal-{i}"),
                size: UVec2::new(64, 64),
            });
            let a = resources.add_material(Material::default().with_map(albedo));
            let b = resources.add_material(Material::default().with_map(normal));
            scene
                .add(group, NodeDesc::mesh(format!("part-{i}"), geometry, a).with_materials(vec![a, b]))
                .unwrap();
        }
        let resources = scene.resources_mut();
        let geometry = resources.add_geometry(Geometry::line_list(vec![Vec3::ZERO, Vec3::X]));
        let material = resources.add_material(Material::default());
        scene.add(group, NodeDesc::line("edge", geometry, material)).unwrap();
        group
    }

    #[test]
    fn test_dispose_releases_every_descendant_resource() {
        let mut scene = SceneGraph::new();
        let model = textured_model(&mut scene, 3);

        let report = dispose(&mut scene, model);
        assert_eq!(report.geometries, 4);
        assert_eq!(report.materials, 7);
        assert_eq!(report.textures, 6);
        assert_eq!(report.skipped, 0);
        assert_eq!(scene.resources().live_counts(), (0, 0, 0));
    }

    #[test]
    fn test_dispose_of_detached_node_is_noop() {
        let mut scene = SceneGraph::new();
        let model = textured_model(&mut scene, 2);

        let removed = remove_and_dispose(&mut scene, model).unwrap();
        assert_eq!(removed.len(), 4);
        assert!(!scene.contains(model));

        let again = dispose(&mut scene, model);
        assert_eq!(again, DisposalReport::default());
        assert!(remove_and_dispose(&mut scene, model).unwrap().is_empty());
    }

    #[test]
    fn test_already_disposed_texture_is_skipped() {
        let mut scene = SceneGraph::new();
        let model = textured_model(&mut scene, 1);

        let child = scene.children(model)[0];
        let material = scene.node(child).unwrap().renderable.as_ref().unwrap().materials.handles()[0];
        let map = scene.resources().material(material).unwrap().maps[0];
        scene.resources_mut().dispose_texture(map).unwrap();

        let report = dispose(&mut scene, model);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.textures, 1);
        assert_eq!(scene.resources().live_counts(), (0, 0, 0));
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        assert_eq!(remove_and_dispose(&mut scene, root), Err(InteractionError::RootNode(root)));
    }
}
