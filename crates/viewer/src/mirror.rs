//! Mirrors triangle geometry from the interaction scene graph into Bevy
//! mesh entities, and drops Bevy assets once their resources are disposed.
//!
//! Line and point geometry is not mirrored; it is redrawn every frame by
//! the overlay drawing systems. Meshes whose material ignores depth go on
//! the overlay render layer.

use std::collections::HashMap;

use bevy::asset::RenderAssetUsages;
use bevy::camera::visibility::RenderLayers;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use vista_interaction::{
    DisposedResource, Geometry, GeometryHandle, Material, MaterialHandle, NodeId, SceneGraph, SceneNode, Topology,
};

use crate::overlay_camera::OVERLAY_LAYER;
use crate::{InteractionLayer, ViewerSet};

/// Links a Bevy entity to the scene node it mirrors
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirroredNode(pub NodeId);

struct MirrorEntry {
    entity: Entity,
    material: MaterialHandle,
}

/// Bookkeeping between scene handles and Bevy assets
#[derive(Resource, Default)]
pub struct SceneMirror {
    entities: HashMap<NodeId, MirrorEntry>,
    meshes: HashMap<GeometryHandle, Handle<Mesh>>,
    materials: HashMap<MaterialHandle, Handle<StandardMaterial>>,
}

impl SceneMirror {
    /// Entity mirroring `node`, if it has triangle geometry
    pub fn entity(&self, node: NodeId) -> Option<Entity> {
        self.entities.get(&node).map(|entry| entry.entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

pub struct SceneMirrorPlugin;

impl Plugin for SceneMirrorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneMirror>()
            .add_systems(Update, sync_scene_mirror.in_set(ViewerSet::Mirror));
    }
}

/// Triangle mesh for a geometry, or `None` for lines and points
pub fn to_bevy_mesh(geometry: &Geometry) -> Option<Mesh> {
    if geometry.topology != Topology::TriangleList {
        return None;
    }

    let positions: Vec<[f32; 3]> = geometry.positions.iter().map(|p| p.to_array()).collect();
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    if let Some(indices) = &geometry.indices {
        mesh.insert_indices(Indices::U32(indices.clone()));
    }
    mesh.compute_normals();
    Some(mesh)
}

/// PBR material for a scene material; `render_order` biases depth so
/// overlays sort in front of the meshes they decorate
pub fn to_standard_material(material: &Material, render_order: i32) -> StandardMaterial {
    let c = material.color;
    StandardMaterial {
        base_color: Color::linear_rgba(c.x, c.y, c.z, c.w),
        alpha_mode: if material.transparent {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        // Materials that ignore depth are highlight overlays; keep them flat
        unlit: !material.depth_test,
        depth_bias: render_order as f32,
        ..default()
    }
}

/// Render layer for a scene material: overlays draw on top of everything
pub fn render_layers(material: &Material) -> RenderLayers {
    if material.depth_test {
        RenderLayers::default()
    } else {
        RenderLayers::layer(OVERLAY_LAYER)
    }
}

fn mirrored_material(node: &SceneNode) -> Option<(GeometryHandle, MaterialHandle)> {
    let renderable = node.renderable.as_ref()?;
    Some((renderable.geometry, renderable.materials.primary()?))
}

fn is_triangle_node(scene: &SceneGraph, node: &SceneNode) -> bool {
    node.renderable
        .as_ref()
        .and_then(|r| scene.resources().geometry(r.geometry))
        .is_some_and(|g| g.topology == Topology::TriangleList)
}

/// Bring Bevy entities and assets in line with the scene graph
fn sync_scene_mirror(
    mut commands: Commands,
    mut layer: ResMut<InteractionLayer>,
    mut mirror: ResMut<SceneMirror>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut mirrored: Query<(&mut Transform, &mut Visibility, &mut MeshMaterial3d<StandardMaterial>), With<MirroredNode>>,
) {
    let scene = &mut layer.scene;

    for disposed in scene.resources_mut().take_disposed() {
        match disposed {
            DisposedResource::Geometry(handle) => {
                if let Some(mesh) = mirror.meshes.remove(&handle) {
                    meshes.remove(&mesh);
                }
            }
            DisposedResource::Material(handle) => {
                if let Some(material) = mirror.materials.remove(&handle) {
                    materials.remove(&material);
                }
            }
            // Textures are never uploaded
            DisposedResource::Texture(_) => {}
        }
    }

    let scene = &layer.scene;
    mirror.entities.retain(|id, entry| {
        let keep = scene.node(*id).is_some_and(|node| is_triangle_node(scene, node));
        if !keep {
            commands.entity(entry.entity).despawn();
        }
        keep
    });

    let SceneMirror {
        entities,
        meshes: mesh_handles,
        materials: material_handles,
    } = &mut *mirror;

    for node in scene.nodes() {
        if !is_triangle_node(scene, node) {
            continue;
        }
        let Some((geometry, material)) = mirrored_material(node) else {
            continue;
        };
        let Some(world) = scene.world_transform(node.id) else {
            continue;
        };

        let mesh = match mesh_handles.get(&geometry) {
            Some(handle) => handle.clone(),
            None => {
                let Some(mesh) = scene.resources().geometry(geometry).and_then(to_bevy_mesh) else {
                    continue;
                };
                let handle = meshes.add(mesh);
                mesh_handles.insert(geometry, handle.clone());
                handle
            }
        };
        let Some(source) = scene.resources().material(material) else {
            continue;
        };
        let material_asset = match material_handles.get(&material) {
            Some(handle) => handle.clone(),
            None => {
                let handle = materials.add(to_standard_material(source, node.render_order));
                material_handles.insert(material, handle.clone());
                handle
            }
        };
        let layers = render_layers(source);

        let transform = Transform::from_matrix(Mat4::from(world));
        let visibility = if scene.is_effectively_visible(node.id) {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };

        match entities.get_mut(&node.id) {
            Some(entry) => {
                // Spawned this frame; components land when commands apply
                let Ok((mut current, mut current_visibility, mut current_material)) = mirrored.get_mut(entry.entity)
                else {
                    continue;
                };
                if *current != transform {
                    *current = transform;
                }
                if *current_visibility != visibility {
                    *current_visibility = visibility;
                }
                if entry.material != material {
                    entry.material = material;
                    current_material.0 = material_asset;
                    commands.entity(entry.entity).insert(layers);
                }
            }
            None => {
                let entity = commands
                    .spawn((
                        Mesh3d(mesh),
                        MeshMaterial3d(material_asset),
                        transform,
                        visibility,
                        layers,
                        MirroredNode(node.id),
                        Name::new(node.name.clone()),
                    ))
                    .id();
                entities.insert(node.id, MirrorEntry { entity, material });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use vista_interaction::shapes::cuboid;

    use super::*;

    #[test]
    fn test_triangle_geometry_becomes_indexed_mesh() {
        let mesh = to_bevy_mesh(&cuboid(Vec3::splat(0.5))).unwrap();
        assert_eq!(mesh.count_vertices(), 24);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(36));
        assert!(mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some());
    }

    #[test]
    fn test_lines_are_not_mirrored() {
        let lines = Geometry::line_list(vec![Vec3::ZERO, Vec3::X]);
        assert!(to_bevy_mesh(&lines).is_none());
    }

    #[test]
    fn test_overlay_material_is_unlit_and_blended() {
        let overlay = to_standard_material(&Material::overlay(Vec4::new(1.0, 0.5, 0.0, 0.6)), 10);
        assert!(overlay.unlit);
        assert_eq!(overlay.alpha_mode, AlphaMode::Blend);
        assert_eq!(overlay.depth_bias, 10.0);

        let solid = to_standard_material(&Material::default(), 0);
        assert!(!solid.unlit);
        assert_eq!(solid.alpha_mode, AlphaMode::Opaque);
    }

    #[test]
    fn test_overlays_render_on_their_own_layer() {
        let overlay = render_layers(&Material::overlay(Vec4::new(1.0, 0.5, 0.0, 0.6)));
        assert!(overlay.intersects(&RenderLayers::layer(OVERLAY_LAYER)));
        assert!(!overlay.intersects(&RenderLayers::default()));

        let solid = render_layers(&Material::default());
        assert_eq!(solid, RenderLayers::default());
        assert!(!solid.intersects(&RenderLayers::layer(OVERLAY_LAYER)));
    }
}
