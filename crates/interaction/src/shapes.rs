//! Geometry builders for markers and overlays.

use std::collections::HashMap;

use glam::Vec3;

use crate::resources::{Aabb, Geometry};

/// Latitude/longitude sphere centered on the origin
pub fn uv_sphere(radius: f32, sectors: u32, stacks: u32) -> Geometry {
    let sectors = sectors.max(3);
    let stacks = stacks.max(2);

    let mut positions = Vec::with_capacity(((sectors + 1) * (stacks + 1)) as usize);
    for stack in 0..=stacks {
        let phi = std::f32::consts::PI * stack as f32 / stacks as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for sector in 0..=sectors {
            let theta = std::f32::consts::TAU * sector as f32 / sectors as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            positions.push(Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta) * radius);
        }
    }

    let row = sectors + 1;
    let mut indices = Vec::with_capacity((sectors * stacks * 6) as usize);
    for stack in 0..stacks {
        for sector in 0..sectors {
            let a = stack * row + sector;
            let b = a + row;
            // Poles collapse one triangle of each quad
            if stack != 0 {
                indices.extend_from_slice(&[a, b, a + 1]);
            }
            if stack != stacks - 1 {
                indices.extend_from_slice(&[a + 1, b, b + 1]);
            }
        }
    }

    Geometry::triangles(positions, indices)
}

/// The twelve edges of a box as a line list
pub fn box_edges(aabb: &Aabb) -> Geometry {
    const EDGES: [(usize, usize); 12] = [
        (0, 1),
        (2, 3),
        (4, 5),
        (6, 7),
        (0, 2),
        (1, 3),
        (4, 6),
        (5, 7),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];
    let corners = aabb.corners();
    let positions = EDGES
        .iter()
        .flat_map(|(a, b)| [corners[*a], corners[*b]])
        .collect();
    Geometry::line_list(positions)
}

/// Quantized position so split vertices at the same spot share edges
type VertexKey = (i32, i32, i32);

fn vertex_key(p: Vec3) -> VertexKey {
    const QUANTUM: f32 = 1e4;
    (
        (p.x * QUANTUM).round() as i32,
        (p.y * QUANTUM).round() as i32,
        (p.z * QUANTUM).round() as i32,
    )
}

/// Unique edges of a triangle mesh with the normals of the faces sharing them,
/// in first-seen order
fn edge_adjacency(geometry: &Geometry) -> Vec<((Vec3, Vec3), Vec<Vec3>)> {
    let mut order: Vec<(VertexKey, VertexKey)> = Vec::new();
    let mut edges: HashMap<(VertexKey, VertexKey), ((Vec3, Vec3), Vec<Vec3>)> = HashMap::new();

    for tri_index in 0..geometry.triangle_count() {
        let Some(tri) = geometry.triangle(tri_index) else {
            continue;
        };
        let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
        if normal == Vec3::ZERO {
            continue;
        }

        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let (ka, kb) = (vertex_key(a), vertex_key(b));
            let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
            edges
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    ((a, b), Vec::new())
                })
                .1
                .push(normal);
        }
    }

    order.into_iter().filter_map(|key| edges.remove(&key)).collect()
}

/// Outline of a triangle mesh as a line list.
///
/// Keeps boundary edges and edges whose adjacent faces meet at more than
/// `crease_degrees`, so flat-shaded boxes show their silhouette edges and
/// smooth closed surfaces show nothing.
pub fn feature_edges(geometry: &Geometry, crease_degrees: f32) -> Geometry {
    let cos_crease = crease_degrees.to_radians().cos();

    let positions = edge_adjacency(geometry)
        .into_iter()
        .filter(|(_, normals)| match normals.as_slice() {
            [_] => true,
            [n0, n1] => n0.dot(*n1) < cos_crease,
            // Non-manifold
            _ => true,
        })
        .flat_map(|((a, b), _)| [a, b])
        .collect();
    Geometry::line_list(positions)
}

/// Every edge of a triangle mesh once, as a line list
pub fn wireframe_edges(geometry: &Geometry) -> Geometry {
    let positions = edge_adjacency(geometry)
        .into_iter()
        .flat_map(|((a, b), _)| [a, b])
        .collect();
    Geometry::line_list(positions)
}

/// Feature edges, or the full wireframe for smooth meshes that have none
pub fn outline_edges(geometry: &Geometry, crease_degrees: f32) -> Geometry {
    let features = feature_edges(geometry, crease_degrees);
    if features.positions.is_empty() {
        wireframe_edges(geometry)
    } else {
        features
    }
}

/// Closed-surface box as an indexed triangle list with split faces
pub fn cuboid(half_extents: Vec3) -> Geometry {
    let aabb = Aabb {
        min: -half_extents,
        max: half_extents,
    };
    let c = aabb.corners();
    // Faces as corner quads, wound counter-clockwise seen from outside
    let faces = [
        [c[1], c[3], c[7], c[5]],
        [c[0], c[4], c[6], c[2]],
        [c[2], c[6], c[7], c[3]],
        [c[0], c[1], c[5], c[4]],
        [c[4], c[5], c[7], c[6]],
        [c[0], c[2], c[3], c[1]],
    ];

    let mut positions = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for face in faces {
        let base = positions.len() as u32;
        positions.extend_from_slice(&face);
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Geometry::triangles(positions, indices)
}
