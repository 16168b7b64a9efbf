//! GPU-backed resource registry.
//!
//! Geometry, materials, and textures are owned here and referenced from scene
//! nodes by handle. Disposal removes the resource and appends it to a log the
//! renderer drains to release its own GPU-side copies.

use std::collections::HashMap;

use glam::{UVec2, Vec3, Vec4};

use crate::error::ResourceError;

/// Handle to a [`Geometry`] in [`GpuResources`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryHandle(u32);

/// Handle to a [`Material`] in [`GpuResources`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(u32);

/// Handle to a [`Texture`] in [`GpuResources`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u32);

/// Primitive assembly for a geometry's positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    TriangleList,
    /// Pairs of positions form independent segments
    LineList,
    /// Consecutive positions form a connected polyline
    LineStrip,
    Points,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Smallest box containing every point, or `None` for an empty set
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The eight corners, ordered by bit pattern (x = bit 0, y = bit 1, z = bit 2)
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }
}

/// Vertex data for a mesh, line set, or point set
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub topology: Topology,
    pub positions: Vec<Vec3>,
    /// Optional index buffer; only meaningful for triangle and line lists
    pub indices: Option<Vec<u32>>,
}

impl Geometry {
    /// Indexed triangle list
    pub fn triangles(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            topology: Topology::TriangleList,
            positions,
            indices: Some(indices),
        }
    }

    /// Independent segments from consecutive position pairs
    pub fn line_list(positions: Vec<Vec3>) -> Self {
        Self {
            topology: Topology::LineList,
            positions,
            indices: None,
        }
    }

    /// Connected polyline
    pub fn line_strip(positions: Vec<Vec3>) -> Self {
        Self {
            topology: Topology::LineStrip,
            positions,
            indices: None,
        }
    }

    /// Local-space bounds of all positions
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Number of triangles (zero for non-triangle topologies)
    pub fn triangle_count(&self) -> usize {
        if self.topology != Topology::TriangleList {
            return 0;
        }
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    /// Corner positions of a triangle, `None` when an index is out of range
    pub fn triangle(&self, tri_index: usize) -> Option<[Vec3; 3]> {
        let base = tri_index * 3;
        let index = |k: usize| -> Option<usize> {
            match &self.indices {
                Some(indices) => indices.get(base + k).map(|i| *i as usize),
                None => Some(base + k),
            }
        };
        Some([
            *self.positions.get(index(0)?)?,
            *self.positions.get(index(1)?)?,
            *self.positions.get(index(2)?)?,
        ])
    }

    /// Line segments described by this geometry
    pub fn segments(&self) -> Vec<(Vec3, Vec3)> {
        match self.topology {
            Topology::LineList => match &self.indices {
                Some(indices) => indices
                    .chunks_exact(2)
                    .filter_map(|pair| {
                        Some((
                            *self.positions.get(pair[0] as usize)?,
                            *self.positions.get(pair[1] as usize)?,
                        ))
                    })
                    .collect(),
                None => self
                    .positions
                    .chunks_exact(2)
                    .map(|pair| (pair[0], pair[1]))
                    .collect(),
            },
            Topology::LineStrip => self.positions.windows(2).map(|w| (w[0], w[1])).collect(),
            Topology::TriangleList | Topology::Points => Vec::new(),
        }
    }
}

/// Dash pattern for line materials
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dash {
    pub dash: f32,
    pub gap: f32,
}

/// Surface or line appearance
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Linear RGBA; alpha is the opacity
    pub color: Vec4,
    pub transparent: bool,
    /// When false the material draws through occluders
    pub depth_test: bool,
    pub line_width: f32,
    pub dash: Option<Dash>,
    /// Texture maps sampled by this material
    pub maps: Vec<TextureHandle>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            transparent: false,
            depth_test: true,
            line_width: 1.0,
            dash: None,
            maps: Vec::new(),
        }
    }
}

impl Material {
    /// Opaque material of the given colour
    pub fn from_color(color: Vec4) -> Self {
        Self {
            color,
            transparent: color.w < 1.0,
            ..Default::default()
        }
    }

    /// Translucent material that ignores the depth buffer
    pub fn overlay(color: Vec4) -> Self {
        Self {
            color,
            transparent: true,
            depth_test: false,
            ..Default::default()
        }
    }

    pub fn with_line_width(mut self, width: f32) -> Self {
        self.line_width = width;
        self
    }

    pub fn with_dash(mut self, dash: f32, gap: f32) -> Self {
        self.dash = Some(Dash { dash, gap });
        self
    }

    pub fn with_map(mut self, map: TextureHandle) -> Self {
        self.maps.push(map);
        self
    }
}

/// Image resource referenced by materials
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub label: String,
    pub size: UVec2,
}

/// A resource removed by a dispose call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposedResource {
    Geometry(GeometryHandle),
    Material(MaterialHandle),
    Texture(TextureHandle),
}

/// Registry of geometry, material, and texture resources
#[derive(Debug, Default)]
pub struct GpuResources {
    geometries: HashMap<GeometryHandle, Geometry>,
    materials: HashMap<MaterialHandle, Material>,
    textures: HashMap<TextureHandle, Texture>,
    next_id: u32,
    disposed: Vec<DisposedResource>,
}

impl GpuResources {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryHandle {
        let handle = GeometryHandle(self.next());
        self.geometries.insert(handle, geometry);
        handle
    }

    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        let handle = MaterialHandle(self.next());
        self.materials.insert(handle, material);
        handle
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureHandle {
        let handle = TextureHandle(self.next());
        self.textures.insert(handle, texture);
        handle
    }

    pub fn geometry(&self, handle: GeometryHandle) -> Option<&Geometry> {
        self.geometries.get(&handle)
    }

    pub fn geometry_mut(&mut self, handle: GeometryHandle) -> Option<&mut Geometry> {
        self.geometries.get_mut(&handle)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(&handle)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(&handle)
    }

    pub fn dispose_geometry(&mut self, handle: GeometryHandle) -> Result<(), ResourceError> {
        self.geometries
            .remove(&handle)
            .ok_or(ResourceError::GeometryDisposed(handle))?;
        self.disposed.push(DisposedResource::Geometry(handle));
        Ok(())
    }

    /// Dispose a material. Texture maps it references are left alone.
    pub fn dispose_material(&mut self, handle: MaterialHandle) -> Result<Material, ResourceError> {
        let material = self
            .materials
            .remove(&handle)
            .ok_or(ResourceError::MaterialDisposed(handle))?;
        self.disposed.push(DisposedResource::Material(handle));
        Ok(material)
    }

    pub fn dispose_texture(&mut self, handle: TextureHandle) -> Result<(), ResourceError> {
        self.textures
            .remove(&handle)
            .ok_or(ResourceError::TextureDisposed(handle))?;
        self.disposed.push(DisposedResource::Texture(handle));
        Ok(())
    }

    /// Take the log of resources disposed since the last call
    pub fn take_disposed(&mut self) -> Vec<DisposedResource> {
        std::mem::take(&mut self.disposed)
    }

    /// Live resource counts as (geometries, materials, textures)
    pub fn live_counts(&self) -> (usize, usize, usize) {
        (self.geometries.len(), self.materials.len(), self.textures.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points([Vec3::new(1.0, -2.0, 0.5), Vec3::new(-1.0, 3.0, 0.0)]).unwrap();
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 0.5));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_line_strip_segments() {
        let geometry = Geometry::line_strip(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert_eq!(geometry.segments(), vec![(Vec3::ZERO, Vec3::X), (Vec3::X, Vec3::Y)]);
        assert_eq!(geometry.triangle_count(), 0);
    }

    #[test]
    fn test_triangle_out_of_range_index() {
        let geometry = Geometry::triangles(vec![Vec3::ZERO, Vec3::X], vec![0, 1, 7]);
        assert_eq!(geometry.triangle_count(), 1);
        assert!(geometry.triangle(0).is_none());
    }

    #[test]
    fn test_second_dispose_fails() {
        let mut resources = GpuResources::new();
        let geometry = resources.add_geometry(Geometry::line_list(vec![Vec3::ZERO, Vec3::X]));

        assert!(resources.dispose_geometry(geometry).is_ok());
        assert_eq!(
            resources.dispose_geometry(geometry),
            Err(ResourceError::GeometryDisposed(geometry))
        );
        assert_eq!(resources.take_disposed(), vec![DisposedResource::Geometry(geometry)]);
        assert!(resources.take_disposed().is_empty());
    }
}
