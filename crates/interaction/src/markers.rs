//! Scene content created from tool actions: point markers and measurements.

use glam::{Vec3, Vec4};

use crate::error::Result;
use crate::lifecycle;
use crate::resources::{Geometry, Material};
use crate::scene::{NodeDesc, NodeId, SceneGraph};
use crate::shapes::uv_sphere;

/// Colour of placed point markers
pub const POINT_COLOR: Vec4 = Vec4::new(0.95, 0.3, 0.25, 1.0);

/// Colour of measurement end points and lines
pub const MEASUREMENT_COLOR: Vec4 = Vec4::new(0.2, 0.8, 0.45, 1.0);

/// Add a sphere marker at `position` under `parent`
pub fn add_point_marker(
    scene: &mut SceneGraph,
    parent: NodeId,
    name: impl Into<String>,
    position: Vec3,
    radius: f32,
    color: Vec4,
) -> Result<NodeId> {
    let resources = scene.resources_mut();
    let geometry = resources.add_geometry(uv_sphere(radius, 16, 12));
    let material = resources.add_material(Material::from_color(color));
    scene.add(parent, NodeDesc::point_marker(name, geometry, material).at(position))
}

/// Add a measurement group: two end markers and the line between them
pub fn add_measurement(
    scene: &mut SceneGraph,
    parent: NodeId,
    start: Vec3,
    end: Vec3,
    radius: f32,
) -> Result<NodeId> {
    let name = format!("Measurement {:.3}", start.distance(end));
    let group = scene.add(parent, NodeDesc::measurement_group(name))?;

    let populate = |scene: &mut SceneGraph| -> Result<()> {
        add_point_marker(scene, group, "start", start, radius, MEASUREMENT_COLOR)?;
        add_point_marker(scene, group, "end", end, radius, MEASUREMENT_COLOR)?;

        let resources = scene.resources_mut();
        let geometry = resources.add_geometry(Geometry::line_list(vec![start, end]));
        let material = resources.add_material(Material::from_color(MEASUREMENT_COLOR).with_line_width(2.0));
        scene.add(group, NodeDesc::line("line", geometry, material))?;
        Ok(())
    };

    if let Err(err) = populate(scene) {
        lifecycle::remove_and_dispose(scene, group)?;
        return Err(err);
    }
    Ok(group)
}
