use tracing::{debug, warn};

use crate::selection::SelectionRecord;

use super::{PointerEvent, ToolContext};

/// Drag the selected node through the transform gizmo.
///
/// Camera orbit is suspended for the duration of a drag and restored on
/// release or reset.
#[derive(Debug, Default)]
pub struct MoveTool {
    /// Orbit state to put back when the drag ends
    orbit_was_enabled: Option<bool>,
}

impl MoveTool {
    pub fn is_dragging(&self) -> bool {
        self.orbit_was_enabled.is_some()
    }

    /// Attach the gizmo to the first selected node
    pub fn activate(&mut self, ctx: &mut ToolContext<'_>) {
        match ctx.selection.list().first() {
            Some(record) => ctx.gizmo.attach(record.node),
            None => ctx.gizmo.detach(),
        }
    }

    /// Clicking picks the node the gizmo works on
    pub fn on_click(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) {
        let hit = ctx.picking.pick(event.position, ctx.camera, ctx.viewport, ctx.scene);
        match hit.and_then(|hit| SelectionRecord::from_node(ctx.scene, hit.node)) {
            Some(record) => {
                ctx.gizmo.attach(record.node);
                ctx.selection.select(record);
            }
            None => {
                ctx.gizmo.detach();
                ctx.selection.clear();
            }
        }
    }

    pub fn on_drag_start(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) -> bool {
        if ctx.gizmo.attached().is_none() {
            // Drag on a node that isn't attached yet: pick it first
            self.on_click(ctx, event);
        }
        if !ctx.gizmo.begin_drag(ctx.scene, event.position) {
            return false;
        }

        self.orbit_was_enabled = Some(ctx.orbit.is_enabled());
        ctx.orbit.set_enabled(false);
        debug!("Move drag started; camera orbit suspended");
        true
    }

    pub fn on_drag(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) {
        if !self.is_dragging() {
            return;
        }
        if let Err(err) = ctx.gizmo.update_drag(ctx.scene, ctx.camera, event.position) {
            warn!("Move drag update failed: {}", err);
            self.finish_drag(ctx);
        }
    }

    pub fn on_drag_end(&mut self, ctx: &mut ToolContext<'_>, _event: PointerEvent) {
        self.finish_drag(ctx);
    }

    pub fn reset(&mut self, ctx: &mut ToolContext<'_>) {
        self.finish_drag(ctx);
        ctx.gizmo.detach();
    }

    fn finish_drag(&mut self, ctx: &mut ToolContext<'_>) {
        ctx.gizmo.end_drag();
        if let Some(enabled) = self.orbit_was_enabled.take() {
            ctx.orbit.set_enabled(enabled);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::super::test_support::{Fixture, VIEWPORT};
    use super::*;
    use crate::camera::OrbitControls;
    use crate::gizmo::TransformGizmo;
    use crate::resources::Material;
    use crate::scene::{NodeDesc, NodeId};
    use crate::selection::SelectionContext;
    use crate::shapes::cuboid;

    fn add_cube(fixture: &mut Fixture) -> NodeId {
        let scene = &mut fixture.scene;
        let geometry = scene.resources_mut().add_geometry(cuboid(Vec3::splat(0.5)));
        let material = scene.resources_mut().add_material(Material::default());
        scene.add(scene.root(), NodeDesc::mesh("cube", geometry, material)).unwrap()
    }

    #[test]
    fn test_drag_suspends_and_restores_orbit() {
        let mut fixture = Fixture::new();
        let cube = add_cube(&mut fixture);
        let mut tool = MoveTool::default();
        let start = PointerEvent::at(VIEWPORT.center());

        assert!(tool.on_drag_start(&mut fixture.ctx(), start));
        assert!(!fixture.orbit.is_enabled());
        assert_eq!(fixture.selection.nodes(), vec![cube]);

        tool.on_drag(&mut fixture.ctx(), PointerEvent::at(VIEWPORT.center() + Vec2::new(100.0, 0.0)));
        tool.on_drag_end(&mut fixture.ctx(), PointerEvent::default());

        assert!(fixture.orbit.is_enabled());
        assert!(fixture.scene.node(cube).unwrap().transform.translation.x > 0.5);
    }

    #[test]
    fn test_drag_on_empty_space_is_not_claimed() {
        let mut fixture = Fixture::new();
        let mut tool = MoveTool::default();

        assert!(!tool.on_drag_start(&mut fixture.ctx(), PointerEvent::at(Vec2::new(5.0, 5.0))));
        assert!(fixture.orbit.is_enabled());
    }

    #[test]
    fn test_reset_mid_drag_restores_orbit_and_detaches() {
        let mut fixture = Fixture::new();
        add_cube(&mut fixture);
        let mut tool = MoveTool::default();

        tool.on_drag_start(&mut fixture.ctx(), PointerEvent::at(VIEWPORT.center()));
        tool.reset(&mut fixture.ctx());
        tool.reset(&mut fixture.ctx());

        assert!(fixture.orbit.is_enabled());
        assert!(fixture.gizmo.attached().is_none());
        assert!(!fixture.gizmo.is_dragging());
    }
}
