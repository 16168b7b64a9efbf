use tracing::debug;

use crate::selection::SelectionRecord;

use super::{PointerEvent, ToolContext};

/// Click to select; shift/ctrl-click toggles; clicking empty space clears
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectTool;

impl SelectTool {
    pub fn on_click(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) {
        let hit = ctx.picking.pick(event.position, ctx.camera, ctx.viewport, ctx.scene);

        let Some(record) = hit.and_then(|hit| SelectionRecord::from_node(ctx.scene, hit.node)) else {
            ctx.selection.clear();
            return;
        };

        debug!("Select click on {}", record.key);
        if event.modifiers.toggles_selection() {
            ctx.selection.toggle(record);
        } else {
            ctx.selection.select(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::super::test_support::{Fixture, VIEWPORT};
    use super::*;
    use crate::resources::Material;
    use crate::scene::{NodeDesc, NodeId};
    use crate::selection::SelectionContext;
    use crate::shapes::cuboid;

    fn add_cube(fixture: &mut Fixture, at: Vec3) -> NodeId {
        let scene = &mut fixture.scene;
        let geometry = scene.resources_mut().add_geometry(cuboid(Vec3::splat(0.5)));
        let material = scene.resources_mut().add_material(Material::default());
        scene
            .add(scene.root(), NodeDesc::mesh("cube", geometry, material).at(at))
            .unwrap()
    }

    #[test]
    fn test_click_replaces_and_shift_click_toggles() {
        let mut fixture = Fixture::new();
        let cube = add_cube(&mut fixture, Vec3::ZERO);
        let center = VIEWPORT.center();

        SelectTool.on_click(&mut fixture.ctx(), PointerEvent::at(center));
        assert_eq!(fixture.selection.nodes(), vec![cube]);

        // Re-selecting is idempotent
        SelectTool.on_click(&mut fixture.ctx(), PointerEvent::at(center));
        assert_eq!(fixture.selection.nodes(), vec![cube]);

        SelectTool.on_click(&mut fixture.ctx(), PointerEvent::at(center).with_shift());
        assert!(fixture.selection.is_empty());
    }

    #[test]
    fn test_empty_click_clears_selection() {
        let mut fixture = Fixture::new();
        add_cube(&mut fixture, Vec3::ZERO);

        SelectTool.on_click(&mut fixture.ctx(), PointerEvent::at(VIEWPORT.center()));
        assert_eq!(fixture.selection.len(), 1);

        SelectTool.on_click(&mut fixture.ctx(), PointerEvent::at(Vec2::new(5.0, 5.0)));
        assert!(fixture.selection.is_empty());
    }
}
