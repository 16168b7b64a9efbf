//! Tool state machine.
//!
//! Exactly one tool is active. Each tool turns raw pointer events into
//! domain actions; switching tools resets the outgoing tool's transient
//! state (measurement start, drag anchor) through [`ActiveTool::reset`].

mod measure;
mod move_tool;
mod point;
mod select;

use std::fmt;

use glam::{Vec2, Vec3};
use vista_config::InteractionConfig;

use crate::camera::{GroundPlane, OrbitControls, PickCamera, ViewportRect};
use crate::gizmo::TransformGizmo;
use crate::picking::PickingService;
use crate::scene::SceneGraph;
use crate::selection::SelectionContext;

pub use measure::{MeasureState, MeasureTool};
pub use move_tool::MoveTool;
pub use point::PointTool;
pub use select::SelectTool;

/// The four interaction modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Point,
    Measure,
    Move,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [ToolKind::Select, ToolKind::Point, ToolKind::Measure, ToolKind::Move];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Point => "point",
            ToolKind::Measure => "measure",
            ToolKind::Move => "move",
        }
    }

    /// Cursor shown while this tool is active
    pub fn cursor(&self) -> CursorStyle {
        match self {
            ToolKind::Select => CursorStyle::Default,
            ToolKind::Point | ToolKind::Measure => CursorStyle::Crosshair,
            ToolKind::Move => CursorStyle::Move,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer cursor requested by the active tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Crosshair,
    Move,
}

/// Keyboard modifiers held during a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

impl Modifiers {
    /// Whether a click should toggle membership instead of replacing the selection
    pub fn toggles_selection(&self) -> bool {
        self.shift || self.ctrl
    }
}

/// Pointer position (pixels, relative to the window) plus modifiers
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub position: Vec2,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }
}

/// Domain action produced by a tool
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolAction {
    PointCreated(Vec3),
    MeasurementStarted(Vec3),
    MeasurementPreview { start: Vec3, end: Vec3 },
    MeasurementCreated { start: Vec3, end: Vec3 },
    MeasurementCancelled,
}

/// Collaborators and shared state a tool may use while handling one event
pub struct ToolContext<'a> {
    pub scene: &'a mut SceneGraph,
    pub picking: &'a mut PickingService,
    pub selection: &'a mut dyn SelectionContext,
    pub gizmo: &'a mut dyn TransformGizmo,
    pub orbit: &'a mut dyn OrbitControls,
    pub camera: &'a PickCamera,
    pub viewport: &'a ViewportRect,
    pub config: &'a InteractionConfig,
    pub actions: &'a mut Vec<ToolAction>,
}

impl ToolContext<'_> {
    /// Where the pointer ray crosses the ground plane
    pub fn ground_point(&mut self, pointer: Vec2) -> Option<Vec3> {
        let plane = GroundPlane::at_height(self.config.ground_height);
        self.picking.pick_plane(pointer, self.camera, self.viewport, &plane)
    }
}

/// The active tool and its transient state
#[derive(Debug)]
pub enum ActiveTool {
    Select(SelectTool),
    Point(PointTool),
    Measure(MeasureTool),
    Move(MoveTool),
}

impl Default for ActiveTool {
    fn default() -> Self {
        Self::new(ToolKind::Select)
    }
}

impl ActiveTool {
    /// A tool of the given kind in its initial state
    pub fn new(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Select => ActiveTool::Select(SelectTool),
            ToolKind::Point => ActiveTool::Point(PointTool),
            ToolKind::Measure => ActiveTool::Measure(MeasureTool::default()),
            ToolKind::Move => ActiveTool::Move(MoveTool::default()),
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ActiveTool::Select(_) => ToolKind::Select,
            ActiveTool::Point(_) => ToolKind::Point,
            ActiveTool::Measure(_) => ToolKind::Measure,
            ActiveTool::Move(_) => ToolKind::Move,
        }
    }

    /// Called once when the tool becomes active
    pub fn activate(&mut self, ctx: &mut ToolContext<'_>) {
        if let ActiveTool::Move(tool) = self {
            tool.activate(ctx);
        }
    }

    pub fn on_pointer_move(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) {
        match self {
            ActiveTool::Measure(tool) => tool.on_pointer_move(ctx, event),
            ActiveTool::Select(_) | ActiveTool::Point(_) | ActiveTool::Move(_) => {}
        }
    }

    pub fn on_click(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) {
        match self {
            ActiveTool::Select(tool) => tool.on_click(ctx, event),
            ActiveTool::Point(tool) => tool.on_click(ctx, event),
            ActiveTool::Measure(tool) => tool.on_click(ctx, event),
            ActiveTool::Move(tool) => tool.on_click(ctx, event),
        }
    }

    pub fn on_context_menu(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) {
        if let ActiveTool::Measure(tool) = self {
            tool.cancel(ctx, event);
        }
    }

    /// Returns true when the tool claimed the drag (the camera should not orbit)
    pub fn on_drag_start(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) -> bool {
        match self {
            ActiveTool::Move(tool) => tool.on_drag_start(ctx, event),
            _ => false,
        }
    }

    pub fn on_drag(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) {
        if let ActiveTool::Move(tool) = self {
            tool.on_drag(ctx, event);
        }
    }

    pub fn on_drag_end(&mut self, ctx: &mut ToolContext<'_>, event: PointerEvent) {
        if let ActiveTool::Move(tool) = self {
            tool.on_drag_end(ctx, event);
        }
    }

    /// Discard transient state and release collaborators. Safe to call repeatedly.
    pub fn reset(&mut self, ctx: &mut ToolContext<'_>) {
        match self {
            ActiveTool::Measure(tool) => tool.reset(ctx),
            ActiveTool::Move(tool) => tool.reset(ctx),
            ActiveTool::Select(_) | ActiveTool::Point(_) => {}
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use glam::Vec3;
    use vista_config::InteractionConfig;

    use super::*;
    use crate::camera::FixedCamera;
    use crate::gizmo::DragGizmo;
    use crate::selection::SelectionSet;

    pub const VIEWPORT: ViewportRect = ViewportRect {
        left: 0.0,
        top: 0.0,
        width: 800.0,
        height: 600.0,
    };

    /// Owned versions of everything a [`ToolContext`] borrows
    pub struct Fixture {
        pub scene: SceneGraph,
        pub picking: PickingService,
        pub selection: SelectionSet,
        pub gizmo: DragGizmo,
        pub orbit: FixedCamera,
        pub camera: PickCamera,
        pub config: InteractionConfig,
        pub actions: Vec<ToolAction>,
    }

    impl Fixture {
        /// Camera above and in front of the origin, looking down at the ground
        pub fn new() -> Self {
            Self {
                scene: SceneGraph::new(),
                picking: PickingService::default(),
                selection: SelectionSet::new(),
                gizmo: DragGizmo::default(),
                orbit: FixedCamera::default(),
                camera: PickCamera::perspective_looking_at(
                    Vec3::new(0.0, 6.0, 6.0),
                    Vec3::ZERO,
                    std::f32::consts::FRAC_PI_4,
                    VIEWPORT.width / VIEWPORT.height,
                ),
                config: InteractionConfig::default(),
                actions: Vec::new(),
            }
        }

        pub fn ctx(&mut self) -> ToolContext<'_> {
            ToolContext {
                scene: &mut self.scene,
                picking: &mut self.picking,
                selection: &mut self.selection,
                gizmo: &mut self.gizmo,
                orbit: &mut self.orbit,
                camera: &self.camera,
                viewport: &VIEWPORT,
                config: &self.config,
                actions: &mut self.actions,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_tool_reports_its_kind() {
        for kind in ToolKind::ALL {
            assert_eq!(ActiveTool::new(kind).kind(), kind);
        }
    }

    #[test]
    fn test_cursor_per_tool() {
        assert_eq!(ToolKind::Select.cursor(), CursorStyle::Default);
        assert_eq!(ToolKind::Point.cursor(), CursorStyle::Crosshair);
        assert_eq!(ToolKind::Measure.cursor(), CursorStyle::Crosshair);
        assert_eq!(ToolKind::Move.cursor(), CursorStyle::Move);
    }
}
