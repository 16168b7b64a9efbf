//! Interaction controller: the per-viewport loop tying picking, hover,
//! selection, visual effects, and tools together.
//!
//! Everything runs on the host's frame thread. Pointer moves are coalesced
//! and processed at most once per [`InteractionController::frame`]; clicks,
//! context-menu presses, and drags are handled immediately. Errors never
//! leave the controller: they are logged and the current event is dropped.

use std::time::Duration;

use glam::Vec3;
use tracing::{debug, info, warn};
use vista_config::InteractionConfig;

use crate::camera::{OrbitControls, PickCamera, ViewportRect};
use crate::effects::{Highlight, VisualEffects};
use crate::gizmo::{DragGizmo, GizmoMode, TransformGizmo};
use crate::lifecycle;
use crate::markers;
use crate::picking::PickingService;
use crate::scene::{NodeId, SceneGraph};
use crate::selection::{HoverState, SelectionContext, SelectionRecord, SelectionSet};
use crate::setup::{SetupRetry, SetupStatus};
use crate::tools::{ActiveTool, CursorStyle, PointerEvent, ToolAction, ToolContext, ToolKind};

/// Lifecycle of the interaction layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerState {
    /// Waiting for camera, viewport, and scene
    #[default]
    Uninitialized,
    /// Handling input
    Armed,
    /// Cleanup in progress; input is ignored
    TearingDown,
}

/// Notification for the host UI
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    PointCreated(Vec3),
    MeasurementCreated { start: Vec3, end: Vec3 },
    /// Live measurement while the second point is being chosen
    MeasurementPreview { start: Vec3, end: Vec3, distance: f32 },
    MeasurementCancelled,
    SelectionChanged(Vec<SelectionRecord>),
    HoverChanged(Option<NodeId>),
    ToolChanged(ToolKind),
}

/// Per-frame view collaborators supplied by the host
pub struct ViewContext<'a> {
    pub camera: PickCamera,
    pub viewport: ViewportRect,
    pub orbit: &'a mut dyn OrbitControls,
}

pub struct InteractionController {
    config: InteractionConfig,
    state: LayerState,
    setup: SetupRetry,
    picking: PickingService,
    effects: VisualEffects,
    selection: SelectionSet,
    hover: HoverState,
    tool: ActiveTool,
    gizmo: Box<dyn TransformGizmo + Send + Sync>,
    /// Nodes currently carrying selection effects
    highlighted: Vec<NodeId>,
    /// Latest pointer move not yet processed
    pending_pointer: Option<PointerEvent>,
    last_pointer: Option<PointerEvent>,
    /// Re-run hover for the last pointer (camera moved underneath it)
    rehover: bool,
    points_placed: usize,
    events: Vec<InteractionEvent>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            setup: SetupRetry::new(&config.setup_retry),
            picking: PickingService::new(&config),
            effects: VisualEffects::new(config.overlay.clone()),
            config,
            state: LayerState::Uninitialized,
            selection: SelectionSet::new(),
            hover: HoverState::default(),
            tool: ActiveTool::default(),
            gizmo: Box::new(DragGizmo::default()),
            highlighted: Vec::new(),
            pending_pointer: None,
            last_pointer: None,
            rehover: false,
            points_placed: 0,
            events: Vec::new(),
        }
    }

    /// Use a host-provided transform gizmo instead of the built-in one
    pub fn with_gizmo(mut self, gizmo: Box<dyn TransformGizmo + Send + Sync>) -> Self {
        self.gizmo = gizmo;
        self
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn state(&self) -> LayerState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.state == LayerState::Armed
    }

    pub fn tool(&self) -> &ActiveTool {
        &self.tool
    }

    pub fn tool_kind(&self) -> ToolKind {
        self.tool.kind()
    }

    pub fn cursor(&self) -> CursorStyle {
        self.tool.kind().cursor()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hover.current()
    }

    pub fn effects(&self) -> &VisualEffects {
        &self.effects
    }

    pub fn picking(&self) -> &PickingService {
        &self.picking
    }

    pub fn gizmo(&self) -> &dyn TransformGizmo {
        self.gizmo.as_ref()
    }

    pub fn set_gizmo_mode(&mut self, mode: GizmoMode) {
        self.gizmo.set_mode(mode);
    }

    /// Take the notifications produced since the last call
    pub fn drain_events(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Arm once collaborators are available, retrying within the configured bounds
    pub fn poll_setup(&mut self, elapsed: Duration, available: impl FnOnce() -> bool) -> SetupStatus {
        if self.state != LayerState::Uninitialized {
            return self.setup.status();
        }
        let status = self.setup.tick(elapsed, available);
        if status == SetupStatus::Ready {
            self.arm();
        }
        status
    }

    /// Start handling input
    pub fn arm(&mut self) {
        if self.state == LayerState::Uninitialized {
            self.state = LayerState::Armed;
            info!("Interaction layer armed with {} tool", self.tool.kind());
        }
    }

    /// Queue a pointer move for the next frame; returns the cursor to (re)apply
    pub fn pointer_move(&mut self, event: PointerEvent) -> CursorStyle {
        if self.is_armed() {
            self.pending_pointer = Some(event);
            self.last_pointer = Some(event);
        }
        self.cursor()
    }

    /// Pointer left the viewport
    pub fn pointer_leave(&mut self, scene: &mut SceneGraph) {
        self.pending_pointer = None;
        self.last_pointer = None;
        if self.is_armed() {
            self.set_hover(scene, None);
        }
    }

    /// Camera moved without the pointer moving; hover is re-evaluated next frame
    pub fn on_camera_change(&mut self) {
        if self.is_armed() && self.last_pointer.is_some() {
            self.rehover = true;
        }
    }

    /// Scene content was added or removed by someone else (e.g. a model loader)
    pub fn notify_scene_changed(&mut self) {
        self.picking.invalidate();
    }

    /// Per-frame work: overlay transforms, selection effects, and at most one pointer pick
    pub fn frame(&mut self, scene: &mut SceneGraph, view: &mut ViewContext<'_>) {
        if !self.is_armed() {
            return;
        }
        self.forget_removed(scene);
        self.reconcile_selection(scene);
        self.effects.sync_overlays(scene);

        let event = match self.pending_pointer.take() {
            Some(event) => Some(event),
            None if self.rehover => self.last_pointer,
            None => None,
        };
        self.rehover = false;

        if let Some(event) = event {
            self.process_pointer_move(scene, view, event);
        }
    }

    pub fn click(&mut self, scene: &mut SceneGraph, view: &mut ViewContext<'_>, event: PointerEvent) {
        if !self.is_armed() {
            return;
        }
        self.with_tool(scene, view, |tool, ctx| tool.on_click(ctx, event));
    }

    /// Right-click
    pub fn context_menu(&mut self, scene: &mut SceneGraph, view: &mut ViewContext<'_>, event: PointerEvent) {
        if !self.is_armed() {
            return;
        }
        self.with_tool(scene, view, |tool, ctx| tool.on_context_menu(ctx, event));
    }

    /// Abandon the active tool's in-progress operation (Escape)
    pub fn cancel(&mut self, scene: &mut SceneGraph, view: &mut ViewContext<'_>) {
        let event = self.last_pointer.unwrap_or_default();
        self.context_menu(scene, view, event);
    }

    /// Returns true when the active tool claimed the drag, so the host must not orbit
    pub fn drag_start(&mut self, scene: &mut SceneGraph, view: &mut ViewContext<'_>, event: PointerEvent) -> bool {
        if !self.is_armed() {
            return false;
        }
        let claimed = self.with_tool(scene, view, |tool, ctx| tool.on_drag_start(ctx, event));
        if claimed {
            // No hover churn while dragging
            self.set_hover(scene, None);
        }
        claimed
    }

    pub fn drag(&mut self, scene: &mut SceneGraph, view: &mut ViewContext<'_>, event: PointerEvent) {
        if !self.is_armed() {
            return;
        }
        self.last_pointer = Some(event);
        self.with_tool(scene, view, |tool, ctx| tool.on_drag(ctx, event));
        self.effects.sync_overlays(scene);
    }

    pub fn drag_end(&mut self, scene: &mut SceneGraph, view: &mut ViewContext<'_>, event: PointerEvent) {
        if !self.is_armed() {
            return;
        }
        self.with_tool(scene, view, |tool, ctx| tool.on_drag_end(ctx, event));
        self.pending_pointer = Some(event);
    }

    /// Switch tools: hover is cleared and the outgoing tool's transient state discarded
    pub fn set_tool(&mut self, scene: &mut SceneGraph, view: &mut ViewContext<'_>, kind: ToolKind) {
        if kind == self.tool.kind() {
            return;
        }
        self.set_hover(scene, None);
        self.with_tool(scene, view, |tool, ctx| {
            tool.reset(ctx);
            *tool = ActiveTool::new(kind);
            tool.activate(ctx);
        });

        info!("Tool changed to {}", kind);
        self.events.push(InteractionEvent::ToolChanged(kind));
    }

    /// Remove a subtree (e.g. an unloaded model): clears hover, selection, and
    /// overlays that point into it, then disposes and detaches it.
    pub fn unload(&mut self, scene: &mut SceneGraph, node: NodeId) {
        let removed = scene.descendants(node);
        if removed.is_empty() {
            return;
        }

        if self.hover.current().is_some_and(|h| removed.contains(&h)) {
            self.set_hover(scene, None);
        }
        if self.gizmo.attached().is_some_and(|g| removed.contains(&g)) {
            self.gizmo.end_drag();
            self.gizmo.detach();
        }
        for id in &removed {
            self.effects.clear_node(scene, *id);
        }
        self.highlighted.retain(|h| !removed.contains(h));
        self.selection.remove_nodes(&removed);

        match lifecycle::remove_and_dispose(scene, node) {
            Ok(detached) => debug!("Unloaded {:?} ({} nodes)", node, detached.len()),
            Err(err) => warn!("Failed to unload {:?}: {}", node, err),
        }
        self.picking.invalidate();
        self.reconcile_selection(scene);
    }

    /// Deactivate every overlay, cancel in-progress tool state, and stop handling input.
    ///
    /// Safe to call any number of times.
    pub fn teardown(&mut self, scene: &mut SceneGraph, view: &mut ViewContext<'_>) {
        if self.state != LayerState::Armed {
            return;
        }
        self.state = LayerState::TearingDown;

        self.with_tool(scene, view, |tool, ctx| tool.reset(ctx));
        if let Some(previous) = self.hover.clear().and_then(|t| t.previous) {
            self.events.push(InteractionEvent::HoverChanged(None));
            debug!("Hover on {:?} cleared by teardown", previous);
        }
        self.effects.clear_all(scene);
        self.highlighted.clear();
        self.pending_pointer = None;
        self.last_pointer = None;
        self.rehover = false;

        self.state = LayerState::Uninitialized;
        self.setup = SetupRetry::new(&self.config.setup_retry);
        info!("Interaction layer torn down");
    }

    /// Drop hover, selection, gizmo, and effect state for nodes that left the
    /// scene without going through [`InteractionController::unload`]
    fn forget_removed(&mut self, scene: &mut SceneGraph) {
        if self.hover.current().is_some_and(|h| !scene.contains(h)) {
            self.set_hover(scene, None);
        }
        if self.gizmo.attached().is_some_and(|g| !scene.contains(g)) {
            self.gizmo.end_drag();
            self.gizmo.detach();
        }

        let mut gone: Vec<NodeId> = self
            .selection
            .nodes()
            .into_iter()
            .chain(self.effects.owners())
            .filter(|id| !scene.contains(*id))
            .collect();
        gone.sort();
        gone.dedup();
        if gone.is_empty() {
            return;
        }

        debug!("Forgetting {} removed node(s)", gone.len());
        self.selection.remove_nodes(&gone);
        for id in &gone {
            self.effects.clear_node(scene, *id);
        }
        self.highlighted.retain(|h| !gone.contains(h));
    }

    fn process_pointer_move(&mut self, scene: &mut SceneGraph, view: &mut ViewContext<'_>, event: PointerEvent) {
        if self.gizmo.is_dragging() {
            return;
        }
        let hit = self.picking.pick(event.position, &view.camera, &view.viewport, scene);
        self.set_hover(scene, hit.map(|hit| hit.node));

        self.with_tool(scene, view, |tool, ctx| tool.on_pointer_move(ctx, event));
    }

    fn set_hover(&mut self, scene: &mut SceneGraph, next: Option<NodeId>) {
        let Some(transition) = self.hover.update(next) else {
            return;
        };

        if let Some(previous) = transition.previous {
            if !scene.contains(previous) {
                // Removed underneath us; drop whatever it left behind
                self.effects.clear_node(scene, previous);
            } else if let Err(err) = self.effects.apply(scene, previous, Highlight::Hover, false) {
                warn!("Failed to clear hover on {:?}: {}", previous, err);
            }
        }
        if let Some(next) = transition.next
            && let Err(err) = self.effects.apply(scene, next, Highlight::Hover, true)
        {
            warn!("Failed to show hover on {:?}: {}", next, err);
        }

        self.events.push(InteractionEvent::HoverChanged(next));
    }

    /// Run `f` against the active tool, then apply the actions it produced
    fn with_tool<R>(
        &mut self,
        scene: &mut SceneGraph,
        view: &mut ViewContext<'_>,
        f: impl FnOnce(&mut ActiveTool, &mut ToolContext<'_>) -> R,
    ) -> R {
        let mut actions = Vec::new();
        let result = {
            let mut ctx = ToolContext {
                scene: &mut *scene,
                picking: &mut self.picking,
                selection: &mut self.selection,
                gizmo: self.gizmo.as_mut(),
                orbit: &mut *view.orbit,
                camera: &view.camera,
                viewport: &view.viewport,
                config: &self.config,
                actions: &mut actions,
            };
            f(&mut self.tool, &mut ctx)
        };

        for action in actions {
            self.handle_action(scene, action);
        }
        self.reconcile_selection(scene);
        result
    }

    fn handle_action(&mut self, scene: &mut SceneGraph, action: ToolAction) {
        match action {
            ToolAction::PointCreated(position) => {
                self.points_placed += 1;
                let root = scene.root();
                let name = format!("Point {}", self.points_placed);
                match markers::add_point_marker(
                    scene,
                    root,
                    name,
                    position,
                    self.config.marker_radius,
                    markers::POINT_COLOR,
                ) {
                    Ok(_) => self.picking.invalidate(),
                    Err(err) => warn!("Failed to add point marker: {}", err),
                }
                self.events.push(InteractionEvent::PointCreated(position));
            }
            ToolAction::MeasurementStarted(start) => {
                debug!("Measurement start recorded at {:?}", start);
            }
            ToolAction::MeasurementPreview { start, end } => {
                self.events.push(InteractionEvent::MeasurementPreview {
                    start,
                    end,
                    distance: start.distance(end),
                });
            }
            ToolAction::MeasurementCreated { start, end } => {
                let root = scene.root();
                match markers::add_measurement(scene, root, start, end, self.config.marker_radius) {
                    Ok(_) => self.picking.invalidate(),
                    Err(err) => warn!("Failed to add measurement: {}", err),
                }
                self.events.push(InteractionEvent::MeasurementCreated { start, end });
            }
            ToolAction::MeasurementCancelled => {
                self.events.push(InteractionEvent::MeasurementCancelled);
            }
        }
    }

    /// Bring selection effects in line with the selection set
    fn reconcile_selection(&mut self, scene: &mut SceneGraph) {
        let changed = self.selection.take_changed();
        let wanted = self.selection.nodes();
        if !changed && wanted == self.highlighted {
            return;
        }

        for node in &self.highlighted {
            if wanted.contains(node) {
                continue;
            }
            if !scene.contains(*node) {
                self.effects.clear_node(scene, *node);
            } else if let Err(err) = self.effects.apply(scene, *node, Highlight::Selection, false) {
                warn!("Failed to clear selection effect on {:?}: {}", node, err);
            }
        }
        for node in &wanted {
            if !self.highlighted.contains(node)
                && let Err(err) = self.effects.apply(scene, *node, Highlight::Selection, true)
            {
                warn!("Failed to show selection effect on {:?}: {}", node, err);
            }
        }
        self.highlighted = wanted;

        if changed {
            self.events
                .push(InteractionEvent::SelectionChanged(self.selection.list().to_vec()));
        }
    }
}
