//! Input handling - feeds Bevy pointer, button, and keyboard input into the
//! interaction controller
//!
//! Hotkeys:
//! - S / P / M / G: Select, Point, Measure, Move tool
//! - W / E / R: Gizmo translate, rotate, scale
//! - Escape: Cancel the active tool's operation

use bevy::input::mouse::MouseButton;
use bevy::prelude::*;
use bevy::window::{CursorIcon, CursorLeft, CursorMoved, PrimaryWindow, SystemCursorIcon};
use vista_config::InteractionConfig;
use vista_interaction::{
    CursorStyle, GizmoMode, InteractionEvent, LayerState, Modifiers, PointerEvent, ToolKind, ViewContext,
    ViewportRect,
};

use crate::camera::{MainCamera, OrbitCamera, pick_camera};
use crate::{InteractionLayer, InteractionNotice, ViewerSet};

/// What a held left button turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressPhase {
    /// Not past the drag threshold yet; releasing is a click
    Pending,
    /// The active tool claimed the drag
    ToolDrag,
    /// Dragged, but no tool wanted it
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: Vec2,
    phase: PressPhase,
}

/// Pointer tracking between systems
#[derive(Resource, Default)]
pub struct PointerState {
    /// Last known cursor position in window coordinates
    pub position: Option<Vec2>,
    press: Option<Press>,
    /// Cursor the controller asked for on the last pointer move
    cursor: Option<CursorStyle>,
}

pub struct InteractionInputPlugin;

impl Plugin for InteractionInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerState>()
            .add_systems(
                Update,
                (
                    poll_interaction_setup,
                    track_pointer,
                    handle_mouse_buttons,
                    handle_tool_hotkeys,
                    detect_camera_motion,
                )
                    .chain()
                    .in_set(ViewerSet::Input),
            )
            .add_systems(
                Update,
                (run_interaction_frame, forward_interaction_events, apply_cursor_icon)
                    .chain()
                    .in_set(ViewerSet::Frame),
            )
            .add_systems(Last, teardown_on_exit);
    }
}

fn modifiers(key_input: &ButtonInput<KeyCode>) -> Modifiers {
    Modifiers {
        shift: key_input.pressed(KeyCode::ShiftLeft) || key_input.pressed(KeyCode::ShiftRight),
        ctrl: key_input.pressed(KeyCode::ControlLeft)
            || key_input.pressed(KeyCode::ControlRight)
            || key_input.pressed(KeyCode::SuperLeft)
            || key_input.pressed(KeyCode::SuperRight),
    }
}

/// Controller view over the main camera.
///
/// Callers pass the orbit state without change detection so merely building
/// a context does not count as camera motion.
fn view_context<'a>(
    window: &Window,
    transform: &GlobalTransform,
    projection: &Projection,
    orbit: &'a mut OrbitCamera,
) -> ViewContext<'a> {
    ViewContext {
        camera: pick_camera(transform, projection),
        viewport: ViewportRect::sized(window.width(), window.height()),
        orbit,
    }
}

fn system_cursor(style: CursorStyle) -> SystemCursorIcon {
    match style {
        CursorStyle::Default => SystemCursorIcon::Default,
        CursorStyle::Crosshair => SystemCursorIcon::Crosshair,
        CursorStyle::Move => SystemCursorIcon::Move,
    }
}

/// Arm the controller once a window with a size and the main camera exist
fn poll_interaction_setup(
    time: Res<Time>,
    mut layer: ResMut<InteractionLayer>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(), With<MainCamera>>,
) {
    if layer.controller.state() != LayerState::Uninitialized {
        return;
    }
    let available =
        windows.single().is_ok_and(|w| w.width() > 0.0 && w.height() > 0.0) && !cameras.is_empty();
    layer.controller.poll_setup(time.delta(), || available);
}

/// Queue pointer moves; the controller processes the latest once per frame
fn track_pointer(
    key_input: Res<ButtonInput<KeyCode>>,
    mut cursor_events: MessageReader<CursorMoved>,
    mut left_events: MessageReader<CursorLeft>,
    mut pointer: ResMut<PointerState>,
    mut layer: ResMut<InteractionLayer>,
) {
    // Only the most recent position matters
    if let Some(moved) = cursor_events.read().last() {
        pointer.position = Some(moved.position);
        let event = PointerEvent {
            position: moved.position,
            modifiers: modifiers(&key_input),
        };
        pointer.cursor = Some(layer.controller.pointer_move(event));
    }

    if left_events.read().last().is_some() {
        pointer.position = None;
        let InteractionLayer { scene, controller } = &mut *layer;
        controller.pointer_leave(scene);
    }
}

/// Left press/release becomes a click or a drag; right press opens the context action
fn handle_mouse_buttons(
    mouse_button: Res<ButtonInput<MouseButton>>,
    key_input: Res<ButtonInput<KeyCode>>,
    config: Res<InteractionConfig>,
    mut pointer: ResMut<PointerState>,
    mut layer: ResMut<InteractionLayer>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cameras: Query<(&GlobalTransform, &Projection, &mut OrbitCamera), With<MainCamera>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(position) = window.cursor_position().or(pointer.position) else {
        return;
    };
    let Ok((transform, projection, mut orbit)) = cameras.single_mut() else {
        return;
    };

    let InteractionLayer { scene, controller } = &mut *layer;
    let mut view = view_context(window, transform, projection, orbit.bypass_change_detection());
    let event = PointerEvent {
        position,
        modifiers: modifiers(&key_input),
    };

    if mouse_button.just_pressed(MouseButton::Right) {
        controller.context_menu(scene, &mut view, event);
    }

    if mouse_button.just_pressed(MouseButton::Left) {
        pointer.press = Some(Press {
            origin: position,
            phase: PressPhase::Pending,
        });
    }

    if mouse_button.pressed(MouseButton::Left)
        && let Some(press) = pointer.press.as_mut()
    {
        match press.phase {
            PressPhase::Pending if position.distance(press.origin) > config.drag_threshold_px => {
                let start = PointerEvent {
                    position: press.origin,
                    ..event
                };
                if controller.drag_start(scene, &mut view, start) {
                    press.phase = PressPhase::ToolDrag;
                    controller.drag(scene, &mut view, event);
                } else {
                    press.phase = PressPhase::Ignored;
                }
            }
            PressPhase::ToolDrag => controller.drag(scene, &mut view, event),
            PressPhase::Pending | PressPhase::Ignored => {}
        }
    }

    if mouse_button.just_released(MouseButton::Left)
        && let Some(press) = pointer.press.take()
    {
        match press.phase {
            PressPhase::Pending => controller.click(scene, &mut view, event),
            PressPhase::ToolDrag => controller.drag_end(scene, &mut view, event),
            PressPhase::Ignored => {}
        }
    }
}

/// Tool and gizmo-mode hotkeys
fn handle_tool_hotkeys(
    key_input: Res<ButtonInput<KeyCode>>,
    mut layer: ResMut<InteractionLayer>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cameras: Query<(&GlobalTransform, &Projection, &mut OrbitCamera), With<MainCamera>>,
) {
    let held = modifiers(&key_input);
    // Leave chorded shortcuts to whoever owns them
    if held.ctrl {
        return;
    }

    let tool = [
        (KeyCode::KeyS, ToolKind::Select),
        (KeyCode::KeyP, ToolKind::Point),
        (KeyCode::KeyM, ToolKind::Measure),
        (KeyCode::KeyG, ToolKind::Move),
    ]
    .into_iter()
    .find_map(|(key, kind)| key_input.just_pressed(key).then_some(kind));

    let gizmo_mode = [
        (KeyCode::KeyW, GizmoMode::Translate),
        (KeyCode::KeyE, GizmoMode::Rotate),
        (KeyCode::KeyR, GizmoMode::Scale),
    ]
    .into_iter()
    .find_map(|(key, mode)| key_input.just_pressed(key).then_some(mode));

    let cancel = key_input.just_pressed(KeyCode::Escape);

    if tool.is_none() && gizmo_mode.is_none() && !cancel {
        return;
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let Ok((transform, projection, mut orbit)) = cameras.single_mut() else {
        return;
    };
    let InteractionLayer { scene, controller } = &mut *layer;
    let mut view = view_context(window, transform, projection, orbit.bypass_change_detection());

    if let Some(mode) = gizmo_mode {
        info!("Gizmo mode: {}", mode);
        controller.set_gizmo_mode(mode);
    }
    if cancel {
        controller.cancel(scene, &mut view);
    }
    if let Some(kind) = tool {
        controller.set_tool(scene, &mut view, kind);
    }
}

/// The camera moved under a still pointer; hover must be re-evaluated
fn detect_camera_motion(
    moved: Query<(), (With<MainCamera>, Changed<GlobalTransform>)>,
    mut layer: ResMut<InteractionLayer>,
) {
    if !moved.is_empty() {
        layer.controller.on_camera_change();
    }
}

fn run_interaction_frame(
    mut layer: ResMut<InteractionLayer>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cameras: Query<(&GlobalTransform, &Projection, &mut OrbitCamera), With<MainCamera>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Ok((transform, projection, mut orbit)) = cameras.single_mut() else {
        return;
    };
    let InteractionLayer { scene, controller } = &mut *layer;
    let mut view = view_context(window, transform, projection, orbit.bypass_change_detection());
    controller.frame(scene, &mut view);
}

/// Log controller notifications and pass them on as Bevy messages
fn forward_interaction_events(mut layer: ResMut<InteractionLayer>, mut notices: MessageWriter<InteractionNotice>) {
    for event in layer.controller.drain_events() {
        match &event {
            InteractionEvent::PointCreated(position) => {
                info!("Point created at ({:.3}, {:.3}, {:.3})", position.x, position.y, position.z);
            }
            InteractionEvent::MeasurementCreated { start, end } => {
                info!("Measurement created: {:.3}", start.distance(*end));
            }
            InteractionEvent::SelectionChanged(records) => {
                info!("Selection changed: {} item(s)", records.len());
            }
            InteractionEvent::ToolChanged(kind) => info!("Tool changed to {}", kind),
            InteractionEvent::MeasurementPreview { .. }
            | InteractionEvent::MeasurementCancelled
            | InteractionEvent::HoverChanged(_) => debug!("{:?}", event),
        }
        notices.write(InteractionNotice(event));
    }
}

/// Re-apply the tool cursor after every pointer move; other code may have replaced it
fn apply_cursor_icon(
    mut commands: Commands,
    mut pointer: ResMut<PointerState>,
    windows: Query<Entity, With<PrimaryWindow>>,
) {
    let Some(style) = pointer.cursor.take() else {
        return;
    };
    if let Ok(window) = windows.single() {
        commands
            .entity(window)
            .insert(CursorIcon::from(system_cursor(style)));
    }
}

/// Release overlays and restore camera controls when the app shuts down
fn teardown_on_exit(
    mut exit_events: MessageReader<AppExit>,
    mut layer: ResMut<InteractionLayer>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cameras: Query<(&GlobalTransform, &Projection, &mut OrbitCamera), With<MainCamera>>,
) {
    if exit_events.read().last().is_none() {
        return;
    }
    let Ok((transform, projection, mut orbit)) = cameras.single_mut() else {
        return;
    };
    let viewport = windows
        .single()
        .map(|w| ViewportRect::sized(w.width(), w.height()))
        .unwrap_or_else(|_| ViewportRect::sized(0.0, 0.0));
    let InteractionLayer { scene, controller } = &mut *layer;
    let mut view = ViewContext {
        camera: pick_camera(transform, projection),
        viewport,
        orbit: orbit.bypass_change_detection(),
    };
    controller.teardown(scene, &mut view);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_from_keys() {
        let mut keys = ButtonInput::<KeyCode>::default();
        keys.press(KeyCode::ShiftLeft);
        let held = modifiers(&keys);
        assert!(held.shift && !held.ctrl);
        assert!(held.toggles_selection());

        keys.release(KeyCode::ShiftLeft);
        keys.press(KeyCode::SuperLeft);
        assert!(modifiers(&keys).ctrl);
    }

    #[test]
    fn test_tool_cursors_map_to_system_icons() {
        assert_eq!(system_cursor(ToolKind::Select.cursor()), SystemCursorIcon::Default);
        assert_eq!(system_cursor(ToolKind::Point.cursor()), SystemCursorIcon::Crosshair);
        assert_eq!(system_cursor(ToolKind::Move.cursor()), SystemCursorIcon::Move);
    }
}
