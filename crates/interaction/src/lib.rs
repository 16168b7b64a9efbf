//! Scene interaction for Vista
//!
//! Engine-agnostic picking, hover and selection feedback, tool state, and
//! resource lifecycle over a retained [`SceneGraph`]. The viewer crate
//! mirrors the graph into Bevy and feeds input into an
//! [`InteractionController`]; everything here is plain data plus `glam`.

pub mod camera;
pub mod controller;
pub mod effects;
pub mod error;
pub mod gizmo;
pub mod lifecycle;
pub mod markers;
pub mod pickable;
pub mod picking;
pub mod pool;
pub mod ray;
pub mod resources;
pub mod scene;
pub mod selection;
pub mod setup;
pub mod shapes;
pub mod tools;

pub use camera::{FixedCamera, GroundPlane, OrbitControls, PickCamera, PickProjection, ViewportRect};
pub use controller::{InteractionController, InteractionEvent, LayerState, ViewContext};
pub use effects::{EffectKind, Highlight, VisualEffects};
pub use error::{InteractionError, ResourceError, Result};
pub use gizmo::{DragGizmo, GizmoMode, TransformGizmo};
pub use lifecycle::{DisposalReport, dispose, remove_and_dispose};
pub use pickable::PickableSet;
pub use picking::{PickHit, PickingService};
pub use pool::{Lease, Poolable, PrimitivePool, PrimitivePools};
pub use ray::Ray;
pub use resources::{
    DisposedResource, Geometry, GeometryHandle, GpuResources, Material, MaterialHandle, TextureHandle,
    Topology,
};
pub use scene::{MaterialSlot, NodeDesc, NodeId, NodeKind, NodeTransform, Renderable, SceneGraph, SceneNode};
pub use selection::{HoverState, SelectionContext, SelectionKey, SelectionRecord, SelectionSet};
pub use setup::{SetupRetry, SetupStatus};
pub use tools::{ActiveTool, CursorStyle, Modifiers, PointerEvent, ToolKind};
