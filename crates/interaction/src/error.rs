//! Error types for the interaction layer.

use crate::resources::{GeometryHandle, MaterialHandle, TextureHandle};
use crate::scene::NodeId;

/// Errors raised by resource registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("Geometry {0:?} was already disposed")]
    GeometryDisposed(GeometryHandle),

    #[error("Material {0:?} was already disposed")]
    MaterialDisposed(MaterialHandle),

    #[error("Texture {0:?} was already disposed")]
    TextureDisposed(TextureHandle),
}

/// Errors raised by scene, picking, effect, and tool operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InteractionError {
    #[error("Scene node {0:?} does not exist")]
    NodeNotFound(NodeId),

    #[error("Scene node {0:?} is the scene root and cannot be detached")]
    RootNode(NodeId),

    #[error("Scene node {node:?} has no {what}")]
    MissingComponent { node: NodeId, what: &'static str },

    #[error("Required collaborator unavailable: {0}")]
    CollaboratorUnavailable(&'static str),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Result alias for interaction operations.
pub type Result<T> = std::result::Result<T, InteractionError>;
