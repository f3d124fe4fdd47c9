// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port contract for the scene clipboard.
//!
//! This crate defines the seam between the capture/reconstruct engine and the
//! host that owns the live scene and the project's assets. It contains NO
//! serialization logic: documents live in `clip-core`, persistence in
//! `clip-codec`.
//!
//! # Design Principles
//!
//! - **Hosts are dumb**: a [`SceneGraph`] exposes primitives (parenting,
//!   transforms, material slots); every diff/resolve decision is made by the
//!   engine.
//! - **Handles, not references**: nodes are addressed by opaque [`NodeId`]s
//!   and assets by their project path string.
//! - **Template definitions are nodes too**: the definition hierarchy of a
//!   template is browsed through the same [`SceneGraph`] calls as live nodes.

use thiserror::Error;

mod catalog;
mod math;
mod report;
mod scene;
mod types;

pub use catalog::AssetCatalog;
pub use math::{Quat, Vec3, ROTATION_EPSILON, VECTOR_EPSILON_SQUARED};
pub use report::{ErrorSink, IdSource};
pub use scene::SceneGraph;
pub use types::{AssetKind, NodeId, TemplateAsset, TemplateKind, Transform};

/// Error type for scene-graph mutations requested by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    /// The handle does not name a live node.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    /// The node has no rendering surface, so it has no material slots.
    #[error("node {0:?} has no rendering surface")]
    NoRenderingSurface(NodeId),
    /// The material slot index is outside the node's slot range.
    #[error("node {node:?} has no material slot {slot}")]
    SlotOutOfRange {
        /// Node whose slots were addressed.
        node: NodeId,
        /// Requested slot.
        slot: usize,
    },
    /// Parenting would make a node its own ancestor.
    #[error("parenting {node:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Node being re-parented.
        node: NodeId,
        /// Requested parent.
        parent: NodeId,
    },
    /// The asset path does not name a template the host can instantiate.
    #[error("cannot instantiate template at {0}")]
    Instantiate(String),
    /// A backend-specific error occurred.
    #[error("backend error: {0}")]
    Backend(String),
}
