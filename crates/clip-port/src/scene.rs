// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene-graph port trait.

use crate::{NodeId, PortError, TemplateAsset, Transform, Vec3};

/// Scene-graph port consumed by capture and reconstruction.
///
/// Read accessors take a handle previously obtained from this port. Hosts
/// answer unknown handles with neutral values (empty name, no children)
/// rather than panicking; mutations report them as [`PortError::UnknownNode`].
///
/// # Template instances
///
/// A node created from a template asset is a *template instance root*; every
/// node below it that came from the template is *part of* that instance. When
/// a template definition itself contains instances of other templates, those
/// nested roots are instance roots too, but only the topmost one is the
/// *outermost* root. Nodes the user added under an instance afterwards are not
/// part of it.
pub trait SceneGraph {
    /// Parent of `node`, or `None` for a top-level node.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Number of direct children.
    fn child_count(&self, node: NodeId) -> usize;

    /// Child at `index` in sibling order.
    fn child(&self, node: NodeId, index: usize) -> Option<NodeId>;

    /// Position of `node` among its siblings (0 for top-level nodes).
    fn sibling_index(&self, node: NodeId) -> usize;

    /// Display name.
    fn name(&self, node: NodeId) -> String;

    /// Local active flag.
    fn is_active(&self, node: NodeId) -> bool;

    /// Transform relative to the parent.
    fn local_transform(&self, node: NodeId) -> Transform;

    /// World position and rotation; scale stays local.
    fn world_transform(&self, node: NodeId) -> Transform;

    /// Material asset paths per rendering slot, or `None` when the node has
    /// no rendering surface.
    fn materials(&self, node: NodeId) -> Option<Vec<String>>;

    /// `true` when `node` is the root of a template instance (nested or not).
    fn is_template_instance_root(&self, node: NodeId) -> bool;

    /// Topmost template-instance root `node` belongs to.
    fn outermost_instance_root(&self, node: NodeId) -> Option<NodeId>;

    /// `true` when `node` came from any template instance.
    fn is_part_of_template(&self, node: NodeId) -> bool;

    /// Root of the template definition an instance root was created from.
    fn template_source(&self, instance_root: NodeId) -> Option<NodeId>;

    /// Asset backing the nearest template-instance root of `node`.
    fn template_asset(&self, node: NodeId) -> Option<TemplateAsset>;

    /// Creates a bare, parentless node.
    fn create_node(&mut self, name: &str) -> NodeId;

    /// Instantiates the template stored at `asset_path`; the new root is
    /// parentless.
    fn instantiate(&mut self, asset_path: &str) -> Result<NodeId, PortError>;

    /// Destroys `node` together with its subtree.
    fn destroy(&mut self, node: NodeId) -> Result<(), PortError>;

    /// Re-parents `node`, appending it as the last child of `parent`.
    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<(), PortError>;

    /// Sets the local active flag.
    fn set_active(&mut self, node: NodeId, active: bool) -> Result<(), PortError>;

    /// Sets the display name.
    fn set_name(&mut self, node: NodeId, name: &str) -> Result<(), PortError>;

    /// Sets the local position.
    fn set_local_position(&mut self, node: NodeId, position: Vec3) -> Result<(), PortError>;

    /// Sets the local rotation from Euler angles in degrees.
    fn set_local_rotation(&mut self, node: NodeId, euler_degrees: Vec3) -> Result<(), PortError>;

    /// Sets the local scale.
    fn set_local_scale(&mut self, node: NodeId, scale: Vec3) -> Result<(), PortError>;

    /// Assigns the material at `asset_path` into `slot`.
    ///
    /// Fails with [`PortError::NoRenderingSurface`] when the node cannot hold
    /// materials at all.
    fn set_material(&mut self, node: NodeId, slot: usize, asset_path: &str)
        -> Result<(), PortError>;
}
