// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Asset-catalog port trait.

use crate::{AssetKind, TemplateKind};

/// Read-only view of the assets available in the target project.
///
/// The returned path strings double as asset handles: they are what
/// [`crate::SceneGraph::instantiate`] and [`crate::SceneGraph::set_material`]
/// accept.
pub trait AssetCatalog {
    /// Candidate asset paths for a name query restricted to `kind`.
    ///
    /// The query is fuzzy on purpose (a host may return `Wall_01_Alt` for
    /// `Wall_01`); callers filter candidates themselves.
    fn find_assets(&self, name_query: &str, kind: AssetKind) -> Vec<String>;

    /// Flavor of the template stored at `path`, or `None` when `path` is not
    /// a template.
    fn template_kind(&self, path: &str) -> Option<TemplateKind>;
}
