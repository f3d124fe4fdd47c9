// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Capture and reconstruction of template-instance subtrees.
//!
//! A live subtree is captured as a [`SceneTreeDocument`]: sparse records that
//! hold only what deviates from the templates the subtree was built from,
//! plus a [`TemplateDictionary`] naming those templates and materials by
//! project-independent search path and name. Reconstruction re-resolves the
//! dictionary against the target project's assets and replays the records.
//!
//! # Pipeline
//!
//! ```text
//! capture(scene, roots) ──► Capture { document, dictionary }
//!                                   │
//!               ensure_ready(catalog, dictionary)
//!                                   │
//!            deserialize(scene, catalog, document, dictionary, parent)
//! ```
//!
//! Everything operates through the ports of `clip-port`; enable the
//! `test-utils` feature for an in-memory scene and catalog.

pub mod address;
mod deserializer;
mod dictionary;
mod differ;
mod error;
mod ids;
mod lookup;
mod model;
mod readiness;
mod report;
mod serializer;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use address::AddressError;
pub use deserializer::deserialize;
pub use dictionary::{
    sanitize_path, split_asset_path, DictionaryError, DictionaryItem, ItemId, TemplateDictionary,
};
pub use differ::{compare_nodes, material_changes, NodeDelta};
pub use error::{CaptureError, ImportError, ReconstructError};
pub use ids::{SequentialIds, UuidIds};
pub use lookup::{file_stem, find_material, find_template, is_available};
pub use model::{
    DocumentError, MaterialOverride, NodeStatus, RecordId, SceneNodeRecord, SceneTreeDocument,
    SerializedVector, TemplateReference,
};
pub use readiness::{ensure_ready, find_available, find_missing, reconstruct};
pub use report::TracingErrorSink;
pub use serializer::{capture, Capture};
