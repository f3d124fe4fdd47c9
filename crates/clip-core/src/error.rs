// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for capture, reconstruction and gated import.

use clip_port::{NodeId, PortError};
use thiserror::Error;

use crate::address::AddressError;
use crate::dictionary::{DictionaryError, DictionaryItem, ItemId};
use crate::model::{DocumentError, RecordId};

/// Capture-side failure.
///
/// These indicate a host that violates its own contract (an instance without
/// a source asset, an asset with an unexpected extension); a well-formed live
/// scene never produces them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Nothing was selected.
    #[error("nothing selected")]
    EmptySelection,
    /// A selected node lies inside a template instance without being its
    /// outermost root.
    #[error("node {0:?} is part of a template instance; select its outermost root")]
    InsideTemplate(NodeId),
    /// A template-instance root reports no backing asset.
    #[error("template instance {0:?} has no template asset")]
    MissingTemplateAsset(NodeId),
    /// A template-instance root reports no definition hierarchy.
    #[error("template instance {0:?} has no definition to compare against")]
    MissingTemplateSource(NodeId),
    /// The differ was asked to compare a node that has no record yet.
    #[error("node {0:?} has no record")]
    Unrecorded(NodeId),
    /// Asset path could not be turned into a dictionary key.
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
    /// Address could not be built.
    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Failure while rebuilding a subtree from a document.
///
/// Every variant aborts the one import it occurred in; partial output is
/// destroyed before the error is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconstructError {
    /// The document violates its tree invariants.
    #[error("malformed document: {0}")]
    Document(#[from] DocumentError),
    /// The document is well formed but cannot be applied as written.
    #[error("malformed document: {0}")]
    Malformed(String),
    /// A recorded path no longer matches the target structure.
    #[error("record {record}: structure changed since capture: {source}")]
    Structure {
        /// Record whose path failed.
        record: RecordId,
        /// Resolution failure.
        source: AddressError,
    },
    /// A record references an item the dictionary does not contain.
    #[error("record {record} references unknown dictionary item {item}")]
    UnknownItem {
        /// Referencing record.
        record: RecordId,
        /// Missing item id.
        item: ItemId,
    },
    /// No template matching the reference exists in the target project.
    #[error("failed to instantiate template {name} (search path {search_path:?})")]
    TemplateNotFound {
        /// Template display name.
        name: String,
        /// Search path of the dictionary item.
        search_path: String,
    },
    /// No material matching the reference exists in the target project.
    #[error("failed to find material {name} (search path {search_path:?})")]
    MaterialNotFound {
        /// Material display name.
        name: String,
        /// Search path of the dictionary item.
        search_path: String,
    },
    /// The host rejected a scene mutation.
    #[error(transparent)]
    Scene(#[from] PortError),
}

/// Failure of a readiness-gated import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// Referenced assets are absent from the target project; nothing was
    /// created.
    #[error("{} referenced asset(s) missing from the project", .0.len())]
    MissingReferences(Vec<DictionaryItem>),
    /// Reconstruction started and was aborted.
    #[error(transparent)]
    Reconstruct(#[from] ReconstructError),
}
