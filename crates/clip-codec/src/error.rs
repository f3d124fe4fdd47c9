// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error types for entry encoding and storage.

use thiserror::Error;

use crate::metadata::EntryId;
use crate::store::Artifact;

/// Failure turning bytes into a document or back.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The envelope names a representation this build cannot read.
    #[error("unknown representation: {0}; try upgrading")]
    UnknownRepresentation(String),
    /// Envelope or document JSON did not parse.
    #[error("malformed entry: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Gzip stream could not be written or read.
    #[error("compression error: {0}")]
    Compression(#[source] std::io::Error),
}

/// Failure reading or writing an entry store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The entry has no such artifact.
    #[error("entry {id} has no {artifact:?}")]
    NotFound {
        /// Entry key.
        id: EntryId,
        /// Missing file.
        artifact: Artifact,
    },
    /// The id cannot name a file inside the content directory.
    #[error("invalid entry id: {0}")]
    InvalidId(EntryId),
    /// Metadata JSON did not parse or encode.
    #[error("bad metadata for entry {id}: {source}")]
    Metadata {
        /// Entry key.
        id: EntryId,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// Tree data could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
