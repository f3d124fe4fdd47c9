// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Versioned envelope around a serialized document.
//!
//! ```json
//! { "representation": "JsonV1", "tree": { "root": "…", "nodes": [ … ] } }
//! ```
//!
//! The representation tag is read before the tree is interpreted, so an
//! entry written by a newer build fails with
//! [`CodecError::UnknownRepresentation`] instead of a parse error.

use clip_core::SceneTreeDocument;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compression::{gunzip, gzip};
use crate::error::CodecError;

/// Known tree encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Representation {
    /// Sparse records as JSON.
    JsonV1,
}

impl Representation {
    /// Tag written into the envelope.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JsonV1 => "JsonV1",
        }
    }

    /// Parses an envelope tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "JsonV1" => Some(Self::JsonV1),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    representation: &'static str,
    tree: &'a SceneTreeDocument,
}

#[derive(Deserialize)]
struct RawEnvelope {
    representation: String,
    tree: serde_json::Value,
}

/// Encodes `document` as a `JsonV1` envelope, gzipped when `compressed`.
pub fn encode_tree(document: &SceneTreeDocument, compressed: bool) -> Result<Vec<u8>, CodecError> {
    let json = serde_json::to_vec(&EnvelopeRef {
        representation: Representation::JsonV1.as_str(),
        tree: document,
    })?;
    if compressed {
        gzip(&json).map_err(CodecError::Compression)
    } else {
        Ok(json)
    }
}

/// Decodes bytes written by [`encode_tree`]. `compressed` comes from the
/// entry metadata; the bytes themselves are not sniffed.
pub fn decode_tree(bytes: &[u8], compressed: bool) -> Result<SceneTreeDocument, CodecError> {
    let inflated;
    let json = if compressed {
        inflated = gunzip(bytes).map_err(CodecError::Compression)?;
        inflated.as_slice()
    } else {
        bytes
    };
    let raw: RawEnvelope = serde_json::from_slice(json)?;
    match Representation::from_tag(&raw.representation) {
        Some(Representation::JsonV1) => {
            let document: SceneTreeDocument = serde_json::from_value(raw.tree)?;
            debug!(records = document.len(), "decoded JsonV1 tree");
            Ok(document)
        }
        None => Err(CodecError::UnknownRepresentation(raw.representation)),
    }
}
