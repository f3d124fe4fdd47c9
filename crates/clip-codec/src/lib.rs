// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persistence of clipboard entries.
//!
//! An entry is the pair produced by one `clip_core::capture` pass (a
//! [`SceneTreeDocument`](clip_core::SceneTreeDocument) and its
//! [`TemplateDictionary`](clip_core::TemplateDictionary)) stored as:
//!
//! - `<id>.meta`: [`EntryMetadata`] as JSON, carrying the dictionary;
//! - `<id>.data`: the document wrapped in a versioned envelope, gzip
//!   compressed when the metadata says so;
//! - `<id>.png`: an opaque preview thumbnail.
//!
//! [`Clipboard`] is the service over an [`EntryStore`]; [`ImportJob`] replays a
//! stored entry into a scene one stage at a time.

mod clipboard;
pub mod compression;
pub mod config;
mod envelope;
mod error;
mod import;
mod metadata;
mod store;

pub use clipboard::{Clipboard, StoredEntry};
pub use envelope::{decode_tree, encode_tree, Representation};
pub use error::{CodecError, StoreError};
pub use import::{ImportJob, JobError, Stage, Step};
pub use metadata::{EntryFilter, EntryId, EntryMetadata};
pub use store::{Artifact, EntryStore, FsEntryStore};
