// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deduplicated registry of template and material references.
//!
//! Items are keyed by content identity (sanitized search path plus kind),
//! never by a project-specific asset id, so a document stays meaningful in a
//! project whose copies of the same assets have different ids.

use std::fmt;

use clip_port::{AssetKind, IdSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Opaque identifier of a dictionary item.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(remote = "AssetKind")]
enum AssetKindDef {
    Template,
    Material,
}

/// One referenced template or material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryItem {
    /// Identifier referenced from node records.
    pub id: ItemId,
    /// Sanitized, project-root-relative directory.
    pub search_path: String,
    /// Expected asset name, used to re-locate the asset.
    pub verification_name: String,
    /// Template or material.
    #[serde(with = "AssetKindDef")]
    pub kind: AssetKind,
}

/// Failure to turn an asset path into a dictionary key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DictionaryError {
    /// The asset path does not end with any extension expected for its kind.
    #[error("asset path {path} does not end with one of {expected:?}")]
    UnexpectedExtension {
        /// Offending asset path.
        path: String,
        /// Extensions that were accepted.
        expected: &'static [&'static str],
    },
}

/// Registry of the assets one document refers to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDictionary {
    items: Vec<DictionaryItem>,
}

impl TemplateDictionary {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// All items in insertion order.
    pub fn items(&self) -> &[DictionaryItem] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` when no asset has been referenced.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the item for `(sanitize(path), kind)`, creating it on first use.
    ///
    /// The verification name of an existing item is never updated: the first
    /// caller to register a (path, kind) pair decides it.
    pub fn resolve_or_create<I>(
        &mut self,
        path: &str,
        verification_name: &str,
        kind: AssetKind,
        ids: &mut I,
    ) -> &DictionaryItem
    where
        I: IdSource + ?Sized,
    {
        let path = sanitize_path(path);
        debug!(%path, name = verification_name, ?kind, "resolving dictionary item");

        let position = match self
            .items
            .iter()
            .position(|item| item.search_path == path && item.kind == kind)
        {
            Some(position) => {
                debug!(id = %self.items[position].id, "dictionary hit");
                position
            }
            None => {
                let item = DictionaryItem {
                    id: ItemId(ids.fresh_id()),
                    search_path: path,
                    verification_name: verification_name.to_owned(),
                    kind,
                };
                debug!(id = %item.id, "dictionary miss, item created");
                self.items.push(item);
                self.items.len() - 1
            }
        };
        &self.items[position]
    }

    /// Splits a full asset path and resolves it; returns the item id and the
    /// asset's display name.
    pub fn resolve_asset<I>(
        &mut self,
        asset_path: &str,
        kind: AssetKind,
        ids: &mut I,
    ) -> Result<(ItemId, String), DictionaryError>
    where
        I: IdSource + ?Sized,
    {
        let (path, name) = split_asset_path(asset_path, kind.file_extensions())?;
        let item = self.resolve_or_create(&path, &name, kind, ids);
        Ok((item.id.clone(), name))
    }

    /// Looks up an item by id (linear).
    pub fn get_by_id(&self, id: &ItemId) -> Option<&DictionaryItem> {
        self.items.iter().find(|item| &item.id == id)
    }
}

impl fmt::Display for TemplateDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TemplateDictionary: {} items", self.items.len())
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    let tail = s.get(split..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        s.get(..split)
    } else {
        None
    }
}

/// Strips the parts of an asset path that differ between projects.
///
/// One leading `Assets/` is dropped, then every `Resources/` container,
/// leading or nested, is cut together with everything before it. All
/// comparisons ignore ASCII case.
pub fn sanitize_path(path: &str) -> String {
    const RESOURCES: &str = "Resources/";
    const INNER_RESOURCES: &str = "/resources/";

    let mut path = strip_prefix_ignore_case(path, "Assets/").unwrap_or(path);
    loop {
        if let Some(rest) = strip_prefix_ignore_case(path, RESOURCES) {
            path = rest;
            continue;
        }
        // ASCII lowercasing preserves byte offsets.
        match path.to_ascii_lowercase().find(INNER_RESOURCES) {
            Some(at) => path = &path[at + INNER_RESOURCES.len()..],
            None => break,
        }
    }
    path.to_owned()
}

/// Splits a full asset path into its sanitized directory and its file stem.
///
/// `Assets/Props/Metal/Rust_01.mat` becomes `("Props/Metal", "Rust_01")`.
pub fn split_asset_path(
    path: &str,
    extensions: &'static [&'static str],
) -> Result<(String, String), DictionaryError> {
    let sanitized = sanitize_path(path);
    let stem = extensions
        .iter()
        .find_map(|ext| strip_suffix_ignore_case(&sanitized, ext))
        .ok_or_else(|| DictionaryError::UnexpectedExtension {
            path: path.to_owned(),
            expected: extensions,
        })?;
    Ok(match stem.rfind('/') {
        Some(at) => (stem[..at].to_owned(), stem[at + 1..].to_owned()),
        None => (String::new(), stem.to_owned()),
    })
}
