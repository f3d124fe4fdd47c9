// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Readiness checks that gate an import.
//!
//! An import only starts once every dictionary item can be located in the
//! target project, so a missing asset never leaves a half-built subtree
//! behind.

use std::collections::BTreeSet;

use clip_port::{AssetCatalog, ErrorSink, NodeId, SceneGraph};
use tracing::{debug, instrument};

use crate::deserializer::deserialize;
use crate::dictionary::{DictionaryItem, ItemId, TemplateDictionary};
use crate::error::ImportError;
use crate::lookup::is_available;
use crate::model::SceneTreeDocument;

/// Ids of the items the catalog can provide.
pub fn find_available<C>(catalog: &C, dictionary: &TemplateDictionary) -> BTreeSet<ItemId>
where
    C: AssetCatalog + ?Sized,
{
    dictionary
        .items()
        .iter()
        .filter(|item| is_available(catalog, item))
        .map(|item| item.id.clone())
        .collect()
}

/// Items the catalog cannot provide, in dictionary order.
pub fn find_missing<C>(catalog: &C, dictionary: &TemplateDictionary) -> Vec<DictionaryItem>
where
    C: AssetCatalog + ?Sized,
{
    let available = find_available(catalog, dictionary);
    dictionary
        .items()
        .iter()
        .filter(|item| !available.contains(&item.id))
        .cloned()
        .collect()
}

/// Fails with the exact missing items unless everything is available.
#[instrument(skip_all, fields(items = dictionary.len()))]
pub fn ensure_ready<C>(catalog: &C, dictionary: &TemplateDictionary) -> Result<(), ImportError>
where
    C: AssetCatalog + ?Sized,
{
    let missing = find_missing(catalog, dictionary);
    if missing.is_empty() {
        debug!("all references available");
        Ok(())
    } else {
        for item in &missing {
            debug!(id = %item.id, path = %item.search_path, name = %item.verification_name, kind = ?item.kind, "missing reference");
        }
        Err(ImportError::MissingReferences(missing))
    }
}

/// Readiness-gated reconstruction: checks the dictionary first and only
/// touches the scene when nothing is missing.
pub fn reconstruct<S, C, E>(
    scene: &mut S,
    catalog: &C,
    document: &SceneTreeDocument,
    dictionary: &TemplateDictionary,
    parent: Option<NodeId>,
    errors: &mut E,
) -> Result<NodeId, ImportError>
where
    S: SceneGraph + ?Sized,
    C: AssetCatalog + ?Sized,
    E: ErrorSink + ?Sized,
{
    ensure_ready(catalog, dictionary)?;
    Ok(deserialize(
        scene, catalog, document, dictionary, parent, errors,
    )?)
}
