// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Locating dictionary items among the target project's assets.
//!
//! Name queries against an [`AssetCatalog`] are fuzzy: searching for
//! `Wall_01_A` also returns `Wall_01_Alt_01`. Candidates are therefore
//! filtered on the full file name, including the leading separator, so that
//! `phone` never matches `gramophone`.

use clip_port::{AssetCatalog, AssetKind, TemplateKind};
use tracing::debug;

use crate::dictionary::DictionaryItem;

/// File name of `path` without directory and extension.
pub fn file_stem(path: &str) -> &str {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.rsplit_once('.').map_or(file, |(stem, _)| stem)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

fn ends_with_ignore_case(haystack: &str, suffix: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .ends_with(&suffix.to_ascii_lowercase())
}

/// Finds the template asset for `item` named `name` of flavor `kind`.
///
/// The candidate must live under the item's search path, be called
/// `<name>.<ext>` (`fbx` for models, `prefab` otherwise) and be reported by
/// the catalog as the same flavor.
pub fn find_template<C>(
    catalog: &C,
    item: &DictionaryItem,
    name: &str,
    kind: TemplateKind,
) -> Option<String>
where
    C: AssetCatalog + ?Sized,
{
    let suffix = format!("/{name}.{}", kind.file_extension());
    let candidates = catalog.find_assets(name, AssetKind::Template);
    debug!(name, search_path = %item.search_path, count = candidates.len(), "template candidates");
    candidates.into_iter().find(|path| {
        contains_ignore_case(path, &item.search_path)
            && ends_with_ignore_case(path, &suffix)
            && catalog.template_kind(path) == Some(kind)
    })
}

/// Finds the material asset for `item` named `name`.
pub fn find_material<C>(catalog: &C, item: &DictionaryItem, name: &str) -> Option<String>
where
    C: AssetCatalog + ?Sized,
{
    let suffix = format!("/{name}.mat");
    catalog
        .find_assets(name, AssetKind::Material)
        .into_iter()
        .find(|path| {
            contains_ignore_case(path, &item.search_path) && ends_with_ignore_case(path, &suffix)
        })
}

/// `true` when the catalog holds an asset of the item's kind whose file stem
/// is the verification name and whose path contains the search path.
pub fn is_available<C>(catalog: &C, item: &DictionaryItem) -> bool
where
    C: AssetCatalog + ?Sized,
{
    catalog
        .find_assets(&item.verification_name, item.kind)
        .iter()
        .any(|path| {
            file_stem(path).eq_ignore_ascii_case(&item.verification_name)
                && contains_ignore_case(path, &item.search_path)
        })
}
