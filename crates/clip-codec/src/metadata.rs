// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Entry metadata (`<id>.meta`) and list filtering.

use std::fmt;

use chrono::{DateTime, Utc};
use clip_core::TemplateDictionary;
use serde::{Deserialize, Serialize};

/// Storage key of an entry; the file stem shared by its artifacts.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub String);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Everything known about an entry without decoding its tree.
///
/// The dictionary travels here rather than in the data file so readiness
/// can be checked before the tree is read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    /// Display name; defaults to the captured root's name.
    pub name: String,
    /// Free-text tags, searched alongside the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// Capture time.
    pub created: DateTime<Utc>,
    /// Templates and materials the tree refers to.
    #[serde(default)]
    pub dictionary: TemplateDictionary,
    /// Records carrying a template reference.
    #[serde(default)]
    pub number_of_templates: usize,
    /// Whether `<id>.data` is gzip-framed.
    #[serde(default)]
    pub compressed: bool,
    /// Pinned by the user.
    #[serde(default)]
    pub favorite: bool,
}

/// Which entries a listing shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EntryFilter {
    /// Every entry.
    #[default]
    All,
    /// Only favorites.
    Favorites,
    /// Entries whose name or tags contain the text, ignoring case.
    Search(String),
}

impl EntryFilter {
    /// `true` when `metadata` passes the filter.
    pub fn matches(&self, metadata: &EntryMetadata) -> bool {
        match self {
            Self::All => true,
            Self::Favorites => metadata.favorite,
            Self::Search(text) => {
                let needle = text.to_lowercase();
                metadata.name.to_lowercase().contains(&needle)
                    || metadata
                        .tags
                        .as_deref()
                        .is_some_and(|tags| tags.to_lowercase().contains(&needle))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta(name: &str, tags: Option<&str>, favorite: bool) -> EntryMetadata {
        EntryMetadata {
            name: name.into(),
            tags: tags.map(str::to_owned),
            created: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            dictionary: TemplateDictionary::new(),
            number_of_templates: 0,
            compressed: true,
            favorite,
        }
    }

    #[test]
    fn test_wire_names_and_omitted_tags() {
        let json = serde_json::to_value(meta("Shelf", None, false)).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("tags"));
        assert_eq!(object["numberOfTemplates"], 0);
        assert_eq!(object["created"], "2024-05-01T12:00:00Z");
        let back: EntryMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta("Shelf", None, false));
    }

    #[test]
    fn test_filters() {
        let shelf = meta("Kitchen Shelf", Some("wood, Storage"), true);
        let lamp = meta("Lamp", None, false);
        assert!(EntryFilter::All.matches(&lamp));
        assert!(EntryFilter::Favorites.matches(&shelf));
        assert!(!EntryFilter::Favorites.matches(&lamp));
        assert!(EntryFilter::Search("SHELF".into()).matches(&shelf));
        assert!(EntryFilter::Search("storage".into()).matches(&shelf));
        assert!(!EntryFilter::Search("storage".into()).matches(&lamp));
        assert!(EntryFilter::Search(String::new()).matches(&lamp));
    }
}
