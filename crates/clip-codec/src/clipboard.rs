// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Clipboard service: save, list, edit and delete entries.

use chrono::{DateTime, Utc};
use clip_core::{Capture, SceneTreeDocument};
use clip_port::IdSource;
use tracing::{debug, info, instrument, warn};

use crate::config::ClipSettings;
use crate::envelope::{decode_tree, encode_tree};
use crate::error::StoreError;
use crate::metadata::{EntryFilter, EntryId, EntryMetadata};
use crate::store::{Artifact, EntryStore};

/// An entry id together with its decoded metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredEntry {
    /// Storage key.
    pub id: EntryId,
    /// Decoded `<id>.meta`.
    pub metadata: EntryMetadata,
}

/// Entry-level operations over an [`EntryStore`].
#[derive(Debug, Clone)]
pub struct Clipboard<S> {
    store: S,
    save_compressed: bool,
}

impl<S> Clipboard<S> {
    /// Service that gzips new entries.
    pub fn new(store: S) -> Self {
        Self {
            store,
            save_compressed: true,
        }
    }

    /// Service honoring the compression preference from settings.
    pub fn from_settings(store: S, settings: &ClipSettings) -> Self {
        Self {
            store,
            save_compressed: settings.save_compressed,
        }
    }

    /// Sets whether newly saved entries are gzipped.
    pub fn with_compression(mut self, compressed: bool) -> Self {
        self.save_compressed = compressed;
        self
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> Clipboard<S>
where
    S: EntryStore,
{
    /// Persists a capture under a fresh id, stamped with the current time.
    pub fn save<I>(&self, capture: &Capture, ids: &mut I) -> Result<StoredEntry, StoreError>
    where
        I: IdSource + ?Sized,
    {
        self.save_at(capture, Utc::now(), ids)
    }

    /// Persists a capture with an explicit creation time.
    #[instrument(skip_all, fields(records = capture.document.len()))]
    pub fn save_at<I>(
        &self,
        capture: &Capture,
        created: DateTime<Utc>,
        ids: &mut I,
    ) -> Result<StoredEntry, StoreError>
    where
        I: IdSource + ?Sized,
    {
        let id = EntryId(ids.fresh_id());
        let data = encode_tree(&capture.document, self.save_compressed)?;
        self.store.write(&id, Artifact::Data, &data)?;

        let metadata = EntryMetadata {
            name: capture
                .document
                .root_record()
                .and_then(|root| root.name.clone())
                .unwrap_or_default(),
            tags: None,
            created,
            dictionary: capture.dictionary.clone(),
            number_of_templates: capture.template_count(),
            compressed: self.save_compressed,
            favorite: false,
        };
        self.write_metadata(&id, &metadata)?;
        info!(%id, name = %metadata.name, compressed = metadata.compressed, bytes = data.len(), "saved entry");
        Ok(StoredEntry { id, metadata })
    }

    /// Stores the preview image of an entry.
    pub fn save_thumbnail(&self, id: &EntryId, png: &[u8]) -> Result<(), StoreError> {
        self.store.write(id, Artifact::Thumbnail, png)
    }

    /// Preview image bytes.
    pub fn thumbnail(&self, id: &EntryId) -> Result<Vec<u8>, StoreError> {
        self.store.read(id, Artifact::Thumbnail)
    }

    /// Reads and decodes `<id>.meta`.
    pub fn metadata(&self, id: &EntryId) -> Result<EntryMetadata, StoreError> {
        let bytes = self.store.read(id, Artifact::Metadata)?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Metadata {
            id: id.clone(),
            source,
        })
    }

    /// Metadata paired with its id.
    pub fn entry(&self, id: &EntryId) -> Result<StoredEntry, StoreError> {
        Ok(StoredEntry {
            id: id.clone(),
            metadata: self.metadata(id)?,
        })
    }

    /// Decodes the tree of an entry, using its compression flag.
    pub fn load_tree(&self, entry: &StoredEntry) -> Result<SceneTreeDocument, StoreError> {
        let bytes = self.store.read(&entry.id, Artifact::Data)?;
        Ok(decode_tree(&bytes, entry.metadata.compressed)?)
    }

    /// Entries passing `filter`, newest first. Entries whose metadata cannot
    /// be decoded are skipped.
    pub fn list(&self, filter: &EntryFilter) -> Result<Vec<StoredEntry>, StoreError> {
        let mut entries = Vec::new();
        for id in self.store.ids()? {
            match self.entry(&id) {
                Ok(entry) => entries.push(entry),
                Err(err) => warn!(%id, error = %err, "skipping unreadable entry"),
            }
        }
        entries.sort_by(|a, b| b.metadata.created.cmp(&a.metadata.created));
        entries.retain(|entry| filter.matches(&entry.metadata));
        debug!(count = entries.len(), ?filter, "listed entries");
        Ok(entries)
    }

    /// Applies `edit` to the stored metadata and writes it back.
    pub fn update<F>(&self, id: &EntryId, edit: F) -> Result<EntryMetadata, StoreError>
    where
        F: FnOnce(&mut EntryMetadata),
    {
        let mut metadata = self.metadata(id)?;
        edit(&mut metadata);
        self.write_metadata(id, &metadata)?;
        Ok(metadata)
    }

    /// Changes the display name.
    pub fn rename(&self, id: &EntryId, name: &str) -> Result<EntryMetadata, StoreError> {
        self.update(id, |m| m.name = name.to_owned())
    }

    /// Replaces the tags; blank text clears them.
    pub fn set_tags(&self, id: &EntryId, tags: &str) -> Result<EntryMetadata, StoreError> {
        let tags = tags.trim();
        self.update(id, |m| {
            m.tags = (!tags.is_empty()).then(|| tags.to_owned());
        })
    }

    /// Pins or unpins the entry.
    pub fn set_favorite(&self, id: &EntryId, favorite: bool) -> Result<EntryMetadata, StoreError> {
        self.update(id, |m| m.favorite = favorite)
    }

    /// Removes metadata, data and thumbnail.
    pub fn delete(&self, id: &EntryId) -> Result<(), StoreError> {
        self.store.remove(id)?;
        info!(%id, "deleted entry");
        Ok(())
    }

    fn write_metadata(&self, id: &EntryId, metadata: &EntryMetadata) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(metadata).map_err(|source| StoreError::Metadata {
            id: id.clone(),
            source,
        })?;
        self.store.write(id, Artifact::Metadata, &bytes)
    }
}
