// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Storage port for entry artifacts and its filesystem adapter.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StoreError;
use crate::metadata::EntryId;

/// One of the files making up an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Artifact {
    /// JSON metadata.
    Metadata,
    /// Enveloped tree, possibly gzipped.
    Data,
    /// Preview image.
    Thumbnail,
}

impl Artifact {
    /// All artifacts, metadata first.
    pub const ALL: [Self; 3] = [Self::Metadata, Self::Data, Self::Thumbnail];

    /// File extension without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Metadata => "meta",
            Self::Data => "data",
            Self::Thumbnail => "png",
        }
    }
}

/// Raw byte storage keyed by entry id and artifact.
pub trait EntryStore {
    /// Reads an artifact. Returns `NotFound` when it was never written.
    fn read(&self, id: &EntryId, artifact: Artifact) -> Result<Vec<u8>, StoreError>;
    /// Writes an artifact, replacing any previous content.
    fn write(&self, id: &EntryId, artifact: Artifact, data: &[u8]) -> Result<(), StoreError>;
    /// Removes every artifact of the entry; missing ones are ignored.
    fn remove(&self, id: &EntryId) -> Result<(), StoreError>;
    /// Ids of all entries that have metadata, in no particular order.
    fn ids(&self) -> Result<Vec<EntryId>, StoreError>;
}

/// Artifacts as `<id>.<ext>` files in one content directory.
#[derive(Debug, Clone)]
pub struct FsEntryStore {
    base: PathBuf,
}

impl FsEntryStore {
    /// Opens a store rooted at `base`, creating the directory if needed.
    pub fn new(base: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Content directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Location of one artifact. Ids that are empty or could leave the
    /// content directory are rejected.
    pub fn path_for(&self, id: &EntryId, artifact: Artifact) -> Result<PathBuf, StoreError> {
        let key = id.0.as_str();
        if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
            return Err(StoreError::InvalidId(id.clone()));
        }
        Ok(self.base.join(format!("{key}.{}", artifact.extension())))
    }
}

impl EntryStore for FsEntryStore {
    fn read(&self, id: &EntryId, artifact: Artifact) -> Result<Vec<u8>, StoreError> {
        match fs::read(self.path_for(id, artifact)?) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                id: id.clone(),
                artifact,
            }),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    fn write(&self, id: &EntryId, artifact: Artifact, data: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(id, artifact)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }

    fn remove(&self, id: &EntryId) -> Result<(), StoreError> {
        for artifact in Artifact::ALL {
            match fs::remove_file(self.path_for(id, artifact)?) {
                Ok(()) => debug!(%id, ?artifact, "removed"),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(StoreError::Io(err)),
            }
        }
        Ok(())
    }

    fn ids(&self) -> Result<Vec<EntryId>, StoreError> {
        let mut ids = Vec::new();
        for dir_entry in fs::read_dir(&self.base)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(Artifact::Metadata.extension()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(EntryId::from(stem));
            }
        }
        Ok(ids)
    }
}
