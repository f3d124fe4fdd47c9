// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Staged import of a stored entry.
//!
//! [`ImportJob::step`] advances one stage per call so an interactive host can
//! yield between them:
//!
//! ```text
//! CheckReadiness ──► Decode ──► Reconstruct ──► Done
//!        │              │             │
//!        └──────────────┴─────────────┴──► Failed
//! ```
//!
//! The scene is only touched in `Reconstruct`. Dropping a job before then
//! leaves no trace; a failing `Reconstruct` removes its own partial output.

use clip_core::{deserialize, ensure_ready, ImportError, SceneTreeDocument};
use clip_port::{AssetCatalog, ErrorSink, NodeId, SceneGraph};
use thiserror::Error;
use tracing::{debug, info};

use crate::clipboard::StoredEntry;
use crate::envelope::decode_tree;
use crate::error::{CodecError, StoreError};
use crate::store::{Artifact, EntryStore};

/// Failure of an import job.
#[derive(Debug, Error)]
pub enum JobError {
    /// Missing references or a failed reconstruction.
    #[error(transparent)]
    Import(#[from] ImportError),
    /// The tree could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The tree could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Stepped again after an error.
    #[error("import job already failed")]
    Failed,
}

/// Where a job stands.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Verify every dictionary item resolves in the target project.
    CheckReadiness,
    /// Read and decode the tree.
    Decode,
    /// Replay the decoded tree into the scene.
    Reconstruct(SceneTreeDocument),
    /// Finished; holds the new root.
    Done(NodeId),
    /// A stage returned an error.
    Failed,
}

/// Outcome of one [`ImportJob::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// More stages remain.
    Pending,
    /// The entry now lives under this node.
    Done(NodeId),
}

/// Resumable import of one entry under an optional parent.
#[derive(Debug, Clone)]
pub struct ImportJob {
    entry: StoredEntry,
    parent: Option<NodeId>,
    stage: Stage,
}

impl ImportJob {
    /// A job that has not run any stage yet.
    pub fn new(entry: StoredEntry, parent: Option<NodeId>) -> Self {
        Self {
            entry,
            parent,
            stage: Stage::CheckReadiness,
        }
    }

    /// Entry being imported.
    pub fn entry(&self) -> &StoredEntry {
        &self.entry
    }

    /// Current stage.
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Runs the current stage.
    ///
    /// Errors other than reconstruction failures (which the deserializer
    /// reports itself) are passed to `errors` before being returned. After an
    /// error the job is [`Stage::Failed`] and further steps return
    /// [`JobError::Failed`].
    pub fn step<St, S, C, E>(
        &mut self,
        store: &St,
        scene: &mut S,
        catalog: &C,
        errors: &mut E,
    ) -> Result<Step, JobError>
    where
        St: EntryStore + ?Sized,
        S: SceneGraph + ?Sized,
        C: AssetCatalog + ?Sized,
        E: ErrorSink + ?Sized,
    {
        let dictionary = &self.entry.metadata.dictionary;
        let next = match std::mem::replace(&mut self.stage, Stage::Failed) {
            Stage::CheckReadiness => ensure_ready(catalog, dictionary)
                .map(|()| Stage::Decode)
                .map_err(JobError::from),
            Stage::Decode => store
                .read(&self.entry.id, Artifact::Data)
                .map_err(JobError::from)
                .and_then(|bytes| {
                    Ok(Stage::Reconstruct(decode_tree(
                        &bytes,
                        self.entry.metadata.compressed,
                    )?))
                }),
            Stage::Reconstruct(document) => {
                return match deserialize(scene, catalog, &document, dictionary, self.parent, errors)
                {
                    Ok(root) => {
                        info!(id = %self.entry.id, ?root, "entry imported");
                        self.stage = Stage::Done(root);
                        Ok(Step::Done(root))
                    }
                    Err(err) => Err(ImportError::from(err).into()),
                };
            }
            Stage::Done(root) => Ok(Stage::Done(root)),
            Stage::Failed => return Err(JobError::Failed),
        };
        match next {
            Ok(stage) => {
                debug!(id = %self.entry.id, ?stage, "stage complete");
                let step = match stage {
                    Stage::Done(root) => Step::Done(root),
                    _ => Step::Pending,
                };
                self.stage = stage;
                Ok(step)
            }
            Err(err) => {
                errors.report_error(&err.to_string());
                Err(err)
            }
        }
    }

    /// Steps until done or failed.
    pub fn run<St, S, C, E>(
        &mut self,
        store: &St,
        scene: &mut S,
        catalog: &C,
        errors: &mut E,
    ) -> Result<NodeId, JobError>
    where
        St: EntryStore + ?Sized,
        S: SceneGraph + ?Sized,
        C: AssetCatalog + ?Sized,
        E: ErrorSink + ?Sized,
    {
        loop {
            if let Step::Done(root) = self.step(store, scene, catalog, errors)? {
                return Ok(root);
            }
        }
    }
}
