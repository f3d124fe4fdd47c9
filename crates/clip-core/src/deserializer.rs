// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reconstruction of a subtree from a [`SceneTreeDocument`].
//!
//! Per record: locate a reuse target, otherwise instantiate or create; apply
//! the present overrides; parent freshly created nodes; recurse into the
//! children in list order.
//!
//! Targets for all children of a node are located before any of them is
//! modified, so an override that renames or removes a template part cannot
//! break the path of a sibling record captured against the pristine
//! template.
//!
//! Every node created by one call is owned by that call until it returns:
//! on failure they are all destroyed before the error is reported.

use std::collections::{HashMap, HashSet};

use clip_port::{AssetCatalog, AssetKind, ErrorSink, NodeId, SceneGraph};
use tracing::{debug, instrument, warn};

use crate::address::resolve_path;
use crate::dictionary::{DictionaryItem, ItemId, TemplateDictionary};
use crate::error::ReconstructError;
use crate::lookup::{find_material, find_template};
use crate::model::{NodeStatus, RecordId, SceneNodeRecord, SceneTreeDocument};

/// Name given to plain nodes whose record carries no name.
const DEFAULT_NODE_NAME: &str = "Node";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Modify an existing node in place.
    Reuse(NodeId),
    /// Create a node and attach it under `parent`.
    Insert { parent: Option<NodeId> },
}

struct Deserializer<'a, S: ?Sized, C: ?Sized> {
    scene: &'a mut S,
    catalog: &'a C,
    dictionary: &'a TemplateDictionary,
    records: HashMap<&'a RecordId, &'a SceneNodeRecord>,
    bound: HashMap<RecordId, NodeId>,
    created: Vec<NodeId>,
}

impl<'a, S, C> Deserializer<'a, S, C>
where
    S: SceneGraph + ?Sized,
    C: AssetCatalog + ?Sized,
{
    fn run(
        &mut self,
        document: &'a SceneTreeDocument,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ReconstructError> {
        document.validate()?;
        self.records = document.index();
        let root = self
            .records
            .get(&document.root)
            .copied()
            .ok_or_else(|| ReconstructError::Malformed(format!("missing root {}", document.root)))?;
        self.build(root, Placement::Insert { parent })?
            .ok_or_else(|| ReconstructError::Malformed(format!("root record {} is deleted", root.id)))
    }

    fn item(
        &self,
        record: &SceneNodeRecord,
        id: &ItemId,
    ) -> Result<&'a DictionaryItem, ReconstructError> {
        let dictionary: &'a TemplateDictionary = self.dictionary;
        dictionary
            .get_by_id(id)
            .ok_or_else(|| ReconstructError::UnknownItem {
                record: record.id.clone(),
                item: id.clone(),
            })
    }

    fn locate(
        &self,
        record: &SceneNodeRecord,
        parent: NodeId,
    ) -> Result<Placement, ReconstructError> {
        if let Some(path) = &record.path {
            let target = resolve_path(&*self.scene, parent, path).map_err(|source| {
                ReconstructError::Structure {
                    record: record.id.clone(),
                    source,
                }
            })?;
            return Ok(if record.template_reference.is_some() {
                Placement::Insert {
                    parent: Some(target),
                }
            } else {
                Placement::Reuse(target)
            });
        }
        if let Some(index) = record.sibling_index {
            if let Some(child) = self.scene.child(parent, index) {
                return Ok(Placement::Reuse(child));
            }
        }
        Ok(Placement::Insert {
            parent: Some(parent),
        })
    }

    fn create(&mut self, record: &SceneNodeRecord) -> Result<NodeId, ReconstructError> {
        let node = match &record.template_reference {
            Some(reference) => {
                let item = self.item(record, &reference.item)?;
                match item.kind {
                    AssetKind::Template => {}
                    AssetKind::Material => {
                        return Err(ReconstructError::Malformed(format!(
                            "record {} references material item {} as a template",
                            record.id, item.id
                        )))
                    }
                }
                let path = find_template(self.catalog, item, &reference.name, reference.kind)
                    .ok_or_else(|| ReconstructError::TemplateNotFound {
                        name: reference.name.clone(),
                        search_path: item.search_path.clone(),
                    })?;
                debug!(record = %record.id, template = %path, "instantiating");
                self.scene.instantiate(&path)?
            }
            None => self
                .scene
                .create_node(record.name.as_deref().unwrap_or(DEFAULT_NODE_NAME)),
        };
        self.created.push(node);
        Ok(node)
    }

    fn apply(&mut self, record: &SceneNodeRecord, node: NodeId) -> Result<(), ReconstructError> {
        match record.status {
            Some(NodeStatus::Active) => self.scene.set_active(node, true)?,
            Some(NodeStatus::Inactive) => self.scene.set_active(node, false)?,
            Some(NodeStatus::Deleted) | None => {}
        }
        if let Some(name) = &record.name {
            self.scene.set_name(node, name)?;
        }
        if let Some(position) = record.position {
            self.scene.set_local_position(node, position.into())?;
        }
        if let Some(rotation) = record.rotation {
            self.scene.set_local_rotation(node, rotation.into())?;
        }
        if let Some(scale) = record.scale {
            self.scene.set_local_scale(node, scale.into())?;
        }

        let Some(overrides) = record.material_overrides.as_deref() else {
            return Ok(());
        };
        if overrides.is_empty() {
            return Ok(());
        }
        if self.scene.materials(node).is_none() {
            warn!(record = %record.id, ?node, "material overrides on a node without rendering surface, skipped");
            return Ok(());
        }
        for material in overrides {
            let item = self.item(record, &material.item)?;
            let path = match item.kind {
                AssetKind::Material => find_material(self.catalog, item, &material.name),
                AssetKind::Template => None,
            }
            .ok_or_else(|| ReconstructError::MaterialNotFound {
                name: material.name.clone(),
                search_path: item.search_path.clone(),
            })?;
            self.scene.set_material(node, material.slot, &path)?;
        }
        Ok(())
    }

    fn build(
        &mut self,
        record: &'a SceneNodeRecord,
        placement: Placement,
    ) -> Result<Option<NodeId>, ReconstructError> {
        if self.bound.contains_key(&record.id) {
            return Err(ReconstructError::Malformed(format!(
                "record {} reached twice",
                record.id
            )));
        }

        if record.status == Some(NodeStatus::Deleted) {
            if let Placement::Reuse(node) = placement {
                debug!(record = %record.id, ?node, "removing template part");
                self.scene.destroy(node)?;
                self.bound.insert(record.id.clone(), node);
            }
            return Ok(None);
        }

        let node = match placement {
            Placement::Reuse(node) => node,
            Placement::Insert { parent } => {
                let node = self.create(record)?;
                if self.scene.parent(node).is_none() && parent.is_some() {
                    self.scene.set_parent(node, parent)?;
                }
                node
            }
        };
        debug!(record = %record.id, ?node, ?placement, "record bound");
        self.bound.insert(record.id.clone(), node);
        self.apply(record, node)?;

        let mut children = Vec::with_capacity(record.children().len());
        for id in record.children() {
            let child = self.records.get(id).copied().ok_or_else(|| {
                ReconstructError::Malformed(format!("record {} lists missing child {id}", record.id))
            })?;
            children.push(child);
        }
        let placements = children
            .iter()
            .map(|child| self.locate(child, node))
            .collect::<Result<Vec<_>, _>>()?;
        for (child, placement) in children.into_iter().zip(placements) {
            self.build(child, placement)?;
        }
        Ok(Some(node))
    }

    /// Destroys every node this call created. Nodes nested under another
    /// created node go away with it.
    fn discard(&mut self) {
        let created: HashSet<NodeId> = self.created.drain(..).collect();
        let tops: Vec<NodeId> = created
            .iter()
            .copied()
            .filter(|node| {
                !self
                    .scene
                    .parent(*node)
                    .is_some_and(|parent| created.contains(&parent))
            })
            .collect();
        debug!(created = created.len(), discarded = tops.len(), "discarding partial output");
        for node in tops {
            if let Err(err) = self.scene.destroy(node) {
                warn!(?node, %err, "failed to discard partially built node");
            }
        }
    }
}

/// Rebuilds `document` under `parent` and returns the new root node.
///
/// The root record is always materialized as a new node. Any failure aborts
/// the whole call: nodes created so far are destroyed, the error is passed to
/// `errors` and returned.
#[instrument(skip_all, fields(records = document.len()))]
pub fn deserialize<S, C, E>(
    scene: &mut S,
    catalog: &C,
    document: &SceneTreeDocument,
    dictionary: &TemplateDictionary,
    parent: Option<NodeId>,
    errors: &mut E,
) -> Result<NodeId, ReconstructError>
where
    S: SceneGraph + ?Sized,
    C: AssetCatalog + ?Sized,
    E: ErrorSink + ?Sized,
{
    let mut run = Deserializer {
        scene,
        catalog,
        dictionary,
        records: HashMap::new(),
        bound: HashMap::new(),
        created: Vec::new(),
    };
    match run.run(document, parent) {
        Ok(root) => {
            debug!(?root, nodes = run.created.len(), "reconstruction complete");
            Ok(root)
        }
        Err(err) => {
            run.discard();
            errors.report_error(&err.to_string());
            Err(err)
        }
    }
}
