// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Document model: sparse node records and the tree that links them.
//!
//! Every optional field means "unchanged from the template default" when
//! absent. Absent fields are omitted from the JSON encoding entirely; there is
//! no sentinel value that could collide with a legitimate zero or empty value.

use std::collections::{HashMap, HashSet};
use std::fmt;

use clip_port::{TemplateKind, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dictionary::ItemId;

/// Opaque identifier of a record, unique within one document.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Wire form of a three-component vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedVector {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl From<Vec3> for SerializedVector {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<SerializedVector> for Vec3 {
    fn from(v: SerializedVector) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Activity override of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Node is active.
    Active,
    /// Node is inactive.
    Inactive,
    /// Template default part removed from the instance.
    Deleted,
}

impl NodeStatus {
    /// Status matching a live active flag.
    pub fn from_active(active: bool) -> Self {
        if active {
            NodeStatus::Active
        } else {
            NodeStatus::Inactive
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(remote = "TemplateKind")]
enum TemplateKindDef {
    Regular,
    Model,
    Variant,
}

/// Marks a record as the root of a template instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateReference {
    /// Dictionary item describing where the template lives.
    #[serde(rename = "id")]
    pub item: ItemId,
    /// Display name of the template asset.
    pub name: String,
    /// Flavor of the template.
    #[serde(with = "TemplateKindDef")]
    pub kind: TemplateKind,
}

/// Material assigned to one rendering slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialOverride {
    /// Rendering slot index.
    pub slot: usize,
    /// Dictionary item of kind material.
    #[serde(rename = "id")]
    pub item: ItemId,
    /// Display name of the material asset.
    pub name: String,
}

/// One captured node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneNodeRecord {
    /// Identifier, unique within the document.
    pub id: RecordId,
    /// Activity override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    /// Display-name override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Address relative to the reconstruction parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Index of an existing default child to reuse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sibling_index: Option<usize>,
    /// Local position override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<SerializedVector>,
    /// Local rotation override (Euler degrees).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<SerializedVector>,
    /// Local scale override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<SerializedVector>,
    /// Ordered child record ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RecordId>>,
    /// Present only on template-instance roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_reference: Option<TemplateReference>,
    /// Per-slot material overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_overrides: Option<Vec<MaterialOverride>>,
}

impl SceneNodeRecord {
    /// A record with every override absent.
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            status: None,
            name: None,
            path: None,
            sibling_index: None,
            position: None,
            rotation: None,
            scale: None,
            children: None,
            template_reference: None,
            material_overrides: None,
        }
    }

    /// Child ids in order; empty when none were recorded.
    pub fn children(&self) -> &[RecordId] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Appends a child id.
    pub fn add_child(&mut self, child: RecordId) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }

    /// Removes a child id if present.
    pub fn remove_child(&mut self, child: &RecordId) {
        if let Some(children) = self.children.as_mut() {
            children.retain(|c| c != child);
        }
    }

    /// Sets the material for `slot`, replacing an earlier override of that slot.
    pub fn update_material(&mut self, slot: usize, item: ItemId, name: String) {
        let overrides = self.material_overrides.get_or_insert_with(Vec::new);
        match overrides.iter_mut().find(|m| m.slot == slot) {
            Some(existing) => {
                existing.item = item;
                existing.name = name;
            }
            None => overrides.push(MaterialOverride { slot, item, name }),
        }
    }

    /// `true` when the record carries no override besides its identity.
    pub fn is_bare(&self) -> bool {
        self.status.is_none()
            && self.name.is_none()
            && self.position.is_none()
            && self.rotation.is_none()
            && self.scale.is_none()
            && self.template_reference.is_none()
            && self.material_overrides.is_none()
    }
}

/// Violation of the tree invariants of a [`SceneTreeDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Two records share an id.
    #[error("duplicate record id {0}")]
    DuplicateId(RecordId),
    /// The declared root has no record.
    #[error("root record {0} is missing")]
    MissingRoot(RecordId),
    /// The root record carries a path.
    #[error("root record {0} must not carry a path")]
    RootHasPath(RecordId),
    /// A child id has no record.
    #[error("record {parent} lists missing child {child}")]
    DanglingChild {
        /// Record listing the child.
        parent: RecordId,
        /// Missing child id.
        child: RecordId,
    },
    /// A record is reachable along two routes (shared child or cycle).
    #[error("record {0} is reachable from more than one parent")]
    SharedChild(RecordId),
    /// A record is not reachable from the root.
    #[error("record {0} is not reachable from the root")]
    Unreachable(RecordId),
}

/// A captured subtree: a root id plus every record reachable from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneTreeDocument {
    /// Id of the top record.
    pub root: RecordId,
    /// All records, in capture order.
    pub nodes: Vec<SceneNodeRecord>,
}

impl SceneTreeDocument {
    /// Looks up a record by id (linear).
    pub fn get(&self, id: &RecordId) -> Option<&SceneNodeRecord> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Mutable lookup by id (linear).
    pub fn get_mut(&mut self, id: &RecordId) -> Option<&mut SceneNodeRecord> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    /// The root record, if present.
    pub fn root_record(&self) -> Option<&SceneNodeRecord> {
        self.get(&self.root)
    }

    /// Record whose `children` lists `id`.
    pub fn parent_of(&self, id: &RecordId) -> Option<&SceneNodeRecord> {
        self.nodes.iter().find(|n| n.children().contains(id))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` when the document has no records.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of records that are template-instance roots.
    pub fn template_reference_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.template_reference.is_some())
            .count()
    }

    /// Index from id to record.
    pub fn index(&self) -> HashMap<&RecordId, &SceneNodeRecord> {
        self.nodes.iter().map(|n| (&n.id, n)).collect()
    }

    /// Removes a record, its recorded descendants, and every reference to it.
    pub fn remove_subtree(&mut self, id: &RecordId) {
        let mut doomed = vec![id.clone()];
        let mut i = 0;
        while i < doomed.len() {
            if let Some(record) = self.get(&doomed[i]) {
                doomed.extend(record.children().iter().cloned());
            }
            i += 1;
        }
        let doomed: HashSet<RecordId> = doomed.into_iter().collect();
        self.nodes.retain(|n| !doomed.contains(&n.id));
        for node in &mut self.nodes {
            node.remove_child(id);
        }
    }

    /// Checks the tree invariants: unique ids, an existing root without a
    /// path, no dangling or shared children, and no unreachable records.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if index.insert(&node.id, node).is_some() {
                return Err(DocumentError::DuplicateId(node.id.clone()));
            }
        }
        let root = index
            .get(&self.root)
            .ok_or_else(|| DocumentError::MissingRoot(self.root.clone()))?;
        if root.path.is_some() {
            return Err(DocumentError::RootHasPath(self.root.clone()));
        }

        let mut seen: HashSet<&RecordId> = HashSet::with_capacity(self.nodes.len());
        seen.insert(&self.root);
        let mut stack = vec![*root];
        while let Some(record) = stack.pop() {
            for child in record.children() {
                let child_record =
                    index
                        .get(child)
                        .ok_or_else(|| DocumentError::DanglingChild {
                            parent: record.id.clone(),
                            child: child.clone(),
                        })?;
                if !seen.insert(child) {
                    return Err(DocumentError::SharedChild(child.clone()));
                }
                stack.push(*child_record);
            }
        }

        if let Some(orphan) = self.nodes.iter().find(|n| !seen.contains(&n.id)) {
            return Err(DocumentError::Unreachable(orphan.id.clone()));
        }
        Ok(())
    }
}
