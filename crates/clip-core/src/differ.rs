// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Paired-traversal differ.
//!
//! Walks a live template instance and the template's definition hierarchy in
//! lock-step by child index and records, per live node, exactly the fields
//! that deviate from the definition. Live children beyond the definition's
//! child count are ignored here; they cannot correspond to template
//! structure and are captured by the serializer's own walk. So are live
//! nodes that do not belong to the instance being diffed, whatever index
//! they sit at.

use std::collections::{HashMap, HashSet};

use clip_port::{AssetKind, IdSource, NodeId, Quat, SceneGraph, Vec3};
use tracing::{debug, warn};

use crate::address::build_path;
use crate::dictionary::TemplateDictionary;
use crate::error::CaptureError;
use crate::model::{NodeStatus, RecordId, SceneNodeRecord};

/// Field-level differences of a live node from its definition counterpart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDelta {
    /// Live active flag, when it differs.
    pub active: Option<bool>,
    /// Live name, when it differs.
    pub name: Option<String>,
    /// Live local position, when it differs.
    pub position: Option<Vec3>,
    /// Live local rotation in Euler degrees, when it differs.
    pub rotation: Option<Vec3>,
    /// Live local scale, when it differs.
    pub scale: Option<Vec3>,
    /// `(slot, live material asset path)` for every differing slot.
    pub materials: Vec<(usize, String)>,
}

impl NodeDelta {
    /// `true` when the live node matches its definition.
    pub fn is_empty(&self) -> bool {
        self.active.is_none()
            && self.name.is_none()
            && self.position.is_none()
            && self.rotation.is_none()
            && self.scale.is_none()
            && self.materials.is_empty()
    }
}

/// Compares one live node with its definition counterpart.
pub fn compare_nodes<S>(scene: &S, live: NodeId, definition: NodeId) -> NodeDelta
where
    S: SceneGraph + ?Sized,
{
    let mut delta = NodeDelta::default();

    let active = scene.is_active(live);
    if active != scene.is_active(definition) {
        delta.active = Some(active);
    }
    let name = scene.name(live);
    if name != scene.name(definition) {
        delta.name = Some(name);
    }

    let l = scene.local_transform(live);
    let d = scene.local_transform(definition);
    if !l.position.approx_eq(&d.position) {
        delta.position = Some(l.position);
    }
    if !Quat::euler_approx_eq(l.rotation, d.rotation) {
        delta.rotation = Some(l.rotation);
    }
    if !l.scale.approx_eq(&d.scale) {
        delta.scale = Some(l.scale);
    }

    delta.materials = material_changes(scene, live, definition);
    delta
}

/// Slots whose material differs between `live` and `definition`.
///
/// Only compared when both nodes have a rendering surface with the same
/// number of slots.
pub fn material_changes<S>(scene: &S, live: NodeId, definition: NodeId) -> Vec<(usize, String)>
where
    S: SceneGraph + ?Sized,
{
    match (scene.materials(live), scene.materials(definition)) {
        (Some(live_slots), Some(def_slots)) if live_slots.len() == def_slots.len() => live_slots
            .into_iter()
            .zip(def_slots)
            .enumerate()
            .filter(|(_, (l, d))| l != d)
            .map(|(slot, (l, _))| (slot, l))
            .collect(),
        (Some(live_slots), Some(def_slots)) => {
            warn!(
                ?live,
                live_slots = live_slots.len(),
                definition_slots = def_slots.len(),
                "material slot count differs from template; materials not captured"
            );
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Records of one capture pass, indexed by the live node they describe.
///
/// A node gets at most one record per pass, so repeated visits accumulate
/// overrides on the same record. A record is linked under at most one
/// parent.
#[derive(Debug, Default)]
pub(crate) struct RecordSet {
    records: Vec<SceneNodeRecord>,
    by_node: HashMap<NodeId, usize>,
    linked: HashSet<usize>,
}

impl RecordSet {
    /// Index of the record for `node`, creating it on first use. The flag is
    /// `true` when the record was just created.
    pub(crate) fn record_for<I>(&mut self, node: NodeId, ids: &mut I) -> (usize, bool)
    where
        I: IdSource + ?Sized,
    {
        if let Some(&index) = self.by_node.get(&node) {
            return (index, false);
        }
        let index = self.push(SceneNodeRecord::new(RecordId(ids.fresh_id())));
        self.by_node.insert(node, index);
        (index, true)
    }

    /// Appends a record that describes no live node.
    pub(crate) fn push(&mut self, record: SceneNodeRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub(crate) fn index_of(&self, node: NodeId) -> Option<usize> {
        self.by_node.get(&node).copied()
    }

    pub(crate) fn id_at(&self, index: usize) -> Option<RecordId> {
        self.records.get(index).map(|r| r.id.clone())
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> Option<&mut SceneNodeRecord> {
        self.records.get_mut(index)
    }

    /// Appends the record at `child` to the children of the record at
    /// `parent`. Returns `false` and leaves the set unchanged when `child` is
    /// already linked somewhere.
    pub(crate) fn link(&mut self, parent: usize, child: usize) -> bool {
        if parent == child || self.linked.contains(&child) {
            debug!(parent, child, "record already linked");
            return false;
        }
        let Some(child_id) = self.id_at(child) else {
            return false;
        };
        let Some(parent) = self.records.get_mut(parent) else {
            return false;
        };
        parent.add_child(child_id);
        self.linked.insert(child);
        true
    }

    pub(crate) fn into_records(self) -> Vec<SceneNodeRecord> {
        self.records
    }
}

fn apply_delta<I>(
    record: &mut SceneNodeRecord,
    delta: NodeDelta,
    dictionary: &mut TemplateDictionary,
    ids: &mut I,
) -> Result<(), CaptureError>
where
    I: IdSource + ?Sized,
{
    if let Some(active) = delta.active {
        record.status = Some(NodeStatus::from_active(active));
    }
    if let Some(name) = delta.name {
        record.name = Some(name);
    }
    if let Some(position) = delta.position {
        record.position = Some(position.into());
    }
    if let Some(rotation) = delta.rotation {
        record.rotation = Some(rotation.into());
    }
    if let Some(scale) = delta.scale {
        record.scale = Some(scale.into());
    }
    for (slot, path) in delta.materials {
        let (item, name) = dictionary.resolve_asset(&path, AssetKind::Material, ids)?;
        record.update_material(slot, item, name);
    }
    Ok(())
}

/// Diffs the instance rooted at `live_root` against `definition_root`.
///
/// The record of `live_root` must already exist; it receives the root's own
/// deltas and becomes the parent of every override record found below it.
/// Direct children of the root are addressed by `siblingIndex`, deeper nodes
/// by a full path built on the definition side, so the address stays valid
/// when the live ancestors themselves are renamed.
pub(crate) fn diff_instance<S, I>(
    scene: &S,
    live_root: NodeId,
    definition_root: NodeId,
    records: &mut RecordSet,
    dictionary: &mut TemplateDictionary,
    ids: &mut I,
) -> Result<(), CaptureError>
where
    S: SceneGraph + ?Sized,
    I: IdSource + ?Sized,
{
    let root_index = records
        .index_of(live_root)
        .ok_or(CaptureError::Unrecorded(live_root))?;

    let mut stack = vec![(live_root, definition_root)];
    while let Some((live, definition)) = stack.pop() {
        if live != live_root
            && !(scene.is_part_of_template(live)
                && scene.outermost_instance_root(live) == Some(live_root))
        {
            debug!(?live, "not part of this instance; skipped");
            continue;
        }
        let delta = compare_nodes(scene, live, definition);
        if !delta.is_empty() {
            let (index, created) = records.record_for(live, ids);
            debug!(?live, created, ?delta, "override found");
            if let Some(record) = records.at_mut(index) {
                if created && live != live_root {
                    if scene.parent(definition) == Some(definition_root) {
                        record.sibling_index = Some(scene.sibling_index(definition));
                    } else {
                        record.path = Some(build_path(scene, definition, definition_root)?);
                    }
                }
                apply_delta(record, delta, dictionary, ids)?;
            }
            if created && live != live_root {
                records.link(root_index, index);
            }
        }

        let shared = scene.child_count(live).min(scene.child_count(definition));
        for i in (0..shared).rev() {
            if let (Some(l), Some(d)) = (scene.child(live, i), scene.child(definition, i)) {
                stack.push((l, d));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::memory::MemoryScene;
    use clip_port::{TemplateKind, Transform};

    fn robot() -> (MemoryScene, NodeId) {
        let mut scene = MemoryScene::new();
        let def = scene.add_node("Robot", None);
        let _head = scene.add_node("Head", Some(def));
        let arm = scene.add_node("Arm", Some(def));
        let hand = scene.add_node("Hand", Some(arm));
        scene.set_renderer(hand, &["Assets/Mats/Skin.mat", "Assets/Mats/Nail.mat"]);
        scene.register_template("Assets/Robots/Robot.prefab", TemplateKind::Regular, def);
        let inst = scene.instantiate("Assets/Robots/Robot.prefab").unwrap();
        (scene, inst)
    }

    #[test]
    fn test_pristine_instance_has_no_delta() {
        let (scene, inst) = robot();
        let def = scene.template_source(inst).unwrap();
        for (l, d) in scene.preorder(inst).into_iter().zip(scene.preorder(def)) {
            assert!(compare_nodes(&scene, l, d).is_empty());
        }
    }

    #[test]
    fn test_delta_holds_only_changed_fields() {
        let (mut scene, inst) = robot();
        let def = scene.template_source(inst).unwrap();
        let arm = scene.child(inst, 1).unwrap();
        scene.rename(arm, "Arm_L");
        scene.set_transform(
            arm,
            Transform {
                position: Vec3::new(0.5, 0.0, 0.0),
                ..Transform::IDENTITY
            },
        );
        let delta = compare_nodes(&scene, arm, scene.child(def, 1).unwrap());
        assert_eq!(delta.name.as_deref(), Some("Arm_L"));
        assert_eq!(delta.position, Some(Vec3::new(0.5, 0.0, 0.0)));
        assert_eq!(delta.rotation, None);
        assert_eq!(delta.scale, None);
        assert_eq!(delta.active, None);
    }

    #[test]
    fn test_equivalent_rotation_is_not_a_delta() {
        let (mut scene, inst) = robot();
        let def = scene.template_source(inst).unwrap();
        scene.set_transform(
            inst,
            Transform {
                rotation: Vec3::new(0.0, 360.0, 0.0),
                ..Transform::IDENTITY
            },
        );
        assert!(compare_nodes(&scene, inst, def).is_empty());
    }

    #[test]
    fn test_material_slots_compared_per_slot() {
        let (mut scene, inst) = robot();
        let def = scene.template_source(inst).unwrap();
        let hand = scene.preorder(inst)[3];
        let def_hand = scene.preorder(def)[3];
        scene
            .set_material(hand, 1, "Assets/Mats/Chrome.mat")
            .unwrap();
        assert_eq!(
            material_changes(&scene, hand, def_hand),
            vec![(1, "Assets/Mats/Chrome.mat".to_owned())]
        );

        scene.set_renderer(hand, &["Assets/Mats/Chrome.mat"]);
        assert!(material_changes(&scene, hand, def_hand).is_empty());
    }

    #[test]
    fn test_diff_instance_addresses_children() {
        let (mut scene, inst) = robot();
        let def = scene.template_source(inst).unwrap();
        let arm = scene.child(inst, 1).unwrap();
        let hand = scene.child(arm, 0).unwrap();
        scene.rename(arm, "Arm_L");
        scene.set_active(hand, false).unwrap();
        scene
            .set_material(hand, 0, "Assets/Mats/Chrome.mat")
            .unwrap();

        let mut ids = SequentialIds::new("r");
        let mut dictionary = TemplateDictionary::new();
        let mut records = RecordSet::default();
        records.record_for(inst, &mut ids);
        diff_instance(&scene, inst, def, &mut records, &mut dictionary, &mut ids).unwrap();

        let records = records.into_records();
        assert_eq!(records.len(), 3);
        let root = &records[0];
        assert!(root.is_bare());
        assert_eq!(root.children().len(), 2);

        let arm_record = &records[1];
        assert_eq!(arm_record.name.as_deref(), Some("Arm_L"));
        assert_eq!(arm_record.sibling_index, Some(1));
        assert_eq!(arm_record.path, None);

        let hand_record = &records[2];
        assert_eq!(hand_record.status, Some(NodeStatus::Inactive));
        assert_eq!(hand_record.sibling_index, None);
        assert_eq!(
            hand_record.path.as_deref(),
            Some("/n[Arm]i[1]/n[Hand]i[0]")
        );
        let materials = hand_record.material_overrides.as_ref().unwrap();
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].slot, 0);
        assert_eq!(materials[0].name, "Chrome");
        assert_eq!(dictionary.len(), 1);
    }

    #[test]
    fn test_extra_live_children_ignored() {
        let (mut scene, inst) = robot();
        let def = scene.template_source(inst).unwrap();
        let extra = scene.add_node("Antenna", Some(inst));
        scene.set_transform(
            extra,
            Transform {
                position: Vec3::new(0.0, 3.0, 0.0),
                ..Transform::IDENTITY
            },
        );

        let mut ids = SequentialIds::new("r");
        let mut dictionary = TemplateDictionary::new();
        let mut records = RecordSet::default();
        records.record_for(inst, &mut ids);
        diff_instance(&scene, inst, def, &mut records, &mut dictionary, &mut ids).unwrap();
        assert_eq!(records.into_records().len(), 1);
    }

    #[test]
    fn test_added_node_at_template_index_is_not_diffed() {
        let (mut scene, inst) = robot();
        let def = scene.template_source(inst).unwrap();
        let arm = scene.child(inst, 1).unwrap();
        let sign = scene.add_node("Sign", Some(inst));
        scene.set_parent(arm, Some(inst)).unwrap();
        assert_eq!(scene.child(inst, 1), Some(sign));

        let mut ids = SequentialIds::new("r");
        let mut dictionary = TemplateDictionary::new();
        let mut records = RecordSet::default();
        records.record_for(inst, &mut ids);
        diff_instance(&scene, inst, def, &mut records, &mut dictionary, &mut ids).unwrap();
        assert_eq!(records.index_of(sign), None);
        let records = records.into_records();
        assert_eq!(records.len(), 1);
        assert!(records[0].children().is_empty());
    }

    #[test]
    fn test_record_links_once() {
        let mut ids = SequentialIds::new("r");
        let mut records = RecordSet::default();
        let parent = records.push(SceneNodeRecord::new(RecordId(ids.fresh_id())));
        let other = records.push(SceneNodeRecord::new(RecordId(ids.fresh_id())));
        let child = records.push(SceneNodeRecord::new(RecordId(ids.fresh_id())));
        assert!(records.link(parent, child));
        assert!(!records.link(parent, child));
        assert!(!records.link(other, child));
        assert!(!records.link(parent, parent));
        let records = records.into_records();
        assert_eq!(records[0].children().len(), 1);
        assert!(records[1].children().is_empty());
    }
}
