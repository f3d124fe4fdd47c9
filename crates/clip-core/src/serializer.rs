// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Capture of a live subtree into a [`SceneTreeDocument`].
//!
//! The walk is depth-first. Each node is one of:
//!
//! 1. the outermost root of a template instance: a full record carrying the
//!    template reference, followed by a differ pass against the template's
//!    definition;
//! 2. any other part of a template instance: skipped, the differ pass of its
//!    instance root already covered it;
//! 3. a standalone node: a record with its name and non-identity transform.
//!
//! The nearest enclosing template-instance root is threaded through the
//! recursion as a parameter. A standalone node clears it.

use std::collections::HashSet;

use clip_port::{AssetKind, IdSource, NodeId, Quat, SceneGraph, Vec3};
use tracing::{debug, instrument};

use crate::address::{build_path, index_chain, path_along};
use crate::dictionary::TemplateDictionary;
use crate::differ::{diff_instance, RecordSet};
use crate::error::CaptureError;
use crate::model::{NodeStatus, RecordId, SceneNodeRecord, SceneTreeDocument, TemplateReference};

/// Result of one capture pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    /// The captured tree.
    pub document: SceneTreeDocument,
    /// Every template and material the tree refers to.
    pub dictionary: TemplateDictionary,
}

impl Capture {
    /// Number of records that are template-instance roots.
    pub fn template_count(&self) -> usize {
        self.document.template_reference_count()
    }
}

struct Serializer<'a, S: ?Sized, I: ?Sized> {
    scene: &'a S,
    ids: &'a mut I,
    records: RecordSet,
    dictionary: TemplateDictionary,
}

impl<S, I> Serializer<'_, S, I>
where
    S: SceneGraph + ?Sized,
    I: IdSource + ?Sized,
{
    fn walk(
        &mut self,
        node: NodeId,
        parent: Option<usize>,
        enclosing: Option<NodeId>,
    ) -> Result<Option<usize>, CaptureError> {
        let scene = self.scene;
        let (recorded, enclosing) = if scene.is_template_instance_root(node)
            && scene.outermost_instance_root(node) == Some(node)
        {
            (Some(self.capture_instance(node, enclosing)?), Some(node))
        } else if scene.is_part_of_template(node) {
            (None, enclosing)
        } else {
            (Some(self.capture_standalone(node)), None)
        };

        if let (Some(parent), Some(index)) = (parent, recorded) {
            self.records.link(parent, index);
        }
        let next_parent = recorded.or(parent);
        for i in 0..scene.child_count(node) {
            if let Some(child) = scene.child(node, i) {
                self.walk(child, next_parent, enclosing)?;
            }
        }
        Ok(recorded)
    }

    fn capture_instance(
        &mut self,
        node: NodeId,
        enclosing: Option<NodeId>,
    ) -> Result<usize, CaptureError> {
        let scene = self.scene;
        let asset = scene
            .template_asset(node)
            .ok_or(CaptureError::MissingTemplateAsset(node))?;
        let definition = scene
            .template_source(node)
            .ok_or(CaptureError::MissingTemplateSource(node))?;
        let (item, display_name) =
            self.dictionary
                .resolve_asset(&asset.path, AssetKind::Template, self.ids)?;
        let path = match enclosing {
            Some(enclosing) => Some(self.insertion_path(node, enclosing)?),
            None => None,
        };
        debug!(?node, template = %asset.path, ?path, "template instance root");

        let (index, _) = self.records.record_for(node, self.ids);
        if let Some(record) = self.records.at_mut(index) {
            record.name = Some(scene.name(node));
            record.path = path;
            record.template_reference = Some(TemplateReference {
                item,
                name: display_name,
                kind: asset.kind,
            });
        }
        diff_instance(
            scene,
            node,
            definition,
            &mut self.records,
            &mut self.dictionary,
            self.ids,
        )?;
        Ok(index)
    }

    /// Address of the live parent of `node`, relative to `enclosing`.
    ///
    /// Level names come from the enclosing template's definition so the
    /// address matches the freshly instantiated template before any rename
    /// override is applied.
    fn insertion_path(&self, node: NodeId, enclosing: NodeId) -> Result<String, CaptureError> {
        let scene = self.scene;
        let parent = scene.parent(node).ok_or(CaptureError::Unrecorded(node))?;
        let chain = index_chain(scene, parent, enclosing)?;
        let named = scene
            .template_source(enclosing)
            .and_then(|definition| path_along(scene, definition, &chain));
        match named {
            Some(path) => Ok(path),
            None => Ok(build_path(scene, parent, enclosing)?),
        }
    }

    fn capture_standalone(&mut self, node: NodeId) -> usize {
        let scene = self.scene;
        let (index, _) = self.records.record_for(node, self.ids);
        if let Some(record) = self.records.at_mut(index) {
            record.name = Some(scene.name(node));
            if !scene.is_active(node) {
                record.status = Some(NodeStatus::Inactive);
            }
            let local = scene.local_transform(node);
            if !local.position.approx_eq(&Vec3::ZERO) {
                record.position = Some(local.position.into());
            }
            if !Quat::euler_approx_eq(local.rotation, Vec3::ZERO) {
                record.rotation = Some(local.rotation.into());
            }
            if !local.scale.approx_eq(&Vec3::ONE) {
                record.scale = Some(local.scale.into());
            }
        }
        debug!(?node, "standalone node");
        index
    }

    fn capture_root(&mut self, node: NodeId, parent: Option<usize>) -> Result<usize, CaptureError> {
        self.walk(node, parent, None)?
            .ok_or(CaptureError::InsideTemplate(node))
    }
}

/// Drops repeated selections and selections that are descendants of another
/// selected node, keeping the original order.
fn distinct_roots<S>(scene: &S, roots: &[NodeId]) -> Vec<NodeId>
where
    S: SceneGraph + ?Sized,
{
    let selected: HashSet<NodeId> = roots.iter().copied().collect();
    let mut seen = HashSet::with_capacity(roots.len());
    roots
        .iter()
        .copied()
        .filter(|root| seen.insert(*root))
        .filter(|root| {
            let mut current = scene.parent(*root);
            while let Some(ancestor) = current {
                if selected.contains(&ancestor) {
                    return false;
                }
                current = scene.parent(ancestor);
            }
            true
        })
        .collect()
}

/// Captures the subtrees under `roots` into one document.
///
/// A single root becomes the document root without any placement fields;
/// positioning the reconstructed copy is left to the caller. Several roots
/// are gathered under a synthetic parent record, each carrying its selection
/// order as `siblingIndex` plus its world position, world rotation and local
/// scale.
#[instrument(skip_all, fields(roots = roots.len()))]
pub fn capture<S, I>(scene: &S, ids: &mut I, roots: &[NodeId]) -> Result<Capture, CaptureError>
where
    S: SceneGraph + ?Sized,
    I: IdSource + ?Sized,
{
    let roots = distinct_roots(scene, roots);
    let mut serializer = Serializer {
        scene,
        ids,
        records: RecordSet::default(),
        dictionary: TemplateDictionary::new(),
    };

    let root_index = match roots.as_slice() {
        [] => return Err(CaptureError::EmptySelection),
        [single] => {
            let index = serializer.capture_root(*single, None)?;
            if let Some(record) = serializer.records.at_mut(index) {
                record.sibling_index = None;
                record.position = None;
                record.rotation = None;
                record.scale = None;
            }
            index
        }
        many => {
            let mut synthetic = SceneNodeRecord::new(RecordId(serializer.ids.fresh_id()));
            synthetic.name = Some(format!("{} nodes", many.len()));
            let synthetic = serializer.records.push(synthetic);
            for (order, root) in many.iter().enumerate() {
                let index = serializer.capture_root(*root, Some(synthetic))?;
                let world = scene.world_transform(*root);
                let local = scene.local_transform(*root);
                if let Some(record) = serializer.records.at_mut(index) {
                    record.sibling_index = Some(order);
                    record.position = Some(world.position.into());
                    record.rotation = Some(world.rotation.into());
                    record.scale = Some(local.scale.into());
                }
            }
            synthetic
        }
    };

    let root = serializer
        .records
        .id_at(root_index)
        .ok_or(CaptureError::EmptySelection)?;
    let document = SceneTreeDocument {
        root,
        nodes: serializer.records.into_records(),
    };
    debug!(records = document.len(), items = serializer.dictionary.len(), "capture complete");
    Ok(Capture {
        document,
        dictionary: serializer.dictionary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::memory::MemoryScene;
    use crate::model::SerializedVector;
    use clip_port::{TemplateKind, Transform};

    fn at(x: f32, y: f32, z: f32) -> Transform {
        Transform {
            position: Vec3::new(x, y, z),
            ..Transform::IDENTITY
        }
    }

    #[test]
    fn test_standalone_records_only_non_identity_fields() {
        let mut scene = MemoryScene::new();
        let root = scene.add_node("Root", None);
        let child = scene.add_node("Child", Some(root));
        scene.set_transform(child, at(1.0, 2.0, 3.0));
        scene.set_active(child, false).unwrap();

        let capture = capture(&scene, &mut SequentialIds::new("r"), &[root]).unwrap();
        let doc = &capture.document;
        assert_eq!(doc.len(), 2);
        let root_record = doc.root_record().unwrap();
        assert_eq!(root_record.name.as_deref(), Some("Root"));
        assert_eq!(root_record.position, None);
        let child_record = doc.get(&root_record.children()[0]).unwrap();
        assert_eq!(
            child_record.position,
            Some(SerializedVector {
                x: 1.0,
                y: 2.0,
                z: 3.0
            })
        );
        assert_eq!(child_record.rotation, None);
        assert_eq!(child_record.scale, None);
        assert_eq!(child_record.status, Some(NodeStatus::Inactive));
        assert_eq!(child_record.sibling_index, None);
        assert!(capture.dictionary.is_empty());
    }

    #[test]
    fn test_single_root_has_no_placement() {
        let mut scene = MemoryScene::new();
        let root = scene.add_node("Root", None);
        scene.set_transform(root, at(5.0, 0.0, 0.0));
        let capture = capture(&scene, &mut SequentialIds::new("r"), &[root]).unwrap();
        let record = capture.document.root_record().unwrap();
        assert_eq!(record.position, None);
        assert_eq!(record.sibling_index, None);
    }

    #[test]
    fn test_empty_selection() {
        let scene = MemoryScene::new();
        assert_eq!(
            capture(&scene, &mut SequentialIds::new("r"), &[]),
            Err(CaptureError::EmptySelection)
        );
    }

    #[test]
    fn test_descendant_selection_is_folded() {
        let mut scene = MemoryScene::new();
        let root = scene.add_node("Root", None);
        let child = scene.add_node("Child", Some(root));
        let capture =
            capture(&scene, &mut SequentialIds::new("r"), &[child, root, root]).unwrap();
        assert_eq!(capture.document.len(), 2);
        assert_eq!(
            capture.document.root_record().unwrap().name.as_deref(),
            Some("Root")
        );
    }

    #[test]
    fn test_template_part_cannot_be_selected_alone() {
        let mut scene = MemoryScene::new();
        let def = scene.add_node("Crate", None);
        scene.add_node("Lid", Some(def));
        scene.register_template("Assets/Props/Crate.prefab", TemplateKind::Regular, def);
        let inst = scene.instantiate("Assets/Props/Crate.prefab").unwrap();
        let lid = scene.child(inst, 0).unwrap();
        assert_eq!(
            capture(&scene, &mut SequentialIds::new("r"), &[lid]),
            Err(CaptureError::InsideTemplate(lid))
        );
    }

    #[test]
    fn test_instance_root_record() {
        let mut scene = MemoryScene::new();
        let def = scene.add_node("Crate", None);
        scene.add_node("Lid", Some(def));
        scene.register_template("Assets/Resources/Props/Crate.prefab", TemplateKind::Variant, def);
        let inst = scene.instantiate("Assets/Resources/Props/Crate.prefab").unwrap();
        scene.rename(inst, "Crate (1)");

        let capture = capture(&scene, &mut SequentialIds::new("r"), &[inst]).unwrap();
        assert_eq!(capture.document.len(), 1);
        assert_eq!(capture.template_count(), 1);
        let record = capture.document.root_record().unwrap();
        assert_eq!(record.name.as_deref(), Some("Crate (1)"));
        let reference = record.template_reference.as_ref().unwrap();
        assert_eq!(reference.name, "Crate");
        assert_eq!(reference.kind, TemplateKind::Variant);
        let item = capture.dictionary.get_by_id(&reference.item).unwrap();
        assert_eq!(item.search_path, "Props");
        assert_eq!(item.verification_name, "Crate");
        assert_eq!(item.kind, AssetKind::Template);
    }

    #[test]
    fn test_added_instance_inside_instance_gets_insertion_path() {
        let mut scene = MemoryScene::new();
        let bottle = scene.add_node("Bottle", None);
        scene.register_template("Assets/Props/Bottle.prefab", TemplateKind::Regular, bottle);
        let shelf = scene.add_node("Shelf", None);
        let _top = scene.add_node("Top", Some(shelf));
        let board = scene.add_node("Board", Some(shelf));
        scene.add_node("Slot", Some(board));
        scene.register_template("Assets/Props/Shelf.prefab", TemplateKind::Regular, shelf);

        let inst = scene.instantiate("Assets/Props/Shelf.prefab").unwrap();
        let live_board = scene.child(inst, 1).unwrap();
        let live_slot = scene.child(live_board, 0).unwrap();
        scene.rename(live_board, "Board_Renamed");
        let added = scene.instantiate("Assets/Props/Bottle.prefab").unwrap();
        scene.set_parent(added, Some(live_slot)).unwrap();

        let capture = capture(&scene, &mut SequentialIds::new("r"), &[inst]).unwrap();
        let root = capture.document.root_record().unwrap();
        assert_eq!(root.children().len(), 2);
        let bottle_record = capture.document.get(&root.children()[1]).unwrap();
        assert_eq!(
            bottle_record.path.as_deref(),
            Some("/n[Board]i[1]/n[Slot]i[0]")
        );
        assert!(bottle_record.template_reference.is_some());
        assert_eq!(capture.template_count(), 2);
    }
}
