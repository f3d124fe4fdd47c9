// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Property tests: path round-trip, dictionary dedup, plain-tree round-trip.

use clip_core::address::{build_path, decode, encode, resolve_path};
use clip_core::memory::{MemoryCatalog, MemoryScene};
use clip_core::{capture, deserialize, SequentialIds, TemplateDictionary};
use clip_port::{AssetKind, NodeId, Quat, SceneGraph, Transform, Vec3};
use proptest::prelude::*;

/// `(parent selector, name, transform seed)` per node; the selector picks
/// one of the nodes created before it.
fn tree_shape() -> impl Strategy<Value = Vec<(usize, String, (i16, i16, i16, u8))>> {
    prop::collection::vec(
        (
            any::<usize>(),
            "[A-Za-z0-9 _/\\[\\]\\\\]{0,10}",
            (any::<i16>(), -179i16..180, any::<i16>(), 1u8..8),
        ),
        0..24,
    )
}

fn build_tree(shape: &[(usize, String, (i16, i16, i16, u8))]) -> (MemoryScene, NodeId, Vec<NodeId>) {
    let mut scene = MemoryScene::new();
    let root = scene.add_node("Root", None);
    let mut nodes = vec![root];
    for (selector, name, (x, yaw, z, scale)) in shape {
        let parent = nodes[selector % nodes.len()];
        let node = scene.add_node(name, Some(parent));
        scene.set_transform(
            node,
            Transform {
                position: Vec3::new(f32::from(*x) / 4.0, 0.0, f32::from(*z) / 8.0),
                rotation: Vec3::new(0.0, f32::from(*yaw), 0.0),
                scale: Vec3::new(1.0, f32::from(*scale) / 2.0, 1.0),
            },
        );
        nodes.push(node);
    }
    (scene, root, nodes)
}

fn assert_same_shape(a: &MemoryScene, a_node: NodeId, b: &MemoryScene, b_node: NodeId) {
    assert_eq!(a.name(a_node), b.name(b_node));
    assert_eq!(a.child_count(a_node), b.child_count(b_node));
    let ta = a.local_transform(a_node);
    let tb = b.local_transform(b_node);
    assert!(ta.position.approx_eq(&tb.position));
    assert!(Quat::euler_approx_eq(ta.rotation, tb.rotation));
    assert!(ta.scale.approx_eq(&tb.scale));
    for i in 0..a.child_count(a_node) {
        assert_same_shape(
            a,
            a.child(a_node, i).unwrap(),
            b,
            b.child(b_node, i).unwrap(),
        );
    }
}

proptest! {
    #[test]
    fn token_round_trip(name in ".{0,16}", index in 0usize..10_000) {
        let token = encode(&name, index);
        prop_assert_eq!(decode(&token), Ok((name, index)));
    }

    #[test]
    fn path_round_trip(shape in tree_shape()) {
        let (scene, root, nodes) = build_tree(&shape);
        for node in nodes {
            let path = build_path(&scene, node, root).unwrap();
            prop_assert_eq!(resolve_path(&scene, root, &path), Ok(node));
        }
    }

    #[test]
    fn dictionary_dedup(
        path in "(Assets/)?(Resources/)?[A-Za-z]{1,6}(/[A-Za-z]{1,6}){0,2}",
        names in prop::collection::vec("[A-Za-z_0-9]{1,8}", 1..12),
    ) {
        let mut ids = SequentialIds::new("i");
        let mut dictionary = TemplateDictionary::new();
        let first = dictionary
            .resolve_or_create(&path, &names[0], AssetKind::Material, &mut ids)
            .clone();
        for name in &names {
            let item = dictionary.resolve_or_create(&path, name, AssetKind::Material, &mut ids);
            prop_assert_eq!(item, &first);
        }
        prop_assert_eq!(dictionary.len(), 1);
    }

    #[test]
    fn plain_tree_round_trip(shape in tree_shape()) {
        let (scene, root, _) = build_tree(&shape);
        let captured = capture(&scene, &mut SequentialIds::new("r"), &[root]).unwrap();
        prop_assert!(captured.dictionary.is_empty());
        prop_assert_eq!(captured.document.len(), shape.len() + 1);

        let mut target = MemoryScene::new();
        let copy = deserialize(
            &mut target,
            &MemoryCatalog::new(),
            &captured.document,
            &captured.dictionary,
            None,
            &mut Vec::new(),
        )
        .unwrap();
        prop_assert_eq!(target.live_node_count(), shape.len() + 1);
        assert_same_shape(&scene, root, &target, copy);
    }
}
