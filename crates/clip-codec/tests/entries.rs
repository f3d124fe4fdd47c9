// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Clipboard entries on disk and staged imports into an in-memory scene.

use chrono::{Duration, TimeZone, Utc};
use clip_codec::config::ClipSettings;
use clip_codec::{
    Artifact, Clipboard, CodecError, EntryFilter, EntryId, EntryStore, FsEntryStore, ImportJob,
    JobError, Stage, Step, StoredEntry,
};
use clip_core::memory::MemoryScene;
use clip_core::{capture, Capture, ImportError, SequentialIds};
use clip_port::{NodeId, SceneGraph, TemplateKind};

fn register_robot(scene: &mut MemoryScene) {
    let robot = scene.add_node("Robot", None);
    scene.add_node("Head", Some(robot));
    scene.add_node("Arm", Some(robot));
    scene.register_template("Assets/Robots/Robot.prefab", TemplateKind::Regular, robot);
}

/// A Robot instance whose arm was renamed.
fn robot_capture() -> Capture {
    let mut scene = MemoryScene::new();
    register_robot(&mut scene);
    let robot = scene.instantiate("Assets/Robots/Robot.prefab").unwrap();
    let arm = scene.child(robot, 1).unwrap();
    scene.rename(arm, "Arm_L");
    capture(&scene, &mut SequentialIds::new("r"), &[robot]).unwrap()
}

fn plain_capture(name: &str) -> Capture {
    let mut scene = MemoryScene::new();
    let root = scene.add_node(name, None);
    scene.add_node("Child", Some(root));
    capture(&scene, &mut SequentialIds::new("r"), &[root]).unwrap()
}

fn open(dir: &tempfile::TempDir) -> FsEntryStore {
    FsEntryStore::new(dir.path().join("Content")).unwrap()
}

#[test]
fn listing_is_newest_first_and_filterable() {
    let dir = tempfile::tempdir().unwrap();
    let clipboard = Clipboard::new(open(&dir));
    let mut ids = SequentialIds::new("e");
    let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

    let shelf = clipboard
        .save_at(&plain_capture("Shelf"), t0, &mut ids)
        .unwrap();
    let lamp = clipboard
        .save_at(&plain_capture("Lamp"), t0 + Duration::hours(1), &mut ids)
        .unwrap();
    let robot = clipboard
        .save_at(&robot_capture(), t0 + Duration::hours(2), &mut ids)
        .unwrap();
    assert_eq!(robot.metadata.name, "Robot");
    assert_eq!(robot.metadata.number_of_templates, 1);
    assert_eq!(robot.metadata.dictionary.len(), 1);

    let order: Vec<_> = clipboard
        .list(&EntryFilter::All)
        .unwrap()
        .into_iter()
        .map(|e| e.metadata.name)
        .collect();
    assert_eq!(order, ["Robot", "Lamp", "Shelf"]);

    clipboard.set_favorite(&shelf.id, true).unwrap();
    clipboard.set_tags(&lamp.id, "Lighting, desk").unwrap();
    clipboard.rename(&robot.id, "Sentry").unwrap();

    let favorites = clipboard.list(&EntryFilter::Favorites).unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].id, shelf.id);

    let found = clipboard
        .list(&EntryFilter::Search("LIGHT".into()))
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, lamp.id);

    let renamed = clipboard.list(&EntryFilter::Search("sentry".into())).unwrap();
    assert_eq!(renamed[0].id, robot.id);

    clipboard.set_tags(&lamp.id, "  ").unwrap();
    assert_eq!(clipboard.metadata(&lamp.id).unwrap().tags, None);
}

#[test]
fn delete_removes_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let clipboard = Clipboard::new(open(&dir));
    let entry = clipboard
        .save(&plain_capture("Shelf"), &mut SequentialIds::new("e"))
        .unwrap();
    clipboard.save_thumbnail(&entry.id, b"\x89PNG").unwrap();
    assert_eq!(clipboard.thumbnail(&entry.id).unwrap(), b"\x89PNG");

    clipboard.delete(&entry.id).unwrap();
    for artifact in Artifact::ALL {
        assert!(!clipboard.store().path_for(&entry.id, artifact).unwrap().exists());
    }
    assert!(clipboard.list(&EntryFilter::All).unwrap().is_empty());
}

#[test]
fn unreadable_metadata_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let clipboard = Clipboard::new(open(&dir));
    clipboard
        .save(&plain_capture("Shelf"), &mut SequentialIds::new("e"))
        .unwrap();
    clipboard
        .store()
        .write(&EntryId::from("junk"), Artifact::Metadata, b"{ nope")
        .unwrap();
    let listed = clipboard.list(&EntryFilter::All).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].metadata.name, "Shelf");
}

#[test]
fn compressed_and_plain_entries_load_alike() {
    let dir = tempfile::tempdir().unwrap();
    let captured = robot_capture();
    let mut ids = SequentialIds::new("e");

    let packed = Clipboard::new(open(&dir)).save(&captured, &mut ids).unwrap();
    let plain_clipboard = Clipboard::new(open(&dir)).with_compression(false);
    let plain = plain_clipboard.save(&captured, &mut ids).unwrap();
    assert!(packed.metadata.compressed);
    assert!(!plain.metadata.compressed);

    let store = plain_clipboard.store();
    assert_eq!(&store.read(&packed.id, Artifact::Data).unwrap()[..2], &[0x1f, 0x8b]);
    assert_eq!(store.read(&plain.id, Artifact::Data).unwrap()[0], b'{');

    assert_eq!(plain_clipboard.load_tree(&packed).unwrap(), captured.document);
    assert_eq!(plain_clipboard.load_tree(&plain).unwrap(), captured.document);
}

#[test]
fn settings_decide_whether_entries_are_gzipped() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ClipSettings {
        save_compressed: false,
        ..ClipSettings::default()
    };
    let clipboard = Clipboard::from_settings(open(&dir), &settings);
    let entry = clipboard
        .save(&plain_capture("Shelf"), &mut SequentialIds::new("e"))
        .unwrap();
    assert!(!entry.metadata.compressed);
    assert_eq!(clipboard.store().read(&entry.id, Artifact::Data).unwrap()[0], b'{');
}

fn saved_robot(dir: &tempfile::TempDir) -> (FsEntryStore, StoredEntry) {
    let clipboard = Clipboard::new(open(dir));
    let entry = clipboard
        .save(&robot_capture(), &mut SequentialIds::new("e"))
        .unwrap();
    (clipboard.into_inner(), entry)
}

#[test]
fn import_job_touches_the_scene_only_when_reconstructing() {
    let dir = tempfile::tempdir().unwrap();
    let (store, entry) = saved_robot(&dir);

    let mut target = MemoryScene::new();
    register_robot(&mut target);
    let catalog = target.catalog();
    let parent = target.add_node("Level", None);
    let mut errors: Vec<String> = Vec::new();

    let mut job = ImportJob::new(entry, Some(parent));
    assert_eq!(job.stage(), &Stage::CheckReadiness);
    assert_eq!(
        job.step(&store, &mut target, &catalog, &mut errors).unwrap(),
        Step::Pending
    );
    assert_eq!(job.stage(), &Stage::Decode);
    assert_eq!(
        job.step(&store, &mut target, &catalog, &mut errors).unwrap(),
        Step::Pending
    );
    assert!(matches!(job.stage(), Stage::Reconstruct(_)));
    assert_eq!(target.creation_calls(), 0);

    let Step::Done(root) = job.step(&store, &mut target, &catalog, &mut errors).unwrap() else {
        panic!("reconstruct should finish the job");
    };
    assert_eq!(target.parent(root), Some(parent));
    assert_eq!(target.name(root), "Robot");
    let arm: NodeId = target.child(root, 1).unwrap();
    assert_eq!(target.name(arm), "Arm_L");
    assert!(errors.is_empty());

    assert_eq!(
        job.step(&store, &mut target, &catalog, &mut errors).unwrap(),
        Step::Done(root)
    );
}

#[test]
fn import_job_refuses_missing_references() {
    let dir = tempfile::tempdir().unwrap();
    let (store, entry) = saved_robot(&dir);

    let mut target = MemoryScene::new();
    let catalog = target.catalog();
    let mut errors: Vec<String> = Vec::new();
    let mut job = ImportJob::new(entry, None);

    match job.run(&store, &mut target, &catalog, &mut errors) {
        Err(JobError::Import(ImportError::MissingReferences(missing))) => {
            assert_eq!(missing.len(), 1);
            assert_eq!(missing[0].verification_name, "Robot");
        }
        other => panic!("expected missing references, got {other:?}"),
    }
    assert_eq!(errors.len(), 1);
    assert_eq!(target.creation_calls(), 0);
    assert_eq!(job.stage(), &Stage::Failed);
    assert!(matches!(
        job.step(&store, &mut target, &catalog, &mut errors),
        Err(JobError::Failed)
    ));
}

#[test]
fn unknown_representation_stops_before_reconstruction() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    let clipboard = Clipboard::new(store.clone()).with_compression(false);
    let entry = clipboard
        .save(&plain_capture("Shelf"), &mut SequentialIds::new("e"))
        .unwrap();
    store
        .write(
            &entry.id,
            Artifact::Data,
            br#"{"representation":"JsonV9","tree":{}}"#,
        )
        .unwrap();

    let mut target = MemoryScene::new();
    let catalog = target.catalog();
    let mut errors: Vec<String> = Vec::new();
    let result = ImportJob::new(entry, None).run(&store, &mut target, &catalog, &mut errors);
    assert!(matches!(
        result,
        Err(JobError::Codec(CodecError::UnknownRepresentation(ref tag))) if tag == "JsonV9"
    ));
    assert!(errors[0].contains("try upgrading"));
    assert_eq!(target.live_node_count(), 0);
}
