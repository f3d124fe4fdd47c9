// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
//! `clip` against a content directory populated through `clip-codec`.

use assert_cmd::Command;
use clip_codec::{Clipboard, FsEntryStore, StoredEntry};
use clip_core::memory::MemoryScene;
use clip_core::{capture, SequentialIds};
use clip_port::{SceneGraph, TemplateKind};
use predicates::prelude::*;

/// Saves a Robot instance whose hand wears a non-default material.
fn seed(dir: &tempfile::TempDir) -> StoredEntry {
    let mut scene = MemoryScene::new();
    let robot = scene.add_node("Robot", None);
    let hand = scene.add_node("Hand", Some(robot));
    scene.set_renderer(hand, &["Assets/Materials/Skin.mat"]);
    scene.register_template("Assets/Robots/Robot.prefab", TemplateKind::Regular, robot);
    scene.register_material("Assets/Props/Metal/Rust_01.mat");

    let instance = scene.instantiate("Assets/Robots/Robot.prefab").unwrap();
    let hand = scene.child(instance, 0).unwrap();
    scene
        .set_material(hand, 0, "Assets/Props/Metal/Rust_01.mat")
        .unwrap();
    let captured = capture(&scene, &mut SequentialIds::new("r"), &[instance]).unwrap();

    let store = FsEntryStore::new(dir.path().join("Content")).unwrap();
    Clipboard::new(store)
        .save(&captured, &mut SequentialIds::new("entry"))
        .unwrap()
}

fn clip(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("clip").unwrap();
    cmd.arg("--content").arg(dir.path().join("Content"));
    cmd
}

#[test]
fn list_shows_saved_entries() {
    let dir = tempfile::tempdir().unwrap();
    let entry = seed(&dir);
    clip(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Robot"))
        .stdout(predicate::str::contains(entry.id.to_string()))
        .stdout(predicate::str::contains("1 entry"));
    clip(&dir)
        .args(["list", "--favorites"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 entries"));
}

#[test]
fn inspect_prints_dictionary_and_records() {
    let dir = tempfile::tempdir().unwrap();
    let entry = seed(&dir);
    clip(&dir)
        .args(["inspect", &entry.id.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Props/Metal"))
        .stdout(predicate::str::contains("0=Rust_01"))
        .stdout(predicate::str::contains("Robot (Regular)"));
}

#[test]
fn missing_lists_unavailable_material_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    let entry = seed(&dir);
    let manifest = dir.path().join("assets.json");
    std::fs::write(
        &manifest,
        r#"{ "templates": [ { "path": "Assets/Robots/Robot.prefab" } ] }"#,
    )
    .unwrap();
    clip(&dir)
        .args(["missing", &entry.id.to_string(), "--manifest"])
        .arg(&manifest)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Rust_01"))
        .stderr(predicate::str::contains("1 referenced asset(s) missing"));

    std::fs::write(
        &manifest,
        r#"{
            "templates": [ { "path": "Assets/Robots/Robot.prefab" } ],
            "materials": [ "Assets/Props/Metal/Rust_01.mat" ]
        }"#,
    )
    .unwrap();
    clip(&dir)
        .args(["missing", &entry.id.to_string(), "--manifest"])
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("all 2 referenced asset(s) available"));
}

#[test]
fn favorite_then_delete() {
    let dir = tempfile::tempdir().unwrap();
    let entry = seed(&dir);
    let id = entry.id.to_string();
    clip(&dir)
        .args(["favorite", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("favorite = true"));
    clip(&dir)
        .args(["list", "--favorites"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 entry"));
    clip(&dir).args(["delete", &id]).assert().success();
    assert!(!dir.path().join(format!("Content/{id}.meta")).exists());
    clip(&dir)
        .args(["inspect", &id])
        .assert()
        .failure();
}

#[test]
fn delete_refuses_ids_outside_content_directory() {
    let dir = tempfile::tempdir().unwrap();
    seed(&dir);
    let outside = dir.path().join("x.meta");
    std::fs::write(&outside, b"{}").unwrap();
    clip(&dir)
        .args(["delete", "../x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid entry id"));
    assert!(outside.is_file());
}
