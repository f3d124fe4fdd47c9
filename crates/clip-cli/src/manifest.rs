// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Asset manifest: a JSON listing of a project's templates and materials,
//! served as an [`AssetCatalog`].

use std::path::Path;

use anyhow::{Context, Result};
use clip_core::file_stem;
use clip_port::{AssetCatalog, AssetKind, TemplateKind};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
enum ManifestKind {
    Regular,
    Model,
    Variant,
}

impl From<ManifestKind> for TemplateKind {
    fn from(kind: ManifestKind) -> Self {
        match kind {
            ManifestKind::Regular => Self::Regular,
            ManifestKind::Model => Self::Model,
            ManifestKind::Variant => Self::Variant,
        }
    }
}

#[derive(Deserialize, Debug)]
struct TemplateEntry {
    path: String,
    kind: Option<ManifestKind>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct RawManifest {
    templates: Vec<TemplateEntry>,
    materials: Vec<String>,
}

/// Catalog read from a manifest file.
#[derive(Debug, Default)]
pub struct ManifestCatalog {
    templates: Vec<(String, TemplateKind)>,
    materials: Vec<String>,
}

impl ManifestCatalog {
    /// Parses manifest JSON. A template without `kind` is a model when it is
    /// an `.fbx` file and a regular template otherwise.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawManifest = serde_json::from_str(json).context("parse asset manifest")?;
        let templates = raw
            .templates
            .into_iter()
            .map(|entry| {
                let kind = entry.kind.map_or_else(
                    || {
                        if entry.path.to_ascii_lowercase().ends_with(".fbx") {
                            TemplateKind::Model
                        } else {
                            TemplateKind::Regular
                        }
                    },
                    TemplateKind::from,
                );
                (entry.path, kind)
            })
            .collect();
        Ok(Self {
            templates,
            materials: raw.materials,
        })
    }

    /// Reads and parses a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read asset manifest {}", path.display()))?;
        Self::from_json(&json)
    }
}

fn stem_matches(path: &str, query: &str) -> bool {
    file_stem(path).to_ascii_lowercase().contains(query)
}

impl AssetCatalog for ManifestCatalog {
    fn find_assets(&self, name_query: &str, kind: AssetKind) -> Vec<String> {
        let query = name_query.to_ascii_lowercase();
        match kind {
            AssetKind::Template => self
                .templates
                .iter()
                .filter(|(path, _)| stem_matches(path, &query))
                .map(|(path, _)| path.clone())
                .collect(),
            AssetKind::Material => self
                .materials
                .iter()
                .filter(|path| stem_matches(path, &query))
                .cloned()
                .collect(),
        }
    }

    fn template_kind(&self, path: &str) -> Option<TemplateKind> {
        self.templates
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, kind)| *kind)
    }
}
