// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core value types for the clipboard port contract.
//!
//! These types are pure domain objects with no serialization logic.

use crate::math::Vec3;

/// Opaque handle for a node owned by the host scene graph.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

/// Kind of asset a dictionary item refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// A reusable node hierarchy (prefab, model or variant).
    Template,
    /// A material assignable to a rendering slot.
    Material,
}

impl AssetKind {
    /// File extensions an asset of this kind may carry, lowercase with dot.
    pub const fn file_extensions(self) -> &'static [&'static str] {
        match self {
            AssetKind::Template => &[".prefab", ".fbx"],
            AssetKind::Material => &[".mat"],
        }
    }
}

/// Flavor of a template asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// An authored template.
    Regular,
    /// A template imported from a model file.
    Model,
    /// A template derived from another template.
    Variant,
}

impl TemplateKind {
    /// File extension (without dot) an asset of this kind is stored under.
    pub const fn file_extension(self) -> &'static str {
        match self {
            TemplateKind::Model => "fbx",
            TemplateKind::Regular | TemplateKind::Variant => "prefab",
        }
    }
}

/// Template asset backing a live template instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateAsset {
    /// Full project path of the asset, e.g. `Assets/Props/Crate.prefab`.
    pub path: String,
    /// Flavor of the template.
    pub kind: TemplateKind,
}

/// Position, Euler rotation (degrees) and scale of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation.
    pub position: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
