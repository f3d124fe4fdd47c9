// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless adapter for the `clip-port` traits.
//!
//! `MemoryScene` tracks nodes, template definitions and instances in maps
//! without any engine behind them. Use it to exercise capture and
//! reconstruction end to end.
//!
//! World transforms only compose translations; rotation and scale of
//! ancestors are ignored.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use clip_port::{
    AssetCatalog, AssetKind, NodeId, PortError, SceneGraph, TemplateAsset, TemplateKind,
    Transform, Vec3,
};

use crate::lookup::file_stem;

#[derive(Debug, Clone)]
struct MemoryNode {
    name: String,
    active: bool,
    transform: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    materials: Option<Vec<String>>,
    /// Nearest template-instance root this node belongs to.
    instance_root: Option<NodeId>,
    /// Topmost template-instance root this node belongs to.
    outermost: Option<NodeId>,
    /// Definition root, set on instance roots.
    source: Option<NodeId>,
}

impl MemoryNode {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            active: true,
            transform: Transform::IDENTITY,
            parent: None,
            children: Vec::new(),
            materials: None,
            instance_root: None,
            outermost: None,
            source: None,
        }
    }
}

/// In-memory scene graph with template support.
#[derive(Debug, Default)]
pub struct MemoryScene {
    nodes: BTreeMap<NodeId, MemoryNode>,
    next_id: u64,
    /// Template asset path -> definition root.
    templates: BTreeMap<String, NodeId>,
    /// Definition root -> asset it was registered under.
    definitions: HashMap<NodeId, TemplateAsset>,
    materials: BTreeSet<String>,
    creations: usize,
}

impl MemoryScene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, node: MemoryNode) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(id, node);
        id
    }

    fn attach(&mut self, node: NodeId, parent: Option<NodeId>) {
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.push(node);
            }
        }
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = parent;
        }
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.nodes.get(&node).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != node);
            }
        }
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = None;
        }
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut MemoryNode, PortError> {
        self.nodes.get_mut(&node).ok_or(PortError::UnknownNode(node))
    }

    /// Adds a plain node without counting it as an engine creation call.
    pub fn add_node(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = self.alloc(MemoryNode::named(name));
        self.attach(id, parent);
        id
    }

    /// Renames a node in place.
    pub fn rename(&mut self, node: NodeId, name: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.name = name.to_owned();
        }
    }

    /// Replaces the local transform of a node.
    pub fn set_transform(&mut self, node: NodeId, transform: Transform) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.transform = transform;
        }
    }

    /// Gives a node a rendering surface with the given material slots.
    pub fn set_renderer(&mut self, node: NodeId, materials: &[&str]) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.materials = Some(materials.iter().map(|m| (*m).to_owned()).collect());
        }
    }

    /// Declares the subtree at `definition_root` as the template stored at
    /// `path`. The subtree stays detached from the live scene.
    pub fn register_template(&mut self, path: &str, kind: TemplateKind, definition_root: NodeId) {
        self.templates.insert(path.to_owned(), definition_root);
        self.definitions.insert(
            definition_root,
            TemplateAsset {
                path: path.to_owned(),
                kind,
            },
        );
    }

    /// Declares a material asset so [`MemoryScene::catalog`] lists it.
    pub fn register_material(&mut self, path: &str) {
        self.materials.insert(path.to_owned());
    }

    /// Catalog listing every registered template and material.
    pub fn catalog(&self) -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        for asset in self.definitions.values() {
            catalog.add_template(&asset.path, asset.kind);
        }
        for material in &self.materials {
            catalog.add_material(material);
        }
        catalog
    }

    /// Number of `create_node`/`instantiate` calls served so far.
    pub fn creation_calls(&self) -> usize {
        self.creations
    }

    fn is_definition_node(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.definitions.contains_key(&n) {
                return true;
            }
            current = self.nodes.get(&n).and_then(|m| m.parent);
        }
        false
    }

    /// Parentless nodes that are not template definitions, by creation order.
    pub fn live_roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(id, n)| n.parent.is_none() && !self.is_definition_node(**id))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of nodes outside template definitions.
    pub fn live_node_count(&self) -> usize {
        self.nodes
            .keys()
            .filter(|id| !self.is_definition_node(**id))
            .count()
    }

    /// `true` while `node` exists.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Direct children of `node`.
    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// `node` and all its descendants in pre-order.
    pub fn preorder(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if let Some(m) = self.nodes.get(&n) {
                out.push(n);
                stack.extend(m.children.iter().rev());
            }
        }
        out
    }

    fn clone_definition(&mut self, definition_root: NodeId) -> NodeId {
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
        let mut root_clone = None;
        for def in self.preorder(definition_root) {
            let Some(src) = self.nodes.get(&def).cloned() else {
                continue;
            };
            let mut node = MemoryNode {
                children: Vec::new(),
                parent: None,
                source: None,
                ..src.clone()
            };
            let parent = if def == definition_root {
                None
            } else {
                src.parent.and_then(|p| mapping.get(&p).copied())
            };
            let id = self.alloc(node.clone());
            let outer = root_clone.unwrap_or(id);
            if def == definition_root {
                node.instance_root = Some(id);
                node.source = Some(definition_root);
            } else if src.instance_root == Some(def) {
                node.instance_root = Some(id);
                node.source = src.source;
            } else if let Some(nested) = src.instance_root.and_then(|r| mapping.get(&r)) {
                node.instance_root = Some(*nested);
            } else {
                node.instance_root = Some(outer);
            }
            node.outermost = Some(outer);
            self.nodes.insert(id, node);
            self.attach(id, parent);
            mapping.insert(def, id);
            root_clone.get_or_insert(id);
        }
        root_clone.unwrap_or(definition_root)
    }
}

impl SceneGraph for MemoryScene {
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.nodes.get(&node).map_or(0, |n| n.children.len())
    }

    fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.children.get(index).copied())
    }

    fn sibling_index(&self, node: NodeId) -> usize {
        self.parent(node)
            .and_then(|p| self.nodes.get(&p))
            .and_then(|p| p.children.iter().position(|c| *c == node))
            .unwrap_or(0)
    }

    fn name(&self, node: NodeId) -> String {
        self.nodes
            .get(&node)
            .map(|n| n.name.clone())
            .unwrap_or_default()
    }

    fn is_active(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.active)
    }

    fn local_transform(&self, node: NodeId) -> Transform {
        self.nodes
            .get(&node)
            .map_or(Transform::IDENTITY, |n| n.transform)
    }

    fn world_transform(&self, node: NodeId) -> Transform {
        let mut world = self.local_transform(node);
        let mut current = self.parent(node);
        while let Some(parent) = current {
            let p = self.local_transform(parent).position;
            world.position = Vec3::new(
                world.position.x + p.x,
                world.position.y + p.y,
                world.position.z + p.z,
            );
            current = self.parent(parent);
        }
        world
    }

    fn materials(&self, node: NodeId) -> Option<Vec<String>> {
        self.nodes.get(&node).and_then(|n| n.materials.clone())
    }

    fn is_template_instance_root(&self, node: NodeId) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|n| n.instance_root == Some(node))
    }

    fn outermost_instance_root(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.outermost)
    }

    fn is_part_of_template(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.outermost.is_some())
    }

    fn template_source(&self, instance_root: NodeId) -> Option<NodeId> {
        self.nodes.get(&instance_root).and_then(|n| n.source)
    }

    fn template_asset(&self, node: NodeId) -> Option<TemplateAsset> {
        let root = self.nodes.get(&node)?.instance_root?;
        let source = self.nodes.get(&root)?.source?;
        self.definitions.get(&source).cloned()
    }

    fn create_node(&mut self, name: &str) -> NodeId {
        self.creations += 1;
        self.alloc(MemoryNode::named(name))
    }

    fn instantiate(&mut self, asset_path: &str) -> Result<NodeId, PortError> {
        let definition = *self
            .templates
            .get(asset_path)
            .ok_or_else(|| PortError::Instantiate(asset_path.to_owned()))?;
        self.creations += 1;
        Ok(self.clone_definition(definition))
    }

    fn destroy(&mut self, node: NodeId) -> Result<(), PortError> {
        if !self.nodes.contains_key(&node) {
            return Err(PortError::UnknownNode(node));
        }
        self.detach(node);
        for doomed in self.preorder(node) {
            self.nodes.remove(&doomed);
        }
        Ok(())
    }

    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<(), PortError> {
        self.node_mut(node)?;
        if let Some(parent) = parent {
            self.node_mut(parent)?;
            let mut current = Some(parent);
            while let Some(c) = current {
                if c == node {
                    return Err(PortError::Cycle { node, parent });
                }
                current = self.parent(c);
            }
        }
        self.detach(node);
        self.attach(node, parent);
        Ok(())
    }

    fn set_active(&mut self, node: NodeId, active: bool) -> Result<(), PortError> {
        self.node_mut(node)?.active = active;
        Ok(())
    }

    fn set_name(&mut self, node: NodeId, name: &str) -> Result<(), PortError> {
        self.node_mut(node)?.name = name.to_owned();
        Ok(())
    }

    fn set_local_position(&mut self, node: NodeId, position: Vec3) -> Result<(), PortError> {
        self.node_mut(node)?.transform.position = position;
        Ok(())
    }

    fn set_local_rotation(&mut self, node: NodeId, euler_degrees: Vec3) -> Result<(), PortError> {
        self.node_mut(node)?.transform.rotation = euler_degrees;
        Ok(())
    }

    fn set_local_scale(&mut self, node: NodeId, scale: Vec3) -> Result<(), PortError> {
        self.node_mut(node)?.transform.scale = scale;
        Ok(())
    }

    fn set_material(
        &mut self,
        node: NodeId,
        slot: usize,
        asset_path: &str,
    ) -> Result<(), PortError> {
        let entry = self
            .node_mut(node)?
            .materials
            .as_mut()
            .ok_or(PortError::NoRenderingSurface(node))?;
        let target = entry
            .get_mut(slot)
            .ok_or(PortError::SlotOutOfRange { node, slot })?;
        *target = asset_path.to_owned();
        Ok(())
    }
}

/// In-memory asset catalog.
///
/// Name queries match any asset whose file stem contains the query, ignoring
/// ASCII case, mirroring the fuzzy search of real asset databases.
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    assets: Vec<(String, AssetKind, Option<TemplateKind>)>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists a template asset.
    pub fn add_template(&mut self, path: &str, kind: TemplateKind) {
        self.assets
            .push((path.to_owned(), AssetKind::Template, Some(kind)));
    }

    /// Lists a material asset.
    pub fn add_material(&mut self, path: &str) {
        self.assets.push((path.to_owned(), AssetKind::Material, None));
    }
}

impl AssetCatalog for MemoryCatalog {
    fn find_assets(&self, name_query: &str, kind: AssetKind) -> Vec<String> {
        let query = name_query.to_ascii_lowercase();
        self.assets
            .iter()
            .filter(|(path, k, _)| {
                *k == kind && file_stem(path).to_ascii_lowercase().contains(&query)
            })
            .map(|(path, _, _)| path.clone())
            .collect()
    }

    fn template_kind(&self, path: &str) -> Option<TemplateKind> {
        self.assets
            .iter()
            .find(|(p, _, _)| p == path)
            .and_then(|(_, _, kind)| *kind)
    }
}
