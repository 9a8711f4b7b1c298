// src/package.rs

use crate::model::TypeElement;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// Handle of a node inside one `PackageTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackageId(usize);

impl PackageId {
    pub const ROOT: PackageId = PackageId(0);
}

#[derive(Debug, Clone)]
pub struct PackageNode {
    name: String,
    path: Vec<String>,
    children: BTreeMap<String, PackageId>,
    /// keyed by type name; re-attaching replaces in place
    types: IndexMap<String, TypeElement>,
}

impl PackageNode {
    fn new(name: String, path: Vec<String>) -> Self {
        PackageNode {
            name,
            path,
            children: BTreeMap::new(),
            types: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn qualified_name(&self) -> String {
        self.path.join(".")
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, PackageId)> {
        self.children.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeElement> {
        self.types.values()
    }
}

/// Package hierarchy of one model. The root node is the default package.
#[derive(Debug, Clone)]
pub struct PackageTree {
    nodes: Vec<PackageNode>,
}

impl Default for PackageTree {
    fn default() -> Self {
        Self::new()
    }
}

fn segments(dotted: &str) -> impl Iterator<Item = &str> {
    dotted.split('.').map(str::trim).filter(|s| !s.is_empty())
}

impl PackageTree {
    pub fn new() -> Self {
        PackageTree {
            nodes: vec![PackageNode::new(String::new(), Vec::new())],
        }
    }

    pub fn root(&self) -> PackageId {
        PackageId::ROOT
    }

    pub fn node(&self, id: PackageId) -> &PackageNode {
        &self.nodes[id.0]
    }

    /// Walks `dotted` segment by segment, creating missing nodes. The same
    /// path always resolves to the same node; `""` is the root.
    pub fn get_or_create(&mut self, dotted: &str) -> PackageId {
        let mut current = PackageId::ROOT;
        for segment in segments(dotted) {
            current = match self.nodes[current.0].children.get(segment) {
                Some(child) => *child,
                None => {
                    let child = PackageId(self.nodes.len());
                    let mut path = self.nodes[current.0].path.clone();
                    path.push(segment.to_string());
                    self.nodes.push(PackageNode::new(segment.to_string(), path));
                    self.nodes[current.0].children.insert(segment.to_string(), child);
                    child
                }
            };
        }
        current
    }

    /// Lookup without creating anything.
    pub fn find(&self, dotted: &str) -> Option<PackageId> {
        let mut current = PackageId::ROOT;
        for segment in segments(dotted) {
            current = *self.nodes[current.0].children.get(segment)?;
        }
        Some(current)
    }

    /// Adds `element` to the node. An element with the same name already
    /// there is replaced and returned.
    pub fn attach(&mut self, id: PackageId, element: TypeElement) -> Option<TypeElement> {
        self.nodes[id.0].types.insert(element.name.clone(), element)
    }

    /// Attaches `element` under its own package.
    pub fn insert(&mut self, element: TypeElement) -> Option<TypeElement> {
        let id = self.get_or_create(&element.package);
        self.attach(id, element)
    }

    fn depth_first(&self) -> Vec<PackageId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![PackageId::ROOT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.values().rev().copied());
        }
        order
    }

    /// Every type, packages visited depth first with children by name.
    pub fn types(&self) -> Vec<&TypeElement> {
        self.depth_first()
            .into_iter()
            .flat_map(|id| self.nodes[id.0].types.values())
            .collect()
    }

    pub fn into_types(mut self) -> Vec<TypeElement> {
        let order = self.depth_first();
        let mut result = Vec::new();
        for id in order {
            let types = std::mem::take(&mut self.nodes[id.0].types);
            result.extend(types.into_values());
        }
        result
    }

    pub fn package_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of attached types
    pub fn len(&self) -> usize {
        self.nodes.iter().map(|n| n.types.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> PackageSnapshot {
        self.snapshot_of(PackageId::ROOT)
    }

    fn snapshot_of(&self, id: PackageId) -> PackageSnapshot {
        let node = &self.nodes[id.0];
        PackageSnapshot {
            name: node.name.clone(),
            path: node.qualified_name(),
            types: node.types.values().cloned().collect(),
            packages: node.children.values().map(|child| self.snapshot_of(*child)).collect(),
        }
    }
}

/// Owned, nested copy of a `PackageTree` for output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSnapshot {
    pub name: String,
    pub path: String,
    pub types: Vec<TypeElement>,
    pub packages: Vec<PackageSnapshot>,
}
