//! Template: the canonical node hierarchy being edited.
//!
//! All nodes live in one id-keyed pool (`IndexMap` so iteration, logging and
//! serialization stay deterministic); the tree shape is carried by the id
//! links on each [`Node`]. Structural edits go through the methods here so
//! parent/children links never drift apart.
//!
//! A `Template` is also the shape of a *working instance*: a disposable
//! fresh-id deep copy produced by [`Template::instantiate`] that hosts one
//! mutation before being committed back or discarded (see
//! `core::transaction`).

use anyhow::{Result, anyhow};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::node::{Node, NodeId};

/// A prefab template: one root, a pool of nodes, strict tree invariants.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Template {
    root: NodeId,
    nodes: IndexMap<NodeId, Node>,
}

impl Template {
    /// New template holding a single root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = Node::new(root_name);
        let root_id = root.id;
        let mut nodes = IndexMap::new();
        nodes.insert(root_id, root);
        Self { root: root_id, nodes }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Sibling position of `id` under its parent, if it has one.
    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.get(id)?.parent?;
        self.get(parent)?.children.iter().position(|c| *c == id)
    }

    /// True when `ancestor` appears somewhere on `id`'s parent chain.
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = self.get(id).and_then(|n| n.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(current).and_then(|n| n.parent);
        }
        false
    }

    /// Depth-first pre-order walk from the root.
    ///
    /// Explicit stack, children left-to-right, identical order on every call.
    /// Detached subtrees (mid-transaction state) are not visited.
    pub fn pre_order(&self) -> Vec<NodeId> {
        self.pre_order_from(self.root)
    }

    /// Pre-order walk of the subtree rooted at `start` (inclusive).
    pub fn pre_order_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            out.push(id);
            for child in node.children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Child counts in pre-order; two templates with equal vectors have the
    /// same tree shape.
    pub fn shape(&self) -> Vec<usize> {
        self.pre_order()
            .iter()
            .filter_map(|id| self.get(*id))
            .map(|n| n.children.len())
            .collect()
    }

    /// Names in pre-order (handy for structure assertions).
    pub fn names_in_pre_order(&self) -> Vec<String> {
        self.pre_order()
            .iter()
            .filter_map(|id| self.get(*id))
            .map(|n| n.name.clone())
            .collect()
    }

    // === Structural edits ===

    /// Append a new child node under `parent`. Returns the new id.
    pub fn create_child(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        if !self.contains(parent) {
            return Err(anyhow!("parent node {parent} not found"));
        }
        let mut node = Node::new(name);
        node.parent = Some(parent);
        let id = node.id;
        self.nodes.insert(id, node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    /// Remove `id` and its whole subtree from the template.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(anyhow!("cannot remove the template root"));
        }
        if !self.contains(id) {
            return Err(anyhow!("node {id} not found"));
        }
        self.detach(id);
        for doomed in self.pre_order_from(id) {
            self.nodes.shift_remove(&doomed);
        }
        Ok(())
    }

    /// Move `id` under `new_parent`, appended after its existing children.
    ///
    /// Refuses the root, self-parenting, and any move that would put a node
    /// underneath its own subtree.
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> Result<()> {
        if id == self.root {
            return Err(anyhow!("cannot reparent the template root"));
        }
        if id == new_parent {
            return Err(anyhow!("cannot parent node {id} to itself"));
        }
        if !self.contains(id) || !self.contains(new_parent) {
            return Err(anyhow!("reparent endpoints must both be live nodes"));
        }
        if self.is_ancestor_of(id, new_parent) {
            return Err(anyhow!("reparenting {id} under its own descendant"));
        }
        self.detach(id);
        if let Some(p) = self.nodes.get_mut(&new_parent) {
            p.children.push(id);
        }
        if let Some(n) = self.nodes.get_mut(&id) {
            n.parent = Some(new_parent);
        }
        Ok(())
    }

    /// Reorder `id` to sibling position `index` under its current parent
    /// (clamped to the sibling count).
    pub fn set_sibling_index(&mut self, id: NodeId, index: usize) -> Result<()> {
        let parent = self
            .get(id)
            .and_then(|n| n.parent)
            .ok_or_else(|| anyhow!("node {id} has no parent to reorder under"))?;
        let children = &mut self
            .nodes
            .get_mut(&parent)
            .ok_or_else(|| anyhow!("parent node {parent} not found"))?
            .children;
        children.retain(|c| *c != id);
        let index = index.min(children.len());
        children.insert(index, id);
        Ok(())
    }

    /// Unlink `id` from its parent's child list (the node stays in the pool).
    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.get(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.nodes.get_mut(&id) {
            n.parent = None;
        }
    }

    /// Move every node of `other` into this pool as a detached subtree and
    /// return its root id.
    ///
    /// The adopted root has no parent until a later [`reparent`] attaches it;
    /// that transient state only exists inside a transaction's working copy.
    pub fn adopt_subtree(&mut self, other: Template) -> NodeId {
        let adopted_root = other.root;
        for (id, node) in other.nodes {
            self.nodes.insert(id, node);
        }
        adopted_root
    }

    /// Deep copy with fresh ids, preserving names, flags, structure and
    /// sibling order. This is the default runtime-instantiation behavior.
    pub fn instantiate(&self) -> Template {
        let order = self.pre_order();
        let mut id_map: IndexMap<NodeId, NodeId> = IndexMap::with_capacity(order.len());
        for id in &order {
            id_map.insert(*id, NodeId::fresh());
        }
        let mut nodes = IndexMap::with_capacity(order.len());
        for id in &order {
            let Some(src) = self.get(*id) else { continue };
            let Some(new_id) = id_map.get(id).copied() else { continue };
            nodes.insert(
                new_id,
                Node {
                    id: new_id,
                    name: src.name.clone(),
                    active: src.active,
                    parent: src.parent.and_then(|p| id_map.get(&p).copied()),
                    children: src.children.iter().filter_map(|c| id_map.get(c).copied()).collect(),
                },
            );
        }
        let root = id_map.get(&self.root).copied().unwrap_or(self.root);
        Template { root, nodes }
    }

    /// Generate a unique node name based on `base`.
    /// Strips a trailing `_N`, scans ALL names in the template, returns "base_N".
    pub fn unique_child_name(&self, base: &str) -> String {
        let base = {
            let trimmed = base.trim_end_matches(|c: char| c.is_ascii_digit());
            let trimmed = trimmed.trim_end_matches('_');
            if trimmed.is_empty() { "Node" } else { trimmed }
        };

        let mut max_num = 0u32;
        let mut bare_taken = false;
        for node in self.nodes.values() {
            if node.name == base {
                bare_taken = true;
            }
            if let Some(suffix) = node.name.strip_prefix(base) {
                let suffix = suffix.trim_start_matches('_');
                if let Ok(n) = suffix.parse::<u32>() {
                    max_num = max_num.max(n);
                }
            }
        }
        if !bare_taken && max_num == 0 {
            return base.to_string();
        }
        format!("{}_{}", base, max_num + 1)
    }

    /// Replace this template's content wholesale. Used by transaction commit.
    pub(crate) fn replace_content(&mut self, root: NodeId, nodes: IndexMap<NodeId, Node>) {
        self.root = root;
        self.nodes = nodes;
    }
}
