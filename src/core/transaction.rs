//! Working-copy transactions: one structural edit, all-or-nothing.
//!
//! Every structural mutation (create child, delete selection, reparent /
//! reorder) runs against a disposable working instance, never against the
//! canonical template:
//!
//! 1. [`Transaction::begin`] instantiates a detached fresh-id copy and zips
//!    the two pre-order traversals into a [`CorrespondenceMap`].
//! 2. The caller mutates nodes reached through the map, on the working copy.
//! 3. [`Transaction::commit`] writes the working copy's content back as the
//!    new template and triggers the durable save; dropping the transaction
//!    instead (or calling [`Transaction::abort`]) leaves the template
//!    bit-identical to before `begin`.
//!
//! Commit re-uses the template-side id for every working-copy node that has
//! a counterpart, so ids of surviving nodes stay stable across edits; nodes
//! created inside the transaction keep their fresh ids and gain a
//! counterpart only when the next transaction rebuilds the map from the
//! committed template.

use anyhow::{Context, Result, anyhow};
use indexmap::IndexMap;
use log::{debug, info};
use std::collections::HashMap;

use crate::core::host::{Instantiator, PersistenceService};
use crate::entities::{Node, NodeId, Template};

/// Traversal-order bijection between template and working-instance ids.
///
/// Valid only while both trees keep the shape they had at construction
/// time; a lookup miss after the edit mutated the instance means "skip this
/// node", never a fault.
#[derive(Debug, Default)]
pub struct CorrespondenceMap {
    to_instance: HashMap<NodeId, NodeId>,
    to_template: HashMap<NodeId, NodeId>,
}

impl CorrespondenceMap {
    /// Pair the i-th node of one pre-order walk with the i-th of the other.
    /// Both trees must have structurally identical shape.
    pub fn build(template: &Template, instance: &Template) -> Result<Self> {
        if template.shape() != instance.shape() {
            return Err(anyhow!(
                "correspondence requires identical tree shapes ({} vs {} nodes)",
                template.node_count(),
                instance.node_count()
            ));
        }
        let mut map = Self::default();
        for (t, i) in template.pre_order().into_iter().zip(instance.pre_order()) {
            map.to_instance.insert(t, i);
            map.to_template.insert(i, t);
        }
        Ok(map)
    }

    /// Working-instance counterpart of a template node.
    pub fn instance_of(&self, template_id: NodeId) -> Option<NodeId> {
        self.to_instance.get(&template_id).copied()
    }

    /// Template counterpart of a working-instance node.
    pub fn template_of(&self, instance_id: NodeId) -> Option<NodeId> {
        self.to_template.get(&instance_id).copied()
    }

    pub fn len(&self) -> usize {
        self.to_instance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_instance.is_empty()
    }
}

/// One in-flight structural edit. Exactly one of commit/abort happens per
/// begin; both consume the transaction, and plain drop counts as abort.
pub struct Transaction {
    instance: Template,
    map: CorrespondenceMap,
}

impl Transaction {
    /// Instantiate a working copy of `template` and build the map.
    pub fn begin(template: &Template, instantiator: &dyn Instantiator) -> Result<Self> {
        let instance = instantiator
            .instantiate(template)
            .context("instantiating working copy")?;
        let map = CorrespondenceMap::build(template, &instance)
            .context("pairing working copy with template")?;
        debug!("transaction begun: {} paired nodes", map.len());
        Ok(Self { instance, map })
    }

    /// The working copy. Mutations go here, never to the template.
    pub fn instance(&self) -> &Template {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut Template {
        &mut self.instance
    }

    /// Working-copy counterpart of a template node (None = skip it).
    pub fn instance_of(&self, template_id: NodeId) -> Option<NodeId> {
        self.map.instance_of(template_id)
    }

    /// Template counterpart of a working-copy node. Nodes created during
    /// this transaction have none.
    pub fn template_of(&self, instance_id: NodeId) -> Option<NodeId> {
        self.map.template_of(instance_id)
    }

    /// Final id a working-copy node will carry after commit: its stable
    /// template id when it has a counterpart, its own fresh id otherwise.
    pub fn committed_id(&self, instance_id: NodeId) -> NodeId {
        self.map.template_of(instance_id).unwrap_or(instance_id)
    }

    /// Replace the template's durable content with the working copy's and
    /// save. Returns the (stable) root id of the new content.
    pub fn commit(
        self,
        template: &mut Template,
        persistence: &mut dyn PersistenceService,
    ) -> Result<NodeId> {
        let order = self.instance.pre_order();
        let mut nodes: IndexMap<NodeId, Node> = IndexMap::with_capacity(order.len());
        for iid in &order {
            let Some(src) = self.instance.get(*iid) else { continue };
            let id = self.committed_id(*iid);
            nodes.insert(
                id,
                Node {
                    id,
                    name: src.name.clone(),
                    active: src.active,
                    parent: src.parent.map(|p| self.committed_id(p)),
                    children: src.children.iter().map(|c| self.committed_id(*c)).collect(),
                },
            );
        }
        let root = self.committed_id(self.instance.root());
        template.replace_content(root, nodes);
        info!("transaction committed: {} nodes", template.node_count());
        persistence
            .save_template(template)
            .context("persisting committed template")?;
        Ok(root)
    }

    /// Discard the working copy; the template is untouched.
    pub fn abort(self) {
        debug!("transaction aborted: {} working nodes discarded", self.instance.node_count());
        // Working instance and map drop here.
    }
}
