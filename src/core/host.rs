//! Host collaborator traits.
//!
//! The editor core is embedded in a larger environment that owns user
//! selection, durable persistence and runtime instantiation. Those seams are
//! traits here; the in-memory implementations below back the tests and any
//! host that has no opinion of its own.

use anyhow::Result;

use crate::entities::{NodeId, Template};

/// Current user selection: a set of selected ids plus one active node.
///
/// The core reads it to seed the view and writes it back after structural
/// edits so host selection stays consistent with the new tree.
pub trait SelectionHost {
    fn selection(&self) -> Vec<NodeId>;
    fn active(&self) -> Option<NodeId>;
    /// Replace the selection; the last id becomes the active node.
    fn set_selection(&mut self, ids: Vec<NodeId>);
}

/// Plain in-memory selection store.
#[derive(Debug, Default)]
pub struct MemorySelection {
    selection: Vec<NodeId>,
    active: Option<NodeId>,
}

impl SelectionHost for MemorySelection {
    fn selection(&self) -> Vec<NodeId> {
        self.selection.clone()
    }

    fn active(&self) -> Option<NodeId> {
        self.active
    }

    fn set_selection(&mut self, ids: Vec<NodeId>) {
        self.active = ids.last().copied();
        self.selection = ids;
    }
}

/// Durable save hooks, invoked after a committed transaction and after a
/// rename. The host owns the format; the core only guarantees the calls.
pub trait PersistenceService {
    fn save_template(&mut self, template: &Template) -> Result<()>;
    fn save_node(&mut self, template: &Template, id: NodeId) -> Result<()>;
}

/// No-op persistence that counts invocations (tests assert on the counts).
#[derive(Debug, Default)]
pub struct NullPersistence {
    pub template_saves: usize,
    pub node_saves: usize,
}

impl PersistenceService for NullPersistence {
    fn save_template(&mut self, _template: &Template) -> Result<()> {
        self.template_saves += 1;
        Ok(())
    }

    fn save_node(&mut self, _template: &Template, _id: NodeId) -> Result<()> {
        self.node_saves += 1;
        Ok(())
    }
}

/// Runtime instantiation: detached, fully independent copies of a template.
///
/// Used both for transaction working copies and for foreign templates
/// dragged in from outside (the source object is never relocated).
pub trait Instantiator {
    fn instantiate(&self, template: &Template) -> Result<Template>;
}

/// Default instantiator: fresh-id deep copy.
#[derive(Debug, Default)]
pub struct CloneInstantiator;

impl Instantiator for CloneInstantiator {
    fn instantiate(&self, template: &Template) -> Result<Template> {
        Ok(template.instantiate())
    }
}
