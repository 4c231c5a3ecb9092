//! Node: a named entry in a template's strict tree.
//!
//! Nodes never own their children directly - the [`Template`](super::Template)
//! arena owns every node and the tree shape is expressed through id links
//! (`parent` up, `children` down, sibling order meaningful). This keeps deep
//! copies, traversals and structural edits free of reference cycles.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque node identifier.
///
/// Stable for the lifetime of the node within a session; never assume it
/// survives a host restart. Ids of deleted nodes go stale and resolve to
/// nothing rather than being reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Mint a brand-new id.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single entry in the hierarchy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    /// Stable identifier inside the owning template
    pub id: NodeId,

    /// Display name shown in the outline row
    pub name: String,

    /// Enabled flag; an inactive node dims itself and its whole subtree
    #[serde(default = "default_active")]
    pub active: bool,

    /// Up-link; `None` only for the template root (weak - not owning)
    pub parent: Option<NodeId>,

    /// Ordered down-links; sibling index is meaningful for reorder
    #[serde(default)]
    pub children: Vec<NodeId>,
}

fn default_active() -> bool {
    true
}

impl Node {
    /// Detached node with a fresh id and no links.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::fresh(),
            name: name.into(),
            active: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}
