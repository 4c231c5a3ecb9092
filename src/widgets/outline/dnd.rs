//! Drag-and-drop reparent engine.
//!
//! Pure decision logic: payload screening, cycle/self-parent validation,
//! descendant deduplication and insert-index arithmetic. The actual
//! mutation is orchestrated by `TemplateEditor::perform_drop`, which runs
//! these checks against the transaction's working copy.

use std::collections::HashSet;
use std::fmt;

use crate::entities::{NodeId, Resolver, Template};

/// One dragged thing, as decoded by the host's drag layer.
#[derive(Clone, Debug)]
pub enum DragItem {
    /// A row of this outline
    Node(NodeId),
    /// A node-like object from outside this template (a foreign template or
    /// a detached subtree); a fresh runtime copy gets attached, the dragged
    /// source is never relocated
    Template(Template),
    /// Anything else the host hands over; poisons the whole drop
    Opaque,
}

/// Where the pointer was released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropPosition {
    /// Onto a row: reparent under it, appended
    OnItem(NodeId),
    /// Into the gap between rows: insert under `parent` (`None` = template
    /// root) at the explicit sibling index
    BetweenItems { parent: Option<NodeId>, index: usize },
    /// Below the last row: reparent under the template root, appended
    OutsideItems,
}

/// Why a drop was refused. Always a visual no-op, never a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropRejection {
    /// A dragged node was dropped onto itself
    SelfParent(NodeId),
    /// The target parent sits inside a dragged subtree
    WouldCycle(NodeId),
    /// The payload contained something that is not node-like
    ForeignPayload,
}

impl fmt::Display for DropRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfParent(id) => write!(f, "cannot parent node {id} to itself"),
            Self::WouldCycle(id) => write!(f, "cannot move node {id} under its own subtree"),
            Self::ForeignPayload => write!(f, "dragged payload is not node-like"),
        }
    }
}

/// Outcome of a completed drop gesture.
#[derive(Clone, Debug)]
pub enum DropResult {
    /// Committed; `selected` holds the moved nodes' ids in the new tree
    Applied { selected: Vec<NodeId> },
    /// Refused; the template is untouched
    Rejected(DropRejection),
}

/// A drag may only start when every picked-up row still resolves.
pub fn can_start_drag(resolver: &Resolver<'_>, ids: &[NodeId]) -> bool {
    !ids.is_empty() && ids.iter().all(|id| resolver.resolve(*id).is_some())
}

/// False when any payload entry is not node-like; the whole drop is then
/// rejected, nothing partially applied.
pub fn payload_is_node_like(items: &[DragItem]) -> bool {
    !items.is_empty() && !items.iter().any(|i| matches!(i, DragItem::Opaque))
}

/// Stable-sort ids into the order their rows appear in the tree
/// (pre-order). Multi-selections drag in visual order, not click order.
pub fn sort_in_row_order(template: &Template, ids: &mut [NodeId]) {
    let order = template.pre_order();
    let position = |id: &NodeId| order.iter().position(|o| o == id).unwrap_or(usize::MAX);
    ids.sort_by_key(position);
}

/// Check every moved node `D` against the candidate parent `P`:
/// rejects `D == P` and "P is a descendant of D" (walking P's ancestor
/// chain looking for D). `parent == None` is always valid.
pub fn validate_reparent(
    tree: &Template,
    parent: Option<NodeId>,
    moved: &[NodeId],
) -> Result<(), DropRejection> {
    let Some(parent) = parent else {
        return Ok(());
    };
    for d in moved {
        if *d == parent {
            return Err(DropRejection::SelfParent(*d));
        }
        if tree.is_ancestor_of(*d, parent) {
            return Err(DropRejection::WouldCycle(*d));
        }
    }
    Ok(())
}

/// Drop every item that is a descendant of another item in the same set,
/// so a subtree is never moved twice through its own parent.
pub fn deduplicate(tree: &Template, items: Vec<NodeId>) -> Vec<NodeId> {
    let set: HashSet<NodeId> = items.iter().copied().collect();
    items
        .into_iter()
        .filter(|id| {
            let mut cursor = tree.get(*id).and_then(|n| n.parent);
            while let Some(current) = cursor {
                if set.contains(&current) {
                    return false;
                }
                cursor = tree.get(current).and_then(|n| n.parent);
            }
            true
        })
        .collect()
}

/// Compensate for remove-then-reinsert: when `node` already sits under
/// `parent` at a sibling position before `index`, its removal shifts the
/// later siblings left, so the target index comes down by one.
pub fn adjusted_insert_index(
    tree: &Template,
    parent: NodeId,
    node: NodeId,
    index: usize,
) -> usize {
    if tree.get(node).and_then(|n| n.parent) == Some(parent)
        && tree.sibling_index(node).is_some_and(|k| k < index)
    {
        return index - 1;
    }
    index
}
