//! Outline panel events - everything the panel can ask the editor to do.

use crate::entities::{NodeId, Template};

use super::controller::ClickButton;
use super::dnd::{DragItem, DropPosition};

// === Template lifecycle ===

/// Target a (new) template; replaces whatever was being edited.
#[derive(Clone, Debug)]
pub struct SetTemplateEvent(pub Template);

#[derive(Clone, Debug)]
pub struct ClearTemplateEvent;

// === Row interaction ===

#[derive(Clone, Debug)]
pub struct RowClickedEvent {
    pub id: NodeId,
    pub button: ClickButton,
}

#[derive(Clone, Debug)]
pub struct ExpandToggledEvent(pub NodeId);

/// Host-side selection changed; the editor mirrors it.
#[derive(Clone, Debug)]
pub struct SelectionChangedEvent(pub Vec<NodeId>);

// === Structural edits ===

/// "Create Empty" on the context menu: add a child under this node.
#[derive(Clone, Debug)]
pub struct CreateChildEvent(pub NodeId);

/// "Delete" on the context menu: remove the current selection.
#[derive(Clone, Debug)]
pub struct DeleteSelectedEvent;

/// Inline rename editor closed with a new name.
#[derive(Clone, Debug)]
pub struct RenameCommittedEvent {
    pub id: NodeId,
    pub name: String,
}

/// A drag gesture completed over the outline.
#[derive(Clone, Debug)]
pub struct DropEvent {
    pub items: Vec<DragItem>,
    pub position: DropPosition,
}

// === Notifications (editor -> host) ===

/// A transaction was committed; rows and selection are already updated.
#[derive(Clone, Debug)]
pub struct TemplateCommittedEvent {
    pub root: NodeId,
}
