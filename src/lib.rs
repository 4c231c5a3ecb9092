//! OUTLINER - prefab hierarchy editing core
//!
//! A host-agnostic engine for editing the node hierarchy of a reusable
//! prefab template: it projects the hierarchy into tree-view rows (with
//! lazy expansion), interprets clicks, context menus, renames and
//! drag-and-drop gestures, and applies every structural edit through a
//! working-copy transaction so the canonical template is only ever replaced
//! wholesale or left untouched.
//!
//! The host environment supplies the pixels and the durable storage: it
//! renders [`Row`]s however it likes, feeds decoded pointer events back in
//! as events, and implements the collaborator traits in [`core::host`].

// Core engine (editor, transactions, events, host seams)
pub mod core;

// App modules
pub mod config;
pub mod entities;
pub mod widgets;

// Re-export commonly used types from core
pub use crate::core::editor::{EventOutcome, TemplateEditor};
pub use crate::core::event_bus::{BoxedEvent, EventBus, EventEmitter, downcast_event};
pub use crate::core::host::{
    CloneInstantiator, Instantiator, MemorySelection, NullPersistence, PersistenceService,
    SelectionHost,
};
pub use crate::core::transaction::{CorrespondenceMap, Transaction};

// Re-export entities
pub use crate::entities::{Node, NodeId, Resolver, Template};

// Re-export the outline panel surface
pub use crate::widgets::outline::{
    ClickButton, ClickOutcome, ContextMenuEntry, DragItem, DropPosition, DropRejection,
    DropResult, EditMode, OutlineActions, OutlineState, Row, RowChildren, build_rows,
};
