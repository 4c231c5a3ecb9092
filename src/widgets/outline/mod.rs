//! Outline panel - the tree view over a template, minus the pixels.
//!
//! Split the way every panel in this codebase is split: state + actions
//! (`outline`), the row model (`tree_model`), interaction logic
//! (`controller`, `dnd`) and the event structs (`outline_events`). The host
//! widget renders rows and feeds decoded pointer events back in.

pub mod controller;
pub mod dnd;
pub mod outline;
pub mod outline_events;
pub mod tree_model;

pub use controller::{ClickButton, ClickOutcome, ContextMenuEntry, context_menu_for, on_row_click};
pub use dnd::{DragItem, DropPosition, DropRejection, DropResult};
pub use outline::{EditMode, OutlineActions, OutlineState};
pub use tree_model::{Row, RowChildren, build_rows};
