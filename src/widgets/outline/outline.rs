//! Outline panel state and actions.
//!
//! `OutlineState` is the per-panel view state the host persists between
//! sessions: which nodes are expanded, keyed by id. Rows and interaction
//! state are runtime-only and rebuilt on every reload.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::event_bus::{BoxedEvent, Event};
use crate::entities::{NodeId, Template};

use super::tree_model::{Row, build_rows};

/// Inline-edit state machine of the panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Idle,
    /// A rename editor is open on this row
    Renaming {
        id: NodeId,
    },
}

/// View state of one outline panel.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OutlineState {
    /// Expand/collapse state keyed by node id (persisted by the host).
    /// Stale ids are harmless; the row builder just never asks about them.
    pub expanded: HashSet<NodeId>,

    /// Visible rows, rebuilt by [`reload`](Self::reload) (runtime-only)
    #[serde(skip)]
    pub rows: Vec<Row>,

    /// Row the user interacted with last; arms the rename-on-second-click
    #[serde(skip)]
    pub last_clicked: Option<NodeId>,

    #[serde(skip)]
    pub edit: EditMode,
}

impl OutlineState {
    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn set_expanded(&mut self, id: NodeId, on: bool) {
        if on {
            self.expanded.insert(id);
        } else {
            self.expanded.remove(&id);
        }
    }

    /// Flip one node's expansion; returns the new state.
    pub fn toggle_expanded(&mut self, id: NodeId) -> bool {
        let on = !self.is_expanded(id);
        self.set_expanded(id, on);
        on
    }

    /// Rebuild the visible rows and drop interaction state that no longer
    /// points at a live node.
    pub fn reload(&mut self, template: Option<&Template>) {
        self.rows = build_rows(template, &self.expanded);
        let alive = |id: NodeId| template.is_some_and(|t| t.contains(id));
        if self.last_clicked.is_some_and(|id| !alive(id)) {
            self.last_clicked = None;
        }
        if let EditMode::Renaming { id } = self.edit
            && !alive(id)
        {
            self.edit = EditMode::Idle;
        }
    }

    pub fn row_of(&self, id: NodeId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn cancel_rename(&mut self) {
        self.edit = EditMode::Idle;
    }
}

/// Outline panel result - all actions travel as events.
#[derive(Default)]
pub struct OutlineActions {
    pub hovered: bool,
    pub events: Vec<BoxedEvent>,
}

impl OutlineActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an event to be dispatched by the main loop.
    pub fn send<E: Event>(&mut self, event: E) {
        self.events.push(Box::new(event));
    }
}
