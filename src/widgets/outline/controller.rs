//! Row interaction controller: selection, rename arming, context menus.
//!
//! Interprets already-decoded pointer events against the outline state.
//! The host renders whatever this decides (rename editor, menu entries);
//! the decisions themselves never touch the template - mutations go out as
//! events and run through a transaction.

use log::debug;

use crate::config::RENAME_CLICK_DELAY;
use crate::entities::{NodeId, Template};

use super::outline::{EditMode, OutlineState};

/// Decoded pointer button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickButton {
    Primary,
    Secondary,
}

/// Entries of the row context menu, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextMenuEntry {
    /// Add an empty child node under the clicked row
    CreateEmpty { parent: NodeId },
    /// Delete the current selection (only offered on non-root rows)
    DeleteSelected,
}

/// What the host should do after a click.
#[derive(Clone, Debug, PartialEq)]
pub enum ClickOutcome {
    /// Plain selection change (or a stale row; nothing to show)
    Selected,
    /// Second deliberate click on the active row: open the rename editor
    /// after `delay_secs` (filters double-clicks out)
    RenameRequested { id: NodeId, delay_secs: f32 },
    /// Secondary click: present these menu entries
    ContextMenu(Vec<ContextMenuEntry>),
}

/// Menu offered on a row: "Create Empty" always, "Delete" only when the
/// clicked node has a parent - the template root is not deletable.
pub fn context_menu_for(template: &Template, id: NodeId) -> Vec<ContextMenuEntry> {
    let mut entries = vec![ContextMenuEntry::CreateEmpty { parent: id }];
    if template.get(id).and_then(|n| n.parent).is_some() {
        entries.push(ContextMenuEntry::DeleteSelected);
    }
    entries
}

/// Interpret one row click.
///
/// First primary click on a row selects it; the second one (same row, still
/// idle) arms the inline rename. Secondary click opens the context menu and
/// also marks the row as last-clicked so menu actions know their target.
pub fn on_row_click(
    state: &mut OutlineState,
    template: Option<&Template>,
    id: NodeId,
    button: ClickButton,
) -> ClickOutcome {
    let Some(template) = template else {
        return ClickOutcome::Selected;
    };
    if !template.contains(id) {
        // Stale row reference; drop it silently
        debug!("click on stale row {id} ignored");
        return ClickOutcome::Selected;
    }

    let outcome = match button {
        ClickButton::Primary => {
            if state.last_clicked == Some(id) && state.edit == EditMode::Idle {
                state.edit = EditMode::Renaming { id };
                ClickOutcome::RenameRequested { id, delay_secs: RENAME_CLICK_DELAY }
            } else {
                ClickOutcome::Selected
            }
        }
        ClickButton::Secondary => ClickOutcome::ContextMenu(context_menu_for(template, id)),
    };
    state.last_clicked = Some(id);
    outcome
}
