//! Tree model builder - visible rows projected from a template.
//!
//! Rows are rebuilt from scratch after every structural mutation and every
//! expand/collapse toggle; nothing here is cached across calls. Collapsed
//! branches are not walked at all: the row just carries a sentinel saying
//! "children exist but were not materialized", which is what lets huge
//! hierarchies open lazily.

use std::collections::HashSet;

use crate::entities::{NodeId, Template};

/// Down-links of a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowChildren {
    /// Leaf node
    None,
    /// Children exist but the row is collapsed; none were materialized
    Collapsed,
    /// Expanded: indices into the row list, in sibling order
    Expanded(Vec<usize>),
}

/// Visual projection of one node. Never persisted; valid only until the
/// next rebuild.
#[derive(Clone, Debug)]
pub struct Row {
    pub id: NodeId,
    pub name: String,
    /// Root row is depth 0; recomputed from the parent links after the walk
    pub depth: usize,
    /// Index of the parent row, `None` for the root row
    pub parent: Option<usize>,
    pub children: RowChildren,
    /// False when this node or any ancestor is inactive (rows render dimmed)
    pub effective_active: bool,
}

impl Row {
    pub fn has_children(&self) -> bool {
        self.children != RowChildren::None
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self.children, RowChildren::Expanded(_))
    }
}

/// Materialize the visible rows of `template`.
///
/// Depth-first pre-order from the root; a node's children are walked only
/// when it is marked expanded. Returns an empty list when no template is
/// being edited.
pub fn build_rows(template: Option<&Template>, expanded: &HashSet<NodeId>) -> Vec<Row> {
    let Some(template) = template else {
        return Vec::new();
    };
    let mut rows = Vec::with_capacity(template.node_count().min(200));
    add_rows_recursive(template, expanded, template.root(), None, &mut rows);
    assign_depths(&mut rows);
    rows
}

fn add_rows_recursive(
    template: &Template,
    expanded: &HashSet<NodeId>,
    id: NodeId,
    parent_row: Option<usize>,
    rows: &mut Vec<Row>,
) {
    let Some(node) = template.get(id) else { return };
    let row_index = rows.len();
    rows.push(Row {
        id,
        name: node.name.clone(),
        depth: 0,
        parent: parent_row,
        children: RowChildren::None,
        effective_active: node.active,
    });

    if !node.has_children() {
        return;
    }
    if expanded.contains(&id) {
        let children = node.children.clone();
        let mut child_indices = Vec::with_capacity(children.len());
        for child in children {
            child_indices.push(rows.len());
            add_rows_recursive(template, expanded, child, Some(row_index), rows);
        }
        rows[row_index].children = RowChildren::Expanded(child_indices);
    } else {
        rows[row_index].children = RowChildren::Collapsed;
    }
}

/// Second pass: depths and inherited active flags from the parent links.
/// Parents always precede children in the row list, so one forward sweep
/// suffices.
fn assign_depths(rows: &mut [Row]) {
    for i in 0..rows.len() {
        let (depth, parent_active) = match rows[i].parent {
            Some(p) => (rows[p].depth + 1, rows[p].effective_active),
            None => (0, true),
        };
        rows[i].depth = depth;
        rows[i].effective_active = rows[i].effective_active && parent_active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Template, NodeId, NodeId, NodeId) {
        let mut t = Template::new("Root");
        let a = t.create_child(t.root(), "A").unwrap();
        let b = t.create_child(t.root(), "B").unwrap();
        let a1 = t.create_child(a, "A1").unwrap();
        (t, a, b, a1)
    }

    fn names(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_no_template_no_rows() {
        assert!(build_rows(None, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_collapsed_root_is_single_sentinel_row() {
        let (t, ..) = sample();
        let rows = build_rows(Some(&t), &HashSet::new());
        assert_eq!(names(&rows), ["Root"]);
        assert_eq!(rows[0].children, RowChildren::Collapsed);
        assert_eq!(rows[0].depth, 0);
    }

    #[test]
    fn test_collapsed_rows_never_include_descendants() {
        let (t, a, ..) = sample();
        // Root expanded, A collapsed: A1 must not appear
        let mut expanded = HashSet::new();
        expanded.insert(t.root());
        let rows = build_rows(Some(&t), &expanded);
        assert_eq!(names(&rows), ["Root", "A", "B"]);
        let row_a = rows.iter().find(|r| r.id == a).unwrap();
        assert_eq!(row_a.children, RowChildren::Collapsed);
    }

    #[test]
    fn test_fully_expanded_pre_order_and_depths() {
        let (t, a, b, a1) = sample();
        let expanded: HashSet<NodeId> = [t.root(), a, b, a1].into_iter().collect();
        let rows = build_rows(Some(&t), &expanded);
        assert_eq!(names(&rows), ["Root", "A", "A1", "B"]);
        let depths: Vec<usize> = rows.iter().map(|r| r.depth).collect();
        assert_eq!(depths, [0, 1, 2, 1]);
        // Parent/child links are consistent
        let row_a = &rows[1];
        assert_eq!(row_a.parent, Some(0));
        assert_eq!(row_a.children, RowChildren::Expanded(vec![2]));
        // Leaves carry no sentinel
        assert_eq!(rows[2].children, RowChildren::None);
    }

    #[test]
    fn test_effective_active_inherits_from_ancestors() {
        let (mut t, a, b, a1) = sample();
        t.get_mut(a).unwrap().active = false;
        let expanded: HashSet<NodeId> = [t.root(), a].into_iter().collect();
        let rows = build_rows(Some(&t), &expanded);
        let by_id = |id: NodeId| rows.iter().find(|r| r.id == id).unwrap();
        assert!(by_id(t.root()).effective_active);
        assert!(!by_id(a).effective_active);
        // A1 is active itself but dimmed through A
        assert!(!by_id(a1).effective_active);
        assert!(by_id(b).effective_active);
    }

    #[test]
    fn test_expansion_of_unknown_ids_is_harmless() {
        let (t, ..) = sample();
        let mut expanded = HashSet::new();
        expanded.insert(NodeId::fresh()); // stale entry from an older template
        let rows = build_rows(Some(&t), &expanded);
        assert_eq!(names(&rows), ["Root"]);
    }
}
