//! Resolver: opaque-id lookups against a live template.
//!
//! The host hands rows and selection around as bare [`NodeId`]s; this is the
//! one place those ids turn back into live nodes. A stale id (node deleted,
//! template switched) resolves to `None` and callers drop the entry silently
//! instead of faulting.

use super::node::{Node, NodeId};
use super::template::Template;

/// Borrowing view over one template's node table.
pub struct Resolver<'a> {
    template: &'a Template,
}

impl<'a> Resolver<'a> {
    pub fn new(template: &'a Template) -> Self {
        Self { template }
    }

    /// Live node for `id`, or `None` once the id has gone stale.
    pub fn resolve(&self, id: NodeId) -> Option<&'a Node> {
        self.template.get(id)
    }

    /// Ancestor chain of `id`, nearest parent first, root last.
    /// The node itself is excluded. Stale ids yield an empty chain.
    pub fn ancestors_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.resolve(id).and_then(|n| n.parent);
        while let Some(current) = cursor {
            out.push(current);
            cursor = self.resolve(current).and_then(|n| n.parent);
        }
        out
    }

    /// Every node of `id`'s subtree (itself included) that has at least one
    /// child, in pre-order. The tree view uses this to know which rows are
    /// expandable without materializing collapsed branches.
    pub fn subtree_roots_with_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.resolve(current) else { continue };
            if node.has_children() {
                out.push(current);
            }
            for child in node.children.iter().rev() {
                stack.push(*child);
            }
        }
        out
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

    #[test]
    fn test_resolve_live_and_stale() {
        let (mut t, a, _, a1) = sample();
        assert_eq!(Resolver::new(&t).resolve(a1).unwrap().name, "A1");
        t.remove_subtree(a).unwrap();
        let r = Resolver::new(&t);
        assert!(r.resolve(a).is_none());
        assert!(r.resolve(a1).is_none());
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let (t, a, _, a1) = sample();
        let r = Resolver::new(&t);
        assert_eq!(r.ancestors_of(a1), vec![a, t.root()]);
        assert_eq!(r.ancestors_of(t.root()), vec![]);
    }

    #[test]
    fn test_subtree_roots_with_children_skips_leaves() {
        let (t, a, b, a1) = sample();
        let r = Resolver::new(&t);
        let roots = r.subtree_roots_with_children(t.root());
        assert_eq!(roots, vec![t.root(), a]);
        assert!(!roots.contains(&b));
        assert!(!roots.contains(&a1));
        // Leaf subtree has no expandable rows at all
        assert!(r.subtree_roots_with_children(b).is_empty());
    }
}
