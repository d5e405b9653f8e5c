//! Document tree
//!
//! Arena-backed ordered tree. Nodes are addressed by [`NodeId`] handles into
//! the owning [`DocumentTree`]; a handle is only meaningful for the tree that
//! issued it. Removing a child is a list operation on the parent's child
//! handles: the detached slot stays in the arena but is no longer reachable
//! from the root, so traversal, queries and [`DocumentTree::deep_copy`] never
//! see it again.
//!
//! ## Queries
//!
//! ```
//! use doccheck_core::builder::build_document;
//! use doccheck_core::element::Heading;
//!
//! let tree = build_document("# Title\n\nBody\n\n## Next\n");
//! let h1 = tree.query().all().filter::<Heading>(|h| h.level == 1).first();
//! assert!(h1.is_some());
//! assert_eq!(tree.query().all().of_type::<Heading>().count(), 2);
//! ```

use std::fmt;

use serde::Serialize;

use crate::element::{Document, Element, ElementVariant};
use crate::source::{SourcePosition, SourceRange};

/// Handle to a node inside one [`DocumentTree`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct NodeSlot {
    element: Element,
    range: SourceRange,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A rooted, ordered document tree
#[derive(Debug)]
pub struct DocumentTree {
    nodes: Vec<NodeSlot>,
    root: NodeId,
}

impl DocumentTree {
    /// Create a tree holding only a [`Document`] root
    pub fn new(range: SourceRange) -> Self {
        Self::with_root(Element::Document(Document), range)
    }

    /// Create a tree with an arbitrary root element
    pub fn with_root(element: Element, range: SourceRange) -> Self {
        Self {
            nodes: vec![NodeSlot {
                element,
                range,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append a new node as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, element: Element, range: SourceRange) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeSlot {
            element,
            range,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Detach `child` from `parent`. Returns `false` (and changes nothing)
    /// when `child` is not currently a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(slot) = self.nodes.get_mut(parent.0) else {
            return false;
        };
        let Some(pos) = slot.children.iter().position(|c| *c == child) else {
            return false;
        };
        slot.children.remove(pos);
        self.nodes[child.0].parent = None;
        true
    }

    pub fn element(&self, id: NodeId) -> &Element {
        &self.nodes[id.0].element
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0].element
    }

    /// Grow a node's range so it ends at `end`
    pub(crate) fn extend_range(&mut self, id: NodeId, end: SourcePosition) {
        let range = &mut self.nodes[id.0].range;
        if end.offset > range.end.offset {
            range.end = end;
        }
    }

    /// Typed view of a node's payload
    pub fn get<V: ElementVariant>(&self, id: NodeId) -> Option<&V> {
        V::project(self.element(id))
    }

    pub fn range(&self, id: NodeId) -> SourceRange {
        self.nodes[id.0].range
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }

    /// Distance from the root; detached nodes report their depth within the
    /// detached subtree
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Number of nodes reachable from the root
    pub fn node_count(&self) -> usize {
        self.preorder(self.root).len()
    }

    /// Pre-order listing of `start` and its descendants
    pub fn preorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Start a query rooted at the document root
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder {
            tree: self,
            root: self.root,
        }
    }

    /// Independent copy holding only the nodes reachable from the root.
    /// Handles are re-issued in pre-order, so handles from `self` must not be
    /// used against the copy.
    pub fn deep_copy(&self) -> DocumentTree {
        let root_slot = &self.nodes[self.root.0];
        let mut copy = DocumentTree::with_root(root_slot.element.clone(), root_slot.range);
        let mut stack: Vec<(NodeId, NodeId)> = self
            .children(self.root)
            .iter()
            .rev()
            .map(|c| (*c, copy.root))
            .collect();
        while let Some((source, target_parent)) = stack.pop() {
            let slot = &self.nodes[source.0];
            let target = copy.append(target_parent, slot.element.clone(), slot.range);
            stack.extend(slot.children.iter().rev().map(|c| (*c, target)));
        }
        copy
    }

    /// Same reachable shape, payloads and ranges, compared in pre-order
    pub fn structurally_eq(&self, other: &DocumentTree) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }

    fn subtree_eq(&self, a: NodeId, other: &DocumentTree, b: NodeId) -> bool {
        let mut stack = vec![(a, b)];
        while let Some((a, b)) = stack.pop() {
            let (left, right) = (&self.nodes[a.0], &other.nodes[b.0]);
            if left.element != right.element
                || left.range != right.range
                || left.children.len() != right.children.len()
            {
                return false;
            }
            stack.extend(left.children.iter().copied().zip(right.children.iter().copied()));
        }
        true
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// Entry point of a query; pick a selection to get a [`Query`]
#[derive(Clone, Copy)]
pub struct QueryBuilder<'t> {
    tree: &'t DocumentTree,
    root: NodeId,
}

impl<'t> QueryBuilder<'t> {
    /// The query root and all its descendants, in pre-order
    pub fn all(self) -> Query<'t> {
        Query {
            tree: self.tree,
            results: self.tree.preorder(self.root),
        }
    }

    /// Direct children of the query root
    pub fn children(self) -> Query<'t> {
        Query {
            tree: self.tree,
            results: self.tree.children(self.root).to_vec(),
        }
    }
}

/// Selected nodes, narrowed by chained filters
#[derive(Clone)]
pub struct Query<'t> {
    tree: &'t DocumentTree,
    results: Vec<NodeId>,
}

impl<'t> Query<'t> {
    /// Keep nodes whose payload is a `V`
    pub fn of_type<V: ElementVariant>(mut self) -> Self {
        let tree = self.tree;
        self.results.retain(|id| tree.get::<V>(*id).is_some());
        self
    }

    /// Keep nodes whose payload is a `V` satisfying `predicate`
    pub fn filter<V: ElementVariant>(mut self, predicate: impl Fn(&V) -> bool) -> Self {
        let tree = self.tree;
        self.results
            .retain(|id| tree.get::<V>(*id).is_some_and(&predicate));
        self
    }

    pub fn first(&self) -> Option<NodeId> {
        self.results.first().copied()
    }

    pub fn list(&self) -> Vec<NodeId> {
        self.results.clone()
    }

    pub fn count(&self) -> usize {
        self.results.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.results.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Emphasis, Heading, Paragraph, Text};
    use crate::source::SourceRange;

    fn text(content: &str) -> Element {
        Element::from(Text {
            content: content.to_string(),
        })
    }

    /// root
    ///   heading(1) > "Title"
    ///   paragraph > "Body"
    ///   heading(2) > "Next"
    fn sample() -> (DocumentTree, [NodeId; 3]) {
        let mut tree = DocumentTree::new(SourceRange::default());
        let root = tree.root();
        let h1 = tree.append(root, Heading { level: 1 }.into(), SourceRange::default());
        tree.append(h1, text("Title"), SourceRange::default());
        let para = tree.append(root, Paragraph.into(), SourceRange::default());
        tree.append(para, text("Body"), SourceRange::default());
        let h2 = tree.append(root, Heading { level: 2 }.into(), SourceRange::default());
        tree.append(h2, text("Next"), SourceRange::default());
        (tree, [h1, para, h2])
    }

    #[test]
    fn test_preorder_is_document_order() {
        let (tree, _) = sample();
        let kinds: Vec<_> = tree
            .query()
            .all()
            .iter()
            .map(|id| tree.element(id).kind())
            .collect();
        assert_eq!(
            kinds,
            vec!["document", "heading", "text", "paragraph", "text", "heading", "text"]
        );
    }

    #[test]
    fn test_filter_by_variant_and_predicate() {
        let (tree, [h1, _, h2]) = sample();
        let level1 = tree.query().all().filter::<Heading>(|h| h.level == 1);
        assert_eq!(level1.first(), Some(h1));
        assert_eq!(level1.count(), 1);

        let headings = tree.query().all().of_type::<Heading>().list();
        assert_eq!(headings, vec![h1, h2]);

        let none = tree.query().all().filter::<Heading>(|h| h.level == 6);
        assert!(none.first().is_none());
        assert_eq!(none.count(), 0);

        // the predicate only sees nodes of the requested variant
        let with_text = tree
            .query()
            .all()
            .filter::<Text>(|t| t.content.starts_with('T'))
            .list();
        assert_eq!(with_text, vec![tree.children(h1)[0]]);
    }

    #[test]
    fn test_children_selection() {
        let (tree, [h1, para, h2]) = sample();
        assert_eq!(tree.query().children().list(), vec![h1, para, h2]);
        assert_eq!(tree.children(para).len(), 1);
    }

    #[test]
    fn test_remove_child_keeps_sibling_order() {
        let (mut tree, [h1, para, h2]) = sample();
        let root = tree.root();
        assert!(tree.remove_child(root, para));
        assert_eq!(tree.children(root), &[h1, h2]);
        assert_eq!(tree.parent(para), None);
        assert_eq!(tree.index_in_parent(h2), Some(1));
        // detached subtree is no longer reachable
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_remove_non_child_is_noop() {
        let (mut tree, [h1, para, _]) = sample();
        let before = tree.children(tree.root()).to_vec();
        // para is a sibling of h1, not its child
        assert!(!tree.remove_child(h1, para));
        let root = tree.root();
        assert!(tree.remove_child(root, para));
        assert!(!tree.remove_child(root, para));
        assert_eq!(tree.children(root).len(), before.len() - 1);
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let (original, [h1, _, _]) = sample();
        let mut copy = original.deep_copy();
        assert!(original.structurally_eq(&copy));

        let copy_root = copy.root();
        let first = copy.children(copy_root)[0];
        copy.remove_child(copy_root, first);

        assert!(!original.structurally_eq(&copy));
        assert_eq!(original.children(original.root())[0], h1);
        assert_eq!(original.node_count(), 7);
        assert_eq!(copy.node_count(), 5);
    }

    #[test]
    fn test_deep_copy_drops_detached_nodes() {
        let (mut tree, [_, para, _]) = sample();
        let root = tree.root();
        tree.remove_child(root, para);
        let copy = tree.deep_copy();
        assert_eq!(copy.node_count(), tree.node_count());
        assert!(copy.structurally_eq(&tree));
        assert_eq!(copy.query().all().of_type::<Paragraph>().count(), 0);
    }

    #[test]
    fn test_depth_and_leaf() {
        let (tree, [h1, _, _]) = sample();
        let title = tree.children(h1)[0];
        assert_eq!(tree.depth(tree.root()), 0);
        assert_eq!(tree.depth(title), 2);
        assert!(tree.is_leaf(title));
        assert!(!tree.is_leaf(h1));
    }

    /// root > paragraph > emphasis x depth > "deep"
    fn nested_emphasis(depth: usize) -> (DocumentTree, NodeId) {
        let mut tree = DocumentTree::new(SourceRange::default());
        let root = tree.root();
        let para = tree.append(root, Paragraph.into(), SourceRange::default());
        let mut parent = para;
        for _ in 0..depth {
            parent = tree.append(parent, Emphasis.into(), SourceRange::default());
        }
        tree.append(parent, text("deep"), SourceRange::default());
        (tree, para)
    }

    #[test]
    fn test_deeply_nested_tree_copy_and_compare() {
        let (tree, _) = nested_emphasis(100_000);
        let copy = tree.deep_copy();
        assert_eq!(copy.node_count(), 100_003);
        assert!(tree.structurally_eq(&copy));

        let (shallower, _) = nested_emphasis(99_999);
        assert!(!tree.structurally_eq(&shallower));
    }
}
