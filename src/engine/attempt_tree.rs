//! Attempt tree
//!
//! Every parser invocation records a [`ParsedRange`] node: the input range
//! it covered, its label and whether it failed. Nodes live in an arena and
//! are addressed by [`NodeId`]; the only back-edge is each node's parent
//! index, used when splicing.
//!
//! Splicing replaces a node in its parent's child list with its own
//! children. The spliced node stays in the arena but is no longer reachable
//! from the root, and every query below only looks at reachable nodes.

use super::pos_range::PosRange;
use hashbrown::HashSet;
use std::fmt::Write;
use std::ops::Index;
use std::sync::Arc;

/// Label of the synthetic node every tree is rooted at
pub const ROOT_LABEL: &str = "<root>";

/// Index of a node in an [`AttemptTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One recorded parser invocation
#[derive(Debug, Clone)]
pub struct ParsedRange {
    /// Input covered by the invocation
    pub range: PosRange,
    /// Label of the parser that ran
    pub label: Arc<str>,
    /// Whether the invocation failed
    pub failed: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    anchor: bool,
    pending_splice: bool,
}

impl ParsedRange {
    fn new(start: usize, label: Arc<str>, parent: Option<NodeId>, anchor: bool) -> Self {
        Self {
            range: PosRange::at(start),
            label,
            failed: false,
            parent,
            children: Vec::new(),
            anchor,
            pending_splice: false,
        }
    }

    /// Parent node, `None` for the root and for spliced-out nodes
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in the order they were attempted
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this node bounds a `splice_end` dissolution
    #[inline]
    pub fn is_anchor(&self) -> bool {
        self.anchor
    }
}

/// Arena-backed tree of parser attempts for one top-level invocation
#[derive(Debug, Clone)]
pub struct AttemptTree {
    nodes: Vec<ParsedRange>,
}

impl AttemptTree {
    /// A tree holding only the synthetic root, starting at `start`
    pub fn new(start: usize) -> Self {
        Self {
            nodes: vec![ParsedRange::new(start, Arc::from(ROOT_LABEL), None, true)],
        }
    }

    /// The synthetic root
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Look up a node
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&ParsedRange> {
        self.nodes.get(id.0)
    }

    /// Total number of nodes in the arena, including spliced-out ones
    #[inline]
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes reachable from the root, root included
    pub fn node_count(&self) -> usize {
        self.pre_order().len()
    }

    /// Open a new node under `parent`
    pub fn push(&mut self, parent: NodeId, start: usize, label: Arc<str>, anchor: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes
            .push(ParsedRange::new(start, label, Some(parent), anchor));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Record the outcome of a node
    ///
    /// A failed node's end covers the furthest end of any of its children,
    /// so ranges never shrink going up an ancestor chain.
    pub fn close(&mut self, id: NodeId, end: usize, failed: bool) {
        let end = if failed {
            self.nodes[id.0]
                .children
                .iter()
                .map(|c| self.nodes[c.0].range.end)
                .fold(end, usize::max)
        } else {
            end
        };
        let node = &mut self.nodes[id.0];
        node.range = PosRange::new(node.range.start, end);
        node.failed = failed;
    }

    /// Detach every child of `id`, turning it into a leaf
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Mark every ancestor strictly between `id` and the nearest anchor so
    /// that it is spliced out when it completes
    pub fn mark_splice_to_anchor(&mut self, id: NodeId) {
        let mut cursor = self.nodes[id.0].parent;
        while let Some(ancestor) = cursor {
            let node = &mut self.nodes[ancestor.0];
            if node.anchor {
                break;
            }
            node.pending_splice = true;
            cursor = node.parent;
        }
    }

    /// Whether `id` was marked by [`AttemptTree::mark_splice_to_anchor`]
    #[inline]
    pub fn is_pending_splice(&self, id: NodeId) -> bool {
        self.nodes[id.0].pending_splice
    }

    /// Replace `id` in its parent's child list with its own children
    ///
    /// Does nothing for the root or an already detached node.
    pub fn splice(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        let siblings = &mut self.nodes[parent.0].children;
        if let Some(slot) = siblings.iter().position(|&c| c == id) {
            siblings.splice(slot..=slot, children);
        }
        self.nodes[id.0].parent = None;
    }

    /// Number of edges between `id` and the root
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cursor = self.nodes[id.0].parent;
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.nodes[parent.0].parent;
        }
        depth
    }

    /// Reachable nodes, parents before children
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        out
    }

    /// Reachable nodes except the root, children before parents
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.post_order_from(self.root(), &mut out);
        out.pop();
        out
    }

    fn post_order_from(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[id.0].children {
            self.post_order_from(child, out);
        }
        out.push(id);
    }

    /// The furthest start reached by any reachable node
    pub fn furthest_start(&self) -> usize {
        self.pre_order()
            .into_iter()
            .map(|id| self.nodes[id.0].range.start)
            .max()
            .unwrap_or(self.nodes[0].range.start)
    }

    /// Reachable non-root nodes starting at the furthest start, in
    /// attempt order
    pub fn at_furthest(&self) -> Vec<NodeId> {
        let furthest = self.furthest_start();
        self.pre_order()
            .into_iter()
            .skip(1)
            .filter(|id| self.nodes[id.0].range.start == furthest)
            .collect()
    }

    /// A new tree holding only `keep` and their ancestors
    ///
    /// Kept nodes keep their relative order. Returned ids refer to the new
    /// tree.
    pub fn trim_to(&self, keep: &[NodeId]) -> AttemptTree {
        let mut wanted: HashSet<NodeId> = HashSet::new();
        for &id in keep {
            let mut cursor = Some(id);
            while let Some(node) = cursor {
                if !wanted.insert(node) {
                    break;
                }
                cursor = self.nodes[node.0].parent;
            }
        }

        let root = &self.nodes[0];
        let mut trimmed = AttemptTree {
            nodes: vec![ParsedRange {
                children: Vec::new(),
                ..root.clone()
            }],
        };
        self.copy_wanted(self.root(), trimmed.root(), &wanted, &mut trimmed);
        trimmed
    }

    fn copy_wanted(
        &self,
        from: NodeId,
        to: NodeId,
        wanted: &HashSet<NodeId>,
        out: &mut AttemptTree,
    ) {
        for &child in &self.nodes[from.0].children {
            if !wanted.contains(&child) {
                continue;
            }
            let source = &self.nodes[child.0];
            let copy = NodeId(out.nodes.len());
            out.nodes.push(ParsedRange {
                parent: Some(to),
                children: Vec::new(),
                ..source.clone()
            });
            out.nodes[to.0].children.push(copy);
            self.copy_wanted(child, copy, wanted, out);
        }
    }

    /// Dump the reachable tree for debugging
    pub fn ascii_tree(&self) -> String {
        let mut output = String::new();
        self.ascii_tree_impl(self.root(), &mut output, "", true);
        output
    }

    fn ascii_tree_impl(&self, id: NodeId, output: &mut String, prefix: &str, last: bool) {
        let connector = if last { "`- " } else { "|- " };
        let child_prefix = if last { "   " } else { "|  " };
        let node = &self.nodes[id.0];

        let _ = writeln!(
            output,
            "{}{}{} {} {}",
            prefix,
            connector,
            node.label,
            node.range,
            if node.failed { "failure" } else { "success" }
        );

        let children = &node.children;
        for (i, &child) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;
            self.ascii_tree_impl(child, output, &format!("{}{}", prefix, child_prefix), is_last);
        }
    }
}

impl Index<NodeId> for AttemptTree {
    type Output = ParsedRange;

    fn index(&self, id: NodeId) -> &ParsedRange {
        &self.nodes[id.0]
    }
}
