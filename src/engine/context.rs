//! Per-invocation parsing state
//!
//! A [`Context`] bundles the cursor and the attempt tree being recorded.
//! Each top-level invocation creates a fresh one; nothing survives between
//! invocations except what the cursor itself buffered.

use super::attempt_tree::{AttemptTree, NodeId};
use super::backed_io::BackedIo;
use super::error::{Failure, PResult};
use super::parser::{NodeShape, ParseConfig};
use std::sync::Arc;

/// State threaded through every parser invocation
pub struct Context<'io, 'src> {
    io: &'io mut BackedIo<'src>,
    tree: AttemptTree,
    current: NodeId,
    depth: usize,
    max_depth: usize,
}

impl<'io, 'src> Context<'io, 'src> {
    /// Start recording at the cursor's current position
    pub fn new(io: &'io mut BackedIo<'src>, config: &ParseConfig) -> Self {
        let tree = AttemptTree::new(io.pos());
        let current = tree.root();
        Self {
            io,
            tree,
            current,
            depth: 0,
            max_depth: config.max_depth,
        }
    }

    /// Absolute offset of the cursor
    #[inline]
    pub fn pos(&self) -> usize {
        self.io.pos()
    }

    /// Read up to `n` characters
    #[inline]
    pub fn read(&mut self, n: usize) -> PResult<&str> {
        Ok(self.io.read(n)?)
    }

    /// Read one character, `None` at end of input
    #[inline]
    pub fn read_char(&mut self) -> PResult<Option<char>> {
        Ok(self.io.read_char()?)
    }

    /// Look at up to `n` characters without consuming them
    #[inline]
    pub fn peek(&mut self, n: usize) -> PResult<String> {
        Ok(self.io.peek(n)?)
    }

    /// Check for end of input
    #[inline]
    pub fn at_eof(&mut self) -> PResult<bool> {
        Ok(self.io.eof()?)
    }

    /// Move the cursor back to an offset read during this invocation
    #[inline]
    pub fn restore_to(&mut self, pos: usize) {
        self.io.restore_to(pos)
    }

    /// The underlying cursor
    ///
    /// Invocations nested on it keep everything this invocation can still
    /// restore to.
    #[inline]
    pub fn io(&mut self) -> &mut BackedIo<'src> {
        &mut *self.io
    }

    /// The attempt tree recorded so far
    #[inline]
    pub fn tree(&self) -> &AttemptTree {
        &self.tree
    }

    /// Current nesting depth of parser invocations
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// A recoverable failure at `at`
    pub fn expected<T>(&self, at: usize, label: &Arc<str>) -> PResult<T> {
        Err(Failure::expected(at, Arc::clone(label)))
    }

    /// A recoverable failure at `at` that saw `found`
    pub fn expected_found<T>(&self, at: usize, label: &Arc<str>, found: &str) -> PResult<T> {
        Err(Failure::expected_found(at, Arc::clone(label), found))
    }

    /// Reject text matched since `start` on semantic grounds
    ///
    /// Records a failed node covering the rejected text and returns the
    /// recoverable failure to propagate.
    pub fn reject(&mut self, start: usize, label: impl Into<Arc<str>>) -> Failure {
        let label = label.into();
        let id = self
            .tree
            .push(self.current, start, Arc::clone(&label), false);
        self.tree.close(id, self.io.pos(), true);
        Failure::expected(start, label)
    }

    /// Open a node for a parser invocation starting at the cursor
    pub(crate) fn enter(&mut self, label: &Arc<str>, shape: NodeShape) -> PResult<NodeId> {
        if self.max_depth != 0 && self.depth >= self.max_depth {
            return Err(Failure::DepthLimit {
                depth: self.depth + 1,
                max_depth: self.max_depth,
            });
        }
        self.depth += 1;
        let id = self
            .tree
            .push(self.current, self.io.pos(), Arc::clone(label), shape.anchor);
        self.current = id;
        Ok(id)
    }

    /// Close the node opened by [`Context::enter`] and apply its shape
    pub(crate) fn exit(&mut self, id: NodeId, end: usize, failed: bool, shape: NodeShape) {
        self.tree.close(id, end, failed);
        if shape.primitive {
            self.tree.clear_children(id);
        }
        if shape.splice_end {
            self.tree.mark_splice_to_anchor(id);
        }
        self.current = self.tree[id].parent().unwrap_or_else(|| self.tree.root());
        if shape.splice || self.tree.is_pending_splice(id) {
            self.tree.splice(id);
        }
        self.depth -= 1;
    }

    /// Finish recording and hand back the tree
    pub(crate) fn into_tree(self) -> AttemptTree {
        self.tree
    }
}
