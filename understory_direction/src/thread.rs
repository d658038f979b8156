// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout-order thread.
//!
//! Each paint group threads its root and every uncreased descendant into one
//! circular list. The list is a post-order walk: a node's children come
//! before it, in the node's layout order, and each child's *run* (the child
//! preceded by its own descendants) is contiguous. The first entry of a run
//! is the run's *head*.
//!
//! The same [`Tree::link`] splice maintains the paint-group ring.

use alloc::vec::Vec;

use tracing::trace;

use crate::direction::{Direction, NUM_DIRECTIONS};
use crate::preference::layout_order_for;
use crate::tree::{Links, Node, Tree};
use crate::types::NodeId;

/// Selects one of the two circular lists every node belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Ring {
    /// The layout-order thread.
    Layout,
    /// The paint-group ring.
    PaintGroup,
}

impl Ring {
    pub(crate) fn of<T>(self, node: &Node<T>) -> Links {
        match self {
            Self::Layout => node.layout,
            Self::PaintGroup => node.paint,
        }
    }
}

impl<T> Tree<T> {
    pub(crate) fn links(&self, id: NodeId, ring: Ring) -> Links {
        ring.of(self.node(id))
    }

    fn links_mut(&mut self, id: NodeId, ring: Ring) -> &mut Links {
        let n = self.node_mut(id);
        match ring {
            Ring::Layout => &mut n.layout,
            Ring::PaintGroup => &mut n.paint,
        }
    }

    /// Make `b` follow `a` in `ring`.
    ///
    /// Every splice in the crate is a sequence of these calls. Callers read
    /// all endpoints they need before the first call.
    pub(crate) fn link(&mut self, ring: Ring, a: NodeId, b: NodeId) {
        trace!(?ring, ?a, ?b, "link");
        self.links_mut(a, ring).next = b;
        self.links_mut(b, ring).prev = a;
    }

    pub(crate) fn thread_next(&self, id: NodeId) -> NodeId {
        self.node(id).layout.next
    }

    pub(crate) fn thread_prev(&self, id: NodeId) -> NodeId {
        self.node(id).layout.prev
    }

    pub(crate) fn order_of(&self, id: NodeId) -> &'static [Direction; NUM_DIRECTIONS] {
        let n = self.node(id);
        layout_order_for(n.preference, n.parent.map(|p| p.slot.reverse()))
    }

    /// The next node in the layout-order thread.
    pub fn layout_next(&self, id: NodeId) -> Option<NodeId> {
        Some(self.node_opt(id)?.layout.next)
    }

    /// The previous node in the layout-order thread.
    pub fn layout_prev(&self, id: NodeId) -> Option<NodeId> {
        Some(self.node_opt(id)?.layout.prev)
    }

    /// The layout-order thread through `id`, starting after it and ending
    /// with it.
    pub fn dump_layout(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.is_alive(id) {
            return out;
        }
        let mut cur = id;
        loop {
            cur = self.thread_next(cur);
            out.push(cur);
            if cur == id {
                return out;
            }
        }
    }

    /// Visit every node of the layout-order thread through `id` once,
    /// starting with `id` and walking backward.
    pub fn for_each_node(&self, id: NodeId, mut f: impl FnMut(NodeId)) {
        if !self.is_alive(id) {
            return;
        }
        let mut cur = id;
        loop {
            f(cur);
            cur = self.thread_prev(cur);
            if cur == id {
                return;
            }
        }
    }

    /// The child in `dir` if it shares its parent's thread.
    ///
    /// Creased children root their own paint group and thread separately.
    pub(crate) fn threaded_child(&self, id: NodeId, dir: Direction) -> Option<NodeId> {
        let child = self.node(id).neighbors[dir.index()].node?;
        self.node(child).paint_group.is_none().then_some(child)
    }

    /// First entry of the run that ends with `id`.
    pub(crate) fn head(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        'descend: loop {
            for &dir in self.order_of(cur) {
                if let Some(child) = self.threaded_child(cur, dir) {
                    cur = child;
                    continue 'descend;
                }
            }
            return cur;
        }
    }

    /// The nearest threaded child of `parent` laid out before `dir`.
    fn earlier(&self, parent: NodeId, dir: Direction) -> Option<NodeId> {
        self.order_of(parent)
            .iter()
            .take_while(|d| **d != dir)
            .filter_map(|d| self.threaded_child(parent, *d))
            .last()
    }

    /// The nearest threaded child of `parent` laid out after `dir`.
    fn later(&self, parent: NodeId, dir: Direction) -> Option<NodeId> {
        self.order_of(parent)
            .iter()
            .skip_while(|d| **d != dir)
            .skip(1)
            .find_map(|d| self.threaded_child(parent, *d))
    }

    /// Splice the run of `child`, currently a closed cycle, into the thread
    /// of `parent` at the position of slot `dir`.
    pub(crate) fn insert_into_layout(&mut self, parent: NodeId, dir: Direction, child: NodeId) {
        let first = self.head(child);
        let before = self.earlier(parent, dir);
        let after = self.later(parent, dir);
        let pred = match (before, after) {
            (Some(b), _) => b,
            (None, Some(a)) => self.thread_prev(self.head(a)),
            (None, None) => self.thread_prev(parent),
        };
        let succ = match after {
            Some(a) => self.head(a),
            None => parent,
        };
        trace!(?parent, ?dir, ?child, "insert into layout");
        self.link(Ring::Layout, pred, first);
        self.link(Ring::Layout, child, succ);
    }

    /// Splice the run of `child` out of its parent's thread, closing it into
    /// its own cycle.
    pub(crate) fn remove_from_layout(&mut self, child: NodeId) {
        let first = self.head(child);
        let pred = self.thread_prev(first);
        let succ = self.thread_next(child);
        trace!(?child, "remove from layout");
        self.link(Ring::Layout, pred, succ);
        self.link(Ring::Layout, child, first);
    }

    /// First and last entries of the horizontal and vertical child runs of
    /// `id`, or `None` if either is empty.
    fn axis_runs(&self, id: NodeId) -> Option<[NodeId; 4]> {
        let span = |neg: Direction, pos: Direction| {
            let (first, last) = match (self.threaded_child(id, neg), self.threaded_child(id, pos)) {
                (Some(n), Some(p)) => (n, p),
                (Some(x), None) | (None, Some(x)) => (x, x),
                (None, None) => return None,
            };
            Some((self.head(first), last))
        };
        let (first_h, last_h) = span(Direction::Backward, Direction::Forward)?;
        let (first_v, last_v) = span(Direction::Downward, Direction::Upward)?;
        Some([first_h, last_h, first_v, last_v])
    }

    /// Move the vertical run of `id` in front of its horizontal run.
    pub(crate) fn horz_to_vert(&mut self, id: NodeId) {
        let Some([first_h, last_h, first_v, last_v]) = self.axis_runs(id) else {
            return;
        };
        let before = self.thread_prev(first_h);
        let after = self.thread_next(last_v);
        self.link(Ring::Layout, before, first_v);
        self.link(Ring::Layout, last_v, first_h);
        self.link(Ring::Layout, last_h, after);
    }

    /// Move the horizontal run of `id` in front of its vertical run.
    pub(crate) fn vert_to_horz(&mut self, id: NodeId) {
        let Some([first_h, last_h, first_v, last_v]) = self.axis_runs(id) else {
            return;
        };
        let before = self.thread_prev(first_v);
        let after = self.thread_next(last_h);
        self.link(Ring::Layout, before, first_h);
        self.link(Ring::Layout, last_h, first_v);
        self.link(Ring::Layout, last_v, after);
    }
}
