// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint groups: creasing, the paint-group ring, and paint order.
//!
//! Roots always own a paint group. Other nodes own one only while creased.
//! Every other node belongs to the paint group of its nearest ancestor that
//! owns one.
//!
//! The groups of one tree form a ring in paint order: a group is painted
//! after every group beneath it, and sibling subtrees are painted in the
//! layout order of the node they diverge at. The tree's root is therefore
//! always last.

use alloc::vec::Vec;

use smallvec::SmallVec;
use tracing::debug;

use crate::direction::Direction;
use crate::error::{Error, Result};
use crate::thread::Ring;
use crate::tree::{Links, PaintGroupRecord, Stamp, Tree};
use crate::types::NodeId;

/// A read-only view of one paint group.
pub struct PaintGroup<'a, T> {
    tree: &'a Tree<T>,
    node: NodeId,
}

impl<T> Clone for PaintGroup<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PaintGroup<'_, T> {}

impl<T> core::fmt::Debug for PaintGroup<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PaintGroup")
            .field("node", &self.node)
            .field("prev", &self.prev())
            .field("next", &self.next())
            .field("explicit", &self.is_explicit())
            .finish()
    }
}

impl<T> PaintGroup<'_, T> {
    /// The node that roots this group.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The next group in paint order.
    pub fn next(&self) -> NodeId {
        self.tree.paint_next(self.node)
    }

    /// The previous group in paint order.
    pub fn prev(&self) -> NodeId {
        self.tree.paint_prev(self.node)
    }

    /// Whether the group was created by a crease.
    pub fn is_explicit(&self) -> bool {
        self.tree
            .node(self.node)
            .paint_group
            .is_some_and(|pg| pg.explicit)
    }

    /// The ring, starting after this group and ending with it.
    pub fn dump(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.node;
        loop {
            cur = self.tree.paint_next(cur);
            out.push(cur);
            if cur == self.node {
                return out;
            }
        }
    }
}

impl<T> Tree<T> {
    pub(crate) fn paint_next(&self, id: NodeId) -> NodeId {
        self.node(id).paint.next
    }

    pub(crate) fn paint_prev(&self, id: NodeId) -> NodeId {
        self.node(id).paint.prev
    }

    /// The paint group `id` belongs to.
    pub fn paint_group(&self, id: NodeId) -> Option<PaintGroup<'_, T>> {
        let node = self.find_paint_group(id)?;
        Some(PaintGroup { tree: self, node })
    }

    /// Returns true if `id` roots a paint group.
    pub fn is_paint_group(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some_and(|n| n.paint_group.is_some())
    }

    /// The root of the paint group `id` belongs to.
    pub fn find_paint_group(&self, id: NodeId) -> Option<NodeId> {
        self.is_alive(id).then(|| self.group_of(id))
    }

    /// Memoized lookup behind [`Tree::find_paint_group`].
    pub(crate) fn group_of(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        let root = loop {
            let n = self.node(cur);
            if let Some(stamp) = n.paint_group_root.get()
                && stamp.epoch == self.paint_epoch
            {
                break stamp.root;
            }
            if n.paint_group.is_some() {
                break cur;
            }
            match n.parent {
                Some(link) => cur = link.owner,
                None => break cur,
            }
        };
        self.node(id).paint_group_root.set(Some(Stamp {
            root,
            epoch: self.paint_epoch,
        }));
        root
    }

    /// The current paint-group epoch.
    ///
    /// Every mutation that can move a paint-group boundary advances it,
    /// which invalidates all memoized lookups at once.
    pub fn paint_group_epoch(&self) -> u64 {
        self.paint_epoch
    }

    /// Returns true if the memoized paint group of `id` is still current.
    pub fn is_paint_group_cache_fresh(&self, id: NodeId) -> bool {
        self.node_opt(id)
            .and_then(|n| n.paint_group_root.get())
            .is_some_and(|stamp| stamp.epoch == self.paint_epoch)
    }

    /// Record `root` as the paint group of every node in the run ending
    /// with `id`.
    pub(crate) fn stamp_run(&self, id: NodeId, root: NodeId) {
        let stamp = Some(Stamp {
            root,
            epoch: self.paint_epoch,
        });
        let mut cur = self.head(id);
        loop {
            self.node(cur).paint_group_root.set(stamp);
            if cur == id {
                return;
            }
            cur = self.thread_next(cur);
        }
    }

    /// The first group painted within the subtree of `id`.
    ///
    /// This is `id` itself when no group beneath it is painted first.
    pub fn find_first_paint_group(&self, id: NodeId) -> Option<NodeId> {
        self.is_alive(id).then(|| self.first_paint_group(id))
    }

    pub(crate) fn first_paint_group(&self, id: NodeId) -> NodeId {
        let mut cur = self.paint_prev(id);
        while cur != id {
            if !self.has_ancestor(cur, id) {
                return self.paint_next(cur);
            }
            cur = self.paint_prev(cur);
        }
        self.paint_next(id)
    }

    /// The paint groups of the tree containing `id`, ending with its root.
    pub fn dump_paint_groups(&self, id: NodeId) -> Vec<NodeId> {
        match self.root_of(id) {
            Some(node) => PaintGroup { tree: self, node }.dump(),
            None => Vec::new(),
        }
    }

    /// Visit every paint group of the ring through the group of `id`,
    /// starting there and walking backward.
    ///
    /// Fails with [`Error::NotPaintGroup`] if the ring holds a node that does
    /// not root a group or does not close.
    pub fn for_each_paint_group(&self, id: NodeId, mut f: impl FnMut(NodeId)) -> Result<()> {
        let start = self.find_paint_group(id).ok_or(Error::NoNodeFound)?;
        let mut cur = start;
        for _ in 0..self.nodes_len() {
            if self.node_opt(cur).is_none_or(|n| n.paint_group.is_none()) {
                return Err(Error::NotPaintGroup(cur));
            }
            f(cur);
            cur = self.paint_prev(cur);
            if cur == start {
                return Ok(());
            }
        }
        Err(Error::NotPaintGroup(cur))
    }

    // --- paint order ---

    /// Returns true if `a` is painted before `b`.
    ///
    /// Descendants are painted before their ancestors. Otherwise the two
    /// nodes are ordered by the layout order of the node their paths to the
    /// root diverge at. Nodes of different trees are unordered.
    pub fn is_painted_before(&self, a: NodeId, b: NodeId) -> bool {
        if a == b || !self.is_alive(a) || !self.is_alive(b) {
            return false;
        }
        let pa = self.path_to_root(a);
        let pb = self.path_to_root(b);
        if pa.last() != pb.last() {
            return false;
        }
        let common = common_suffix(&pa, &pb);
        if common == pa.len() {
            return false;
        }
        if common == pb.len() {
            return true;
        }
        let order = self.order_of(pa[pa.len() - common]);
        let rank = |child: NodeId| {
            let slot = self.node(child).parent.map(|p| p.slot);
            order.iter().position(|d| Some(*d) == slot)
        };
        rank(pa[pa.len() - common - 1]) < rank(pb[pb.len() - common - 1])
    }

    /// Returns true if `a` is painted after `b`.
    pub fn is_painted_after(&self, a: NodeId, b: NodeId) -> bool {
        self.is_painted_before(b, a)
    }

    /// Number of edges between `a` and `b`, or `None` if they are in
    /// different trees.
    pub fn find_distance(&self, a: NodeId, b: NodeId) -> Option<usize> {
        if !self.is_alive(a) || !self.is_alive(b) {
            return None;
        }
        let pa = self.path_to_root(a);
        let pb = self.path_to_root(b);
        if pa.last() != pb.last() {
            return None;
        }
        let common = common_suffix(&pa, &pb);
        Some(pa.len() - common + pb.len() - common)
    }

    /// Where `x` belongs among the groups of `pg`'s subtree, as the pair of
    /// adjacent ring entries to splice it between.
    ///
    /// `x` must be a descendant of `pg` and not yet in its ring. The nearest
    /// group serves as an anchor; the walk from there settles on the exact
    /// paint-order position, since the ring is sorted.
    pub(crate) fn insert_position(&self, pg: NodeId, x: NodeId) -> (NodeId, NodeId) {
        let first = self.first_paint_group(pg);

        let mut anchor = pg;
        let mut best = usize::MAX;
        let mut cur = first;
        loop {
            let distance = self.find_distance(cur, x).unwrap_or(usize::MAX);
            if distance < best {
                best = distance;
                anchor = cur;
            }
            if cur == pg {
                break;
            }
            cur = self.paint_next(cur);
        }

        if self.is_painted_before(anchor, x) {
            let mut before = anchor;
            loop {
                let next = self.paint_next(before);
                if next == first || !self.is_painted_before(next, x) {
                    return (before, next);
                }
                before = next;
            }
        }
        let mut after = anchor;
        while after != first {
            let prev = self.paint_prev(after);
            if self.is_painted_before(prev, x) {
                break;
            }
            after = prev;
        }
        (self.paint_prev(after), after)
    }

    /// Restore paint order among the groups beneath `id` after its layout
    /// order changed.
    pub(crate) fn resort_paint_groups_under(&mut self, id: NodeId) {
        let pg = self.group_of(id);
        let mut under: SmallVec<[NodeId; 8]> = SmallVec::new();
        let mut cur = self.paint_prev(pg);
        while cur != pg && self.has_ancestor(cur, pg) {
            if cur != id && self.has_ancestor(cur, id) {
                under.push(cur);
            }
            cur = self.paint_prev(cur);
        }
        if under.len() < 2 {
            return;
        }
        for &g in &under {
            let (prev, next) = (self.paint_prev(g), self.paint_next(g));
            self.link(Ring::PaintGroup, prev, next);
            self.node_mut(g).paint = Links::lone(g);
        }
        for &g in under.iter().rev() {
            let (before, after) = self.insert_position(pg, g);
            self.link(Ring::PaintGroup, before, g);
            self.link(Ring::PaintGroup, g, after);
        }
    }

    // --- crease ---

    /// Make `id` an explicit paint-group boundary.
    ///
    /// A connected node leaves its parent's layout thread, taking its
    /// uncreased descendants with it, and joins the paint-group ring in paint
    /// order. Roots simply become explicit.
    pub fn crease(&mut self, id: NodeId) -> Result<()> {
        let n = self.node_opt(id).ok_or(Error::NoNodeFound)?;
        if n.paint_group.is_some() {
            self.node_mut(id).paint_group = Some(PaintGroupRecord { explicit: true });
            return Ok(());
        }
        self.split_paint_group(id);
        Ok(())
    }

    /// Give a connected node without a paint group its own explicit one.
    pub(crate) fn split_paint_group(&mut self, id: NodeId) {
        let Some(link) = self.node(id).parent else {
            return;
        };
        debug!(?id, "crease");
        let pg = self.group_of(link.owner);
        self.paint_epoch += 1;
        self.remove_from_layout(id);
        self.node_mut(id).paint_group = Some(PaintGroupRecord { explicit: true });
        let (before, after) = self.insert_position(pg, id);
        self.link(Ring::PaintGroup, before, id);
        self.link(Ring::PaintGroup, id, after);
        self.stamp_run(id, id);
        self.layout_changed(id, Direction::Inward);
    }

    /// Merge an explicit paint group back into its parent's group.
    ///
    /// Groups beneath `id` keep their place in the ring. A root keeps its
    /// group and only loses the explicit flag. Nodes that are not creased
    /// are left alone.
    pub fn uncrease(&mut self, id: NodeId) -> Result<()> {
        let n = self.node_opt(id).ok_or(Error::NoNodeFound)?;
        if !n.paint_group.is_some_and(|pg| pg.explicit) {
            return Ok(());
        }
        let Some(link) = n.parent else {
            self.node_mut(id).paint_group = Some(PaintGroupRecord { explicit: false });
            return Ok(());
        };
        debug!(?id, "uncrease");
        self.paint_epoch += 1;
        let (prev, next) = (self.paint_prev(id), self.paint_next(id));
        self.link(Ring::PaintGroup, prev, next);
        let n = self.node_mut(id);
        n.paint = Links::lone(id);
        n.paint_group = None;
        self.insert_into_layout(link.owner, link.slot, id);
        let pg = self.group_of(link.owner);
        self.stamp_run(id, pg);
        self.layout_changed(id, Direction::Inward);
        Ok(())
    }
}

/// Length of the shared tail of two node-to-root paths.
fn common_suffix(a: &[NodeId], b: &[NodeId]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}
