// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Whole-arena consistency checks.

use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::direction::Direction;
use crate::error::{Error, Result};
use crate::thread::Ring;
use crate::tree::{Links, ParentLink, Tree};
use crate::types::NodeId;

impl<T> Tree<T> {
    /// Check that every structural invariant holds.
    ///
    /// This walks the whole arena and is meant for tests and debugging:
    ///
    /// - parent links and neighbor slots point at each other;
    /// - both circular lists are doubly linked;
    /// - every node appears in exactly one layout thread, which lists its
    ///   paint group in post-order;
    /// - the paint-group ring of every tree lists its groups in post-order;
    /// - memoized paint groups that are still current are correct.
    ///
    /// Walks are bounded by the arena size, so a corrupt list is reported
    /// rather than looped on.
    pub fn validate(&self) -> Result<()> {
        let limit = self.nodes_len();
        let mut threaded: HashSet<NodeId> = HashSet::new();

        for id in self.live_ids() {
            let n = self.node(id);
            if let Some(link) = n.parent {
                let owner = self.node_opt(link.owner).ok_or(Error::NoNodeFound)?;
                if owner.neighbors[link.slot.index()].node != Some(id) {
                    return Err(Error::NoNodeFound);
                }
            }
            for dir in Direction::ALL {
                let Some(child) = n.neighbors[dir.index()].node else {
                    continue;
                };
                let c = self.node_opt(child).ok_or(Error::NoNodeFound)?;
                if c.parent != Some(ParentLink { owner: id, slot: dir }) {
                    return Err(Error::NoNodeFound);
                }
            }
            for ring in [Ring::Layout, Ring::PaintGroup] {
                let next = self.links(id, ring).next;
                if self.node_opt(next).is_none_or(|m| ring.of(m).prev != id) {
                    return Err(Error::BrokenLayoutThread(id));
                }
            }

            if let Some(stamp) = n.paint_group_root.get()
                && stamp.epoch == self.paint_epoch
                && Some(stamp.root) != self.uncached_group(id)
            {
                return Err(Error::NotPaintGroup(id));
            }

            let Some(record) = n.paint_group else {
                if n.parent.is_none() || n.paint != Links::lone(id) {
                    return Err(Error::NotPaintGroup(id));
                }
                continue;
            };
            if n.parent.is_some() && !record.explicit {
                return Err(Error::NotPaintGroup(id));
            }

            let mut expected = Vec::new();
            self.collect_run(id, &mut expected);
            if self.walk(id, Ring::Layout, limit) != Some(expected.clone()) {
                return Err(Error::BrokenLayoutThread(id));
            }
            for member in expected {
                if !threaded.insert(member) {
                    return Err(Error::BrokenLayoutThread(member));
                }
            }

            if n.parent.is_none() {
                let mut groups = Vec::new();
                self.collect_groups(id, &mut groups);
                if self.walk(id, Ring::PaintGroup, limit) != Some(groups) {
                    return Err(Error::NotPaintGroup(id));
                }
            }
        }

        if let Some(missing) = self.live_ids().find(|id| !threaded.contains(id)) {
            return Err(Error::BrokenLayoutThread(missing));
        }
        Ok(())
    }

    /// The list through `id`, starting after it and ending with it.
    fn walk(&self, id: NodeId, ring: Ring, limit: usize) -> Option<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut cur = id;
        for _ in 0..limit {
            cur = ring.of(self.node_opt(cur)?).next;
            out.push(cur);
            if cur == id {
                return Some(out);
            }
        }
        None
    }

    /// Post-order of `id` and its threaded descendants.
    fn collect_run(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &dir in self.order_of(id) {
            if let Some(child) = self.threaded_child(id, dir) {
                self.collect_run(child, out);
            }
        }
        out.push(id);
    }

    /// Post-order of the paint groups in the subtree of `id`.
    fn collect_groups(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &dir in self.order_of(id) {
            if let Some(child) = self.node(id).neighbors[dir.index()].node {
                self.collect_groups(child, out);
            }
        }
        if self.node(id).paint_group.is_some() {
            out.push(id);
        }
    }

    fn uncached_group(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = id;
        loop {
            let n = self.node_opt(cur)?;
            if n.paint_group.is_some() {
                return Some(cur);
            }
            cur = n.parent?.owner;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_lone_trees_are_valid() {
        let mut tree: Tree = Tree::new();
        tree.validate().unwrap();
        let a = tree.insert(None);
        let b = tree.insert(None);
        tree.connect(a, Direction::Upward, b).unwrap();
        tree.destroy(a);
        tree.validate().unwrap();
    }

    #[test]
    fn broken_thread_is_reported() {
        let mut tree = Tree::new();
        let r = tree.insert(Some("r"));
        let a = tree.insert(Some("a"));
        let b = tree.insert(Some("b"));
        tree.connect(r, Direction::Forward, a).unwrap();
        tree.connect(r, Direction::Downward, b).unwrap();
        tree.validate().unwrap();

        // Swap the two runs without touching the tree.
        tree.link(Ring::Layout, r, b);
        tree.link(Ring::Layout, b, a);
        tree.link(Ring::Layout, a, r);
        assert_eq!(tree.validate(), Err(Error::BrokenLayoutThread(r)));
    }

    #[test]
    fn one_sided_link_is_reported() {
        let mut tree = Tree::new();
        let r = tree.insert(Some("r"));
        let a = tree.insert(Some("a"));
        tree.connect(r, Direction::Forward, a).unwrap();
        tree.node_mut(r).layout.next = r;
        assert!(
            matches!(tree.validate(), Err(Error::BrokenLayoutThread(_))),
            "prev and next must agree"
        );
    }

    #[test]
    fn misplaced_group_is_reported() {
        let mut tree = Tree::new();
        let r = tree.insert(Some("r"));
        let a = tree.insert(Some("a"));
        let b = tree.insert(Some("b"));
        tree.connect(r, Direction::Forward, a).unwrap();
        tree.connect(r, Direction::Downward, b).unwrap();
        tree.crease(a).unwrap();
        tree.crease(b).unwrap();
        tree.validate().unwrap();

        tree.link(Ring::PaintGroup, r, b);
        tree.link(Ring::PaintGroup, b, a);
        tree.link(Ring::PaintGroup, a, r);
        assert_eq!(tree.validate(), Err(Error::NotPaintGroup(r)));
    }
}
