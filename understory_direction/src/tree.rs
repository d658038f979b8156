// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: node storage, connectivity, queries, and dirty
//! propagation.

use alloc::vec::Vec;
use core::cell::Cell;

use kurbo::Point;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::direction::{Axis, Direction, DirectionSet, NUM_DIRECTIONS};
use crate::error::{Error, Result};
use crate::preference::{
    LayoutPreference, canonical_layout_preference, detached_layout_preference, layout_order_for,
    sanitize_layout_preference,
};
use crate::thread::Ring;
use crate::types::{Alignment, AxisOverlap, LayoutState, NeighborData, NodeId};

/// A forest of direction nodes.
///
/// Every node owns six neighbor slots, one per [`Direction`]. Connecting a
/// node into a slot makes it a child; the child reaches its parent through
/// the reverse direction. Alongside the tree, the arena maintains two
/// circular orderings:
///
/// - the layout-order thread, which lists every node of a paint group in
///   post-order, visiting children in the owner's [`layout_order`](Tree::layout_order);
/// - the paint-group ring, which lists the paint groups of one tree in the
///   same order, ending with the tree's root.
///
/// Both are kept consistent by every mutator.
///
/// ## Example
///
/// ```rust
/// use understory_direction::{Direction, Tree};
///
/// let mut tree = Tree::new();
/// let root = tree.insert(Some("root"));
/// let child = tree.insert(Some("child"));
/// tree.connect(root, Direction::Forward, child).unwrap();
///
/// assert_eq!(tree.node_at(root, Direction::Forward), Some(child));
/// assert_eq!(tree.node_at(child, Direction::Backward), Some(root));
/// assert_eq!(tree.dump_layout(root), [child, root]);
/// ```
pub struct Tree<T = ()> {
    /// slots
    nodes: Vec<Option<Node<T>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    /// Bumped by every mutation that can move a paint-group boundary.
    pub(crate) paint_epoch: u64,
}

impl<T> core::fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Tree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("paint_epoch", &self.paint_epoch)
            .finish_non_exhaustive()
    }
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Previous and next entries of one circular list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Links {
    pub(crate) prev: NodeId,
    pub(crate) next: NodeId,
}

impl Links {
    pub(crate) const fn lone(id: NodeId) -> Self {
        Self { prev: id, next: id }
    }
}

/// The slot of the parent that holds this node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ParentLink {
    pub(crate) owner: NodeId,
    pub(crate) slot: Direction,
}

/// Present on nodes that root a paint group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PaintGroupRecord {
    /// Set by a crease; roots without one are implicit groups.
    pub(crate) explicit: bool,
}

/// Memoized paint-group root, valid while `epoch` matches the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Stamp {
    pub(crate) root: NodeId,
    pub(crate) epoch: u64,
}

#[derive(Debug)]
pub(crate) struct Node<T> {
    generation: u32,
    value: Option<T>,
    pub(crate) neighbors: [NeighborData; NUM_DIRECTIONS],
    pub(crate) parent: Option<ParentLink>,
    pub(crate) preference: LayoutPreference,
    layout_state: LayoutState,
    pub(crate) layout: Links,
    pub(crate) paint: Links,
    pub(crate) paint_group: Option<PaintGroupRecord>,
    pub(crate) paint_group_root: Cell<Option<Stamp>>,
}

impl<T> Node<T> {
    fn new(id: NodeId, value: Option<T>) -> Self {
        Self {
            generation: id.1,
            value,
            neighbors: core::array::from_fn(|_| NeighborData::default()),
            parent: None,
            preference: LayoutPreference::default(),
            layout_state: LayoutState::NeedsCommit,
            layout: Links::lone(id),
            paint: Links::lone(id),
            paint_group: Some(PaintGroupRecord { explicit: false }),
            paint_group_root: Cell::new(None),
        }
    }
}

impl<T> Tree<T> {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a new empty tree with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            paint_epoch: 0,
        }
    }

    /// Insert a new standalone node.
    ///
    /// The node starts as a root with [`LayoutPreference::Horizontal`], its own
    /// implicit paint group, and [`LayoutState::NeedsCommit`].
    pub fn insert(&mut self, value: Option<T>) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.nodes.push(None);
            self.generations.push(1);
            (self.nodes.len() - 1, 1_u32)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        let id = NodeId::new(idx as u32, generation);
        self.nodes[idx] = Some(Node::new(id, value));
        trace!(?id, "insert");
        id
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.1)
            .unwrap_or(false)
    }

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node<T> {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node<T>> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    /// Number of arena slots, live or free.
    pub(crate) fn nodes_len(&self) -> usize {
        self.nodes.len()
    }

    /// Live node ids, in slot order.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "NodeId uses 32-bit indices by design."
    )]
    pub(crate) fn live_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, n)| n.as_ref().map(|n| NodeId::new(idx as u32, n.generation)))
    }

    // --- payload ---

    /// The value stored on a node.
    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.node_opt(id)?.value.as_ref()
    }

    /// Mutable access to the value stored on a node.
    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_opt_mut(id)?.value.as_mut()
    }

    /// Replace the value stored on a node, returning the previous one.
    pub fn set_value(&mut self, id: NodeId, value: Option<T>) -> Option<T> {
        let n = self.node_opt_mut(id)?;
        core::mem::replace(&mut n.value, value)
    }

    // --- navigation ---

    /// Returns true if `id` is live and has no parent.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some_and(|n| n.parent.is_none())
    }

    /// Returns true if `id` is a root or hangs inward from its parent.
    pub fn is_rootlike(&self, id: NodeId) -> bool {
        match self.node_opt(id) {
            Some(n) => n.parent.is_none_or(|p| !p.slot.is_cardinal()),
            None => false,
        }
    }

    /// The parent of a live node.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        Some(self.node_opt(id)?.parent?.owner)
    }

    /// The direction from a node toward its parent.
    ///
    /// This is the reverse of the slot the parent holds the node in.
    pub fn parent_direction(&self, id: NodeId) -> Option<Direction> {
        Some(self.node_opt(id)?.parent?.slot.reverse())
    }

    /// The root of the tree containing `id`.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = id;
        let mut node = self.node_opt(id)?;
        while let Some(link) = node.parent {
            cur = link.owner;
            node = self.node(cur);
        }
        Some(cur)
    }

    /// Returns true if `ancestor` is `id` or one of its ancestors.
    pub fn has_ancestor(&self, id: NodeId, ancestor: NodeId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let mut cur = id;
        loop {
            if cur == ancestor {
                return true;
            }
            match self.node(cur).parent {
                Some(link) => cur = link.owner,
                None => return false,
            }
        }
    }

    /// Path from a node up to its root (inclusive on both ends).
    pub fn path_to_root(&self, id: NodeId) -> SmallVec<[NodeId; 8]> {
        let mut path = SmallVec::new();
        if !self.is_alive(id) {
            return path;
        }
        let mut cur = id;
        path.push(cur);
        while let Some(link) = self.node(cur).parent {
            cur = link.owner;
            path.push(cur);
        }
        path
    }

    /// The node in direction `dir`: a child, or the parent if `dir` is the
    /// parent direction.
    pub fn node_at(&self, id: NodeId, dir: Direction) -> Option<NodeId> {
        let n = self.node_opt(id)?;
        match n.parent {
            Some(link) if link.slot.reverse() == dir => Some(link.owner),
            _ => n.neighbors[dir.index()].node,
        }
    }

    /// The child in direction `dir`. Never returns the parent.
    pub fn child_at(&self, id: NodeId, dir: Direction) -> Option<NodeId> {
        self.node_opt(id)?.neighbors[dir.index()].node
    }

    /// Returns true if [`Tree::node_at`] finds a node.
    pub fn has_node(&self, id: NodeId, dir: Direction) -> bool {
        self.node_at(id, dir).is_some()
    }

    /// Returns true if there is a child in direction `dir`.
    pub fn has_child_at(&self, id: NodeId, dir: Direction) -> bool {
        self.child_at(id, dir).is_some()
    }

    /// The occupied directions of `axis`, negative first.
    pub fn has_nodes(&self, id: NodeId, axis: Axis) -> (Option<Direction>, Option<Direction>) {
        let neg = axis.negative_direction();
        let pos = axis.positive_direction();
        (
            self.has_node(id, neg).then_some(neg),
            self.has_node(id, pos).then_some(pos),
        )
    }

    /// Returns true if the node has any child.
    pub fn has_any_nodes(&self, id: NodeId) -> bool {
        self.node_opt(id)
            .is_some_and(|n| n.neighbors.iter().any(|s| s.node.is_some()))
    }

    /// Every direction that leads to a node, the parent included.
    pub fn occupied_directions(&self, id: NodeId) -> DirectionSet {
        Direction::ALL
            .into_iter()
            .filter(|d| self.has_node(id, *d))
            .fold(DirectionSet::empty(), |set, d| set | DirectionSet::from(d))
    }

    /// Visit the children of a node in its layout order.
    pub fn each_child(&self, id: NodeId, mut visitor: impl FnMut(NodeId, Direction)) {
        let Some(order) = self.layout_order(id) else {
            return;
        };
        for &dir in order {
            if let Some(child) = self.child_at(id, dir) {
                visitor(child, dir);
            }
        }
    }

    // --- neighbor payload ---

    /// The payload of one slot.
    pub fn neighbor(&self, id: NodeId, dir: Direction) -> Option<&NeighborData> {
        Some(&self.node_opt(id)?.neighbors[dir.index()])
    }

    /// Alignment of the slot, if one has been set or a child connected.
    pub fn node_alignment_mode(&self, id: NodeId, dir: Direction) -> Option<Alignment> {
        self.neighbor(id, dir)?.alignment
    }

    /// Set the alignment of a slot and invalidate the node's layout.
    pub fn set_node_alignment_mode(&mut self, id: NodeId, dir: Direction, alignment: Alignment) {
        if let Some(n) = self.node_opt_mut(id) {
            n.neighbors[dir.index()].alignment = Some(alignment);
            self.layout_changed(id, dir);
        }
    }

    /// Axis overlap policy of a slot.
    pub fn axis_overlap(&self, id: NodeId, dir: Direction) -> Option<AxisOverlap> {
        Some(self.neighbor(id, dir)?.axis_overlap)
    }

    /// Set the axis overlap policy of a slot and invalidate the node's layout.
    pub fn set_axis_overlap(&mut self, id: NodeId, dir: Direction, overlap: AxisOverlap) {
        if let Some(n) = self.node_opt_mut(id) {
            n.neighbors[dir.index()].axis_overlap = overlap;
            self.layout_changed(id, dir);
        }
    }

    /// Position of the child in `dir`, relative to this node.
    pub fn position(&self, id: NodeId, dir: Direction) -> Option<Point> {
        Some(self.neighbor(id, dir)?.position)
    }

    /// Set the position of the child in `dir`.
    pub fn set_position_at(&mut self, id: NodeId, dir: Direction, position: Point) {
        if let Some(n) = self.node_opt_mut(id) {
            n.neighbors[dir.index()].position = position;
        }
    }

    /// Separation between a node and its neighbor in `dir`.
    ///
    /// The parent direction reads the separation stored on the parent.
    pub fn separation_at(&self, id: NodeId, dir: Direction) -> Result<f64> {
        if !dir.is_cardinal() {
            return Err(Error::BadNodeDirection);
        }
        let n = self.node_opt(id).ok_or(Error::NoNodeFound)?;
        if let Some(link) = n.parent
            && link.slot.reverse() == dir
        {
            return self.separation_at(link.owner, link.slot);
        }
        let slot = &n.neighbors[dir.index()];
        if slot.node.is_none() {
            return Err(Error::NoNodeFound);
        }
        Ok(slot.separation)
    }

    /// Set the separation of the slot in `dir`.
    pub fn set_separation_at(&mut self, id: NodeId, dir: Direction, separation: f64) {
        if let Some(n) = self.node_opt_mut(id) {
            n.neighbors[dir.index()].separation = separation;
        }
    }

    /// Length of the line drawn to the child in `dir`.
    pub fn line_length_at(&self, id: NodeId, dir: Direction) -> Option<f64> {
        Some(self.neighbor(id, dir)?.line_length)
    }

    /// Set the line length of the slot in `dir`.
    pub fn set_line_length_at(&mut self, id: NodeId, dir: Direction, length: f64) {
        if let Some(n) = self.node_opt_mut(id) {
            n.neighbors[dir.index()].line_length = length;
        }
    }

    // --- layout preference ---

    /// The stored layout preference of a node.
    pub fn layout_preference(&self, id: NodeId) -> Option<LayoutPreference> {
        Some(self.node_opt(id)?.preference)
    }

    /// The preference of a connected node relative to its parent edge.
    ///
    /// Returns [`Error::NodeIsRoot`] for roots.
    pub fn canonical_layout_preference(&self, id: NodeId) -> Result<LayoutPreference> {
        let n = self.node_opt(id).ok_or(Error::NoNodeFound)?;
        let link = n.parent.ok_or(Error::NodeIsRoot)?;
        Ok(canonical_layout_preference(n.preference, link.slot.reverse()))
    }

    /// The order a node visits its slots in.
    pub fn layout_order(&self, id: NodeId) -> Option<&'static [Direction; NUM_DIRECTIONS]> {
        let n = self.node_opt(id)?;
        Some(layout_order_for(n.preference, n.parent.map(|p| p.slot.reverse())))
    }

    /// Change the layout preference of a node.
    ///
    /// Roots accept only [`LayoutPreference::Horizontal`] and
    /// [`LayoutPreference::Vertical`]; anything else is
    /// [`Error::BadLayoutPreference`]. Connected nodes store the preference
    /// relative to their parent edge. If the node's layout order flips, its
    /// horizontal and vertical child runs swap places in the layout thread.
    pub fn set_layout_preference(&mut self, id: NodeId, given: LayoutPreference) -> Result<()> {
        let n = self.node_opt(id).ok_or(Error::NoNodeFound)?;
        let parent_direction = n.parent.map(|p| p.slot.reverse());
        let new = sanitize_layout_preference(given, parent_direction)?;
        let old_order = layout_order_for(n.preference, parent_direction);
        let new_order = layout_order_for(new, parent_direction);
        self.node_mut(id).preference = new;
        if old_order == new_order {
            return Ok(());
        }
        debug!(?id, preference = %new, "layout preference changed");
        if old_order[0].is_horizontal() {
            self.horz_to_vert(id);
        } else {
            self.vert_to_horz(id);
        }
        self.paint_epoch += 1;
        self.resort_paint_groups_under(id);
        self.layout_changed(id, Direction::Inward);
        Ok(())
    }

    /// Prefer laying children out along the axis of `dir`.
    pub fn pull(&mut self, id: NodeId, dir: Direction) -> Result<()> {
        let axis = dir.axis().ok_or(Error::BadNodeDirection)?;
        self.set_layout_preference(id, LayoutPreference::from_axis(axis))
    }

    // --- connectivity ---

    /// Connect `child` into the `direction` slot of `parent`.
    ///
    /// Any node already in that slot is disconnected first, as is `child`
    /// from its current parent and whatever `child` holds in the reverse
    /// direction. A child that roots an explicit paint group keeps it and is
    /// placed in the parent's paint-group ring by paint order; otherwise its
    /// layout run joins the parent's paint group.
    ///
    /// Returns `child`.
    pub fn connect(&mut self, parent: NodeId, direction: Direction, child: NodeId) -> Result<NodeId> {
        if !self.is_alive(parent) || !self.is_alive(child) {
            return Err(Error::NoNodeFound);
        }
        if direction == Direction::Outward {
            return Err(Error::NoOutwardConnect);
        }
        if self.parent_direction(parent) == Some(direction) {
            return Err(Error::NoParentConnect);
        }
        if self.has_ancestor(parent, child) {
            return Err(Error::CyclicConnect { parent, child });
        }
        debug!(?parent, ?direction, ?child, "connect");

        if let Some(occupant) = self.child_at(parent, direction) {
            self.detach(parent, direction, occupant);
        }
        if let Some(link) = self.node(child).parent {
            self.detach(link.owner, link.slot, child);
        }
        let reverse = direction.reverse();
        if let Some(held) = self.child_at(child, reverse) {
            self.detach(child, reverse, held);
        }

        self.paint_epoch += 1;
        let slot = &mut self.node_mut(parent).neighbors[direction.index()];
        slot.alignment.get_or_insert(Alignment::Unaligned);
        slot.node = Some(child);
        self.node_mut(child).parent = Some(ParentLink {
            owner: parent,
            slot: direction,
        });

        let explicit = self.node(child).paint_group.is_some_and(|pg| pg.explicit);
        let pg = self.group_of(parent);
        if explicit {
            let (before, after) = self.insert_position(pg, child);
            let first = self.paint_next(child);
            self.link(Ring::PaintGroup, before, first);
            self.link(Ring::PaintGroup, child, after);
        } else {
            self.insert_into_layout(parent, direction, child);
            if self.paint_next(child) != child {
                // Move the child's descendant groups over without the child.
                let (before, after) = self.insert_position(pg, child);
                let first = self.paint_next(child);
                let last = self.paint_prev(child);
                self.link(Ring::PaintGroup, before, first);
                self.link(Ring::PaintGroup, last, after);
            }
            let n = self.node_mut(child);
            n.paint_group = None;
            n.paint = Links::lone(child);
            self.stamp_run(child, pg);
        }

        self.layout_changed(parent, direction);
        Ok(child)
    }

    /// Detach a node from its parent.
    ///
    /// Returns the detached node, or `None` if it was already a root.
    pub fn disconnect(&mut self, id: NodeId) -> Result<Option<NodeId>> {
        let n = self.node_opt(id).ok_or(Error::NoNodeFound)?;
        let Some(link) = n.parent else {
            return Ok(None);
        };
        Ok(Some(self.detach(link.owner, link.slot, id)))
    }

    /// Detach whatever occupies the `dir` slot of a node.
    ///
    /// The parent direction detaches the node itself from its parent.
    /// Returns the detached node, or `None` if the slot was empty.
    pub fn disconnect_at(&mut self, id: NodeId, dir: Direction) -> Result<Option<NodeId>> {
        let n = self.node_opt(id).ok_or(Error::NoNodeFound)?;
        if let Some(link) = n.parent
            && link.slot.reverse() == dir
        {
            return self.disconnect(id);
        }
        let occupant = n.neighbors[dir.index()].node;
        match occupant {
            Some(child) => Ok(Some(self.detach(id, dir, child))),
            None => Ok(None),
        }
    }

    /// Detach every child of a node, in layout order.
    pub fn disconnect_children(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let order = self.layout_order(id).ok_or(Error::NoNodeFound)?;
        let mut detached = Vec::new();
        for &dir in order {
            if let Some(child) = self.child_at(id, dir) {
                detached.push(self.detach(id, dir, child));
            }
        }
        Ok(detached)
    }

    /// Detach the child in `dir`; the parent slot cannot be erased.
    pub fn erase(&mut self, id: NodeId, dir: Direction) -> Result<Option<NodeId>> {
        if self.parent_direction(id) == Some(dir) {
            return Err(Error::CannotAffectParent);
        }
        self.disconnect_at(id, dir)
    }

    /// Remove a node from the arena.
    ///
    /// The node is detached from its parent and its children become
    /// standalone roots; descendants are not destroyed. The id becomes stale.
    pub fn destroy(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        debug!(?id, "destroy");
        if let Some(link) = self.node(id).parent {
            self.detach(link.owner, link.slot, id);
        }
        for dir in Direction::ALL {
            if let Some(child) = self.child_at(id, dir) {
                self.detach(id, dir, child);
            }
        }
        self.paint_epoch += 1;
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Splice `child` out of the `slot` of `parent`, leaving it a standalone
    /// root that keeps its own paint groups.
    fn detach(&mut self, parent: NodeId, slot: Direction, child: NodeId) -> NodeId {
        debug!(?parent, direction = ?slot, ?child, "disconnect");
        let implicit = self.node(child).paint_group.is_none();
        if implicit {
            self.split_paint_group(child);
        }

        let first = self.first_paint_group(child);
        let before = self.paint_prev(first);
        let after = self.paint_next(child);
        self.link(Ring::PaintGroup, before, after);
        self.link(Ring::PaintGroup, child, first);

        self.paint_epoch += 1;
        self.node_mut(parent).neighbors[slot.index()].node = None;
        let n = self.node_mut(child);
        n.parent = None;
        if implicit {
            n.paint_group = Some(PaintGroupRecord { explicit: false });
        }
        n.preference = detached_layout_preference(n.preference, slot.reverse());

        self.layout_changed(parent, slot);
        child
    }

    // --- dirty propagation ---

    /// The commit state of a node.
    pub fn layout_state(&self, id: NodeId) -> Option<LayoutState> {
        Some(self.node_opt(id)?.layout_state)
    }

    /// Returns true if the node changed since it was last committed.
    pub fn needs_commit(&self, id: NodeId) -> bool {
        self.layout_state(id) == Some(LayoutState::NeedsCommit)
    }

    /// Mark a node as consumed by the committer.
    pub fn mark_committed(&mut self, id: NodeId) {
        if let Some(n) = self.node_opt_mut(id) {
            n.layout_state = LayoutState::Committed;
        }
    }

    /// Invalidate a node and its committed ancestors.
    ///
    /// The walk stops at the root or after the first node that was not
    /// committed, since everything above it has already been notified.
    pub fn layout_changed(&mut self, id: NodeId, direction: Direction) {
        if !self.is_alive(id) {
            return;
        }
        let mut cur = id;
        let mut direction = direction;
        loop {
            trace!(node = ?cur, ?direction, "layout changed");
            let n = self.node_mut(cur);
            let old = core::mem::replace(&mut n.layout_state, LayoutState::NeedsCommit);
            let Some(link) = n.parent else {
                break;
            };
            if old != LayoutState::Committed {
                break;
            }
            cur = link.owner;
            direction = link.slot;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::{HORIZONTAL_ORDER, VERTICAL_ORDER};
    use alloc::vec;

    fn tree_with(names: &[&'static str]) -> (Tree<&'static str>, Vec<NodeId>) {
        let mut tree = Tree::new();
        let ids = names.iter().map(|n| tree.insert(Some(*n))).collect();
        (tree, ids)
    }

    #[test]
    fn new_nodes_are_standalone_roots() {
        let (tree, ids) = tree_with(&["a"]);
        let a = ids[0];
        assert!(tree.is_root(a));
        assert!(tree.is_rootlike(a));
        assert_eq!(tree.layout_preference(a), Some(LayoutPreference::Horizontal));
        assert!(tree.needs_commit(a), "new nodes need a commit");
        assert_eq!(tree.dump_layout(a), [a], "a lone node threads to itself");
        assert_eq!(tree.dump_paint_groups(a), [a]);
        assert_eq!(tree.canonical_layout_preference(a), Err(Error::NodeIsRoot));
        tree.validate().unwrap();
    }

    #[test]
    fn connect_forward() {
        let (mut tree, ids) = tree_with(&["r", "b"]);
        let (r, b) = (ids[0], ids[1]);
        assert_eq!(tree.connect(r, Direction::Forward, b), Ok(b));
        tree.validate().unwrap();
        assert_eq!(tree.node_at(r, Direction::Forward), Some(b));
        assert!(!tree.is_root(b));
        assert_eq!(tree.parent_direction(b), Some(Direction::Backward));
        assert_eq!(tree.node_at(b, Direction::Backward), Some(r), "node_at sees the parent");
        assert_eq!(tree.child_at(b, Direction::Backward), None, "child_at does not");
        assert_eq!(tree.layout_order(r), Some(&HORIZONTAL_ORDER));
        assert_eq!(tree.layout_next(r), Some(b));
        assert_eq!(tree.layout_prev(r), Some(b));
        assert_eq!(
            tree.node_alignment_mode(r, Direction::Forward),
            Some(Alignment::Unaligned),
            "connect sets an unset alignment"
        );
        assert_eq!(tree.find_paint_group(b), Some(r));
    }

    #[test]
    fn connect_rejects_bad_targets() {
        let (mut tree, ids) = tree_with(&["r", "a", "b"]);
        let (r, a, b) = (ids[0], ids[1], ids[2]);
        assert_eq!(
            tree.connect(r, Direction::Outward, a),
            Err(Error::NoOutwardConnect)
        );
        tree.connect(r, Direction::Downward, a).unwrap();
        assert_eq!(
            tree.connect(a, Direction::Upward, b),
            Err(Error::NoParentConnect),
            "the parent slot cannot be reused"
        );
        assert_eq!(
            tree.connect(a, Direction::Downward, r),
            Err(Error::CyclicConnect { parent: a, child: r })
        );
        assert_eq!(
            tree.connect(a, Direction::Forward, a),
            Err(Error::CyclicConnect { parent: a, child: a })
        );
        tree.validate().unwrap();
    }

    #[test]
    fn connect_replaces_occupant_and_previous_parent() {
        let (mut tree, ids) = tree_with(&["r", "a", "b", "s"]);
        let (r, a, b, s) = (ids[0], ids[1], ids[2], ids[3]);
        tree.connect(r, Direction::Forward, a).unwrap();
        tree.connect(s, Direction::Downward, b).unwrap();
        tree.connect(r, Direction::Forward, b).unwrap();
        tree.validate().unwrap();
        assert!(tree.is_root(a), "the previous occupant is detached");
        assert_eq!(tree.child_at(s, Direction::Downward), None, "b left its old parent");
        assert_eq!(tree.parent_of(b), Some(r));
        assert_eq!(tree.dump_layout(s), [s]);
        assert_eq!(tree.dump_layout(r), [b, r]);
    }

    #[test]
    fn connect_clears_reverse_slot_of_child() {
        let (mut tree, ids) = tree_with(&["r", "c", "x"]);
        let (r, c, x) = (ids[0], ids[1], ids[2]);
        tree.connect(c, Direction::Backward, x).unwrap();
        tree.connect(r, Direction::Forward, c).unwrap();
        tree.validate().unwrap();
        assert!(tree.is_root(x), "the reverse slot must make room for the parent");
        assert_eq!(tree.node_at(c, Direction::Backward), Some(r));
    }

    #[test]
    fn layout_thread_orders_children() {
        let (mut tree, ids) = tree_with(&["n", "b", "c"]);
        let (n, b, c) = (ids[0], ids[1], ids[2]);
        tree.connect(n, Direction::Forward, b).unwrap();
        tree.connect(n, Direction::Backward, c).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.dump_layout(n), [c, b, n]);
    }

    #[test]
    fn inward_runs_join_the_parent_thread() {
        let (mut tree, ids) = tree_with(&["n", "b", "inner", "c"]);
        let (n, b, inner, c) = (ids[0], ids[1], ids[2], ids[3]);
        tree.connect(b, Direction::Inward, inner).unwrap();
        assert_eq!(tree.dump_layout(b), [inner, b]);
        tree.connect(n, Direction::Forward, b).unwrap();
        assert_eq!(tree.dump_layout(n), [inner, b, n]);
        tree.connect(n, Direction::Backward, c).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.dump_layout(n), [c, inner, b, n]);

        assert_eq!(tree.disconnect_at(n, Direction::Backward), Ok(Some(c)));
        tree.validate().unwrap();
        assert_eq!(tree.dump_layout(c), [c], "disconnected");
        assert_eq!(tree.dump_layout(n), [inner, b, n], "finished");
        assert_eq!(tree.disconnect_at(n, Direction::Forward), Ok(Some(b)));
        assert_eq!(tree.dump_layout(b), [inner, b]);
        tree.validate().unwrap();
    }

    #[test]
    fn preference_change_rethreads() {
        let (mut tree, ids) = tree_with(&["n", "b", "c", "d"]);
        let (n, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);
        tree.connect(n, Direction::Forward, b).unwrap();
        tree.connect(b, Direction::Downward, c).unwrap();
        assert_eq!(tree.dump_layout(n), [c, b, n]);
        tree.connect(b, Direction::Forward, d).unwrap();
        assert_eq!(tree.dump_layout(n), [d, c, b, n]);
        tree.set_layout_preference(b, LayoutPreference::Vertical).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.dump_layout(n), [c, d, b, n]);
        assert_eq!(
            tree.layout_preference(b),
            Some(LayoutPreference::Perpendicular),
            "connected nodes store the relative form"
        );

        tree.set_layout_preference(b, LayoutPreference::Parent).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.dump_layout(n), [d, c, b, n], "and back");
    }

    #[test]
    fn preference_survives_disconnect() {
        let (mut tree, ids) = tree_with(&["root", "a", "b", "chi", "c"]);
        let (root, a, b, chi, c) = (ids[0], ids[1], ids[2], ids[3], ids[4]);
        tree.connect(chi, Direction::Forward, c).unwrap();
        tree.connect(a, Direction::Downward, chi).unwrap();
        tree.connect(a, Direction::Forward, b).unwrap();
        tree.connect(root, Direction::Forward, a).unwrap();
        tree.set_layout_preference(a, LayoutPreference::Perpendicular)
            .unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.layout_next(root), Some(c));

        let order = tree.layout_order(a);
        assert_eq!(tree.disconnect_at(root, Direction::Forward), Ok(Some(a)));
        tree.validate().unwrap();
        assert_eq!(tree.layout_preference(a), Some(LayoutPreference::Vertical));
        assert_eq!(tree.layout_order(a), order, "the layout order is kept");
        assert_eq!(tree.dump_layout(a), [c, chi, b, a]);
    }

    #[test]
    fn root_preferences() {
        let (mut tree, ids) = tree_with(&["r", "f", "d"]);
        let (r, f, d) = (ids[0], ids[1], ids[2]);
        tree.connect(r, Direction::Forward, f).unwrap();
        tree.connect(r, Direction::Downward, d).unwrap();
        assert_eq!(
            tree.set_layout_preference(r, LayoutPreference::Parent),
            Err(Error::BadLayoutPreference)
        );
        tree.set_layout_preference(r, LayoutPreference::Vertical).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.layout_order(r), Some(&VERTICAL_ORDER));
        assert_eq!(tree.dump_layout(r), [d, f, r]);
        tree.pull(r, Direction::Backward).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.dump_layout(r), [f, d, r]);
        assert_eq!(tree.pull(r, Direction::Inward), Err(Error::BadNodeDirection));
    }

    #[test]
    fn vertical_preference_under_vertical_edge() {
        let (mut tree, ids) = tree_with(&["r", "v"]);
        let (r, v) = (ids[0], ids[1]);
        tree.set_layout_preference(v, LayoutPreference::Vertical).unwrap();
        tree.connect(r, Direction::Downward, v).unwrap();
        assert_eq!(
            tree.canonical_layout_preference(v),
            Ok(LayoutPreference::Parent)
        );
        assert_eq!(tree.layout_order(v), Some(&VERTICAL_ORDER));
    }

    #[test]
    fn disconnect_on_root_is_noop() {
        let (mut tree, ids) = tree_with(&["r"]);
        assert_eq!(tree.disconnect(ids[0]), Ok(None));
        assert_eq!(tree.disconnect_at(ids[0], Direction::Upward), Ok(None));
        tree.validate().unwrap();
    }

    #[test]
    fn disconnect_through_parent_direction() {
        let (mut tree, ids) = tree_with(&["r", "m", "x"]);
        let (r, m, x) = (ids[0], ids[1], ids[2]);
        tree.connect(r, Direction::Forward, m).unwrap();
        tree.connect(m, Direction::Forward, x).unwrap();
        assert_eq!(tree.dump_layout(r), [x, m, r]);
        assert_eq!(tree.disconnect_at(m, Direction::Backward), Ok(Some(m)));
        tree.validate().unwrap();
        assert_eq!(tree.dump_layout(r), [r]);
        assert_eq!(tree.dump_layout(m), [x, m]);
    }

    #[test]
    fn disconnect_simple() {
        let (mut tree, ids) = tree_with(&["root", "mid", "leaf"]);
        let (root, mid, leaf) = (ids[0], ids[1], ids[2]);
        tree.connect(root, Direction::Forward, mid).unwrap();
        tree.connect(mid, Direction::Forward, leaf).unwrap();
        assert_eq!(tree.layout_next(root), Some(leaf));
        tree.disconnect(leaf).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.layout_next(root), Some(mid));
    }

    #[test]
    fn erase_refuses_parent() {
        let (mut tree, ids) = tree_with(&["r", "c"]);
        let (r, c) = (ids[0], ids[1]);
        tree.connect(r, Direction::Inward, c).unwrap();
        assert_eq!(
            tree.erase(c, Direction::Outward),
            Err(Error::CannotAffectParent)
        );
        assert_eq!(tree.erase(r, Direction::Inward), Ok(Some(c)));
        assert!(!tree.has_any_nodes(r));
        tree.validate().unwrap();
    }

    #[test]
    fn destroy_detaches_children() {
        let (mut tree, ids) = tree_with(&["r", "m", "a", "b"]);
        let (r, m, a, b) = (ids[0], ids[1], ids[2], ids[3]);
        tree.connect(r, Direction::Downward, m).unwrap();
        tree.connect(m, Direction::Forward, a).unwrap();
        tree.connect(m, Direction::Inward, b).unwrap();
        tree.crease(b).unwrap();
        tree.destroy(m);
        tree.validate().unwrap();
        assert!(!tree.is_alive(m));
        assert!(tree.is_root(a) && tree.is_root(b), "children become roots");
        assert_eq!(tree.dump_layout(r), [r]);
        assert_eq!(tree.dump_paint_groups(r), [r]);
        assert_eq!(tree.paint_group(b).map(|pg| pg.is_explicit()), Some(true));

        let reused = tree.insert(Some("new"));
        assert_eq!(reused.idx(), m.idx(), "slot is reused");
        assert_ne!(reused, m, "with a new generation");
        assert_eq!(tree.value(m), None, "stale ids see nothing");
        assert_eq!(tree.value(reused), Some(&"new"));
    }

    #[test]
    fn disconnect_children_in_layout_order() {
        let (mut tree, ids) = tree_with(&["top", "r", "b", "f", "d", "i"]);
        let (top, r, b, f, d, i) = (ids[0], ids[1], ids[2], ids[3], ids[4], ids[5]);
        tree.connect(top, Direction::Downward, r).unwrap();
        tree.connect(r, Direction::Inward, i).unwrap();
        tree.connect(r, Direction::Downward, d).unwrap();
        tree.connect(r, Direction::Forward, f).unwrap();
        tree.connect(r, Direction::Backward, b).unwrap();
        tree.crease(d).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.dump_paint_groups(top), [d, top]);

        assert_eq!(tree.disconnect_children(r), Ok(vec![b, f, d, i]));
        tree.validate().unwrap();
        assert!(!tree.has_any_nodes(r), "every slot is empty");
        assert_eq!(tree.parent_of(r), Some(top), "the parent edge is kept");
        for child in [b, f, d, i] {
            assert!(tree.is_root(child), "children become roots");
        }
        assert_eq!(tree.dump_layout(top), [r, top]);
        assert_eq!(tree.dump_paint_groups(top), [top]);
        assert!(tree.paint_group(d).is_some_and(|pg| pg.is_explicit()), "d stays creased");
        assert_eq!(tree.disconnect_children(r), Ok(vec![]), "nothing left");
    }

    #[test]
    fn layout_changed_stops_at_dirty_ancestor() {
        let (mut tree, ids) = tree_with(&["r", "a", "b", "c"]);
        let (r, a, b, c) = (ids[0], ids[1], ids[2], ids[3]);
        tree.connect(r, Direction::Downward, a).unwrap();
        tree.connect(a, Direction::Downward, b).unwrap();
        for id in [r, a, b] {
            tree.mark_committed(id);
        }
        tree.connect(b, Direction::Forward, c).unwrap();
        assert!(tree.needs_commit(b) && tree.needs_commit(a) && tree.needs_commit(r));

        for id in [r, b] {
            tree.mark_committed(id);
        }
        tree.layout_changed(b, Direction::Forward);
        assert!(tree.needs_commit(b));
        assert_eq!(
            tree.layout_state(r),
            Some(LayoutState::Committed),
            "a was already dirty, so r is not notified again"
        );
    }

    #[test]
    fn payload_setters() {
        let (mut tree, ids) = tree_with(&["r", "c"]);
        let (r, c) = (ids[0], ids[1]);
        tree.connect(r, Direction::Forward, c).unwrap();
        tree.set_separation_at(r, Direction::Forward, 12.0);
        assert_eq!(tree.separation_at(r, Direction::Forward), Ok(12.0));
        assert_eq!(
            tree.separation_at(c, Direction::Backward),
            Ok(12.0),
            "the parent direction reads the parent's slot"
        );
        assert_eq!(tree.separation_at(r, Direction::Inward), Err(Error::BadNodeDirection));
        assert_eq!(tree.separation_at(r, Direction::Upward), Err(Error::NoNodeFound));

        tree.set_position_at(r, Direction::Forward, Point::new(3.0, 4.0));
        assert_eq!(tree.position(r, Direction::Forward), Some(Point::new(3.0, 4.0)));
        tree.set_line_length_at(r, Direction::Forward, 5.0);
        assert_eq!(tree.line_length_at(r, Direction::Forward), Some(5.0));

        tree.mark_committed(r);
        tree.set_axis_overlap(r, Direction::Forward, AxisOverlap::Prevented);
        assert!(tree.needs_commit(r), "overlap changes invalidate layout");
        assert_eq!(
            tree.axis_overlap(r, Direction::Forward),
            Some(AxisOverlap::Prevented)
        );
        tree.set_node_alignment_mode(r, Direction::Forward, Alignment::Center);
        assert_eq!(
            tree.node_alignment_mode(r, Direction::Forward),
            Some(Alignment::Center)
        );

        assert_eq!(tree.set_value(c, Some("child")), Some("c"));
        if let Some(v) = tree.value_mut(c) {
            *v = "renamed";
        }
        assert_eq!(tree.value(c), Some(&"renamed"));
    }

    #[test]
    fn navigation_queries() {
        let (mut tree, ids) = tree_with(&["r", "a", "b"]);
        let (r, a, b) = (ids[0], ids[1], ids[2]);
        tree.connect(r, Direction::Inward, a).unwrap();
        tree.connect(a, Direction::Upward, b).unwrap();
        assert!(tree.is_rootlike(a), "inward children are rootlike");
        assert!(!tree.is_rootlike(b));
        assert_eq!(tree.root_of(b), Some(r));
        assert_eq!(tree.path_to_root(b).as_slice(), &[b, a, r]);
        assert!(tree.has_ancestor(b, r));
        assert!(tree.has_ancestor(b, b), "a node is its own ancestor");
        assert!(!tree.has_ancestor(r, b));
        assert_eq!(tree.has_nodes(a, Axis::Vertical), (Some(Direction::Upward), None));
        assert_eq!(
            tree.occupied_directions(a),
            DirectionSet::UPWARD | DirectionSet::OUTWARD
        );

        let mut seen = vec![];
        tree.each_child(a, |child, dir| seen.push((child, dir)));
        assert_eq!(seen, [(b, Direction::Upward)]);
    }
}
