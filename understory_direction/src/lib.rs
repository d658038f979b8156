// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Direction: a directional node tree with layout-order threading and paint groups.
//!
//! Every node has six neighbor slots, one per [`Direction`]: four cardinal slots along two axes,
//! plus [`Direction::Inward`] and [`Direction::Outward`], which have no axis. A child connected
//! into a slot reaches its parent through the reverse direction.
//!
//! The tree keeps two circular orderings up to date on every mutation, so an incremental
//! committer never has to walk the whole structure:
//!
//! - The **layout-order thread** lists the nodes of one paint group in post-order. Each node
//!   visits its children in a fixed order picked from its [`LayoutPreference`] and the axis of
//!   its parent edge. Changing a preference re-threads a node in constant time.
//! - The **paint-group ring** lists the paint groups of one tree. Roots always own a group;
//!   [`Tree::crease`] splits a subtree off into its own group and [`Tree::uncrease`] merges it back.
//!   Groups are kept in paint order, with the root painted last.
//!
//! Structural changes mark the affected node and its committed ancestors
//! [`LayoutState::NeedsCommit`]. Draining that state into geometry and paint batches is left to
//! the consumer.
//!
//! ## Not a layout engine
//!
//! Slots carry alignment, separation, and positions for a layout engine, but this crate does not
//! measure or place anything. It maintains structure and order only.
//!
//! ## API overview
//!
//! - [`Tree`]: arena of nodes plus the layout thread and paint-group ring.
//! - [`NodeId`]: generational handle of a node.
//! - [`Direction`], [`Axis`], [`DirectionSet`]: slots, axes, and sets of slots.
//! - [`LayoutPreference`]: the axis a node lays its children out along.
//! - [`NeighborData`], [`Alignment`], [`AxisOverlap`]: per-slot payload.
//! - [`PaintGroup`]: read-only view of one paint group.
//! - [`Error`]: failure kinds for structural operations.
//!
//! Key operations:
//! - [`Tree::insert`] → [`NodeId`]
//! - [`Tree::connect`] / [`Tree::disconnect`] / [`Tree::disconnect_at`] / [`Tree::erase`] /
//!   [`Tree::destroy`]
//! - [`Tree::set_layout_preference`] and [`Tree::layout_order`]
//! - [`Tree::crease`] / [`Tree::uncrease`], [`Tree::find_paint_group`], [`Tree::dump_paint_groups`]
//! - [`Tree::for_each_node`] and [`Tree::for_each_paint_group`]
//! - [`Tree::needs_commit`] / [`Tree::mark_committed`] for the committer.
//! - [`Tree::validate`] checks every structural invariant; tests call it after each mutation.
//!
//! ## Example
//!
//! ```rust
//! use understory_direction::{Direction, Tree};
//!
//! let mut tree = Tree::new();
//! let root = tree.insert(Some("root"));
//! let menu = tree.insert(Some("menu"));
//! let item = tree.insert(Some("item"));
//! tree.connect(root, Direction::Downward, menu).unwrap();
//! tree.connect(menu, Direction::Forward, item).unwrap();
//! assert_eq!(tree.dump_layout(root), [item, menu, root]);
//!
//! // Give the menu its own paint group.
//! tree.crease(menu).unwrap();
//! assert_eq!(tree.dump_layout(root), [root]);
//! assert_eq!(tree.dump_paint_groups(root), [menu, root]);
//! assert_eq!(tree.find_paint_group(item), Some(menu));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod direction;
mod error;
mod paint_group;
mod preference;
mod thread;
mod tree;
mod types;
mod validate;

pub use direction::{Axis, Direction, DirectionSet, HORIZONTAL_ORDER, NUM_DIRECTIONS, VERTICAL_ORDER};
pub use error::{Error, Result};
pub use paint_group::PaintGroup;
pub use preference::{
    LayoutPreference, canonical_layout_preference, detached_layout_preference, edge_axis,
    layout_order_for, sanitize_layout_preference,
};
pub use tree::Tree;
pub use types::{Alignment, AxisOverlap, LayoutState, NeighborData, NodeId};
