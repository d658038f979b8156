// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for structural operations.

use crate::types::NodeId;

/// Errors raised by direction parsing and structural mutations.
///
/// Errors are raised before or during a mutation and are never retried.
/// A mutation that fails part-way through a splice leaves the tree in an
/// unspecified state; [`Tree::validate`](crate::Tree::validate) reports the
/// damage but nothing rolls it back.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A direction was malformed or not valid for the operation.
    #[error("bad node direction")]
    BadNodeDirection,
    /// Nodes cannot be connected in the outward direction.
    #[error("nodes cannot be connected in the outward direction")]
    NoOutwardConnect,
    /// Nodes cannot be connected in their own parent direction.
    #[error("nodes cannot be connected in their parent direction")]
    NoParentConnect,
    /// The operation requires a parent edge.
    #[error("node is a root")]
    NodeIsRoot,
    /// The layout preference is not valid for this node.
    #[error("bad layout preference")]
    BadLayoutPreference,
    /// An axis was malformed or not valid for the operation.
    #[error("bad axis")]
    BadAxis,
    /// A node alignment mode could not be parsed.
    #[error("bad node alignment")]
    BadNodeAlignment,
    /// An axis overlap policy could not be parsed.
    #[error("bad axis overlap")]
    BadAxisOverlap,
    /// The parent slot cannot be erased from the child.
    #[error("cannot affect parent")]
    CannotAffectParent,
    /// A paint-group cycle contains a node that does not own a paint group.
    #[error("{0:?} is not a paint group")]
    NotPaintGroup(NodeId),
    /// A layout-order thread does not close or does not cover its group.
    #[error("layout thread through {0:?} is broken")]
    BrokenLayoutThread(NodeId),
    /// The node would become its own ancestor.
    #[error("connecting {child:?} beneath {parent:?} would create a cycle")]
    CyclicConnect {
        /// Node that would receive the child.
        parent: NodeId,
        /// Node being connected.
        child: NodeId,
    },
    /// No node was found where one was expected.
    #[error("no node found")]
    NoNodeFound,
}

/// Result type for fallible tree operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;
