// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the direction tree: node identifiers, layout state, and
//! per-slot neighbor payload.

use core::fmt;
use core::str::FromStr;

use kurbo::Point;

use crate::error::Error;

/// Identifier for a node in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Commit state of a node.
///
/// Structural changes mark a node [`LayoutState::NeedsCommit`]. An external
/// committer flips nodes back to [`LayoutState::Committed`] once it has
/// consumed them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum LayoutState {
    /// The node changed since it was last committed.
    #[default]
    NeedsCommit,
    /// The node is up to date.
    Committed,
}

/// How a child is aligned against its parent along the connecting axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Alignment {
    /// No alignment; the child is placed by its own position.
    #[default]
    Unaligned,
    /// Align the child's negative edge.
    Negative,
    /// Center the child.
    Center,
    /// Align the child's positive edge.
    Positive,
}

impl Alignment {
    /// Upper-case name of the mode.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unaligned => "NULL",
            Self::Negative => "NEGATIVE",
            Self::Center => "CENTER",
            Self::Positive => "POSITIVE",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Alignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "n" | "null" | "none" | "unaligned" => Ok(Self::Unaligned),
            "neg" | "negative" => Ok(Self::Negative),
            "c" | "center" => Ok(Self::Center),
            "pos" | "positive" => Ok(Self::Positive),
            _ => Err(Error::BadNodeAlignment),
        }
    }
}

/// Whether a child may overlap its parent along the perpendicular axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum AxisOverlap {
    /// Let the layout engine decide.
    #[default]
    Default,
    /// Overlap is permitted.
    Allowed,
    /// Overlap is prevented.
    Prevented,
}

impl AxisOverlap {
    /// Upper-case name of the policy.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Allowed => "ALLOWED",
            Self::Prevented => "PREVENTED",
        }
    }
}

impl fmt::Display for AxisOverlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AxisOverlap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "d" | "default" => Ok(Self::Default),
            "a" | "allowed" => Ok(Self::Allowed),
            "p" | "prevented" => Ok(Self::Prevented),
            _ => Err(Error::BadAxisOverlap),
        }
    }
}

/// Payload attached to one neighbor slot of a node.
///
/// Only [`NeighborData::node`] takes part in the tree structure. The rest is
/// carried for the layout engine that consumes this tree.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborData {
    /// The connected child, if any.
    pub node: Option<NodeId>,
    /// Alignment mode; set to [`Alignment::Unaligned`] on connect when unset.
    pub alignment: Option<Alignment>,
    /// Axis overlap policy.
    pub axis_overlap: AxisOverlap,
    /// Child position relative to the parent.
    pub position: Point,
    /// Distance between the parent and the child along the connecting axis.
    pub separation: f64,
    /// Length of the connecting line.
    pub line_length: f64,
}

impl Default for NeighborData {
    fn default() -> Self {
        Self {
            node: None,
            alignment: None,
            axis_overlap: AxisOverlap::Default,
            position: Point::ZERO,
            separation: 0.0,
            line_length: 0.0,
        }
    }
}
