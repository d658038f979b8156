// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout preferences and the pure functions that resolve them.
//!
//! A node declares a [`LayoutPreference`]. Once it has a parent, the
//! declaration is read against the axis of the parent edge: an absolute
//! preference ([`LayoutPreference::Horizontal`], [`LayoutPreference::Vertical`])
//! becomes a relative one ([`LayoutPreference::Parent`],
//! [`LayoutPreference::Perpendicular`]). The relative form then picks one of
//! the two fixed layout orders.
//!
//! The inward edge has no axis. It resolves as if it were vertical, so an
//! inward child that prefers [`LayoutPreference::Vertical`] follows its parent.

use core::fmt;
use core::str::FromStr;

use crate::direction::{Axis, Direction, HORIZONTAL_ORDER, NUM_DIRECTIONS, VERTICAL_ORDER};
use crate::error::Error;

/// The axis a node prefers to lay its children out along.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum LayoutPreference {
    /// Lay out along the horizontal axis first.
    #[default]
    Horizontal,
    /// Lay out along the vertical axis first.
    Vertical,
    /// Lay out along the axis of the parent edge first.
    Parent,
    /// Lay out along the axis perpendicular to the parent edge first.
    Perpendicular,
}

impl LayoutPreference {
    /// Whether this is [`LayoutPreference::Horizontal`] or [`LayoutPreference::Vertical`].
    pub const fn is_absolute(self) -> bool {
        matches!(self, Self::Horizontal | Self::Vertical)
    }

    /// The absolute preference for an axis.
    pub const fn from_axis(axis: Axis) -> Self {
        match axis {
            Axis::Horizontal => Self::Horizontal,
            Axis::Vertical => Self::Vertical,
        }
    }

    /// Upper-case name of the preference.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Horizontal => "HORIZONTAL",
            Self::Vertical => "VERTICAL",
            Self::Parent => "PARENT",
            Self::Perpendicular => "PERPENDICULAR",
        }
    }
}

impl fmt::Display for LayoutPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutPreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with('h') {
            Ok(Self::Horizontal)
        } else if lower.starts_with('v') {
            Ok(Self::Vertical)
        } else if lower.starts_with("pa") {
            Ok(Self::Parent)
        } else if lower.starts_with("pe") {
            Ok(Self::Perpendicular)
        } else {
            Err(Error::BadLayoutPreference)
        }
    }
}

/// The axis a parent edge resolves preferences against.
///
/// Axis-less edges resolve as [`Axis::Vertical`].
pub const fn edge_axis(parent_direction: Direction) -> Axis {
    match parent_direction.axis() {
        Some(axis) => axis,
        None => Axis::Vertical,
    }
}

/// Resolve a declared preference against the axis of the parent edge.
///
/// The result is always [`LayoutPreference::Parent`] or
/// [`LayoutPreference::Perpendicular`].
pub const fn canonical_layout_preference(
    declared: LayoutPreference,
    parent_direction: Direction,
) -> LayoutPreference {
    let axis = edge_axis(parent_direction);
    match declared {
        LayoutPreference::Horizontal => match axis {
            Axis::Horizontal => LayoutPreference::Parent,
            Axis::Vertical => LayoutPreference::Perpendicular,
        },
        LayoutPreference::Vertical => match axis {
            Axis::Vertical => LayoutPreference::Parent,
            Axis::Horizontal => LayoutPreference::Perpendicular,
        },
        LayoutPreference::Parent | LayoutPreference::Perpendicular => declared,
    }
}

/// Validate a preference before it is stored on a node.
///
/// Roots (`parent_direction == None`) accept only absolute preferences and
/// keep them as given. Connected nodes store the canonical form.
pub fn sanitize_layout_preference(
    given: LayoutPreference,
    parent_direction: Option<Direction>,
) -> Result<LayoutPreference, Error> {
    match parent_direction {
        None if given.is_absolute() => Ok(given),
        None => Err(Error::BadLayoutPreference),
        Some(dir) => Ok(canonical_layout_preference(given, dir)),
    }
}

/// The order a node visits its neighbor slots in.
pub const fn layout_order_for(
    declared: LayoutPreference,
    parent_direction: Option<Direction>,
) -> &'static [Direction; NUM_DIRECTIONS] {
    let Some(dir) = parent_direction else {
        return match declared {
            LayoutPreference::Horizontal | LayoutPreference::Perpendicular => &HORIZONTAL_ORDER,
            LayoutPreference::Vertical | LayoutPreference::Parent => &VERTICAL_ORDER,
        };
    };
    let axis = edge_axis(dir);
    match canonical_layout_preference(declared, dir) {
        LayoutPreference::Perpendicular => axis.perpendicular().layout_order(),
        _ => axis.layout_order(),
    }
}

/// The absolute preference that keeps a node's layout order once it is
/// detached from an edge in `parent_direction`.
pub const fn detached_layout_preference(
    stored: LayoutPreference,
    parent_direction: Direction,
) -> LayoutPreference {
    let axis = edge_axis(parent_direction);
    match stored {
        LayoutPreference::Parent => LayoutPreference::from_axis(axis),
        LayoutPreference::Perpendicular => LayoutPreference::from_axis(axis.perpendicular()),
        LayoutPreference::Horizontal | LayoutPreference::Vertical => stored,
    }
}
