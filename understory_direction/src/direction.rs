// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Directions, axes, and the two fixed layout orders.

use core::fmt;
use core::str::FromStr;

use crate::error::Error;

/// One of the six connection slots of a node.
///
/// The four cardinal directions lie on the [`Axis::Horizontal`] and
/// [`Axis::Vertical`] axes. [`Direction::Inward`] and [`Direction::Outward`]
/// are axis-less: an inward child is nested inside its parent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Nested inside the node.
    Inward,
    /// Out of the node; nodes may never be connected in this direction.
    Outward,
    /// Below the node.
    Downward,
    /// Above the node.
    Upward,
    /// Before the node on the horizontal axis.
    Backward,
    /// After the node on the horizontal axis.
    Forward,
}

/// Number of slots per node.
pub const NUM_DIRECTIONS: usize = 6;

/// Child order used by nodes that lay out along the horizontal axis first.
pub const HORIZONTAL_ORDER: [Direction; NUM_DIRECTIONS] = [
    Direction::Backward,
    Direction::Forward,
    Direction::Downward,
    Direction::Upward,
    Direction::Inward,
    Direction::Outward,
];

/// Child order used by nodes that lay out along the vertical axis first.
pub const VERTICAL_ORDER: [Direction; NUM_DIRECTIONS] = [
    Direction::Downward,
    Direction::Upward,
    Direction::Backward,
    Direction::Forward,
    Direction::Inward,
    Direction::Outward,
];

/// A layout axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// [`Direction::Backward`] and [`Direction::Forward`].
    Horizontal,
    /// [`Direction::Upward`] and [`Direction::Downward`].
    Vertical,
}

impl Direction {
    /// All directions, in slot order.
    pub const ALL: [Self; NUM_DIRECTIONS] = [
        Self::Inward,
        Self::Outward,
        Self::Downward,
        Self::Upward,
        Self::Backward,
        Self::Forward,
    ];

    /// The four cardinal directions.
    pub const CARDINAL: [Self; 4] = [Self::Downward, Self::Upward, Self::Forward, Self::Backward];

    /// Slot index of this direction, in `0..NUM_DIRECTIONS`.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Upper-case name of the direction.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Inward => "INWARD",
            Self::Outward => "OUTWARD",
            Self::Downward => "DOWNWARD",
            Self::Upward => "UPWARD",
            Self::Backward => "BACKWARD",
            Self::Forward => "FORWARD",
        }
    }

    /// The opposite direction.
    #[inline]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Inward => Self::Outward,
            Self::Outward => Self::Inward,
            Self::Downward => Self::Upward,
            Self::Upward => Self::Downward,
            Self::Backward => Self::Forward,
            Self::Forward => Self::Backward,
        }
    }

    /// The axis this direction lies on, or `None` for inward and outward.
    #[inline]
    pub const fn axis(self) -> Option<Axis> {
        match self {
            Self::Backward | Self::Forward => Some(Axis::Horizontal),
            Self::Downward | Self::Upward => Some(Axis::Vertical),
            Self::Inward | Self::Outward => None,
        }
    }

    /// Whether this is one of the four planar directions.
    #[inline]
    pub const fn is_cardinal(self) -> bool {
        self.axis().is_some()
    }

    /// Whether this direction lies on the vertical axis.
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Downward | Self::Upward)
    }

    /// Whether this direction lies on the horizontal axis.
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Backward | Self::Forward)
    }

    /// Rotate a cardinal direction a quarter turn counter-clockwise.
    pub fn turn_left(self) -> Result<Self, Error> {
        match self {
            Self::Forward => Ok(Self::Upward),
            Self::Backward => Ok(Self::Downward),
            Self::Downward => Ok(Self::Forward),
            Self::Upward => Ok(Self::Backward),
            Self::Inward | Self::Outward => Err(Error::BadNodeDirection),
        }
    }

    /// Rotate a cardinal direction a quarter turn clockwise.
    pub fn turn_right(self) -> Result<Self, Error> {
        self.turn_left().map(Self::reverse)
    }

    /// The positive direction of the axis perpendicular to this one.
    pub fn turn_positive(self) -> Result<Self, Error> {
        self.perpendicular_axis()
            .map(Axis::positive_direction)
            .ok_or(Error::BadAxis)
    }

    /// The negative direction of the axis perpendicular to this one.
    pub fn turn_negative(self) -> Result<Self, Error> {
        self.turn_positive().map(Self::reverse)
    }

    /// The axis perpendicular to this direction's axis.
    pub const fn perpendicular_axis(self) -> Option<Axis> {
        match self.axis() {
            Some(axis) => Some(axis.perpendicular()),
            None => None,
        }
    }

    /// Whether this is the positive direction of its axis.
    ///
    /// Forward and downward are positive.
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::Forward | Self::Downward)
    }

    /// Whether this is the negative direction of its axis.
    pub const fn is_negative(self) -> bool {
        matches!(self, Self::Backward | Self::Upward)
    }

    /// `1.0` for positive directions, `-1.0` otherwise.
    pub const fn sign(self) -> f64 {
        if self.is_positive() { 1.0 } else { -1.0 }
    }

    /// The direction a caret alternates to when growing a run of nodes.
    pub fn alternate(self) -> Result<Self, Error> {
        match self {
            Self::Downward | Self::Inward => Ok(Self::Forward),
            Self::Forward => Ok(Self::Downward),
            _ => Err(Error::BadNodeDirection),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = Error;

    /// Parses a direction from its first letter, case-insensitively.
    ///
    /// `"f"`, `"Forward"` and `"FORWARD"` all read as [`Direction::Forward`].
    fn from_str(s: &str) -> Result<Self, Error> {
        match s.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('f') => Ok(Self::Forward),
            Some('b') => Ok(Self::Backward),
            Some('u') => Ok(Self::Upward),
            Some('d') => Ok(Self::Downward),
            Some('i') => Ok(Self::Inward),
            Some('o') => Ok(Self::Outward),
            _ => Err(Error::BadNodeDirection),
        }
    }
}

impl Axis {
    /// The other axis.
    #[inline]
    pub const fn perpendicular(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }

    /// [`Direction::Forward`] or [`Direction::Downward`].
    #[inline]
    pub const fn positive_direction(self) -> Direction {
        match self {
            Self::Horizontal => Direction::Forward,
            Self::Vertical => Direction::Downward,
        }
    }

    /// [`Direction::Backward`] or [`Direction::Upward`].
    #[inline]
    pub const fn negative_direction(self) -> Direction {
        self.positive_direction().reverse()
    }

    /// The layout order that visits this axis first.
    pub const fn layout_order(self) -> &'static [Direction; NUM_DIRECTIONS] {
        match self {
            Self::Horizontal => &HORIZONTAL_ORDER,
            Self::Vertical => &VERTICAL_ORDER,
        }
    }

    /// Upper-case name of the axis.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Horizontal => "HORIZONTAL",
            Self::Vertical => "VERTICAL",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('h') => Ok(Self::Horizontal),
            Some('v') => Ok(Self::Vertical),
            _ => Err(Error::BadAxis),
        }
    }
}

bitflags::bitflags! {
    /// A set of directions, typically the occupied slots of a node.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DirectionSet: u8 {
        /// [`Direction::Inward`].
        const INWARD   = 1 << 0;
        /// [`Direction::Outward`].
        const OUTWARD  = 1 << 1;
        /// [`Direction::Downward`].
        const DOWNWARD = 1 << 2;
        /// [`Direction::Upward`].
        const UPWARD   = 1 << 3;
        /// [`Direction::Backward`].
        const BACKWARD = 1 << 4;
        /// [`Direction::Forward`].
        const FORWARD  = 1 << 5;
    }
}

impl DirectionSet {
    /// Whether the set contains `direction`.
    #[inline]
    pub fn has(self, direction: Direction) -> bool {
        self.contains(Self::from(direction))
    }

    /// Iterate the directions in the set, in slot order.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.has(*d))
    }
}

impl From<Direction> for DirectionSet {
    fn from(direction: Direction) -> Self {
        Self::from_bits_truncate(1 << direction.index())
    }
}
