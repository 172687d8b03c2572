//! Node identifiers, node locations and synthetic id generation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::{Add, Mul, Sub};

/// Identifier of a node (treenode) in a tree.
///
/// Ordered and hashable; synthetic nodes created by resampling use negative
/// identifiers drawn from an [IdGenerator].
pub type NodeId = i64;

/// Identifier of a whole skeleton.
pub type SkeletonId = i64;

// =#========================================================================#=
// LOCATION
// =#========================================================================#=
/// A point in 3-D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    /// Creates a new location from its coordinates.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Location { x, y, z }
    }

    /// Euclidean norm of this location seen as a vector.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to another location.
    pub fn distance(&self, other: &Location) -> f64 {
        (*self - *other).norm()
    }

    /// Whether every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Coordinates as an array in `x, y, z` order.
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Location {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Location { x, y, z }
    }
}

impl Sub for Location {
    type Output = Location;

    fn sub(self, rhs: Location) -> Location {
        Location::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Add for Location {
    type Output = Location;

    fn add(self, rhs: Location) -> Location {
        Location::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Mul<f64> for Location {
    type Output = Location;

    fn mul(self, rhs: f64) -> Location {
        Location::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

// =#========================================================================#=
// ID GENERATOR
// =#========================================================================#=
/// Iterator of fresh ids, counting down from `start` and skipping every
/// value in `skip`. Ends once `NodeId::MIN` has been passed.
///
/// # Example
/// ```
/// use arbor::model::IdGenerator;
///
/// let ids: Vec<_> = IdGenerator::new(-1, [-2, -3]).take(3).collect();
/// assert_eq!(ids, vec![-1, -4, -5]);
///
/// let last: Vec<_> = IdGenerator::new(i64::MIN + 1, [i64::MIN]).collect();
/// assert_eq!(last, vec![i64::MIN + 1]);
/// ```
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: Option<NodeId>,
    skip: BTreeSet<NodeId>,
}

impl IdGenerator {
    /// Creates a generator starting at `start` which never yields a value in `skip`.
    pub fn new(start: NodeId, skip: impl IntoIterator<Item = NodeId>) -> Self {
        IdGenerator {
            next: Some(start),
            skip: skip.into_iter().collect(),
        }
    }
}

impl Iterator for IdGenerator {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let mut id = self.next?;
        while self.skip.contains(&id) {
            match id.checked_sub(1) {
                Some(lower) => id = lower,
                None => {
                    self.next = None;
                    return None;
                }
            }
        }
        self.next = id.checked_sub(1);
        Some(id)
    }
}
