//! Bounding-box geometry for the gistree spatial index.
//! Boxes are N-dimensional (dimensionality fixed per tree at construction),
//! generalizing the fixed 2-D rectangle math a single-purpose R-tree needs.
#![deny(missing_docs)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a `Box` fails the `minᵢ ≤ maxᵢ` invariant.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("invalid box: dimension {dimension} has min {min} > max {max}")]
pub struct InvalidBox {
    /// Offending dimension index.
    pub dimension: usize,
    /// The offending min bound.
    pub min: f64,
    /// The offending max bound.
    pub max: f64,
}

/// An axis-aligned bounding box: an ordered sequence of per-dimension
/// `(min, max)` ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Box {
    ranges: Vec<(f64, f64)>,
}

impl Box {
    /// Construct a box from per-dimension `(min, max)` ranges.
    ///
    /// Returns an error if any `minᵢ > maxᵢ`.
    pub fn new(ranges: Vec<(f64, f64)>) -> Result<Self, InvalidBox> {
        for (i, &(min, max)) in ranges.iter().enumerate() {
            if min > max {
                return Err(InvalidBox { dimension: i, min, max });
            }
        }
        Ok(Self { ranges })
    }

    /// The distinguished empty/zero box for the given dimensionality: all
    /// ranges `(0, 0)`. Represents "unknown/reset" for an empty root only.
    pub fn empty(dimensionality: usize) -> Self {
        Self { ranges: vec![(0.0, 0.0); dimensionality] }
    }

    /// Number of dimensions.
    pub fn dimensionality(&self) -> usize {
        self.ranges.len()
    }

    /// Per-dimension `(min, max)` ranges.
    pub fn ranges(&self) -> &[(f64, f64)] {
        &self.ranges
    }

    /// `area(b)` = product of `(maxᵢ − minᵢ)`. Zero if any span is zero.
    pub fn area(&self) -> f64 {
        self.ranges.iter().map(|&(min, max)| max - min).product()
    }

    /// Element-wise `(min(minᵢ), max(maxᵢ))` union with `other`.
    ///
    /// Panics if dimensionalities differ — boxes within one tree always
    /// share a dimensionality fixed at construction, so a mismatch here is
    /// a caller bug, not a recoverable input error.
    pub fn union(&self, other: &Box) -> Box {
        assert_eq!(
            self.dimensionality(),
            other.dimensionality(),
            "union of boxes with mismatched dimensionality"
        );
        let ranges = self
            .ranges
            .iter()
            .zip(other.ranges.iter())
            .map(|(&(a_min, a_max), &(b_min, b_max))| (a_min.min(b_min), a_max.max(b_max)))
            .collect();
        Box { ranges }
    }

    /// `enlargement(container, candidate)` = area of their union minus the
    /// container's own area.
    pub fn enlargement(&self, candidate: &Box) -> f64 {
        self.union(candidate).area() - self.area()
    }

    /// `overlaps(a, b)`: true iff every dimension's ranges intersect.
    pub fn overlaps(&self, other: &Box) -> bool {
        self.ranges
            .iter()
            .zip(other.ranges.iter())
            .all(|(&(a_min, a_max), &(b_min, b_max))| a_min <= b_max && b_min <= a_max)
    }

    /// `contains(a, b)`: true iff `a` fully encloses `b` in every dimension.
    pub fn contains(&self, other: &Box) -> bool {
        self.ranges
            .iter()
            .zip(other.ranges.iter())
            .all(|(&(a_min, a_max), &(b_min, b_max))| a_min <= b_min && a_max >= b_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_range() {
        let err = Box::new(vec![(0.0, 1.0), (5.0, 4.0)]).unwrap_err();
        assert_eq!(err.dimension, 1);
    }

    #[test]
    fn union_and_area() {
        let a = Box::new(vec![(0.0, 2.0), (0.0, 2.0)]).unwrap();
        let b = Box::new(vec![(1.0, 3.0), (1.0, 3.0)]).unwrap();
        let u = a.union(&b);
        assert_eq!(u.ranges(), &[(0.0, 3.0), (0.0, 3.0)]);
        assert_eq!(u.area(), 9.0);
    }

    #[test]
    fn enlargement_zero_when_contained() {
        let a = Box::new(vec![(0.0, 10.0), (0.0, 10.0)]).unwrap();
        let b = Box::new(vec![(2.0, 3.0), (2.0, 3.0)]).unwrap();
        assert_eq!(a.enlargement(&b), 0.0);
    }

    #[test]
    fn overlaps_is_symmetric_and_edge_inclusive() {
        let a = Box::new(vec![(0.0, 5.0)]).unwrap();
        let b = Box::new(vec![(5.0, 10.0)]).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        let c = Box::new(vec![(6.0, 10.0)]).unwrap();
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn contains_checks_all_dimensions() {
        let outer = Box::new(vec![(0.0, 10.0), (0.0, 10.0)]).unwrap();
        let inner = Box::new(vec![(1.0, 2.0), (11.0, 12.0)]).unwrap();
        assert!(!outer.contains(&inner));
    }

    #[test]
    fn empty_box_has_zero_area() {
        let z = Box::empty(2);
        assert_eq!(z.area(), 0.0);
    }
}
