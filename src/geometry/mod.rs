//! Geometric primitives in page pixel space.
//!
//! Every layout object (word, region, page) is anchored to an axis-aligned
//! [`BoundingBox`] with integer pixel coordinates. Boxes are half-open: a box
//! covers `left <= x < right` and `top <= y < bottom`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An axis-aligned rectangle in page pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge (inclusive)
    pub left: i32,
    /// Right edge (exclusive)
    pub right: i32,
    /// Top edge (inclusive)
    pub top: i32,
    /// Bottom edge (exclusive)
    pub bottom: i32,
}

impl BoundingBox {
    /// Create a new bounding box.
    ///
    /// Arguments follow the horizontal-then-vertical order of the box's
    /// text form.
    ///
    /// # Examples
    ///
    /// ```
    /// use image_markup::geometry::BoundingBox;
    ///
    /// let bb = BoundingBox::new(100, 200, 100, 130);
    /// assert_eq!(bb.width(), 100);
    /// assert_eq!(bb.height(), 30);
    /// ```
    pub fn new(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Height in pixels.
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Area in square pixels.
    pub fn area(&self) -> i64 {
        i64::from(self.width()) * i64::from(self.height())
    }

    /// Center point `(x, y)`.
    pub fn center(&self) -> (i32, i32) {
        ((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }

    /// Whether the box has no interior.
    pub fn is_degenerate(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Check if the half-open box contains a point.
    ///
    /// # Examples
    ///
    /// ```
    /// use image_markup::geometry::BoundingBox;
    ///
    /// let bb = BoundingBox::new(0, 10, 0, 10);
    /// assert!(bb.contains_point(0, 0));
    /// assert!(bb.contains_point(9, 9));
    /// assert!(!bb.contains_point(10, 5));
    /// ```
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.left <= x && x < self.right && self.top <= y && y < self.bottom
    }

    /// Check whether `other` lies inside this box.
    ///
    /// With `fuzzy` set, only the center of `other` has to lie inside.
    pub fn includes(&self, other: &BoundingBox, fuzzy: bool) -> bool {
        if fuzzy {
            let (cx, cy) = other.center();
            self.left <= cx && cx <= self.right && self.top <= cy && cy <= self.bottom
        } else {
            self.left <= other.left
                && other.right <= self.right
                && self.top <= other.top
                && other.bottom <= self.bottom
        }
    }

    /// Check if this box overlaps another one.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Vertical overlap in pixels (zero if the boxes do not overlap vertically).
    pub fn vertical_overlap(&self, other: &BoundingBox) -> i32 {
        (self.bottom.min(other.bottom) - self.top.max(other.top)).max(0)
    }

    /// Whether two boxes sit on the same text line: their vertical overlap
    /// covers at least half of the lower box.
    pub fn is_same_line(&self, other: &BoundingBox) -> bool {
        let min_height = self.height().min(other.height());
        min_height > 0 && self.vertical_overlap(other) * 2 >= min_height
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            right: self.right.max(other.right),
            top: self.top.min(other.top),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Hull of a sequence of boxes.
    ///
    /// Returns `None` for an empty sequence, or when a box starts left of its
    /// same-line predecessor. The latter flags word sequences that run
    /// backwards and cannot be aggregated into one line-ordered box.
    ///
    /// # Examples
    ///
    /// ```
    /// use image_markup::geometry::BoundingBox;
    ///
    /// let a = BoundingBox::new(100, 200, 100, 130);
    /// let b = BoundingBox::new(210, 300, 100, 130);
    /// let hull = BoundingBox::aggregate(&[a, b]).unwrap();
    /// assert_eq!(hull, BoundingBox::new(100, 300, 100, 130));
    /// assert!(BoundingBox::aggregate(&[b, a]).is_none());
    /// ```
    pub fn aggregate(boxes: &[BoundingBox]) -> Option<BoundingBox> {
        let (first, rest) = boxes.split_first()?;
        let mut hull = *first;
        let mut previous = first;
        for bb in rest {
            if bb.left < previous.left && bb.is_same_line(previous) {
                return None;
            }
            hull = hull.union(bb);
            previous = bb;
        }
        Some(hull)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{},{},{}]", self.left, self.right, self.top, self.bottom)
    }
}

impl FromStr for BoundingBox {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let inner = s
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| crate::Error::InvalidArgument(format!("malformed bounding box '{}'", s)))?;
        let parts: Vec<i32> = inner
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| crate::Error::InvalidArgument(format!("malformed bounding box '{}': {}", s, e)))?;
        match parts.as_slice() {
            [left, right, top, bottom] => Ok(BoundingBox::new(*left, *right, *top, *bottom)),
            _ => Err(crate::Error::InvalidArgument(format!(
                "bounding box '{}' needs four coordinates",
                s
            ))),
        }
    }
}
