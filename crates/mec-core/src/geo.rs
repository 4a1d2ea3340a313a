//! Planar coordinate type and bounding boxes.
//!
//! Scenario coordinates are abstract planar units (the unit square in the
//! synthetic scenarios, projected metres for trace-driven ones).  `f64`
//! keeps nearest-base-station comparisons exact enough that the grid index
//! and the brute-force reference agree bit for bit on distances.

use std::ops::{Add, Mul, Sub};

/// A 2-D position.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance.  Prefer this for comparisons.
    #[inline]
    pub fn distance_sq(self, other: Vec2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn distance(self, other: Vec2) -> f64 {
        self.distance_sq(other).sqrt()
    }

    #[inline]
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}

// ── Aabb2 ─────────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box.  Bounds are inclusive.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2 {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// The unit square `[0, 1] × [0, 1]`.
    pub fn unit() -> Self {
        Self::new(Vec2::ZERO, Vec2::new(1.0, 1.0))
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = Vec2>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bb = Aabb2::new(first, first);
        for p in iter {
            bb.extend(p);
        }
        Some(bb)
    }

    /// Grow the box to include `p`.
    pub fn extend(&mut self, p: Vec2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Wrap `p` into the box by taking each coordinate modulo the extent.
    /// Degenerate axes collapse onto their minimum.
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        fn wrap_axis(v: f64, lo: f64, extent: f64) -> f64 {
            if extent <= 0.0 {
                lo
            } else {
                lo + (v - lo).rem_euclid(extent)
            }
        }
        Vec2::new(
            wrap_axis(p.x, self.min.x, self.width()),
            wrap_axis(p.y, self.min.y, self.height()),
        )
    }
}
