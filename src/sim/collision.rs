//! Axis-aligned overlap tests
//!
//! The runner's sprites are boxes; touching edges count as overlap, matching
//! arcade-physics overlap semantics.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Centre + half extents box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size * 0.5,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    /// Check overlap with another box (shared edges count)
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let diff = (self.center - other.center).abs();
        let combined = self.half + other.half;
        diff.x <= combined.x && diff.y <= combined.y
    }
}
