//! Axis-aligned bounding boxes for grid and sub-volume bookkeeping.

use glam::Vec3;

/// Axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
  /// Minimum corner (inclusive).
  pub min: Vec3,
  /// Maximum corner (inclusive).
  pub max: Vec3,
}

impl Aabb {
  /// Create a new AABB from min and max corners.
  ///
  /// # Panics
  /// Debug-asserts that min <= max on all axes.
  pub fn new(min: Vec3, max: Vec3) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y && min.z <= max.z,
      "AABB min must be <= max on all axes"
    );
    Self { min, max }
  }

  /// AABB with inverted extents, ready for encapsulation.
  pub fn empty() -> Self {
    Self {
      min: Vec3::INFINITY,
      max: Vec3::NEG_INFINITY,
    }
  }

  /// Check that min <= max on all axes (false for freshly-empty boxes).
  pub fn is_valid(&self) -> bool {
    self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
  }

  /// Expand to include a point.
  #[inline]
  pub fn encapsulate(&mut self, point: Vec3) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  /// Expand to include a full sphere.
  #[inline]
  pub fn encapsulate_sphere(&mut self, center: Vec3, radius: f32) {
    self.min = self.min.min(center - radius);
    self.max = self.max.max(center + radius);
  }

  /// Box grown by the same margin on all sides.
  pub fn grow(&self, margin: f32) -> Self {
    Self {
      min: self.min - margin,
      max: self.max + margin,
    }
  }

  /// Extent along each axis.
  #[inline]
  pub fn size(&self) -> Vec3 {
    self.max - self.min
  }

  #[inline]
  pub fn volume(&self) -> f32 {
    let s = self.size();
    s.x * s.y * s.z
  }

  /// Smallest box containing both operands.
  pub fn union(&self, other: &Aabb) -> Aabb {
    Aabb {
      min: self.min.min(other.min),
      max: self.max.max(other.max),
    }
  }

  /// True when the boxes share any interior or boundary points.
  #[inline]
  pub fn overlaps(&self, other: &Aabb) -> bool {
    self.min.x <= other.max.x
      && self.max.x >= other.min.x
      && self.min.y <= other.max.y
      && self.max.y >= other.min.y
      && self.min.z <= other.max.z
      && self.max.z >= other.min.z
  }

  #[inline]
  pub fn contains_point(&self, point: Vec3) -> bool {
    point.x >= self.min.x
      && point.x <= self.max.x
      && point.y >= self.min.y
      && point.y <= self.max.y
      && point.z >= self.min.z
      && point.z <= self.max.z
  }

  /// True when the whole sphere lies inside the box.
  pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
    center.x - radius >= self.min.x
      && center.x + radius <= self.max.x
      && center.y - radius >= self.min.y
      && center.y + radius <= self.max.y
      && center.z - radius >= self.min.z
      && center.z + radius <= self.max.z
  }

  /// Closest point inside the box to `point`.
  #[inline]
  pub fn closest_point(&self, point: Vec3) -> Vec3 {
    point.clamp(self.min, self.max)
  }

  /// The eight corners, indexed by bit pattern `zyx`.
  pub fn corners(&self) -> [Vec3; 8] {
    let (lo, hi) = (self.min, self.max);
    [
      Vec3::new(lo.x, lo.y, lo.z),
      Vec3::new(hi.x, lo.y, lo.z),
      Vec3::new(lo.x, hi.y, lo.z),
      Vec3::new(hi.x, hi.y, lo.z),
      Vec3::new(lo.x, lo.y, hi.z),
      Vec3::new(hi.x, lo.y, hi.z),
      Vec3::new(lo.x, hi.y, hi.z),
      Vec3::new(hi.x, hi.y, hi.z),
    ]
  }
}

impl Default for Aabb {
  fn default() -> Self {
    Self::empty()
  }
}
