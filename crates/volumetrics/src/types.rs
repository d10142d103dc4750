//! Core geometry primitives.

use glam::Vec3;

/// A single world-space triangle. Surface geometry flows through the crate
/// as triangle soup, no index buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
  pub a: Vec3,
  pub b: Vec3,
  pub c: Vec3,
}

impl Triangle {
  pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
    Self { a, b, c }
  }

  /// Surface area, half the cross product magnitude.
  #[inline]
  pub fn area(&self) -> f32 {
    (self.b - self.a).cross(self.c - self.a).length() * 0.5
  }

  /// Unit face normal; the zero vector for degenerate triangles.
  pub fn normal(&self) -> Vec3 {
    let n = (self.b - self.a).cross(self.c - self.a);
    let len = n.length();
    if len > 0.0 {
      n / len
    } else {
      Vec3::ZERO
    }
  }

  /// Signed volume of the tetrahedron spanned with the origin. Summed over a
  /// closed, outward-oriented surface this yields the enclosed volume.
  #[inline]
  pub fn signed_volume(&self) -> f32 {
    self.a.dot(self.b.cross(self.c)) / 6.0
  }
}
