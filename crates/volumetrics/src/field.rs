//! Implicit scalar field over particle spheres.
//!
//! The field is the signed distance to the union of all particle spheres:
//! negative inside, positive outside, iso-surface at zero. Each voxelizer
//! task builds its own field restricted to the particles that can influence
//! its sub-volume.

use glam::Vec3;

use crate::aabb::Aabb;
use crate::particles::{FrameSnapshot, Sphere};

/// Union-of-spheres signed distance field for one region.
pub struct SphereField {
  spheres: Vec<Sphere>,
  /// Positive clamp applied to every sample. Spheres that cannot push a
  /// value below this anywhere in the region are culled, so neighboring
  /// regions sample bitwise-identical values on their shared planes.
  range: f32,
}

impl SphereField {
  /// Collect the scaled spheres that can influence `region`.
  ///
  /// A sphere is kept when it comes within `radius + range` of the region,
  /// the exact set whose contribution can fall below the `range` clamp.
  pub fn for_region(
    snapshot: &FrameSnapshot,
    region: &Aabb,
    radius_multiplier: f32,
    range: f32,
  ) -> Self {
    let mut spheres = Vec::new();
    for sphere in snapshot.spheres() {
      let radius = sphere.radius * radius_multiplier;
      let reach = radius + range;
      let closest = region.closest_point(sphere.center);
      if closest.distance_squared(sphere.center) <= reach * reach {
        spheres.push(Sphere {
          center: sphere.center,
          radius,
        });
      }
    }
    Self { spheres, range }
  }

  pub fn sphere_count(&self) -> usize {
    self.spheres.len()
  }

  /// Field value at `point`, clamped to `range` where no sphere is near.
  #[inline]
  pub fn sample(&self, point: Vec3) -> f32 {
    let mut distance = self.range;
    for sphere in &self.spheres {
      distance = distance.min(point.distance(sphere.center) - sphere.radius);
    }
    distance
  }
}

#[cfg(test)]
#[path = "field_test.rs"]
mod field_test;
