//! Particle data source contract.
//!
//! The job core never owns particle data. A [`ParticleSource`] hands out
//! read-only per-frame snapshots; sources may prefetch asynchronously, so
//! after [`ParticleSource::request_frame`] the delivered snapshot can lag
//! behind the request until the source catches up. Callers poll with a
//! bounded backoff until the delivered index matches.

use std::sync::Arc;

use glam::Vec3;

use crate::aabb::Aabb;
use crate::error::SourceError;

/// One particle: a center and an influence radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
  pub center: Vec3,
  pub radius: f32,
}

/// One list of particles. Sources expose either a uniform radius per list or
/// fully interleaved `x, y, z, radius` records.
#[derive(Clone, Debug)]
pub enum ParticleList {
  /// All particles in the list share one radius.
  GlobalRadius { radius: f32, positions: Vec<Vec3> },
  /// Interleaved `x, y, z, radius` floats, four per particle.
  PerParticle { interleaved: Vec<f32> },
}

impl ParticleList {
  pub fn len(&self) -> usize {
    match self {
      Self::GlobalRadius { positions, .. } => positions.len(),
      Self::PerParticle { interleaved } => interleaved.len() / 4,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn get(&self, index: usize) -> Sphere {
    match self {
      Self::GlobalRadius { radius, positions } => Sphere {
        center: positions[index],
        radius: *radius,
      },
      Self::PerParticle { interleaved } => {
        let base = index * 4;
        Sphere {
          center: Vec3::new(interleaved[base], interleaved[base + 1], interleaved[base + 2]),
          radius: interleaved[base + 3],
        }
      }
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = Sphere> + '_ {
    (0..self.len()).map(move |i| self.get(i))
  }

  /// Smallest and largest radius in the list, `None` when empty.
  pub fn min_max_radius(&self) -> Option<(f32, f32)> {
    match self {
      Self::GlobalRadius { radius, positions } => {
        (!positions.is_empty()).then_some((*radius, *radius))
      }
      Self::PerParticle { .. } => {
        let mut out: Option<(f32, f32)> = None;
        for sphere in self.iter() {
          out = Some(match out {
            Some((lo, hi)) => (lo.min(sphere.radius), hi.max(sphere.radius)),
            None => (sphere.radius, sphere.radius),
          });
        }
        out
      }
    }
  }
}

/// Read-only snapshot of one frame's particle lists. Shared into voxelizer
/// tasks behind an `Arc`; never mutated after delivery.
#[derive(Clone, Debug, Default)]
pub struct FrameSnapshot {
  pub frame_index: u32,
  pub lists: Vec<ParticleList>,
}

impl FrameSnapshot {
  pub fn particle_count(&self) -> usize {
    self.lists.iter().map(ParticleList::len).sum()
  }

  /// All particles across every list.
  pub fn spheres(&self) -> impl Iterator<Item = Sphere> + '_ {
    self.lists.iter().flat_map(ParticleList::iter)
  }
}

/// Extents reported by a source: frame count plus bounding information.
#[derive(Clone, Copy, Debug)]
pub struct SourceExtents {
  pub frame_count: u32,
  /// Object-space bounding box of the data.
  pub object_box: Aabb,
  /// Tighter clip box, preferred over the object box when the source marks
  /// one valid.
  pub clip_box: Option<Aabb>,
}

impl SourceExtents {
  /// The clip box when valid, otherwise the object-space box.
  pub fn preferred_box(&self) -> Aabb {
    self.clip_box.unwrap_or(self.object_box)
  }
}

/// Pull-based per-frame particle provider.
pub trait ParticleSource: Send {
  /// Query frame count and bounding boxes. May fail transiently.
  fn extents(&mut self) -> Result<SourceExtents, SourceError>;

  /// Ask the source to make `frame_index` available.
  fn request_frame(&mut self, frame_index: u32);

  /// Deliver the currently available snapshot. The snapshot's `frame_index`
  /// may differ from the requested one while the source is catching up.
  fn poll_data(&mut self) -> Result<Arc<FrameSnapshot>, SourceError>;
}
