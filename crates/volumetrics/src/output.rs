//! Double-buffered debug geometry output.
//!
//! The orchestrator is the single writer; debug consumers are concurrent
//! readers. A writer fills the back slot completely before publishing it by
//! swapping the front index, so a reader always observes a complete,
//! self-consistent buffer tagged with the data version it was produced
//! under. The monotonic `hash` counter advances exactly once per
//! successfully completed frame and is the only change-notification
//! primitive exposed to readers.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::aabb::Aabb;
use crate::stitch::StitchedSurface;

/// Flat triangle-soup mesh: three vertices per triangle, no index buffer.
#[derive(Clone, Debug, Default)]
pub struct TriangleMesh {
  pub positions: Vec<[f32; 3]>,
  /// Per-vertex normals; the face normal repeated three times.
  pub normals: Vec<[f32; 3]>,
  /// Per-vertex RGB, one color per surface.
  pub colors: Vec<[u8; 3]>,
}

impl TriangleMesh {
  pub fn triangle_count(&self) -> usize {
    self.positions.len() / 3
  }

  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  /// Append a stitched surface, colored by its global ID.
  pub fn push_surface(&mut self, surface: &StitchedSurface) {
    let color = surface_color(surface.id);
    for triangle in &surface.triangles {
      let normal = triangle.normal().to_array();
      for vertex in [triangle.a, triangle.b, triangle.c] {
        self.positions.push(vertex.to_array());
        self.normals.push(normal);
        self.colors.push(color);
      }
    }
  }
}

/// Line-list geometry: two points per segment.
#[derive(Clone, Debug, Default)]
pub struct LineGeometry {
  pub positions: Vec<[f32; 3]>,
}

impl LineGeometry {
  pub fn segment_count(&self) -> usize {
    self.positions.len() / 2
  }

  /// Append the twelve edges of a box.
  pub fn push_box(&mut self, bounds: &Aabb) {
    const EDGES: [[usize; 2]; 12] = [
      [0, 1],
      [1, 3],
      [3, 2],
      [2, 0],
      [4, 5],
      [5, 7],
      [7, 6],
      [6, 4],
      [0, 4],
      [1, 5],
      [2, 6],
      [3, 7],
    ];
    let corners = bounds.corners();
    for edge in EDGES {
      self.positions.push(corners[edge[0]].to_array());
      self.positions.push(corners[edge[1]].to_array());
    }
  }
}

/// One fully-populated output frame.
#[derive(Clone, Debug, Default)]
pub struct FrameGeometry {
  /// Data version this geometry was produced under.
  pub hash: u64,
  /// Sub-volume and grid bounding boxes.
  pub lines: LineGeometry,
  /// Unified surface triangle soup.
  pub mesh: TriangleMesh,
}

/// Double-buffered single-writer / many-reader geometry handoff.
#[derive(Debug, Default)]
pub struct DebugOutput {
  slots: [Mutex<FrameGeometry>; 2],
  front: AtomicUsize,
  hash: AtomicU64,
}

impl DebugOutput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Current data version. Zero until the first frame completes.
  pub fn hash(&self) -> u64 {
    self.hash.load(Ordering::Acquire)
  }

  /// Advance the data version; returns the new value.
  pub(crate) fn advance_hash(&self) -> u64 {
    self.hash.fetch_add(1, Ordering::AcqRel) + 1
  }

  /// Write a fully-built frame into the back slot and swap it to front.
  pub(crate) fn publish(&self, geometry: FrameGeometry) {
    let back = 1 - self.front.load(Ordering::Acquire);
    {
      let mut slot = self.slots[back].lock().unwrap();
      *slot = geometry;
    }
    self.front.store(back, Ordering::Release);
  }

  /// Clone the currently published frame.
  pub fn snapshot(&self) -> FrameGeometry {
    let front = self.front.load(Ordering::Acquire);
    self.slots[front].lock().unwrap().clone()
  }
}

/// Deterministic surface color from a global surface ID.
pub fn surface_color(id: u32) -> [u8; 3] {
  let mut x = (id as u64).wrapping_add(0x9e37_79b9_7f4a_7c15);
  x ^= x >> 30;
  x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
  x ^= x >> 27;
  x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
  x ^= x >> 31;
  // Bias into the visible range.
  [
    0x40 | (x & 0xff) as u8,
    0x40 | ((x >> 8) & 0xff) as u8,
    0x40 | ((x >> 16) & 0xff) as u8,
  ]
}

#[cfg(test)]
#[path = "output_test.rs"]
mod output_test;
