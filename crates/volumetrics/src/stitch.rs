//! Cross-sub-volume surface stitching and aggregation.
//!
//! Every (sub-volume, local surface) pair starts with its own global ID.
//! For each pair of adjacent-or-overlapping sub-volumes, any two local
//! surfaces whose border voxels touch are unioned. Unions go through a
//! disjoint-set forest, so the final grouping is transitively correct no
//! matter in which order the pairs are scanned. Afterwards triangle counts,
//! areas, and enclosed volumes are summed per final ID.
//!
//! The adjacency gate is the union-volume test: two boxes are neighbors
//! exactly when the volume of their union AABB does not exceed the sum of
//! their own volumes, which holds for overlapping or face-touching boxes
//! and fails once a gap or a diagonal offset appears.

use std::collections::HashMap;

use crate::disjoint_set::DisjointSet;
use crate::grid::SubVolume;
use crate::types::Triangle;
use crate::voxelizer::{BorderVoxel, VoxelizerResult};

/// Vertex tolerance for the border touch test, as a fraction of the cell
/// size. Seam vertices are computed bitwise-identically on both sides, so
/// this only absorbs rounding slack.
pub const TOUCH_TOLERANCE: f32 = 1e-4;

/// Which geometry the unified surface list carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SurfaceGeometry {
  /// The extracted iso-surface triangles.
  #[default]
  Smooth,
  /// Border-voxel fragments only, for inspecting the stitch seams.
  BorderSeams,
}

/// One globally stitched surface with its aggregate metrics.
#[derive(Clone, Debug)]
pub struct StitchedSurface {
  /// Final global surface ID, dense and deterministic for a fixed scan
  /// order.
  pub id: u32,
  /// Total triangles across all member fragments.
  pub triangle_count: usize,
  /// Summed surface area.
  pub area: f32,
  /// Enclosed volume from the divergence theorem; meaningful for closed
  /// surfaces.
  pub volume: f32,
  /// Concatenated member geometry, per the selected mode.
  pub triangles: Vec<Triangle>,
}

/// Unify local surface fragments into global surfaces.
///
/// Guarantees: every triangle belongs to exactly one final surface, and the
/// total triangle count equals the sum over all local surfaces; stitching
/// never drops or duplicates geometry. Running twice over the same results
/// yields the same grouping and aggregates.
pub fn stitch(
  jobs: &[SubVolume],
  results: &[VoxelizerResult],
  cell_size: f32,
  mode: SurfaceGeometry,
) -> Vec<StitchedSurface> {
  // Initial global IDs: consecutive ranges per sub-volume result.
  let mut first_id = Vec::with_capacity(results.len());
  let mut total = 0usize;
  for result in results {
    first_id.push(total);
    total += result.surfaces.len();
  }

  let mut dsu = DisjointSet::new(total);
  let tolerance = cell_size * TOUCH_TOLERANCE;

  for i in 0..results.len() {
    for k in i..results.len() {
      if i != k {
        let a = &jobs[results[i].sub_volume].bounds;
        let b = &jobs[results[k].sub_volume].bounds;
        let union = a.union(b);
        if union.volume() > (a.volume() + b.volume()) * (1.0 + 1e-6) {
          continue;
        }
      }
      for (j, border_j) in results[i].border_voxels.iter().enumerate() {
        for (l, border_l) in results[k].border_voxels.iter().enumerate() {
          if i == k && l <= j {
            continue;
          }
          if dsu.find(first_id[i] + j) == dsu.find(first_id[k] + l) {
            continue;
          }
          if borders_touch(border_j, border_l, tolerance) {
            dsu.union(first_id[i] + j, first_id[k] + l);
          }
        }
      }
    }
  }

  // Group fragments by final root; IDs are dense in order of first
  // appearance.
  let mut id_of_root: HashMap<usize, usize> = HashMap::new();
  let mut out: Vec<StitchedSurface> = Vec::new();
  let mut areas: Vec<f64> = Vec::new();
  let mut volumes: Vec<f64> = Vec::new();

  for (i, result) in results.iter().enumerate() {
    for j in 0..result.surfaces.len() {
      let root = dsu.find(first_id[i] + j);
      let next = id_of_root.len();
      let id = *id_of_root.entry(root).or_insert(next);
      if id == out.len() {
        out.push(StitchedSurface {
          id: id as u32,
          triangle_count: 0,
          area: 0.0,
          volume: 0.0,
          triangles: Vec::new(),
        });
        areas.push(0.0);
        volumes.push(0.0);
      }

      let surface = &mut out[id];
      surface.triangle_count += result.surfaces[j].len();
      areas[id] += result.surface_areas[j] as f64;
      for triangle in &result.surfaces[j] {
        volumes[id] += triangle.signed_volume() as f64;
      }
      match mode {
        SurfaceGeometry::Smooth => {
          surface.triangles.extend_from_slice(&result.surfaces[j]);
        }
        SurfaceGeometry::BorderSeams => {
          for voxel in &result.border_voxels[j] {
            surface.triangles.extend(voxel.triangles.iter().copied());
          }
        }
      }
    }
  }

  for (id, surface) in out.iter_mut().enumerate() {
    surface.area = areas[id] as f32;
    surface.volume = volumes[id].abs() as f32;
  }
  out
}

fn borders_touch(a: &[BorderVoxel], b: &[BorderVoxel], tolerance: f32) -> bool {
  for voxel_a in a {
    for voxel_b in b {
      if voxel_a.touches(voxel_b, tolerance) {
        return true;
      }
    }
  }
  false
}

#[cfg(test)]
#[path = "stitch_test.rs"]
mod stitch_test;
