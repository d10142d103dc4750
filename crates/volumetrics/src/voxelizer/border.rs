//! Border voxels: seam records for cross-sub-volume stitching.
//!
//! Cells on a sub-volume's outer faces record their boundary-crossing
//! triangle fragments. Two fragments from neighboring sub-volumes touching
//! across the seam is the sole primitive the stitcher uses to unify surface
//! IDs; no raw geometry is re-derived globally.

use smallvec::SmallVec;

use crate::types::Triangle;

/// Triangle fragments generated in one boundary-face cell, tagged with the
/// cell's global grid coordinates. Immutable once the voxelizer delivers it.
#[derive(Clone, Debug)]
pub struct BorderVoxel {
  /// Global grid cell coordinates.
  pub cell: [i32; 3],
  /// Boundary-crossing triangles generated in this cell.
  pub triangles: SmallVec<[Triangle; 4]>,
}

impl BorderVoxel {
  /// True when the voxels occupy the same or immediately neighboring cells
  /// (face or edge adjacency across the seam) and their fragments share at
  /// least one vertex within `tol`.
  pub fn touches(&self, other: &BorderVoxel, tol: f32) -> bool {
    let dx = (self.cell[0] - other.cell[0]).abs();
    let dy = (self.cell[1] - other.cell[1]).abs();
    let dz = (self.cell[2] - other.cell[2]).abs();
    if dx > 1 || dy > 1 || dz > 1 || dx + dy + dz > 2 {
      return false;
    }

    let tol_sq = tol * tol;
    for ta in &self.triangles {
      for va in [ta.a, ta.b, ta.c] {
        for tb in &other.triangles {
          for vb in [tb.a, tb.b, tb.c] {
            if va.distance_squared(vb) <= tol_sq {
              return true;
            }
          }
        }
      }
    }
    false
  }
}

#[cfg(test)]
#[path = "border_test.rs"]
mod border_test;
