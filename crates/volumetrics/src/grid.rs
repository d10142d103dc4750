//! Per-frame grid parameters and sub-volume tiling.
//!
//! The frame's grown bounding box is voxelized on a uniform grid whose cell
//! size derives from the smallest particle radius. The grid is then tiled
//! into near-cubical sub-volumes, one voxelizer task each.
//!
//! ```text
//! global grid (res cells per axis)
//! ┌────────────┬────────────┬──────┐
//! │ sub-volume │ sub-volume │ rest │   each sub-volume marches its owned
//! │    s+1     │    s+1     │      │   cells plus one overlap cell at the
//! └────────────┴────────────┴──────┘   shared + face, so adjoining tasks
//!              ^overlap      ^overlap  produce coincident border voxels
//! ```

use glam::Vec3;

use crate::aabb::Aabb;
use crate::error::JobError;
use crate::particles::{FrameSnapshot, SourceExtents};

/// Starting sub-volume edge length in voxels for the halving search.
pub const SUB_VOL_CELLS_START: u32 = 128;

/// Uniform grid parameters for one frame. Recomputed per frame.
#[derive(Clone, Copy, Debug)]
pub struct GridParams {
  /// Grown, resnapped bounds. Contains every particle sphere entirely.
  pub bounds: Aabb,
  /// Edge length of one cubical grid cell.
  pub cell_size: f32,
  /// Cell count per axis.
  pub res: [usize; 3],
  /// Smallest scaled particle radius in the frame.
  pub min_rad: f32,
  /// Largest scaled particle radius in the frame.
  pub max_rad: f32,
  /// The multiplier the radii were scaled with.
  pub radius_multiplier: f32,
}

impl GridParams {
  /// Derive the frame grid from the particle snapshot and source extents.
  ///
  /// The base box (clip box when valid, else object box) is grown by the
  /// largest scaled radius so no sphere surface can clip the grid boundary,
  /// padded by two cells per axis for the marching stencil, and resnapped to
  /// an exact multiple of the cell size so sub-volume tiling is exact.
  pub fn derive(
    snapshot: &FrameSnapshot,
    extents: &SourceExtents,
    radius_multiplier: f32,
    cell_size_ratio: f32,
  ) -> Result<Self, JobError> {
    let frame = snapshot.frame_index;

    let mut min_rad = f32::INFINITY;
    let mut max_rad = f32::NEG_INFINITY;
    let mut count = 0usize;
    for list in &snapshot.lists {
      if let Some((lo, hi)) = list.min_max_radius() {
        min_rad = min_rad.min(lo);
        max_rad = max_rad.max(hi);
      }
      count += list.len();
    }
    if count == 0 {
      return Err(JobError::EmptyFrame { frame });
    }

    let min_rad = min_rad * radius_multiplier;
    let max_rad = max_rad * radius_multiplier;
    let cell_size = min_rad * cell_size_ratio;
    if !cell_size.is_finite() || cell_size <= 0.0 {
      return Err(JobError::InvalidGridParameters {
        frame,
        reason: format!("non-positive cell size {cell_size} (min radius {min_rad})"),
      });
    }

    let base = extents.preferred_box();
    if !base.is_valid() {
      return Err(JobError::InvalidGridParameters {
        frame,
        reason: "degenerate bounding box".into(),
      });
    }

    let grown = base.grow(max_rad);
    let size = grown.size();
    // +2 pads for the boundary voxels the marching stencil needs.
    let res = [
      (size.x / cell_size).ceil() as usize + 2,
      (size.y / cell_size).ceil() as usize + 2,
      (size.z / cell_size).ceil() as usize + 2,
    ];
    let bounds = Aabb::new(
      grown.min,
      grown.min + Vec3::new(res[0] as f32, res[1] as f32, res[2] as f32) * cell_size,
    );

    Ok(Self {
      bounds,
      cell_size,
      res,
      min_rad,
      max_rad,
      radius_multiplier,
    })
  }
}

/// Immutable parameters for one voxelizer invocation.
///
/// Created fresh each frame; owned exclusively by its task until the result
/// is delivered.
#[derive(Clone, Debug)]
pub struct SubVolume {
  /// Index into the frame's sub-volume list.
  pub id: usize,
  /// World-space bounds, overlap cells included.
  pub bounds: Aabb,
  /// Minimum corner of the global grid. Vertex positions derive from global
  /// grid coordinates so shared seam vertices are bitwise identical across
  /// neighboring sub-volumes.
  pub grid_min: Vec3,
  /// Global cell coordinates of local cell (0, 0, 0).
  pub origin_cell: [i32; 3],
  /// Cells marched per axis: owned cells plus the overlap cell where a
  /// neighbor adjoins on the + face.
  pub res: [usize; 3],
  /// Cells per axis whose triangles this sub-volume owns. Overlap cells
  /// beyond this feed border voxels only, so seam geometry is counted
  /// exactly once across neighbors.
  pub owned: [usize; 3],
  pub cell_size: f32,
  /// Largest scaled particle radius in the frame.
  pub max_rad: f32,
  pub radius_multiplier: f32,
}

impl SubVolume {
  /// World-space position of the local grid vertex `(x, y, z)`.
  #[inline]
  pub fn vertex_pos(&self, x: usize, y: usize, z: usize) -> Vec3 {
    self.grid_min
      + Vec3::new(
        (self.origin_cell[0] + x as i32) as f32,
        (self.origin_cell[1] + y as i32) as f32,
        (self.origin_cell[2] + z as i32) as f32,
      ) * self.cell_size
  }

  pub fn cell_count(&self) -> usize {
    self.res[0] * self.res[1] * self.res[2]
  }
}

/// Pick the sub-volume edge length by halving from the starting value until
/// the grid splits along some axis. A grid that would not split even at edge
/// length one keeps a single sub-volume.
pub fn choose_sub_vol_cells(res: [usize; 3]) -> u32 {
  let mut cells = SUB_VOL_CELLS_START;
  while cells > 1 {
    let next = cells / 2;
    if res.iter().any(|&r| r.div_ceil(next as usize) > 1) {
      return next;
    }
    cells = next;
  }
  1
}

/// Tile the grid into sub-volumes of at most `sub_vol_cells` cells per axis.
///
/// The last sub-volume per axis may be smaller to exactly cover the
/// remainder. Wherever a neighbor adjoins on the + face, one extra cell of
/// overlap is marched so both tasks compute coincident border voxels at the
/// seam.
pub fn tile(params: &GridParams, sub_vol_cells: u32) -> Vec<SubVolume> {
  let s = sub_vol_cells as usize;
  let div = [
    params.res[0].div_ceil(s),
    params.res[1].div_ceil(s),
    params.res[2].div_ceil(s),
  ];

  let mut out = Vec::with_capacity(div[0] * div[1] * div[2]);
  for x in 0..div[0] {
    for y in 0..div[1] {
      for z in 0..div[2] {
        let block = [x, y, z];
        let mut origin = [0usize; 3];
        let mut owned = [0usize; 3];
        let mut res = [0usize; 3];
        for axis in 0..3 {
          origin[axis] = block[axis] * s;
          owned[axis] = s.min(params.res[axis] - origin[axis]);
          let overlap = usize::from(origin[axis] + owned[axis] < params.res[axis]);
          res[axis] = owned[axis] + overlap;
        }
        let min = params.bounds.min
          + Vec3::new(origin[0] as f32, origin[1] as f32, origin[2] as f32) * params.cell_size;
        let max = params.bounds.min
          + Vec3::new(
            (origin[0] + res[0]) as f32,
            (origin[1] + res[1]) as f32,
            (origin[2] + res[2]) as f32,
          ) * params.cell_size;
        out.push(SubVolume {
          id: out.len(),
          bounds: Aabb::new(min, max),
          grid_min: params.bounds.min,
          origin_cell: [origin[0] as i32, origin[1] as i32, origin[2] as i32],
          res,
          owned,
          cell_size: params.cell_size,
          max_rad: params.max_rad,
          radius_multiplier: params.radius_multiplier,
        });
      }
    }
  }
  out
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;
