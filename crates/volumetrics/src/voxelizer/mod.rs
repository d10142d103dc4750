//! Tetrahedral voxelizer: marching-tetrahedra surface extraction over one
//! sub-volume.
//!
//! A voxelizer run is a pure function of its sub-volume descriptor and the
//! frame's particle snapshot; concurrently running instances share nothing
//! mutable. The run is structured as sequential passes:
//!
//! ```text
//! Pass 1: Field sampling
//!   Evaluate the union-of-spheres distance at every local grid vertex.
//!
//! Pass 2: Marching
//!   Split each cell into six tetrahedra, classify the corners against the
//!   zero iso-value, emit interpolated crossing triangles. Homogeneous
//!   cells (all inside or all outside) are skipped early.
//!
//! Pass 3: Labeling
//!   Triangles sharing an edge (identified by lattice vertex-pair keys)
//!   belong to the same local surface.
//!
//! Pass 4: Partitioning
//!   Owned-cell triangles go into per-surface lists with accumulated areas;
//!   boundary-face cells additionally record border voxels for the
//!   stitcher. Overlap cells contribute border fragments only.
//! ```

mod border;
mod tet_table;

pub use border::BorderVoxel;
pub use tet_table::{march_tet, EdgeVertex, CORNER_OFFSETS, CUBE_TETS, DEGENERACY_EPS};

use std::collections::HashMap;

use glam::Vec3;
use smallvec::SmallVec;
use web_time::Instant;

use crate::disjoint_set::DisjointSet;
use crate::field::SphereField;
use crate::grid::SubVolume;
use crate::particles::FrameSnapshot;
use crate::threading::CancelToken;
use crate::types::Triangle;

/// Output of one voxelizer task. Read-only once delivered.
#[derive(Debug, Default)]
pub struct VoxelizerResult {
  /// Index of the sub-volume this result belongs to.
  pub sub_volume: usize,
  /// Triangle list per locally-connected surface, owned cells only.
  pub surfaces: Vec<Vec<Triangle>>,
  /// Accumulated triangle area per local surface, parallel to `surfaces`.
  pub surface_areas: Vec<f32>,
  /// Border voxels per local surface, parallel to `surfaces`.
  pub border_voxels: Vec<Vec<BorderVoxel>>,
  /// Degenerate micro-triangles skipped by the epsilon rules. The
  /// orchestrator logs this; the voxelizer itself never fails.
  pub degenerate_skipped: u32,
  /// The task observed a cancel request and bailed out early.
  pub cancelled: bool,
  /// Wall time spent voxelizing, in microseconds.
  pub elapsed_us: u64,
}

impl VoxelizerResult {
  pub fn surface_count(&self) -> usize {
    self.surfaces.len()
  }

  pub fn triangle_count(&self) -> usize {
    self.surfaces.iter().map(Vec::len).sum()
  }
}

/// Triangle as it falls out of the marching pass, before labeling.
struct RawTriangle {
  verts: [EdgeVertex; 3],
  cell: [usize; 3],
}

/// Extract the iso-surface of one sub-volume.
pub fn voxelize(
  job: &SubVolume,
  snapshot: &FrameSnapshot,
  cancel: &CancelToken,
) -> VoxelizerResult {
  let start = Instant::now();
  let mut result = VoxelizerResult {
    sub_volume: job.id,
    ..Default::default()
  };

  let field = SphereField::for_region(snapshot, &job.bounds, job.radius_multiplier, job.max_rad);

  // Pass 1: sample the field at every local grid vertex.
  let nx = job.res[0] + 1;
  let ny = job.res[1] + 1;
  let nz = job.res[2] + 1;
  let vertex_index = |x: usize, y: usize, z: usize| (x * ny + y) * nz + z;

  let mut samples = vec![0.0f32; nx * ny * nz];
  for x in 0..nx {
    if cancel.is_cancelled() {
      result.cancelled = true;
      return result;
    }
    for y in 0..ny {
      for z in 0..nz {
        samples[vertex_index(x, y, z)] = field.sample(job.vertex_pos(x, y, z));
      }
    }
  }

  // Pass 2: march six tetrahedra per cell.
  let mut raw: Vec<RawTriangle> = Vec::new();
  for x in 0..job.res[0] {
    if cancel.is_cancelled() {
      result.cancelled = true;
      return result;
    }
    for y in 0..job.res[1] {
      for z in 0..job.res[2] {
        let mut positions = [Vec3::ZERO; 8];
        let mut values = [0.0f32; 8];
        let mut keys = [0u32; 8];
        let mut inside_corners = 0;
        for (corner, offset) in CORNER_OFFSETS.iter().enumerate() {
          let (cx, cy, cz) = (x + offset[0], y + offset[1], z + offset[2]);
          positions[corner] = job.vertex_pos(cx, cy, cz);
          values[corner] = samples[vertex_index(cx, cy, cz)];
          keys[corner] = vertex_index(cx, cy, cz) as u32;
          if values[corner] < 0.0 {
            inside_corners += 1;
          }
        }
        // Homogeneous cells cannot cross the iso-surface.
        if inside_corners == 0 || inside_corners == 8 {
          continue;
        }

        for tet in &CUBE_TETS {
          let tet_positions = [
            positions[tet[0]],
            positions[tet[1]],
            positions[tet[2]],
            positions[tet[3]],
          ];
          let tet_values = [values[tet[0]], values[tet[1]], values[tet[2]], values[tet[3]]];
          let tet_keys = [keys[tet[0]], keys[tet[1]], keys[tet[2]], keys[tet[3]]];
          march_tet(&tet_positions, &tet_values, &tet_keys, |verts| {
            raw.push(RawTriangle {
              verts,
              cell: [x, y, z],
            });
          });
        }
      }
    }
  }

  // Pass 3: label connected surfaces over shared triangle edges.
  let (labels, label_count) = label_triangles(&raw);

  // Pass 4: partition into owned surfaces, areas, and border voxels.
  let mut surfaces: Vec<Vec<Triangle>> = vec![Vec::new(); label_count];
  let mut areas = vec![0.0f64; label_count];
  let mut border_voxels: Vec<Vec<BorderVoxel>> = vec![Vec::new(); label_count];
  let mut border_slots: HashMap<(usize, [i32; 3]), usize> = HashMap::new();

  for (tri, &label) in raw.iter().zip(&labels) {
    let triangle = Triangle::new(tri.verts[0].pos, tri.verts[1].pos, tri.verts[2].pos);
    let area = triangle.area();
    if area == 0.0 {
      result.degenerate_skipped += 1;
      continue;
    }

    let owned = tri.cell[0] < job.owned[0]
      && tri.cell[1] < job.owned[1]
      && tri.cell[2] < job.owned[2];
    if owned {
      surfaces[label].push(triangle);
      areas[label] += area as f64;
    }

    if is_boundary_cell(job, tri.cell) {
      let cell = [
        job.origin_cell[0] + tri.cell[0] as i32,
        job.origin_cell[1] + tri.cell[1] as i32,
        job.origin_cell[2] + tri.cell[2] as i32,
      ];
      let slot = *border_slots.entry((label, cell)).or_insert_with(|| {
        border_voxels[label].push(BorderVoxel {
          cell,
          triangles: SmallVec::new(),
        });
        border_voxels[label].len() - 1
      });
      border_voxels[label][slot].triangles.push(triangle);
    }
  }

  result.surfaces = surfaces;
  result.surface_areas = areas.into_iter().map(|a| a as f32).collect();
  result.border_voxels = border_voxels;
  result.elapsed_us = start.elapsed().as_micros() as u64;
  result
}

/// Cells on any outer face of the local grid.
fn is_boundary_cell(job: &SubVolume, cell: [usize; 3]) -> bool {
  (0..3).any(|axis| cell[axis] == 0 || cell[axis] + 1 == job.res[axis])
}

/// Connected-component labels for triangles sharing an edge. Labels are
/// dense, assigned in order of first appearance, so the result is
/// deterministic for a fixed marching order.
fn label_triangles(triangles: &[RawTriangle]) -> (Vec<usize>, usize) {
  let mut dsu = DisjointSet::new(triangles.len());
  let mut edge_owner: HashMap<((u32, u32), (u32, u32)), usize> = HashMap::new();

  for (index, tri) in triangles.iter().enumerate() {
    let keys = [tri.verts[0].key, tri.verts[1].key, tri.verts[2].key];
    for (a, b) in [(0, 1), (1, 2), (2, 0)] {
      let edge = if keys[a] <= keys[b] {
        (keys[a], keys[b])
      } else {
        (keys[b], keys[a])
      };
      match edge_owner.entry(edge) {
        std::collections::hash_map::Entry::Occupied(owner) => {
          dsu.union(index, *owner.get());
        }
        std::collections::hash_map::Entry::Vacant(slot) => {
          slot.insert(index);
        }
      }
    }
  }

  let mut label_of_root: HashMap<usize, usize> = HashMap::new();
  let mut labels = Vec::with_capacity(triangles.len());
  for index in 0..triangles.len() {
    let root = dsu.find(index);
    let next = label_of_root.len();
    labels.push(*label_of_root.entry(root).or_insert(next));
  }
  (labels, label_of_root.len())
}
