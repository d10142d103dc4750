//! Tests for the surface stitcher.

use glam::Vec3;
use smallvec::smallvec;

use super::{stitch, SurfaceGeometry};
use crate::aabb::Aabb;
use crate::grid::{tile, GridParams, SubVolume};
use crate::particles::{FrameSnapshot, ParticleList, SourceExtents};
use crate::threading::CancelToken;
use crate::types::Triangle;
use crate::voxelizer::{voxelize, BorderVoxel, VoxelizerResult};

// =============================================================================
// Synthetic fixtures
// =============================================================================

fn job_at(id: usize, origin_x: i32, res_x: usize) -> SubVolume {
  let min = Vec3::new(origin_x as f32, 0.0, 0.0);
  SubVolume {
    id,
    bounds: Aabb::new(min, min + Vec3::new(res_x as f32, 4.0, 4.0)),
    grid_min: Vec3::ZERO,
    origin_cell: [origin_x, 0, 0],
    res: [res_x, 4, 4],
    owned: [res_x, 4, 4],
    cell_size: 1.0,
    max_rad: 1.0,
    radius_multiplier: 1.0,
  }
}

fn fragment(anchor: Vec3, cell: [i32; 3]) -> (Vec<Triangle>, Vec<BorderVoxel>) {
  let tri = Triangle::new(anchor, anchor + Vec3::X, anchor + Vec3::Y);
  (
    vec![tri],
    vec![BorderVoxel {
      cell,
      triangles: smallvec![tri],
    }],
  )
}

fn result_of(
  sub_volume: usize,
  fragments: Vec<(Vec<Triangle>, Vec<BorderVoxel>)>,
) -> VoxelizerResult {
  let mut result = VoxelizerResult {
    sub_volume,
    ..Default::default()
  };
  for (triangles, border) in fragments {
    result
      .surface_areas
      .push(triangles.iter().map(Triangle::area).sum());
    result.surfaces.push(triangles);
    result.border_voxels.push(border);
  }
  result
}

// =============================================================================
// Batch 1: merge rules
// =============================================================================

#[test]
fn test_touching_fragments_across_neighbors_merge() {
  let jobs = vec![job_at(0, 0, 5), job_at(1, 4, 4)];
  let anchor = Vec3::new(4.0, 1.0, 1.0);
  let results = vec![
    result_of(0, vec![fragment(anchor, [4, 1, 1])]),
    result_of(1, vec![fragment(anchor, [4, 1, 1])]),
  ];

  let surfaces = stitch(&jobs, &results, 1.0, SurfaceGeometry::Smooth);
  assert_eq!(surfaces.len(), 1);
  assert_eq!(surfaces[0].triangle_count, 2);
}

#[test]
fn test_distant_sub_volumes_never_merge() {
  // Identical geometry, but the boxes fail the union-volume adjacency gate.
  let jobs = vec![job_at(0, 0, 5), job_at(1, 12, 4)];
  let anchor = Vec3::new(4.0, 1.0, 1.0);
  let results = vec![
    result_of(0, vec![fragment(anchor, [4, 1, 1])]),
    result_of(1, vec![fragment(anchor, [4, 1, 1])]),
  ];

  let surfaces = stitch(&jobs, &results, 1.0, SurfaceGeometry::Smooth);
  assert_eq!(surfaces.len(), 2);
}

#[test]
fn test_separated_fragments_in_neighbors_stay_apart() {
  let jobs = vec![job_at(0, 0, 5), job_at(1, 4, 4)];
  let results = vec![
    result_of(0, vec![fragment(Vec3::new(1.0, 1.0, 1.0), [1, 1, 1])]),
    result_of(1, vec![fragment(Vec3::new(7.0, 1.0, 1.0), [7, 1, 1])]),
  ];

  let surfaces = stitch(&jobs, &results, 1.0, SurfaceGeometry::Smooth);
  assert_eq!(surfaces.len(), 2);
}

#[test]
fn test_transitive_chain_collapses_to_one_surface() {
  // a touches b, b touches c; a and c never touch directly.
  let jobs = vec![job_at(0, 0, 5), job_at(1, 4, 5), job_at(2, 8, 4)];
  let seam_ab = Vec3::new(4.0, 1.0, 1.0);
  let seam_bc = Vec3::new(8.0, 1.0, 1.0);
  let results = vec![
    result_of(0, vec![fragment(seam_ab, [4, 1, 1])]),
    result_of(1, vec![(
      vec![
        Triangle::new(seam_ab, seam_ab + Vec3::X, seam_ab + Vec3::Y),
        Triangle::new(seam_bc, seam_bc + Vec3::X, seam_bc + Vec3::Y),
      ],
      vec![
        BorderVoxel {
          cell: [4, 1, 1],
          triangles: smallvec![Triangle::new(seam_ab, seam_ab + Vec3::X, seam_ab + Vec3::Y)],
        },
        BorderVoxel {
          cell: [8, 1, 1],
          triangles: smallvec![Triangle::new(seam_bc, seam_bc + Vec3::X, seam_bc + Vec3::Y)],
        },
      ],
    )]),
    result_of(2, vec![fragment(seam_bc, [8, 1, 1])]),
  ];

  let surfaces = stitch(&jobs, &results, 1.0, SurfaceGeometry::Smooth);
  assert_eq!(surfaces.len(), 1);
  assert_eq!(surfaces[0].triangle_count, 4);
}

#[test]
fn test_intra_sub_volume_fragments_can_merge() {
  // Two local surfaces of the same sub-volume touching at the boundary.
  let jobs = vec![job_at(0, 0, 5)];
  let anchor = Vec3::new(2.0, 0.0, 1.0);
  let results = vec![result_of(
    0,
    vec![fragment(anchor, [2, 0, 1]), fragment(anchor, [3, 0, 1])],
  )];

  let surfaces = stitch(&jobs, &results, 1.0, SurfaceGeometry::Smooth);
  assert_eq!(surfaces.len(), 1);
}

// =============================================================================
// Batch 2: aggregation guarantees
// =============================================================================

#[test]
fn test_triangle_conservation() {
  let jobs = vec![job_at(0, 0, 5), job_at(1, 4, 4)];
  let results = vec![
    result_of(
      0,
      vec![
        fragment(Vec3::new(4.0, 1.0, 1.0), [4, 1, 1]),
        fragment(Vec3::new(1.0, 2.0, 2.0), [1, 2, 2]),
      ],
    ),
    result_of(1, vec![fragment(Vec3::new(4.0, 1.0, 1.0), [4, 1, 1])]),
  ];

  let local_total: usize = results.iter().map(VoxelizerResult::triangle_count).sum();
  let surfaces = stitch(&jobs, &results, 1.0, SurfaceGeometry::Smooth);
  let stitched_total: usize = surfaces.iter().map(|s| s.triangle_count).sum();
  let geometry_total: usize = surfaces.iter().map(|s| s.triangles.len()).sum();

  assert_eq!(stitched_total, local_total);
  assert_eq!(geometry_total, local_total);
}

#[test]
fn test_areas_sum_per_group() {
  let jobs = vec![job_at(0, 0, 5), job_at(1, 4, 4)];
  let anchor = Vec3::new(4.0, 1.0, 1.0);
  let results = vec![
    result_of(0, vec![fragment(anchor, [4, 1, 1])]),
    result_of(1, vec![fragment(anchor, [4, 1, 1])]),
  ];

  let surfaces = stitch(&jobs, &results, 1.0, SurfaceGeometry::Smooth);
  assert_eq!(surfaces.len(), 1);
  // Two right triangles of area 0.5 each.
  assert!((surfaces[0].area - 1.0).abs() < 1e-6);
}

#[test]
fn test_stitching_is_idempotent() {
  let jobs = vec![job_at(0, 0, 5), job_at(1, 4, 5), job_at(2, 8, 4)];
  let anchor = Vec3::new(4.0, 1.0, 1.0);
  let results = vec![
    result_of(0, vec![fragment(anchor, [4, 1, 1])]),
    result_of(1, vec![fragment(anchor, [4, 1, 1])]),
    result_of(2, vec![fragment(Vec3::new(9.0, 1.0, 1.0), [9, 1, 1])]),
  ];

  let first = stitch(&jobs, &results, 1.0, SurfaceGeometry::Smooth);
  let second = stitch(&jobs, &results, 1.0, SurfaceGeometry::Smooth);

  assert_eq!(first.len(), second.len());
  for (lhs, rhs) in first.iter().zip(&second) {
    assert_eq!(lhs.id, rhs.id);
    assert_eq!(lhs.triangle_count, rhs.triangle_count);
    assert_eq!(lhs.area, rhs.area);
    assert_eq!(lhs.triangles, rhs.triangles);
  }
}

#[test]
fn test_border_seam_mode_swaps_geometry_but_not_metrics() {
  let jobs = vec![job_at(0, 0, 5), job_at(1, 4, 4)];
  let anchor = Vec3::new(4.0, 1.0, 1.0);
  let results = vec![
    result_of(0, vec![fragment(anchor, [4, 1, 1])]),
    result_of(1, vec![fragment(anchor, [4, 1, 1])]),
  ];

  let smooth = stitch(&jobs, &results, 1.0, SurfaceGeometry::Smooth);
  let seams = stitch(&jobs, &results, 1.0, SurfaceGeometry::BorderSeams);

  assert_eq!(smooth.len(), seams.len());
  assert_eq!(smooth[0].triangle_count, seams[0].triangle_count);
  assert_eq!(smooth[0].area, seams[0].area);
  // Both fragments put their whole triangle in the border voxel here, so the
  // seam geometry happens to have the same size; what matters is that it is
  // drawn from the border records.
  assert_eq!(seams[0].triangles.len(), 2);
}

// =============================================================================
// Batch 3: driven by the voxelizer
// =============================================================================

fn snapshot_of(spheres: &[(f32, f32, f32, f32)]) -> FrameSnapshot {
  let interleaved = spheres
    .iter()
    .flat_map(|&(x, y, z, r)| [x, y, z, r])
    .collect();
  FrameSnapshot {
    frame_index: 0,
    lists: vec![ParticleList::PerParticle { interleaved }],
  }
}

fn voxelize_split(
  spheres: &[(f32, f32, f32, f32)],
  cell_size_ratio: f32,
  sub_vol_cells: u32,
) -> (Vec<SubVolume>, Vec<VoxelizerResult>, f32) {
  let snapshot = snapshot_of(spheres);
  let mut object_box = Aabb::empty();
  for sphere in snapshot.spheres() {
    object_box.encapsulate(sphere.center);
  }
  let extents = SourceExtents {
    frame_count: 1,
    object_box,
    clip_box: None,
  };
  let params = GridParams::derive(&snapshot, &extents, 1.0, cell_size_ratio).unwrap();
  let jobs = tile(&params, sub_vol_cells);
  let cancel = CancelToken::new();
  let results = jobs
    .iter()
    .map(|job| voxelize(job, &snapshot, &cancel))
    .collect();
  (jobs, results, params.cell_size)
}

#[test]
fn test_sphere_split_across_sub_volumes_is_one_surface() {
  let (jobs, results, cell_size) = voxelize_split(&[(0.0, 0.0, 0.0, 1.0)], 0.125, 8);
  assert!(jobs.len() > 1);

  let surfaces = stitch(&jobs, &results, cell_size, SurfaceGeometry::Smooth);
  assert_eq!(surfaces.len(), 1, "sphere fragments failed to unify");

  let local_total: usize = results.iter().map(VoxelizerResult::triangle_count).sum();
  assert_eq!(surfaces[0].triangle_count, local_total);
}

#[test]
fn test_overlapping_spheres_straddling_a_seam_merge() {
  let (jobs, results, cell_size) =
    voxelize_split(&[(-0.8, 0.0, 0.0, 1.0), (0.8, 0.0, 0.0, 1.0)], 0.25, 8);
  assert!(jobs.len() > 1);

  let surfaces = stitch(&jobs, &results, cell_size, SurfaceGeometry::Smooth);
  assert_eq!(surfaces.len(), 1);
}

#[test]
fn test_well_separated_spheres_keep_distinct_ids() {
  let (jobs, results, cell_size) =
    voxelize_split(&[(-1.5, 0.0, 0.0, 0.5), (1.5, 0.0, 0.0, 0.5)], 0.5, 8);
  assert!(jobs.len() > 1);

  let surfaces = stitch(&jobs, &results, cell_size, SurfaceGeometry::Smooth);
  assert_eq!(surfaces.len(), 2);
  assert!(surfaces.iter().all(|s| s.triangle_count > 0));
}
