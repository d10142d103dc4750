//! Tests for the border voxel touch predicate.

use glam::Vec3;
use smallvec::smallvec;

use super::BorderVoxel;
use crate::types::Triangle;

fn voxel(cell: [i32; 3], anchor: Vec3) -> BorderVoxel {
  BorderVoxel {
    cell,
    triangles: smallvec![Triangle::new(
      anchor,
      anchor + Vec3::new(0.1, 0.0, 0.0),
      anchor + Vec3::new(0.0, 0.1, 0.0),
    )],
  }
}

const TOL: f32 = 1e-4;

#[test]
fn test_coincident_cells_with_shared_vertex_touch() {
  let a = voxel([4, 2, 7], Vec3::new(1.0, 2.0, 3.0));
  let b = voxel([4, 2, 7], Vec3::new(1.0, 2.0, 3.0));
  assert!(a.touches(&b, TOL));
  assert!(b.touches(&a, TOL));
}

#[test]
fn test_face_adjacent_cells_with_shared_vertex_touch() {
  let a = voxel([4, 2, 7], Vec3::new(1.0, 2.0, 3.0));
  let b = voxel([5, 2, 7], Vec3::new(1.1, 2.0, 3.0));
  // b's anchor offset puts one of a's vertices exactly on b's first vertex.
  assert!(a.touches(&b, TOL));
}

#[test]
fn test_edge_adjacent_cells_touch() {
  let a = voxel([4, 2, 7], Vec3::new(1.0, 2.0, 3.0));
  let b = voxel([5, 3, 7], Vec3::new(1.0, 2.0, 3.0));
  assert!(a.touches(&b, TOL));
}

#[test]
fn test_corner_adjacent_cells_do_not_touch() {
  // Full diagonal neighbors share only a corner; not adjacency.
  let a = voxel([4, 2, 7], Vec3::new(1.0, 2.0, 3.0));
  let b = voxel([5, 3, 8], Vec3::new(1.0, 2.0, 3.0));
  assert!(!a.touches(&b, TOL));
}

#[test]
fn test_distant_cells_do_not_touch() {
  let a = voxel([4, 2, 7], Vec3::new(1.0, 2.0, 3.0));
  let b = voxel([6, 2, 7], Vec3::new(1.0, 2.0, 3.0));
  assert!(!a.touches(&b, TOL));
}

#[test]
fn test_adjacent_cells_without_shared_vertex_do_not_touch() {
  let a = voxel([4, 2, 7], Vec3::new(1.0, 2.0, 3.0));
  let b = voxel([5, 2, 7], Vec3::new(9.0, 9.0, 9.0));
  assert!(!a.touches(&b, TOL));
}

#[test]
fn test_tolerance_bounds_vertex_matching() {
  let a = voxel([4, 2, 7], Vec3::new(1.0, 2.0, 3.0));
  let near = voxel([5, 2, 7], Vec3::new(1.0 + 0.5e-4, 2.0, 3.0));
  let far = voxel([5, 2, 7], Vec3::new(1.0 + 5e-4, 2.0, 3.0));
  assert!(a.touches(&near, TOL));
  assert!(!a.touches(&far, TOL));
}
