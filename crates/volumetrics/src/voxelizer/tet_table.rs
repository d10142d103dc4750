//! Tetrahedral decomposition and per-tetrahedron marching cases.
//!
//! Every grid cell splits into six tetrahedra around the main diagonal
//! (corner 0 to corner 7). The decomposition induces the low-to-high corner
//! diagonal on every cube face, so adjacent cells (and adjacent sub-volumes)
//! triangulate shared faces identically; the extracted surface stays
//! watertight across cell and seam boundaries.
//!
//! Corner indices use the bit pattern `zyx`:
//!
//! ```text
//!   0 = (0,0,0)    4 = (0,0,1)
//!   1 = (1,0,0)    5 = (1,0,1)
//!   2 = (0,1,0)    6 = (0,1,1)
//!   3 = (1,1,0)    7 = (1,1,1)
//! ```

use glam::Vec3;

/// Cube corner offsets, indexed by bit pattern `zyx`.
pub const CORNER_OFFSETS: [[usize; 3]; 8] = [
  [0, 0, 0],
  [1, 0, 0],
  [0, 1, 0],
  [1, 1, 0],
  [0, 0, 1],
  [1, 0, 1],
  [0, 1, 1],
  [1, 1, 1],
];

/// Six tetrahedra tiling the unit cube, all sharing the 0–7 diagonal.
/// The middle corners walk the edge cycle 1→3→2→6→4→5 around the diagonal.
pub const CUBE_TETS: [[usize; 4]; 6] = [
  [0, 1, 3, 7],
  [0, 3, 2, 7],
  [0, 2, 6, 7],
  [0, 6, 4, 7],
  [0, 4, 5, 7],
  [0, 5, 1, 7],
];

/// Interpolation denominators with magnitude below this snap the crossing to
/// the edge midpoint instead of dividing.
pub const DEGENERACY_EPS: f32 = 1e-12;

/// A marching vertex: the interpolated crossing position plus the unordered
/// lattice vertex pair it lies between. The pair identifies the vertex
/// exactly, independent of which cell or tetrahedron produced it.
#[derive(Clone, Copy, Debug)]
pub struct EdgeVertex {
  pub pos: Vec3,
  pub key: (u32, u32),
}

/// Interpolate the iso crossing on the edge between two lattice vertices.
///
/// The endpoints are ordered by lattice key before interpolating, so every
/// producer of the same edge computes a bitwise-identical position.
fn edge_vertex(pa: Vec3, va: f32, ka: u32, pb: Vec3, vb: f32, kb: u32) -> EdgeVertex {
  let (p0, v0, k0, p1, v1, k1) = if ka <= kb {
    (pa, va, ka, pb, vb, kb)
  } else {
    (pb, vb, kb, pa, va, ka)
  };
  let denom = v1 - v0;
  let t = if denom.abs() < DEGENERACY_EPS {
    0.5
  } else {
    (-v0 / denom).clamp(0.0, 1.0)
  };
  EdgeVertex {
    pos: p0 + (p1 - p0) * t,
    key: (k0, k1),
  }
}

/// Flip the triangle if needed so its normal points away from `inside`.
fn away_from(tri: [EdgeVertex; 3], inside: Vec3) -> [EdgeVertex; 3] {
  let n = (tri[1].pos - tri[0].pos).cross(tri[2].pos - tri[0].pos);
  if n.dot(inside - tri[0].pos) > 0.0 {
    [tri[0], tri[2], tri[1]]
  } else {
    tri
  }
}

/// March one tetrahedron, emitting zero, one, or two triangles.
///
/// `values[i] < 0.0` classifies corner `i` as inside. Triangles are oriented
/// with normals pointing out of the solid.
pub fn march_tet(
  positions: &[Vec3; 4],
  values: &[f32; 4],
  keys: &[u32; 4],
  mut emit: impl FnMut([EdgeVertex; 3]),
) {
  let mut inside = [0usize; 4];
  let mut outside = [0usize; 4];
  let mut n_in = 0;
  let mut n_out = 0;
  for i in 0..4 {
    if values[i] < 0.0 {
      inside[n_in] = i;
      n_in += 1;
    } else {
      outside[n_out] = i;
      n_out += 1;
    }
  }

  let ev = |a: usize, b: usize| {
    edge_vertex(positions[a], values[a], keys[a], positions[b], values[b], keys[b])
  };

  match n_in {
    0 | 4 => {}
    1 => {
      let i = inside[0];
      let tri = [ev(i, outside[0]), ev(i, outside[1]), ev(i, outside[2])];
      emit(away_from(tri, positions[i]));
    }
    3 => {
      let o = outside[0];
      let centroid =
        (positions[inside[0]] + positions[inside[1]] + positions[inside[2]]) / 3.0;
      let tri = [ev(inside[0], o), ev(inside[1], o), ev(inside[2], o)];
      emit(away_from(tri, centroid));
    }
    2 => {
      // Quad between the two crossing edge pairs, split into two triangles.
      let (i, j) = (inside[0], inside[1]);
      let (k, l) = (outside[0], outside[1]);
      let quad = [ev(i, k), ev(i, l), ev(j, l), ev(j, k)];
      let centroid = (positions[i] + positions[j]) * 0.5;
      emit(away_from([quad[0], quad[1], quad[2]], centroid));
      emit(away_from([quad[0], quad[2], quad[3]], centroid));
    }
    _ => unreachable!(),
  }
}

#[cfg(test)]
#[path = "tet_table_test.rs"]
mod tet_table_test;
