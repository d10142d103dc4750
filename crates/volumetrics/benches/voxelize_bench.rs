//! Benchmark for the tetrahedral voxelizer and the surface stitcher.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use volumetrics::aabb::Aabb;
use volumetrics::grid::{tile, GridParams};
use volumetrics::particles::{FrameSnapshot, ParticleList, SourceExtents};
use volumetrics::stitch::{stitch, SurfaceGeometry};
use volumetrics::threading::CancelToken;
use volumetrics::voxelizer::voxelize;

/// A blob of overlapping spheres around the origin.
fn blob_snapshot() -> FrameSnapshot {
  let mut interleaved = Vec::new();
  for i in 0..8 {
    let angle = i as f32 * std::f32::consts::TAU / 8.0;
    interleaved.extend_from_slice(&[angle.cos() * 0.6, angle.sin() * 0.6, 0.0, 0.8]);
  }
  FrameSnapshot {
    frame_index: 0,
    lists: vec![ParticleList::PerParticle { interleaved }],
  }
}

fn grid_of(snapshot: &FrameSnapshot, cell_size_ratio: f32) -> GridParams {
  let mut object_box = Aabb::empty();
  for sphere in snapshot.spheres() {
    object_box.encapsulate(sphere.center);
  }
  let extents = SourceExtents {
    frame_count: 1,
    object_box,
    clip_box: None,
  };
  GridParams::derive(snapshot, &extents, 1.0, cell_size_ratio).unwrap()
}

fn bench_voxelize(c: &mut Criterion) {
  let snapshot = blob_snapshot();
  let params = grid_of(&snapshot, 0.1);
  let jobs = tile(&params, 16);
  let cancel = CancelToken::new();

  c.bench_function("voxelize (blob, 16-cell sub-volumes)", |b| {
    b.iter(|| {
      for job in &jobs {
        black_box(voxelize(job, &snapshot, &cancel));
      }
    });
  });
}

fn bench_stitch(c: &mut Criterion) {
  let snapshot = blob_snapshot();
  let params = grid_of(&snapshot, 0.1);
  let jobs = tile(&params, 8);
  let cancel = CancelToken::new();
  let results: Vec<_> = jobs
    .iter()
    .map(|job| voxelize(job, &snapshot, &cancel))
    .collect();

  c.bench_function("stitch (blob, 8-cell sub-volumes)", |b| {
    b.iter(|| {
      black_box(stitch(
        &jobs,
        &results,
        params.cell_size,
        SurfaceGeometry::Smooth,
      ))
    });
  });
}

criterion_group!(benches, bench_voxelize, bench_stitch);
criterion_main!(benches);
