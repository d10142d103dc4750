//! Job orchestrator: the per-frame volumetric pipeline.
//!
//! ```text
//! particle source ──► grid parameters ──► sub-volume tiling
//!                                              │ one task each
//!                                              ▼
//!                                     parallel voxelizers
//!                                              │ results over channel
//!                                              ▼
//!       wait / drain loop ──► surface stitcher ──► metrics + geometry
//! ```
//!
//! The orchestrator itself is single-threaded: it submits tasks, waits in
//! bounded slices, opportunistically drains finished results into the debug
//! back-buffer, and stitches once everything arrived. Frames never overlap;
//! frame N is fully stitched before frame N+1 starts.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel as channel;
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::aabb::Aabb;
use crate::error::JobError;
use crate::grid::{choose_sub_vol_cells, tile, GridParams, SubVolume};
use crate::metrics::{FrameMetrics, JobMetrics};
use crate::output::{DebugOutput, FrameGeometry};
use crate::particles::{FrameSnapshot, ParticleSource};
use crate::stitch::{stitch, StitchedSurface, SurfaceGeometry};
use crate::threading::{CancelToken, TaskExecutor};
use crate::voxelizer::{voxelize, VoxelizerResult};

/// Orchestrator configuration.
#[derive(Clone, Debug)]
pub struct JobConfig {
  /// Multiplier applied to every particle radius.
  pub radius_multiplier: f32,
  /// Fraction of the minimal particle radius used as cell size.
  pub cell_size_ratio: f32,
  /// Geometry published for debug display.
  pub geometry: SurfaceGeometry,
  /// Publish the sub-division grid as line geometry.
  pub show_bounding_boxes: bool,
  /// Sleep between polls while a source catches up to the requested frame.
  pub frame_poll_interval: Duration,
  /// Poll attempts before a frame is reported unavailable.
  pub frame_poll_retries: u32,
  /// Executor wait slice between partial-result drains.
  pub wait_slice: Duration,
}

impl Default for JobConfig {
  fn default() -> Self {
    Self {
      radius_multiplier: 1.0,
      cell_size_ratio: 0.5,
      geometry: SurfaceGeometry::Smooth,
      show_bounding_boxes: false,
      frame_poll_interval: Duration::from_millis(100),
      frame_poll_retries: 50,
      wait_slice: Duration::from_millis(500),
    }
  }
}

/// Per-surface aggregates reported to callers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceStats {
  pub id: u32,
  pub triangle_count: usize,
  pub area: f32,
  pub volume: f32,
}

/// Aggregate result of one completed frame.
#[derive(Clone, Debug, Default)]
pub struct FrameResult {
  pub frame_index: u32,
  pub surfaces: Vec<SurfaceStats>,
  pub triangle_count: usize,
  pub total_area: f32,
  pub total_volume: f32,
  pub sub_volume_count: usize,
}

/// The volumetric job core. One instance runs frames strictly in sequence;
/// the published output and the `hash` counter are the only state shared
/// with readers.
pub struct VolumetricJob {
  config: JobConfig,
  executor: TaskExecutor,
  output: Arc<DebugOutput>,
  metrics: JobMetrics,
  cancel: CancelToken,
}

impl VolumetricJob {
  pub fn new(config: JobConfig) -> Self {
    Self {
      config,
      executor: TaskExecutor::new(),
      output: Arc::new(DebugOutput::new()),
      metrics: JobMetrics::new(),
      cancel: CancelToken::new(),
    }
  }

  pub fn config(&self) -> &JobConfig {
    &self.config
  }

  /// Handle for debug consumers; safe to read from other threads.
  pub fn output(&self) -> Arc<DebugOutput> {
    Arc::clone(&self.output)
  }

  /// Token that aborts the in-flight frame when cancelled.
  pub fn cancel_token(&self) -> CancelToken {
    self.cancel.clone()
  }

  pub fn metrics(&self) -> &JobMetrics {
    &self.metrics
  }

  /// Run every frame the source reports. Failed frames are logged and
  /// skipped; cancellation ends the run.
  pub fn run(&mut self, source: &mut dyn ParticleSource) -> Result<Vec<FrameResult>, JobError> {
    let extents = source.extents().map_err(|err| JobError::DataUnavailable {
      frame: 0,
      reason: err.to_string(),
    })?;
    info!(frames = extents.frame_count, "particle source ready");

    let mut completed = Vec::new();
    for frame_index in 0..extents.frame_count {
      match self.run_frame(source, frame_index) {
        Ok(result) => completed.push(result),
        Err(JobError::Cancelled { .. }) => {
          warn!(frame = frame_index, "job cancelled");
          break;
        }
        Err(err) => {
          warn!(frame = frame_index, %err, "frame failed, skipping");
          self.metrics.record_failure();
        }
      }
    }
    Ok(completed)
  }

  /// Compute one frame: derive the grid, voxelize all sub-volumes in
  /// parallel, stitch, publish, and advance the data version.
  ///
  /// A failed or cancelled frame leaves the published buffers and the
  /// `hash` counter untouched. An empty frame is not a failure: it yields
  /// a valid result with zero surfaces.
  pub fn run_frame(
    &mut self,
    source: &mut dyn ParticleSource,
    frame_index: u32,
  ) -> Result<FrameResult, JobError> {
    let frame_start = Instant::now();
    let extents = source.extents().map_err(|err| JobError::DataUnavailable {
      frame: frame_index,
      reason: err.to_string(),
    })?;
    let snapshot = self.fetch_frame(source, frame_index)?;

    let params = match GridParams::derive(
      &snapshot,
      &extents,
      self.config.radius_multiplier,
      self.config.cell_size_ratio,
    ) {
      Ok(params) => params,
      Err(JobError::EmptyFrame { .. }) => {
        info!(frame = frame_index, "frame holds no particles");
        return Ok(self.finish_frame(frame_index, frame_start, None, &[], &[], Vec::new(), 0));
      }
      Err(err) => return Err(err),
    };

    let sub_vol_cells = choose_sub_vol_cells(params.res);
    let jobs = tile(&params, sub_vol_cells);
    debug!(
      frame = frame_index,
      res = ?params.res,
      cell_size = params.cell_size,
      sub_volumes = jobs.len(),
      "grid derived"
    );

    // Fan out: one task per sub-volume. Each task owns its descriptor and
    // reports back over the channel; the executor only counts completions.
    let (sender, receiver) = channel::unbounded::<VoxelizerResult>();
    for job in &jobs {
      let job = job.clone();
      let snapshot = Arc::clone(&snapshot);
      let cancel = self.cancel.clone();
      let sender = sender.clone();
      self.executor.submit(move || {
        let result = voxelize(&job, &snapshot, &cancel);
        // A dropped receiver means the frame was abandoned.
        let _ = sender.send(result);
      });
    }
    drop(sender);

    let mut results: Vec<VoxelizerResult> = Vec::with_capacity(jobs.len());
    while results.len() < jobs.len() {
      let all_done = self.executor.wait(self.config.wait_slice);
      while let Ok(result) = receiver.try_recv() {
        results.push(result);
      }
      if self.cancel.is_cancelled() {
        return Err(JobError::Cancelled { frame: frame_index });
      }
      if !all_done && !results.is_empty() && results.len() < jobs.len() {
        // Opportunistic partial publish for interactive consumers. The data
        // version only advances once the frame completes.
        let partial = stitch(&jobs, &results, params.cell_size, self.config.geometry);
        self.publish_geometry(Some(&params.bounds), &jobs, &partial, self.output.hash());
      }
    }
    if results.iter().any(|result| result.cancelled) {
      return Err(JobError::Cancelled { frame: frame_index });
    }
    results.sort_by_key(|result| result.sub_volume);

    let degenerate: u32 = results.iter().map(|result| result.degenerate_skipped).sum();
    if degenerate > 0 {
      debug!(
        frame = frame_index,
        skipped = degenerate,
        "degenerate micro-triangles skipped"
      );
    }

    let stitch_start = Instant::now();
    let surfaces = stitch(&jobs, &results, params.cell_size, self.config.geometry);
    let stitch_us = stitch_start.elapsed().as_micros() as u64;
    info!(frame = frame_index, "done marching");

    Ok(self.finish_frame(
      frame_index,
      frame_start,
      Some(&params.bounds),
      &jobs,
      &results,
      surfaces,
      stitch_us,
    ))
  }

  /// Poll the source until it delivers the requested frame.
  fn fetch_frame(
    &self,
    source: &mut dyn ParticleSource,
    frame_index: u32,
  ) -> Result<Arc<FrameSnapshot>, JobError> {
    source.request_frame(frame_index);
    for attempt in 0..=self.config.frame_poll_retries {
      let snapshot = source.poll_data().map_err(|err| JobError::DataUnavailable {
        frame: frame_index,
        reason: err.to_string(),
      })?;
      if snapshot.frame_index == frame_index {
        return Ok(snapshot);
      }
      if attempt < self.config.frame_poll_retries {
        thread::sleep(self.config.frame_poll_interval);
      }
    }
    Err(JobError::DataUnavailable {
      frame: frame_index,
      reason: "source never delivered the requested frame".into(),
    })
  }

  /// Build the frame result, publish the final geometry, advance the data
  /// version exactly once, and record metrics.
  #[allow(clippy::too_many_arguments)]
  fn finish_frame(
    &mut self,
    frame_index: u32,
    frame_start: Instant,
    bounds: Option<&Aabb>,
    jobs: &[SubVolume],
    results: &[VoxelizerResult],
    surfaces: Vec<StitchedSurface>,
    stitch_us: u64,
  ) -> FrameResult {
    let stats: Vec<SurfaceStats> = surfaces
      .iter()
      .map(|surface| SurfaceStats {
        id: surface.id,
        triangle_count: surface.triangle_count,
        area: surface.area,
        volume: surface.volume,
      })
      .collect();
    for surface in &stats {
      info!(
        frame = frame_index,
        surface = surface.id,
        triangles = surface.triangle_count,
        area = surface.area,
        volume = surface.volume,
        "surface"
      );
    }

    let result = FrameResult {
      frame_index,
      triangle_count: stats.iter().map(|s| s.triangle_count).sum(),
      total_area: stats.iter().map(|s| s.area as f64).sum::<f64>() as f32,
      total_volume: stats.iter().map(|s| s.volume as f64).sum::<f64>() as f32,
      sub_volume_count: jobs.len(),
      surfaces: stats,
    };

    let hash = self.output.advance_hash();
    self.publish_geometry(bounds, jobs, &surfaces, hash);

    let frame_us = frame_start.elapsed().as_micros() as u64;
    self.metrics.record_frame(&FrameMetrics {
      frame_index,
      surface_count: result.surfaces.len(),
      triangle_count: result.triangle_count,
      total_area: result.total_area,
      total_volume: result.total_volume,
      sub_volume_count: result.sub_volume_count,
      voxelize_us: results.iter().map(|r| r.elapsed_us).sum(),
      stitch_us,
      frame_us,
    });
    result
  }

  /// Assemble and swap in a complete output buffer.
  fn publish_geometry(
    &self,
    bounds: Option<&Aabb>,
    jobs: &[SubVolume],
    surfaces: &[StitchedSurface],
    hash: u64,
  ) {
    let mut geometry = FrameGeometry {
      hash,
      ..Default::default()
    };
    if self.config.show_bounding_boxes {
      if let Some(bounds) = bounds {
        geometry.lines.push_box(bounds);
      }
      for job in jobs {
        geometry.lines.push_box(&job.bounds);
      }
    }
    for surface in surfaces {
      geometry.mesh.push_surface(surface);
    }
    self.output.publish(geometry);
  }
}

#[cfg(test)]
#[path = "job_test.rs"]
mod job_test;
