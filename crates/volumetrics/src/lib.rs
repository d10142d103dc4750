//! volumetrics - parallel surface and volume metrics for particle data
//!
//! This crate partitions a frame of spatially distributed particles into an
//! implicit union-of-spheres field, extracts watertight iso-surfaces per
//! spatial sub-volume with a parallelized marching-tetrahedra scheme, and
//! stitches the per-sub-volume fragments into globally consistent connected
//! surfaces with aggregate surface-area and enclosed-volume metrics.
//!
//! # Pipeline
//!
//! - [`grid`]: per-frame grid parameters and cubical sub-volume tiling
//! - [`voxelizer`]: one worker task per sub-volume, marching tetrahedra over
//!   the local field, local surface labeling, border voxel records
//! - [`stitch`]: cross-sub-volume connected-component merge over touching
//!   border voxels, aggregation per global surface ID
//! - [`job`]: the orchestrator driving frames end to end
//!
//! # Example
//!
//! ```ignore
//! use volumetrics::{JobConfig, VolumetricJob};
//!
//! let mut job = VolumetricJob::new(JobConfig::default());
//! let results = job.run(&mut source)?;
//! for frame in &results {
//!     println!(
//!         "frame {}: {} surfaces, total area {}",
//!         frame.frame_index,
//!         frame.surfaces.len(),
//!         frame.total_area
//!     );
//! }
//! ```

pub mod aabb;
pub mod disjoint_set;
pub mod error;
pub mod field;
pub mod grid;
pub mod metrics;
pub mod output;
pub mod particles;
pub mod stitch;
pub mod threading;
pub mod types;
pub mod voxelizer;

// The orchestrator ties the pipeline together.
pub mod job;

// Re-export commonly used items
pub use aabb::Aabb;
pub use error::{JobError, SourceError};
pub use grid::{choose_sub_vol_cells, tile, GridParams, SubVolume};
pub use job::{FrameResult, JobConfig, SurfaceStats, VolumetricJob};
pub use output::{DebugOutput, FrameGeometry, LineGeometry, TriangleMesh};
pub use particles::{FrameSnapshot, ParticleList, ParticleSource, SourceExtents, Sphere};
pub use stitch::{stitch, StitchedSurface, SurfaceGeometry};
pub use threading::{CancelToken, TaskExecutor};
pub use types::Triangle;
pub use voxelizer::{voxelize, BorderVoxel, VoxelizerResult};
