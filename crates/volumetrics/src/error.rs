//! Error taxonomy for the volumetric job.
//!
//! Only orchestrator-level precondition failures abort a frame. Sub-volume
//! local numerical degeneracies are recovered inside the voxelizer (crossing
//! snap or micro-triangle skip) and never surface as errors.

use thiserror::Error;

/// Frame-fatal orchestrator errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
  /// The particle source cannot deliver the requested frame or its extents.
  #[error("particle source cannot deliver frame {frame}: {reason}")]
  DataUnavailable { frame: u32, reason: String },

  /// The frame holds zero particles. Callers receive a valid empty result
  /// instead of this error; it exists for internal routing and logging.
  #[error("frame {frame} contains no particles")]
  EmptyFrame { frame: u32 },

  /// Non-positive cell size or a degenerate bounding box.
  #[error("invalid grid parameters for frame {frame}: {reason}")]
  InvalidGridParameters { frame: u32, reason: String },

  /// The frame was abandoned through the cancel token.
  #[error("frame {frame} cancelled")]
  Cancelled { frame: u32 },
}

/// Errors reported by a particle source.
#[derive(Error, Debug)]
pub enum SourceError {
  /// The extent query failed (possibly transiently).
  #[error("extent query failed: {0}")]
  Extents(String),

  /// Frame data could not be produced.
  #[error("frame data unavailable: {0}")]
  Data(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}
