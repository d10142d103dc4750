//! Configuration loading for the volumetric job runner.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Root configuration for a job run.
#[derive(Debug, Deserialize)]
pub struct Config {
	/// File that receives per-frame surface metrics (CSV). None disables it.
	pub metrics_path: Option<String>,
	/// Multiplier for the particle radius.
	#[serde(default = "default_radius_multiplier")]
	pub radius_multiplier: f32,
	/// Fraction of the minimal particle radius that is used as cell size.
	#[serde(default = "default_cell_size_ratio")]
	pub cell_size_ratio: f32,
	/// Replace the surface triangles by the border triangles in the debug
	/// geometry output.
	#[serde(default)]
	pub show_border_geometry: bool,
	/// Publish the job subdivision grid as line geometry.
	#[serde(default)]
	pub show_bounding_boxes: bool,
	/// Continue computation immediately after a frame finishes. When false
	/// the runner waits for Enter between frames.
	#[serde(default = "default_true")]
	pub auto_continue: bool,
	/// Worker thread count; 0 uses one thread per core.
	#[serde(default)]
	pub threads: usize,
}

fn default_radius_multiplier() -> f32 {
	1.0
}

fn default_cell_size_ratio() -> f32 {
	0.5
}

fn default_true() -> bool {
	true
}

impl Default for Config {
	fn default() -> Self {
		Self {
			metrics_path: None,
			radius_multiplier: default_radius_multiplier(),
			cell_size_ratio: default_cell_size_ratio(),
			show_border_geometry: false,
			show_bounding_boxes: false,
			auto_continue: true,
			threads: 0,
		}
	}
}

impl Config {
	/// Load configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		let config: Config =
			toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		if !(1e-4..=1e4).contains(&self.radius_multiplier) {
			anyhow::bail!(
				"radius_multiplier must be in [0.0001, 10000], got {}",
				self.radius_multiplier
			);
		}
		if !(0.01..=10.0).contains(&self.cell_size_ratio) {
			anyhow::bail!(
				"cell_size_ratio must be in [0.01, 10], got {}",
				self.cell_size_ratio
			);
		}
		Ok(())
	}
}
