//! Volumetric job runner.
//!
//! Computes, per animation frame, the surface area and enclosed volume of
//! the union of spheres formed by a particle data set, and writes the
//! per-surface metrics to a CSV file.

mod config;
mod source;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use volumetrics::particles::ParticleSource;
use volumetrics::{JobConfig, SurfaceGeometry, VolumetricJob};

use config::Config;
use source::{DemoSource, FileSource};

/// Batch surface/volume metrics job over particle data.
#[derive(Parser, Debug)]
#[command(name = "volumetric_job")]
#[command(about = "Computes surface area and volume metrics of particle data")]
struct Args {
	/// Path to configuration TOML file.
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Particle frames file (`frame <index> <count>` headers followed by
	/// `x y z radius` rows).
	#[arg(short, long, conflicts_with = "demo")]
	input: Option<PathBuf>,

	/// Run the built-in synthetic demo source instead of reading a file.
	#[arg(long)]
	demo: bool,

	/// Number of frames for the demo source.
	#[arg(long, default_value_t = 24)]
	frames: u32,
}

fn main() -> Result<()> {
	env_logger::init();
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => Config::load(path)?,
		None => Config::default(),
	};

	if config.threads > 0 {
		rayon::ThreadPoolBuilder::new()
			.num_threads(config.threads)
			.build_global()
			.context("configuring the worker pool")?;
	}

	let mut source: Box<dyn ParticleSource> = match &args.input {
		Some(path) if !args.demo => Box::new(
			FileSource::load(path)
				.with_context(|| format!("loading particle data from {}", path.display()))?,
		),
		_ => Box::new(DemoSource::new(args.frames)),
	};

	let mut job = VolumetricJob::new(JobConfig {
		radius_multiplier: config.radius_multiplier,
		cell_size_ratio: config.cell_size_ratio,
		geometry: if config.show_border_geometry {
			SurfaceGeometry::BorderSeams
		} else {
			SurfaceGeometry::Smooth
		},
		show_bounding_boxes: config.show_bounding_boxes,
		..JobConfig::default()
	});

	let frame_count = source
		.extents()
		.context("particle source does not answer the extent request")?
		.frame_count;
	println!("Running {frame_count} frame(s)");

	let mut metrics_writer = match &config.metrics_path {
		Some(path) => {
			let file = File::create(path)
				.with_context(|| format!("creating metrics file {path}"))?;
			let mut writer = BufWriter::new(file);
			writeln!(writer, "frame,surface,triangles,area,volume")?;
			Some(writer)
		}
		None => None,
	};

	for frame_index in 0..frame_count {
		match job.run_frame(source.as_mut(), frame_index) {
			Ok(result) => {
				println!(
					"frame {frame_index}: {} surface(s), {} triangles, area {:.4}, volume {:.4}",
					result.surfaces.len(),
					result.triangle_count,
					result.total_area,
					result.total_volume
				);
				if let Some(writer) = &mut metrics_writer {
					for surface in &result.surfaces {
						writeln!(
							writer,
							"{frame_index},{},{},{},{}",
							surface.id, surface.triangle_count, surface.area, surface.volume
						)?;
					}
				}
			}
			Err(err) => {
				log::warn!("frame {frame_index} failed: {err}");
			}
		}

		if !config.auto_continue && frame_index + 1 < frame_count {
			println!("Press Enter to continue to frame {}", frame_index + 1);
			let mut line = String::new();
			std::io::stdin()
				.read_line(&mut line)
				.context("reading stdin")?;
		}
	}

	if let Some(writer) = &mut metrics_writer {
		writer.flush()?;
	}
	if let Some(path) = &config.metrics_path {
		println!("Metrics written to: {path}");
	}

	Ok(())
}
