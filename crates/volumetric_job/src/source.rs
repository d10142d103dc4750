//! Particle sources for the runner: file-backed frames and a synthetic demo.

use std::path::Path;
use std::sync::Arc;

use glam::Vec3;
use volumetrics::aabb::Aabb;
use volumetrics::error::SourceError;
use volumetrics::particles::{FrameSnapshot, ParticleList, ParticleSource, SourceExtents};

/// Plain-text frame file:
///
/// ```text
/// # comment
/// frame 0 2
/// 0.0 0.0 0.0 1.0
/// 1.5 0.0 0.0 0.5
/// frame 1 1
/// 0.0 0.2 0.0 1.0
/// ```
///
/// Each `frame <index> <count>` header is followed by `x y z radius` rows.
pub struct FileSource {
	frames: Vec<Arc<FrameSnapshot>>,
	requested: u32,
}

impl FileSource {
	pub fn load(path: &Path) -> Result<Self, SourceError> {
		let content = std::fs::read_to_string(path)?;
		Self::parse(&content)
	}

	fn parse(content: &str) -> Result<Self, SourceError> {
		let mut frames: Vec<Vec<f32>> = Vec::new();
		let mut declared: Vec<usize> = Vec::new();
		for (number, line) in content.lines().enumerate() {
			let line = line.trim();
			if line.is_empty() || line.starts_with('#') {
				continue;
			}
			let mut tokens = line.split_whitespace();
			if line.starts_with("frame") {
				tokens.next();
				let index: usize = tokens
					.next()
					.and_then(|t| t.parse().ok())
					.ok_or_else(|| SourceError::Data(format!("line {}: bad frame header", number + 1)))?;
				let count: usize = tokens
					.next()
					.and_then(|t| t.parse().ok())
					.ok_or_else(|| SourceError::Data(format!("line {}: bad frame header", number + 1)))?;
				if index != frames.len() {
					return Err(SourceError::Data(format!(
						"line {}: frame {index} out of order, expected {}",
						number + 1,
						frames.len()
					)));
				}
				frames.push(Vec::new());
				declared.push(count);
				continue;
			}
			let current = frames
				.last_mut()
				.ok_or_else(|| SourceError::Data(format!("line {}: data before frame header", number + 1)))?;
			let values: Vec<f32> = tokens.map(str::parse).collect::<Result<_, _>>().map_err(|_| {
				SourceError::Data(format!("line {}: expected four floats", number + 1))
			})?;
			if values.len() != 4 {
				return Err(SourceError::Data(format!(
					"line {}: expected x y z radius, got {} values",
					number + 1,
					values.len()
				)));
			}
			current.extend_from_slice(&values);
		}
		if frames.is_empty() {
			return Err(SourceError::Data("no frames in input".into()));
		}
		for (index, (frame, &count)) in frames.iter().zip(&declared).enumerate() {
			if frame.len() / 4 != count {
				return Err(SourceError::Data(format!(
					"frame {index} declares {count} particles but holds {}",
					frame.len() / 4
				)));
			}
		}

		let frames = frames
			.into_iter()
			.enumerate()
			.map(|(frame_index, interleaved)| {
				Arc::new(FrameSnapshot {
					frame_index: frame_index as u32,
					lists: vec![ParticleList::PerParticle { interleaved }],
				})
			})
			.collect();
		Ok(Self {
			frames,
			requested: 0,
		})
	}
}

impl ParticleSource for FileSource {
	fn extents(&mut self) -> Result<SourceExtents, SourceError> {
		let mut object_box = Aabb::empty();
		for frame in &self.frames {
			for sphere in frame.spheres() {
				object_box.encapsulate(sphere.center);
			}
		}
		if !object_box.is_valid() {
			return Err(SourceError::Extents("input holds no particles".into()));
		}
		Ok(SourceExtents {
			frame_count: self.frames.len() as u32,
			object_box,
			clip_box: None,
		})
	}

	fn request_frame(&mut self, frame_index: u32) {
		self.requested = frame_index;
	}

	fn poll_data(&mut self) -> Result<Arc<FrameSnapshot>, SourceError> {
		self.frames
			.get(self.requested as usize)
			.cloned()
			.ok_or_else(|| SourceError::Data(format!("frame {} out of range", self.requested)))
	}
}

/// Synthetic demo: a center blob with two orbiting spheres that merge into
/// and separate from it over the course of the run, plus a detached
/// satellite exercising the global-radius list layout.
pub struct DemoSource {
	frame_count: u32,
	requested: u32,
}

impl DemoSource {
	pub fn new(frame_count: u32) -> Self {
		Self {
			frame_count: frame_count.max(1),
			requested: 0,
		}
	}
}

impl ParticleSource for DemoSource {
	fn extents(&mut self) -> Result<SourceExtents, SourceError> {
		Ok(SourceExtents {
			frame_count: self.frame_count,
			object_box: Aabb::new(Vec3::splat(-2.5), Vec3::splat(2.5)),
			clip_box: None,
		})
	}

	fn request_frame(&mut self, frame_index: u32) {
		self.requested = frame_index;
	}

	fn poll_data(&mut self) -> Result<Arc<FrameSnapshot>, SourceError> {
		let t = self.requested as f32 / self.frame_count as f32 * std::f32::consts::TAU;
		let orbit = 1.0 + 0.8 * t.cos().abs();
		let interleaved = vec![
			0.0, 0.0, 0.0, 0.8,
			orbit * t.cos(), orbit * t.sin(), 0.0, 0.6,
			-orbit * t.cos(), -orbit * t.sin(), 0.0, 0.6,
		];
		Ok(Arc::new(FrameSnapshot {
			frame_index: self.requested,
			lists: vec![
				ParticleList::PerParticle { interleaved },
				ParticleList::GlobalRadius {
					radius: 0.3,
					positions: vec![Vec3::new(0.0, 0.0, 2.0)],
				},
			],
		}))
	}
}
