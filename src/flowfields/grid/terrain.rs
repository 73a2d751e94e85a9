//! Building the static layer of a [Grid] from authored map data.
//!
//! A cost matrix is a list of rows (`z`) of columns (`x`) where each value is
//! the terrain weight of a cell. Following the usual FlowField convention a
//! value of `255` ([IMPASSABLE_TERRAIN]) marks the cell as non-walkable and
//! any other value is the cost of traversing it, `1` being the default and
//! easiest:
//!
//! ```text
//!  1,  1,   1,   1, 1
//!  1, 255, 255,  1, 1
//!  1,  1,  255,  1, 1
//!  1,  1,   1,  56, 1
//! ```
//!

use crate::prelude::*;

impl Grid {
	/// Create a [Grid] from rows of terrain values. Every row must have the
	/// same length
	pub fn from_cost_matrix(rows: &[Vec<u8>]) -> Result<Self, FlowFieldError> {
		let depth = rows.len();
		let width = rows.first().map(|r| r.len()).unwrap_or(0);
		let dimensions = GridDimensions::new(
			u32::try_from(width).unwrap_or(u32::MAX),
			u32::try_from(depth).unwrap_or(u32::MAX),
		)?;
		let mut grid = Grid::new(dimensions)?;
		for (z, row) in rows.iter().enumerate() {
			if row.len() != width {
				return Err(FlowFieldError::ShapeMismatch {
					expected: width,
					found: row.len(),
				});
			}
			for (x, value) in row.iter().enumerate() {
				grid.apply_terrain_value(x as u32, z as u32, *value)?;
			}
		}
		Ok(grid)
	}
	/// Replace the walkability and terrain of every cell with a flat
	/// row-major list of terrain values. The grid keeps its dimensions
	pub fn load_cost_values(&mut self, values: &[u8]) -> Result<(), FlowFieldError> {
		let dimensions = self.get_dimensions();
		if values.len() != dimensions.cell_count() {
			return Err(FlowFieldError::ShapeMismatch {
				expected: dimensions.cell_count(),
				found: values.len(),
			});
		}
		for (index, value) in values.iter().enumerate() {
			let (x, z) = dimensions.coords_of_unchecked(index);
			self.apply_terrain_value(x, z, *value)?;
		}
		Ok(())
	}
	/// Interpret a single authored value
	fn apply_terrain_value(&mut self, x: u32, z: u32, value: u8) -> Result<(), FlowFieldError> {
		if value == IMPASSABLE_TERRAIN {
			self.set_walkable(x, z, false)
		} else {
			self.set_walkable(x, z, true)?;
			self.set_terrain(x, z, value)
		}
	}
	/// From a CSV file without headers generate the [Grid], each record is a
	/// row of the map
	#[cfg(feature = "csv")]
	pub fn from_csv(path: impl AsRef<std::path::Path>) -> Result<Self, FlowFieldError> {
		let data = std::fs::File::open(path)?;
		let mut rdr = csv::ReaderBuilder::new()
			.has_headers(false)
			.trim(csv::Trim::All)
			.from_reader(data);
		let mut rows = Vec::new();
		for record in rdr.deserialize() {
			let row: Vec<u8> = record?;
			rows.push(row);
		}
		Grid::from_cost_matrix(&rows)
	}
	/// From a `ron` file of a previously serialized [Grid] restore it
	#[cfg(feature = "ron")]
	pub fn from_ron(path: impl AsRef<std::path::Path>) -> Result<Self, FlowFieldError> {
		let file = std::fs::File::open(path)?;
		let grid: Grid =
			ron::de::from_reader(file).map_err(|e| FlowFieldError::Ron(e.to_string()))?;
		grid.validate_shape()?;
		Ok(grid)
	}
	/// Serialize the [Grid] as a `ron` string
	#[cfg(feature = "ron")]
	pub fn to_ron_string(&self) -> Result<String, FlowFieldError> {
		ron::ser::to_string(self).map_err(|e| FlowFieldError::Ron(e.to_string()))
	}
	/// Create a [Grid] from a greyscale image where each pixel is a cell.
	/// White pixels are cheap open ground, darker pixels are more expensive
	/// and pure black is impassable
	#[cfg(feature = "heightmap")]
	pub fn from_heightmap(path: &str) -> Result<Self, FlowFieldError> {
		use photon_rs::native::open_image;
		let img = open_image(path).map_err(|e| FlowFieldError::Heightmap(format!("{:?}", e)))?;
		let img_width = img.get_width();
		let img_height = img.get_height();
		let raw_pixels = img.get_raw_pixels();
		// raw pixels are arranged from the top left of the image and come in sets of either 3 or 4 (if alpha channel is inlcuded)
		let len_if_alpha = (img_width * img_height * 4) as usize;
		let chunk_size = if len_if_alpha == raw_pixels.len() {
			4
		} else {
			3
		};
		let dimensions = GridDimensions::new(img_width, img_height)?;
		let mut grid = Grid::new(dimensions)?;
		let values: Vec<u8> = raw_pixels
			.chunks(chunk_size)
			.map(|px| {
				// careful of u8 overflow
				let colour_avg = (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0;
				(255 - colour_avg as u8).clamp(1, 255)
			})
			.collect();
		grid.load_cost_values(&values)?;
		Ok(grid)
	}
}
