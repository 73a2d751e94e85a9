//! The Grid Store owns one flat buffer of [Cell] records for every position
//! of the map. A cell is addressed by a linear index derived from its
//! `(x, z)` coordinates, `index = z * width + x`, so each row of the map is
//! contiguous in memory:
//!
//! ```text
//!        x=0  x=1  x=2  x=3
//!       ___________________
//! z=0  | 0  | 1  | 2  | 3  |
//!      |____|____|____|____|
//! z=1  | 4  | 5  | 6  | 7  |
//!      |____|____|____|____|
//! z=2  | 8  | 9  | 10 | 11 |
//!      |____|____|____|____|
//! ```
//!
//! The buffer is allocated once for a set of [GridDimensions] and its values
//! are overwritten in place by every computation. Changing the dimensions
//! means building a new [Grid].
//!

pub mod terrain;

use crate::prelude::*;

/// ID of a cell within the grid as `(x, z)`, `x` being the column and `z` the row
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct GridCell((u32, u32));

impl GridCell {
	/// Create a new instance of [GridCell]
	pub fn new(x: u32, z: u32) -> Self {
		GridCell((x, z))
	}
	/// Get the `(x, z)` tuple
	pub fn get_xz(&self) -> (u32, u32) {
		self.0
	}
	/// Get the column
	pub fn get_x(&self) -> u32 {
		self.0 .0
	}
	/// Get the row
	pub fn get_z(&self) -> u32 {
		self.0 .1
	}
}

/// The number of columns (`width`, along `x`) and rows (`depth`, along `z`) of a grid
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct GridDimensions {
	/// Number of columns
	width: u32,
	/// Number of rows
	depth: u32,
}

impl GridDimensions {
	/// Create a new instance of [GridDimensions]. Both axes must be non-zero
	/// and the total number of cells must be addressable by a `u32` index
	/// below the [HOLD_POSITION] sentinel
	pub fn new(width: u32, depth: u32) -> Result<Self, FlowFieldError> {
		if width == 0 || depth == 0 {
			return Err(FlowFieldError::InvalidDimensions { width, depth });
		}
		if width as u64 * depth as u64 >= HOLD_POSITION as u64 {
			return Err(FlowFieldError::AllocationFailure { width, depth });
		}
		Ok(GridDimensions { width, depth })
	}
	pub fn get_width(&self) -> u32 {
		self.width
	}
	pub fn get_depth(&self) -> u32 {
		self.depth
	}
	/// Total number of cells
	pub fn cell_count(&self) -> usize {
		self.width as usize * self.depth as usize
	}
	/// Whether `(x, z)` lies within the grid
	pub fn contains(&self, x: u32, z: u32) -> bool {
		x < self.width && z < self.depth
	}
	/// Get the linear index of `(x, z)`
	pub fn index_of(&self, x: u32, z: u32) -> Result<usize, FlowFieldError> {
		if !self.contains(x, z) {
			return Err(self.out_of_range(x, z));
		}
		Ok(self.index_of_unchecked(x, z))
	}
	/// Get the `(x, z)` coordinates of a linear index
	pub fn coords_of(&self, index: usize) -> Result<(u32, u32), FlowFieldError> {
		if index >= self.cell_count() {
			return Err(FlowFieldError::IndexOutOfRange {
				index,
				len: self.cell_count(),
			});
		}
		Ok(self.coords_of_unchecked(index))
	}
	/// Linear index of `(x, z)` for hot loops where the caller has already
	/// bounds checked
	#[inline]
	pub fn index_of_unchecked(&self, x: u32, z: u32) -> usize {
		debug_assert!(self.contains(x, z));
		z as usize * self.width as usize + x as usize
	}
	/// `(x, z)` of a linear index for hot loops where the caller has already
	/// bounds checked
	#[inline]
	pub fn coords_of_unchecked(&self, index: usize) -> (u32, u32) {
		debug_assert!(index < self.cell_count());
		let width = self.width as usize;
		((index % width) as u32, (index / width) as u32)
	}
	/// Get the index of the cell one step in the direction of `ordinal`, [None] if that steps off the edge of the grid
	#[inline]
	pub fn neighbour(&self, index: usize, ordinal: Ordinal) -> Option<usize> {
		let (x, z) = self.coords_of_unchecked(index);
		let (dx, dz) = ordinal.offset();
		let nx = x.checked_add_signed(dx)?;
		let nz = z.checked_add_signed(dz)?;
		if self.contains(nx, nz) {
			Some(self.index_of_unchecked(nx, nz))
		} else {
			None
		}
	}
	/// Build the [FlowFieldError::OutOfRange] for a coordinate
	fn out_of_range(&self, x: u32, z: u32) -> FlowFieldError {
		FlowFieldError::OutOfRange {
			x,
			z,
			width: self.width,
			depth: self.depth,
		}
	}
}

/// Record of a single grid position. Inputs (walkability, terrain and
/// occupancy) are authored by the map, outputs (costs and the integration
/// value) are overwritten by each computation
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
	/// Whether an actor can stand in this cell
	is_walkable: bool,
	/// Static base weight of the terrain, i.e a slope or marsh may be more
	/// expensive than open ground. `0` is treated as `1`
	terrain: u8,
	/// Dynamic penalty such as congestion or the proximity of a building,
	/// scaled by [FlowFieldSettings::get_occupancy_weight]
	occupancy: u8,
	/// Base traversal cost derived from `terrain`, [BLOCKED_COST] when not walkable
	cost: u16,
	/// Dynamic delta derived from `occupancy`
	d_cost: u16,
	/// Accumulated minimum cost to the destination, [UNREACHABLE] when there is no route
	integration_cost: u32,
	/// Marks the cell as part of the region a partial recomputation refreshes
	is_pathfinding_area: bool,
}

impl Default for Cell {
	fn default() -> Self {
		Cell {
			is_walkable: true,
			terrain: 1,
			occupancy: 0,
			cost: 1,
			d_cost: 0,
			integration_cost: UNREACHABLE,
			is_pathfinding_area: false,
		}
	}
}

impl Cell {
	pub fn is_walkable(&self) -> bool {
		self.is_walkable
	}
	pub fn get_terrain(&self) -> u8 {
		self.terrain
	}
	pub fn get_occupancy(&self) -> u8 {
		self.occupancy
	}
	pub fn get_cost(&self) -> u16 {
		self.cost
	}
	pub fn get_dynamic_cost(&self) -> u16 {
		self.d_cost
	}
	pub fn get_integration_cost(&self) -> u32 {
		self.integration_cost
	}
	pub fn is_pathfinding_area(&self) -> bool {
		self.is_pathfinding_area
	}
	/// Whether propagation found a route from this cell to the destination
	pub fn is_reachable(&self) -> bool {
		self.integration_cost != UNREACHABLE
	}
	/// Combined cost of stepping into this cell
	pub fn get_step_cost(&self) -> u32 {
		self.cost as u32 + self.d_cost as u32
	}
	/// Derive `cost` and `d_cost` from the cell's own inputs
	pub(crate) fn calculate_costs(&mut self, occupancy_weight: u16) {
		if self.is_walkable {
			self.cost = self.terrain.max(1) as u16;
			self.d_cost = (self.occupancy as u16).saturating_mul(occupancy_weight);
		} else {
			self.cost = BLOCKED_COST;
			self.d_cost = 0;
		}
	}
	pub(crate) fn set_integration_cost(&mut self, value: u32) {
		self.integration_cost = value;
	}
	/// Pull the cell into the region of a running partial computation
	pub(crate) fn flag_pathfinding_area(&mut self) {
		self.is_pathfinding_area = true;
	}
}

/// The Grid Store. Holds one [Cell] per position plus the `go_to_index` of
/// every cell written by the flow pass. The `go_to_index` buffer sits
/// alongside the cells rather than inside them so the flow pass can read
/// every cell while writing directions in parallel
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
	/// Extent of the grid
	dimensions: GridDimensions,
	/// Cell records in row-major order
	cells: Vec<Cell>,
	/// Index of the neighbour each cell should move to, [HOLD_POSITION] if it shouldn't move
	go_to: Vec<u32>,
}

impl Grid {
	/// Allocate a [Grid] of walkable cells with a terrain cost of `1`
	pub fn new(dimensions: GridDimensions) -> Result<Self, FlowFieldError> {
		let count = dimensions.cell_count();
		let allocation_failure = || FlowFieldError::AllocationFailure {
			width: dimensions.get_width(),
			depth: dimensions.get_depth(),
		};
		let mut cells = Vec::new();
		cells
			.try_reserve_exact(count)
			.map_err(|_| allocation_failure())?;
		cells.resize(count, Cell::default());
		let mut go_to = Vec::new();
		go_to
			.try_reserve_exact(count)
			.map_err(|_| allocation_failure())?;
		go_to.resize(count, HOLD_POSITION);
		Ok(Grid {
			dimensions,
			cells,
			go_to,
		})
	}
	/// Get the extent of the grid
	pub fn get_dimensions(&self) -> GridDimensions {
		self.dimensions
	}
	/// Get a reference to every cell in row-major order
	pub fn get_cells(&self) -> &[Cell] {
		&self.cells
	}
	/// Get a reference to the `go_to_index` of every cell in row-major order
	pub fn get_go_to_indices(&self) -> &[u32] {
		&self.go_to
	}
	/// Linear index of `(x, z)`
	pub fn index_of(&self, x: u32, z: u32) -> Result<usize, FlowFieldError> {
		self.dimensions.index_of(x, z)
	}
	/// `(x, z)` of a linear index
	pub fn coords_of(&self, index: usize) -> Result<(u32, u32), FlowFieldError> {
		self.dimensions.coords_of(index)
	}
	/// Retrieve the [Cell] at `(x, z)`
	pub fn cell_at(&self, x: u32, z: u32) -> Result<&Cell, FlowFieldError> {
		let index = self.dimensions.index_of(x, z)?;
		Ok(&self.cells[index])
	}
	/// Retrieve the `go_to_index` of `(x, z)`
	pub fn go_to_index_at(&self, x: u32, z: u32) -> Result<u32, FlowFieldError> {
		let index = self.dimensions.index_of(x, z)?;
		Ok(self.go_to[index])
	}
	/// Set whether an actor can stand on `(x, z)`
	pub fn set_walkable(&mut self, x: u32, z: u32, walkable: bool) -> Result<(), FlowFieldError> {
		self.cell_at_mut(x, z)?.is_walkable = walkable;
		Ok(())
	}
	/// Set the static terrain weight of `(x, z)`
	pub fn set_terrain(&mut self, x: u32, z: u32, terrain: u8) -> Result<(), FlowFieldError> {
		self.cell_at_mut(x, z)?.terrain = terrain;
		Ok(())
	}
	/// Set the dynamic occupancy penalty of `(x, z)`
	pub fn set_occupancy(&mut self, x: u32, z: u32, occupancy: u8) -> Result<(), FlowFieldError> {
		self.cell_at_mut(x, z)?.occupancy = occupancy;
		Ok(())
	}
	/// Flag or unflag `(x, z)` as part of the region refreshed by a partial computation
	pub fn set_pathfinding_area(
		&mut self,
		x: u32,
		z: u32,
		is_area: bool,
	) -> Result<(), FlowFieldError> {
		self.cell_at_mut(x, z)?.is_pathfinding_area = is_area;
		Ok(())
	}
	/// Flag every cell within the inclusive rectangle spanned by two corners
	pub fn mark_pathfinding_area(
		&mut self,
		corner_a: GridCell,
		corner_b: GridCell,
	) -> Result<(), FlowFieldError> {
		// validate both corners before flagging anything
		self.dimensions.index_of(corner_a.get_x(), corner_a.get_z())?;
		self.dimensions.index_of(corner_b.get_x(), corner_b.get_z())?;
		let (x_min, x_max) = min_max(corner_a.get_x(), corner_b.get_x());
		let (z_min, z_max) = min_max(corner_a.get_z(), corner_b.get_z());
		for z in z_min..=z_max {
			for x in x_min..=x_max {
				let index = self.dimensions.index_of_unchecked(x, z);
				self.cells[index].is_pathfinding_area = true;
			}
		}
		Ok(())
	}
	/// Unflag every cell of the partial computation region
	pub fn clear_pathfinding_area(&mut self) {
		for cell in self.cells.iter_mut() {
			cell.is_pathfinding_area = false;
		}
	}
	/// Number of cells flagged for partial computation
	pub fn pathfinding_area_count(&self) -> usize {
		self.cells.iter().filter(|c| c.is_pathfinding_area).count()
	}
	/// Mutable access to a single cell
	fn cell_at_mut(&mut self, x: u32, z: u32) -> Result<&mut Cell, FlowFieldError> {
		let index = self.dimensions.index_of(x, z)?;
		Ok(&mut self.cells[index])
	}
	/// Mutable access to the cell buffer for the passes
	pub(crate) fn cells_mut(&mut self) -> &mut Vec<Cell> {
		&mut self.cells
	}
	/// Split the grid so the flow pass can read the cells while writing the
	/// `go_to_index` buffer
	pub(crate) fn split_for_flow(&mut self) -> (GridDimensions, &[Cell], &mut Vec<u32>) {
		(self.dimensions, &self.cells, &mut self.go_to)
	}
	/// Check that a deserialized grid has buffers matching its dimensions and
	/// that every `go_to_index` holds or names a neighbour
	#[cfg(feature = "ron")]
	pub(crate) fn validate_shape(&self) -> Result<(), FlowFieldError> {
		let expected = self.dimensions.cell_count();
		if self.cells.len() != expected {
			return Err(FlowFieldError::ShapeMismatch {
				expected,
				found: self.cells.len(),
			});
		}
		if self.go_to.len() != expected {
			return Err(FlowFieldError::ShapeMismatch {
				expected,
				found: self.go_to.len(),
			});
		}
		for (index, go_to) in self.go_to.iter().enumerate() {
			if *go_to == HOLD_POSITION {
				continue;
			}
			let is_adjacent = Ordinal::ALL
				.iter()
				.any(|ordinal| self.dimensions.neighbour(index, *ordinal) == Some(*go_to as usize));
			if !is_adjacent {
				let (x, z) = self.dimensions.coords_of_unchecked(index);
				return Err(FlowFieldError::InvalidFlow { x, z, go_to: *go_to });
			}
		}
		Ok(())
	}
}

/// Order two values
fn min_max(a: u32, b: u32) -> (u32, u32) {
	if a <= b {
		(a, b)
	} else {
		(b, a)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn index_round_trip() {
		let dimensions = GridDimensions::new(7, 3).unwrap();
		for z in 0..3 {
			for x in 0..7 {
				let index = dimensions.index_of(x, z).unwrap();
				assert_eq!((x, z), dimensions.coords_of(index).unwrap());
			}
		}
	}
	#[test]
	fn index_is_row_major() {
		let dimensions = GridDimensions::new(4, 3).unwrap();
		assert_eq!(9, dimensions.index_of(1, 2).unwrap());
	}
	#[test]
	fn out_of_range_is_not_clamped() {
		let grid = Grid::new(GridDimensions::new(4, 4).unwrap()).unwrap();
		let result = grid.cell_at(4, 0);
		assert!(matches!(
			result,
			Err(FlowFieldError::OutOfRange { x: 4, z: 0, .. })
		));
		let result = grid.coords_of(16);
		assert!(matches!(
			result,
			Err(FlowFieldError::IndexOutOfRange { index: 16, len: 16 })
		));
	}
	#[test]
	fn zero_dimensions_rejected() {
		let result = GridDimensions::new(0, 10);
		assert!(matches!(
			result,
			Err(FlowFieldError::InvalidDimensions { .. })
		));
	}
	#[test]
	fn oversized_dimensions_rejected() {
		let result = GridDimensions::new(u32::MAX, 2);
		assert!(matches!(
			result,
			Err(FlowFieldError::AllocationFailure { .. })
		));
	}
	#[test]
	fn neighbours_stop_at_edges() {
		let dimensions = GridDimensions::new(3, 3).unwrap();
		let corner = dimensions.index_of(0, 0).unwrap();
		assert_eq!(None, dimensions.neighbour(corner, Ordinal::North));
		assert_eq!(None, dimensions.neighbour(corner, Ordinal::West));
		assert_eq!(None, dimensions.neighbour(corner, Ordinal::NorthEast));
		assert_eq!(Some(1), dimensions.neighbour(corner, Ordinal::East));
		assert_eq!(Some(4), dimensions.neighbour(corner, Ordinal::SouthEast));
		let far = dimensions.index_of(2, 1).unwrap();
		assert_eq!(None, dimensions.neighbour(far, Ordinal::East));
	}
	#[test]
	fn mark_area_with_swapped_corners() {
		let mut grid = Grid::new(GridDimensions::new(5, 5).unwrap()).unwrap();
		grid.mark_pathfinding_area(GridCell::new(3, 3), GridCell::new(1, 2))
			.unwrap();
		assert_eq!(6, grid.pathfinding_area_count());
		assert!(grid.cell_at(2, 3).unwrap().is_pathfinding_area());
		assert!(!grid.cell_at(0, 0).unwrap().is_pathfinding_area());
		grid.clear_pathfinding_area();
		assert_eq!(0, grid.pathfinding_area_count());
	}
	#[test]
	fn mark_area_out_of_range_leaves_grid_untouched() {
		let mut grid = Grid::new(GridDimensions::new(5, 5).unwrap()).unwrap();
		let result = grid.mark_pathfinding_area(GridCell::new(0, 0), GridCell::new(5, 1));
		assert!(result.is_err());
		assert_eq!(0, grid.pathfinding_area_count());
	}
	#[test]
	fn blocked_cell_costs() {
		let mut cell = Cell::default();
		cell.is_walkable = false;
		cell.calculate_costs(3);
		assert_eq!(BLOCKED_COST, cell.get_cost());
		assert_eq!(0, cell.get_dynamic_cost());
	}
	#[test]
	fn occupancy_becomes_dynamic_cost() {
		let mut cell = Cell::default();
		cell.terrain = 0;
		cell.occupancy = 4;
		cell.calculate_costs(3);
		assert_eq!(1, cell.get_cost());
		assert_eq!(12, cell.get_dynamic_cost());
		assert_eq!(13, cell.get_step_cost());
	}
	#[cfg(feature = "ron")]
	#[test]
	fn validate_shape_rejects_distant_go_to() {
		let mut grid = Grid::new(GridDimensions::new(4, 4).unwrap()).unwrap();
		// (0, 0) pointing east and (3, 3) pointing north west are fine
		grid.go_to[0] = 1;
		grid.go_to[15] = 10;
		assert!(grid.validate_shape().is_ok());
		// (0, 1) pointing at (3, 0) wraps around the row
		grid.go_to[4] = 3;
		assert!(matches!(
			grid.validate_shape(),
			Err(FlowFieldError::InvalidFlow { x: 0, z: 1, go_to: 3 })
		));
		grid.go_to[4] = 99;
		assert!(grid.validate_shape().is_err());
	}
}
