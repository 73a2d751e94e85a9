//! The flow pass reads a completed integration field and, for every cell,
//! records the index of the neighbour an actor should step into next. A
//! steering pipeline/character controller samples the [FlowField] at the
//! cell an actor occupies and turns the resulting [FlowDirection] into
//! movement.
//!
//! Each cell scans its valid neighbours in the fixed order N, E, S, W, NE,
//! SE, SW, NW and picks the one with the strictly lowest integration cost,
//! the first found winning a tie. When no neighbour is cheaper than the cell
//! itself (the destination, or a cell with no route) the cell stores
//! [HOLD_POSITION]:
//!
//! ```text
//!  _______________________________
//! |     |     |     |     |     |
//! |  →  |  →  |  ↓  |  ↓  |  ↓  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  →  |  →  |  ↓  |  ↓  |  ↓  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  →  |  →  |  •  |  ←  |  ←  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  ↑  |  ↑  |  ↑  |  ↑  |  ↑  |
//! |_____|_____|_____|_____|_____|
//! ```
//!
//! Cells only read the integration field so the `go_to_index` buffer is
//! split into chunks processed on the compute task pool.
//!

use bevy::tasks::ParallelSliceMut;

use super::{compute_pool, passable_neighbour};
use crate::prelude::*;

/// What an actor standing in a cell should do
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowDirection {
	/// Step into the neighbouring cell in this direction
	Move(Ordinal),
	/// Stay put, either the destination has been reached or there is no route
	HoldPosition,
}

/// Recalculate the `go_to_index` of every cell in scope of `mode`.
///
/// In [ComputeMode::Partial] the scope is the flagged region plus the cells
/// bordering it, as the choice of a bordering cell depends on values within
/// the region
pub fn derive_flow(grid: &mut Grid, mode: ComputeMode, settings: &FlowFieldSettings) {
	let chunk_size = settings.get_chunk_size();
	let ordinals = settings.get_connectivity().ordinals();
	let (dimensions, cells, go_to) = grid.split_for_flow();
	go_to.par_chunk_map_mut(compute_pool(), chunk_size, |chunk_index, chunk| {
		let offset = chunk_index * chunk_size;
		for (i, slot) in chunk.iter_mut().enumerate() {
			let index = offset + i;
			if mode == ComputeMode::Partial && !borders_area(&dimensions, cells, index) {
				continue;
			}
			*slot = cheapest_neighbour(&dimensions, cells, index, ordinals);
		}
	});
}

/// Whether a cell is flagged or touches a flagged cell
fn borders_area(dimensions: &GridDimensions, cells: &[Cell], index: usize) -> bool {
	cells[index].is_pathfinding_area()
		|| Ordinal::ALL.iter().any(|ordinal| {
			dimensions
				.neighbour(index, *ordinal)
				.is_some_and(|n| cells[n].is_pathfinding_area())
		})
}

/// Find the index of the neighbour with a strictly lower integration cost
/// than the cell at `index`, [HOLD_POSITION] if there isn't one
fn cheapest_neighbour(
	dimensions: &GridDimensions,
	cells: &[Cell],
	index: usize,
	ordinals: &[Ordinal],
) -> u32 {
	let current = &cells[index];
	if !current.is_walkable() || !current.is_reachable() {
		return HOLD_POSITION;
	}
	let mut cheapest_value = current.get_integration_cost();
	let mut cheapest_neighbour = HOLD_POSITION;
	for ordinal in ordinals {
		if let Some(n) = passable_neighbour(dimensions, cells, index, *ordinal) {
			let neighbour_cost = cells[n].get_integration_cost();
			if neighbour_cost < cheapest_value {
				cheapest_value = neighbour_cost;
				cheapest_neighbour = n as u32;
			}
		}
	}
	cheapest_neighbour
}

/// A read-only view of a published computation. It borrows the grid it was
/// computed over so the values cannot change while it is held
#[derive(Clone, Copy, Debug)]
pub struct FlowField<'a> {
	/// Grid holding the computed fields
	grid: &'a Grid,
	/// Cell every route leads to
	destination: GridCell,
}

impl<'a> FlowField<'a> {
	/// Create a view of `grid` once all passes have completed
	pub(crate) fn new(grid: &'a Grid, destination: GridCell) -> Self {
		FlowField { grid, destination }
	}
	/// Get the destination the field routes towards
	pub fn get_destination(&self) -> GridCell {
		self.destination
	}
	/// Get the extent of the field
	pub fn get_dimensions(&self) -> GridDimensions {
		self.grid.get_dimensions()
	}
	/// Get the grid the field was computed over
	pub fn get_grid(&self) -> &'a Grid {
		self.grid
	}
	/// Get the `go_to_index` of every cell in row-major order
	pub fn get_go_to_indices(&self) -> &'a [u32] {
		self.grid.get_go_to_indices()
	}
	/// Get the index of the cell an actor at `(x, z)` should move to, [HOLD_POSITION] if it shouldn't move
	pub fn go_to_index_at(&self, x: u32, z: u32) -> Result<u32, FlowFieldError> {
		self.grid.go_to_index_at(x, z)
	}
	/// Get the accumulated cost of reaching the destination from `(x, z)`, [UNREACHABLE] if it can't
	pub fn integration_cost_at(&self, x: u32, z: u32) -> Result<u32, FlowFieldError> {
		Ok(self.grid.cell_at(x, z)?.get_integration_cost())
	}
	/// Whether an actor at `(x, z)` has a route to the destination
	pub fn is_reachable(&self, x: u32, z: u32) -> Result<bool, FlowFieldError> {
		Ok(self.grid.cell_at(x, z)?.is_reachable())
	}
	/// Get the direction an actor at `(x, z)` should move in
	pub fn direction_at(&self, x: u32, z: u32) -> Result<FlowDirection, FlowFieldError> {
		let go_to = self.grid.go_to_index_at(x, z)?;
		if go_to == HOLD_POSITION {
			return Ok(FlowDirection::HoldPosition);
		}
		let invalid = || FlowFieldError::InvalidFlow { x, z, go_to };
		let target = self.grid.coords_of(go_to as usize).map_err(|_| invalid())?;
		Ordinal::cell_to_cell_direction(target, (x, z))
			.map(FlowDirection::Move)
			.ok_or_else(invalid)
	}
}
