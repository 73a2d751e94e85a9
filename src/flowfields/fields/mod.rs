//! The three passes of the algorithm. Each is a stateless function operating
//! over a borrowed [Grid] and each consumes what the previous pass wrote:
//!
//! 1. [cost_field::build_costs] - per cell traversal costs (parallel)
//! 2. [integration_field::propagate] - cost-to-destination flood fill (single threaded)
//! 3. [flow_field::derive_flow] - per cell cheapest neighbour (parallel)
//!

pub mod cost_field;
pub mod flow_field;
pub mod integration_field;

use bevy::tasks::{ComputeTaskPool, TaskPool};

use crate::prelude::*;

/// Whether a computation refreshes every cell or only the flagged region
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ComputeMode {
	/// Recompute every cell of the grid
	#[default]
	FullGrid,
	/// Recompute cells flagged as part of the pathfinding area, used when
	/// only a local region of the map has changed. The integration pass
	/// flags further cells whose route the changes alter
	Partial,
}

impl ComputeMode {
	/// Whether a cell takes part in a pass of this mode
	#[inline]
	pub fn includes(&self, cell: &Cell) -> bool {
		match self {
			ComputeMode::FullGrid => true,
			ComputeMode::Partial => cell.is_pathfinding_area(),
		}
	}
}

/// The bounded worker pool the per-cell passes are dispatched onto
pub(crate) fn compute_pool() -> &'static TaskPool {
	ComputeTaskPool::get_or_init(TaskPool::default)
}

/// Get the neighbour of `index` in the direction of `ordinal` if an actor
/// could step into it: it must be on the grid, walkable and, for a diagonal,
/// not wedged between two non-walkable orthogonal cells
#[inline]
pub(crate) fn passable_neighbour(
	dimensions: &GridDimensions,
	cells: &[Cell],
	index: usize,
	ordinal: Ordinal,
) -> Option<usize> {
	let neighbour = dimensions.neighbour(index, ordinal)?;
	if !cells[neighbour].is_walkable() {
		return None;
	}
	if let Some((a, b)) = ordinal.flanks() {
		// find any diagonal cells which are flanked by impassable cells and so
		// movement between them should be ignored/blocked, i.e
		//   X n <- ignore diagonal from o
		//   o X
		let is_open = |flank: Ordinal| {
			dimensions
				.neighbour(index, flank)
				.is_some_and(|i| cells[i].is_walkable())
		};
		if !is_open(a) && !is_open(b) {
			return None;
		}
	}
	Some(neighbour)
}

/// The cost of stepping into `cell` in the direction of `ordinal`, diagonals are scaled by the settings' diagonal weight and rounded up
#[inline]
pub(crate) fn step_cost(cell: &Cell, ordinal: Ordinal, settings: &FlowFieldSettings) -> u64 {
	let base = cell.get_step_cost() as u64;
	if ordinal.is_diagonal() {
		let weight = settings.get_diagonal_weight() as u64;
		(base * weight).div_ceil(100)
	} else {
		base
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn diagonal_squeeze_refused() {
		//  _______
		// |o_|X_|__|
		// |X_|n_|__|
		let mut grid = Grid::new(GridDimensions::new(3, 2).unwrap()).unwrap();
		grid.set_walkable(1, 0, false).unwrap();
		grid.set_walkable(0, 1, false).unwrap();
		let dimensions = grid.get_dimensions();
		let result = passable_neighbour(&dimensions, grid.get_cells(), 0, Ordinal::SouthEast);
		assert_eq!(None, result);
	}
	#[test]
	fn diagonal_past_single_corner_allowed() {
		let mut grid = Grid::new(GridDimensions::new(3, 2).unwrap()).unwrap();
		grid.set_walkable(1, 0, false).unwrap();
		let dimensions = grid.get_dimensions();
		let result = passable_neighbour(&dimensions, grid.get_cells(), 0, Ordinal::SouthEast);
		assert_eq!(Some(4), result);
	}
	#[test]
	fn diagonal_weight_rounds_up() {
		let settings = FlowFieldSettings::default().with_diagonal_weight(141);
		let cell = Cell::default();
		assert_eq!(2, step_cost(&cell, Ordinal::NorthEast, &settings));
		assert_eq!(1, step_cost(&cell, Ordinal::North, &settings));
	}
	#[test]
	fn partial_mode_only_includes_flagged() {
		let mut grid = Grid::new(GridDimensions::new(2, 1).unwrap()).unwrap();
		grid.set_pathfinding_area(1, 0, true).unwrap();
		let cells = grid.get_cells();
		assert!(!ComputeMode::Partial.includes(&cells[0]));
		assert!(ComputeMode::Partial.includes(&cells[1]));
		assert!(ComputeMode::FullGrid.includes(&cells[0]));
	}
}
