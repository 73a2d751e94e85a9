//! The cost pass turns the authored inputs of each [Cell] into the values
//! used as edge weights by the integration pass. A walkable cell gets a
//! `cost` of its terrain weight (minimum `1`) and a `d_cost` of its dynamic
//! occupancy scaled by the settings. A non-walkable cell gets
//! [BLOCKED_COST] and is never stepped into.
//!
//! An example of terrain inputs and the resulting `cost` (`X` being
//! non-walkable, shown as the blocked cost):
//!
//! ```text
//!  ___________________________          ___________________________________
//! |     |     |     |     |     |      |     |       |       |     |     |
//! |  1  |  1  |  X  |  1  |  1  |      |  1  | 65535 | 65535 |  1  |  1  |
//! |_____|_____|_____|_____|_____|  ->  |_____|_______|_______|_____|_____|
//! |     |     |     |     |     |      |     |       |       |     |     |
//! |  0  |  X  |  1  | 56  |  1  |      |  1  | 65535 |   1   | 56  |  1  |
//! |_____|_____|_____|_____|_____|      |_____|_______|_______|_____|_____|
//! ```
//!
//! No cell depends on another so the buffer is split into chunks which are
//! processed on the compute task pool.
//!

use bevy::tasks::ParallelSliceMut;

use super::compute_pool;
use crate::prelude::*;

/// Recalculate `cost` and `d_cost` of every cell in scope of `mode`. Cells
/// outside of scope keep their previous values
pub fn build_costs(grid: &mut Grid, mode: ComputeMode, settings: &FlowFieldSettings) {
	let occupancy_weight = settings.get_occupancy_weight();
	grid.cells_mut().par_chunk_map_mut(
		compute_pool(),
		settings.get_chunk_size(),
		|_chunk_index, chunk| {
			for cell in chunk.iter_mut() {
				if mode.includes(cell) {
					cell.calculate_costs(occupancy_weight);
				}
			}
		},
	);
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn blocked_and_weighted_costs() {
		let mut grid = Grid::from_cost_matrix(&[vec![1, 255, 3], vec![0, 1, 1]]).unwrap();
		grid.set_occupancy(2, 1, 5).unwrap();
		let settings = FlowFieldSettings::default().with_occupancy_weight(2);
		build_costs(&mut grid, ComputeMode::FullGrid, &settings);
		let costs: Vec<u16> = grid.get_cells().iter().map(|c| c.get_cost()).collect();
		assert_eq!(vec![1, BLOCKED_COST, 3, 1, 1, 1], costs);
		assert_eq!(10, grid.cell_at(2, 1).unwrap().get_dynamic_cost());
	}
	#[test]
	fn partial_only_touches_flagged_cells() {
		let mut grid = Grid::new(GridDimensions::new(3, 1).unwrap()).unwrap();
		let settings = FlowFieldSettings::default();
		build_costs(&mut grid, ComputeMode::FullGrid, &settings);
		grid.set_terrain(0, 0, 9).unwrap();
		grid.set_terrain(2, 0, 9).unwrap();
		grid.set_pathfinding_area(2, 0, true).unwrap();
		build_costs(&mut grid, ComputeMode::Partial, &settings);
		assert_eq!(1, grid.cell_at(0, 0).unwrap().get_cost());
		assert_eq!(9, grid.cell_at(2, 0).unwrap().get_cost());
	}
	#[test]
	fn small_chunks_cover_every_cell() {
		let mut grid = Grid::new(GridDimensions::new(7, 5).unwrap()).unwrap();
		for x in 0..7 {
			grid.set_terrain(x, 4, 4).unwrap();
		}
		let settings = FlowFieldSettings::default().with_chunk_size(3);
		build_costs(&mut grid, ComputeMode::FullGrid, &settings);
		let expensive = grid.get_cells().iter().filter(|c| c.get_cost() == 4).count();
		assert_eq!(7, expensive);
	}
}
