//! The integration pass uses the costs of the grid to produce a cumulative
//! cost of reaching the destination from every cell.
//!
//! Every in-scope cell is reset to [UNREACHABLE] and the destination is set
//! to `0`. A wavefront then expands from the destination:
//!
//! 1. Pop a cell from the front of a FIFO work queue
//! 2. Find its in-bounds, walkable neighbours (4 or 8 depending on [Connectivity])
//! 3. Add the cost of stepping into each neighbour to the current cell's integration cost
//! 4. When that is lower than the neighbour's current value store it and push the neighbour onto the queue
//!
//! This produces a diamond-like pattern as the wave expands over uniform
//! costs of `1` with 4-way connectivity:
//!
//! ```text
//!  _____________________________
//! |     |     |     |     |     |
//! |  4  |  3  |  2  |  3  |  4  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  3  |  2  |  1  |  2  |  3  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  2  |  1  |  0  |  1  |  2  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  3  |  2  |  1  |  2  |  3  |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! |  4  |  3  |  2  |  3  |  4  |
//! |_____|_____|_____|_____|_____|
//! ```
//!
//! Non-walkable cells are never entered so the wave flows around them and
//! cells cut off from the destination keep [UNREACHABLE].
//!
//! A cell may be enqueued more than once when a cheaper route reaches it
//! later, the wave only settles once no value can be improved so the result
//! is the true minimum. On maps where costs vary a lot that can mean many
//! revisits, [Propagation::PriorityQueue] instead settles each cell once by
//! always expanding the cheapest cell first.
//!
//! In [ComputeMode::Partial] the previous values are reused and only what the
//! edits invalidate is recomputed:
//!
//! 1. Raise: an unflagged cell next to the region keeps its value only while
//! some neighbour outside the region still accounts for it (neighbour value
//! plus step cost equals its own). Cells losing that support are flagged and
//! their neighbours checked in turn, cheapest first, so a wall dropped on a
//! route pulls in every cell that routed through it
//! 2. Flagged cells are reset to [UNREACHABLE] and the wave is seeded from the
//! destination (if flagged) and from every finite cell bordering the region
//! 3. Lower: relaxation may also improve cells outside the region, e.g. when
//! an edit opens a shortcut. Every improved cell is flagged so the flow pass
//! revisits it and its neighbours
//!
//! ```text
//!  terrain of (2, 0) raised to 10, destination (0, 0)
//!
//!  before                      after
//!  ___________________         ___________________
//! |   |   |   |   |   |       |   |   |   |   |   |
//! | 0 | 1 | 2 | 3 | 4 |       | 0 | 1 | 11| 12| 13|
//! |___|___|___|___|___|       |___|___|___|___|___|
//!           ^   ^   ^
//!     flagged   raised
//! ```
//!
//! The result is identical to a [ComputeMode::FullGrid] run as long as the
//! previous values were computed for the same destination.
//!

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use super::{passable_neighbour, step_cost};
use crate::prelude::*;
use bevy::prelude::*;

/// Compute the integration cost of every in-scope cell towards
/// `destination`. A non-walkable destination leaves every in-scope cell
/// [UNREACHABLE]
pub fn propagate(
	grid: &mut Grid,
	destination: GridCell,
	mode: ComputeMode,
	settings: &FlowFieldSettings,
) -> Result<(), FlowFieldError> {
	let dimensions = grid.get_dimensions();
	let destination_index = dimensions.index_of(destination.get_x(), destination.get_z())?;
	let ordinals = settings.get_connectivity().ordinals();
	let cells = grid.cells_mut();

	if mode == ComputeMode::Partial {
		let raised = raise_dependants(&dimensions, cells, destination_index, settings);
		if raised > 0 {
			debug!("Partial integration widened by {} dependent cells", raised);
		}
	}
	for cell in cells.iter_mut() {
		if mode.includes(cell) {
			cell.set_integration_cost(UNREACHABLE);
		}
	}
	// further cells to process paired with the value they were queued with
	let mut seeds: Vec<(usize, u32)> = Vec::new();
	let goal = &mut cells[destination_index];
	if mode.includes(goal) && goal.is_walkable() {
		goal.set_integration_cost(0);
		seeds.push((destination_index, 0));
	}
	if mode == ComputeMode::Partial {
		seeds.extend(region_boundary(&dimensions, cells, ordinals));
	}

	match settings.get_propagation() {
		Propagation::WorkQueue => {
			let mut queue: VecDeque<usize> = seeds.iter().map(|(i, _)| *i).collect();
			while let Some(current) = queue.pop_front() {
				relax_neighbours(&dimensions, cells, current, mode, settings, |n, _| {
					queue.push_back(n)
				})?;
			}
		}
		Propagation::PriorityQueue => {
			let mut heap: BinaryHeap<Reverse<(u32, usize)>> =
				seeds.iter().map(|(i, v)| Reverse((*v, *i))).collect();
			while let Some(Reverse((cost, current))) = heap.pop() {
				// skip stale entries superseded by a cheaper route
				if cost != cells[current].get_integration_cost() {
					continue;
				}
				relax_neighbours(&dimensions, cells, current, mode, settings, |n, v| {
					heap.push(Reverse((v, n)))
				})?;
			}
		}
	}
	Ok(())
}

/// Try to lower the integration cost of each neighbour of `current` and
/// hand every improved neighbour to `enqueue`. In [ComputeMode::Partial]
/// an improved neighbour outside the region is flagged
fn relax_neighbours(
	dimensions: &GridDimensions,
	cells: &mut [Cell],
	current: usize,
	mode: ComputeMode,
	settings: &FlowFieldSettings,
	mut enqueue: impl FnMut(usize, u32),
) -> Result<(), FlowFieldError> {
	let current_cost = cells[current].get_integration_cost() as u64;
	for ordinal in settings.get_connectivity().ordinals() {
		let Some(n) = passable_neighbour(dimensions, cells, current, *ordinal) else {
			continue;
		};
		let candidate = current_cost + step_cost(&cells[n], *ordinal, settings);
		if candidate >= UNREACHABLE as u64 {
			let (x, z) = dimensions.coords_of_unchecked(n);
			return Err(FlowFieldError::IntegrationOverflow { x, z });
		}
		let candidate = candidate as u32;
		// don't overwrite a cell with a worse cost
		if candidate < cells[n].get_integration_cost() {
			cells[n].set_integration_cost(candidate);
			if mode == ComputeMode::Partial {
				cells[n].flag_pathfinding_area();
			}
			enqueue(n, candidate);
		}
	}
	Ok(())
}

/// Flag every unflagged cell whose previous value can no longer be reached
/// without passing through the flagged region, returning how many were added.
///
/// Candidates are checked in ascending order of their previous value. A
/// supporting neighbour always holds a strictly lower value so its own
/// status is settled by the time a candidate is checked
fn raise_dependants(
	dimensions: &GridDimensions,
	cells: &mut [Cell],
	destination_index: usize,
	settings: &FlowFieldSettings,
) -> usize {
	let ordinals = settings.get_connectivity().ordinals();
	let mut is_checked = vec![false; cells.len()];
	let mut candidates: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::new();
	for (index, cell) in cells.iter().enumerate() {
		if cell.is_pathfinding_area() {
			push_outside_neighbours(dimensions, cells, index, ordinals, &mut candidates);
		}
	}
	let mut raised = 0;
	while let Some(Reverse((_, current))) = candidates.pop() {
		if is_checked[current] || cells[current].is_pathfinding_area() {
			continue;
		}
		is_checked[current] = true;
		if current == destination_index || is_supported(dimensions, cells, current, settings) {
			continue;
		}
		cells[current].flag_pathfinding_area();
		raised += 1;
		push_outside_neighbours(dimensions, cells, current, ordinals, &mut candidates);
	}
	raised
}

/// Queue the unflagged reachable neighbours of `index` keyed by their value
fn push_outside_neighbours(
	dimensions: &GridDimensions,
	cells: &[Cell],
	index: usize,
	ordinals: &[Ordinal],
	candidates: &mut BinaryHeap<Reverse<(u32, usize)>>,
) {
	for ordinal in ordinals {
		if let Some(n) = dimensions.neighbour(index, *ordinal) {
			let neighbour = &cells[n];
			if !neighbour.is_pathfinding_area() && neighbour.is_reachable() {
				candidates.push(Reverse((neighbour.get_integration_cost(), n)));
			}
		}
	}
}

/// Whether an unflagged neighbour of `index` still accounts for its value
fn is_supported(
	dimensions: &GridDimensions,
	cells: &[Cell],
	index: usize,
	settings: &FlowFieldSettings,
) -> bool {
	let value = cells[index].get_integration_cost() as u64;
	settings.get_connectivity().ordinals().iter().any(|ordinal| {
		// passability is symmetric so stepping from `index` tells whether the
		// neighbour could step in
		let Some(n) = passable_neighbour(dimensions, cells, index, *ordinal) else {
			return false;
		};
		let neighbour = &cells[n];
		!neighbour.is_pathfinding_area()
			&& neighbour.is_reachable()
			&& neighbour.get_integration_cost() as u64 + step_cost(&cells[index], *ordinal, settings)
				== value
	})
}

/// Find every unflagged cell with a finite value next to the flagged region,
/// these carry the previous computation's costs into the region
fn region_boundary(
	dimensions: &GridDimensions,
	cells: &[Cell],
	ordinals: &[Ordinal],
) -> Vec<(usize, u32)> {
	let mut boundary = Vec::new();
	let mut is_seeded = vec![false; cells.len()];
	for (index, cell) in cells.iter().enumerate() {
		if !cell.is_pathfinding_area() {
			continue;
		}
		for ordinal in ordinals {
			if let Some(n) = passable_neighbour(dimensions, cells, index, *ordinal) {
				let neighbour = &cells[n];
				if !neighbour.is_pathfinding_area() && neighbour.is_reachable() && !is_seeded[n] {
					is_seeded[n] = true;
					boundary.push((n, neighbour.get_integration_cost()));
				}
			}
		}
	}
	boundary
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;

	/// Run the cost pass then the integration pass and collect the values
	fn integrate(grid: &mut Grid, destination: GridCell, settings: &FlowFieldSettings) -> Vec<u32> {
		build_costs(grid, ComputeMode::FullGrid, settings);
		propagate(grid, destination, ComputeMode::FullGrid, settings).unwrap();
		grid.get_cells().iter().map(|c| c.get_integration_cost()).collect()
	}

	/// Calculate integration field from a uniform cost field with a destination in the centre
	#[test]
	fn basic_field() {
		let mut grid = Grid::new(GridDimensions::new(5, 5).unwrap()).unwrap();
		let result = integrate(&mut grid, GridCell::new(2, 2), &FlowFieldSettings::default());
		let actual: Vec<u32> = vec![
			4,3,2,3,4,
			3,2,1,2,3,
			2,1,0,1,2,
			3,2,1,2,3,
			4,3,2,3,4,
		];
		assert_eq!(actual, result);
	}
	/// With 8-way movement and uniform diagonal weight the values are Chebyshev distances
	#[test]
	fn basic_field_eight_way() {
		let mut grid = Grid::new(GridDimensions::new(5, 5).unwrap()).unwrap();
		let settings = FlowFieldSettings::default().with_connectivity(Connectivity::Eight);
		let result = integrate(&mut grid, GridCell::new(2, 2), &settings);
		let actual: Vec<u32> = vec![
			2,2,2,2,2,
			2,1,1,1,2,
			2,1,0,1,2,
			2,1,1,1,2,
			2,2,2,2,2,
		];
		assert_eq!(actual, result);
	}
	/// Calculate integration field around impassable cells and an expensive cell
	#[test]
	fn complex_field() {
		let mut grid = Grid::from_cost_matrix(&[
			vec![1,   1,   1, 1, 1],
			vec![1, 255, 255, 1, 1],
			vec![1,   1,   1, 9, 1],
			vec![1, 255,   1, 1, 1],
			vec![1, 255,   1, 1, 1],
		]).unwrap();
		let result = integrate(&mut grid, GridCell::new(0, 4), &FlowFieldSettings::default());
		let x = UNREACHABLE;
		let actual: Vec<u32> = vec![
			4,5,6,7,8,
			3,x,x,8,9,
			2,3,4,13,8,
			1,x,5,6,7,
			0,x,6,7,8,
		];
		assert_eq!(actual, result);
	}
	/// A closed ring around the destination cuts every other cell off
	#[test]
	fn enclosed_destination() {
		let mut grid = Grid::from_cost_matrix(&[
			vec![1,   1,   1,   1, 1],
			vec![1, 255, 255, 255, 1],
			vec![1, 255,   1, 255, 1],
			vec![1, 255, 255, 255, 1],
			vec![1,   1,   1,   1, 1],
		]).unwrap();
		let settings = FlowFieldSettings::default().with_connectivity(Connectivity::Eight);
		let result = integrate(&mut grid, GridCell::new(2, 2), &settings);
		for (i, value) in result.iter().enumerate() {
			if i == 12 {
				assert_eq!(0, *value);
			} else {
				assert_eq!(UNREACHABLE, *value);
			}
		}
	}
	#[test]
	fn blocked_destination_is_all_unreachable() {
		let mut grid = Grid::from_cost_matrix(&[vec![1, 255, 1]]).unwrap();
		let result = integrate(&mut grid, GridCell::new(1, 0), &FlowFieldSettings::default());
		assert!(result.iter().all(|v| *v == UNREACHABLE));
	}
	#[test]
	fn destination_out_of_range() {
		let mut grid = Grid::new(GridDimensions::new(3, 3).unwrap()).unwrap();
		let settings = FlowFieldSettings::default();
		let result = propagate(&mut grid, GridCell::new(3, 0), ComputeMode::FullGrid, &settings);
		assert!(matches!(result, Err(FlowFieldError::OutOfRange { .. })));
	}
	#[test]
	fn priority_queue_matches_work_queue() {
		let rows = vec![
			vec![1, 200,  1,  1, 1, 1],
			vec![1, 200, 30,  1, 255, 1],
			vec![1,   1, 30, 90, 255, 1],
			vec![50, 255, 1,  1,  1, 1],
		];
		let fifo = FlowFieldSettings::default().with_connectivity(Connectivity::Eight).with_diagonal_weight(141);
		let heap = fifo.with_propagation(Propagation::PriorityQueue);
		let a = integrate(&mut Grid::from_cost_matrix(&rows).unwrap(), GridCell::new(5, 0), &fifo);
		let b = integrate(&mut Grid::from_cost_matrix(&rows).unwrap(), GridCell::new(5, 0), &heap);
		assert_eq!(a, b);
	}
	#[test]
	fn partial_seeds_from_region_edge() {
		// full run over a corridor, then raise the cost of the far end and refresh only that end
		let settings = FlowFieldSettings::default();
		let mut grid = Grid::new(GridDimensions::new(6, 1).unwrap()).unwrap();
		integrate(&mut grid, GridCell::new(0, 0), &settings);
		grid.set_terrain(4, 0, 5).unwrap();
		grid.mark_pathfinding_area(GridCell::new(4, 0), GridCell::new(5, 0)).unwrap();
		build_costs(&mut grid, ComputeMode::Partial, &settings);
		propagate(&mut grid, GridCell::new(0, 0), ComputeMode::Partial, &settings).unwrap();
		let result: Vec<u32> = grid.get_cells().iter().map(|c| c.get_integration_cost()).collect();
		assert_eq!(vec![0, 1, 2, 3, 8, 9], result);
	}
	#[test]
	fn partial_raises_cells_routed_through_region() {
		// a costly cell dropped on the only route drags every cell behind it along
		let settings = FlowFieldSettings::default();
		let mut grid = Grid::new(GridDimensions::new(5, 1).unwrap()).unwrap();
		integrate(&mut grid, GridCell::new(0, 0), &settings);
		grid.set_terrain(2, 0, 10).unwrap();
		grid.set_pathfinding_area(2, 0, true).unwrap();
		build_costs(&mut grid, ComputeMode::Partial, &settings);
		propagate(&mut grid, GridCell::new(0, 0), ComputeMode::Partial, &settings).unwrap();
		let result: Vec<u32> = grid.get_cells().iter().map(|c| c.get_integration_cost()).collect();
		assert_eq!(vec![0, 1, 11, 12, 13], result);
		let flagged: Vec<bool> = grid.get_cells().iter().map(|c| c.is_pathfinding_area()).collect();
		assert_eq!(vec![false, false, true, true, true], flagged);
	}
	#[test]
	fn partial_lowers_cells_beyond_region() {
		// opening the top of the wall creates a shortcut for the right hand column
		let settings = FlowFieldSettings::default();
		let mut grid = Grid::from_cost_matrix(&[
			vec![1, 255, 1],
			vec![1, 255, 1],
			vec![1,   1, 1],
		]).unwrap();
		let before = integrate(&mut grid, GridCell::new(0, 0), &settings);
		assert_eq!(6, before[2]);
		grid.set_walkable(1, 0, true).unwrap();
		grid.set_terrain(1, 0, 1).unwrap();
		let mut full = grid.clone();
		grid.set_pathfinding_area(1, 0, true).unwrap();
		build_costs(&mut grid, ComputeMode::Partial, &settings);
		propagate(&mut grid, GridCell::new(0, 0), ComputeMode::Partial, &settings).unwrap();
		let result: Vec<u32> = grid.get_cells().iter().map(|c| c.get_integration_cost()).collect();
		let x = UNREACHABLE;
		let actual = vec![
			0, 1, 2,
			1, x, 3,
			2, 3, 4,
		];
		assert_eq!(actual, result);
		assert_eq!(integrate(&mut full, GridCell::new(0, 0), &settings), result);
		// the improved cells join the region so the flow pass revisits them
		assert_eq!(3, grid.pathfinding_area_count());
	}
	#[test]
	fn partial_keeps_cells_with_another_route() {
		// an open field has many equal routes, blocking one leaves its neighbours alone
		let settings = FlowFieldSettings::default();
		let mut grid = Grid::new(GridDimensions::new(4, 4).unwrap()).unwrap();
		integrate(&mut grid, GridCell::new(0, 0), &settings);
		grid.set_walkable(1, 1, false).unwrap();
		let mut full = grid.clone();
		grid.set_pathfinding_area(1, 1, true).unwrap();
		build_costs(&mut grid, ComputeMode::Partial, &settings);
		propagate(&mut grid, GridCell::new(0, 0), ComputeMode::Partial, &settings).unwrap();
		assert_eq!(1, grid.pathfinding_area_count());
		let result: Vec<u32> = grid.get_cells().iter().map(|c| c.get_integration_cost()).collect();
		assert_eq!(integrate(&mut full, GridCell::new(0, 0), &settings), result);
	}
	#[test]
	fn overflow_aborts_pass() {
		let mut grid = Grid::new(GridDimensions::new(3, 1).unwrap()).unwrap();
		grid.set_terrain(1, 0, 200).unwrap();
		grid.set_occupancy(1, 0, 255).unwrap();
		grid.set_occupancy(2, 0, 255).unwrap();
		let settings = FlowFieldSettings::default().with_occupancy_weight(u16::MAX);
		build_costs(&mut grid, ComputeMode::FullGrid, &settings);
		// fake a huge accumulated value at the destination side
		grid.cells_mut()[0].set_integration_cost(UNREACHABLE - 10);
		let result = relax_neighbours(
			&grid.get_dimensions(),
			grid.cells_mut(),
			0,
			ComputeMode::FullGrid,
			&settings,
			|_, _| {},
		);
		assert!(matches!(result, Err(FlowFieldError::IntegrationOverflow { x: 1, z: 0 })));
	}
}
