//! Logic for handling changes to the [Grid] of a [FlowFieldPathfinder]. Each
//! edited cell is flagged so the next computation can choose to only refresh
//! the dirty region
//!

use crate::prelude::*;
use bevy::prelude::*;

/// The input of a cell to change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellUpdate {
	/// Whether an actor can stand in the cell, i.e a building has been placed or destroyed
	Walkable(bool),
	/// Static terrain weight
	Terrain(u8),
	/// Dynamic occupancy penalty
	Occupancy(u8),
}

/// Used to update a cell of every [FlowFieldPathfinder]
#[derive(Event, Clone, Copy, Debug)]
pub struct EventUpdateCell {
	/// Cell to update
	cell: GridCell,
	/// The new value of one of the cell's inputs
	update: CellUpdate,
}

impl EventUpdateCell {
	/// Create a new instance of [EventUpdateCell]
	pub fn new(cell: GridCell, update: CellUpdate) -> Self {
		EventUpdateCell { cell, update }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_cell(&self) -> GridCell {
		self.cell
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_update(&self) -> CellUpdate {
		self.update
	}
}

/// Flag an inclusive rectangle of cells of every [FlowFieldPathfinder] as
/// dirty without changing their inputs
#[derive(Event, Clone, Copy, Debug)]
pub struct EventMarkPathfindingArea {
	/// One corner of the region
	corner_a: GridCell,
	/// The opposite corner of the region
	corner_b: GridCell,
}

impl EventMarkPathfindingArea {
	/// Create a new instance of [EventMarkPathfindingArea]
	pub fn new(corner_a: GridCell, corner_b: GridCell) -> Self {
		EventMarkPathfindingArea { corner_a, corner_b }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_corners(&self) -> (GridCell, GridCell) {
		(self.corner_a, self.corner_b)
	}
}

/// Apply a single update to a pathfinder
fn apply_update(
	pathfinder: &mut FlowFieldPathfinder,
	event: &EventUpdateCell,
) -> Result<(), FlowFieldError> {
	let (x, z) = event.cell.get_xz();
	match event.update {
		CellUpdate::Walkable(walkable) => pathfinder.set_walkable(x, z, walkable),
		CellUpdate::Terrain(terrain) => pathfinder.set_terrain(x, z, terrain),
		CellUpdate::Occupancy(occupancy) => pathfinder.set_occupancy(x, z, occupancy),
	}
}

/// Read [EventUpdateCell] and update the inputs of the [Grid]
pub fn process_cell_updates(
	mut events: EventReader<EventUpdateCell>,
	mut query: Query<&mut FlowFieldPathfinder>,
) {
	for event in events.read() {
		for mut pathfinder in query.iter_mut() {
			if let Err(e) = apply_update(&mut pathfinder, event) {
				warn!("Ignoring cell update {:?}: {}", event.update, e);
			}
		}
	}
}

/// Read [EventMarkPathfindingArea] and flag the region of the [Grid]
pub fn process_area_marks(
	mut events: EventReader<EventMarkPathfindingArea>,
	mut query: Query<&mut FlowFieldPathfinder>,
) {
	for event in events.read() {
		for mut pathfinder in query.iter_mut() {
			if let Err(e) = pathfinder.mark_pathfinding_area(event.corner_a, event.corner_b) {
				warn!("Ignoring pathfinding area: {}", e);
			}
		}
	}
}
