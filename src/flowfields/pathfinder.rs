//! The [FlowFieldPathfinder] owns the [Grid] and drives the three passes in
//! order for a destination, publishing the result as a read-only
//! [FlowField].
//!
//! ```text
//! Idle -> CostBuilt -> Integrated -> FlowReady -> Published
//!   ^                                                  |
//!   |_____________ next run / failure / resize ________|
//! ```
//!
//! Edits made through the pathfinder flag the touched cells so a following
//! [ComputeMode::Partial] run only refreshes that region and the cells whose
//! routes it changes.
//!

use std::time::Instant;

use crate::prelude::*;
use bevy::prelude::*;

/// Progress of the pathfinder through the passes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PassStage {
	/// Nothing has been computed or the last result was invalidated
	#[default]
	Idle,
	/// Cost pass complete
	CostBuilt,
	/// Integration pass complete
	Integrated,
	/// Flow pass complete
	FlowReady,
	/// The fields are available through [FlowFieldPathfinder::published]
	Published,
}

/// Describes the inputs of the last successful computation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Publication {
	/// Destination the fields route towards
	destination: GridCell,
	/// Grid generation the fields were computed over
	generation: u64,
}

/// Owns a [Grid] and computes a [FlowField] over it for a destination
#[derive(Component, Clone, Debug)]
pub struct FlowFieldPathfinder {
	/// Cells and computed fields
	grid: Grid,
	/// Tuning of the passes
	settings: FlowFieldSettings,
	/// Where the pathfinder is within the pipeline
	stage: PassStage,
	/// Bumped whenever the grid buffer is replaced
	generation: u64,
	/// Inputs of the last published result, kept after grid edits so a
	/// partial refresh can build upon it
	publication: Option<Publication>,
}

impl FlowFieldPathfinder {
	/// Create a pathfinder over a new grid of walkable cells
	pub fn new(
		dimensions: GridDimensions,
		settings: FlowFieldSettings,
	) -> Result<Self, FlowFieldError> {
		Ok(FlowFieldPathfinder::from_grid(Grid::new(dimensions)?, settings))
	}
	/// Create a pathfinder over an existing grid, such as one imported from
	/// a cost matrix
	pub fn from_grid(grid: Grid, settings: FlowFieldSettings) -> Self {
		FlowFieldPathfinder {
			grid,
			settings,
			stage: PassStage::Idle,
			generation: 0,
			publication: None,
		}
	}
	/// Get the grid
	pub fn get_grid(&self) -> &Grid {
		&self.grid
	}
	/// Get mutable access to the grid. Any published field is withdrawn,
	/// cells edited this way should be flagged with
	/// [Grid::set_pathfinding_area] for a partial refresh to pick them up
	pub fn get_grid_mut(&mut self) -> &mut Grid {
		self.invalidate();
		&mut self.grid
	}
	/// Get the settings used by the passes
	pub fn get_settings(&self) -> &FlowFieldSettings {
		&self.settings
	}
	/// Replace the settings. Previous results were computed under different
	/// weights so they are withdrawn and the next run covers the full grid
	pub fn set_settings(&mut self, settings: FlowFieldSettings) {
		self.settings = settings;
		self.withdraw();
	}
	/// Get the current stage
	pub fn get_stage(&self) -> PassStage {
		self.stage
	}
	/// Get the generation of the grid buffer
	pub fn get_generation(&self) -> u64 {
		self.generation
	}
	/// Allocate a fresh grid of walkable cells with new dimensions,
	/// withdrawing any published field
	pub fn resize(&mut self, width: u32, depth: u32) -> Result<(), FlowFieldError> {
		let dimensions = GridDimensions::new(width, depth)?;
		self.replace_grid(Grid::new(dimensions)?);
		Ok(())
	}
	/// Swap in a different grid, withdrawing any published field
	pub fn replace_grid(&mut self, grid: Grid) {
		self.grid = grid;
		self.generation += 1;
		self.withdraw();
		debug!(
			"Grid generation {} allocated with {} cells",
			self.generation,
			self.grid.get_dimensions().cell_count()
		);
	}
	/// Set whether an actor can stand on `(x, z)` and flag it for a partial refresh
	pub fn set_walkable(&mut self, x: u32, z: u32, walkable: bool) -> Result<(), FlowFieldError> {
		self.grid.set_walkable(x, z, walkable)?;
		self.flag(x, z)
	}
	/// Set the static terrain weight of `(x, z)` and flag it for a partial refresh
	pub fn set_terrain(&mut self, x: u32, z: u32, terrain: u8) -> Result<(), FlowFieldError> {
		self.grid.set_terrain(x, z, terrain)?;
		self.flag(x, z)
	}
	/// Set the dynamic occupancy of `(x, z)` and flag it for a partial refresh
	pub fn set_occupancy(&mut self, x: u32, z: u32, occupancy: u8) -> Result<(), FlowFieldError> {
		self.grid.set_occupancy(x, z, occupancy)?;
		self.flag(x, z)
	}
	/// Flag a rectangular region for a partial refresh
	pub fn mark_pathfinding_area(
		&mut self,
		corner_a: GridCell,
		corner_b: GridCell,
	) -> Result<(), FlowFieldError> {
		self.grid.mark_pathfinding_area(corner_a, corner_b)?;
		self.invalidate();
		Ok(())
	}
	/// Flag a single edited cell
	fn flag(&mut self, x: u32, z: u32) -> Result<(), FlowFieldError> {
		self.grid.set_pathfinding_area(x, z, true)?;
		self.invalidate();
		Ok(())
	}
	/// The grid has changed since the last publication so its fields are stale
	fn invalidate(&mut self) {
		if self.stage != PassStage::Idle {
			trace!("{:?} -> {:?}", self.stage, PassStage::Idle);
			self.stage = PassStage::Idle;
		}
	}
	/// Forget the last publication entirely
	fn withdraw(&mut self) {
		self.invalidate();
		self.publication = None;
	}
	/// Move to the next stage of the pipeline
	fn advance(&mut self, stage: PassStage) {
		trace!("{:?} -> {:?}", self.stage, stage);
		self.stage = stage;
	}
	/// Get the last published field, `None` if nothing has been computed or
	/// the grid has changed since
	pub fn published(&self) -> Option<FlowField<'_>> {
		match (self.stage, self.publication) {
			(PassStage::Published, Some(publication)) => {
				Some(FlowField::new(&self.grid, publication.destination))
			}
			_ => None,
		}
	}
	/// Run every pass towards `destination` and publish the result.
	///
	/// The destination must be a walkable cell on the grid, otherwise
	/// [FlowFieldError::InvalidDestination] is returned before anything is
	/// touched. A [ComputeMode::Partial] request is widened to
	/// [ComputeMode::FullGrid] when there is no earlier result for the same
	/// destination and grid to refresh
	pub fn run_flow_field(
		&mut self,
		destination: GridCell,
		mode: ComputeMode,
	) -> Result<FlowField<'_>, FlowFieldError> {
		let (x, z) = destination.get_xz();
		let dimensions = self.grid.get_dimensions();
		if !dimensions.contains(x, z) {
			return Err(FlowFieldError::InvalidDestination {
				x,
				z,
				reason: "outside of the grid",
			});
		}
		if !self.grid.cell_at(x, z)?.is_walkable() {
			return Err(FlowFieldError::InvalidDestination {
				x,
				z,
				reason: "not walkable",
			});
		}
		let mode = self.resolve_mode(destination, mode);
		let start = Instant::now();
		if let Err(e) = self.compute(destination, mode) {
			error!("FlowField towards ({}, {}) aborted: {}", x, z, e);
			self.withdraw();
			return Err(e);
		}
		self.grid.clear_pathfinding_area();
		self.publication = Some(Publication {
			destination,
			generation: self.generation,
		});
		self.advance(PassStage::Published);
		debug!(
			"{:?} FlowField towards ({}, {}) published in {:?}",
			mode,
			x,
			z,
			start.elapsed()
		);
		Ok(FlowField::new(&self.grid, destination))
	}
	/// Decide whether a partial refresh can build upon the last publication
	fn resolve_mode(&self, destination: GridCell, mode: ComputeMode) -> ComputeMode {
		if mode != ComputeMode::Partial {
			return mode;
		}
		let current = Publication {
			destination,
			generation: self.generation,
		};
		if self.publication == Some(current) {
			ComputeMode::Partial
		} else {
			debug!(
				"No earlier FlowField towards {:?} on generation {}, escalating to a full computation",
				destination.get_xz(),
				self.generation
			);
			ComputeMode::FullGrid
		}
	}
	/// Run the passes in order
	fn compute(&mut self, destination: GridCell, mode: ComputeMode) -> Result<(), FlowFieldError> {
		self.advance(PassStage::Idle);
		build_costs(&mut self.grid, mode, &self.settings);
		self.advance(PassStage::CostBuilt);
		propagate(&mut self.grid, destination, mode, &self.settings)?;
		self.advance(PassStage::Integrated);
		derive_flow(&mut self.grid, mode, &self.settings);
		self.advance(PassStage::FlowReady);
		Ok(())
	}
}
