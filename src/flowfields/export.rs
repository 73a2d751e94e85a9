//! Dump a computed [FlowField] as CSV for inspection in a spreadsheet or for
//! diffing runs, one record per cell in row-major order
//!

use std::io::Write;

use crate::prelude::*;

/// A single cell of an exported field
#[derive(serde::Serialize)]
struct CellRecord {
	/// Column
	x: u32,
	/// Row
	z: u32,
	/// Whether an actor can stand in the cell
	walkable: bool,
	/// Base traversal cost
	cost: u16,
	/// Dynamic traversal delta
	dynamic_cost: u16,
	/// Accumulated cost to the destination, empty when unreachable
	integration_cost: Option<u32>,
	/// Index of the cell to move into, empty when holding position
	go_to_index: Option<u32>,
	/// Human readable direction
	direction: String,
}

impl FlowField<'_> {
	/// Write every cell of the field as a CSV record with a header row
	pub fn export_csv<W: Write>(&self, writer: W) -> Result<(), FlowFieldError> {
		let grid = self.get_grid();
		let dimensions = grid.get_dimensions();
		let mut wtr = csv::Writer::from_writer(writer);
		for (index, cell) in grid.get_cells().iter().enumerate() {
			let (x, z) = dimensions.coords_of_unchecked(index);
			let go_to = grid.get_go_to_indices()[index];
			let direction = match self.direction_at(x, z)? {
				FlowDirection::Move(ordinal) => format!("{:?}", ordinal),
				FlowDirection::HoldPosition => String::from("Hold"),
			};
			wtr.serialize(CellRecord {
				x,
				z,
				walkable: cell.is_walkable(),
				cost: cell.get_cost(),
				dynamic_cost: cell.get_dynamic_cost(),
				integration_cost: cell.is_reachable().then(|| cell.get_integration_cost()),
				go_to_index: (go_to != HOLD_POSITION).then_some(go_to),
				direction,
			})?;
		}
		wtr.flush()?;
		Ok(())
	}
	/// Write the field to a CSV file at `path`
	pub fn export_csv_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), FlowFieldError> {
		let file = std::fs::File::create(path)?;
		self.export_csv(file)
	}
}
