//! Failures that can occur while building a grid or computing a field
//!

use thiserror::Error;

/// Everything that can go wrong when allocating, addressing or computing
/// over a [crate::prelude::Grid]. An unreachable cell is not an error, it is
/// represented by sentinel values within the fields
#[derive(Debug, Error)]
pub enum FlowFieldError {
	/// A coordinate outside of the grid extent was used
	#[error("Cell ({x}, {z}) is outside of the {width}x{depth} grid")]
	OutOfRange {
		/// Requested column
		x: u32,
		/// Requested row
		z: u32,
		/// Number of columns in the grid
		width: u32,
		/// Number of rows in the grid
		depth: u32,
	},
	/// A linear index outside of the grid buffer was used
	#[error("Index {index} is outside of a grid buffer of {len} cells")]
	IndexOutOfRange {
		/// Requested index
		index: usize,
		/// Number of cells in the buffer
		len: usize,
	},
	/// The destination of a computation cannot be routed to
	#[error("Destination ({x}, {z}) is invalid: {reason}")]
	InvalidDestination {
		/// Requested column
		x: u32,
		/// Requested row
		z: u32,
		/// Why the destination was rejected
		reason: &'static str,
	},
	/// Grid dimensions must be non-zero
	#[error("Grid dimensions ({width}, {depth}) must both be non-zero")]
	InvalidDimensions {
		/// Requested number of columns
		width: u32,
		/// Requested number of rows
		depth: u32,
	},
	/// The grid buffer could not be reserved
	#[error("Unable to allocate a grid buffer of {width}x{depth} cells")]
	AllocationFailure {
		/// Requested number of columns
		width: u32,
		/// Requested number of rows
		depth: u32,
	},
	/// Accumulated cost of a route reached the unreachable sentinel
	#[error("Integration cost overflowed while relaxing cell ({x}, {z})")]
	IntegrationOverflow {
		/// Column of the cell being relaxed
		x: u32,
		/// Row of the cell being relaxed
		z: u32,
	},
	/// Imported data does not match the shape of the grid
	#[error("Expected {expected} values, found {found}")]
	ShapeMismatch {
		/// Number of values the grid requires
		expected: usize,
		/// Number of values supplied
		found: usize,
	},
	/// A cell's `go_to_index` names a cell that isn't one of its neighbours
	#[error("Cell ({x}, {z}) points at index {go_to} which is not adjacent")]
	InvalidFlow {
		/// Column of the cell
		x: u32,
		/// Row of the cell
		z: u32,
		/// The stored `go_to_index`
		go_to: u32,
	},
	/// Reading or writing a file failed
	#[error(transparent)]
	Io(#[from] std::io::Error),
	/// A RON document could not be read or written
	#[cfg(feature = "ron")]
	#[error("Failed (de)serializing RON: {0}")]
	Ron(String),
	/// A CSV document could not be read or written
	#[cfg(feature = "csv")]
	#[error(transparent)]
	Csv(#[from] csv::Error),
	/// A heightmap image could not be decoded
	#[cfg(feature = "heightmap")]
	#[error("Failed reading heightmap: {0}")]
	Heightmap(String),
}
