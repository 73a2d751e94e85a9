//! Useful structures and tools used by the fields
//!

use bevy::prelude::*;

/// Cost assigned to a non-walkable cell by the cost pass
pub const BLOCKED_COST: u16 = u16::MAX;
/// Integration value of a cell which has no route to the destination
pub const UNREACHABLE: u32 = u32::MAX;
/// `go_to_index` value of a cell that should not move (the destination itself, an unreachable cell or a blocked cell)
pub const HOLD_POSITION: u32 = u32::MAX;
/// Terrain value used by imported cost matrices (CSV, heightmaps) to denote an impassable cell
pub const IMPASSABLE_TERRAIN: u8 = 255;

/// Convenience way of accessing the 8 directions of movement from a grid cell.
///
/// The grid is indexed from its top-left corner, `North` is towards `z = 0`
/// and `West` is towards `x = 0`
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Ordinal {
	North,
	East,
	South,
	West,
	NorthEast,
	SouthEast,
	SouthWest,
	NorthWest,
}

impl Ordinal {
	/// The 4 orthogonal directions in neighbour scan order
	pub const ORTHOGONAL: [Ordinal; 4] = [
		Ordinal::North,
		Ordinal::East,
		Ordinal::South,
		Ordinal::West,
	];
	/// All 8 directions in neighbour scan order, orthogonals first. Ties
	/// between neighbours of equal cost are always resolved in this order
	pub const ALL: [Ordinal; 8] = [
		Ordinal::North,
		Ordinal::East,
		Ordinal::South,
		Ordinal::West,
		Ordinal::NorthEast,
		Ordinal::SouthEast,
		Ordinal::SouthWest,
		Ordinal::NorthWest,
	];
	/// The `(x, z)` step taken when moving one cell in this direction
	pub fn offset(&self) -> (i32, i32) {
		match self {
			Ordinal::North => (0, -1),
			Ordinal::East => (1, 0),
			Ordinal::South => (0, 1),
			Ordinal::West => (-1, 0),
			Ordinal::NorthEast => (1, -1),
			Ordinal::SouthEast => (1, 1),
			Ordinal::SouthWest => (-1, 1),
			Ordinal::NorthWest => (-1, -1),
		}
	}
	/// Whether the direction moves along both axes
	pub fn is_diagonal(&self) -> bool {
		matches!(
			self,
			Ordinal::NorthEast | Ordinal::SouthEast | Ordinal::SouthWest | Ordinal::NorthWest
		)
	}
	/// For a diagonal get the two orthogonal directions either side of it,
	/// i.e `NorthEast` is flanked by `North` and `East`. Orthogonals have no
	/// flanks
	pub fn flanks(&self) -> Option<(Ordinal, Ordinal)> {
		match self {
			Ordinal::NorthEast => Some((Ordinal::North, Ordinal::East)),
			Ordinal::SouthEast => Some((Ordinal::South, Ordinal::East)),
			Ordinal::SouthWest => Some((Ordinal::South, Ordinal::West)),
			Ordinal::NorthWest => Some((Ordinal::North, Ordinal::West)),
			_ => None,
		}
	}
	/// Returns the opposite [Ordinal] of the current
	pub fn inverse(&self) -> Ordinal {
		match self {
			Ordinal::North => Ordinal::South,
			Ordinal::East => Ordinal::West,
			Ordinal::South => Ordinal::North,
			Ordinal::West => Ordinal::East,
			Ordinal::NorthEast => Ordinal::SouthWest,
			Ordinal::SouthEast => Ordinal::NorthWest,
			Ordinal::SouthWest => Ordinal::NorthEast,
			Ordinal::NorthWest => Ordinal::SouthEast,
		}
	}
	/// For two cells next to each other find the [Ordinal] pointing from the
	/// `source` to the `target`. Returns [None] if the cells are not
	/// orthogonally or diagonally adjacent
	pub fn cell_to_cell_direction(target: (u32, u32), source: (u32, u32)) -> Option<Self> {
		let direction = (
			target.0 as i64 - source.0 as i64,
			target.1 as i64 - source.1 as i64,
		);
		match direction {
			(0, -1) => Some(Ordinal::North),
			(1, -1) => Some(Ordinal::NorthEast),
			(1, 0) => Some(Ordinal::East),
			(1, 1) => Some(Ordinal::SouthEast),
			(0, 1) => Some(Ordinal::South),
			(-1, 1) => Some(Ordinal::SouthWest),
			(-1, 0) => Some(Ordinal::West),
			(-1, -1) => Some(Ordinal::NorthWest),
			_ => None,
		}
	}
	/// Unit vector of the direction in grid space, `x` is the column axis and
	/// `y` is the row (`z`) axis. A steering pipeline can scale this by an
	/// actor speed
	pub fn as_vec2(&self) -> Vec2 {
		let (x, z) = self.offset();
		Vec2::new(x as f32, z as f32).normalize()
	}
}
