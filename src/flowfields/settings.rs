//! Tunables shared by every pass of a FlowField computation
//!

use bevy::prelude::*;

use crate::prelude::*;

/// Which neighbours of a cell are considered when propagating costs and
/// deriving flow directions
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Connectivity {
	/// North, East, South and West only
	#[default]
	Four,
	/// Orthogonals plus diagonals. A diagonal step is refused when both of
	/// its orthogonal flanks are non-walkable so actors don't squeeze
	/// through the corner of two obstacles
	Eight,
}

impl Connectivity {
	/// Neighbour directions in scan order
	pub fn ordinals(&self) -> &'static [Ordinal] {
		match self {
			Connectivity::Four => &Ordinal::ORTHOGONAL,
			Connectivity::Eight => &Ordinal::ALL,
		}
	}
}

/// How the integration pass orders the cells it relaxes
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Propagation {
	/// First-in-first-out wavefront where a cell is re-enqueued whenever its
	/// value improves. Cheapest per step, may revisit cells when costs vary
	#[default]
	WorkQueue,
	/// Binary heap ordered by accumulated cost, each cell settles once.
	/// Preferable when costs vary wildly across the grid
	PriorityQueue,
}

/// Configuration of the FlowField pipeline
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowFieldSettings {
	/// Neighbourhood used by propagation and flow derivation
	connectivity: Connectivity,
	/// Percentage applied to the cost of a diagonal step, `100` makes a
	/// diagonal as cheap as an orthogonal step (Chebyshev distance) while
	/// `141` approximates Euclidean distance
	diagonal_weight: u16,
	/// Ordering strategy of the integration pass
	propagation: Propagation,
	/// Multiplier turning a cell's dynamic occupancy into its `d_cost`
	occupancy_weight: u16,
	/// Number of cells handed to each task of the parallel passes
	chunk_size: usize,
}

impl Default for FlowFieldSettings {
	fn default() -> Self {
		FlowFieldSettings {
			connectivity: Connectivity::default(),
			diagonal_weight: 100,
			propagation: Propagation::default(),
			occupancy_weight: 1,
			chunk_size: 4096,
		}
	}
}

impl FlowFieldSettings {
	/// Use a different neighbourhood
	pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
		self.connectivity = connectivity;
		self
	}
	/// Set the diagonal step weighting as a percentage of an orthogonal step, a weight of `0` is raised to `1`
	pub fn with_diagonal_weight(mut self, percent: u16) -> Self {
		self.diagonal_weight = percent.max(1);
		self
	}
	/// Use a different integration strategy
	pub fn with_propagation(mut self, propagation: Propagation) -> Self {
		self.propagation = propagation;
		self
	}
	/// Set the multiplier of dynamic occupancy
	pub fn with_occupancy_weight(mut self, weight: u16) -> Self {
		self.occupancy_weight = weight;
		self
	}
	/// Set the number of cells per parallel task, `0` is raised to `1`
	pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
		self.chunk_size = chunk_size.max(1);
		self
	}
	pub fn get_connectivity(&self) -> Connectivity {
		self.connectivity
	}
	pub fn get_diagonal_weight(&self) -> u16 {
		self.diagonal_weight.max(1)
	}
	pub fn get_propagation(&self) -> Propagation {
		self.propagation
	}
	pub fn get_occupancy_weight(&self) -> u16 {
		self.occupancy_weight
	}
	pub fn get_chunk_size(&self) -> usize {
		self.chunk_size.max(1)
	}
	/// From a `ron` file generate the [FlowFieldSettings], fields missing from the file take their default value
	#[cfg(feature = "ron")]
	pub fn from_ron(path: impl AsRef<std::path::Path>) -> Result<Self, FlowFieldError> {
		let file = std::fs::File::open(path)?;
		ron::de::from_reader(file).map_err(|e| FlowFieldError::Ron(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn zero_chunk_is_raised() {
		let settings = FlowFieldSettings::default().with_chunk_size(0);
		assert_eq!(1, settings.get_chunk_size());
	}
	#[test]
	fn eight_way_scans_orthogonals_first() {
		let ordinals = Connectivity::Eight.ordinals();
		assert_eq!(&Ordinal::ORTHOGONAL[..], &ordinals[..4]);
	}
	#[test]
	#[cfg(feature = "ron")]
	fn partial_ron_uses_defaults() {
		let settings: FlowFieldSettings =
			ron::de::from_str("(connectivity: Eight, diagonal_weight: 141)").unwrap();
		assert_eq!(Connectivity::Eight, settings.get_connectivity());
		assert_eq!(141, settings.get_diagonal_weight());
		assert_eq!(Propagation::WorkQueue, settings.get_propagation());
	}
}
