//! Defines the Bevy [Plugin] for a grid-wide FlowField
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod cost_layer;
pub mod flow_layer;

/// Edits to the grid are applied before any computation of the same tick
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// Apply cell updates and flag dirty regions
	Edit,
	/// Compute and publish fields
	Calculate,
}

/// Registers the events and systems driving every [FlowFieldPathfinder]
pub struct FlowFieldGridPlugin;

impl Plugin for FlowFieldGridPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.add_event::<cost_layer::EventUpdateCell>()
			.add_event::<cost_layer::EventMarkPathfindingArea>()
			.add_event::<flow_layer::EventPathRequest>()
			.add_event::<flow_layer::EventFlowFieldPublished>()
			.configure_sets(Update, (OrderingSet::Edit, OrderingSet::Calculate).chain())
			.add_systems(
				Update,
				(
					(
						cost_layer::process_cell_updates,
						cost_layer::process_area_marks,
					)
						.chain()
						.in_set(OrderingSet::Edit),
					flow_layer::process_path_requests.in_set(OrderingSet::Calculate),
				),
			);
	}
}
