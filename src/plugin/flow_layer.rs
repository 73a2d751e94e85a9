//! Logic relating to [FlowField] generation
//!

use crate::prelude::*;
use bevy::prelude::*;

/// A request to compute a [FlowField] towards a destination on every
/// [FlowFieldPathfinder]
#[derive(Event, Clone, Copy, Debug)]
pub struct EventPathRequest {
	/// The cell every actor should route towards
	destination: GridCell,
	/// Whether to refresh the whole grid or only its flagged region
	mode: ComputeMode,
}

impl EventPathRequest {
	/// Create a new instance of [EventPathRequest]
	pub fn new(destination: GridCell, mode: ComputeMode) -> Self {
		EventPathRequest { destination, mode }
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_destination(&self) -> GridCell {
		self.destination
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_mode(&self) -> ComputeMode {
		self.mode
	}
}

/// Emitted once a [FlowFieldPathfinder] has published a fresh [FlowField]
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventFlowFieldPublished {
	/// Entity holding the [FlowFieldPathfinder]
	entity: Entity,
	/// Destination of the published field
	destination: GridCell,
}

impl EventFlowFieldPublished {
	/// Create a new instance of [EventFlowFieldPublished]
	pub fn new(entity: Entity, destination: GridCell) -> Self {
		EventFlowFieldPublished {
			entity,
			destination,
		}
	}
	/// Get the entity holding the pathfinder
	pub fn get_entity(&self) -> Entity {
		self.entity
	}
	/// Get the destination of the field
	pub fn get_destination(&self) -> GridCell {
		self.destination
	}
}

/// Process [EventPathRequest]s and compute a [FlowField] on each
/// [FlowFieldPathfinder]
pub fn process_path_requests(
	mut events: EventReader<EventPathRequest>,
	mut query: Query<(Entity, &mut FlowFieldPathfinder)>,
	mut published: EventWriter<EventFlowFieldPublished>,
) {
	// several actors may send requests at once, a field only has one
	// destination so only the most recent request of the tick is computed
	let Some(request) = events.read().last().copied() else {
		return;
	};
	for (entity, mut pathfinder) in query.iter_mut() {
		match pathfinder.run_flow_field(request.destination, request.mode) {
			Ok(field) => {
				published.write(EventFlowFieldPublished::new(entity, field.get_destination()));
			}
			Err(e) => {
				warn!("Path request on {:?} rejected: {}", entity, e);
			}
		}
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;

	/// Create an app running the plugin with a single pathfinder
	fn setup(width: u32, depth: u32) -> (App, Entity) {
		let mut app = App::new();
		app.add_plugins(FlowFieldGridPlugin);
		let pathfinder = FlowFieldPathfinder::new(
			GridDimensions::new(width, depth).unwrap(),
			FlowFieldSettings::default(),
		).unwrap();
		let entity = app.world_mut().spawn(pathfinder).id();
		(app, entity)
	}
	/// Collect the published notifications of the last update
	fn published_events(app: &App) -> Vec<EventFlowFieldPublished> {
		let events = app.world().resource::<Events<EventFlowFieldPublished>>();
		let mut cursor = events.get_cursor();
		cursor.read(events).copied().collect()
	}

	#[test]
	fn request_publishes_field() {
		let (mut app, entity) = setup(4, 4);
		app.world_mut().send_event(EventPathRequest::new(GridCell::new(3, 3), ComputeMode::FullGrid));
		app.update();
		let pathfinder = app.world().get::<FlowFieldPathfinder>(entity).unwrap();
		let field = pathfinder.published().unwrap();
		assert_eq!(6, field.integration_cost_at(0, 0).unwrap());
		assert_eq!(
			vec![EventFlowFieldPublished::new(entity, GridCell::new(3, 3))],
			published_events(&app)
		);
	}
	#[test]
	fn last_request_wins() {
		let (mut app, entity) = setup(4, 4);
		app.world_mut().send_event(EventPathRequest::new(GridCell::new(3, 3), ComputeMode::FullGrid));
		app.world_mut().send_event(EventPathRequest::new(GridCell::new(0, 0), ComputeMode::FullGrid));
		app.update();
		let pathfinder = app.world().get::<FlowFieldPathfinder>(entity).unwrap();
		assert_eq!(GridCell::new(0, 0), pathfinder.published().unwrap().get_destination());
		assert_eq!(1, published_events(&app).len());
	}
	#[test]
	fn blocked_request_is_not_published() {
		let (mut app, entity) = setup(3, 3);
		app.world_mut().send_event(EventUpdateCell::new(GridCell::new(1, 1), CellUpdate::Walkable(false)));
		app.world_mut().send_event(EventPathRequest::new(GridCell::new(1, 1), ComputeMode::FullGrid));
		app.update();
		let pathfinder = app.world().get::<FlowFieldPathfinder>(entity).unwrap();
		assert!(pathfinder.published().is_none());
		assert!(published_events(&app).is_empty());
	}
	#[test]
	fn edits_then_partial_request() {
		let (mut app, entity) = setup(5, 5);
		app.world_mut().send_event(EventPathRequest::new(GridCell::new(0, 0), ComputeMode::FullGrid));
		app.update();
		app.world_mut().send_event(EventUpdateCell::new(GridCell::new(4, 4), CellUpdate::Terrain(10)));
		app.world_mut().send_event(EventPathRequest::new(GridCell::new(0, 0), ComputeMode::Partial));
		app.update();
		let pathfinder = app.world().get::<FlowFieldPathfinder>(entity).unwrap();
		let field = pathfinder.published().unwrap();
		assert_eq!(17, field.integration_cost_at(4, 4).unwrap());
		assert_eq!(0, pathfinder.get_grid().pathfinding_area_count());
	}
}
