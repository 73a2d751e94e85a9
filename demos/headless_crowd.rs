//! A crowd of actors walking towards a shared destination without any
//! rendering. A few ticks in a wall is raised across their path and the
//! actors reroute. Later a patch of marsh is added far from every route and
//! only that region is refreshed.
//!
//! Run with `cargo run --example headless_crowd`
//!

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_flowfield_grid_plugin::prelude::*;

/// Map of terrain values, `255` is impassable
const MAP: [[u8; 12]; 8] = [
	[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
	[1, 1, 1, 1, 255, 1, 1, 1, 1, 1, 1, 1],
	[1, 1, 1, 1, 255, 1, 1, 4, 4, 1, 1, 1],
	[1, 1, 1, 1, 255, 1, 1, 4, 4, 1, 1, 1],
	[1, 1, 1, 1, 255, 1, 1, 1, 1, 1, 1, 1],
	[1, 1, 1, 1, 255, 255, 255, 255, 1, 1, 1, 1],
	[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
	[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
];

/// Where every actor is heading
const DESTINATION: (u32, u32) = (11, 0);

/// Number of ticks to simulate
const TICKS: u32 = 30;

/// Tick at which the wall is raised
const WALL_TICK: u32 = 6;

/// Tick at which the marsh is added
const MARSH_TICK: u32 = 12;

/// An actor occupying a cell
#[derive(Component)]
struct Actor {
	/// Label used when logging
	name: &'static str,
	/// Cell currently occupied
	cell: GridCell,
}

/// Counts simulated ticks
#[derive(Resource, Default)]
struct Tick(u32);

fn main() {
	let mut app = App::new();
	app.add_plugins((LogPlugin::default(), FlowFieldGridPlugin))
		.init_resource::<Tick>()
		.add_systems(Startup, setup)
		.add_systems(
			Update,
			(
				change_map.before(OrderingSet::Edit),
				steer_actors.after(OrderingSet::Calculate),
				report_publications.after(OrderingSet::Calculate),
			),
		);
	for _ in 0..TICKS {
		app.update();
	}
}

/// Create the pathfinder, the actors and request the first field
fn setup(mut cmds: Commands, mut requests: EventWriter<EventPathRequest>) {
	let rows: Vec<Vec<u8>> = MAP.iter().map(|row| row.to_vec()).collect();
	let grid = match Grid::from_cost_matrix(&rows) {
		Ok(grid) => grid,
		Err(e) => {
			error!("Invalid map: {}", e);
			return;
		}
	};
	let settings = FlowFieldSettings::default().with_connectivity(Connectivity::Eight);
	cmds.spawn(FlowFieldPathfinder::from_grid(grid, settings));
	for (name, x, z) in [("alpha", 0, 7), ("beta", 1, 3), ("gamma", 6, 7)] {
		cmds.spawn(Actor {
			name,
			cell: GridCell::new(x, z),
		});
	}
	let (x, z) = DESTINATION;
	requests.write(EventPathRequest::new(GridCell::new(x, z), ComputeMode::FullGrid));
}

/// Change the map at set ticks and ask for a partial refresh. The edited
/// cells are flagged by the cell updates, the refresh widens to every cell
/// whose route crossed them
fn change_map(
	mut tick: ResMut<Tick>,
	mut updates: EventWriter<EventUpdateCell>,
	mut requests: EventWriter<EventPathRequest>,
) {
	tick.0 += 1;
	let (x, z) = DESTINATION;
	if tick.0 == WALL_TICK {
		info!("Raising a wall at tick {}", tick.0);
		for x in 8..12 {
			updates.write(EventUpdateCell::new(
				GridCell::new(x, 5),
				CellUpdate::Walkable(false),
			));
		}
		requests.write(EventPathRequest::new(GridCell::new(x, z), ComputeMode::Partial));
	} else if tick.0 == MARSH_TICK {
		info!("Adding marsh at tick {}", tick.0);
		for (mx, mz) in [(10, 7), (11, 7)] {
			updates.write(EventUpdateCell::new(
				GridCell::new(mx, mz),
				CellUpdate::Terrain(20),
			));
		}
		requests.write(EventPathRequest::new(GridCell::new(x, z), ComputeMode::Partial));
	}
}

/// Log each freshly published field
fn report_publications(mut events: EventReader<EventFlowFieldPublished>) {
	for event in events.read() {
		info!(
			"FlowField towards {:?} published on {:?}",
			event.get_destination().get_xz(),
			event.get_entity()
		);
	}
}

/// Move every actor one cell along the published field
fn steer_actors(pathfinders: Query<&FlowFieldPathfinder>, mut actors: Query<&mut Actor>) {
	for pathfinder in pathfinders.iter() {
		let Some(field) = pathfinder.published() else {
			continue;
		};
		for mut actor in actors.iter_mut() {
			let (x, z) = actor.cell.get_xz();
			match field.direction_at(x, z) {
				Ok(FlowDirection::Move(ordinal)) => {
					let (dx, dz) = ordinal.offset();
					let next = GridCell::new(x.saturating_add_signed(dx), z.saturating_add_signed(dz));
					debug!("{} steps {:?} to {:?}", actor.name, ordinal, next.get_xz());
					actor.cell = next;
				}
				Ok(FlowDirection::HoldPosition) => {
					if actor.cell == field.get_destination() {
						info!("{} has arrived", actor.name);
					} else {
						warn!("{} has no route from {:?}", actor.name, (x, z));
					}
				}
				Err(e) => error!("{} is off the map: {}", actor.name, e),
			}
		}
	}
}
