//! `use bevy_flowfield_grid_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::flowfields::{
	error::*,
	fields::{cost_field::*, flow_field::*, integration_field::*, *},
	grid::*,
	pathfinder::*,
	settings::*,
	utilities::*,
	*,
};

#[doc(hidden)]
pub use crate::plugin::{cost_layer::*, flow_layer::*, *};
