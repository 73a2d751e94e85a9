//! Flowfields are a means of handling pathfinding for a crowd of actors.
//!
//! [Fixing Pathfinding Once and For All](https://web.archive.org/web/20150905073624/http://www.ai-blog.net/archives/000152.html)
//!
//! [SupCom2- Elijah Emerson](https://www.gameaipro.com/GameAIPro/GameAIPro_Chapter23_Crowd_Pathfinding_and_Steering_Using_Flow_Field_Tiles.pdf)
//!
//! [jdxdev](https://www.jdxdev.com/blog/2020/05/03/flowfields/)
//!
//! [leifnode](https://leifnode.com/2013/12/flow-field-pathfinding/)
//!
//! A single flat grid of cells covers the whole map and every actor shares
//! one set of fields computed towards a common destination. Cells are
//! positioned from the top-left corner of the map, `x` being the column and
//! `z` the row, so north is towards `z = 0`.
//!
//! Definitions:
//!
//! * Grid - a `width x depth` buffer of cells, each holding the inputs and outputs of every pass
//! * Cost field - per cell traversal cost derived from terrain weight and dynamic occupancy, impassable cells carry a blocked sentinel
//! * Integration field - uses the cost field as input and stores the calculated cost-to-destination of every cell
//! * Flow field - for each cell the index of the neighbour an actor should step into to head downhill towards the destination
//!
//! ```text
//!  _____________________________
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! |__|__|__|__|__|__|__|__|__|__|
//! ```
//!

pub mod error;
#[cfg(feature = "csv")]
pub mod export;
pub mod fields;
pub mod grid;
pub mod pathfinder;
pub mod settings;
pub mod utilities;
