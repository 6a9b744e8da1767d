//! Common identifier and coordinate types shared across the meshview workspace.
//!
//! Every entity in a loaded dataset is addressed by a stable ID: chips by
//! [`ChipId`], data-movement pipes by [`PipeId`], and grid cells by
//! [`NodeUid`] (chip + grid location). These types are the only place where
//! the source data's coordinate conventions are normalized; everything
//! downstream works in canonical x/y form.

mod coords;
mod ids;
mod uid;

pub use coords::NodeLocation;
pub use ids::{ChipId, PipeId};
pub use uid::{NodeUid, UidParseError};
