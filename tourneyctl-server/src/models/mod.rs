//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod validation;
pub mod form;
pub mod entity;
pub mod matches;
pub mod team;
pub mod player;

pub use validation::ValidationError;
pub use form::{FormData, FormValue, Upload, MAX_TEXT_LEN};
pub use entity::{Entity, Reference};
pub use matches::{Match, MatchFields};
pub use team::{ManagerTeam, TeamFields};
pub use player::{Player, PlayerFields};
