mod roster_service;

pub use roster_service::{load_roster, RosterService, RosterSource};
