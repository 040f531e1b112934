mod roster_entry;

pub use roster_entry::{RecipientRole, Roster, RosterEntry, UnknownUser};
