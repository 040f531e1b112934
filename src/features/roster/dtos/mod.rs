mod roster_dto;

pub use roster_dto::{RosterEntryDto, TeacherRosterQuery};
