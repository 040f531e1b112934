mod assignment_dto;
mod outcome_dto;

pub use assignment_dto::*;
pub use outcome_dto::*;
