pub mod roster_handler;

pub use roster_handler::*;
