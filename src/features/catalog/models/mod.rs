mod category;

pub use category::{Category, CategoryProfile, ReportKind, SubCategory, Subject};
