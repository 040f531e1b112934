mod assignment;
mod submission;

pub use assignment::{AssignmentPatch, NewAssignment, ReportAssignment};
pub use submission::{Submission, SubmissionStatus};
