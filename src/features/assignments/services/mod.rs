mod assignment_store;
mod distribution_service;
mod link_writer;
mod ownership_resolver;
mod status_sync;

pub use assignment_store::{AssignmentHistory, AssignmentStore, PgAssignmentStore};
pub use distribution_service::DistributionService;
pub use link_writer::AssignmentWriter;
pub use ownership_resolver::HistoryOwnershipResolver;
pub use status_sync::SubmissionSynchronizer;

