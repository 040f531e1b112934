//! Pure distribution engine: request value object, ownership gate, fan-out
//! and create-vs-update routing. Nothing here touches storage except through
//! the `CoordinatorOwnershipResolver` trait.

pub mod error;
pub mod fan_out;
pub mod ownership;
pub mod request;
pub mod router;

pub use error::DistributionError;
pub use fan_out::{
    build_assignment_specs, pair_by_subject, AssignmentSpec, ParentRef, SpecBatch,
};
pub use ownership::{
    resolve_coordinator_of_record, CoordinatorOwnershipResolver, OwnershipOutcome,
};
pub use request::{
    Actor, AncestorBatch, AssignmentDetails, DistributionRequest, Recipient, SubjectRef,
};
pub use router::{route, RouteDecision};
