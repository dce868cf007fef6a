//! Data access layer for graph operations.
//!
//! Repositories provide a clean abstraction over graph queries,
//! using the `FromContext` derive macro for dependency injection.
//! Every operation runs in its own session; "not found" is `Ok(None)`.

mod mission;
mod organization;
mod vote;

pub use mission::MissionRepository;
pub use organization::OrganizationRepository;
pub use vote::VoteRepository;
