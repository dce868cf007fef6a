//! Business logic services for the mission graph.
//!
//! Services validate caller input and assemble page-shaped aggregates from
//! repositories, using the `FromContext` derive macro for dependency injection.

mod mission;
mod organization;
mod vote;

pub use mission::{render_dot, CountMismatch, HierarchyReport, MissionOverview, MissionService};
pub use organization::{OrganizationProfile, OrganizationService};
pub use vote::{VoteService, MAX_RATING, MIN_RATING};
