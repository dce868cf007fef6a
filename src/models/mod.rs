//! Domain models for the mission graph.

mod hierarchy;
mod mission;
mod organization;
mod vote;

pub use hierarchy::{dot_quote, MissionGraph};
pub use mission::{Mission, MissionSet, MissionWithSubMissions};
pub use organization::{NewOrganization, Organization, OrganizationWithMissions};
pub use vote::{NewVote, Vote};
