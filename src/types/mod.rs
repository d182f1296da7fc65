//! Core domain types for the ruleset sync bot.
//!
//! IDs are wrapped in newtypes so that an ID from one organization's ID space
//! cannot silently stand in for another kind of ID.

pub mod ids;
pub mod ruleset;

pub use ids::{
    ActorId, DeliveryId, InstallationId, OrgId, OrgName, RepositoryId, RoleId, RulesetId, TeamId,
};
pub use ruleset::{
    ActorType, BypassActor, Enforcement, Rule, RulesetDocument, WORKFLOWS_RULE_TYPE, WorkflowRef,
    WorkflowsParameters,
};
