//! Effects-as-data for GitHub operations.
//!
//! The resolver, rewriters and applier describe the GitHub calls they need as
//! [`GitHubEffect`] values and hand them to a [`GitHubInterpreter`]. This keeps
//! the translation logic free of HTTP concerns and lets tests answer effects
//! from fake organizations.

pub mod github;
pub mod interpreter;

pub use github::{
    CustomRoleData, GitHubEffect, GitHubResponse, OrganizationData, RepositoryData,
    RulesetSummary, TeamData,
};
pub use interpreter::GitHubInterpreter;
