//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! The octocrab interpreter in `crate::github` executes them for real; tests
//! answer them from in-memory organization fixtures.

use serde::{Deserialize, Serialize};

use crate::types::{OrgId, OrgName, RepositoryId, RoleId, RulesetDocument, RulesetId, TeamId};

/// A GitHub API effect.
///
/// Effects are not scoped to an organization by the interpreter: every
/// variant names the organization (or global ID) it reads or writes. The
/// interpreter's credentials decide which of those calls are authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHubEffect {
    // ─── Directory lookups ────────────────────────────────────────────────────
    /// Fetch a repository by its global numeric ID.
    GetRepositoryById { repository_id: RepositoryId },

    /// Fetch a repository by organization and name.
    GetRepository { org: OrgName, name: String },

    /// Fetch an organization by login.
    GetOrganization { org: OrgName },

    /// Fetch a team by organization ID and team ID.
    GetTeamById { org_id: OrgId, team_id: TeamId },

    /// Fetch a team by organization login and slug.
    GetTeamBySlug { org: OrgName, slug: String },

    /// List the organization's custom repository roles.
    ListCustomRepoRoles { org: OrgName },

    // ─── Organization rulesets ────────────────────────────────────────────────
    /// List the organization's rulesets.
    ListOrgRulesets { org: OrgName },

    /// Create an organization ruleset.
    CreateOrgRuleset {
        org: OrgName,
        ruleset: Box<RulesetDocument>,
    },

    /// Replace an existing organization ruleset.
    UpdateOrgRuleset {
        org: OrgName,
        ruleset_id: RulesetId,
        ruleset: Box<RulesetDocument>,
    },
}

impl GitHubEffect {
    /// Short name of the effect for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubEffect::GetRepositoryById { .. } => "get_repository_by_id",
            GitHubEffect::GetRepository { .. } => "get_repository",
            GitHubEffect::GetOrganization { .. } => "get_organization",
            GitHubEffect::GetTeamById { .. } => "get_team_by_id",
            GitHubEffect::GetTeamBySlug { .. } => "get_team_by_slug",
            GitHubEffect::ListCustomRepoRoles { .. } => "list_custom_repo_roles",
            GitHubEffect::ListOrgRulesets { .. } => "list_org_rulesets",
            GitHubEffect::CreateOrgRuleset { .. } => "create_org_ruleset",
            GitHubEffect::UpdateOrgRuleset { .. } => "update_org_ruleset",
        }
    }

    /// Whether repeating the effect after a lost response leaves GitHub in
    /// the same state as running it once.
    ///
    /// Reads and `PUT` updates are idempotent. `CreateOrgRuleset` is not: if
    /// GitHub created the ruleset but the response was lost, a second `POST`
    /// fails with 422 on the duplicate name. The interpreter only retries
    /// idempotent effects.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, GitHubEffect::CreateOrgRuleset { .. })
    }
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// Repository data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryData {
    pub id: RepositoryId,
    /// The repository name without owner (the join key across organizations).
    pub name: String,
    pub full_name: String,
}

/// Organization data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationData {
    pub id: OrgId,
    pub login: String,
}

/// Team data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamData {
    pub id: TeamId,
    /// The team slug (the join key across organizations).
    pub slug: String,
    pub name: String,
}

/// A custom repository role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRoleData {
    pub id: RoleId,
    /// The role name (the join key across organizations).
    pub name: String,
}

/// Summary of an existing organization ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetSummary {
    pub id: RulesetId,
    pub name: String,
}

/// Response from a GitHub effect.
///
/// Lookups answer `None` when GitHub reports the entity doesn't exist (404),
/// so that "not found" can be told apart from a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHubResponse {
    /// Response to `GetRepositoryById` and `GetRepository`.
    Repository(Option<RepositoryData>),

    /// Response to `GetOrganization`.
    Organization(Option<OrganizationData>),

    /// Response to `GetTeamById` and `GetTeamBySlug`.
    Team(Option<TeamData>),

    /// Response to `ListCustomRepoRoles`.
    CustomRepoRoles(Vec<CustomRoleData>),

    /// Response to `ListOrgRulesets`.
    OrgRulesets(Vec<RulesetSummary>),

    /// Response to `CreateOrgRuleset` and `UpdateOrgRuleset`.
    RulesetApplied { id: RulesetId },
}

impl GitHubResponse {
    /// Short name of the response variant, for "unexpected response" errors.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubResponse::Repository(_) => "repository",
            GitHubResponse::Organization(_) => "organization",
            GitHubResponse::Team(_) => "team",
            GitHubResponse::CustomRepoRoles(_) => "custom_repo_roles",
            GitHubResponse::OrgRulesets(_) => "org_rulesets",
            GitHubResponse::RulesetApplied { .. } => "ruleset_applied",
        }
    }
}
