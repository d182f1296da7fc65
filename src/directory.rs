//! Typed organization directory over a `GitHubInterpreter`.
//!
//! `Directory` turns the lookups the resolver and applier need into
//! `GitHubEffect`s, runs them through an interpreter and unpacks the matching
//! response variant. Every call is raced against a cancellation token so an
//! in-flight lookup stops as soon as the surrounding sync is cancelled.

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::effects::{
    CustomRoleData, GitHubEffect, GitHubInterpreter, GitHubResponse, RulesetSummary,
};
use crate::github::GitHubApiError;
use crate::types::{OrgId, OrgName, RepositoryId, RoleId, RulesetDocument, RulesetId, TeamId};

/// Errors from directory calls.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The GitHub API call failed (transport, rate limit, permissions).
    #[error(transparent)]
    Upstream(#[from] GitHubApiError),

    /// The surrounding operation was cancelled while the call was in flight.
    #[error("operation cancelled")]
    Cancelled,
}

impl DirectoryError {
    /// Whether the call was abandoned because of cancellation rather than
    /// failing upstream.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DirectoryError::Cancelled)
    }
}

/// Organization directory backed by one interpreter's credentials.
pub struct Directory<'a, G> {
    github: &'a G,
    cancel: &'a CancellationToken,
}

impl<'a, G> Directory<'a, G>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    /// Creates a directory issuing calls through `github`, abandoned once
    /// `cancel` fires.
    pub fn new(github: &'a G, cancel: &'a CancellationToken) -> Self {
        Directory { github, cancel }
    }

    /// Runs one effect, returning `Cancelled` if the token fires first.
    async fn run(&self, effect: GitHubEffect) -> Result<GitHubResponse, DirectoryError> {
        if self.cancel.is_cancelled() {
            return Err(DirectoryError::Cancelled);
        }

        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => {
                tracing::debug!("GitHub call cancelled");
                Err(DirectoryError::Cancelled)
            }
            result = self.github.interpret(effect) => result.map_err(DirectoryError::Upstream),
        }
    }

    /// Returns the name of the repository with the given global ID.
    pub async fn repository_name(
        &self,
        repository_id: RepositoryId,
    ) -> Result<Option<String>, DirectoryError> {
        let effect = GitHubEffect::GetRepositoryById { repository_id };
        let name = effect.name();
        match self.run(effect).await? {
            GitHubResponse::Repository(repo) => Ok(repo.map(|r| r.name)),
            other => Err(unexpected(name, &other)),
        }
    }

    /// Returns the ID of the repository `org/name`.
    pub async fn repository_id(
        &self,
        org: &OrgName,
        name: &str,
    ) -> Result<Option<RepositoryId>, DirectoryError> {
        let effect = GitHubEffect::GetRepository {
            org: org.clone(),
            name: name.to_string(),
        };
        let effect_name = effect.name();
        match self.run(effect).await? {
            GitHubResponse::Repository(repo) => Ok(repo.map(|r| r.id)),
            other => Err(unexpected(effect_name, &other)),
        }
    }

    /// Returns the numeric ID of an organization.
    pub async fn org_id(&self, org: &OrgName) -> Result<Option<OrgId>, DirectoryError> {
        let effect = GitHubEffect::GetOrganization { org: org.clone() };
        let name = effect.name();
        match self.run(effect).await? {
            GitHubResponse::Organization(o) => Ok(o.map(|o| o.id)),
            other => Err(unexpected(name, &other)),
        }
    }

    /// Returns the slug of a team, addressed by organization and team ID.
    pub async fn team_slug(
        &self,
        org_id: OrgId,
        team_id: TeamId,
    ) -> Result<Option<String>, DirectoryError> {
        let effect = GitHubEffect::GetTeamById { org_id, team_id };
        let name = effect.name();
        match self.run(effect).await? {
            GitHubResponse::Team(team) => Ok(team.map(|t| t.slug)),
            other => Err(unexpected(name, &other)),
        }
    }

    /// Returns the ID of the team with the given slug.
    pub async fn team_id(&self, org: &OrgName, slug: &str) -> Result<Option<TeamId>, DirectoryError> {
        let effect = GitHubEffect::GetTeamBySlug {
            org: org.clone(),
            slug: slug.to_string(),
        };
        let name = effect.name();
        match self.run(effect).await? {
            GitHubResponse::Team(team) => Ok(team.map(|t| t.id)),
            other => Err(unexpected(name, &other)),
        }
    }

    /// Returns the name of a custom repository role in `org`.
    pub async fn role_name(
        &self,
        org: &OrgName,
        role_id: RoleId,
    ) -> Result<Option<String>, DirectoryError> {
        let roles = self.custom_roles(org).await?;
        Ok(roles
            .into_iter()
            .find(|role| role.id == role_id)
            .map(|role| role.name))
    }

    /// Returns the ID of the custom repository role named `name` in `org`.
    pub async fn role_id(&self, org: &OrgName, name: &str) -> Result<Option<RoleId>, DirectoryError> {
        let roles = self.custom_roles(org).await?;
        Ok(roles
            .into_iter()
            .find(|role| role.name == name)
            .map(|role| role.id))
    }

    async fn custom_roles(&self, org: &OrgName) -> Result<Vec<CustomRoleData>, DirectoryError> {
        let effect = GitHubEffect::ListCustomRepoRoles { org: org.clone() };
        let name = effect.name();
        match self.run(effect).await? {
            GitHubResponse::CustomRepoRoles(roles) => Ok(roles),
            other => Err(unexpected(name, &other)),
        }
    }

    /// Lists the organization's rulesets.
    pub async fn org_rulesets(&self, org: &OrgName) -> Result<Vec<RulesetSummary>, DirectoryError> {
        let effect = GitHubEffect::ListOrgRulesets { org: org.clone() };
        let name = effect.name();
        match self.run(effect).await? {
            GitHubResponse::OrgRulesets(rulesets) => Ok(rulesets),
            other => Err(unexpected(name, &other)),
        }
    }

    /// Creates an organization ruleset, returning its ID.
    pub async fn create_ruleset(
        &self,
        org: &OrgName,
        ruleset: &RulesetDocument,
    ) -> Result<RulesetId, DirectoryError> {
        let effect = GitHubEffect::CreateOrgRuleset {
            org: org.clone(),
            ruleset: Box::new(ruleset.clone()),
        };
        let name = effect.name();
        match self.run(effect).await? {
            GitHubResponse::RulesetApplied { id } => Ok(id),
            other => Err(unexpected(name, &other)),
        }
    }

    /// Replaces an existing organization ruleset.
    pub async fn update_ruleset(
        &self,
        org: &OrgName,
        ruleset_id: RulesetId,
        ruleset: &RulesetDocument,
    ) -> Result<RulesetId, DirectoryError> {
        let effect = GitHubEffect::UpdateOrgRuleset {
            org: org.clone(),
            ruleset_id,
            ruleset: Box::new(ruleset.clone()),
        };
        let name = effect.name();
        match self.run(effect).await? {
            GitHubResponse::RulesetApplied { id } => Ok(id),
            other => Err(unexpected(name, &other)),
        }
    }
}

fn unexpected(effect: &str, response: &GitHubResponse) -> DirectoryError {
    DirectoryError::Upstream(GitHubApiError::unexpected_response(effect, response.name()))
}
