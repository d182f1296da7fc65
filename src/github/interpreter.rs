//! GitHub effect interpreter using octocrab.
//!
//! Executes `GitHubEffect`s against the REST API. Key implementation details:
//! - Lookups answer `None` on 404 instead of failing
//! - Retry logic with exponential backoff for transient errors, applied to
//!   idempotent effects only
//! - Ruleset writes send only the fields GitHub accepts on create/update

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::effects::{
    CustomRoleData, GitHubEffect, GitHubInterpreter, GitHubResponse, OrganizationData,
    RepositoryData, RulesetSummary, TeamData,
};
use crate::types::{
    BypassActor, Enforcement, OrgId, OrgName, RepositoryId, Rule, RulesetDocument, RulesetId,
    TeamId,
};

use super::client::OctocrabClient;
use super::error::GitHubApiError;
use super::retry::{RetryConfig, retry_with_backoff};

/// Page size for list endpoints.
const PER_PAGE: u32 = 100;

/// Upper bound on pages fetched from a list endpoint.
const MAX_PAGES: u32 = 50;

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        interpret_github_effect(self, effect).await
    }
}

/// Interprets a GitHub effect, executing it against the GitHub API.
///
/// Transient failures are retried according to the client's retry settings,
/// except for effects that are not idempotent (see
/// [`GitHubEffect::is_idempotent`]), which get exactly one attempt.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    tracing::trace!(
        effect = effect.name(),
        installed_on = %client.installed_on(),
        "Executing GitHub effect"
    );

    let config = retry_config_for(client.retry_config(), &effect);
    retry_with_backoff(config, || execute_effect(client, effect.clone())).await
}

/// The retry settings to use for `effect`.
fn retry_config_for(configured: RetryConfig, effect: &GitHubEffect) -> RetryConfig {
    if effect.is_idempotent() {
        configured
    } else {
        RetryConfig::NONE
    }
}

/// Executes a single effect without retry logic.
async fn execute_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetRepositoryById { repository_id } => {
            get_repository_by_id(client, repository_id).await
        }
        GitHubEffect::GetRepository { org, name } => get_repository(client, &org, &name).await,
        GitHubEffect::GetOrganization { org } => get_organization(client, &org).await,
        GitHubEffect::GetTeamById { org_id, team_id } => {
            get_team_by_id(client, org_id, team_id).await
        }
        GitHubEffect::GetTeamBySlug { org, slug } => get_team_by_slug(client, &org, &slug).await,
        GitHubEffect::ListCustomRepoRoles { org } => list_custom_repo_roles(client, &org).await,
        GitHubEffect::ListOrgRulesets { org } => list_org_rulesets(client, &org).await,
        GitHubEffect::CreateOrgRuleset { org, ruleset } => {
            create_org_ruleset(client, &org, &ruleset).await
        }
        GitHubEffect::UpdateOrgRuleset {
            org,
            ruleset_id,
            ruleset,
        } => update_org_ruleset(client, &org, ruleset_id, &ruleset).await,
    }
}

/// GETs a single resource, mapping 404 to `None`.
async fn get_optional<R: DeserializeOwned>(
    client: &OctocrabClient,
    route: &str,
) -> Result<Option<R>, GitHubApiError> {
    let result: Result<R, octocrab::Error> = client.inner().get(route, None::<&()>).await;

    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            let err = GitHubApiError::from_octocrab(e);
            if err.is_not_found() {
                tracing::debug!(route, "GitHub resource not found");
                Ok(None)
            } else {
                Err(err)
            }
        }
    }
}

// ─── Directory Lookups ────────────────────────────────────────────────────────

async fn get_repository_by_id(
    client: &OctocrabClient,
    repository_id: RepositoryId,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = format!("/repositories/{}", repository_id);
    let repo: Option<RepositoryData> = get_optional(client, &route).await?;
    Ok(GitHubResponse::Repository(repo))
}

async fn get_repository(
    client: &OctocrabClient,
    org: &OrgName,
    name: &str,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = format!("/repos/{}/{}", org, name);
    let repo: Option<RepositoryData> = get_optional(client, &route).await?;
    Ok(GitHubResponse::Repository(repo))
}

async fn get_organization(
    client: &OctocrabClient,
    org: &OrgName,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = format!("/orgs/{}", org);
    let organization: Option<OrganizationData> = get_optional(client, &route).await?;
    Ok(GitHubResponse::Organization(organization))
}

async fn get_team_by_id(
    client: &OctocrabClient,
    org_id: OrgId,
    team_id: TeamId,
) -> Result<GitHubResponse, GitHubApiError> {
    // Legacy route, but the only one that addresses a team by numeric ID.
    let route = format!("/organizations/{}/team/{}", org_id, team_id);
    let team: Option<TeamData> = get_optional(client, &route).await?;
    Ok(GitHubResponse::Team(team))
}

async fn get_team_by_slug(
    client: &OctocrabClient,
    org: &OrgName,
    slug: &str,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = format!("/orgs/{}/teams/{}", org, slug);
    let team: Option<TeamData> = get_optional(client, &route).await?;
    Ok(GitHubResponse::Team(team))
}

#[derive(Debug, serde::Deserialize)]
struct CustomRolesResponse {
    #[serde(default)]
    custom_roles: Vec<CustomRoleData>,
}

async fn list_custom_repo_roles(
    client: &OctocrabClient,
    org: &OrgName,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = format!("/orgs/{}/custom-repository-roles", org);
    let response: CustomRolesResponse = client
        .inner()
        .get(&route, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::CustomRepoRoles(response.custom_roles))
}

// ─── Organization Rulesets ────────────────────────────────────────────────────

async fn list_org_rulesets(
    client: &OctocrabClient,
    org: &OrgName,
) -> Result<GitHubResponse, GitHubApiError> {
    let mut all = Vec::new();

    for page in 1..=MAX_PAGES {
        let route = format!(
            "/orgs/{}/rulesets?per_page={}&page={}",
            org, PER_PAGE, page
        );
        let batch: Vec<RulesetSummary> = client
            .inner()
            .get(&route, None::<&()>)
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let done = batch.len() < PER_PAGE as usize;
        all.extend(batch);
        if done {
            return Ok(GitHubResponse::OrgRulesets(all));
        }
    }

    tracing::warn!(org = %org, count = all.len(), "Ruleset listing hit the page limit");
    Ok(GitHubResponse::OrgRulesets(all))
}

/// Request body for creating or updating an organization ruleset.
///
/// `source` and `source_type` are omitted: GitHub derives them from the
/// endpoint. `id` goes in the URL instead.
#[derive(Debug, Serialize)]
pub(crate) struct RulesetRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<&'a str>,
    enforcement: Enforcement,
    #[serde(skip_serializing_if = "Option::is_none")]
    conditions: Option<&'a serde_json::Value>,
    rules: &'a [Rule],
    bypass_actors: &'a [BypassActor],
}

impl<'a> From<&'a RulesetDocument> for RulesetRequest<'a> {
    fn from(doc: &'a RulesetDocument) -> Self {
        RulesetRequest {
            name: &doc.name,
            target: doc.target.as_deref(),
            enforcement: doc.enforcement,
            conditions: doc.conditions.as_ref(),
            rules: &doc.rules,
            bypass_actors: &doc.bypass_actors,
        }
    }
}

async fn create_org_ruleset(
    client: &OctocrabClient,
    org: &OrgName,
    ruleset: &RulesetDocument,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = format!("/orgs/{}/rulesets", org);
    let body = RulesetRequest::from(ruleset);
    let created: RulesetSummary = client
        .inner()
        .post(&route, Some(&body))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::RulesetApplied { id: created.id })
}

async fn update_org_ruleset(
    client: &OctocrabClient,
    org: &OrgName,
    ruleset_id: RulesetId,
    ruleset: &RulesetDocument,
) -> Result<GitHubResponse, GitHubApiError> {
    let route = format!("/orgs/{}/rulesets/{}", org, ruleset_id);
    let body = RulesetRequest::from(ruleset);
    let updated: RulesetSummary = client
        .inner()
        .put(&route, Some(&body))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(GitHubResponse::RulesetApplied { id: updated.id })
}
