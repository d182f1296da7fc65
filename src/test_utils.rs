//! Shared test fixtures: in-memory GitHub organizations and arbitrary generators.
//!
//! `FakeGitHub` answers `GitHubEffect`s from a set of `FakeOrg`s and records
//! every effect it sees. `FakeBroker` hands out clones of one `FakeGitHub`
//! for the organizations it considers installed.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use crate::auth::{AuthError, InstallationBroker};
use crate::effects::{
    CustomRoleData, GitHubEffect, GitHubInterpreter, GitHubResponse, OrganizationData,
    RepositoryData, RulesetSummary, TeamData,
};
use crate::github::GitHubApiError;
use crate::types::{
    ActorType, BypassActor, InstallationId, OrgId, OrgName, RepositoryId, RoleId,
    RulesetDocument, RulesetId, TeamId,
};

/// An organization's directory contents.
#[derive(Debug, Clone)]
pub struct FakeOrg {
    pub login: String,
    pub id: u64,
    pub repos: Vec<(u64, String)>,
    pub teams: Vec<(u64, String)>,
    pub roles: Vec<(u64, String)>,
    pub rulesets: Vec<(u64, RulesetDocument)>,
}

impl FakeOrg {
    pub fn new(login: &str, id: u64) -> Self {
        FakeOrg {
            login: login.to_string(),
            id,
            repos: Vec::new(),
            teams: Vec::new(),
            roles: Vec::new(),
            rulesets: Vec::new(),
        }
    }

    pub fn with_repo(mut self, id: u64, name: &str) -> Self {
        self.repos.push((id, name.to_string()));
        self
    }

    pub fn with_team(mut self, id: u64, slug: &str) -> Self {
        self.teams.push((id, slug.to_string()));
        self
    }

    pub fn with_role(mut self, id: u64, name: &str) -> Self {
        self.roles.push((id, name.to_string()));
        self
    }

    pub fn with_ruleset(mut self, id: u64, ruleset: RulesetDocument) -> Self {
        self.rulesets.push((id, ruleset));
        self
    }

    fn repository(&self, id: u64, name: &str) -> RepositoryData {
        RepositoryData {
            id: RepositoryId(id),
            name: name.to_string(),
            full_name: format!("{}/{}", self.login, name),
        }
    }

    fn team(&self, id: u64, slug: &str) -> TeamData {
        TeamData {
            id: TeamId(id),
            slug: slug.to_string(),
            name: slug.to_string(),
        }
    }
}

struct FakeState {
    orgs: Mutex<Vec<FakeOrg>>,
    effects: Mutex<Vec<GitHubEffect>>,
    failure: Option<String>,
    next_ruleset_id: AtomicUsize,
}

/// An in-memory GitHub answering effects from fake organizations.
#[derive(Clone)]
pub struct FakeGitHub {
    state: Arc<FakeState>,
}

impl Default for FakeGitHub {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGitHub {
    pub fn new() -> Self {
        FakeGitHub {
            state: Arc::new(FakeState {
                orgs: Mutex::new(Vec::new()),
                effects: Mutex::new(Vec::new()),
                failure: None,
                next_ruleset_id: AtomicUsize::new(1000),
            }),
        }
    }

    pub fn with_org(self, org: FakeOrg) -> Self {
        self.state.orgs.lock().unwrap().push(org);
        self
    }

    /// Makes every call fail with a permanent error carrying `message`.
    pub fn failing_with(self, message: &str) -> Self {
        let orgs = self.state.orgs.lock().unwrap().clone();
        FakeGitHub {
            state: Arc::new(FakeState {
                orgs: Mutex::new(orgs),
                effects: Mutex::new(Vec::new()),
                failure: Some(message.to_string()),
                next_ruleset_id: AtomicUsize::new(1000),
            }),
        }
    }

    /// Number of effects interpreted so far.
    pub fn calls(&self) -> usize {
        self.state.effects.lock().unwrap().len()
    }

    /// Every effect interpreted so far, in order.
    pub fn effects(&self) -> Vec<GitHubEffect> {
        self.state.effects.lock().unwrap().clone()
    }

    /// The rulesets currently held by `org`.
    pub fn rulesets(&self, org: &str) -> Vec<(u64, RulesetDocument)> {
        self.state
            .orgs
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.login == org)
            .map(|o| o.rulesets.clone())
            .unwrap_or_default()
    }

    fn answer(&self, effect: GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
        if let Some(message) = &self.state.failure {
            return Err(GitHubApiError::permanent_without_source(message.clone()));
        }

        let mut orgs = self.state.orgs.lock().unwrap();
        let find = |orgs: &[FakeOrg], login: &OrgName| -> Option<usize> {
            orgs.iter().position(|o| o.login == login.as_str())
        };

        let response = match effect {
            GitHubEffect::GetRepositoryById { repository_id } => {
                let repo = orgs.iter().find_map(|o| {
                    o.repos
                        .iter()
                        .find(|(id, _)| *id == repository_id.0)
                        .map(|(id, name)| o.repository(*id, name))
                });
                GitHubResponse::Repository(repo)
            }
            GitHubEffect::GetRepository { org, name } => {
                let repo = find(&orgs, &org).and_then(|i| {
                    let o = &orgs[i];
                    o.repos
                        .iter()
                        .find(|(_, n)| *n == name)
                        .map(|(id, n)| o.repository(*id, n))
                });
                GitHubResponse::Repository(repo)
            }
            GitHubEffect::GetOrganization { org } => {
                let data = find(&orgs, &org).map(|i| OrganizationData {
                    id: OrgId(orgs[i].id),
                    login: orgs[i].login.clone(),
                });
                GitHubResponse::Organization(data)
            }
            GitHubEffect::GetTeamById { org_id, team_id } => {
                let team = orgs.iter().find(|o| o.id == org_id.0).and_then(|o| {
                    o.teams
                        .iter()
                        .find(|(id, _)| *id == team_id.0)
                        .map(|(id, slug)| o.team(*id, slug))
                });
                GitHubResponse::Team(team)
            }
            GitHubEffect::GetTeamBySlug { org, slug } => {
                let team = find(&orgs, &org).and_then(|i| {
                    let o = &orgs[i];
                    o.teams
                        .iter()
                        .find(|(_, s)| *s == slug)
                        .map(|(id, s)| o.team(*id, s))
                });
                GitHubResponse::Team(team)
            }
            GitHubEffect::ListCustomRepoRoles { org } => {
                let i = find(&orgs, &org).ok_or_else(|| not_found(&org))?;
                let roles = orgs[i]
                    .roles
                    .iter()
                    .map(|(id, name)| CustomRoleData {
                        id: RoleId(*id),
                        name: name.clone(),
                    })
                    .collect();
                GitHubResponse::CustomRepoRoles(roles)
            }
            GitHubEffect::ListOrgRulesets { org } => {
                let i = find(&orgs, &org).ok_or_else(|| not_found(&org))?;
                let rulesets = orgs[i]
                    .rulesets
                    .iter()
                    .map(|(id, doc)| RulesetSummary {
                        id: RulesetId(*id),
                        name: doc.name.clone(),
                    })
                    .collect();
                GitHubResponse::OrgRulesets(rulesets)
            }
            GitHubEffect::CreateOrgRuleset { org, ruleset } => {
                let i = find(&orgs, &org).ok_or_else(|| not_found(&org))?;
                let id = self.state.next_ruleset_id.fetch_add(1, Ordering::SeqCst) as u64;
                orgs[i].rulesets.push((id, *ruleset));
                GitHubResponse::RulesetApplied { id: RulesetId(id) }
            }
            GitHubEffect::UpdateOrgRuleset {
                org,
                ruleset_id,
                ruleset,
            } => {
                let i = find(&orgs, &org).ok_or_else(|| not_found(&org))?;
                let slot = orgs[i]
                    .rulesets
                    .iter_mut()
                    .find(|(id, _)| *id == ruleset_id.0)
                    .ok_or_else(|| not_found(&org))?;
                slot.1 = *ruleset;
                GitHubResponse::RulesetApplied { id: ruleset_id }
            }
        };

        Ok(response)
    }
}

fn not_found(org: &OrgName) -> GitHubApiError {
    let mut err = GitHubApiError::permanent_without_source(format!("Not Found: {}", org));
    err.status_code = Some(404);
    err
}

impl GitHubInterpreter for FakeGitHub {
    type Error = GitHubApiError;

    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send {
        self.state.effects.lock().unwrap().push(effect.clone());
        let result = self.answer(effect);
        async move { result }
    }
}

/// A broker handing out the same `FakeGitHub` for every installed organization.
///
/// Records which organizations had their installation looked up and which
/// installation IDs were used directly.
pub struct FakeBroker {
    github: FakeGitHub,
    installed: HashSet<String>,
    minted: AtomicUsize,
    lookups: Mutex<Vec<String>>,
    by_id: Mutex<Vec<InstallationId>>,
}

impl FakeBroker {
    pub fn new(github: FakeGitHub, installed: &[&str]) -> Self {
        FakeBroker {
            github,
            installed: installed.iter().map(|s| s.to_string()).collect(),
            minted: AtomicUsize::new(0),
            lookups: Mutex::new(Vec::new()),
            by_id: Mutex::new(Vec::new()),
        }
    }

    /// Number of installation clients handed out so far.
    pub fn minted(&self) -> usize {
        self.minted.load(Ordering::SeqCst)
    }

    /// Organizations whose installation was looked up, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    /// Installation IDs clients were minted from directly, in call order.
    pub fn minted_by_id(&self) -> Vec<InstallationId> {
        self.by_id.lock().unwrap().clone()
    }

    fn mint(&self, org: &OrgName) -> Result<FakeGitHub, AuthError> {
        if self.installed.contains(org.as_str()) {
            self.minted.fetch_add(1, Ordering::SeqCst);
            Ok(self.github.clone())
        } else {
            Err(AuthError::NotInstalled(org.clone()))
        }
    }
}

impl InstallationBroker for FakeBroker {
    type Client = FakeGitHub;

    fn installation_client(
        &self,
        org: &OrgName,
    ) -> impl Future<Output = Result<FakeGitHub, AuthError>> + Send {
        self.lookups.lock().unwrap().push(org.to_string());
        let result = self.mint(org);
        async move { result }
    }

    fn installation_client_by_id(
        &self,
        org: &OrgName,
        installation_id: InstallationId,
    ) -> impl Future<Output = Result<FakeGitHub, AuthError>> + Send {
        self.by_id.lock().unwrap().push(installation_id);
        let result = self.mint(org);
        async move { result }
    }
}

// ─── Arbitrary generators ─────────────────────────────────────────────────────

pub fn arb_actor_type() -> impl Strategy<Value = ActorType> {
    prop_oneof![
        Just(ActorType::Team),
        Just(ActorType::RepositoryRole),
        Just(ActorType::Integration),
        Just(ActorType::OrganizationAdmin),
        Just(ActorType::DeployKey),
        "[A-Z][a-zA-Z]{2,15}".prop_map(ActorType::from),
    ]
}

pub fn arb_bypass_actor(ids: impl Strategy<Value = u64>) -> impl Strategy<Value = BypassActor> {
    (ids, arb_actor_type()).prop_map(|(id, actor_type)| BypassActor::new(id, actor_type))
}
