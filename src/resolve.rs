//! Cross-organization identity translation.
//!
//! An entity ID is only meaningful inside the organization that issued it.
//! Translation joins on the entity's stable name: look the ID up in the
//! source organization to learn the name, then look the name up in the
//! target organization to learn its ID there.
//!
//! Whether a miss in the target is an error depends on the kind of entity,
//! see [`EntityKind::not_found_policy`].

use std::fmt;
use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::auth::{AuthError, InstallationBroker};
use crate::directory::{Directory, DirectoryError};
use crate::effects::GitHubInterpreter;
use crate::github::GitHubApiError;
use crate::types::{OrgName, RepositoryId, RoleId, TeamId};

/// The kinds of entity whose IDs are translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Repository,
    Team,
    CustomRole,
}

impl EntityKind {
    /// What to do when the entity has no counterpart in the target organization.
    pub fn not_found_policy(self) -> NotFoundPolicy {
        match self {
            EntityKind::Repository | EntityKind::Team => NotFoundPolicy::Fail,
            EntityKind::CustomRole => NotFoundPolicy::Ignore,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Repository => "repository",
            EntityKind::Team => "team",
            EntityKind::CustomRole => "custom repository role",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handling of a name that does not exist in the target organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Fail the translation with [`ResolveError::NotFoundInTarget`].
    Fail,
    /// Report [`Resolution::Unresolved`] and let the caller leave the reference alone.
    Ignore,
}

/// An entity located in the target organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity<Id> {
    /// Stable name shared by both organizations (repository name, team slug, role name).
    pub name: String,
    /// The entity's ID in the target organization.
    pub id: Id,
}

/// Outcome of a translation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<Id> {
    Resolved(ResolvedIdentity<Id>),
    /// The target has no entity with this name and the policy is `Ignore`.
    Unresolved { name: String },
}

impl<Id: Copy> Resolution<Id> {
    /// The target ID, if one was found.
    pub fn id(&self) -> Option<Id> {
        match self {
            Resolution::Resolved(identity) => Some(identity.id),
            Resolution::Unresolved { .. } => None,
        }
    }
}

/// Errors from translating an entity reference.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{kind} {key} not found in source organization")]
    NotFoundInSource { kind: EntityKind, key: String },

    #[error("{kind} {name:?} not found in organization {org}")]
    NotFoundInTarget {
        kind: EntityKind,
        name: String,
        org: OrgName,
    },

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ResolveError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResolveError::Directory(e) if e.is_cancelled())
    }
}

/// Translates one entity reference from the source to the target organization.
///
/// `name_in_source` yields the entity's stable name (or `None` if the source
/// has no such entity). `id_in_target` is then called with that name.
pub async fn translate<Id, N, F, Fut>(
    kind: EntityKind,
    policy: NotFoundPolicy,
    source_key: &str,
    target_org: &OrgName,
    name_in_source: N,
    id_in_target: F,
) -> Result<Resolution<Id>, ResolveError>
where
    N: Future<Output = Result<Option<String>, ResolveError>>,
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<Option<Id>, ResolveError>>,
{
    let Some(name) = name_in_source.await? else {
        return Err(ResolveError::NotFoundInSource {
            kind,
            key: source_key.to_string(),
        });
    };

    match id_in_target(name.clone()).await? {
        Some(id) => Ok(Resolution::Resolved(ResolvedIdentity { name, id })),
        None => match policy {
            NotFoundPolicy::Fail => Err(ResolveError::NotFoundInTarget {
                kind,
                name,
                org: target_org.clone(),
            }),
            NotFoundPolicy::Ignore => {
                tracing::debug!(%kind, name = %name, org = %target_org, "No counterpart in target, leaving reference");
                Ok(Resolution::Unresolved { name })
            }
        },
    }
}

/// Resolves source-organization references into `target_org`.
///
/// `target` is authorized for the target organization. Source-side reads
/// for teams and roles go through a client minted from `broker` for the
/// duration of a single resolution.
pub struct EntityResolver<'a, T, B> {
    target: &'a T,
    target_org: &'a OrgName,
    broker: &'a B,
    cancel: &'a CancellationToken,
}

impl<'a, T, B> EntityResolver<'a, T, B>
where
    T: GitHubInterpreter<Error = GitHubApiError> + Sync,
    B: InstallationBroker + Sync,
    B::Client: Sync,
{
    /// Creates a resolver into `target_org`.
    ///
    /// `target` must be authorized for `target_org`; `broker` must be able to
    /// mint clients for every source organization definitions name.
    pub fn new(
        target: &'a T,
        target_org: &'a OrgName,
        broker: &'a B,
        cancel: &'a CancellationToken,
    ) -> Self {
        EntityResolver {
            target,
            target_org,
            broker,
            cancel,
        }
    }

    /// The organization references are translated into.
    pub fn target_org(&self) -> &OrgName {
        self.target_org
    }

    async fn source_client(&self, source_org: &OrgName) -> Result<B::Client, ResolveError> {
        if self.cancel.is_cancelled() {
            return Err(DirectoryError::Cancelled.into());
        }
        Ok(self.broker.installation_client(source_org).await?)
    }

    /// Translates a repository ID. Both hops use the target client: the
    /// by-ID lookup is global, so any installation can read the name.
    pub async fn resolve_repository(
        &self,
        source_id: RepositoryId,
    ) -> Result<Resolution<RepositoryId>, ResolveError> {
        let kind = EntityKind::Repository;
        let directory = &Directory::new(self.target, self.cancel);

        translate(
            kind,
            kind.not_found_policy(),
            &source_id.to_string(),
            self.target_org,
            async { Ok::<_, ResolveError>(directory.repository_name(source_id).await?) },
            |name| async move {
                Ok::<_, ResolveError>(directory.repository_id(self.target_org, &name).await?)
            },
        )
        .await
    }

    /// Translates a team ID by way of its slug.
    pub async fn resolve_team(
        &self,
        source_org: &OrgName,
        team_id: TeamId,
    ) -> Result<Resolution<TeamId>, ResolveError> {
        let kind = EntityKind::Team;
        let source = self.source_client(source_org).await?;
        let source_dir = &Directory::new(&source, self.cancel);
        let target_dir = &Directory::new(self.target, self.cancel);

        let slug_in_source = async {
            let Some(org_id) = source_dir.org_id(source_org).await? else {
                return Ok(None);
            };
            Ok::<_, ResolveError>(source_dir.team_slug(org_id, team_id).await?)
        };

        translate(
            kind,
            kind.not_found_policy(),
            &format!("{}/{}", source_org, team_id),
            self.target_org,
            slug_in_source,
            |slug| async move {
                Ok::<_, ResolveError>(target_dir.team_id(self.target_org, &slug).await?)
            },
        )
        .await
    }

    /// Translates a custom repository role ID by way of its name.
    pub async fn resolve_custom_role(
        &self,
        source_org: &OrgName,
        role_id: RoleId,
    ) -> Result<Resolution<RoleId>, ResolveError> {
        let kind = EntityKind::CustomRole;
        let source = self.source_client(source_org).await?;
        let source_dir = &Directory::new(&source, self.cancel);
        let target_dir = &Directory::new(self.target, self.cancel);

        translate(
            kind,
            kind.not_found_policy(),
            &format!("{}/{}", source_org, role_id),
            self.target_org,
            async { Ok::<_, ResolveError>(source_dir.role_name(source_org, role_id).await?) },
            |name| async move {
                Ok::<_, ResolveError>(target_dir.role_id(self.target_org, &name).await?)
            },
        )
        .await
    }
}
