//! Bypass actors.
//!
//! Team and custom repository role actors are translated by name. Low IDs
//! denote GitHub's built-in roles, which are the same in every organization,
//! and are left alone along with integrations and anything unrecognised.

use crate::auth::InstallationBroker;
use crate::effects::GitHubInterpreter;
use crate::github::GitHubApiError;
use crate::resolve::{EntityResolver, Resolution};
use crate::types::{ActorId, ActorType, BypassActor, RoleId, RulesetDocument, TeamId};

use super::ProcessError;

/// Highest actor ID reserved for built-in roles.
pub const MAX_RESERVED_ACTOR_ID: u64 = 5;

/// Whether an actor's ID is organization-scoped and needs translating.
pub fn should_rewrite_actor(actor: &BypassActor) -> bool {
    let id = actor.id().0;
    id != 0 && id > MAX_RESERVED_ACTOR_ID
}

/// Translates team and custom-role bypass actors, in order.
///
/// A team missing from the target aborts the ruleset. A role missing from
/// the target leaves that actor unchanged.
pub async fn rewrite_bypass_actors<T, B>(
    resolver: &EntityResolver<'_, T, B>,
    ruleset: &mut RulesetDocument,
) -> Result<(), ProcessError>
where
    T: GitHubInterpreter<Error = GitHubApiError> + Sync,
    B: InstallationBroker + Sync,
    B::Client: Sync,
{
    let name = &ruleset.name;
    let source_org = &ruleset.source;

    for actor in ruleset.bypass_actors.iter_mut() {
        if !should_rewrite_actor(actor) {
            continue;
        }
        let actor_id = actor.id();

        match &actor.actor_type {
            ActorType::Team => {
                let resolution = resolver
                    .resolve_team(source_org, TeamId(actor_id.0))
                    .await
                    .map_err(|source| ProcessError::TeamActor {
                        ruleset: name.clone(),
                        actor_id,
                        source,
                    })?;
                if let Resolution::Resolved(team) = resolution {
                    tracing::info!(ruleset = %name, team = %team.name, from = %actor_id, to = %team.id, "Rewrote team bypass actor");
                    actor.actor_id = Some(ActorId::from(team.id));
                }
            }
            ActorType::RepositoryRole => {
                let resolution = resolver
                    .resolve_custom_role(source_org, RoleId(actor_id.0))
                    .await
                    .map_err(|source| ProcessError::RoleActor {
                        ruleset: name.clone(),
                        actor_id,
                        source,
                    })?;
                match resolution {
                    Resolution::Resolved(role) => {
                        tracing::info!(ruleset = %name, role = %role.name, from = %actor_id, to = %role.id, "Rewrote repository role bypass actor");
                        actor.actor_id = Some(ActorId::from(role.id));
                    }
                    Resolution::Unresolved { name: role } => {
                        tracing::info!(
                            ruleset = %name,
                            role = %role,
                            org = %resolver.target_org(),
                            "Repository role missing in target, leaving bypass actor unchanged"
                        );
                    }
                }
            }
            ActorType::Integration => {
                tracing::debug!(ruleset = %name, actor_id = %actor_id, "Skipping integration bypass actor");
            }
            other => {
                tracing::warn!(ruleset = %name, actor_id = %actor_id, actor_type = %other, "Unhandled actor type");
            }
        }
    }

    Ok(())
}
