//! Repository IDs in `workflows` rules.

use crate::auth::InstallationBroker;
use crate::effects::GitHubInterpreter;
use crate::github::GitHubApiError;
use crate::resolve::{EntityResolver, Resolution};
use crate::types::{Rule, RulesetDocument, WorkflowsParameters};

use super::ProcessError;

/// Points every workflow reference at the target organization's repository.
///
/// Rules of any other type are not touched. The first failure aborts.
pub async fn rewrite_rules<T, B>(
    resolver: &EntityResolver<'_, T, B>,
    ruleset: &mut RulesetDocument,
) -> Result<(), ProcessError>
where
    T: GitHubInterpreter<Error = GitHubApiError> + Sync,
    B: InstallationBroker + Sync,
    B::Client: Sync,
{
    let name = &ruleset.name;

    for rule in ruleset.rules.iter_mut() {
        let Rule::Workflows { parameters } = rule else {
            continue;
        };

        let mut decoded =
            WorkflowsParameters::decode(parameters).map_err(|source| ProcessError::Decode {
                ruleset: name.clone(),
                source,
            })?;

        for workflow in decoded.workflows.iter_mut() {
            let source_id = workflow.repository_id;
            let resolution = resolver
                .resolve_repository(source_id)
                .await
                .map_err(|source| ProcessError::Workflow {
                    ruleset: name.clone(),
                    repository_id: source_id,
                    source,
                })?;

            if let Resolution::Resolved(identity) = resolution {
                tracing::debug!(
                    ruleset = %name,
                    repository = %identity.name,
                    from = %source_id,
                    to = %identity.id,
                    "Rewrote workflow repository"
                );
                workflow.repository_id = identity.id;
            }
        }

        *parameters = decoded.encode().map_err(|source| ProcessError::Encode {
            ruleset: name.clone(),
            source,
        })?;
    }

    Ok(())
}
