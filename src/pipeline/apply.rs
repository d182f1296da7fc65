//! Writing a translated ruleset to its organization.
//!
//! Organization rulesets are matched by name, the same key definitions are
//! managed by. The existing ruleset is replaced wholesale with `PUT`; fields
//! the definition leaves out are not merged from what GitHub had.

use crate::directory::{Directory, DirectoryError};
use crate::effects::GitHubInterpreter;
use crate::github::GitHubApiError;
use crate::types::{OrgName, RulesetDocument, RulesetId};

/// What applying a ruleset did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// No ruleset with the name existed; one was created with this ID.
    Created(RulesetId),
    /// The ruleset with this ID and the same name was replaced.
    Updated(RulesetId),
}

impl ApplyOutcome {
    /// The ID of the ruleset as it now exists in the organization.
    pub fn id(self) -> RulesetId {
        match self {
            ApplyOutcome::Created(id) | ApplyOutcome::Updated(id) => id,
        }
    }
}

/// Creates the ruleset in `org`, or replaces the one with the same name.
///
/// Lists every ruleset in `org` (all pages) and compares names exactly. If
/// several share the name, the first listed is updated.
pub async fn apply_ruleset<G>(
    directory: &Directory<'_, G>,
    org: &OrgName,
    ruleset: &RulesetDocument,
) -> Result<ApplyOutcome, DirectoryError>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    let existing = directory
        .org_rulesets(org)
        .await?
        .into_iter()
        .find(|summary| summary.name == ruleset.name);

    match existing {
        Some(summary) => {
            let id = directory.update_ruleset(org, summary.id, ruleset).await?;
            tracing::info!(org = %org, ruleset = %ruleset.name, id = %id, "Updated organization ruleset");
            Ok(ApplyOutcome::Updated(id))
        }
        None => {
            let id = directory.create_ruleset(org, ruleset).await?;
            tracing::info!(org = %org, ruleset = %ruleset.name, id = %id, "Created organization ruleset");
            Ok(ApplyOutcome::Created(id))
        }
    }
}
