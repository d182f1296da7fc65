//! Rewriting of the organization-scoped IDs inside a ruleset.
//!
//! Two passes, run in this order by the pipeline:
//! - [`rewrite_rules`]: repository IDs inside `workflows` rules
//! - [`rewrite_bypass_actors`]: team and custom-role bypass actors
//!
//! Both mutate the document in place. A failing pass leaves the document
//! partially rewritten, so callers must discard it on error.

mod actors;
mod rules;

pub use actors::{MAX_RESERVED_ACTOR_ID, rewrite_bypass_actors, should_rewrite_actor};
pub use rules::rewrite_rules;

use thiserror::Error;

use crate::resolve::ResolveError;
use crate::types::{ActorId, RepositoryId};

/// Errors from rewriting a ruleset. Each carries the ruleset's name.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("ruleset {ruleset}: malformed workflows rule parameters")]
    Decode {
        ruleset: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("ruleset {ruleset}: failed to re-encode workflows rule parameters")]
    Encode {
        ruleset: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("ruleset {ruleset}: failed to resolve workflow repository {repository_id}")]
    Workflow {
        ruleset: String,
        repository_id: RepositoryId,
        #[source]
        source: ResolveError,
    },

    #[error("ruleset {ruleset}: failed to resolve team bypass actor {actor_id}")]
    TeamActor {
        ruleset: String,
        actor_id: ActorId,
        #[source]
        source: ResolveError,
    },

    #[error("ruleset {ruleset}: failed to resolve repository role bypass actor {actor_id}")]
    RoleActor {
        ruleset: String,
        actor_id: ActorId,
        #[source]
        source: ResolveError,
    },
}

impl ProcessError {
    /// The underlying resolution error, if any.
    pub fn resolve_error(&self) -> Option<&ResolveError> {
        match self {
            ProcessError::Workflow { source, .. }
            | ProcessError::TeamActor { source, .. }
            | ProcessError::RoleActor { source, .. } => Some(source),
            ProcessError::Decode { .. } | ProcessError::Encode { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.resolve_error().is_some_and(ResolveError::is_cancelled)
    }
}
