//! The ruleset sync pipeline.
//!
//! For an inbound `ruleset` event:
//! 1. Load every definition from the [`RulesetStore`]
//! 2. Keep the ones [`is_managed`] by the event (same ruleset name)
//! 3. Translate each one's IDs into the event organization's ID space
//! 4. Create or update the ruleset in that organization
//!
//! Definitions are handled one at a time. A failing definition is logged and
//! recorded in the [`SyncReport`]; the rest still sync.
//!
//! Every write the bot makes produces another `ruleset` event. When the
//! pipeline knows the app's slug, events sent by the app's own bot account
//! are dropped so a write never triggers a further sync.

mod apply;
mod store;

pub use apply::{ApplyOutcome, apply_ruleset};
pub use store::{RulesetStore, StoreError, load_definition};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::{AuthError, InstallationBroker};
use crate::directory::{Directory, DirectoryError};
use crate::effects::GitHubInterpreter;
use crate::github::GitHubApiError;
use crate::resolve::EntityResolver;
use crate::rewrite::{ProcessError, rewrite_bypass_actors, rewrite_rules};
use crate::types::{OrgName, RulesetDocument, RulesetId};
use crate::webhooks::RulesetEvent;

/// Errors from syncing definitions.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("failed to apply ruleset {ruleset} to {org}: {source}")]
    Apply {
        ruleset: String,
        org: OrgName,
        #[source]
        source: DirectoryError,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            SyncError::Cancelled => true,
            SyncError::Process(e) => e.is_cancelled(),
            SyncError::Apply { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Whether `document` is the definition for the event's ruleset.
///
/// Names are compared exactly (case-sensitive).
pub fn is_managed(event: &RulesetEvent, document: &RulesetDocument) -> bool {
    let managed = document.name == event.ruleset.name;
    if managed {
        info!(ruleset = %document.name, "Ruleset is managed");
    } else {
        info!(
            ruleset = %document.name,
            event_ruleset = %event.ruleset.name,
            "Ruleset is not managed by this event"
        );
    }
    managed
}

/// Translates definitions into one target organization.
pub struct RulesetProcessor<'a, T, B> {
    resolver: EntityResolver<'a, T, B>,
}

impl<'a, T, B> RulesetProcessor<'a, T, B>
where
    T: GitHubInterpreter<Error = GitHubApiError> + Sync,
    B: InstallationBroker + Sync,
    B::Client: Sync,
{
    pub fn new(resolver: EntityResolver<'a, T, B>) -> Self {
        RulesetProcessor { resolver }
    }

    /// Rewrites workflow rules, then bypass actors.
    ///
    /// On error the partially rewritten document is dropped.
    pub async fn process(&self, document: RulesetDocument) -> Result<RulesetDocument, ProcessError> {
        let mut document = document;
        rewrite_rules(&self.resolver, &mut document).await?;
        rewrite_bypass_actors(&self.resolver, &mut document).await?;
        Ok(document)
    }
}

/// A definition that was written to the target organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRuleset {
    pub name: String,
    pub outcome: ApplyOutcome,
}

/// A definition that could not be synced.
#[derive(Debug)]
pub struct FailedRuleset {
    /// The ruleset name, or the file name if the file could not be decoded.
    pub name: String,
    pub error: SyncError,
}

/// Outcome of syncing one event.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub applied: Vec<AppliedRuleset>,
    /// Names of definitions not managed by the event.
    pub skipped: Vec<String>,
    pub failed: Vec<FailedRuleset>,
}

impl SyncReport {
    /// Whether every managed definition was applied and every file was
    /// readable.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// IDs of the rulesets written, in definition order.
    pub fn applied_ids(&self) -> Vec<RulesetId> {
        self.applied.iter().map(|a| a.outcome.id()).collect()
    }
}

/// Syncs definitions from a store using installation clients from a broker.
pub struct Pipeline<B> {
    store: RulesetStore,
    broker: B,
    /// Slug of the GitHub App the bot runs as. Events it sent are ignored.
    app_slug: Option<String>,
}

impl<B> Pipeline<B>
where
    B: InstallationBroker + Sync,
    B::Client: Sync,
{
    /// Creates a pipeline reading definitions from `store` and minting
    /// installation clients from `broker`.
    pub fn new(store: RulesetStore, broker: B) -> Self {
        Pipeline {
            store,
            broker,
            app_slug: None,
        }
    }

    /// Ignores events sent by the app with this slug.
    pub fn with_app_slug(mut self, app_slug: impl Into<String>) -> Self {
        self.app_slug = Some(app_slug.into());
        self
    }

    /// The definition store this pipeline reads.
    pub fn store(&self) -> &RulesetStore {
        &self.store
    }

    /// Syncs every definition managed by `event` into the event's organization.
    ///
    /// Events sent by the app itself yield an empty report.
    ///
    /// The target client is minted from the event's installation when the
    /// delivery names one, and looked up by organization otherwise.
    ///
    /// Returns `Err` only when nothing could be attempted: the definition
    /// directory is unreadable, the target installation is unavailable, or
    /// the sync was cancelled.
    #[instrument(
        skip(self, event, cancel),
        fields(org = %event.organization, ruleset = %event.ruleset.name, action = %event.action)
    )]
    pub async fn sync_event(
        &self,
        event: &RulesetEvent,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        if let Some(app_slug) = &self.app_slug
            && event.is_sent_by_app(app_slug)
        {
            debug!(app_slug = %app_slug, "Ignoring ruleset change made by this app");
            return Ok(SyncReport::default());
        }

        if let Some(changes) = event.changes.as_ref().filter(|c| !c.is_empty()) {
            info!(
                name_from = changes.name_from.as_deref().unwrap_or("-"),
                enforcement_from = ?changes.enforcement_from,
                "Ruleset changed"
            );
        }

        let mut report = SyncReport::default();
        let mut managed = Vec::new();

        for candidate in self.store.load_candidates()? {
            match candidate {
                Ok(document) if is_managed(event, &document) => managed.push(document),
                Ok(document) => report.skipped.push(document.name),
                Err(e) => {
                    warn!(file = %e.file().display(), error = %e, "Skipping unreadable definition");
                    report.failed.push(FailedRuleset {
                        name: e.file().display().to_string(),
                        error: e.into(),
                    });
                }
            }
        }

        if managed.is_empty() {
            return Ok(report);
        }

        let target_org = &event.organization;
        let target = match event.installation_id {
            Some(installation_id) => {
                self.broker
                    .installation_client_by_id(target_org, installation_id)
                    .await?
            }
            None => self.broker.installation_client(target_org).await?,
        };
        let resolver = EntityResolver::new(&target, target_org, &self.broker, cancel);
        let processor = RulesetProcessor::new(resolver);
        let directory = Directory::new(&target, cancel);

        for document in managed {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let name = document.name.clone();
            match sync_one(&processor, &directory, target_org, document).await {
                Ok(outcome) => report.applied.push(AppliedRuleset { name, outcome }),
                Err(e) if e.is_cancelled() => return Err(SyncError::Cancelled),
                Err(e) => {
                    error!(ruleset = %name, error = %e, "Failed to sync ruleset");
                    report.failed.push(FailedRuleset { name, error: e });
                }
            }
        }

        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Sync finished"
        );
        Ok(report)
    }
}

async fn sync_one<T, B>(
    processor: &RulesetProcessor<'_, T, B>,
    directory: &Directory<'_, T>,
    org: &OrgName,
    document: RulesetDocument,
) -> Result<ApplyOutcome, SyncError>
where
    T: GitHubInterpreter<Error = GitHubApiError> + Sync,
    B: InstallationBroker + Sync,
    B::Client: Sync,
{
    let translated = processor.process(document).await?;
    apply_ruleset(directory, org, &translated)
        .await
        .map_err(|source| SyncError::Apply {
            ruleset: translated.name.clone(),
            org: org.clone(),
            source,
        })
}
