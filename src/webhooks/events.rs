//! Typed `ruleset` webhook events.
//!
//! GitHub sends a `ruleset` event whenever an organization or repository
//! ruleset is created, edited or deleted. The bot only needs the ruleset's
//! name (to find a managed definition), the organization it lives in (the
//! organization definitions are applied to) and who made the change.
//!
//! The bot's own writes come back as `ruleset` events too. Their sender is
//! the app's bot account, `<app-slug>[bot]`; see [`RulesetEvent::is_sent_by_app`].

use serde::{Deserialize, Serialize};

use crate::types::{Enforcement, InstallationId, OrgName, RulesetId};

/// What happened to the ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulesetAction {
    Created,
    Edited,
    Deleted,
}

impl std::fmt::Display for RulesetAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RulesetAction::Created => "created",
            RulesetAction::Edited => "edited",
            RulesetAction::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// A ruleset was created, edited or deleted in an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetEvent {
    pub action: RulesetAction,

    /// The organization the ruleset belongs to. Synced definitions are
    /// applied here.
    pub organization: OrgName,

    /// The app installation that received the delivery.
    pub installation_id: Option<InstallationId>,

    pub ruleset: EventRuleset,

    /// Previous values of edited fields. Only present on `edited`.
    pub changes: Option<RulesetChanges>,

    /// The account that made the change.
    pub sender: Option<EventSender>,
}

impl RulesetEvent {
    /// Whether the change was made by the GitHub App with slug `app_slug`.
    ///
    /// An app acts as the account `<app-slug>[bot]` of type `Bot`. A sender
    /// without a type is matched on login alone.
    pub fn is_sent_by_app(&self, app_slug: &str) -> bool {
        self.sender
            .as_ref()
            .is_some_and(|sender| sender.is_app(app_slug))
    }
}

/// The account that triggered a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSender {
    pub login: String,
    /// `User`, `Bot` or `Organization`.
    pub sender_type: Option<String>,
}

impl EventSender {
    /// Whether this is the bot account of the app with slug `app_slug`.
    pub fn is_app(&self, app_slug: &str) -> bool {
        let is_bot = self.sender_type.as_deref().is_none_or(|t| t == "Bot");
        is_bot
            && self
                .login
                .strip_suffix("[bot]")
                .is_some_and(|slug| slug == app_slug)
    }
}

/// The fields of the event's ruleset the bot looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRuleset {
    pub id: Option<RulesetId>,
    pub name: String,
    pub enforcement: Option<Enforcement>,
    /// `Organization` or `Repository`. The parser drops `Repository`
    /// events, so this is `Organization` or absent.
    pub source_type: Option<String>,
}

/// Previous values of a ruleset's renamed or re-enforced fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetChanges {
    pub name_from: Option<String>,
    pub enforcement_from: Option<Enforcement>,
}

impl RulesetChanges {
    pub fn is_empty(&self) -> bool {
        self.name_from.is_none() && self.enforcement_from.is_none()
    }
}
