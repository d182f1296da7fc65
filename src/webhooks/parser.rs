//! Webhook payload parsing.
//!
//! The event type comes from the `X-GitHub-Event` header. Only `ruleset`
//! events are parsed; any other type yields `Ok(None)` and is ignored.
//! Payloads are deserialized into loose raw structures first so unknown
//! fields never break parsing, then validated into [`RulesetEvent`].
//!
//! `ruleset` deliveries that can never concern a managed organization
//! ruleset (unknown actions, repository rulesets, no organization) also
//! yield `Ok(None)`. Whether the sender is the app itself is left to the
//! caller, which knows the app's slug.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{Enforcement, InstallationId, OrgName, RulesetId};

use super::events::{EventRuleset, EventSender, RulesetAction, RulesetChanges, RulesetEvent};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Field has a value the bot doesn't understand.
    #[error("invalid field value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Parses a webhook payload.
///
/// Returns `Ok(None)` for event types and actions the bot doesn't handle.
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<RulesetEvent>, ParseError> {
    match event_type {
        "ruleset" => parse_ruleset(payload),
        _ => Ok(None),
    }
}

// ─── Raw payload ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawRulesetPayload {
    action: String,
    ruleset: RawRuleset,
    organization: Option<RawOrganization>,
    installation: Option<RawInstallation>,
    changes: Option<RawChanges>,
    sender: Option<RawSender>,
}

#[derive(Debug, Deserialize)]
struct RawRuleset {
    id: Option<u64>,
    name: String,
    enforcement: Option<String>,
    source_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOrganization {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawInstallation {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RawSender {
    login: String,
    #[serde(rename = "type")]
    sender_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChanges {
    name: Option<RawFrom>,
    enforcement: Option<RawFrom>,
}

#[derive(Debug, Deserialize)]
struct RawFrom {
    from: String,
}

fn parse_enforcement(field: &'static str, value: &str) -> Result<Enforcement, ParseError> {
    match value {
        "disabled" => Ok(Enforcement::Disabled),
        "active" => Ok(Enforcement::Active),
        "evaluate" => Ok(Enforcement::Evaluate),
        other => Err(ParseError::InvalidField {
            field,
            value: other.to_string(),
        }),
    }
}

fn parse_ruleset(payload: &[u8]) -> Result<Option<RulesetEvent>, ParseError> {
    let raw: RawRulesetPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "created" => RulesetAction::Created,
        "edited" => RulesetAction::Edited,
        "deleted" => RulesetAction::Deleted,
        other => {
            tracing::debug!(action = other, "Ignoring ruleset event action");
            return Ok(None);
        }
    };

    // Repository-level rulesets are delivered without an organization when
    // the repository belongs to a user account. Nothing to sync there.
    let Some(organization) = raw.organization else {
        tracing::debug!(ruleset = %raw.ruleset.name, "Ignoring ruleset event without organization");
        return Ok(None);
    };

    // Repository rulesets share names with organization rulesets but are
    // never managed by the bot.
    if raw.ruleset.source_type.as_deref() == Some("Repository") {
        tracing::debug!(ruleset = %raw.ruleset.name, "Ignoring repository ruleset event");
        return Ok(None);
    }

    let enforcement = raw
        .ruleset
        .enforcement
        .as_deref()
        .map(|e| parse_enforcement("ruleset.enforcement", e))
        .transpose()?;

    let changes = match raw.changes {
        Some(changes) => Some(RulesetChanges {
            name_from: changes.name.map(|n| n.from),
            enforcement_from: changes
                .enforcement
                .map(|e| parse_enforcement("changes.enforcement.from", &e.from))
                .transpose()?,
        }),
        None => None,
    };

    Ok(Some(RulesetEvent {
        action,
        organization: OrgName::new(organization.login),
        installation_id: raw.installation.map(|i| InstallationId(i.id)),
        ruleset: EventRuleset {
            id: raw.ruleset.id.map(RulesetId),
            name: raw.ruleset.name,
            enforcement,
            source_type: raw.ruleset.source_type,
        },
        changes,
        sender: raw.sender.map(|s| EventSender {
            login: s.login,
            sender_type: s.sender_type,
        }),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDITED: &str = r#"{
        "action": "edited",
        "ruleset": {
            "id": 21,
            "name": "protect-main",
            "target": "branch",
            "source_type": "Organization",
            "source": "target-org",
            "enforcement": "active",
            "node_id": "RRS_lACkVXNlcgQB",
            "_links": {"self": {"href": "https://api.github.com/orgs/target-org/rulesets/21"}}
        },
        "changes": {
            "name": {"from": "protect-main-old"},
            "enforcement": {"from": "evaluate"}
        },
        "organization": {"login": "target-org", "id": 2},
        "installation": {"id": 4242, "node_id": "MDIz"},
        "sender": {"login": "octocat", "id": 1, "type": "User"}
    }"#;

    #[test]
    fn parses_edited_ruleset_event() {
        let event = parse_webhook("ruleset", EDITED.as_bytes()).unwrap().unwrap();

        assert_eq!(event.action, RulesetAction::Edited);
        assert_eq!(event.organization, OrgName::new("target-org"));
        assert_eq!(event.installation_id, Some(InstallationId(4242)));
        assert_eq!(event.ruleset.id, Some(RulesetId(21)));
        assert_eq!(event.ruleset.name, "protect-main");
        assert_eq!(event.ruleset.enforcement, Some(Enforcement::Active));
        assert_eq!(
            event.changes,
            Some(RulesetChanges {
                name_from: Some("protect-main-old".to_string()),
                enforcement_from: Some(Enforcement::Evaluate),
            })
        );
        assert_eq!(
            event.sender,
            Some(EventSender {
                login: "octocat".to_string(),
                sender_type: Some("User".to_string()),
            })
        );
        assert!(!event.is_sent_by_app("ruleset-sync"));
    }

    #[test]
    fn edits_by_the_app_itself_are_recognized() {
        let payload = br#"{
            "action": "edited",
            "ruleset": {"id": 21, "name": "protect-main", "source_type": "Organization", "enforcement": "active"},
            "organization": {"login": "target-org"},
            "installation": {"id": 4242},
            "sender": {"login": "ruleset-sync[bot]", "id": 9001, "type": "Bot"}
        }"#;
        let event = parse_webhook("ruleset", payload).unwrap().unwrap();

        assert!(event.is_sent_by_app("ruleset-sync"));
        assert!(!event.is_sent_by_app("some-other-app"));
    }

    #[test]
    fn repository_rulesets_are_ignored() {
        let payload = br#"{
            "action": "edited",
            "ruleset": {"id": 3, "name": "protect-main", "source_type": "Repository", "source": "target-org/api"},
            "repository": {"name": "api"},
            "organization": {"login": "target-org"}
        }"#;
        assert!(parse_webhook("ruleset", payload).unwrap().is_none());
    }

    #[test]
    fn created_event_without_changes() {
        let payload = br#"{
            "action": "created",
            "ruleset": {"id": 5, "name": "protect-dev", "enforcement": "disabled"},
            "organization": {"login": "target-org"}
        }"#;
        let event = parse_webhook("ruleset", payload).unwrap().unwrap();

        assert_eq!(event.action, RulesetAction::Created);
        assert_eq!(event.ruleset.name, "protect-dev");
        assert_eq!(event.changes, None);
        assert_eq!(event.installation_id, None);
        assert_eq!(event.sender, None);
    }

    #[test]
    fn other_event_types_are_ignored() {
        assert!(parse_webhook("push", b"not even json").unwrap().is_none());
        assert!(parse_webhook("ping", br#"{"zen": "Keep it logically awesome."}"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn unknown_action_is_ignored() {
        let payload = br#"{
            "action": "archived",
            "ruleset": {"name": "protect-main"},
            "organization": {"login": "target-org"}
        }"#;
        assert!(parse_webhook("ruleset", payload).unwrap().is_none());
    }

    #[test]
    fn event_without_organization_is_ignored() {
        let payload = br#"{
            "action": "deleted",
            "ruleset": {"name": "protect-main"},
            "repository": {"name": "dotfiles", "owner": {"login": "octocat"}}
        }"#;
        assert!(parse_webhook("ruleset", payload).unwrap().is_none());
    }

    #[test]
    fn malformed_payloads_are_errors() {
        assert!(matches!(
            parse_webhook("ruleset", b"{"),
            Err(ParseError::JsonError(_))
        ));
        assert!(matches!(
            parse_webhook("ruleset", br#"{"action": "edited"}"#),
            Err(ParseError::JsonError(_))
        ));

        let bad_enforcement = br#"{
            "action": "edited",
            "ruleset": {"name": "protect-main", "enforcement": "sometimes"},
            "organization": {"login": "target-org"}
        }"#;
        match parse_webhook("ruleset", bad_enforcement) {
            Err(ParseError::InvalidField { field, value }) => {
                assert_eq!(field, "ruleset.enforcement");
                assert_eq!(value, "sometimes");
            }
            other => panic!("expected InvalidField, got {:?}", other),
        }
    }
}
