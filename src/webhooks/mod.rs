//! Inbound GitHub webhooks: signature verification and `ruleset` event parsing.

pub mod events;
pub mod parser;
pub mod signature;

pub use events::{EventRuleset, EventSender, RulesetAction, RulesetChanges, RulesetEvent};
pub use parser::{ParseError, parse_webhook};
#[cfg(test)]
pub use signature::sign_payload;
pub use signature::{parse_signature_header, verify_signature};
