//! Ruleset Sync Bot - keeps an organization's rulesets in sync with
//! definitions written against another organization.
//!
//! Definitions reference teams, custom repository roles and workflow
//! repositories by numeric ID in their source organization. On every
//! `ruleset` webhook the bot translates those IDs into the receiving
//! organization's ID space, joining on name, and writes the result.

pub mod auth;
pub mod config;
pub mod directory;
pub mod effects;
pub mod github;
pub mod pipeline;
pub mod resolve;
pub mod rewrite;
pub mod server;
pub mod types;
pub mod webhooks;
pub mod worker;

#[cfg(test)]
pub mod test_utils;
