//! Octocrab client wrapper.
//!
//! `OctocrabClient` wraps an `Octocrab` instance authorized for one
//! organization's app installation. Unlike effects,
//! which name the organization they target, the client records which
//! organization its credentials belong to so logs can tell the source-org
//! and target-org clients apart.

use octocrab::Octocrab;

use super::retry::RetryConfig;
use crate::types::OrgName;

/// A GitHub API client authorized for one organization.
#[derive(Clone)]
pub struct OctocrabClient {
    /// The underlying octocrab client.
    client: Octocrab,

    /// The organization whose installation issued the credentials.
    installed_on: OrgName,

    retry_config: RetryConfig,
}

impl OctocrabClient {
    /// Creates a new client for the given organization.
    pub fn new(client: Octocrab, installed_on: OrgName) -> Self {
        Self {
            client,
            installed_on,
            retry_config: RetryConfig::DEFAULT,
        }
    }

    /// Returns a reference to the underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    /// Returns the organization these credentials belong to.
    pub fn installed_on(&self) -> &OrgName {
        &self.installed_on
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.retry_config
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("installed_on", &self.installed_on)
            .finish_non_exhaustive()
    }
}
