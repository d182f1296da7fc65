//! Installation-scoped credentials.
//!
//! Reading a source organization's teams and roles needs a client authorized
//! by the app's installation on that organization. The broker mints one on
//! request; callers hold it for a single operation and drop it afterwards,
//! so nothing credential-shaped lives for the lifetime of the process.

use std::future::Future;

use thiserror::Error;

use crate::effects::GitHubInterpreter;
use crate::github::GitHubApiError;
use crate::types::{InstallationId, OrgName};

/// Errors from minting installation credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The app private key could not be parsed.
    #[error("invalid GitHub App private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    /// The app-level (JWT) client could not be constructed.
    #[error("failed to build GitHub App client: {0}")]
    AppClient(#[source] octocrab::Error),

    /// The app has no installation on the organization.
    #[error("GitHub App is not installed on organization {0}")]
    NotInstalled(OrgName),

    /// Looking up the organization's installation failed.
    #[error("failed to get app installation for organization {org}: {source}")]
    InstallationLookup {
        org: OrgName,
        #[source]
        source: GitHubApiError,
    },

    /// Creating the installation client failed.
    #[error("failed to create installation client for installation {installation_id}: {source}")]
    InstallationClient {
        installation_id: InstallationId,
        #[source]
        source: octocrab::Error,
    },
}

/// Hands out GitHub clients authorized for a given organization.
pub trait InstallationBroker {
    /// The client type handed out.
    type Client: GitHubInterpreter<Error = GitHubApiError>;

    /// Mints a client authorized by the app's installation on `org`.
    ///
    /// Every call returns fresh credentials; nothing is cached.
    fn installation_client(
        &self,
        org: &OrgName,
    ) -> impl Future<Output = Result<Self::Client, AuthError>> + Send;

    /// Mints a client for a known installation on `org`, skipping the
    /// installation lookup.
    ///
    /// Webhook deliveries name the installation that received them, so the
    /// target organization's client can be minted from the event directly.
    fn installation_client_by_id(
        &self,
        org: &OrgName,
        installation_id: InstallationId,
    ) -> impl Future<Output = Result<Self::Client, AuthError>> + Send;
}
