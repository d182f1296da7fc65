//! GitHub App authentication.
//!
//! The app client signs requests with a JWT derived from the app's private
//! key. It is only used to find an organization's installation and to mint
//! installation clients; all directory and ruleset calls go through an
//! installation client.

use octocrab::Octocrab;
use octocrab::models::AppId;
use serde::Deserialize;

use super::client::OctocrabClient;
use super::error::GitHubApiError;
use crate::auth::{AuthError, InstallationBroker};
use crate::types::{InstallationId, OrgName};

/// A GitHub App able to act on behalf of its installations.
#[derive(Clone)]
pub struct GitHubApp {
    app_client: Octocrab,
}

#[derive(Debug, Deserialize)]
struct InstallationResponse {
    id: InstallationId,
}

impl GitHubApp {
    /// Builds the app client from the app ID and its PEM-encoded private key.
    ///
    /// `api_url` overrides the API base URL (GitHub Enterprise Server).
    pub fn new(
        app_id: u64,
        private_key_pem: &[u8],
        api_url: Option<&str>,
    ) -> Result<Self, AuthError> {
        let key =
            jsonwebtoken::EncodingKey::from_rsa_pem(private_key_pem).map_err(AuthError::InvalidKey)?;

        let mut builder = Octocrab::builder().app(AppId(app_id), key);
        if let Some(url) = api_url {
            builder = builder.base_uri(url).map_err(AuthError::AppClient)?;
        }
        let app_client = builder.build().map_err(AuthError::AppClient)?;

        Ok(GitHubApp { app_client })
    }

    /// Looks up the app's installation on an organization.
    pub async fn org_installation_id(&self, org: &OrgName) -> Result<InstallationId, AuthError> {
        let route = format!("/orgs/{}/installation", org);
        let result: Result<InstallationResponse, octocrab::Error> =
            self.app_client.get(&route, None::<&()>).await;

        match result {
            Ok(installation) => Ok(installation.id),
            Err(e) => {
                let source = GitHubApiError::from_octocrab(e);
                if source.is_not_found() {
                    Err(AuthError::NotInstalled(org.clone()))
                } else {
                    Err(AuthError::InstallationLookup {
                        org: org.clone(),
                        source,
                    })
                }
            }
        }
    }

    /// Creates a client authorized by the given installation.
    pub fn client_for_installation(
        &self,
        org: &OrgName,
        installation_id: InstallationId,
    ) -> Result<OctocrabClient, AuthError> {
        let client = self
            .app_client
            .installation(octocrab::models::InstallationId(installation_id.0))
            .map_err(|source| AuthError::InstallationClient {
                installation_id,
                source,
            })?;
        Ok(OctocrabClient::new(client, org.clone()))
    }
}

impl InstallationBroker for GitHubApp {
    type Client = OctocrabClient;

    async fn installation_client(&self, org: &OrgName) -> Result<OctocrabClient, AuthError> {
        let installation_id = self.org_installation_id(org).await?;
        tracing::debug!(org = %org, installation_id = %installation_id, "Minted installation client");
        self.client_for_installation(org, installation_id)
    }

    async fn installation_client_by_id(
        &self,
        org: &OrgName,
        installation_id: InstallationId,
    ) -> Result<OctocrabClient, AuthError> {
        tracing::debug!(org = %org, installation_id = %installation_id, "Minted client for delivering installation");
        self.client_for_installation(org, installation_id)
    }
}

impl std::fmt::Debug for GitHubApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApp").finish_non_exhaustive()
    }
}
