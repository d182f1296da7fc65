//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Keeps an organization's rulesets in sync with definitions written
/// against another organization.
#[derive(Debug, Clone, Parser)]
#[command(name = "ruleset-sync", version)]
pub struct Config {
    /// Address the webhook server listens on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    pub listen_addr: SocketAddr,

    /// Secret shared with GitHub for webhook signatures
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: String,

    /// GitHub App ID
    #[arg(long, env = "GITHUB_APP_ID")]
    pub app_id: u64,

    /// GitHub App slug. Ruleset changes made by `<slug>[bot]` are ignored
    #[arg(long, env = "GITHUB_APP_SLUG")]
    pub app_slug: String,

    /// Path to the GitHub App's PEM private key
    #[arg(long, env = "GITHUB_APP_PRIVATE_KEY_PATH")]
    pub private_key_path: PathBuf,

    /// Directory of ruleset definition files (*.json)
    #[arg(long, env = "RULESETS_DIR", default_value = "rulesets")]
    pub rulesets_dir: PathBuf,

    /// GitHub API base URL, for GitHub Enterprise Server
    #[arg(long, env = "GITHUB_API_URL")]
    pub github_api_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_with_defaults() {
        let config = Config::try_parse_from([
            "ruleset-sync",
            "--webhook-secret",
            "s3cret",
            "--app-id",
            "12345",
            "--app-slug",
            "ruleset-sync",
            "--private-key-path",
            "/etc/ruleset-sync/key.pem",
        ])
        .unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.app_id, 12345);
        assert_eq!(config.app_slug, "ruleset-sync");
        assert_eq!(config.rulesets_dir, PathBuf::from("rulesets"));
        assert_eq!(config.github_api_url, None);
    }

    #[test]
    fn rejects_non_numeric_app_id() {
        let result = Config::try_parse_from([
            "ruleset-sync",
            "--webhook-secret",
            "s3cret",
            "--app-id",
            "my-app",
            "--app-slug",
            "ruleset-sync",
            "--private-key-path",
            "key.pem",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn command_definition_is_valid() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
