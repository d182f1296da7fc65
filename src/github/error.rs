//! GitHub API errors, classified for retrying.
//!
//! A 404 on a lookup never reaches this type as a failure: the interpreter
//! answers `None` instead, and the resolver decides what a miss means.

use thiserror::Error;

/// Whether retrying can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// 5xx, 429, rate-limited 403s and network failures.
    Transient,
    /// Everything else: auth failures, 404/422 on writes, unexpected responses.
    Permanent,
}

impl GitHubErrorKind {
    pub fn is_retriable(&self) -> bool {
        matches!(self, GitHubErrorKind::Transient)
    }

    /// Classifies a failure from its HTTP status and message.
    fn classify(status: Option<u16>, message: &str) -> Self {
        let message = message.to_lowercase();
        let rate_limited = ["rate limit", "abuse detection"]
            .iter()
            .any(|needle| message.contains(needle));
        let network = ["timed out", "timeout", "connection", "dns"]
            .iter()
            .any(|needle| message.contains(needle));

        match status {
            Some(429) => GitHubErrorKind::Transient,
            Some(403) if rate_limited => GitHubErrorKind::Transient,
            Some(500..=599) => GitHubErrorKind::Transient,
            Some(_) => GitHubErrorKind::Permanent,
            None if network => GitHubErrorKind::Transient,
            None => GitHubErrorKind::Permanent,
        }
    }
}

/// A failed GitHub API call.
#[derive(Debug, Error)]
#[error("GitHub API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,
    pub status_code: Option<u16>,
    pub message: String,
    #[source]
    pub source: Option<octocrab::Error>,
}

impl GitHubApiError {
    pub fn permanent_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Permanent,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn transient_without_source(message: impl Into<String>) -> Self {
        Self {
            kind: GitHubErrorKind::Transient,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// An interpreter answered an effect with the wrong response variant.
    pub fn unexpected_response(effect: &str, response: &str) -> Self {
        Self::permanent_without_source(format!(
            "unexpected response \"{}\" to effect \"{}\"",
            response, effect
        ))
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == Some(404)
    }

    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = match &err {
            octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
            _ => None,
        };
        let message = match &err {
            octocrab::Error::GitHub { source, .. } => source.message.clone(),
            other => other.to_string(),
        };

        Self {
            kind: GitHubErrorKind::classify(status_code, &message),
            status_code,
            message,
            source: Some(err),
        }
    }
}
