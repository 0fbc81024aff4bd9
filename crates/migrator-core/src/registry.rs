//! Latest-version lookup against an npm registry.

use crate::error::Error;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Public npm registry, used unless [`REGISTRY_ENV`] is set.
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

/// Points lookups at a mirror or a local test registry.
pub const REGISTRY_ENV: &str = "ADDON_MIGRATOR_NPM_REGISTRY";

/// Resolves the latest published version of a package.
#[allow(async_fn_in_trait)]
pub trait VersionLookup {
    /// # Errors
    /// `RegistryLookup` if the version cannot be determined.
    async fn latest_version(&self, name: &str) -> Result<String, Error>;
}

impl<T: VersionLookup + ?Sized> VersionLookup for &T {
    async fn latest_version(&self, name: &str) -> Result<String, Error> {
        (**self).latest_version(name).await
    }
}

/// Looks up packuments over HTTP.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: Url,
    http: Client,
}

impl RegistryClient {
    /// # Errors
    /// `RegistryLookup` for an unparseable `base_url`.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let mut base_url = Url::parse(base_url).map_err(|e| Error::RegistryLookup {
            name: String::new(),
            reason: format!("Invalid registry URL '{base_url}': {e}"),
        })?;
        // Url::join replaces the last segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("addon-migrator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::RegistryLookup {
                name: String::new(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self { base_url, http })
    }

    /// Client for [`REGISTRY_ENV`], falling back to [`DEFAULT_REGISTRY`].
    ///
    /// # Errors
    /// `RegistryLookup` if the configured URL is unusable.
    pub fn from_env() -> Result<Self, Error> {
        match std::env::var(REGISTRY_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::new(DEFAULT_REGISTRY),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full registry document for `name`.
    ///
    /// # Errors
    /// `RegistryLookup` on a transport failure, a non-2xx status or a body
    /// that is not JSON.
    pub async fn fetch_packument(&self, name: &str) -> Result<serde_json::Value, Error> {
        let lookup_error = |reason: String| Error::RegistryLookup {
            name: name.to_string(),
            reason,
        };

        // @scope/name is a single path segment
        let encoded_name = name.replacen('/', "%2F", usize::from(name.starts_with('@')));

        let url = self
            .base_url
            .join(&encoded_name)
            .map_err(|e| lookup_error(format!("Failed to build URL: {e}")))?;

        debug!(%url, "Fetching packument");
        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| lookup_error(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(lookup_error("package not found".into()));
        }
        if !status.is_success() {
            return Err(lookup_error(format!("registry answered {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| lookup_error(format!("Invalid packument: {e}")))
    }
}

impl VersionLookup for RegistryClient {
    async fn latest_version(&self, name: &str) -> Result<String, Error> {
        let packument = self.fetch_packument(name).await?;
        latest_tag(&packument)
            .map(String::from)
            .ok_or_else(|| Error::RegistryLookup {
                name: name.to_string(),
                reason: "packument has no dist-tags.latest".into(),
            })
    }
}

/// `dist-tags.latest` of a packument.
#[must_use]
pub fn latest_tag(packument: &serde_json::Value) -> Option<&str> {
    packument.pointer("/dist-tags/latest")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_tag() {
        let doc = serde_json::json!({
            "name": "@embroider/test-setup",
            "dist-tags": {
                "latest": "3.0.1",
                "beta": "4.0.0-beta.0"
            }
        });

        assert_eq!(latest_tag(&doc), Some("3.0.1"));
    }

    #[test]
    fn test_latest_tag_missing() {
        assert_eq!(latest_tag(&serde_json::json!({"name": "foo"})), None);
        assert_eq!(latest_tag(&serde_json::json!({"dist-tags": {"latest": 3}})), None);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = RegistryClient::new("http://127.0.0.1:4873/npm").unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:4873/npm/");
    }

    #[test]
    fn test_invalid_url() {
        let err = RegistryClient::new("not a url").unwrap_err();
        assert_eq!(err.code(), crate::error::codes::REGISTRY_LOOKUP_FAILED);
    }
}
