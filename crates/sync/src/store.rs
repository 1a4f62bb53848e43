//! Versioned document storage.
//!
//! Every write carries the version token of the read it is based on; a
//! stale token fails with [`SyncError::Conflict`] instead of overwriting.

use crate::config::RemoteConfig;
use crate::error::{Result, SyncError};
use crate::transport::{decode_content, encode_content, sha256_hex};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("metahint/", env!("CARGO_PKG_VERSION"));

/// Document text plus the token a conditional write must present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedDocument {
    pub text: String,
    pub sha: String,
}

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<VersionedDocument>;

    /// Replaces `path` if it is still at version `sha`. Returns the new version.
    async fn write(&self, path: &str, text: &str, message: &str, sha: &str) -> Result<String>;
}

/// GitHub repository contents API.
#[derive(Debug, Clone)]
pub struct GithubContentsStore {
    client: Client,
    config: RemoteConfig,
    token: String,
}

#[derive(Deserialize)]
struct ContentsFile {
    content: String,
    sha: String,
}

#[derive(Serialize)]
struct ContentsUpdate<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Deserialize)]
struct ContentsUpdateResponse {
    content: ContentsCommitted,
}

#[derive(Deserialize)]
struct ContentsCommitted {
    sha: String,
}

impl GithubContentsStore {
    pub fn new(config: RemoteConfig, token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SyncError::MissingToken);
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            config,
            token: token.trim().to_string(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
    }
}

#[async_trait::async_trait]
impl DocumentStore for GithubContentsStore {
    async fn read(&self, path: &str) -> Result<VersionedDocument> {
        let url = self.config.contents_url(path);
        log::debug!("GET {url}");
        let response = self
            .authorized(self.client.get(&url))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(SyncError::NotFound(path.to_string())),
            status => {
                return Err(SyncError::Http {
                    status: status.as_u16(),
                    url,
                })
            }
        }

        let file: ContentsFile = response
            .json()
            .await
            .map_err(|err| SyncError::decode(path, err))?;
        Ok(VersionedDocument {
            text: decode_content(path, &file.content)?,
            sha: file.sha,
        })
    }

    async fn write(&self, path: &str, text: &str, message: &str, sha: &str) -> Result<String> {
        let url = self.config.contents_url(path);
        log::debug!("PUT {url}");
        let body = ContentsUpdate {
            message,
            content: encode_content(text),
            sha,
            branch: &self.config.branch,
        };
        let response = self
            .authorized(self.client.put(&url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Err(SyncError::Conflict {
                path: path.to_string(),
            });
        }
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            // A stale sha is reported as 422 with a message naming it.
            let detail = response.text().await.unwrap_or_default();
            if detail.to_ascii_lowercase().contains("sha") {
                return Err(SyncError::Conflict {
                    path: path.to_string(),
                });
            }
            log::warn!("Write to {path} rejected: {detail}");
            return Err(SyncError::Http {
                status: status.as_u16(),
                url,
            });
        }
        if !status.is_success() {
            return Err(SyncError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let committed: ContentsUpdateResponse = response
            .json()
            .await
            .map_err(|err| SyncError::decode(path, err))?;
        Ok(committed.content.sha)
    }
}

/// In-process store with the same conditional-write rules.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, VersionedDocument>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_document(mut self, path: &str, text: impl Into<String>) -> Self {
        let text = text.into();
        let sha = sha256_hex(&text);
        self.documents
            .get_mut()
            .insert(path.to_string(), VersionedDocument { text, sha });
        self
    }

    /// Current text of `path`, if present.
    pub async fn text(&self, path: &str) -> Option<String> {
        self.documents
            .lock()
            .await
            .get(path)
            .map(|doc| doc.text.clone())
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<VersionedDocument> {
        self.documents
            .lock()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(path.to_string()))
    }

    async fn write(&self, path: &str, text: &str, message: &str, sha: &str) -> Result<String> {
        let mut documents = self.documents.lock().await;
        let current = documents
            .get_mut(path)
            .ok_or_else(|| SyncError::NotFound(path.to_string()))?;
        if current.sha != sha {
            return Err(SyncError::Conflict {
                path: path.to_string(),
            });
        }
        log::debug!("{path}: {message}");
        current.text = text.to_string();
        // Version tokens change on every accepted write, even a no-op one.
        current.sha = sha256_hex(&format!("{sha}\n{text}"));
        Ok(current.sha.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_rejects_stale_writes() {
        let store = MemoryStore::new().with_document("data/metas.json", "[]");
        let first = store.read("data/metas.json").await.unwrap();
        let second = store.read("data/metas.json").await.unwrap();

        let new_sha = store
            .write("data/metas.json", "[1]", "first", &first.sha)
            .await
            .unwrap();
        assert_ne!(new_sha, first.sha);

        let err = store
            .write("data/metas.json", "[2]", "second", &second.sha)
            .await
            .unwrap_err();
        assert!(err.is_conflict(), "{err}");
        assert_eq!(store.text("data/metas.json").await.as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn memory_store_missing_document() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.read("nope.json").await,
            Err(SyncError::NotFound(_))
        ));
    }

    #[test]
    fn github_store_requires_token() {
        let err = GithubContentsStore::new(RemoteConfig::default(), "  ").unwrap_err();
        assert!(matches!(err, SyncError::MissingToken));
    }
}
