//! Display read path: the two documents over plain HTTPS, no token.

use crate::config::RemoteConfig;
use crate::error::{Result, SyncError};
use metahint_protocol::{HintCollection, LocationMap};
use reqwest::Client;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Both documents as of one fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub hints: HintCollection,
    pub locations: LocationMap,
}

impl FeedSnapshot {
    /// Lenient parse: a document that does not parse at all is logged and
    /// read as empty, bad rows inside it are skipped.
    #[must_use]
    pub fn from_texts(hints_text: &str, locations_text: &str) -> Self {
        let hints = serde_json::from_str(hints_text).unwrap_or_else(|err| {
            log::warn!("Hint document unreadable, using empty collection: {err}");
            HintCollection::default()
        });
        let locations = serde_json::from_str(locations_text).unwrap_or_else(|err| {
            log::warn!("Location document unreadable, using empty map: {err}");
            LocationMap::default()
        });
        Self { hints, locations }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentFeed {
    client: Client,
    config: RemoteConfig,
}

impl DocumentFeed {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    /// Fetches both documents. Transport failures are errors (callers show
    /// an offline status); nothing is retried here.
    pub async fn fetch(&self) -> Result<FeedSnapshot> {
        let stamp = unix_ms().to_string();
        let (hints_text, locations_text) = tokio::try_join!(
            self.fetch_text(&self.config.hints_path, &stamp),
            self.fetch_text(&self.config.locations_path, &stamp),
        )?;
        let snapshot = FeedSnapshot::from_texts(&hints_text, &locations_text);
        log::debug!(
            "Fetched {} hints and {} locations",
            snapshot.hints.len(),
            snapshot.locations.len()
        );
        Ok(snapshot)
    }

    async fn fetch_text(&self, path: &str, stamp: &str) -> Result<String> {
        let url = self.config.raw_url(path);
        log::debug!("GET {url}");
        // The CDN in front of raw content caches aggressively.
        let response = self.client.get(&url).query(&[("t", stamp)]).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Http {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.text().await?)
    }
}

fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|dur| u64::try_from(dur.as_millis()).ok())
        .unwrap_or(0)
}
