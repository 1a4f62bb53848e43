use crate::config::RemoteConfig;
use crate::error::{Result, SyncError};
use crate::merge::{append_hint, link_hints, parse_document, render_document, LocationLink};
use crate::store::DocumentStore;
use crate::transport::sha256_hex;
use metahint_protocol::{HintRecord, LocationId, Scope};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

const HINT_ID_HEX_LEN: usize = 12;

/// A contributor's new hint before it has an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HintDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub road: Option<String>,
}

/// Submits hints and links through a [`DocumentStore`].
///
/// Writes are not retried: a conflict means somebody else committed first
/// and the caller decides whether to try again from a fresh read.
pub struct SyncClient<S> {
    store: S,
    hints_path: String,
    locations_path: String,
}

impl<S: DocumentStore> SyncClient<S> {
    pub fn new(store: S, config: &RemoteConfig) -> Self {
        Self {
            store,
            hints_path: config.hints_path.clone(),
            locations_path: config.locations_path.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Appends a new hint to the hint document and links it to `location`.
    ///
    /// Both documents are read and merged before the first write, so a
    /// malformed document fails the submission with nothing committed. If the
    /// link write fails after the hint was committed, the error is
    /// [`SyncError::Unlinked`] carrying the new id.
    pub async fn submit_hint(&self, draft: &HintDraft, location: &LocationLink) -> Result<HintRecord> {
        if location.id.is_empty() {
            return Err(SyncError::InvalidInput("location id is empty".to_string()));
        }
        let record = build_record(draft, location, &generate_hint_id(&location.id, &draft.title))?;
        let short = location.id.short(12);

        let hints = self.store.read(&self.hints_path).await?;
        let mut hints_doc = parse_document(&self.hints_path, &hints.text)?;
        append_hint(&self.hints_path, &mut hints_doc, &record)?;

        let locations = self.store.read(&self.locations_path).await?;
        let mut locations_doc = parse_document(&self.locations_path, &locations.text)?;
        link_hints(
            &self.locations_path,
            &mut locations_doc,
            location,
            std::slice::from_ref(&record.id),
        )?;

        let hints_text = render_document(&hints_doc)?;
        let locations_text = render_document(&locations_doc)?;

        let message = format!("Add hint {} for {short}", record.id);
        self.store
            .write(&self.hints_path, &hints_text, &message, &hints.sha)
            .await?;
        log::info!("Added hint {} ({})", record.id, record.title);

        let message = format!("Link hint {} to {short}", record.id);
        if let Err(err) = self
            .store
            .write(&self.locations_path, &locations_text, &message, &locations.sha)
            .await
        {
            log::warn!("Hint {} committed without a link: {err}", record.id);
            return Err(SyncError::Unlinked {
                hint_id: record.id,
                source: Box::new(err),
            });
        }
        log::info!("Linked {} to {short}", record.id);
        Ok(record)
    }

    /// Links hints that already exist. Returns whether anything was written.
    pub async fn link_existing(&self, location: &LocationLink, hint_ids: &[String]) -> Result<bool> {
        if location.id.is_empty() {
            return Err(SyncError::InvalidInput("location id is empty".to_string()));
        }
        let current = self.store.read(&self.locations_path).await?;
        let mut document = parse_document(&self.locations_path, &current.text)?;
        if !link_hints(&self.locations_path, &mut document, location, hint_ids)? {
            log::info!("{} already up to date", location.id.short(12));
            return Ok(false);
        }
        let message = format!(
            "Link {} hint(s) to {}",
            hint_ids.len(),
            location.id.short(12)
        );
        self.store
            .write(
                &self.locations_path,
                &render_document(&document)?,
                &message,
                &current.sha,
            )
            .await?;
        log::info!("Linked {} hint(s) to {}", hint_ids.len(), location.id.short(12));
        Ok(true)
    }
}

/// Turns a draft into a storable record: trimmed text, de-duplicated tags,
/// coordinates rounded to five decimals, country falling back to the
/// location's own.
pub fn build_record(draft: &HintDraft, location: &LocationLink, id: &str) -> Result<HintRecord> {
    let title = draft.title.trim();
    let description = draft.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(SyncError::InvalidInput(
            "title and description are required".to_string(),
        ));
    }

    let coordinates = location.coordinates.map(|c| c.rounded());
    Ok(HintRecord {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        image_url: non_blank(draft.image_url.as_deref()),
        tags: normalize_tags(&draft.tags),
        scope: draft.scope,
        country: non_blank(draft.country.as_deref())
            .or_else(|| non_blank(location.country.as_deref()))
            .unwrap_or_default(),
        region: non_blank(draft.region.as_deref()).or_else(|| non_blank(location.region.as_deref())),
        road: non_blank(draft.road.as_deref()).or_else(|| non_blank(location.road.as_deref())),
        lat: coordinates.map(|c| c.lat),
        lng: coordinates.map(|c| c.lng),
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Trims, drops blanks and keeps the first spelling of case-insensitive
/// duplicates.
#[must_use]
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Fresh opaque hint id.
#[must_use]
pub fn generate_hint_id(location: &LocationId, title: &str) -> String {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    hint_id_from_seed(&format!("{location}\n{title}\n{nonce}"))
}

fn hint_id_from_seed(seed: &str) -> String {
    let mut hex = sha256_hex(seed);
    hex.truncate(HINT_ID_HEX_LEN);
    format!("m{hex}")
}

/// Prefilled "new issue" URL carrying the hint as JSON, for contributors
/// without write access.
pub fn draft_issue_url(
    config: &RemoteConfig,
    draft: &HintDraft,
    location: &LocationLink,
) -> Result<String> {
    let record = build_record(draft, location, "pending")?;
    let submission = serde_json::json!({
        "location": location,
        "hint": record,
    });
    let body = format!(
        "Here is a new hint submission:\n\n```json\n{}\n```\n",
        serde_json::to_string_pretty(&submission)?
    );
    let title = format!("[Hint Submission] {}", location.id);
    let url = reqwest::Url::parse_with_params(
        &config.new_issue_url(),
        &[("title", title.as_str()), ("body", body.as_str())],
    )
    .map_err(|err| SyncError::InvalidInput(format!("bad issue URL: {err}")))?;
    Ok(url.into())
}
