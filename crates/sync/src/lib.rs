//! # Metahint Sync
//!
//! Reads and writes the community documents.
//!
//! ```text
//! display path     DocumentFeed ── GET raw/{branch}/{path}?t=<ms> ──> FeedSnapshot
//!
//! contribute path  SyncClient
//!                    ├─ read   DocumentStore::read  -> { text, sha }
//!                    ├─ merge  append_hint / link_hints on serde_json::Value
//!                    └─ write  DocumentStore::write(.., sha)  (stale sha -> Conflict)
//!
//!                  no token -> draft_issue_url (prefilled issue)
//! ```

mod client;
mod config;
mod error;
mod feed;
mod merge;
mod settings;
mod store;
mod transport;

pub use client::{
    build_record, draft_issue_url, generate_hint_id, normalize_tags, HintDraft, SyncClient,
};
pub use config::RemoteConfig;
pub use error::{Result, SyncError};
pub use feed::{DocumentFeed, FeedSnapshot};
pub use merge::{append_hint, link_hints, parse_document, render_document, LocationLink};
pub use settings::{
    resolve_token, settings_dir, settings_path, Settings, CONFIG_DIR_ENV, SETTINGS_FILE_NAME,
    TOKEN_ENV,
};
pub use store::{DocumentStore, GithubContentsStore, MemoryStore, VersionedDocument};
pub use transport::{decode_content, encode_content};
