use crate::DataArgs;
use anyhow::{Context as AnyhowContext, Result};
use metahint_engine::MetaSession;
use metahint_sync::{DocumentFeed, FeedSnapshot, RemoteConfig};
use std::path::Path;

/// Loads the documents into `session`, from local files when given, else
/// from the remote feed. A failed fetch leaves the session offline rather
/// than failing the command.
pub async fn load_into(
    session: &mut MetaSession,
    args: &DataArgs,
    remote: &RemoteConfig,
) -> Result<()> {
    if let (Some(hints), Some(locations)) = (&args.hints_file, &args.locations_file) {
        let snapshot = FeedSnapshot::from_texts(
            &read_text(hints).await?,
            &read_text(locations).await?,
        );
        session.replace_data(snapshot.hints, snapshot.locations);
        return Ok(());
    }

    let feed = DocumentFeed::new(remote.clone()).context("Failed to build HTTP client")?;
    match feed.fetch().await {
        Ok(snapshot) => session.replace_data(snapshot.hints, snapshot.locations),
        Err(err) => session.mark_offline(err.to_string()),
    }
    Ok(())
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}
