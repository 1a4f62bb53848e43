//! Offline driver for [`MetaSession`]: one JSON object per line, e.g.
//!
//! ```text
//! {"event":"round","payload":{"panoId":"...","lat":1.0,"lng":2.0}}
//! {"event":"result_view","active":true}
//! {"event":"location_id","id":"..."}
//! {"event":"coordinates","lat":1.0,"lng":2.0}
//! {"event":"refine","country":"Kenya","issued_at":2}
//! ```
//!
//! `issued_at` replays a slow reverse-geocoding answer: it carries the
//! snapshot taken right after that (1-based) step, so a location change in
//! between makes it stale.

use crate::render::{describe_view, summarize_view};
use crate::DataArgs;
use anyhow::{Context as AnyhowContext, Result};
use metahint_engine::{MetaSession, RefinementTicket};
use metahint_protocol::{Coordinates, GeoRefinement, LocationId};
use metahint_resolver::decode_location_id;
use metahint_sync::RemoteConfig;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayEvent {
    Round {
        payload: Value,
    },
    LocationId {
        id: String,
    },
    ResultView {
        active: bool,
    },
    Coordinates {
        lat: f64,
        lng: f64,
    },
    Refine {
        #[serde(default)]
        issued_at: Option<usize>,
        #[serde(default)]
        address: Option<String>,
        #[serde(default)]
        country: Option<String>,
        #[serde(default)]
        region: Option<String>,
        #[serde(default)]
        road: Option<String>,
    },
}

impl ReplayEvent {
    fn name(&self) -> &'static str {
        match self {
            ReplayEvent::Round { .. } => "round",
            ReplayEvent::LocationId { .. } => "location_id",
            ReplayEvent::ResultView { .. } => "result_view",
            ReplayEvent::Coordinates { .. } => "coordinates",
            ReplayEvent::Refine { .. } => "refine",
        }
    }
}

/// Parses an event log; blank lines and `#` comments are skipped.
pub fn parse_events(text: &str) -> Result<Vec<ReplayEvent>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid event on line {}", index + 1))
        })
        .collect()
}

pub async fn run(events: &Path, data: &DataArgs, remote: &RemoteConfig, json: bool) -> Result<()> {
    let text = tokio::fs::read_to_string(events)
        .await
        .with_context(|| format!("Failed to read {}", events.display()))?;
    let events = parse_events(&text)?;

    let mut session = MetaSession::new(crate::load_settings().await?.active_scopes);
    crate::data::load_into(&mut session, data, remote).await?;

    let mut snapshots: Vec<Option<RefinementTicket>> = Vec::with_capacity(events.len());
    for (index, event) in events.iter().enumerate() {
        let step = index + 1;
        let outcome = apply(&mut session, event, &snapshots)
            .with_context(|| format!("Step {step} ({})", event.name()))?;
        snapshots.push(session.begin_refinement());

        let view = session.view();
        if json {
            let line = json!({
                "step": step,
                "event": event.name(),
                "result": outcome,
                "view": view,
            });
            println!("{}", serde_json::to_string(&line)?);
        } else {
            println!(
                "[{step}] {} -> {}: {}",
                event.name(),
                outcome_label(&outcome),
                summarize_view(&view)
            );
        }
    }

    if !json {
        println!();
        print!("{}", describe_view(&session.view()));
    }
    Ok(())
}

fn apply(
    session: &mut MetaSession,
    event: &ReplayEvent,
    snapshots: &[Option<RefinementTicket>],
) -> Result<Value> {
    let outcome = match event {
        ReplayEvent::Round { payload } => match session.observe_round(payload) {
            Some(lock_event) => serde_json::to_value(lock_event)?,
            None => json!({ "outcome": "no_identifier" }),
        },
        ReplayEvent::LocationId { id } => {
            let id = decode_location_id(id.trim()).context("Empty location identifier")?;
            serde_json::to_value(session.observe_location_id(LocationId::new(id)))?
        }
        ReplayEvent::ResultView { active } => serde_json::to_value(session.set_result_view(*active))?,
        ReplayEvent::Coordinates { lat, lng } => {
            let coords = Coordinates::new(*lat, *lng)
                .with_context(|| format!("Coordinates out of range: {lat}, {lng}"))?;
            session.set_coordinates(coords);
            json!({ "outcome": "coordinates_set" })
        }
        ReplayEvent::Refine {
            issued_at,
            address,
            country,
            region,
            road,
        } => {
            let ticket = match issued_at {
                Some(step) => snapshots
                    .get(step.wrapping_sub(1))
                    .with_context(|| format!("issued_at {step} does not name an earlier step"))?
                    .clone(),
                None => session.begin_refinement(),
            };
            let refinement = GeoRefinement {
                address: address.clone(),
                country: country.clone(),
                region: region.clone(),
                road: road.clone(),
            };
            let applied = ticket
                .as_ref()
                .is_some_and(|ticket| session.apply_refinement(ticket, &refinement));
            let outcome = if applied { "refined" } else { "discarded" };
            json!({ "outcome": outcome })
        }
    };
    Ok(outcome)
}

fn outcome_label(outcome: &Value) -> &str {
    outcome
        .get("outcome")
        .and_then(Value::as_str)
        .unwrap_or("?")
}
