//! The one stateful object a host owns.
//!
//! Everything else in the engine is a pure function over the data held here.
//! Hosts feed it observations as they happen and ask for a [`SessionView`]
//! whenever they need to render.

use crate::join::exact_hints;
use crate::predict::{predicted_hints, PredictedHint};
use metahint_protocol::{
    ActiveScopeSet, Coordinates, CurrentLocationContext, GeoRefinement, HintCollection,
    HintRecord, LocationId, LocationMap,
};
use metahint_resolver::{extract_current_round, LockEvent, LockState, LocationLock};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DataStatus {
    /// Nothing loaded yet.
    #[default]
    Empty,
    Loaded { hints: usize, locations: usize },
    /// The last refresh failed; previously loaded data, if any, is kept.
    Offline { reason: String },
}

impl fmt::Display for DataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataStatus::Empty => f.write_str("no data loaded"),
            DataStatus::Loaded { hints, locations } => {
                write!(f, "{hints} hints, {locations} locations")
            }
            DataStatus::Offline { reason } => write!(f, "offline: {reason}"),
        }
    }
}

/// Snapshot taken before a slow reverse-geocoding request.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementTicket {
    location_id: LocationId,
    coordinates: Option<Coordinates>,
}

impl RefinementTicket {
    #[must_use]
    pub fn location_id(&self) -> &LocationId {
        &self.location_id
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }
}

/// Everything a renderer needs, borrowed from the session.
#[derive(Debug, Serialize)]
pub struct SessionView<'a> {
    pub location_id: Option<&'a LocationId>,
    pub lock_state: LockState,
    pub context: &'a CurrentLocationContext,
    pub exact: Vec<&'a HintRecord>,
    pub predicted: Vec<PredictedHint<'a>>,
    pub status: &'a DataStatus,
}

#[derive(Debug, Default)]
pub struct MetaSession {
    hints: HintCollection,
    locations: LocationMap,
    lock: LocationLock,
    context: CurrentLocationContext,
    active_scopes: ActiveScopeSet,
    status: DataStatus,
    /// Round coordinates seen for a candidate still waiting in the lock.
    pending_coordinates: Option<(LocationId, Coordinates)>,
}

impl MetaSession {
    #[must_use]
    pub fn new(active_scopes: ActiveScopeSet) -> Self {
        Self {
            active_scopes,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn status(&self) -> &DataStatus {
        &self.status
    }

    #[must_use]
    pub fn current(&self) -> Option<&LocationId> {
        self.lock.current()
    }

    #[must_use]
    pub fn context(&self) -> &CurrentLocationContext {
        &self.context
    }

    #[must_use]
    pub fn active_scopes(&self) -> &ActiveScopeSet {
        &self.active_scopes
    }

    #[must_use]
    pub fn hints(&self) -> &HintCollection {
        &self.hints
    }

    #[must_use]
    pub fn locations(&self) -> &LocationMap {
        &self.locations
    }

    /// Swaps in freshly fetched documents. Replacement is wholesale.
    pub fn replace_data(&mut self, hints: HintCollection, locations: LocationMap) {
        self.status = DataStatus::Loaded {
            hints: hints.len(),
            locations: locations.len(),
        };
        log::info!("Loaded {}", self.status);
        self.hints = hints;
        self.locations = locations;
        self.seed_context();
    }

    pub fn mark_offline(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Hint data unavailable: {reason}");
        self.status = DataStatus::Offline { reason };
    }

    /// Feeds a round or whole-game payload. `None` when it carries no
    /// identifier yet.
    pub fn observe_round(&mut self, payload: &Value) -> Option<LockEvent> {
        let round = extract_current_round(payload)?;
        let id = round.id.clone();
        let event = self.observe_location_id(round.id);
        if let Some(coords) = round.coordinates {
            match &event {
                LockEvent::Adopted { .. } | LockEvent::Unchanged
                    if self.lock.current() == Some(&id) =>
                {
                    if self.context.coordinates().is_none() {
                        self.context.set_coordinates(coords);
                    }
                }
                LockEvent::Queued { pending } => {
                    self.pending_coordinates = Some((pending.clone(), coords));
                }
                _ => {}
            }
        }
        Some(event)
    }

    pub fn observe_location_id(&mut self, id: LocationId) -> LockEvent {
        let event = self.lock.observe(id);
        self.after_lock_event(&event);
        event
    }

    pub fn set_result_view(&mut self, active: bool) -> LockEvent {
        let event = self.lock.set_result_view(active);
        self.after_lock_event(&event);
        event
    }

    /// Coordinates reported for the displayed location. Ignored when nothing
    /// is displayed.
    pub fn set_coordinates(&mut self, coords: Coordinates) {
        if self.lock.current().is_some() {
            self.context.set_coordinates(coords);
        }
    }

    #[must_use]
    pub fn begin_refinement(&self) -> Option<RefinementTicket> {
        Some(RefinementTicket {
            location_id: self.lock.current()?.clone(),
            coordinates: self.context.coordinates(),
        })
    }

    /// Applies a reverse-geocoding answer unless the location or its
    /// coordinates moved since `ticket` was taken. Returns whether it applied.
    pub fn apply_refinement(&mut self, ticket: &RefinementTicket, refinement: &GeoRefinement) -> bool {
        if self.lock.current() != Some(&ticket.location_id)
            || self.context.coordinates() != ticket.coordinates
        {
            log::debug!(
                "Discarding stale refinement for {}",
                ticket.location_id.short(10)
            );
            return false;
        }
        self.context.apply(refinement);
        true
    }

    pub fn set_active_scopes(&mut self, active_scopes: ActiveScopeSet) {
        self.active_scopes = active_scopes;
    }

    #[must_use]
    pub fn view(&self) -> SessionView<'_> {
        let location_id = self.lock.current();
        let exact = location_id
            .map(|id| exact_hints(id.as_str(), &self.locations, &self.hints))
            .unwrap_or_default();
        let predicted = if location_id.is_some() {
            let exclude: HashSet<&str> = exact.iter().map(|h| h.id.as_str()).collect();
            predicted_hints(
                &self.context,
                &self.locations,
                &self.hints,
                &self.active_scopes,
                &exclude,
            )
        } else {
            Vec::new()
        };

        SessionView {
            location_id,
            lock_state: self.lock.state(),
            context: &self.context,
            exact,
            predicted,
            status: &self.status,
        }
    }

    fn after_lock_event(&mut self, event: &LockEvent) {
        let LockEvent::Adopted { id, .. } = event else {
            return;
        };
        self.context = CurrentLocationContext::default();
        if let Some((pending, coords)) = self.pending_coordinates.take() {
            if &pending == id {
                self.context.set_coordinates(coords);
            }
        }
        self.seed_context();
    }

    fn seed_context(&mut self) {
        let Some(id) = self.lock.current() else {
            return;
        };
        if let Some(entry) = self.locations.get(id.as_str()) {
            self.context.fill_from_entry(entry);
        }
    }
}
