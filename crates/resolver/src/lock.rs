//! Location lock / debounce.
//!
//! The result view re-renders several times while it animates in, and some
//! of those renders carry stale identifiers. While the view is up the current
//! location is locked; newer candidates wait in a single pending slot and are
//! adopted the moment the view goes away.
//!
//! ```text
//!            observe(id)                 set_result_view(true)
//!   Idle ───────────────> Unlocked ─────────────────────────────> Locked
//!     │                      ^  <──────────────────────────────── │  │
//!     │ observe(id) while    │       set_result_view(false)        │  │ observe(other)
//!     │ view is active       │       (adopts pending, if any)      │  │ -> pending slot
//!     └──────────────────────┼───────────────────────────────────> │ <┘
//! ```

use metahint_protocol::LocationId;
use serde::Serialize;

/// Candidates this short are transient garbage, never real panoramas.
pub const MIN_PLAUSIBLE_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Idle,
    Unlocked,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    TooShort,
}

/// Outcome of feeding a candidate or a view change into the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LockEvent {
    Adopted {
        id: LocationId,
        previous: Option<LocationId>,
        /// Geographic context must be derived again from scratch.
        reset_context: bool,
    },
    Unchanged,
    Queued {
        pending: LocationId,
    },
    Rejected {
        reason: RejectReason,
    },
}

impl LockEvent {
    #[must_use]
    pub fn adopted(&self) -> Option<&LocationId> {
        match self {
            LockEvent::Adopted { id, .. } => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocationLock {
    state: LockState,
    current: Option<LocationId>,
    pending: Option<LocationId>,
    result_view_active: bool,
}

impl Default for LocationLock {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationLock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: LockState::Idle,
            current: None,
            pending: None,
            result_view_active: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> LockState {
        self.state
    }

    #[must_use]
    pub fn current(&self) -> Option<&LocationId> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&LocationId> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn result_view_active(&self) -> bool {
        self.result_view_active
    }

    pub fn observe(&mut self, candidate: LocationId) -> LockEvent {
        if candidate.len() < MIN_PLAUSIBLE_LEN {
            log::debug!("Rejecting implausible identifier {candidate:?}");
            return LockEvent::Rejected {
                reason: RejectReason::TooShort,
            };
        }

        if self.current.as_ref() == Some(&candidate) {
            // The view settled back on the current location; an older
            // queued candidate would be wrong now.
            if self.pending.take().is_some() {
                log::debug!("Dropping pending identifier, view settled on current");
            }
            return LockEvent::Unchanged;
        }

        match self.state {
            LockState::Locked => {
                log::debug!(
                    "Locked on {}, queueing {}",
                    self.current.as_ref().map_or("-", |id| id.short(10)),
                    candidate.short(10)
                );
                self.pending = Some(candidate.clone());
                LockEvent::Queued { pending: candidate }
            }
            LockState::Idle | LockState::Unlocked => self.adopt(candidate, false),
        }
    }

    /// Reports the result view appearing or disappearing.
    pub fn set_result_view(&mut self, active: bool) -> LockEvent {
        if self.result_view_active == active {
            return LockEvent::Unchanged;
        }
        self.result_view_active = active;

        if active {
            if self.current.is_some() {
                self.state = LockState::Locked;
            }
            return LockEvent::Unchanged;
        }

        if self.current.is_some() {
            self.state = LockState::Unlocked;
        }
        match self.pending.take() {
            Some(next) => self.adopt(next, true),
            None => LockEvent::Unchanged,
        }
    }

    /// Forgets everything, e.g. when the host navigates away from a game.
    pub fn reset(&mut self) {
        *self = Self {
            result_view_active: self.result_view_active,
            ..Self::new()
        };
    }

    fn adopt(&mut self, id: LocationId, reset_context: bool) -> LockEvent {
        let previous = self.current.replace(id.clone());
        self.pending = None;
        self.state = if self.result_view_active {
            LockState::Locked
        } else {
            LockState::Unlocked
        };
        log::debug!("Adopted location {}", id.short(10));
        LockEvent::Adopted {
            id,
            previous,
            reset_context,
        }
    }
}
