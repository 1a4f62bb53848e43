//! # Metahint Engine
//!
//! Decides which community hints apply to the location on screen.
//!
//! ```text
//! LocationId ──> exact_hints ─────────────┐
//!                (location map lookup)    │
//!                                         ├──> SessionView
//! context ─────> predicted_hints ─────────┘
//!  (lat/lng,      ├─ distance: linked elsewhere, within the hint's radius
//!   country,      ├─ administrative: country / region / road
//!   region,       └─ active scope filter, exact ids excluded
//!   road)
//! ```
//!
//! [`MetaSession`] owns the documents, the lock and the context, and is the
//! only stateful type in the crate.

pub mod country;
mod geo;
mod join;
mod predict;
mod session;

pub use geo::{haversine_km, EARTH_RADIUS_KM};
pub use join::exact_hints;
pub use predict::{predicted_hints, MatchReason, PredictedHint};
pub use session::{DataStatus, MetaSession, RefinementTicket, SessionView};
