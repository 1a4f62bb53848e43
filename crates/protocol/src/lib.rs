//! # Metahint Protocol
//!
//! Document model shared by the resolver, the engine and the remote store.
//!
//! Two community-edited JSON documents back everything:
//!
//! ```text
//! metas.json      [ HintRecord, ... ]                 -> HintCollection
//! locations.json  { LocationId: LocationEntry, ... }  -> LocationMap
//!                   (bare id arrays or {metas, lat, lng, country, ...})
//! ```
//!
//! Reading is deliberately forgiving: malformed rows are logged and skipped,
//! legacy location rows are normalized on the way in.

mod de;
pub mod hint;
pub mod location;
pub mod scope;

pub use hint::{HintCollection, HintRecord};
pub use location::{
    Coordinates, CurrentLocationContext, GeoRefinement, LocationEntry, LocationId, LocationMap,
};
pub use scope::{ActiveScopeSet, Scope, UnknownScope};

/// Default repository paths of the two documents.
pub const HINTS_DOCUMENT_PATH: &str = "data/metas.json";
pub const LOCATIONS_DOCUMENT_PATH: &str = "data/locations.json";

const COORDINATE_SCALE: f64 = 100_000.0;

#[must_use]
pub fn round_coordinate(value: f64) -> f64 {
    (value * COORDINATE_SCALE).round() / COORDINATE_SCALE
}
