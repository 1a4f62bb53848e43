use crate::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Canonical panorama identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Leading characters for status lines.
    #[must_use]
    pub fn short(&self, max_chars: usize) -> &str {
        match self.0.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LocationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LocationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Returns `None` unless both values are finite and in range.
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Self { lat, lng })
    }

    #[must_use]
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        Self::new(lat?, lng?)
    }

    /// Five decimals (~1 m) is all the documents store.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            lat: crate::round_coordinate(self.lat),
            lng: crate::round_coordinate(self.lng),
        }
    }
}

/// One row of the community location map, always in canonical shape.
///
/// Reading accepts the legacy bare id array as well; it is normalized here so
/// nothing downstream ever sees it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "EntryRepr")]
pub struct LocationEntry {
    pub metas: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
}

impl LocationEntry {
    pub fn with_metas<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metas: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.lng)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntryRepr {
    Legacy(Vec<Value>),
    Canonical(CanonicalEntry),
}

#[derive(Deserialize)]
struct CanonicalEntry {
    #[serde(default)]
    metas: Vec<Value>,
    #[serde(default, deserialize_with = "de::coordinate")]
    lat: Option<f64>,
    #[serde(default, alias = "lon", deserialize_with = "de::coordinate")]
    lng: Option<f64>,
    #[serde(default, deserialize_with = "de::optional_text")]
    country: Option<String>,
    #[serde(default, deserialize_with = "de::optional_text")]
    region: Option<String>,
    #[serde(default, deserialize_with = "de::optional_text")]
    road: Option<String>,
}

impl From<EntryRepr> for LocationEntry {
    fn from(repr: EntryRepr) -> Self {
        match repr {
            EntryRepr::Legacy(ids) => LocationEntry {
                metas: de::ids_from_values(&ids),
                ..LocationEntry::default()
            },
            EntryRepr::Canonical(entry) => LocationEntry {
                metas: de::ids_from_values(&entry.metas),
                lat: entry.lat,
                lng: entry.lng,
                country: entry.country,
                region: entry.region,
                road: entry.road,
            },
        }
    }
}

/// Sparse mapping of locations to linked hint ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationMap {
    entries: BTreeMap<LocationId, LocationEntry>,
}

impl LocationMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LocationEntry> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: LocationId, entry: LocationEntry) -> Option<LocationEntry> {
        self.entries.insert(id, entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LocationId, &LocationEntry)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(LocationId, LocationEntry)> for LocationMap {
    fn from_iter<I: IntoIterator<Item = (LocationId, LocationEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for LocationMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter())
    }
}

impl<'de> Deserialize<'de> for LocationMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // One malformed row must not take the whole map down with it.
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            match serde_json::from_value::<LocationEntry>(value) {
                Ok(entry) => {
                    entries.insert(LocationId::new(key), entry);
                }
                Err(err) => log::warn!("Skipping location entry {key}: {err}"),
            }
        }
        Ok(Self { entries })
    }
}

/// Resolved geographic context for the displayed location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentLocationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl CurrentLocationContext {
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.lng)
    }

    pub fn set_coordinates(&mut self, coords: Coordinates) {
        self.lat = Some(coords.lat);
        self.lng = Some(coords.lng);
    }

    /// Seeds fields that are still unknown from a cached map entry.
    pub fn fill_from_entry(&mut self, entry: &LocationEntry) {
        if self.coordinates().is_none() {
            if let Some(coords) = entry.coordinates() {
                self.set_coordinates(coords);
            }
        }
        fill(&mut self.country, entry.country.as_deref());
        fill(&mut self.region, entry.region.as_deref());
        fill(&mut self.road, entry.road.as_deref());
    }

    /// Overwrites every field the refinement carries.
    pub fn apply(&mut self, refinement: &GeoRefinement) {
        if refinement.address.is_some() {
            self.address.clone_from(&refinement.address);
        }
        if refinement.country.is_some() {
            self.country.clone_from(&refinement.country);
        }
        if refinement.region.is_some() {
            self.region.clone_from(&refinement.region);
        }
        if refinement.road.is_some() {
            self.road.clone_from(&refinement.road);
        }
    }
}

fn fill(slot: &mut Option<String>, value: Option<&str>) {
    if slot.is_none() {
        *slot = value.map(str::to_string);
    }
}

/// A slower reverse-geocoding answer for the current location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoRefinement {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub road: Option<String>,
}
