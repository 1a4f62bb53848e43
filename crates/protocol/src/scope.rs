use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Geographic generality at which a hint applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Countrywide,
    Region,
    /// Declared in the scope vocabulary but never auto-predicted.
    Longitude,
    Km1000,
    Km100,
    Km10,
    Km1,
    Road,
    /// One-of-a-kind location: shown only where it is linked.
    Unique,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown scope: {0:?}")]
pub struct UnknownScope(pub String);

impl Scope {
    pub const ALL: [Scope; 9] = [
        Scope::Countrywide,
        Scope::Region,
        Scope::Longitude,
        Scope::Km1000,
        Scope::Km100,
        Scope::Km10,
        Scope::Km1,
        Scope::Road,
        Scope::Unique,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Countrywide => "countrywide",
            Scope::Region => "region",
            Scope::Longitude => "longitude",
            Scope::Km1000 => "1000km",
            Scope::Km100 => "100km",
            Scope::Km10 => "10km",
            Scope::Km1 => "1km",
            Scope::Road => "road",
            Scope::Unique => "unique",
        }
    }

    /// Prediction radius in kilometres; `0.0` means the scope is not
    /// distance-predictable.
    #[must_use]
    pub fn radius_km(self) -> f64 {
        match self {
            Scope::Km1 => 1.0,
            Scope::Km10 => 10.0,
            Scope::Km100 => 100.0,
            Scope::Km1000 => 1000.0,
            _ => 0.0,
        }
    }

    /// Inclusive radius test.
    #[must_use]
    pub fn covers(self, distance_km: f64) -> bool {
        let radius = self.radius_km();
        radius > 0.0 && distance_km <= radius
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        let scope = match normalized.as_str() {
            "countrywide" | "country" => Scope::Countrywide,
            "region" => Scope::Region,
            "longitude" => Scope::Longitude,
            "1000km" => Scope::Km1000,
            "100km" => Scope::Km100,
            "10km" => Scope::Km10,
            "1km" => Scope::Km1,
            "road" => Scope::Road,
            "unique" => Scope::Unique,
            _ => return Err(UnknownScope(raw.to_string())),
        };
        Ok(scope)
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Reads an optional scope, treating empty and unrecognised values as absent.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Scope>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| {
        if raw.trim().is_empty() {
            return None;
        }
        match raw.parse() {
            Ok(scope) => Some(scope),
            Err(err) => {
                log::warn!("Ignoring hint scope: {err}");
                None
            }
        }
    }))
}

/// Scopes currently enabled for prediction display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveScopeSet {
    scopes: BTreeSet<Scope>,
}

impl ActiveScopeSet {
    #[must_use]
    pub fn all() -> Self {
        Self {
            scopes: Scope::ALL.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self {
            scopes: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }

    pub fn enable(&mut self, scope: Scope) {
        self.scopes.insert(scope);
    }

    pub fn disable(&mut self, scope: Scope) {
        self.scopes.remove(&scope);
    }

    /// Flips the scope and returns whether it is now enabled.
    pub fn toggle(&mut self, scope: Scope) -> bool {
        if self.scopes.remove(&scope) {
            false
        } else {
            self.scopes.insert(scope);
            true
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Scope> + '_ {
        self.scopes.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Default for ActiveScopeSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Scope> for ActiveScopeSet {
    fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
        Self {
            scopes: iter.into_iter().collect(),
        }
    }
}

impl Serialize for ActiveScopeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.scopes.iter())
    }
}

impl<'de> Deserialize<'de> for ActiveScopeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Ok(raw
            .iter()
            .filter_map(|value| match value.parse::<Scope>() {
                Ok(scope) => Some(scope),
                Err(err) => {
                    log::warn!("Dropping stored scope: {err}");
                    None
                }
            })
            .collect())
    }
}
