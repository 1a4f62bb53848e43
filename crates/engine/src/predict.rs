use crate::country::same_country;
use crate::geo::haversine_km;
use metahint_protocol::{
    ActiveScopeSet, CurrentLocationContext, HintCollection, HintRecord, LocationMap, Scope,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Why a hint was predicted for the current location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum MatchReason {
    /// Linked at a location this far away, within the hint's radius.
    Distance { km: f64 },
    Country,
    Region,
    Road,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedHint<'a> {
    pub hint: &'a HintRecord,
    pub reason: MatchReason,
}

/// Hints not linked to the current location but likely relevant to it.
///
/// Nothing is predicted without numeric coordinates in `ctx`. Hints whose
/// scope is inactive are suppressed, ids in `exclude` (the exact matches)
/// are never repeated, and output follows hint-collection order.
#[must_use]
pub fn predicted_hints<'a>(
    ctx: &CurrentLocationContext,
    map: &LocationMap,
    hints: &'a HintCollection,
    active: &ActiveScopeSet,
    exclude: &HashSet<&str>,
) -> Vec<PredictedHint<'a>> {
    let Some(here) = ctx.coordinates() else {
        return Vec::new();
    };

    let mut matched: HashMap<&str, MatchReason> = HashMap::new();

    for (location_id, entry) in map.iter() {
        let Some(there) = entry.coordinates() else {
            continue;
        };
        // Computed at most once per entry, and only when a linked hint has a radius.
        let mut distance = None;
        for hint_id in &entry.metas {
            let Some(record) = hints.get(hint_id) else {
                log::debug!("Location {location_id} links unknown hint {hint_id}");
                continue;
            };
            let Some(scope) = record.scope.filter(|s| s.radius_km() > 0.0) else {
                continue;
            };
            let km = *distance.get_or_insert_with(|| haversine_km(here, there));
            if !scope.covers(km) {
                continue;
            }
            let slot = matched
                .entry(record.id.as_str())
                .or_insert(MatchReason::Distance { km });
            if let MatchReason::Distance { km: best } = slot {
                if km < *best {
                    *best = km;
                }
            }
        }
    }

    for record in hints {
        if matched.contains_key(record.id.as_str()) {
            continue;
        }
        if let Some(reason) = administrative_match(record, ctx) {
            matched.insert(record.id.as_str(), reason);
        }
    }

    hints
        .iter()
        .filter(|record| !exclude.contains(record.id.as_str()))
        .filter(|record| record.scope.is_some_and(|scope| active.contains(scope)))
        .filter_map(|record| {
            matched
                .get(record.id.as_str())
                .map(|reason| PredictedHint {
                    hint: record,
                    reason: *reason,
                })
        })
        .collect()
}

fn administrative_match(record: &HintRecord, ctx: &CurrentLocationContext) -> Option<MatchReason> {
    let country_matches = || {
        ctx.country
            .as_deref()
            .is_some_and(|here| same_country(&record.country, here))
    };
    match record.scope? {
        Scope::Countrywide if country_matches() => Some(MatchReason::Country),
        Scope::Region
            if country_matches() && same_text(record.region.as_deref(), ctx.region.as_deref()) =>
        {
            Some(MatchReason::Region)
        }
        Scope::Road if same_text(record.road.as_deref(), ctx.road.as_deref()) => {
            Some(MatchReason::Road)
        }
        _ => None,
    }
}

/// Trimmed, case-insensitive equality of two present, non-blank values.
fn same_text(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.map(str::trim), b.map(str::trim)) {
        (Some(a), Some(b)) if !a.is_empty() => a.to_lowercase() == b.to_lowercase(),
        _ => false,
    }
}
