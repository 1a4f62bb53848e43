use metahint_protocol::{HintCollection, HintRecord, LocationMap};
use std::collections::HashSet;

/// Hints explicitly linked to `location_id`, in link order.
///
/// Ids the collection does not know are dropped: the two documents are
/// edited independently and may briefly disagree.
#[must_use]
pub fn exact_hints<'a>(
    location_id: &str,
    map: &LocationMap,
    hints: &'a HintCollection,
) -> Vec<&'a HintRecord> {
    let Some(entry) = map.get(location_id) else {
        return Vec::new();
    };

    let mut seen = HashSet::with_capacity(entry.metas.len());
    let mut out = Vec::with_capacity(entry.metas.len());
    for hint_id in &entry.metas {
        if !seen.insert(hint_id.as_str()) {
            continue;
        }
        match hints.get(hint_id) {
            Some(record) => out.push(record),
            None => log::debug!("Location {location_id} links unknown hint {hint_id}"),
        }
    }
    out
}
