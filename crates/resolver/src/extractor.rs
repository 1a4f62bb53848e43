use crate::codec::decode_location_id;
use metahint_protocol::{Coordinates, LocationId};
use serde::Serialize;
use serde_json::Value;

/// Payload shape an identifier was found in, in probing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSource {
    /// `panoramaQuestionPayload.panorama.panoId` (live modes)
    PanoramaQuestion,
    /// `location.panoId`
    Location,
    /// `panoId` on the round itself (classic games, challenges)
    TopLevel,
    /// `streakLocationCode`
    StreakCode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedRound {
    pub id: LocationId,
    pub source: IdSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

struct Probe {
    source: IdSource,
    /// Object holding the id (and usually the coordinates).
    parent: &'static str,
    keys: &'static [&'static str],
}

const PANO_KEYS: &[&str] = &["panoId", "panoid", "panoID"];

const PROBES: &[Probe] = &[
    Probe {
        source: IdSource::PanoramaQuestion,
        parent: "/panoramaQuestionPayload/panorama",
        keys: PANO_KEYS,
    },
    Probe {
        source: IdSource::PanoramaQuestion,
        parent: "/question/panoramaQuestionPayload/panorama",
        keys: PANO_KEYS,
    },
    Probe {
        source: IdSource::Location,
        parent: "/location",
        keys: PANO_KEYS,
    },
    Probe {
        source: IdSource::TopLevel,
        parent: "",
        keys: PANO_KEYS,
    },
    Probe {
        source: IdSource::StreakCode,
        parent: "",
        keys: &["streakLocationCode"],
    },
];

/// Finds the canonical identifier of a single round payload.
#[must_use]
pub fn extract_canonical_id(round: &Value) -> Option<LocationId> {
    extract_round(round).map(|found| found.id)
}

/// Like [`extract_canonical_id`], also reporting where the id came from and
/// the round coordinates when the payload carries them.
#[must_use]
pub fn extract_round(round: &Value) -> Option<ExtractedRound> {
    for probe in PROBES {
        let parent = if probe.parent.is_empty() {
            Some(round)
        } else {
            round.pointer(probe.parent)
        };
        let Some(parent) = parent.filter(|v| v.is_object()) else {
            continue;
        };
        let decoded = probe
            .keys
            .iter()
            .filter_map(|key| parent.get(*key).and_then(Value::as_str))
            .find_map(decode_location_id);
        if let Some(id) = decoded {
            return Some(ExtractedRound {
                id: LocationId::new(id),
                source: probe.source,
                coordinates: coordinates_of(parent).or_else(|| coordinates_of(round)),
            });
        }
    }
    None
}

/// Accepts either a whole game record or a single round.
///
/// For games, the current round is the 1-based `round` counter when it
/// points inside `rounds`, otherwise the last round.
#[must_use]
pub fn extract_current_round(payload: &Value) -> Option<ExtractedRound> {
    let Some(rounds) = payload.get("rounds").and_then(Value::as_array) else {
        return extract_round(payload);
    };
    if rounds.is_empty() {
        log::debug!("Game payload has no rounds yet");
        return None;
    }
    let current = payload
        .get("round")
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| (1..=rounds.len()).contains(n))
        .map_or(rounds.len() - 1, |n| n - 1);
    extract_round(&rounds[current])
}

fn coordinates_of(object: &Value) -> Option<Coordinates> {
    let lat = object.get("lat").and_then(number)?;
    let lng = object
        .get("lng")
        .or_else(|| object.get("lon"))
        .and_then(number)?;
    Coordinates::new(lat, lng)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn prefers_panorama_question_payload() {
        let round = json!({
            "panoramaQuestionPayload": {"panorama": {"panoId": "DEEP_PANORAMA_1", "lat": 1.5, "lng": 2.5}},
            "location": {"panoId": "LOCATION_PANO"},
            "panoId": "TOP_LEVEL_PANO",
        });
        let found = extract_round(&round).unwrap();
        assert_eq!(found.id.as_str(), "DEEP_PANORAMA_1");
        assert_eq!(found.source, IdSource::PanoramaQuestion);
        assert_eq!(found.coordinates, Coordinates::new(1.5, 2.5));
    }

    #[test]
    fn skips_empty_fields_in_precedence_order() {
        let round = json!({
            "location": {"panoId": ""},
            "panoid": "   ",
            "streakLocationCode": "se-streak-code",
        });
        let found = extract_round(&round).unwrap();
        assert_eq!(found.id.as_str(), "se-streak-code");
        assert_eq!(found.source, IdSource::StreakCode);
    }

    #[test]
    fn decodes_hex_identifiers() {
        let canonical = "CAoSLEFGMVFpcE1fX2JqYW";
        let hex: String = canonical.bytes().map(|b| format!("{b:02X}")).collect();
        let round = json!({"panoId": hex, "lat": 10, "lng": "20"});
        let found = extract_round(&round).unwrap();
        assert_eq!(found.id.as_str(), canonical);
        assert_eq!(found.source, IdSource::TopLevel);
        assert_eq!(found.coordinates, Coordinates::new(10.0, 20.0));
    }

    #[test]
    fn ignores_non_object_shapes() {
        let round = json!({"location": "somewhere", "panorama": 7});
        assert_eq!(extract_canonical_id(&round), None);
        assert_eq!(extract_canonical_id(&json!(null)), None);
    }

    #[test]
    fn picks_current_round_of_a_game() {
        let game = json!({
            "round": 2,
            "rounds": [
                {"panoId": "FIRST_ROUND_PANO"},
                {"panoId": "SECOND_ROUND_PANO"},
                {"panoId": "THIRD_ROUND_PANO"},
            ],
        });
        let found = extract_current_round(&game).unwrap();
        assert_eq!(found.id.as_str(), "SECOND_ROUND_PANO");
    }

    #[test]
    fn falls_back_to_last_round() {
        let game = json!({
            "round": 9,
            "rounds": [{"panoId": "FIRST_ROUND_PANO"}, {"panoId": "LAST_ROUND_PANO"}],
        });
        assert_eq!(
            extract_current_round(&game).map(|r| r.id.into_string()),
            Some("LAST_ROUND_PANO".to_string())
        );
        assert_eq!(extract_current_round(&json!({"rounds": []})), None);
    }

    #[test]
    fn bare_panorama_object_is_not_a_source() {
        let round = json!({"panorama": {"panoId": "STRAY_PANORAMA_1"}});
        assert_eq!(extract_round(&round), None);

        let round = json!({
            "panorama": {"panoId": "STRAY_PANORAMA_1"},
            "location": {"panoId": "LOCATION_PANO_1"},
        });
        let found = extract_round(&round).unwrap();
        assert_eq!(found.id.as_str(), "LOCATION_PANO_1");
        assert_eq!(found.source, IdSource::Location);
    }

    #[test]
    fn live_question_shape_is_recognized() {
        let payload = json!({
            "question": {"panoramaQuestionPayload": {"panorama": {"panoId": "LIVE_CHALLENGE_PANO"}}}
        });
        assert_eq!(
            extract_current_round(&payload).map(|r| r.source),
            Some(IdSource::PanoramaQuestion)
        );
    }
}
