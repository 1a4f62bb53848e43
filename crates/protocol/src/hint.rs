use crate::de;
use crate::location::Coordinates;
use crate::scope::{self, Scope};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

/// One crowdsourced hint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintRecord {
    #[serde(deserialize_with = "de::text")]
    pub id: String,

    #[serde(default, deserialize_with = "de::text")]
    pub title: String,

    #[serde(default, deserialize_with = "de::text")]
    pub description: String,

    #[serde(default, deserialize_with = "de::optional_text", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Order preserving; treated as a set.
    #[serde(default, deserialize_with = "de::tags")]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "scope::deserialize_lenient", skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    #[serde(default, deserialize_with = "de::text")]
    pub country: String,

    #[serde(default, deserialize_with = "de::optional_text", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, deserialize_with = "de::optional_text", skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,

    #[serde(default, deserialize_with = "de::coordinate", skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(default, alias = "lon", deserialize_with = "de::coordinate", skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl HintRecord {
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.lng)
    }
}

/// Flat hint collection with an id index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HintCollection {
    records: Vec<HintRecord>,
    index: HashMap<String, usize>,
}

impl HintCollection {
    /// Builds the collection; on duplicate ids the first record wins.
    #[must_use]
    pub fn new(records: Vec<HintRecord>) -> Self {
        let mut kept = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());
        for record in records {
            if record.id.is_empty() {
                log::warn!("Dropping hint without id: {:?}", record.title);
                continue;
            }
            if index.contains_key(&record.id) {
                log::warn!("Dropping duplicate hint id {}", record.id);
                continue;
            }
            index.insert(record.id.clone(), kept.len());
            kept.push(record);
        }
        Self {
            records: kept,
            index,
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HintRecord> {
        self.index.get(id).map(|&idx| &self.records[idx])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HintRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn records(&self) -> &[HintRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<HintRecord> for HintCollection {
    fn from_iter<I: IntoIterator<Item = HintRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a HintCollection {
    type Item = &'a HintRecord;
    type IntoIter = std::slice::Iter<'a, HintRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Serialize for HintCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records.iter())
    }
}

impl<'de> Deserialize<'de> for HintCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<Value>::deserialize(deserializer)?;
        let records = raw
            .into_iter()
            .enumerate()
            .filter_map(|(pos, value)| match serde_json::from_value::<HintRecord>(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    log::warn!("Skipping hint #{pos}: {err}");
                    None
                }
            })
            .collect();
        Ok(Self::new(records))
    }
}
