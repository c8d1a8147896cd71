//! One synthesized record.

use crate::profile::Geography;
use crate::value::SampleValue;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single generated entity.
///
/// Created once per `execute()` call and never mutated afterwards. `index`
/// and `seed` are the provenance a persistence layer needs to regenerate
/// the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedEntity {
    pub index: usize,
    pub seed: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<SampleValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race: Option<SampleValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<SampleValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography: Option<Geography>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<SampleValue>,
    #[serde(default)]
    pub conditions: BTreeSet<String>,
    #[serde(default)]
    pub lab_values: BTreeMap<String, f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<SampleValue>,

    /// Generic sampled attributes; `severity` is mirrored here.
    #[serde(default)]
    pub attributes: BTreeMap<String, SampleValue>,
}

impl GeneratedEntity {
    /// Creates an empty entity for `index` with its derived seed.
    pub fn new(index: usize, seed: u64) -> Self {
        Self {
            index,
            seed,
            age: None,
            birth_date: None,
            gender: None,
            race: None,
            ethnicity: None,
            geography: None,
            severity: None,
            conditions: BTreeSet::new(),
            lab_values: BTreeMap::new(),
            coverage_type: None,
            plan_type: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn has_condition(&self, code: &str) -> bool {
        self.conditions.contains(code)
    }

    pub fn attribute(&self, name: &str) -> Option<&SampleValue> {
        self.attributes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_is_empty() {
        let entity = GeneratedEntity::new(3, 99);
        assert_eq!(entity.index, 3);
        assert_eq!(entity.seed, 99);
        assert!(entity.conditions.is_empty());
        assert!(entity.attribute("severity").is_none());
    }

    #[test]
    fn test_serialize_skips_unset_fields() {
        let mut entity = GeneratedEntity::new(0, 1);
        entity.conditions.insert("E11".into());
        entity.birth_date = NaiveDate::from_ymd_opt(1980, 2, 14);

        let json = serde_json::to_value(&entity).unwrap();
        assert!(json.get("gender").is_none());
        assert_eq!(json["birth_date"], "1980-02-14");
        assert_eq!(json["conditions"][0], "E11");

        let back: GeneratedEntity = serde_json::from_value(json).unwrap();
        assert!(back.has_condition("E11"));
    }
}
