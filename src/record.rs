//! Trait Records
//!
//! Read-only snapshot of one animal's genetic evaluation as delivered by the
//! persistence/import layer. Values live either at the top level or inside one
//! of four well-known nested blobs (`genetic_data`, `main_indices`,
//! `reliabilities`, `haplotypes`). Nothing here interprets trait names; that is
//! the resolver's job.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Which side of the mating a record plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Dam,
    Sire,
}

/// Nested sub-maps a record may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blob {
    /// Raw genetic data as imported (every spreadsheet column)
    GeneticData,
    /// Index summary extracted at import time
    MainIndices,
    /// Per-trait reliabilities (`milk_rel`, ...)
    Reliabilities,
    /// Haplotype status by marker (`hh1` -> "Free")
    Haplotypes,
}

impl Blob {
    pub const ALL: [Blob; 4] = [
        Blob::GeneticData,
        Blob::MainIndices,
        Blob::Reliabilities,
        Blob::Haplotypes,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Blob::GeneticData => "genetic_data",
            Blob::MainIndices => "main_indices",
            Blob::Reliabilities => "reliabilities",
            Blob::Haplotypes => "haplotypes",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.key() == key)
    }
}

/// A single stored value
///
/// Deserialization never fails: anything that is neither a number nor a string
/// (null, arrays, objects) is kept as `Missing`, booleans become 0/1.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FieldValue {
    /// Numeric view: numbers as-is, numeric strings parsed. Non-finite values are rejected.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(v) => *v,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldValue::Missing => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// Identifier view: trimmed text, or a number (integral values without `.0`)
    pub fn as_identifier(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then_some(Cow::Borrowed(trimmed))
            }
            FieldValue::Number(n) if n.is_finite() => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(Cow::Owned((*n as i64).to_string()))
                } else {
                    Some(Cow::Owned(n.to_string()))
                }
            }
            _ => None,
        }
    }

    fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map_or(FieldValue::Missing, FieldValue::Number),
            serde_json::Value::String(s) => FieldValue::Text(s),
            serde_json::Value::Bool(b) => FieldValue::Number(if b { 1.0 } else { 0.0 }),
            _ => FieldValue::Missing,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Number(v) => serializer.serialize_f64(*v),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Missing => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(FieldValue::from_json)
    }
}

type FieldMap = FxHashMap<String, FieldValue>;

/// One animal's trait record (dam or sire)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraitRecord {
    fields: FieldMap,
    blobs: FxHashMap<Blob, FieldMap>,
}

impl TraitRecord {
    /// Empty record carrying only an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self::default().with_text("id", id)
    }

    pub fn with_value(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.insert(key.into(), FieldValue::Number(value));
        self
    }

    pub fn with_text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), FieldValue::Text(value.into()));
        self
    }

    /// Set `{trait}_rel` at the top level
    pub fn with_reliability(self, trait_key: &str, reliability: f64) -> Self {
        self.with_value(format!("{trait_key}_rel"), reliability)
    }

    pub fn with_blob_value(
        mut self,
        blob: Blob,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.blobs
            .entry(blob)
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn insert_blob_value(&mut self, blob: Blob, key: impl Into<String>, value: FieldValue) {
        self.blobs.entry(blob).or_default().insert(key.into(), value);
    }

    /// Store a blob given as a JSON object or JSON-encoded string; `false` if undecodable
    pub fn insert_blob_json(&mut self, blob: Blob, value: serde_json::Value) -> bool {
        match decode_blob(value) {
            Some(values) => {
                self.blobs.entry(blob).or_default().extend(values);
                true
            }
            None => false,
        }
    }

    /// Top-level field, `None` when absent or stored as missing
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key).filter(|v| !v.is_missing())
    }

    pub fn blob(&self, blob: Blob) -> Option<&FxHashMap<String, FieldValue>> {
        self.blobs.get(&blob)
    }

    pub fn blob_field(&self, blob: Blob, key: &str) -> Option<&FieldValue> {
        self.blobs
            .get(&blob)
            .and_then(|m| m.get(key))
            .filter(|v| !v.is_missing())
    }

    /// Top-level text field, ignoring empty strings
    pub fn text(&self, key: &str) -> Option<&str> {
        self.field(key)
            .and_then(FieldValue::as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Top-level identifier field, text or numeric
    pub fn identifier(&self, key: &str) -> Option<Cow<'_, str>> {
        self.field(key).and_then(FieldValue::as_identifier)
    }

    pub fn id(&self) -> Option<Cow<'_, str>> {
        ["id", "reg_id", "code"]
            .iter()
            .find_map(|k| self.identifier(k))
    }

    pub fn identity(&self) -> AnimalIdentity {
        AnimalIdentity {
            id: self.id().map(Cow::into_owned),
            code: self.identifier("code").map(Cow::into_owned),
            name: self.text("name").map(str::to_string),
            source: self.text("source").map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.blobs.values().all(|m| m.is_empty())
    }
}

/// Identity fields echoed back in results
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimalIdentity {
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Serialize for TraitRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let fields: BTreeMap<&String, &FieldValue> = self.fields.iter().collect();
        let blobs: BTreeMap<Blob, BTreeMap<&String, &FieldValue>> = self
            .blobs
            .iter()
            .map(|(blob, m)| (*blob, m.iter().collect()))
            .collect();

        let mut map = serializer.serialize_map(Some(fields.len() + blobs.len()))?;
        for (key, value) in fields {
            map.serialize_entry(key, value)?;
        }
        for (blob, values) in &blobs {
            map.serialize_entry(blob.key(), values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TraitRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut record = TraitRecord::default();

        for (key, value) in raw {
            match Blob::from_key(&key) {
                Some(blob) => {
                    if let Some(values) = decode_blob(value) {
                        record.blobs.insert(blob, values);
                    }
                }
                None => {
                    record.fields.insert(key, FieldValue::from_json(value));
                }
            }
        }

        Ok(record)
    }
}

/// Decode a nested blob. Accepts an object or a JSON-encoded object string.
pub(crate) fn decode_blob(value: serde_json::Value) -> Option<FieldMap> {
    let object = match value {
        serde_json::Value::Object(map) => map,
        serde_json::Value::String(s) => match serde_json::from_str::<serde_json::Value>(&s) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => return None,
        },
        _ => return None,
    };

    Some(
        object
            .into_iter()
            .map(|(k, v)| (k, FieldValue::from_json(v)))
            .collect(),
    )
}
