//! Structured selector queries.
//!
//! A [`Selector`] is a field-equality filter in the shape document stores expect:
//!
//! ```text
//! {"selector": {"patientId": "P001"}}
//! ```
//!
//! Caller-supplied values are only ever stored as JSON values and rendered through
//! `serde_json`, so a patient identifier containing quotes or braces is matched literally and
//! cannot change the structure of the query.

use crate::constants::PATIENT_ID_FIELD;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selector {
    fields: Map<String, Value>,
}

impl Selector {
    /// An empty selector, which matches every JSON object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality constraint on `field`, replacing any earlier constraint on it.
    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Selects the medical records owned by `patient_id`.
    pub fn records_for_patient(patient_id: &str) -> Self {
        Self::new().field_eq(PATIENT_ID_FIELD, patient_id)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The full query document, `{"selector": {...}}`.
    pub fn to_query(&self) -> Value {
        let mut query = Map::new();
        query.insert("selector".into(), Value::Object(self.fields.clone()));
        Value::Object(query)
    }

    /// The query document rendered as a JSON string for engines that take query text.
    pub fn to_query_string(&self) -> String {
        self.to_query().to_string()
    }

    /// Returns true when `document` is an object whose fields equal every constraint.
    pub fn matches(&self, document: &Value) -> bool {
        let Value::Object(doc) = document else {
            return false;
        };

        self.fields
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}
