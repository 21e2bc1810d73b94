use super::fields::Field;
use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DATE_FORMAT: &str = "%d/%m/%Y";
const TRUE: &str = "TRUE";
const FALSE: &str = "FALSE";

/// Renders a typed value the way the gateway expects it on the wire.
pub trait FieldValue {
    fn to_field_value(&self) -> String;
}

impl FieldValue for Decimal {
    /// Two decimals, rounded half away from zero: `10` becomes `10.00`.
    fn to_field_value(&self) -> String {
        let mut amount = self.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(2);
        amount.to_string()
    }
}

impl FieldValue for bool {
    fn to_field_value(&self) -> String {
        let text = if *self { TRUE } else { FALSE };
        text.to_string()
    }
}

impl FieldValue for NaiveDate {
    fn to_field_value(&self) -> String {
        self.format(DATE_FORMAT).to_string()
    }
}

impl FieldValue for Uuid {
    fn to_field_value(&self) -> String {
        self.to_string()
    }
}

impl FieldValue for str {
    fn to_field_value(&self) -> String {
        self.to_string()
    }
}

impl FieldValue for String {
    fn to_field_value(&self) -> String {
        self.clone()
    }
}

impl<T: FieldValue + ?Sized> FieldValue for &T {
    fn to_field_value(&self) -> String {
        (**self).to_field_value()
    }
}

/// Insertion-ordered `name -> value` mapping exchanged with the gateway.
///
/// Inserting an existing key overwrites its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(IndexMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, value: impl FieldValue) {
        self.0.insert(field.as_str().to_string(), value.to_field_value());
    }

    /// Inserts only when a value is present; absent optionals are never sent.
    pub fn insert_opt<V: FieldValue>(&mut self, field: Field, value: Option<V>) {
        if let Some(value) = value {
            self.insert(field, value);
        }
    }

    /// Inserts a key outside the catalog (caller-supplied additional data).
    pub fn insert_raw(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.get_raw(field.as_str())
    }

    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(field.as_str())
    }

    /// Overlays `other` on top of `self`; keys present in both take `other`'s value.
    pub fn merge(&mut self, other: &FieldMap) {
        for (name, value) in other.iter() {
            self.insert_raw(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Caller overlay merged into a request after the computed fields.
pub type AdditionalData = FieldMap;
