use std::collections::HashMap;

pub const PROPERTY_FIRST_NAME: &str = "firstName";
pub const PROPERTY_LAST_NAME: &str = "lastName";
pub const PROPERTY_CC_NUMBER: &str = "ccNumber";
pub const PROPERTY_CC_TYPE: &str = "ccType";
pub const PROPERTY_CC_EXPIRATION_MONTH: &str = "ccExpirationMonth";
pub const PROPERTY_CC_EXPIRATION_YEAR: &str = "ccExpirationYear";
pub const PROPERTY_CC_FIRST_NAME: &str = "ccFirstName";
pub const PROPERTY_CC_LAST_NAME: &str = "ccLastName";
pub const PROPERTY_TRANSIT_ROUTING_NUMBER: &str = "trn";
pub const PROPERTY_ACCOUNT_NUMBER: &str = "accountNumber";
pub const PROPERTY_ACCOUNT_TYPE: &str = "accountType";
pub const PROPERTY_TOKEN: &str = "token";
pub const PROPERTY_ADDRESS1: &str = "address1";
pub const PROPERTY_STATE: &str = "state";
pub const PROPERTY_ZIP: &str = "zip";
pub const PROPERTY_PHONE: &str = "phone";
pub const PROPERTY_EMAIL: &str = "email";

/// Caller-supplied overrides attached to a single payment call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginProperties(HashMap<String, String>);

impl PluginProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Non-blank override for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Caller override, else the stored `fallback`, else nothing.
    pub fn resolve(&self, key: &str, fallback: Option<&str>) -> Option<String> {
        self.get(key).or(fallback).map(str::to_string)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PluginProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
