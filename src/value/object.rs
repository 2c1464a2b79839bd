// Property bags

use super::Value;
use std::collections::HashMap;

/// Field name to value mapping. Insertion order is irrelevant.
pub type PropertyBag = HashMap<String, Value>;

/// A JS-like object: a property bag, immutable once handed to the guest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsObject {
    properties: PropertyBag,
}

impl JsObject {
    pub fn new(properties: PropertyBag) -> Self {
        Self { properties }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.properties.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for JsObject {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self { properties: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}
