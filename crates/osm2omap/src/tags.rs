//! Feature properties to OSM tags.
//!
//! GDAL's OSM driver only creates columns for the keys listed in its
//! `osmconf.ini`. Every other tag lands in an `other_tags` column (or, if so
//! configured, all tags land in `all_tags`), encoded with PostgreSQL hstore
//! syntax: `"key"=>"value","key2"=>"value2"`. Those columns are decoded here
//! and merged with the plain columns.

use log::debug;
use serde_json::{Map, Value};

/// Columns holding hstore-encoded tags, in decoding order.
pub const HSTORE_COLUMNS: [&str; 2] = ["other_tags", "all_tags"];

/// Identifier columns written by the OSM driver; a feature carrying nothing
/// else has no mappable content.
pub const IDENTIFIER_KEYS: [&str; 2] = ["osm_id", "osm_way_id"];

/// Ordered tag collection with unique keys and no empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: Vec<(String, String)>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `key`. A replaced key keeps its position; an empty
    /// value removes the key instead.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        if value.is_empty() {
            self.remove(&key);
            return;
        }

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// `None` means the tag is absent; a present tag is never empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v.as_str()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True when the only tag left is an OSM identifier.
    pub fn is_identifier_only(&self) -> bool {
        match self.entries.as_slice() {
            [(key, _)] => IDENTIFIER_KEYS.contains(&key.as_str()),
            _ => false,
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = TagSet::new();
        for (key, value) in iter {
            tags.insert(key, value);
        }
        tags
    }
}

/// Text of a property value; `null` yields `None`.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Decodes an hstore string by rewriting it into a JSON object.
///
/// `"a"=>"b","c"=>"d"` becomes `{"a":"b","c":"d"}`. Anything JSON cannot
/// read (for example a bare `NULL` value) fails the whole column.
pub fn decode_hstore(hstore: &str) -> Option<Map<String, Value>> {
    let json = format!("{{{}}}", hstore.replace("\"=>\"", "\":\""));

    match serde_json::from_str::<Map<String, Value>>(&json) {
        Ok(map) => Some(map),
        Err(err) => {
            debug!("Skipping undecodable hstore column: {}", err);
            None
        }
    }
}

/// Flattens feature properties into a [`TagSet`].
///
/// Plain columns come first in their original order; decoded hstore pairs
/// override plain columns of the same name and append new keys. The hstore
/// columns themselves and every empty value are dropped.
pub fn normalize(properties: Option<&Map<String, Value>>) -> TagSet {
    let mut tags = TagSet::new();
    let Some(properties) = properties else {
        return tags;
    };

    for (key, value) in properties {
        if HSTORE_COLUMNS.contains(&key.as_str()) {
            continue;
        }
        if let Some(text) = value_text(value) {
            tags.insert(key.as_str(), text);
        }
    }

    for column in HSTORE_COLUMNS {
        let Some(Value::String(encoded)) = properties.get(column) else {
            continue;
        };
        let Some(decoded) = decode_hstore(encoded) else {
            continue;
        };
        for (key, value) in &decoded {
            if let Some(text) = value_text(value) {
                tags.insert(key.as_str(), text);
            }
        }
    }

    tags
}
