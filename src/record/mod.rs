//! Records: the atomic unit the document engine stores.
//!
//! A record is a flat map of string fields. A handful of fields have
//! engine-defined meaning:
//!
//! | Field   | Meaning                                     |
//! |---------|---------------------------------------------|
//! | `title` | Identity, unique within a record set        |
//! | `type`  | Content type (`application/javascript`, ..) |
//! | `text`  | Body                                        |
//! | `tags`  | String list (see [`list`])                  |
//!
//! Everything else is free-form metadata. Fields are kept in a `BTreeMap`
//! so serialization always emits keys in sorted order.

mod fields;
mod list;

pub use fields::{parse_fields, parse_tid};
pub use list::{parse_string_list, stringify_list};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TITLE: &str = "title";
pub const TYPE: &str = "type";
pub const TEXT: &str = "text";
pub const TAGS: &str = "tags";
pub const MODULE_TYPE: &str = "module-type";

/// A single record with string-keyed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    /// Create a record with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        let mut record = Self::default();
        record.set(TITLE, title);
        record
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn title(&self) -> Option<&str> {
        self.get(TITLE).filter(|t| !t.is_empty())
    }

    pub fn kind(&self) -> Option<&str> {
        self.get(TYPE).filter(|t| !t.is_empty())
    }

    pub fn text(&self) -> Option<&str> {
        self.get(TEXT)
    }

    pub fn tags(&self) -> Vec<String> {
        self.get(TAGS).map(parse_string_list).unwrap_or_default()
    }

    pub fn set_tags<S: AsRef<str>>(&mut self, tags: &[S]) {
        if tags.is_empty() {
            self.remove(TAGS);
        } else {
            self.set(TAGS, stringify_list(tags));
        }
    }

    /// Copy every field of `other` into this record, overwriting on conflict.
    pub fn merge(&mut self, other: &Record) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }

    /// The same record without its body, as listed in library indexes.
    pub fn skinny(&self) -> Record {
        let mut record = self.clone();
        record.remove(TEXT);
        record
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

    /// Build a record from a JSON object, converting non-string values.
    ///
    /// Arrays become string lists, `null` drops the field, and every other
    /// scalar uses its JSON representation.
    pub fn from_json_map(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        use serde_json::Value;

        let mut record = Self::default();
        for (name, value) in map {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Array(items) => {
                    let items: Vec<String> = items
                        .iter()
                        .map(|item| match item {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect();
                    stringify_list(&items)
                }
                other => other.to_string(),
            };
            record.set(name.as_str(), value);
        }
        record
    }
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_sorted_keys() {
        let record = Record::new("b").with("zeta", "1").with("alpha", "2");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"alpha":"2","title":"b","zeta":"1"}"#);
    }

    #[test]
    fn test_empty_title_is_absent() {
        let record = Record::default().with(TITLE, "");
        assert_eq!(record.title(), None);
    }

    #[test]
    fn test_tags_roundtrip_through_field() {
        let mut record = Record::new("x");
        record.set_tags(&["$:/tags/Stylesheet", "two words"]);
        assert_eq!(record.get(TAGS), Some("$:/tags/Stylesheet [[two words]]"));
        assert_eq!(record.tags(), vec!["$:/tags/Stylesheet", "two words"]);

        record.set_tags::<&str>(&[]);
        assert!(!record.contains(TAGS));
    }

    #[test]
    fn test_from_json_map_converts_values() {
        let value = serde_json::json!({
            "title": "$:/plugins/me/foo",
            "version": 2,
            "list": ["readme", "two words"],
            "stability": null
        });
        let record = Record::from_json_map(value.as_object().unwrap());
        assert_eq!(record.title(), Some("$:/plugins/me/foo"));
        assert_eq!(record.get("version"), Some("2"));
        assert_eq!(record.get("list"), Some("readme [[two words]]"));
        assert!(!record.contains("stability"));
    }

    #[test]
    fn test_skinny_drops_text() {
        let record = Record::new("a").with(TEXT, "body").with(TYPE, "text/plain");
        let skinny = record.skinny();
        assert_eq!(skinny.text(), None);
        assert_eq!(skinny.kind(), Some("text/plain"));
    }
}
