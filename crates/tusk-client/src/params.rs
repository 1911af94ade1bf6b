//! Wire parameters and the options-to-parameters projection.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Scalar(String),
    /// Repeated field; its key always ends in `[]`.
    List(Vec<String>),
}

/// Parameters of one API request, keyed by wire name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, ParamValue>);

fn list_key(name: &str) -> String {
    if name.ends_with("[]") {
        name.to_string()
    } else {
        format!("{name}[]")
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.into(), ParamValue::Scalar(value.into()));
        self
    }

    /// Set a scalar parameter when a value is present.
    pub fn insert_opt(&mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> &mut Self {
        if let Some(value) = value {
            self.insert(name, value);
        }
        self
    }

    /// Set a repeated parameter, stored under `name[]`.
    pub fn insert_list<I, S>(&mut self, name: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.0.insert(list_key(name), ParamValue::List(values));
        self
    }

    /// Chaining form of [`Params::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Scalar value of `name`, if it is a scalar.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(ParamValue::Scalar(s)) => Some(s),
            _ => None,
        }
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.0.remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Merge `other` into `self`, overwriting duplicate keys.
    pub fn extend(&mut self, other: Params) {
        self.0.extend(other.0);
    }

    /// Flatten into ordered `(name, value)` pairs, one pair per list element.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.0.len());
        for (name, value) in &self.0 {
            match value {
                ParamValue::Scalar(s) => pairs.push((name.clone(), s.clone())),
                ParamValue::List(items) => {
                    pairs.extend(items.iter().map(|item| (name.clone(), item.clone())))
                }
            }
        }
        pairs
    }
}

/// Render a JSON scalar the way it goes on the wire.
pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Project an options object onto wire parameters.
///
/// Excluded keys and `null` values are dropped, arrays become `name[]`
/// repeated fields, everything else is rendered as a scalar.
pub fn project(options: &Map<String, Value>, exclude: &[&str]) -> Params {
    let mut params = Params::new();
    for (name, value) in options {
        if exclude.contains(&name.as_str()) {
            continue;
        }
        match value {
            Value::Null => {}
            Value::Array(items) => {
                let items = items.iter().filter(|v| !v.is_null()).map(scalar_text);
                params.insert_list(name, items);
            }
            scalar => {
                params.insert(name.clone(), scalar_text(scalar));
            }
        }
    }
    params
}

/// Serialise a typed options struct and project it.
pub fn project_options<T: Serialize>(options: &T, exclude: &[&str]) -> Result<Params> {
    match serde_json::to_value(options) {
        Ok(Value::Object(map)) => Ok(project(&map, exclude)),
        Ok(other) => Err(Error::InvalidArguments(format!(
            "options must serialise to an object, got {other}"
        ))),
        Err(e) => Err(Error::InvalidArguments(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_project_drops_excluded_and_null() {
        let options = as_map(json!({
            "id": "42",
            "limit": 20,
            "max_id": null,
            "only_media": true,
        }));
        let params = project(&options, &["id"]);

        assert!(!params.contains_key("id"));
        assert!(!params.contains_key("max_id"));
        assert_eq!(params.get_str("limit"), Some("20"));
        assert_eq!(params.get_str("only_media"), Some("true"));
    }

    #[test]
    fn test_project_rekeys_lists() {
        let options = as_map(json!({ "id": ["1", "2", 3] }));
        let params = project(&options, &[]);

        assert!(!params.contains_key("id"));
        assert_eq!(
            params.get("id[]"),
            Some(&ParamValue::List(vec!["1".into(), "2".into(), "3".into()]))
        );
        assert_eq!(
            params.to_pairs(),
            vec![
                ("id[]".to_string(), "1".to_string()),
                ("id[]".to_string(), "2".to_string()),
                ("id[]".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_project_does_not_mutate_input() {
        let options = as_map(json!({ "a": 1, "b": [1] }));
        let before = options.clone();
        let _ = project(&options, &["a"]);
        assert_eq!(options, before);
    }

    #[test]
    fn test_project_options_struct() {
        #[derive(Serialize)]
        struct Options {
            limit: Option<u32>,
            since_id: Option<String>,
            exclude_types: Vec<String>,
        }

        let params = project_options(
            &Options {
                limit: Some(5),
                since_id: None,
                exclude_types: vec!["follow".into()],
            },
            &[],
        )
        .unwrap();

        assert_eq!(params.get_str("limit"), Some("5"));
        assert!(!params.contains_key("since_id"));
        assert!(params.contains_key("exclude_types[]"));
    }

    #[test]
    fn test_project_options_rejects_non_objects() {
        let err = project_options(&vec![1, 2], &[]).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArguments);
    }

    #[test]
    fn test_insert_list_keeps_existing_suffix() {
        let mut params = Params::new();
        params.insert_list("id[]", ["1"]);
        params.insert_list("media_ids", ["m1", "m2"]);
        assert!(params.contains_key("id[]"));
        assert!(params.contains_key("media_ids[]"));
        assert_eq!(params.len(), 2);
    }

    proptest! {
        #[test]
        fn test_projection_never_contains_excluded(
            keys in prop::collection::btree_set("[a-z]{1,8}", 1..8),
            excluded_count in 0usize..4,
        ) {
            let keys: Vec<String> = keys.into_iter().collect();
            let excluded: Vec<&str> = keys.iter().take(excluded_count).map(String::as_str).collect();
            let options: Map<String, Value> =
                keys.iter().map(|k| (k.clone(), json!("v"))).collect();

            let params = project(&options, &excluded);
            for name in &excluded {
                prop_assert!(!params.contains_key(name));
            }
            prop_assert_eq!(params.len(), keys.len() - excluded.len().min(keys.len()));
        }

        #[test]
        fn test_sequence_values_become_bracketed(
            name in "[a-z]{1,8}",
            items in prop::collection::vec("[a-z0-9]{1,6}", 0..5),
        ) {
            let mut options = Map::new();
            options.insert(name.clone(), json!(items.clone()));

            let params = project(&options, &[]);
            prop_assert!(!params.contains_key(&name));
            prop_assert_eq!(
                params.get(&format!("{name}[]")),
                Some(&ParamValue::List(items))
            );
        }
    }
}
