//! Safe path lookups into loosely-typed JSON documents.

use serde_json::{Map, Value};

/// Outcome of following a key path through a JSON tree.
///
/// A missing key, a `null`, or a value of the wrong shape along the way all
/// yield [`Lookup::Missing`]; lookups never fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a Value),
    /// The first path segment that could not be followed.
    Missing { segment: String },
}

/// Follows `path` from `root`, one object key per segment.
#[must_use]
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Lookup<'a> {
    let mut current = root;
    for segment in path {
        match current.as_object().and_then(|obj| obj.get(*segment)) {
            Some(Value::Null) | None => {
                return Lookup::Missing {
                    segment: (*segment).to_owned(),
                };
            }
            Some(next) => current = next,
        }
    }
    Lookup::Found(current)
}

impl<'a> Lookup<'a> {
    #[must_use]
    pub fn value(&self) -> Option<&'a Value> {
        match self {
            Lookup::Found(v) => Some(*v),
            Lookup::Missing { .. } => None,
        }
    }

    #[must_use]
    pub fn object(&self) -> Option<&'a Map<String, Value>> {
        self.value().and_then(Value::as_object)
    }

    #[must_use]
    pub fn array(&self) -> Option<&'a Vec<Value>> {
        self.value().and_then(Value::as_array)
    }

    #[must_use]
    pub fn str(&self) -> Option<&'a str> {
        self.value().and_then(Value::as_str)
    }

    /// `true` only for a JSON boolean `true`.
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.value().and_then(Value::as_bool).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn follows_nested_keys() {
        let doc = json!({"name": {"short": "AirPods Pro 2"}});
        assert_eq!(lookup(&doc, &["name", "short"]).str(), Some("AirPods Pro 2"));
    }

    #[test]
    fn reports_first_missing_segment() {
        let doc = json!({"name": {"long": "x"}});
        assert_eq!(
            lookup(&doc, &["name", "short", "text"]),
            Lookup::Missing {
                segment: "short".to_owned()
            }
        );
    }

    #[test]
    fn type_mismatch_is_missing() {
        let doc = json!({"name": "flat string"});
        assert!(lookup(&doc, &["name", "short"]).value().is_none());
        assert!(lookup(&doc, &["name"]).object().is_none());
    }

    #[test]
    fn null_counts_as_missing() {
        let doc = json!({"fulfillmentOptions": null});
        assert!(matches!(
            lookup(&doc, &["fulfillmentOptions"]),
            Lookup::Missing { .. }
        ));
    }

    #[test]
    fn is_true_requires_boolean() {
        let doc = json!({"a": true, "b": "true", "c": 1});
        assert!(lookup(&doc, &["a"]).is_true());
        assert!(!lookup(&doc, &["b"]).is_true());
        assert!(!lookup(&doc, &["c"]).is_true());
        assert!(!lookup(&doc, &["d"]).is_true());
    }

    #[test]
    fn empty_path_returns_root() {
        let doc = json!([1, 2]);
        assert_eq!(lookup(&doc, &[]).array().map(Vec::len), Some(2));
    }
}
