//! Command-line options exposed to plugins through [`Host::opt`].
//!
//! [`Host::opt`]: quarkboard_core::Host::opt

use std::collections::BTreeMap;

use serde_json::Value;

/// Parses one `key[=value]` option.
///
/// A bare key is `true`. A value that parses as JSON is kept as JSON,
/// anything else is kept as a string: `port=8080` is a number,
/// `theme=dark` a string and `tags=["a","b"]` an array.
pub fn parse_option(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = match raw.split_once('=') {
        Some((key, value)) => (key.trim(), Some(value)),
        None => (raw.trim(), None),
    };

    if key.is_empty() {
        return Err(format!("option {raw:?} has an empty name"));
    }

    let value = match value {
        None => Value::Bool(true),
        Some(v) => serde_json::from_str(v).unwrap_or_else(|_| Value::String(v.to_string())),
    };
    Ok((key.to_string(), value))
}

/// Host option table. Later values for the same key replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    values: BTreeMap<String, Value>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut options = Self::new();
        options.extend(iter);
        options
    }
}

impl<K: Into<String>> Extend<(K, Value)> for Options {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_option() {
        assert_eq!(parse_option("debug").unwrap(), ("debug".into(), json!(true)));
        assert_eq!(parse_option("port=8080").unwrap(), ("port".into(), json!(8080)));
        assert_eq!(parse_option("theme=dark").unwrap(), ("theme".into(), json!("dark")));
        assert_eq!(
            parse_option("tags=[\"a\",\"b\"]").unwrap(),
            ("tags".into(), json!(["a", "b"]))
        );
        assert_eq!(parse_option("empty=").unwrap(), ("empty".into(), json!("")));
        assert_eq!(parse_option("url=a=b").unwrap(), ("url".into(), json!("a=b")));
        assert!(parse_option("=1").is_err());
        assert!(parse_option("").is_err());
    }

    #[test]
    fn test_later_values_win() {
        let options: Options = [("port", json!(1)), ("port", json!(2)), ("dev", json!(true))]
            .into_iter()
            .collect();
        assert_eq!(options.len(), 2);
        assert_eq!(options.get("port"), Some(&json!(2)));
        assert!(options.contains("dev"));
        assert!(!options.contains("missing"));
    }
}
