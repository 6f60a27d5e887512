//! Document shapes
//!
//! The store keeps whatever JSON it was given. Over its life a single key
//! may hold a toggle string, a list of ids, or a nested mapping; callers
//! that care use `DocumentShape` to tell these apart after a read.

use serde_json::{Map, Value};

/// A simple on/off switch stored as "On" / "Off"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Toggle::On => "On",
            Toggle::Off => "Off",
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Toggle::On)
    }
}

/// The recognised shapes of a stored document
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentShape {
    /// "On" or "Off"
    Toggle(Toggle),
    /// A list of numeric ids, stored as strings or numbers
    IdList(Vec<u64>),
    /// A nested mapping, typically guild id -> ...
    Mapping(Map<String, Value>),
    /// Anything else
    Other(Value),
}

impl DocumentShape {
    /// Classify a document
    pub fn classify(value: Value) -> Self {
        match value {
            Value::String(s) => match s.as_str() {
                "On" => DocumentShape::Toggle(Toggle::On),
                "Off" => DocumentShape::Toggle(Toggle::Off),
                _ => DocumentShape::Other(Value::String(s)),
            },
            Value::Array(items) => match parse_ids(&items) {
                Some(ids) => DocumentShape::IdList(ids),
                None => DocumentShape::Other(Value::Array(items)),
            },
            Value::Object(map) => DocumentShape::Mapping(map),
            other => DocumentShape::Other(other),
        }
    }

    /// Turn the shape back into a storable value. Ids are written as
    /// strings, matching how the store persists integers.
    pub fn into_value(self) -> Value {
        match self {
            DocumentShape::Toggle(t) => Value::String(t.as_str().to_string()),
            DocumentShape::IdList(ids) => {
                Value::Array(ids.into_iter().map(|id| Value::String(id.to_string())).collect())
            }
            DocumentShape::Mapping(map) => Value::Object(map),
            DocumentShape::Other(value) => value,
        }
    }

    pub fn as_toggle(&self) -> Option<Toggle> {
        match self {
            DocumentShape::Toggle(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_ids(&self) -> Option<&[u64]> {
        match self {
            DocumentShape::IdList(ids) => Some(ids),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Map<String, Value>> {
        match self {
            DocumentShape::Mapping(map) => Some(map),
            _ => None,
        }
    }
}

fn parse_ids(items: &[Value]) -> Option<Vec<u64>> {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_toggle() {
        assert_eq!(DocumentShape::classify(json!("On")).as_toggle(), Some(Toggle::On));
        assert_eq!(DocumentShape::classify(json!("Off")).as_toggle(), Some(Toggle::Off));
        assert_eq!(
            DocumentShape::classify(json!("maybe")),
            DocumentShape::Other(json!("maybe"))
        );
    }

    #[test]
    fn test_classify_id_list() {
        let shape = DocumentShape::classify(json!(["123", 456, "789"]));
        assert_eq!(shape.as_ids(), Some(&[123u64, 456, 789][..]));
        assert_eq!(shape.into_value(), json!(["123", "456", "789"]));

        let mixed = DocumentShape::classify(json!(["123", "abc"]));
        assert!(matches!(mixed, DocumentShape::Other(_)));
    }

    #[test]
    fn test_classify_mapping() {
        let shape = DocumentShape::classify(json!({"1": {"role": "2"}}));
        assert_eq!(shape.as_mapping().map(|m| m.len()), Some(1));
        assert!(DocumentShape::classify(json!(null)).as_mapping().is_none());
    }
}
