//! Path module
//!
//! A `DocPath` addresses a nested value inside a document, written as
//! slash-separated segments (e.g. "123/456/contract"). Segments are matched
//! against object keys.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

/// A path inside a document (e.g., "guild/user/contract")
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    /// Create a new empty path
    pub fn new() -> Self {
        DocPath { segments: Vec::new() }
    }

    /// Create a path from already split segments. Empty segments are dropped.
    pub fn from_segments<I, T>(segments: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        DocPath {
            segments: segments
                .into_iter()
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Get the number of segments in the path
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the path is empty
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get all segments in the path
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Get a specific segment by index
    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// Follow the path through `doc`. An empty path resolves to `doc` itself.
    ///
    /// Only objects are descended into; reaching an array or scalar before
    /// the last segment yields `None`.
    pub fn resolve<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        let mut current = doc;
        for segment in &self.segments {
            let map = current.as_object()?;
            let key = matching_key(map, segment)?;
            current = map.get(&key)?;
        }
        Some(current)
    }

    /// Remove the value addressed by this path from `doc` and return it.
    ///
    /// Returns `None` (and leaves `doc` untouched) when any segment fails
    /// to resolve or the path is empty.
    pub fn remove_from(&self, doc: &mut Value) -> Option<Value> {
        let (last, parents) = self.segments.split_last()?;

        let mut current = doc;
        for segment in parents {
            let map = current.as_object_mut()?;
            let key = matching_key(map, segment)?;
            current = map.get_mut(&key)?;
        }

        let map = current.as_object_mut()?;
        let key = matching_key(map, last)?;
        map.shift_remove(&key)
    }

    /// Wrap `payload` in one object per segment so that merging the result
    /// into a document places `payload` at this path.
    pub fn nest(&self, payload: Value) -> Value {
        self.segments.iter().rev().fold(payload, |inner, segment| {
            let mut map = Map::new();
            map.insert(segment.clone(), inner);
            Value::Object(map)
        })
    }
}

/// Find the key in `map` that `segment` refers to.
///
/// A direct match wins. Otherwise the segment is read as an integer and
/// looked up by its canonical decimal form, so "007" or " 7" find "7".
fn matching_key(map: &Map<String, Value>, segment: &str) -> Option<String> {
    if map.contains_key(segment) {
        return Some(segment.to_string());
    }

    let canonical = segment.trim().parse::<i128>().ok()?.to_string();
    if map.contains_key(&canonical) {
        Some(canonical)
    } else {
        None
    }
}

impl FromStr for DocPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DocPath::from_segments(s.split('/')))
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl From<&str> for DocPath {
    fn from(s: &str) -> Self {
        DocPath::from_segments(s.split('/'))
    }
}

impl From<String> for DocPath {
    fn from(s: String) -> Self {
        DocPath::from(s.as_str())
    }
}

impl From<&String> for DocPath {
    fn from(s: &String) -> Self {
        DocPath::from(s.as_str())
    }
}

impl From<&DocPath> for DocPath {
    fn from(path: &DocPath) -> Self {
        path.clone()
    }
}

impl<T: ToString> From<&[T]> for DocPath {
    fn from(parts: &[T]) -> Self {
        DocPath::from_segments(parts.iter().map(ToString::to_string))
    }
}

impl<T: ToString> From<Vec<T>> for DocPath {
    fn from(parts: Vec<T>) -> Self {
        DocPath::from_segments(parts)
    }
}

impl<T: ToString, const N: usize> From<[T; N]> for DocPath {
    fn from(parts: [T; N]) -> Self {
        DocPath::from_segments(parts)
    }
}

macro_rules! path_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for DocPath {
                fn from(segment: $t) -> Self {
                    DocPath { segments: vec![segment.to_string()] }
                }
            }
        )*
    };
}

path_from_int!(i32, i64, u32, u64, usize);
