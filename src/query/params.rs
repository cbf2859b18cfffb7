//! # Query Parameter Bag
//!
//! Callers pass one flat bag that mixes pagination, sorting and the search
//! term with arbitrary filter keys. The reserved keys are pulled out here;
//! everything else is left for the filter step, which drops keys that are
//! not columns.

use serde_json::{Map, Value};

/// Reserved key: page number
pub const PAGE_KEY: &str = "page";
/// Reserved key: page size
pub const LIMIT_KEY: &str = "limit";
/// Reserved key: `column:direction`
pub const SORT_KEY: &str = "sort";
/// Reserved key: free-text term
pub const SEARCH_KEY: &str = "search";

/// Sort used by filter mode when none is given
pub const DEFAULT_QUERY_SORT: &str = "createdAt:desc";
/// Sort used by search mode when none is given
pub const DEFAULT_SEARCH_SORT: &str = "createdAt:asc";

/// A destructured parameter bag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    /// Raw page value, validated later
    pub page: Option<Value>,
    /// Raw limit value, validated later
    pub limit: Option<Value>,
    /// `column:direction`
    pub sort: Option<String>,
    /// Free-text term (search mode only)
    pub search: Option<String>,
    /// Remaining keys
    pub filters: Map<String, Value>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a flat JSON object into reserved keys and filters.
    ///
    /// `page`, `limit`, `sort` and `search` are always taken out, in filter
    /// mode too, so a column with one of those names cannot be filtered on.
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let page = map.remove(PAGE_KEY);
        let limit = map.remove(LIMIT_KEY);
        let sort = map.remove(SORT_KEY).and_then(scalar_text);
        let search = map.remove(SEARCH_KEY).and_then(scalar_text);

        Self {
            page,
            limit,
            sort,
            search,
            filters: map,
        }
    }

    /// Build from a JSON value; anything but an object yields an empty bag
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map),
            _ => Self::default(),
        }
    }

    /// Build from decoded query-string pairs.
    ///
    /// A key seen more than once, or written `key[]`, becomes a list.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::from_map(group_pairs(pairs))
    }

    pub fn page(mut self, page: impl Into<Value>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Value>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) => items.into_iter().next().and_then(scalar_text),
        other => Some(other.to_string()),
    }
}

/// Group query-string pairs into a JSON object
pub fn group_pairs<I, K, V>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut map = Map::new();

    for (key, value) in pairs {
        let raw_key = key.as_ref();
        let (key, forced_list) = match raw_key.strip_suffix("[]") {
            Some(stripped) => (stripped, true),
            None => (raw_key, false),
        };
        let value = Value::String(value.into());

        match map.get_mut(key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                let value = if forced_list {
                    Value::Array(vec![value])
                } else {
                    value
                };
                map.insert(key.to_string(), value);
            }
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reserved_keys_are_destructured() {
        let params = QueryParams::from_value(json!({
            "page": "2",
            "limit": 5,
            "sort": "name:asc",
            "status": "ACTIVE",
            "bogus": 1
        }));

        assert_eq!(params.page, Some(json!("2")));
        assert_eq!(params.limit, Some(json!(5)));
        assert_eq!(params.sort.as_deref(), Some("name:asc"));
        assert!(params.search.is_none());
        assert_eq!(params.filters.len(), 2);
        assert_eq!(params.filters["status"], json!("ACTIVE"));
    }

    #[test]
    fn test_repeated_keys_become_lists() {
        let params = QueryParams::from_pairs(vec![
            ("code", "a"),
            ("code", "b"),
            ("tags[]", "x"),
            ("search", "math"),
        ]);

        assert_eq!(params.filters["code"], json!(["a", "b"]));
        assert_eq!(params.filters["tags"], json!(["x"]));
        assert_eq!(params.search.as_deref(), Some("math"));
    }

    #[test]
    fn test_search_never_reaches_filters() {
        let params = QueryParams::from_value(json!({"search": "math", "title": "alg"}));

        assert_eq!(params.search.as_deref(), Some("math"));
        assert!(!params.filters.contains_key("search"));
        assert_eq!(params.filters.len(), 1);
    }

    #[test]
    fn test_non_object_is_empty() {
        assert_eq!(QueryParams::from_value(json!([1, 2])), QueryParams::default());
    }

    #[test]
    fn test_builder_methods() {
        let params = QueryParams::new()
            .page(3)
            .limit("10")
            .sort("code:desc")
            .filter("status", "ACTIVE");
        assert_eq!(params.page, Some(json!(3)));
        assert_eq!(params.limit, Some(json!("10")));
        assert_eq!(params.filters["status"], json!("ACTIVE"));
    }
}
