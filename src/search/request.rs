use std::collections::BTreeMap;

/// Query parameter carrying the search terms
pub const QUERY_PARAM: &str = "q";

/// Query parameter the listing reads its pagination cursor from
pub const CURSOR_PARAM: &str = "max_position";

/// Key/value parameters for one listing fetch
///
/// Owned by a single walk. The only mutation during a walk is writing the
/// cursor before each follow-up fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    params: BTreeMap<String, String>,
}

impl SearchRequest {
    /// Creates a request for `query` with the listing's fixed parameters
    pub fn new(query: impl Into<String>) -> Self {
        let mut params = BTreeMap::new();
        params.insert(QUERY_PARAM.to_string(), query.into());
        params.insert("f".to_string(), "tweets".to_string());
        params.insert("vertical".to_string(), "default".to_string());
        Self { params }
    }

    pub fn query(&self) -> Option<&str> {
        self.get(QUERY_PARAM)
    }

    pub fn cursor(&self) -> Option<&str> {
        self.get(CURSOR_PARAM)
    }

    pub fn set_cursor(&mut self, cursor: impl Into<String>) {
        self.set(CURSOR_PARAM, cursor);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Parameters in a stable order, ready for a query string
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_has_no_cursor() {
        let request = SearchRequest::new("#charlie");
        assert_eq!(request.query(), Some("#charlie"));
        assert_eq!(request.get("f"), Some("tweets"));
        assert_eq!(request.get("vertical"), Some("default"));
        assert_eq!(request.cursor(), None);
    }

    #[test]
    fn test_set_cursor_overwrites() {
        let mut request = SearchRequest::new("q");
        request.set_cursor("TWEET-2-1");
        request.set_cursor("TWEET-1-0");
        assert_eq!(request.cursor(), Some("TWEET-1-0"));
        assert_eq!(request.params().count(), 4);
    }
}
