use http::{HeaderMap, Method};

/// Matcher for lookup requests
#[derive(Debug, Clone, Default)]
pub struct RequestMatcher {
    pub(crate) method: Option<Method>,
    pub(crate) path: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) query: Vec<(String, String)>,
}

impl RequestMatcher {
    /// Create a new matcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Match a GET request to `path`, the shape every uniqueness lookup has
    pub fn lookup(path: impl Into<String>) -> Self {
        Self::new().method(Method::GET).path(path)
    }

    /// Match a specific HTTP method
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Match a specific path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Match a specific header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Match a decoded query parameter. Other parameters are ignored.
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Check if the matcher matches a request. `query` is the raw,
    /// still-encoded query string.
    pub fn matches(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        headers: &HeaderMap,
    ) -> bool {
        if self.method.as_ref().is_some_and(|m| m != method) {
            return false;
        }

        if self.path.as_deref().is_some_and(|p| p != path) {
            return false;
        }

        let headers_match = self.headers.iter().all(|(k, v)| {
            headers
                .get(k.as_str())
                .is_some_and(|actual| actual == v.as_str())
        });
        if !headers_match {
            return false;
        }

        if self.query.is_empty() {
            return true;
        }
        let actual = decode_query(query);
        self.query.iter().all(|expected| actual.contains(expected))
    }
}

/// Decode a raw query string into key/value pairs. Malformed input decodes
/// to nothing.
pub fn decode_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn method_strategy() -> impl Strategy<Value = Method> {
        prop_oneof![
            Just(Method::GET),
            Just(Method::POST),
            Just(Method::PUT),
            Just(Method::DELETE),
            Just(Method::HEAD),
        ]
    }

    fn path_strategy() -> impl Strategy<Value = String> {
        prop::string::string_regex("/[a-z]{3,8}(/[a-z]{1,5})?").unwrap()
    }

    // Values as typed into a field: spaces, punctuation, non-ASCII
    fn value_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z0-9]{1,12}",
            Just("john doe".to_string()),
            Just("a&b=c".to_string()),
            Just("ünïcödé".to_string()),
            Just("100%".to_string()),
        ]
    }

    fn encode(pairs: &[(&str, &str)]) -> String {
        serde_urlencoded::to_string(pairs).unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_empty_matcher_matches_all(
            method in method_strategy(),
            path in path_strategy(),
            value in value_strategy(),
        ) {
            let query = encode(&[("q", value.as_str())]);
            prop_assert!(RequestMatcher::new().matches(&method, &path, Some(&query), &HeaderMap::new()));
            prop_assert!(RequestMatcher::new().matches(&method, &path, None, &HeaderMap::new()));
        }

        #[test]
        fn prop_query_param_matches_encoded_value(
            path in path_strategy(),
            value in value_strategy(),
            other in value_strategy(),
        ) {
            let matcher = RequestMatcher::lookup(path.clone()).query_param("q", value.clone());
            let headers = HeaderMap::new();

            let query = encode(&[("q", value.as_str())]);
            prop_assert!(matcher.matches(&Method::GET, &path, Some(&query), &headers));

            if value != other {
                let query = encode(&[("q", other.as_str())]);
                prop_assert!(!matcher.matches(&Method::GET, &path, Some(&query), &headers));
            }

            // Parameter under a different name does not count
            let query = encode(&[("term", value.as_str())]);
            prop_assert!(!matcher.matches(&Method::GET, &path, Some(&query), &headers));
            prop_assert!(!matcher.matches(&Method::GET, &path, None, &headers));
        }

        #[test]
        fn prop_extra_query_params_ignored(path in path_strategy(), value in value_strategy()) {
            let matcher = RequestMatcher::lookup(path.clone()).query_param("q", value.clone());
            let query = encode(&[("page", "2"), ("q", value.as_str()), ("_", "123")]);
            prop_assert!(matcher.matches(&Method::GET, &path, Some(&query), &HeaderMap::new()));
        }

        #[test]
        fn prop_lookup_requires_get(
            method in method_strategy(),
            path in path_strategy(),
        ) {
            let matcher = RequestMatcher::lookup(path.clone());
            let matched = matcher.matches(&method, &path, None, &HeaderMap::new());
            prop_assert_eq!(matched, method == Method::GET);
        }

        #[test]
        fn prop_path_matcher_exact(
            target_path in path_strategy(),
            other_path in path_strategy(),
        ) {
            let matcher = RequestMatcher::new().path(target_path.clone());
            let headers = HeaderMap::new();

            prop_assert!(matcher.matches(&Method::GET, &target_path, None, &headers));
            if target_path != other_path {
                prop_assert!(!matcher.matches(&Method::GET, &other_path, None, &headers));
            }
        }
    }

    #[test]
    fn header_matcher_requires_exact_value() {
        let matcher = RequestMatcher::new().header("accept", "application/json");

        let mut headers = HeaderMap::new();
        assert!(!matcher.matches(&Method::GET, "/", None, &headers));

        headers.insert("accept", "text/html".parse().unwrap());
        assert!(!matcher.matches(&Method::GET, "/", None, &headers));

        headers.insert("accept", "application/json".parse().unwrap());
        assert!(matcher.matches(&Method::GET, "/", None, &headers));
    }

    #[test]
    fn query_is_form_decoded() {
        assert!(decode_query(None).is_empty());
        assert_eq!(
            decode_query(Some("q=john+doe&x=%C3%BC")),
            vec![
                ("q".to_string(), "john doe".to_string()),
                ("x".to_string(), "ü".to_string())
            ]
        );
    }
}
