use std::collections::HashMap;
use std::collections::hash_map;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Key/value map for HTTP header fields such as Content-Type, Cache-Control,...
pub type HttpHeaders = HashMap<String, String>;

/// Zero-arg callback run around a single case, e.g. to reset shared fixtures.
pub type Hook = Box<dyn FnOnce() + Send>;

type MiddlewareFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Request interceptor run ahead of the router under test. May mutate the
/// request, typically by inserting extensions the handlers read back out.
pub type Middleware = Arc<dyn Fn(Request, Next) -> MiddlewareFuture + Send + Sync>;

/// Wraps a plain async closure into a [`Middleware`].
pub fn middleware<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req, next| -> MiddlewareFuture { Box::pin(f(req, next)) })
}

/// A request or expected-response body.
///
/// `Raw` and `Text` are sent byte-for-byte; `Structured` is serialized to
/// JSON when the case runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Raw(Vec<u8>),
    Text(String),
    Structured(serde_json::Value),
}

impl Payload {
    /// Builds a structured payload from any serializable value.
    pub fn json<T: Serialize>(value: T) -> Result<Self, serde_json::Error> {
        Ok(Self::Structured(serde_json::to_value(value)?))
    }

    pub(crate) fn into_bytes(self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::Raw(bytes) => Ok(bytes),
            Self::Text(text) => Ok(text.into_bytes()),
            Self::Structured(value) => serde_json::to_vec(&value),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Raw(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::Raw(bytes.to_vec())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}

/// Everything a single case needs to execute. Build one with struct-update
/// syntax over `Default` and hand it to [`TestCases`]; it is consumed once.
pub struct TestCase {
    pub method: String,
    pub url: String,
    pub middlewares: Vec<Middleware>,

    pub content_type: Option<String>,
    pub body: Option<Payload>,

    pub expected_headers: HttpHeaders,
    pub expected_status: u16,
    pub expected_response: Option<Payload>,

    pub before: Option<Hook>,
    pub after: Option<Hook>,
}

impl Default for TestCase {
    fn default() -> Self {
        Self {
            method: String::new(),
            url: String::new(),
            middlewares: Vec::new(),
            content_type: None,
            body: None,
            expected_headers: HttpHeaders::new(),
            expected_status: 200,
            expected_response: None,
            before: None,
            after: None,
        }
    }
}

impl TestCase {
    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// All cases of a single suite, e.g. for one endpoint. The key is the case
/// name, the value its definition. Iteration order is not deterministic.
#[derive(Default)]
pub struct TestCases(HashMap<String, TestCase>);

impl TestCases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, case: TestCase) -> Option<TestCase> {
        self.0.insert(name.into(), case)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sets a default route for every case that has not set its own.
    pub fn url(mut self, url: &str) -> Self {
        for case in self.0.values_mut() {
            if case.url.is_empty() {
                case.url = url.into();
            }
        }
        self
    }

    /// Sets a default HTTP method for every case that has not set its own.
    pub fn method(mut self, method: &str) -> Self {
        for case in self.0.values_mut() {
            if case.method.is_empty() {
                case.method = method.into();
            }
        }
        self
    }
}

impl<S: Into<String>, const N: usize> From<[(S, TestCase); N]> for TestCases {
    fn from(cases: [(S, TestCase); N]) -> Self {
        cases.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<(S, TestCase)> for TestCases {
    fn from_iter<I: IntoIterator<Item = (S, TestCase)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, case)| (name.into(), case)).collect())
    }
}

impl IntoIterator for TestCases {
    type Item = (String, TestCase);
    type IntoIter = hash_map::IntoIter<String, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use crate::case::Payload;
    use crate::case::TestCase;
    use crate::case::TestCases;

    #[test]
    fn raw_and_text_pass_through() {
        let raw = Payload::from(vec![0u8, 159, 146, 150]);
        assert_eq!(raw.into_bytes().unwrap(), vec![0u8, 159, 146, 150]);

        let text = Payload::from("not json at all {");
        assert_eq!(text.into_bytes().unwrap(), b"not json at all {".to_vec());
    }

    #[test]
    fn structured_serializes_to_canonical_json() {
        let payload = Payload::from(json!({"message": "pong"}));
        assert_eq!(payload.into_bytes().unwrap(), br#"{"message":"pong"}"#.to_vec());
    }

    #[test]
    fn json_builder_accepts_any_serialize() {
        #[derive(serde::Serialize)]
        struct Login {
            user: String,
        }

        let payload = Payload::json(Login { user: "hansi".into() }).unwrap();
        assert_eq!(payload, Payload::Structured(json!({"user": "hansi"})));
    }

    #[test]
    fn content_type_defaults_to_json() {
        let case = TestCase::default();
        assert_eq!(case.content_type(), "application/json");

        let case = TestCase {
            content_type: Some("text/plain".into()),
            ..Default::default()
        };
        assert_eq!(case.content_type(), "text/plain");
    }

    #[test]
    fn default_fillers_do_not_overwrite() {
        let cases = TestCases::from([
            ("bare", TestCase::default()),
            (
                "explicit",
                TestCase {
                    method: "POST".into(),
                    url: "/other".into(),
                    ..Default::default()
                },
            ),
        ])
        .url("/ping")
        .method("GET");

        for (name, case) in cases {
            match name.as_str() {
                "bare" => {
                    assert_eq!(case.method, "GET");
                    assert_eq!(case.url, "/ping");
                }
                "explicit" => {
                    assert_eq!(case.method, "POST");
                    assert_eq!(case.url, "/other");
                }
                other => panic!("unexpected case {other}"),
            }
        }
    }
}
