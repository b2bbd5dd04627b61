use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::body::Bytes;
use axum::body::to_bytes;
use axum::extract::Request;
use axum::http;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header::CONTENT_TYPE;
use axum::middleware::Next;
use axum::middleware::from_fn;
use axum::response::Response;
use miette::Diagnostic;
use thiserror::Error;
use tower::ServiceExt;

use crate::asserter::Actual;
use crate::asserter::Expected;
use crate::asserter::Verdict;
use crate::asserter::check_response;
use crate::case::TestCase;
use crate::case::TestCases;
use crate::outputter::Outputter;
use crate::outputter::Summary;

/// Fatal, case-local setup failure. Aborts the case it belongs to and is
/// reported through the outputter; the rest of the suite keeps running.
#[derive(Error, Diagnostic, Debug)]
pub enum CaseError {
    #[error("method may not be empty")]
    EmptyMethod,

    #[error("url may not be empty")]
    EmptyUrl,

    #[error("invalid http method `{0}`")]
    InvalidMethod(String),

    #[error("invalid url `{0}`")]
    InvalidUrl(String),

    #[error("invalid body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    #[error("invalid expected response: {0}")]
    InvalidResponse(#[source] serde_json::Error),

    #[error("failed to build request: {0}")]
    Request(#[from] http::Error),

    #[error("failed to read recorded body: {0}")]
    ReadBody(#[source] axum::Error),
}

/// In-memory capture of one dispatched response.
#[derive(Debug)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedResponse {
    async fn capture(response: Response) -> Result<Self, CaseError> {
        let (parts, body) = response.into_parts();
        let body = to_bytes(body, usize::MAX)
            .await
            .map_err(CaseError::ReadBody)?;

        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }
}

/// Executes every case of a suite against the router under test.
///
/// Each case independently builds a request, dispatches it through a
/// test-scoped router carrying the case's middleware, and compares the
/// recorded response against the declared expectations via `equal`. Results
/// stream into `outputter`; the returned [`Summary`] is what a host test
/// asserts on.
pub async fn run<R, E>(
    cases: TestCases,
    router_under_test: R,
    outputter: &mut dyn Outputter,
    equal: E,
) -> Summary
where
    R: Fn(Router) -> Router,
    E: Fn(&Expected, &Actual) -> Verdict,
{
    let mut summary = Summary::default();
    outputter.begin(cases.len());

    for (name, mut case) in cases {
        summary.cases += 1;

        let before = case.before.take();
        let after = case.after.take();

        if let Some(hook) = before {
            hook();
        }

        match dispatch(case, &router_under_test).await {
            Ok((expectations, response)) => {
                let checks = check_response(expectations, &response, &equal);
                let failed = checks.iter().any(|check| check.verdict == Verdict::Fail);

                for check in &checks {
                    outputter.check(&name, check);
                }

                if failed {
                    summary.failed += 1;
                } else {
                    summary.passed += 1;
                }
            }
            Err(error) => {
                summary.aborted += 1;
                outputter.abort(&name, &error);
            }
        }

        // Cleanup symmetry: the after hook runs on every exit path.
        if let Some(hook) = after {
            hook();
        }
    }

    outputter.finished(&summary);
    summary
}

async fn dispatch<R>(
    case: TestCase,
    router_under_test: &R,
) -> Result<(Vec<Expected>, CapturedResponse), CaseError>
where
    R: Fn(Router) -> Router,
{
    if case.method.is_empty() {
        return Err(CaseError::EmptyMethod);
    }
    if case.url.is_empty() {
        return Err(CaseError::EmptyUrl);
    }

    let method: Method = case
        .method
        .parse()
        .map_err(|_| CaseError::InvalidMethod(case.method.clone()))?;
    let uri: Uri = case
        .url
        .parse()
        .map_err(|_| CaseError::InvalidUrl(case.url.clone()))?;

    let content_type = case.content_type().to_owned();

    let TestCase {
        middlewares,
        body,
        expected_headers,
        expected_status,
        expected_response,
        ..
    } = case;

    let mut router = router_under_test(Router::new());

    // Layers wrap the routes registered above them, so apply in reverse to
    // keep the declared middleware order as the execution order.
    for mw in middlewares.iter().rev() {
        let mw = Arc::clone(mw);
        router = router.layer(from_fn(move |req: Request, next: Next| {
            let mw = Arc::clone(&mw);
            async move { mw(req, next).await }
        }));
    }

    let body = match body {
        None => Vec::new(),
        Some(payload) => payload.into_bytes().map_err(CaseError::InvalidBody)?,
    };

    let mut request = http::Request::builder().method(method.clone()).uri(uri);
    if method != Method::GET {
        request = request.header(CONTENT_TYPE, content_type);
    }
    let request = request.body(Body::from(body))?;

    let response = match router.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    let response = CapturedResponse::capture(response).await?;

    let mut expectations = Vec::with_capacity(expected_headers.len() + 2);
    for (name, value) in expected_headers {
        expectations.push(Expected::Header { name, value });
    }
    expectations.push(Expected::Status(expected_status));
    if let Some(payload) = expected_response {
        expectations.push(Expected::Body(
            payload.into_bytes().map_err(CaseError::InvalidResponse)?,
        ));
    }

    Ok((expectations, response))
}
