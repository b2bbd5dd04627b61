use core::fmt;
use std::fmt::Display;

use axum::body::Bytes;
use axum::http::StatusCode;

use crate::runner::CapturedResponse;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// One declared expectation of a case.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    Status(u16),
    Header { name: String, value: String },
    Body(Vec<u8>),
}

/// What the recorded response actually held for the matching [`Expected`].
/// A missing header is observed as the empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum Actual {
    Status(StatusCode),
    Header { name: String, value: String },
    Body(Bytes),
}

/// Outcome of comparing one expectation against the recorded response.
#[derive(Debug, Clone)]
pub struct Check {
    pub verdict: Verdict,
    pub expected: Expected,
    pub actual: Actual,
}

/// The provided comparison function: plain equality, byte-exact for bodies.
pub fn strict_eq(expected: &Expected, actual: &Actual) -> Verdict {
    let pass = match (expected, actual) {
        (Expected::Status(want), Actual::Status(got)) => match StatusCode::from_u16(*want) {
            Ok(want) => want == *got,
            Err(_) => false,
        },
        (Expected::Header { value: want, .. }, Actual::Header { value: got, .. }) => want == got,
        (Expected::Body(want), Actual::Body(got)) => want.as_slice() == got.as_ref(),
        _ => false,
    };

    if pass { Verdict::Pass } else { Verdict::Fail }
}

/// Runs every expectation of a case against the recorded response through
/// the injected comparison function.
pub fn check_response<E>(
    expectations: Vec<Expected>,
    response: &CapturedResponse,
    equal: &E,
) -> Vec<Check>
where
    E: Fn(&Expected, &Actual) -> Verdict,
{
    expectations
        .into_iter()
        .map(|expected| {
            let actual = observe(&expected, response);
            let verdict = equal(&expected, &actual);
            Check {
                verdict,
                expected,
                actual,
            }
        })
        .collect()
}

fn observe(expected: &Expected, response: &CapturedResponse) -> Actual {
    match expected {
        Expected::Status(_) => Actual::Status(response.status),
        Expected::Header { name, .. } => Actual::Header {
            name: name.clone(),
            value: response
                .headers
                .get(name.as_str())
                .and_then(|value| value.to_str().ok())
                .unwrap_or("")
                .to_string(),
        },
        Expected::Body(_) => Actual::Body(response.body.clone()),
    }
}

impl Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Status(code) => write!(f, "status {code}"),
            Expected::Header { name, value } => write!(f, "header {name}: {value}"),
            Expected::Body(bytes) => write!(f, "body {}", String::from_utf8_lossy(bytes)),
        }
    }
}

impl Display for Actual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actual::Status(status) => write!(f, "status {status}"),
            Actual::Header { name, value } => write!(f, "header {name}: {value}"),
            Actual::Body(bytes) => write!(f, "body {}", String::from_utf8_lossy(bytes)),
        }
    }
}

impl Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Expected: {}", self.expected)?;
        write!(f, "  Actual:   {}", self.actual)
    }
}
