//! Table-driven test harness for axum router handlers.
//!
//! Declare named cases (method, URL, body, middleware, expectations) in a
//! [`TestCases`] table, then [`run`] the table against the router under
//! test. Each case goes through an in-memory request/response cycle and is
//! compared against its expected status, headers, and body; results stream
//! into an [`Outputter`].

pub mod asserter;
pub mod case;
pub mod multipart;
pub mod outputter;
pub mod runner;

pub use crate::asserter::Actual;
pub use crate::asserter::Check;
pub use crate::asserter::Expected;
pub use crate::asserter::Verdict;
pub use crate::asserter::strict_eq;
pub use crate::case::Hook;
pub use crate::case::HttpHeaders;
pub use crate::case::Middleware;
pub use crate::case::Payload;
pub use crate::case::TestCase;
pub use crate::case::TestCases;
pub use crate::case::middleware;
pub use crate::multipart::MultipartError;
pub use crate::multipart::MultipartForm;
pub use crate::outputter::Console;
pub use crate::outputter::Outputter;
pub use crate::outputter::Recorder;
pub use crate::outputter::Summary;
pub use crate::runner::CaseError;
pub use crate::runner::CapturedResponse;
pub use crate::runner::run;

/// Returns the first of two values. Handy for plucking one half of a pair
/// expression, e.g. the body of [`MultipartForm::into_parts`], inline in a
/// case literal.
pub fn first<A, B>(a: A, _b: B) -> A {
    a
}

/// Returns the second of two values.
pub fn second<A, B>(_a: A, b: B) -> B {
    b
}

#[cfg(test)]
mod test {
    use crate::first;
    use crate::second;

    #[test]
    fn pair_accessors() {
        assert_eq!(first(1, "two"), 1);
        assert_eq!(second(1, "two"), "two");
    }
}
