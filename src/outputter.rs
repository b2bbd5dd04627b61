use console::Style;

use crate::asserter::Check;
use crate::asserter::Verdict;
use crate::runner::CaseError;

/// Case-level tally of one suite run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub cases: usize,
    pub passed: usize,
    pub failed: usize,
    pub aborted: usize,
}

impl Summary {
    pub fn ok(&self) -> bool {
        self.failed == 0 && self.aborted == 0
    }
}

/// Reporting sink the harness streams results into.
pub trait Outputter {
    fn begin(&mut self, _total: usize) {}

    /// One comparison outcome of the named case.
    fn check(&mut self, case: &str, check: &Check);

    /// The named case hit a fatal setup error and ran no comparisons.
    fn abort(&mut self, case: &str, error: &CaseError);

    fn finished(&mut self, _summary: &Summary) {}
}

/// Prints progress lines as checks come in, and a summary of everything
/// that failed at the end.
#[derive(Default)]
pub struct Console {
    total: usize,
    seen: usize,
    current: Option<String>,
    failures: Vec<(String, String)>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    fn case_index(&mut self, case: &str) -> usize {
        if self.current.as_deref() != Some(case) {
            self.current = Some(case.to_string());
            self.seen += 1;
        }
        self.seen
    }
}

impl Outputter for Console {
    fn begin(&mut self, total: usize) {
        self.total = total;
        let style = Style::new().bold().cyan();
        println!("{}", style.apply_to(format!("Running {total} cases...")));
    }

    fn check(&mut self, case: &str, check: &Check) {
        let i = self.case_index(case);
        let n = self.total;

        match check.verdict {
            Verdict::Pass => println!(
                "[{i}/{n}] {} {case}: {} {}",
                console::style("✔").green().bold(),
                check.actual,
                console::style("PASS!").green().bold(),
            ),
            Verdict::Fail => {
                self.failures.push((case.to_string(), check.to_string()));
                println!(
                    "[{i}/{n}] {} {case}: {} {}",
                    console::style("✘").red().bold(),
                    check.expected,
                    console::style("FAILED!").red().bold(),
                );
            }
        }
    }

    fn abort(&mut self, case: &str, error: &CaseError) {
        let i = self.case_index(case);
        let n = self.total;

        self.failures
            .push((case.to_string(), format!("aborted: {error}")));
        println!(
            "[{i}/{n}] {} {case}: {} {error}",
            console::style("⚠").yellow().bold(),
            console::style("ABORTED!").red().bold(),
        );
    }

    fn finished(&mut self, _summary: &Summary) {
        println!();
        if self.failures.is_empty() {
            println!("{}", console::style("All cases passed! 🎉").bold().green());
            return;
        }

        println!("{}", console::style("Summary of failed cases:").bold().red());
        for (idx, (case, detail)) in self.failures.iter().enumerate() {
            println!("\n{}. {case}\n  {detail}", idx + 1);
        }
    }
}

/// Captures everything for programmatic inspection, e.g. from inside a
/// host-framework test that wants to assert on individual checks.
#[derive(Debug, Default)]
pub struct Recorder {
    pub checks: Vec<(String, Check)>,
    pub aborts: Vec<(String, String)>,
    pub summary: Option<Summary>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> impl Iterator<Item = &(String, Check)> {
        self.checks
            .iter()
            .filter(|(_, check)| check.verdict == Verdict::Fail)
    }

    pub fn ok(&self) -> bool {
        self.aborts.is_empty() && self.failures().count() == 0
    }
}

impl Outputter for Recorder {
    fn check(&mut self, case: &str, check: &Check) {
        self.checks.push((case.to_string(), check.clone()));
    }

    fn abort(&mut self, case: &str, error: &CaseError) {
        self.aborts.push((case.to_string(), error.to_string()));
    }

    fn finished(&mut self, summary: &Summary) {
        self.summary = Some(*summary);
    }
}

#[cfg(test)]
mod test {
    use axum::body::Bytes;
    use axum::http::StatusCode;

    use crate::asserter::Actual;
    use crate::asserter::Check;
    use crate::asserter::Expected;
    use crate::asserter::Verdict;
    use crate::outputter::Outputter;
    use crate::outputter::Recorder;
    use crate::outputter::Summary;

    #[test]
    fn summary_ok() {
        let mut summary = Summary {
            cases: 3,
            passed: 3,
            ..Default::default()
        };
        assert!(summary.ok());

        summary.failed = 1;
        assert!(!summary.ok());
    }

    #[test]
    fn recorder_collects_failures() {
        let mut recorder = Recorder::new();
        recorder.check(
            "ping",
            &Check {
                verdict: Verdict::Pass,
                expected: Expected::Status(200),
                actual: Actual::Status(StatusCode::OK),
            },
        );
        recorder.check(
            "ping",
            &Check {
                verdict: Verdict::Fail,
                expected: Expected::Body(b"pong".to_vec()),
                actual: Actual::Body(Bytes::from_static(b"gnop")),
            },
        );

        assert!(!recorder.ok());
        assert_eq!(recorder.failures().count(), 1);
    }
}
