//! Concurrent test execution and verdicting.
//!
//! The harness fans out one task per selected test with no pool cap, records
//! captured stdout in a shared map keyed by test id, and only starts judging
//! once every launched program has finished. First completion for an id
//! wins; a duplicate completion can never overwrite a recorded entry. A
//! launch failure in any task aborts the whole run after the join. Verdicts
//! come from a line-level diff of expected against actual output, computed
//! in the tests' original order.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use difference::{Changeset, Difference};
use parking_lot::Mutex;

use crate::errors::KavaError;
use crate::program::CompiledProgram;
use crate::spec::TestCase;

/// How one line of a failing test's output relates to the expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Unchanged,
    /// Present in actual output only.
    Inserted,
    /// Present in expected output only.
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffKind,
    pub text: String,
}

/// Pass/fail outcome plus rendered diff for one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub id: u32,
    pub passed: bool,
    pub diff: Vec<DiffLine>,
}

/// Execution knobs for one harness run.
#[derive(Debug, Clone, Default)]
pub struct HarnessConfig {
    /// Stop reporting verdicts at the first failure. Every program still
    /// runs to completion; only the verdict walk is cut short.
    pub fail_fast: bool,
    /// Kill any test subprocess that outlives this bound.
    pub timeout: Option<Duration>,
}

/// Runs every test concurrently against `program`, then judges them in order.
pub fn execute<P: CompiledProgram>(
    program: &P,
    tests: &[TestCase],
    config: &HarnessConfig,
) -> Result<Vec<Verdict>, KavaError> {
    let captured: Mutex<HashMap<u32, String>> = Mutex::new(HashMap::with_capacity(tests.len()));
    let captured_ref = &captured;

    // The scope is the join-all barrier: nothing below it runs until every
    // launched program has finished, success or failure.
    let outcomes: Vec<Result<(), KavaError>> = thread::scope(|scope| {
        let handles: Vec<_> = tests
            .iter()
            .map(|test| {
                scope.spawn(move || -> Result<(), KavaError> {
                    let stdout = program.run(&test.args, config.timeout)?;
                    captured_ref.lock().entry(test.id).or_insert(stdout);
                    Ok(())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    });
    for outcome in outcomes {
        outcome?;
    }

    let captured = captured.into_inner();
    let mut verdicts = Vec::with_capacity(tests.len());
    for test in tests {
        // A missing entry cannot happen once every task succeeded, but an
        // absent id must judge against empty output rather than crash.
        let actual = captured.get(&test.id).map(String::as_str).unwrap_or("");
        let verdict = judge(test, actual);
        let failed = !verdict.passed;
        verdicts.push(verdict);
        if failed && config.fail_fast {
            break;
        }
    }
    Ok(verdicts)
}

/// Line-diffs expected against actual output for one test.
fn judge(test: &TestCase, actual: &str) -> Verdict {
    let changeset = Changeset::new(&test.expected_stdout, actual, "\n");
    let mut diff = Vec::new();
    let mut passed = true;

    for chunk in &changeset.diffs {
        let (kind, text) = match chunk {
            Difference::Same(text) => (DiffKind::Unchanged, text),
            Difference::Add(text) => {
                passed = false;
                (DiffKind::Inserted, text)
            }
            Difference::Rem(text) => {
                passed = false;
                (DiffKind::Deleted, text)
            }
        };
        for line in text.split('\n') {
            diff.push(DiffLine {
                kind,
                text: line.to_string(),
            });
        }
    }

    Verdict {
        id: test.id,
        passed,
        diff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: u32, arg: &str, expected: &str) -> TestCase {
        TestCase {
            id,
            args: vec![arg.to_string()],
            expected_stdout: expected.to_string(),
        }
    }

    #[test]
    fn identical_output_judges_as_pass() {
        let verdict = judge(&case(1, "5", "25\n"), "25\n");
        assert!(verdict.passed);
        assert!(verdict.diff.iter().all(|l| l.kind == DiffKind::Unchanged));
    }

    #[test]
    fn mismatch_tags_deleted_expected_and_inserted_actual() {
        let verdict = judge(&case(1, "5", "25\n"), "5\n");
        assert!(!verdict.passed);
        let deleted: Vec<_> = verdict
            .diff
            .iter()
            .filter(|l| l.kind == DiffKind::Deleted)
            .collect();
        let inserted: Vec<_> = verdict
            .diff
            .iter()
            .filter(|l| l.kind == DiffKind::Inserted)
            .collect();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].text, "25");
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].text, "5");
    }

    #[test]
    fn missing_actual_output_judges_against_empty() {
        let verdict = judge(&case(4, "x", "something\n"), "");
        assert!(!verdict.passed);
    }
}
