use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::discovery::TestCase;
use crate::report::ReportOutcome;
use crate::runner::RunHandle;
use crate::snapshot::Snapshot;

/// Everything one completed test contributed to the run.
#[derive(Debug, Clone, Serialize)]
pub struct TestRecord {
    pub case: TestCase,
    pub pre: Snapshot,
    pub handle: RunHandle,
    pub reports: ReportOutcome,
    pub post: Snapshot,
}

/// Aggregate of a benchmark run, owned by the orchestrator until it returns.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRun {
    started_at: DateTime<Utc>,
    before: Snapshot,
    tests: Vec<TestRecord>,
}

impl BenchmarkRun {
    #[must_use]
    pub fn new(before: Snapshot) -> Self {
        Self {
            started_at: Utc::now(),
            before,
            tests: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: TestRecord) {
        self.tests.push(record);
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub const fn before(&self) -> &Snapshot {
        &self.before
    }

    #[must_use]
    pub fn tests(&self) -> &[TestRecord] {
        &self.tests
    }

    /// Report invocations that failed across all tests.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.tests
            .iter()
            .map(|record| record.reports.warnings.len())
            .fold(0, usize::saturating_add)
    }
}
