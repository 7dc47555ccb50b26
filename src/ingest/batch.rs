use crate::constants::{BATCH_SIZE, DIAGNOSTIC_SAMPLE_LIMIT, MAX_HARD_FAILURES};

use super::ingest_model::{BatchOutcome, IngestionResult, NewStatementRecord, RowDiagnostic};

/// Accumulates resolved records and aggregates flush outcomes for one run.
///
/// Flushes are signalled by `push` returning a full buffer; the owner submits
/// it and feeds the outcome back through `record_outcome`. Hard failures past
/// the breaker threshold abort the run while everything already flushed stays
/// persisted.
pub struct BatchController {
    batch_size: usize,
    max_hard_failures: usize,
    buffer: Vec<NewStatementRecord>,
    result: IngestionResult,
}

impl Default for BatchController {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchController {
    pub fn new() -> Self {
        Self::with_limits(BATCH_SIZE, MAX_HARD_FAILURES)
    }

    pub fn with_limits(batch_size: usize, max_hard_failures: usize) -> Self {
        Self {
            batch_size,
            max_hard_failures,
            buffer: Vec::with_capacity(batch_size),
            result: IngestionResult::default(),
        }
    }

    /// Buffers one record; returns the full buffer when the flush bound is
    /// reached.
    pub fn push(&mut self, record: NewStatementRecord) -> Option<Vec<NewStatementRecord>> {
        self.buffer.push(record);
        if self.buffer.len() >= self.batch_size {
            Some(std::mem::take(&mut self.buffer))
        } else {
            None
        }
    }

    /// Takes whatever is buffered at end of input.
    pub fn drain(&mut self) -> Vec<NewStatementRecord> {
        std::mem::take(&mut self.buffer)
    }

    pub fn record_outcome(&mut self, outcome: BatchOutcome) {
        self.result.created += outcome.created;
        self.result.updated += outcome.updated;
        self.result.failed += outcome.failed;
        for message in outcome.errors {
            self.push_diagnostic_failure(None, message);
        }
    }

    pub fn note_skip(&mut self, line_number: u64, message: String) {
        self.result.skipped += 1;
        if self.result.skipped_samples.len() < DIAGNOSTIC_SAMPLE_LIMIT {
            self.result.skipped_samples.push(RowDiagnostic {
                line_number: Some(line_number),
                message,
            });
        }
    }

    pub fn note_failure(&mut self, line_number: u64, message: String) {
        self.result.failed += 1;
        self.push_diagnostic_failure(Some(line_number), message);
    }

    fn push_diagnostic_failure(&mut self, line_number: Option<u64>, message: String) {
        if self.result.failed_samples.len() < DIAGNOSTIC_SAMPLE_LIMIT {
            self.result
                .failed_samples
                .push(RowDiagnostic { line_number, message });
        }
    }

    /// Whether sustained hard failures indicate a structural problem with the
    /// source file. Soft skips never contribute.
    pub fn tripped(&self) -> bool {
        self.result.failed > self.max_hard_failures
    }

    pub fn abort(&mut self) {
        self.result.aborted = true;
        self.buffer.clear();
    }

    pub fn finish(
        mut self,
        unresolved_accounts: Vec<String>,
        unresolved_assets: Vec<String>,
    ) -> IngestionResult {
        self.result.unresolved_accounts = unresolved_accounts;
        self.result.unresolved_assets = unresolved_assets;
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ReportType;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record(reference: &str) -> NewStatementRecord {
        NewStatementRecord {
            account_id: "acc-1".to_string(),
            asset_id: None,
            report_type: ReportType::CashJournal,
            category: "DEPOSIT".to_string(),
            record_date: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            amount: dec!(100),
            quantity: None,
            unit_price: None,
            currency: "USD".to_string(),
            description: None,
            reference: reference.to_string(),
        }
    }

    #[test]
    fn buffer_flushes_at_the_batch_bound() {
        let mut controller = BatchController::with_limits(3, 50);
        assert!(controller.push(record("a")).is_none());
        assert!(controller.push(record("b")).is_none());

        let flushed = controller.push(record("c")).unwrap();
        assert_eq!(flushed.len(), 3);
        assert!(controller.drain().is_empty());
    }

    #[test]
    fn drain_returns_the_tail_batch() {
        let mut controller = BatchController::with_limits(3, 50);
        controller.push(record("a"));
        controller.push(record("b"));

        assert_eq!(controller.drain().len(), 2);
    }

    #[test]
    fn breaker_trips_past_the_failure_threshold_only() {
        let mut controller = BatchController::with_limits(500, 2);
        controller.note_failure(1, "bad".to_string());
        controller.note_failure(2, "bad".to_string());
        assert!(!controller.tripped());

        controller.note_failure(3, "bad".to_string());
        assert!(controller.tripped());
    }

    #[test]
    fn soft_skips_do_not_trip_the_breaker() {
        let mut controller = BatchController::with_limits(500, 2);
        for line in 0..100 {
            controller.note_skip(line, "ignorable".to_string());
        }
        assert!(!controller.tripped());
    }

    #[test]
    fn aborted_run_retains_results_gathered_so_far() {
        let mut controller = BatchController::with_limits(500, 1);
        controller.record_outcome(BatchOutcome {
            created: 10,
            updated: 2,
            failed: 0,
            errors: Vec::new(),
        });
        controller.note_failure(40, "bad".to_string());
        controller.note_failure(41, "bad".to_string());
        controller.push(record("pending"));
        controller.abort();

        let result = controller.finish(vec!["U999".to_string()], Vec::new());
        assert!(result.aborted);
        assert_eq!(result.created, 10);
        assert_eq!(result.updated, 2);
        assert_eq!(result.failed, 2);
        assert_eq!(result.unresolved_accounts, vec!["U999".to_string()]);
    }

    #[test]
    fn diagnostics_are_capped_while_counts_stay_exact() {
        let mut controller = BatchController::new();
        for line in 0..(DIAGNOSTIC_SAMPLE_LIMIT as u64 + 25) {
            controller.note_failure(line, "bad".to_string());
            controller.note_skip(line, "skip".to_string());
        }

        let result = controller.finish(Vec::new(), Vec::new());
        assert_eq!(result.failed, DIAGNOSTIC_SAMPLE_LIMIT + 25);
        assert_eq!(result.skipped, DIAGNOSTIC_SAMPLE_LIMIT + 25);
        assert_eq!(result.failed_samples.len(), DIAGNOSTIC_SAMPLE_LIMIT);
        assert_eq!(result.skipped_samples.len(), DIAGNOSTIC_SAMPLE_LIMIT);
    }
}
