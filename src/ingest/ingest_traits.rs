use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::errors::Result;

use super::ingest_model::{BatchOutcome, IngestionResult, NewStatementRecord};
use super::report_config::ReportType;

/// Trait for the statement-record persistence boundary
#[async_trait]
pub trait StatementRepositoryTrait: Send + Sync {
    /// Persists one batch atomically, idempotent on the reference key.
    async fn submit_batch(&self, records: Vec<NewStatementRecord>) -> Result<BatchOutcome>;

    /// Sums persisted cash-journal amounts per date for one account,
    /// restricted to the categories that count as external cash flow.
    fn sum_cash_flows_by_date(&self, account_id: &str) -> Result<HashMap<NaiveDate, Decimal>>;
}

/// Trait for the ingestion pipeline entry point
#[async_trait]
pub trait IngestServiceTrait: Send + Sync {
    /// Runs one statement file through the full pipeline and returns the
    /// aggregated run outcome.
    async fn import_statements(
        &self,
        report_type: ReportType,
        content: &str,
    ) -> Result<IngestionResult>;
}
