use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::DECIMAL_PRECISION;

use super::report_config::ReportType;

/// One raw row of a tabular statement export, keyed by column header.
///
/// Header lookup is case-insensitive; empty cells read as absent.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub line_number: u64,
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new(line_number: u64, headers: &csv::StringRecord, record: &csv::StringRecord) -> Self {
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.trim().to_uppercase(), value.trim().to_string()))
            .collect();
        Self {
            line_number,
            fields,
        }
    }

    #[cfg(test)]
    pub fn from_pairs(line_number: u64, pairs: &[(&str, &str)]) -> Self {
        let fields = pairs
            .iter()
            .map(|(header, value)| (header.trim().to_uppercase(), value.trim().to_string()))
            .collect();
        Self {
            line_number,
            fields,
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(&column.trim().to_uppercase())
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// A row after type-specific adaptation, before entity resolution.
#[derive(Debug, Clone)]
pub struct AdaptedRow {
    pub account_code: String,
    pub currency: String,
    pub record_date: NaiveDate,
    pub amount: Decimal,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub category: String,
    pub isin: Option<String>,
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
}

/// Classification of one adapted row.
#[derive(Debug)]
pub enum RowOutcome {
    Adapted(Box<AdaptedRow>),
    /// Soft skip: row is ignorable or incomplete in a tolerated way.
    Skip(String),
    /// Hard failure: a required field is missing or malformed.
    Fail(String),
}

/// Fully normalized and resolved record, ready for batch submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStatementRecord {
    pub account_id: String,
    pub asset_id: Option<String>,
    pub report_type: ReportType,
    pub category: String,
    pub record_date: NaiveDate,
    pub amount: Decimal,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub currency: String,
    pub description: Option<String>,
    /// Idempotency key: source transaction reference or a synthesized
    /// natural key. Re-imports of the same reference converge to an update.
    pub reference: String,
}

/// Database model for statement records
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::statement_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StatementRecordDB {
    pub id: String,
    pub account_id: String,
    pub asset_id: Option<String>,
    pub report_type: String,
    pub category: String,
    pub record_date: NaiveDate,
    pub amount: String,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
    pub currency: String,
    pub description: Option<String>,
    pub reference: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<NewStatementRecord> for StatementRecordDB {
    fn from(domain: NewStatementRecord) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: domain.account_id,
            asset_id: domain.asset_id,
            report_type: domain.report_type.as_str().to_string(),
            category: domain.category,
            record_date: domain.record_date,
            amount: domain.amount.round_dp(DECIMAL_PRECISION).to_string(),
            quantity: domain
                .quantity
                .map(|q| q.round_dp(DECIMAL_PRECISION).to_string()),
            unit_price: domain
                .unit_price
                .map(|p| p.round_dp(DECIMAL_PRECISION).to_string()),
            currency: domain.currency,
            description: domain.description,
            reference: domain.reference,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of one batch submission at the persistence boundary.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// A single sampled skip or failure diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RowDiagnostic {
    pub line_number: Option<u64>,
    pub message: String,
}

/// Aggregated outcome of one ingestion run.
///
/// Soft skips and hard failures are data, not errors; diagnostic lists are
/// bounded samples, the counts are exact.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionResult {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub skipped_samples: Vec<RowDiagnostic>,
    pub failed_samples: Vec<RowDiagnostic>,
    pub unresolved_accounts: Vec<String>,
    pub unresolved_assets: Vec<String>,
    /// True when the circuit breaker aborted the run; everything flushed
    /// before the abort remains persisted.
    pub aborted: bool,
}
