use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use crate::constants::TWR_CASH_FLOW_CATEGORIES;
use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::statement_records;

use super::ingest_model::{BatchOutcome, NewStatementRecord, StatementRecordDB};
use super::ingest_traits::StatementRepositoryTrait;

/// Diesel-backed statement-record store.
pub struct StatementRepository {
    pool: Arc<DbPool>,
}

impl StatementRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatementRepositoryTrait for StatementRepository {
    /// Submits one batch in a single transaction.
    ///
    /// Rows are idempotent on the reference key: a conflict updates the
    /// mutable fields in place and counts as `updated`. Per-row constraint
    /// errors are counted as failed without rolling back the batch.
    async fn submit_batch(&self, records: Vec<NewStatementRecord>) -> Result<BatchOutcome> {
        if records.is_empty() {
            return Ok(BatchOutcome::default());
        }
        let mut conn = get_connection(&self.pool)?;

        let outcome = conn.transaction::<BatchOutcome, DieselError, _>(|conn| {
            let references: Vec<&str> = records
                .iter()
                .map(|record| record.reference.as_str())
                .collect();
            let existing: HashSet<String> = statement_records::table
                .filter(statement_records::reference.eq_any(&references))
                .select(statement_records::reference)
                .load::<String>(conn)?
                .into_iter()
                .collect();

            let mut outcome = BatchOutcome::default();
            for record in records {
                let was_existing = existing.contains(&record.reference);
                let db_record: StatementRecordDB = record.into();
                let inserted = diesel::insert_into(statement_records::table)
                    .values(&db_record)
                    .on_conflict(statement_records::reference)
                    .do_update()
                    .set((
                        statement_records::asset_id.eq(&db_record.asset_id),
                        statement_records::category.eq(&db_record.category),
                        statement_records::record_date.eq(&db_record.record_date),
                        statement_records::amount.eq(&db_record.amount),
                        statement_records::quantity.eq(&db_record.quantity),
                        statement_records::unit_price.eq(&db_record.unit_price),
                        statement_records::description.eq(&db_record.description),
                        statement_records::updated_at.eq(&db_record.updated_at),
                    ))
                    .execute(conn);
                match inserted {
                    Ok(_) if was_existing => outcome.updated += 1,
                    Ok(_) => outcome.created += 1,
                    Err(e) => {
                        warn!(
                            "Rejected statement record {}: {}",
                            db_record.reference, e
                        );
                        outcome.failed += 1;
                        outcome
                            .errors
                            .push(format!("{}: {}", db_record.reference, e));
                    }
                }
            }
            Ok(outcome)
        })?;

        debug!(
            "Batch submitted: {} created, {} updated, {} failed",
            outcome.created, outcome.updated, outcome.failed
        );
        Ok(outcome)
    }

    fn sum_cash_flows_by_date(&self, account_id: &str) -> Result<HashMap<NaiveDate, Decimal>> {
        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<(NaiveDate, String)> = statement_records::table
            .filter(statement_records::account_id.eq(account_id))
            .filter(statement_records::category.eq_any(TWR_CASH_FLOW_CATEGORIES))
            .select((statement_records::record_date, statement_records::amount))
            .load(&mut conn)?;

        let mut sums: HashMap<NaiveDate, Decimal> = HashMap::new();
        for (date, amount) in rows {
            let amount = Decimal::from_str(&amount).unwrap_or_default();
            *sums.entry(date).or_default() += amount;
        }
        Ok(sums)
    }
}
