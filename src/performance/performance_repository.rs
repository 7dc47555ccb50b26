use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use log::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::constants::DECIMAL_PRECISION;
use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::{twr_cutoffs, twr_daily_rows};

use super::performance_model::{
    NavRow, NavUpsertResult, ReturnPoint, TwrDailyRow, TwrDailyRowDB, TwrRowsPage,
};
use super::performance_traits::PerformanceRepositoryTrait;

/// Diesel-backed TWR row store.
pub struct PerformanceRepository {
    pool: Arc<DbPool>,
}

impl PerformanceRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PerformanceRepositoryTrait for PerformanceRepository {
    async fn upsert_nav_batch(&self, rows: Vec<NavRow>) -> Result<NavUpsertResult> {
        if rows.is_empty() {
            return Ok(NavUpsertResult::default());
        }
        let mut conn = get_connection(&self.pool)?;

        let result = conn.transaction::<NavUpsertResult, DieselError, _>(|conn| {
            let account_ids: HashSet<&str> =
                rows.iter().map(|row| row.account_id.as_str()).collect();
            let existing: HashSet<(String, NaiveDate)> = twr_daily_rows::table
                .filter(
                    twr_daily_rows::account_id
                        .eq_any(account_ids.iter().copied().collect::<Vec<_>>()),
                )
                .select((twr_daily_rows::account_id, twr_daily_rows::row_date))
                .load::<(String, NaiveDate)>(conn)?
                .into_iter()
                .collect();

            let mut result = NavUpsertResult::default();
            for row in rows {
                let key = (row.account_id.clone(), row.row_date);
                let nav_text = row.nav.round_dp(DECIMAL_PRECISION).to_string();
                let db_row: TwrDailyRowDB = TwrDailyRow::new(
                    &row.account_id,
                    row.row_date,
                    row.nav,
                )
                .into();
                let outcome = diesel::insert_into(twr_daily_rows::table)
                    .values(&db_row)
                    .on_conflict((twr_daily_rows::account_id, twr_daily_rows::row_date))
                    .do_update()
                    .set((
                        twr_daily_rows::nav.eq(&nav_text),
                        twr_daily_rows::updated_at.eq(&db_row.updated_at),
                    ))
                    .execute(conn);
                match outcome {
                    Ok(_) if existing.contains(&key) => result.updated += 1,
                    Ok(_) => result.created += 1,
                    Err(e) => {
                        warn!("NAV upsert rejected for {} {}: {}", key.0, key.1, e);
                        result.failed += 1;
                    }
                }
            }
            Ok(result)
        })?;

        debug!(
            "NAV upsert: {} created, {} updated, {} failed",
            result.created, result.updated, result.failed
        );
        Ok(result)
    }

    fn accounts_with_rows(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let ids = twr_daily_rows::table
            .select(twr_daily_rows::account_id)
            .distinct()
            .load::<String>(&mut conn)?;
        Ok(ids)
    }

    fn get_rows(&self, account_id: &str) -> Result<Vec<TwrDailyRow>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = twr_daily_rows::table
            .filter(twr_daily_rows::account_id.eq(account_id))
            .order(twr_daily_rows::row_date.asc())
            .load::<TwrDailyRowDB>(&mut conn)?;
        Ok(rows.into_iter().map(TwrDailyRow::from).collect())
    }

    async fn save_rows(&self, rows: Vec<TwrDailyRow>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut conn = get_connection(&self.pool)?;

        let saved = conn.transaction::<usize, DieselError, _>(|conn| {
            let mut saved = 0;
            for row in rows {
                let db_row: TwrDailyRowDB = row.into();
                saved += diesel::update(twr_daily_rows::table.find(&db_row.id))
                    .set((
                        twr_daily_rows::cash_flow.eq(&db_row.cash_flow),
                        twr_daily_rows::hp_return.eq(&db_row.hp_return),
                        twr_daily_rows::twr.eq(&db_row.twr),
                        twr_daily_rows::cutoff_date.eq(&db_row.cutoff_date),
                        twr_daily_rows::updated_at.eq(&db_row.updated_at),
                    ))
                    .execute(conn)?;
            }
            Ok(saved)
        })?;
        Ok(saved)
    }

    fn get_cutoff(&self, account_id: &str) -> Result<Option<NaiveDate>> {
        let mut conn = get_connection(&self.pool)?;
        let cutoff = twr_cutoffs::table
            .find(account_id)
            .select(twr_cutoffs::cutoff_date)
            .first::<NaiveDate>(&mut conn)
            .optional()?;
        Ok(cutoff)
    }

    async fn set_cutoff(&self, account_id: &str, cutoff: NaiveDate) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        diesel::insert_into(twr_cutoffs::table)
            .values((
                twr_cutoffs::account_id.eq(account_id),
                twr_cutoffs::cutoff_date.eq(cutoff),
            ))
            .on_conflict(twr_cutoffs::account_id)
            .do_update()
            .set(twr_cutoffs::cutoff_date.eq(cutoff))
            .execute(&mut conn)?;
        Ok(())
    }

    fn get_return_series(&self, account_id: &str) -> Result<Vec<ReturnPoint>> {
        let rows = self.get_rows(account_id)?;
        Ok(rows
            .into_iter()
            .map(|row| ReturnPoint {
                date: row.row_date,
                twr: row.twr,
                nav: row.nav,
            })
            .collect())
    }

    fn get_daily_rows_paginated(
        &self,
        account_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<TwrRowsPage> {
        let mut conn = get_connection(&self.pool)?;
        let page = page.max(1);
        let page_size = page_size.max(1);

        let total_row_count = twr_daily_rows::table
            .filter(twr_daily_rows::account_id.eq(account_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        let rows = twr_daily_rows::table
            .filter(twr_daily_rows::account_id.eq(account_id))
            .order(twr_daily_rows::row_date.desc())
            .limit(page_size)
            .offset((page - 1) * page_size)
            .load::<TwrDailyRowDB>(&mut conn)?;

        Ok(TwrRowsPage {
            rows: rows.into_iter().map(TwrDailyRow::from).collect(),
            page,
            page_size,
            total_row_count,
        })
    }
}
