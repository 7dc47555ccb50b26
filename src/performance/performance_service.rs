use async_trait::async_trait;
use chrono::NaiveDate;
use log::{info, warn};
use std::sync::Arc;

use crate::accounts::AccountRepositoryTrait;
use crate::assets::AssetRepositoryTrait;
use crate::errors::Result;
use crate::ingest::StatementRepositoryTrait;
use crate::resolver::EntityResolver;

use super::performance_model::{
    FillCalculateResult, NavRow, NavUpdate, NavUpsertResult, ReturnPoint, TwrRowsPage,
};
use super::performance_traits::{PerformanceRepositoryTrait, PerformanceServiceTrait};
use super::twr_calculator::compute_returns;

/// The TWR engine's external surface.
///
/// NAV rows come in through `upsert_nav_batch`; `fill_cash_and_calculate`
/// re-derives cash flows and returns for every account that has rows. The
/// two phases are independent so either feed can lag the other.
pub struct PerformanceService {
    account_repository: Arc<dyn AccountRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    statement_repository: Arc<dyn StatementRepositoryTrait>,
    performance_repository: Arc<dyn PerformanceRepositoryTrait>,
}

impl PerformanceService {
    pub fn new(
        account_repository: Arc<dyn AccountRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
        statement_repository: Arc<dyn StatementRepositoryTrait>,
        performance_repository: Arc<dyn PerformanceRepositoryTrait>,
    ) -> Self {
        Self {
            account_repository,
            asset_repository,
            statement_repository,
            performance_repository,
        }
    }
}

#[async_trait]
impl PerformanceServiceTrait for PerformanceService {
    async fn upsert_nav_batch(&self, updates: Vec<NavUpdate>) -> Result<NavUpsertResult> {
        let mut resolver = EntityResolver::new(
            self.account_repository.clone(),
            self.asset_repository.clone(),
        );
        resolver.preload()?;

        let mut rows: Vec<NavRow> = Vec::with_capacity(updates.len());
        for update in updates {
            if let Some(account_id) =
                resolver.resolve_account(&update.account_code, &update.currency)
            {
                rows.push(NavRow {
                    account_id,
                    row_date: update.row_date,
                    nav: update.nav,
                });
            }
        }

        let mut result = self.performance_repository.upsert_nav_batch(rows).await?;
        result.missing_accounts = resolver.unresolved_accounts();
        if !result.missing_accounts.is_empty() {
            warn!(
                "NAV upsert skipped {} unknown account codes",
                result.missing_accounts.len()
            );
        }
        Ok(result)
    }

    async fn fill_cash_and_calculate(&self) -> Result<FillCalculateResult> {
        let mut result = FillCalculateResult::default();

        for account_id in self.performance_repository.accounts_with_rows()? {
            let sums = self.statement_repository.sum_cash_flows_by_date(&account_id)?;
            let mut rows = self.performance_repository.get_rows(&account_id)?;

            for row in rows.iter_mut() {
                let summed = sums.get(&row.row_date).copied().unwrap_or_default();
                if row.cash_flow != summed {
                    row.cash_flow = summed;
                    result.cash_journal_filled += 1;
                }
            }

            let cutoff = self.performance_repository.get_cutoff(&account_id)?;
            let stats = compute_returns(&mut rows, cutoff);
            if stats.zero_denominators > 0 {
                warn!(
                    "Account {}: {} rows had a zero start NAV plus cash flow; HP forced to 0",
                    account_id, stats.zero_denominators
                );
            }
            result.twr_calculated += stats.rows_computed;

            self.performance_repository.save_rows(rows).await?;
        }

        info!(
            "Fill and calculate: {} cash flows filled, {} rows recomputed",
            result.cash_journal_filled, result.twr_calculated
        );
        Ok(result)
    }

    async fn set_cutoff_date(&self, account_id: &str, cutoff: NaiveDate) -> Result<usize> {
        self.performance_repository
            .set_cutoff(account_id, cutoff)
            .await?;

        let mut rows = self.performance_repository.get_rows(account_id)?;
        let stats = compute_returns(&mut rows, Some(cutoff));

        // Rows before the cutoff keep their stored values.
        rows.retain(|row| row.row_date >= cutoff);
        self.performance_repository.save_rows(rows).await?;

        info!(
            "Cutoff for {} moved to {}; {} rows recomputed",
            account_id, cutoff, stats.rows_computed
        );
        Ok(stats.rows_computed)
    }

    fn get_return_series(&self, account_id: &str) -> Result<Vec<ReturnPoint>> {
        self.performance_repository.get_return_series(account_id)
    }

    fn get_daily_rows(
        &self,
        account_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<TwrRowsPage> {
        self.performance_repository
            .get_daily_rows_paginated(account_id, page, page_size)
    }
}
