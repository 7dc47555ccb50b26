use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::Result;

use super::performance_model::{
    FillCalculateResult, NavRow, NavUpdate, NavUpsertResult, ReturnPoint, TwrDailyRow,
    TwrRowsPage,
};

/// Trait for the TWR row store
#[async_trait]
pub trait PerformanceRepositoryTrait: Send + Sync {
    /// Upserts NAV by `(account_id, row_date)`, leaving cash flow and
    /// derived fields untouched on conflict.
    async fn upsert_nav_batch(&self, rows: Vec<NavRow>) -> Result<NavUpsertResult>;

    /// IDs of every account holding at least one TWR row.
    fn accounts_with_rows(&self) -> Result<Vec<String>>;

    /// All rows for one account in ascending date order.
    fn get_rows(&self, account_id: &str) -> Result<Vec<TwrDailyRow>>;

    /// Writes back recomputed cash-flow and derived fields.
    async fn save_rows(&self, rows: Vec<TwrDailyRow>) -> Result<usize>;

    fn get_cutoff(&self, account_id: &str) -> Result<Option<NaiveDate>>;

    async fn set_cutoff(&self, account_id: &str, cutoff: NaiveDate) -> Result<()>;

    fn get_return_series(&self, account_id: &str) -> Result<Vec<ReturnPoint>>;

    fn get_daily_rows_paginated(
        &self,
        account_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<TwrRowsPage>;
}

/// Trait for the performance engine entry points
#[async_trait]
pub trait PerformanceServiceTrait: Send + Sync {
    /// Resolves account codes and upserts NAV observations by date.
    async fn upsert_nav_batch(&self, updates: Vec<NavUpdate>) -> Result<NavUpsertResult>;

    /// For every account with TWR rows: re-sums relevant cash flows per date
    /// from persisted statement records, then recomputes HP/TWR from the
    /// account's cutoff forward.
    async fn fill_cash_and_calculate(&self) -> Result<FillCalculateResult>;

    /// Stores a new cutoff and recomputes the window from it forward.
    async fn set_cutoff_date(&self, account_id: &str, cutoff: NaiveDate) -> Result<usize>;

    fn get_return_series(&self, account_id: &str) -> Result<Vec<ReturnPoint>>;

    fn get_daily_rows(
        &self,
        account_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<TwrRowsPage>;
}
