use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::DECIMAL_PRECISION;

/// One valuation day for one account.
///
/// NAV arrives from the NAV feed, cash flow is re-summed from persisted
/// statement records, HP and TWR are derived and overwritten on every
/// recalculation. The derived fields are never authoritative on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwrDailyRow {
    pub id: String,
    pub account_id: String,
    pub row_date: NaiveDate,
    pub nav: Decimal,
    pub cash_flow: Decimal,
    pub hp_return: Option<Decimal>,
    pub twr: Option<Decimal>,
    /// Start of the cumulative window this row was last computed in.
    pub cutoff_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TwrDailyRow {
    pub fn new(account_id: &str, row_date: NaiveDate, nav: Decimal) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            row_date,
            nav,
            cash_flow: Decimal::ZERO,
            hp_return: None,
            twr: None,
            cutoff_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Database model for TWR daily rows
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::twr_daily_rows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TwrDailyRowDB {
    pub id: String,
    pub account_id: String,
    pub row_date: NaiveDate,
    pub nav: String,
    pub cash_flow: String,
    pub hp_return: Option<String>,
    pub twr: Option<String>,
    pub cutoff_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<TwrDailyRowDB> for TwrDailyRow {
    fn from(db: TwrDailyRowDB) -> Self {
        Self {
            id: db.id,
            account_id: db.account_id,
            row_date: db.row_date,
            nav: Decimal::from_str(&db.nav).unwrap_or_default(),
            cash_flow: Decimal::from_str(&db.cash_flow).unwrap_or_default(),
            hp_return: db
                .hp_return
                .as_deref()
                .and_then(|v| Decimal::from_str(v).ok()),
            twr: db.twr.as_deref().and_then(|v| Decimal::from_str(v).ok()),
            cutoff_date: db.cutoff_date,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<TwrDailyRow> for TwrDailyRowDB {
    fn from(domain: TwrDailyRow) -> Self {
        Self {
            id: domain.id,
            account_id: domain.account_id,
            row_date: domain.row_date,
            nav: domain.nav.round_dp(DECIMAL_PRECISION).to_string(),
            cash_flow: domain.cash_flow.round_dp(DECIMAL_PRECISION).to_string(),
            hp_return: domain
                .hp_return
                .map(|v| v.round_dp(DECIMAL_PRECISION).to_string()),
            twr: domain.twr.map(|v| v.round_dp(DECIMAL_PRECISION).to_string()),
            cutoff_date: domain.cutoff_date,
            created_at: domain.created_at,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// A resolved NAV observation ready for upsert.
#[derive(Debug, Clone)]
pub struct NavRow {
    pub account_id: String,
    pub row_date: NaiveDate,
    pub nav: Decimal,
}

/// An unresolved NAV observation as delivered by the NAV feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavUpdate {
    pub account_code: String,
    pub currency: String,
    pub row_date: NaiveDate,
    pub nav: Decimal,
}

/// Outcome of one NAV upsert pass.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavUpsertResult {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub missing_accounts: Vec<String>,
}

/// Outcome of one fill-and-calculate pass.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillCalculateResult {
    /// Rows whose cash-flow sum changed during the refill.
    pub cash_journal_filled: usize,
    /// Rows whose HP/TWR were recomputed.
    pub twr_calculated: usize,
}

/// One point of the downstream return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub twr: Option<Decimal>,
    pub nav: Decimal,
}

/// One descending-date page of daily rows for manual inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwrRowsPage {
    pub rows: Vec<TwrDailyRow>,
    pub page: i64,
    pub page_size: i64,
    pub total_row_count: i64,
}
