use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::*;
use crate::errors::ValidationError;

use super::ingest_model::{AdaptedRow, RawRow, RowOutcome};
use super::normalizer;

/// The six statement export formats the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    CorporateActions,
    Trades,
    CashJournal,
    Positions,
    Transfers,
    NavHistory,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::CorporateActions => "CORPORATE_ACTIONS",
            ReportType::Trades => "TRADES",
            ReportType::CashJournal => "CASH_JOURNAL",
            ReportType::Positions => "POSITIONS",
            ReportType::Transfers => "TRANSFERS",
            ReportType::NavHistory => "NAV_HISTORY",
        }
    }
}

impl FromStr for ReportType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_uppercase().as_str() {
            "CORPORATE_ACTIONS" => Ok(ReportType::CorporateActions),
            "TRADES" => Ok(ReportType::Trades),
            "CASH_JOURNAL" => Ok(ReportType::CashJournal),
            "POSITIONS" => Ok(ReportType::Positions),
            "TRANSFERS" => Ok(ReportType::Transfers),
            "NAV_HISTORY" => Ok(ReportType::NavHistory),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown report type: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-format adaptation rules.
///
/// One value per report type replaces what would otherwise be six
/// near-identical row handlers. Adaptation is a pure function of the raw
/// row; resolution and persistence are shared downstream.
pub struct ReportConfig {
    pub report_type: ReportType,
    account_column: &'static str,
    currency_column: &'static str,
    date_column: &'static str,
    amount_column: &'static str,
    subtype_column: Option<&'static str>,
    quantity_column: Option<&'static str>,
    price_column: Option<&'static str>,
    isin_column: Option<&'static str>,
    symbol_column: Option<&'static str>,
    description_column: Option<&'static str>,
    reference_column: Option<&'static str>,
    /// Subtype codes the format deliberately does not own.
    ignored_subtypes: &'static [&'static str],
    /// Source subtype code to normalized category.
    category_map: &'static [(&'static str, &'static str)],
    /// Category used when the format carries no subtype column.
    default_category: Option<&'static str>,
    /// Dividend-like rows may carry a per-share rate in the description;
    /// when set, implied quantity is derived as amount / rate.
    derive_share_quantity: bool,
    /// Synthesize the idempotency key from the row's natural key when the
    /// source supplies no transaction reference.
    natural_key_reference: bool,
}

impl ReportConfig {
    pub fn for_type(report_type: ReportType) -> &'static ReportConfig {
        match report_type {
            ReportType::CorporateActions => &CORPORATE_ACTIONS_CONFIG,
            ReportType::Trades => &TRADES_CONFIG,
            ReportType::CashJournal => &CASH_JOURNAL_CONFIG,
            ReportType::Positions => &POSITIONS_CONFIG,
            ReportType::Transfers => &TRANSFERS_CONFIG,
            ReportType::NavHistory => &NAV_HISTORY_CONFIG,
        }
    }

    pub fn has_asset_columns(&self) -> bool {
        self.isin_column.is_some() || self.symbol_column.is_some()
    }

    /// Adapts one raw row into a normalized record.
    ///
    /// Ignorable and unmapped subtypes are soft skips; a missing or
    /// malformed required field is a hard failure.
    pub fn adapt(&self, row: &RawRow) -> RowOutcome {
        let category = match self.resolve_category(row) {
            Ok(category) => category,
            Err(outcome) => return outcome,
        };

        let account_code = match row.get(self.account_column) {
            Some(code) => code.to_string(),
            None => {
                return RowOutcome::Fail(format!("Missing {} column", self.account_column));
            }
        };
        let currency = match row.get(self.currency_column) {
            Some(currency) => currency.to_uppercase(),
            None => {
                return RowOutcome::Fail(format!("Missing {} column", self.currency_column));
            }
        };
        let record_date = match row.get(self.date_column).and_then(normalizer::parse_date) {
            Some(date) => date,
            None => {
                return RowOutcome::Fail(format!("Unparseable {} column", self.date_column));
            }
        };
        let amount = match row
            .get(self.amount_column)
            .and_then(normalizer::parse_decimal)
        {
            Some(amount) => amount,
            None => {
                return RowOutcome::Fail(format!("Unparseable {} column", self.amount_column));
            }
        };

        let mut quantity = self
            .quantity_column
            .and_then(|column| row.get(column))
            .and_then(normalizer::parse_decimal);
        let mut unit_price = self
            .price_column
            .and_then(|column| row.get(column))
            .and_then(normalizer::parse_decimal);
        let isin = self
            .isin_column
            .and_then(|column| row.get(column))
            .map(str::to_string);
        let symbol = self
            .symbol_column
            .and_then(|column| row.get(column))
            .map(str::to_string);
        let description = self
            .description_column
            .and_then(|column| row.get(column))
            .map(str::to_string);

        if self.derive_share_quantity && quantity.is_none() && category == CATEGORY_DIVIDEND {
            if let Some(rate) = description
                .as_deref()
                .and_then(normalizer::extract_per_share_rate)
            {
                if !rate.is_zero() {
                    quantity = Some(amount / rate);
                    unit_price = Some(rate);
                }
            }
        }

        let reference = self
            .reference_column
            .and_then(|column| row.get(column))
            .map(str::to_string)
            .or_else(|| {
                if self.natural_key_reference {
                    Some(format!(
                        "{}:{}:{}:{}",
                        category,
                        account_code.to_uppercase(),
                        isin.as_deref()
                            .or(symbol.as_deref())
                            .map(str::to_uppercase)
                            .unwrap_or_else(|| "-".to_string()),
                        record_date
                    ))
                } else {
                    None
                }
            });

        RowOutcome::Adapted(Box::new(AdaptedRow {
            account_code,
            currency,
            record_date,
            amount,
            quantity,
            unit_price,
            category: category.to_string(),
            isin,
            symbol,
            description,
            reference,
        }))
    }

    fn resolve_category(&self, row: &RawRow) -> Result<&'static str, RowOutcome> {
        let Some(subtype_column) = self.subtype_column else {
            // Formats without a subtype column carry a single category.
            return self
                .default_category
                .ok_or_else(|| RowOutcome::Skip("Row has no category".to_string()));
        };
        let Some(subtype) = row.get(subtype_column) else {
            return Err(RowOutcome::Fail(format!(
                "Missing {} column",
                subtype_column
            )));
        };
        let subtype = subtype.to_uppercase();
        if self.ignored_subtypes.contains(&subtype.as_str()) {
            return Err(RowOutcome::Skip(format!(
                "Subtype {} not owned by this report",
                subtype
            )));
        }
        self.category_map
            .iter()
            .find(|(code, _)| *code == subtype)
            .map(|(_, category)| *category)
            .ok_or_else(|| RowOutcome::Skip(format!("Unmapped subtype {}", subtype)))
    }
}

static CORPORATE_ACTIONS_CONFIG: ReportConfig = ReportConfig {
    report_type: ReportType::CorporateActions,
    account_column: "ACCOUNT",
    currency_column: "CURRENCY",
    date_column: "DATE",
    amount_column: "AMOUNT",
    subtype_column: Some("TYPE"),
    quantity_column: Some("QUANTITY"),
    price_column: None,
    isin_column: Some("ISIN"),
    symbol_column: Some("SYMBOL"),
    description_column: Some("DESCRIPTION"),
    reference_column: Some("TRANSACTIONID"),
    ignored_subtypes: &[],
    category_map: &[
        ("SPLIT", CATEGORY_SPLIT),
        ("MERGER", CATEGORY_MERGER),
        ("SPINOFF", CATEGORY_SPINOFF),
        ("DELISTING", CATEGORY_DELISTING),
    ],
    default_category: None,
    derive_share_quantity: false,
    natural_key_reference: false,
};

static TRADES_CONFIG: ReportConfig = ReportConfig {
    report_type: ReportType::Trades,
    account_column: "ACCOUNT",
    currency_column: "CURRENCY",
    date_column: "TRADEDATE",
    amount_column: "AMOUNT",
    subtype_column: Some("SIDE"),
    quantity_column: Some("QUANTITY"),
    price_column: Some("PRICE"),
    isin_column: Some("ISIN"),
    symbol_column: Some("SYMBOL"),
    description_column: Some("DESCRIPTION"),
    reference_column: Some("TRANSACTIONID"),
    ignored_subtypes: &[],
    category_map: &[
        ("BUY", CATEGORY_TRADE_BUY),
        ("SELL", CATEGORY_TRADE_SELL),
    ],
    default_category: None,
    derive_share_quantity: false,
    natural_key_reference: false,
};

static CASH_JOURNAL_CONFIG: ReportConfig = ReportConfig {
    report_type: ReportType::CashJournal,
    account_column: "ACCOUNT",
    currency_column: "CURRENCY",
    date_column: "DATE",
    amount_column: "AMOUNT",
    subtype_column: Some("TYPE"),
    quantity_column: None,
    price_column: None,
    isin_column: Some("ISIN"),
    symbol_column: Some("SYMBOL"),
    description_column: Some("DESCRIPTION"),
    reference_column: Some("TRANSACTIONID"),
    // Trade legs show up in cash exports too; the trades report owns them.
    ignored_subtypes: &["BUY", "SELL"],
    category_map: &[
        ("DIV", CATEGORY_DIVIDEND),
        ("WHTAX", CATEGORY_TAX),
        ("INT", CATEGORY_INTEREST),
        ("FEE", CATEGORY_FEE),
        ("DEP", CATEGORY_DEPOSIT),
        ("WD", CATEGORY_WITHDRAWAL),
    ],
    default_category: None,
    derive_share_quantity: true,
    natural_key_reference: false,
};

static POSITIONS_CONFIG: ReportConfig = ReportConfig {
    report_type: ReportType::Positions,
    account_column: "ACCOUNT",
    currency_column: "CURRENCY",
    date_column: "REPORTDATE",
    amount_column: "VALUE",
    subtype_column: None,
    quantity_column: Some("QUANTITY"),
    price_column: Some("MARKPRICE"),
    isin_column: Some("ISIN"),
    symbol_column: Some("SYMBOL"),
    description_column: Some("DESCRIPTION"),
    reference_column: None,
    ignored_subtypes: &[],
    category_map: &[],
    default_category: Some(CATEGORY_POSITION),
    derive_share_quantity: false,
    natural_key_reference: true,
};

static TRANSFERS_CONFIG: ReportConfig = ReportConfig {
    report_type: ReportType::Transfers,
    account_column: "ACCOUNT",
    currency_column: "CURRENCY",
    date_column: "DATE",
    amount_column: "AMOUNT",
    subtype_column: Some("TYPE"),
    quantity_column: Some("QUANTITY"),
    price_column: None,
    isin_column: Some("ISIN"),
    symbol_column: Some("SYMBOL"),
    description_column: Some("DESCRIPTION"),
    reference_column: Some("TRANSACTIONID"),
    ignored_subtypes: &[],
    category_map: &[
        ("TRIN", CATEGORY_TRANSFER_IN),
        ("TROUT", CATEGORY_TRANSFER_OUT),
        ("ATIN", CATEGORY_ASSET_TRANSFER_IN),
        ("ATOUT", CATEGORY_ASSET_TRANSFER_OUT),
        ("ATIN_CANCEL", CATEGORY_ASSET_TRANSFER_IN_CANCEL),
        ("ATOUT_CANCEL", CATEGORY_ASSET_TRANSFER_OUT_CANCEL),
    ],
    default_category: None,
    derive_share_quantity: false,
    natural_key_reference: false,
};

static NAV_HISTORY_CONFIG: ReportConfig = ReportConfig {
    report_type: ReportType::NavHistory,
    account_column: "ACCOUNT",
    currency_column: "CURRENCY",
    date_column: "DATE",
    amount_column: "NAV",
    subtype_column: None,
    quantity_column: None,
    price_column: None,
    isin_column: None,
    symbol_column: None,
    description_column: None,
    reference_column: None,
    ignored_subtypes: &[],
    category_map: &[],
    default_category: Some(CATEGORY_NAV),
    derive_share_quantity: false,
    natural_key_reference: true,
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn adapted(outcome: RowOutcome) -> AdaptedRow {
        match outcome {
            RowOutcome::Adapted(row) => *row,
            other => panic!("expected adapted row, got {:?}", other),
        }
    }

    #[test]
    fn dividend_row_derives_quantity_from_per_share_rate() {
        let config = ReportConfig::for_type(ReportType::CashJournal);
        let row = RawRow::from_pairs(
            2,
            &[
                ("Account", "U123_USD"),
                ("Currency", "USD"),
                ("Date", "2024-03-07"),
                ("Amount", "84.00"),
                ("Type", "DIV"),
                ("Description", "ACME CORP CASH DIVIDEND USD 0.84 PER SHARE"),
                ("TransactionId", "TX-1"),
            ],
        );

        let record = adapted(config.adapt(&row));
        assert_eq!(record.category, CATEGORY_DIVIDEND);
        assert_eq!(record.quantity, Some(dec!(100)));
        assert_eq!(record.unit_price, Some(dec!(0.84)));
        assert_eq!(record.reference.as_deref(), Some("TX-1"));
    }

    #[test]
    fn trade_subtypes_are_skipped_by_cash_journal_config() {
        let config = ReportConfig::for_type(ReportType::CashJournal);
        let row = RawRow::from_pairs(
            3,
            &[
                ("Account", "U123_USD"),
                ("Currency", "USD"),
                ("Date", "2024-03-07"),
                ("Amount", "-500"),
                ("Type", "BUY"),
            ],
        );

        assert!(matches!(config.adapt(&row), RowOutcome::Skip(_)));
    }

    #[test]
    fn unmapped_subtype_is_a_soft_skip() {
        let config = ReportConfig::for_type(ReportType::Transfers);
        let row = RawRow::from_pairs(
            4,
            &[
                ("Account", "U123_USD"),
                ("Currency", "USD"),
                ("Date", "2024-03-07"),
                ("Amount", "100"),
                ("Type", "MYSTERY"),
            ],
        );

        assert!(matches!(config.adapt(&row), RowOutcome::Skip(_)));
    }

    #[test]
    fn missing_amount_is_a_hard_failure() {
        let config = ReportConfig::for_type(ReportType::CashJournal);
        let row = RawRow::from_pairs(
            5,
            &[
                ("Account", "U123_USD"),
                ("Currency", "USD"),
                ("Date", "2024-03-07"),
                ("Amount", "--"),
                ("Type", "DEP"),
            ],
        );

        assert!(matches!(config.adapt(&row), RowOutcome::Fail(_)));
    }

    #[test]
    fn position_row_synthesizes_natural_key_reference() {
        let config = ReportConfig::for_type(ReportType::Positions);
        let row = RawRow::from_pairs(
            2,
            &[
                ("Account", "U123_USD"),
                ("Currency", "USD"),
                ("ReportDate", "2024-03-07"),
                ("Value", "1500.25"),
                ("Quantity", "10"),
                ("ISIN", "US0000000001"),
            ],
        );

        let record = adapted(config.adapt(&row));
        assert_eq!(record.record_date, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(
            record.reference.as_deref(),
            Some("POSITION:U123_USD:US0000000001:2024-03-07")
        );
    }

    #[test]
    fn trade_row_maps_side_to_category() {
        let config = ReportConfig::for_type(ReportType::Trades);
        let row = RawRow::from_pairs(
            2,
            &[
                ("Account", "U123_USD"),
                ("Currency", "USD"),
                ("TradeDate", "07/03/2024"),
                ("Amount", "-1,250.00"),
                ("Side", "buy"),
                ("Quantity", "10"),
                ("Price", "125"),
                ("Symbol", "ACME"),
                ("TransactionId", "TRD-9"),
            ],
        );

        let record = adapted(config.adapt(&row));
        assert_eq!(record.category, CATEGORY_TRADE_BUY);
        assert_eq!(record.amount, dec!(-1250.00));
        assert_eq!(record.unit_price, Some(dec!(125)));
    }

    #[test]
    fn report_type_round_trips_through_str() {
        for report_type in [
            ReportType::CorporateActions,
            ReportType::Trades,
            ReportType::CashJournal,
            ReportType::Positions,
            ReportType::Transfers,
            ReportType::NavHistory,
        ] {
            assert_eq!(
                report_type.as_str().parse::<ReportType>().unwrap(),
                report_type
            );
        }
        assert!("STATEMENTS".parse::<ReportType>().is_err());
    }
}
