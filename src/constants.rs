/// Decimal precision for stored return and money values
pub const DECIMAL_PRECISION: u32 = 6;

/// Number of records accumulated before a batch is flushed to persistence
pub const BATCH_SIZE: usize = 500;

/// Hard-failure count at which an ingestion run is aborted
pub const MAX_HARD_FAILURES: usize = 50;

/// Upper bound on per-row diagnostics kept in an ingestion result
pub const DIAGNOSTIC_SAMPLE_LIMIT: usize = 50;

/// Normalized record categories
///
/// Each constant is one category a statement row can map to. Subtype codes
/// from the source files are translated into these via the report configs.
pub const CATEGORY_TRADE_BUY: &str = "TRADE_BUY";
pub const CATEGORY_TRADE_SELL: &str = "TRADE_SELL";
pub const CATEGORY_DIVIDEND: &str = "DIVIDEND";
pub const CATEGORY_INTEREST: &str = "INTEREST";
pub const CATEGORY_FEE: &str = "FEE";
pub const CATEGORY_TAX: &str = "TAX";
pub const CATEGORY_DEPOSIT: &str = "DEPOSIT";
pub const CATEGORY_WITHDRAWAL: &str = "WITHDRAWAL";
pub const CATEGORY_TRANSFER_IN: &str = "TRANSFER_IN";
pub const CATEGORY_TRANSFER_OUT: &str = "TRANSFER_OUT";
pub const CATEGORY_ASSET_TRANSFER_IN: &str = "ASSET_TRANSFER_IN";
pub const CATEGORY_ASSET_TRANSFER_OUT: &str = "ASSET_TRANSFER_OUT";
pub const CATEGORY_ASSET_TRANSFER_IN_CANCEL: &str = "ASSET_TRANSFER_IN_CANCEL";
pub const CATEGORY_ASSET_TRANSFER_OUT_CANCEL: &str = "ASSET_TRANSFER_OUT_CANCEL";
pub const CATEGORY_SPLIT: &str = "SPLIT";
pub const CATEGORY_MERGER: &str = "MERGER";
pub const CATEGORY_SPINOFF: &str = "SPINOFF";
pub const CATEGORY_DELISTING: &str = "DELISTING";
pub const CATEGORY_POSITION: &str = "POSITION";
pub const CATEGORY_NAV: &str = "NAV";

/// Closed set of categories that count as external cash flow for TWR.
///
/// Dividends, interest, fees and taxes are deliberately excluded: they are
/// already reflected in NAV and must not neutralize performance.
pub const TWR_CASH_FLOW_CATEGORIES: [&str; 8] = [
    CATEGORY_DEPOSIT,
    CATEGORY_WITHDRAWAL,
    CATEGORY_TRANSFER_IN,
    CATEGORY_TRANSFER_OUT,
    CATEGORY_ASSET_TRANSFER_IN,
    CATEGORY_ASSET_TRANSFER_OUT,
    CATEGORY_ASSET_TRANSFER_IN_CANCEL,
    CATEGORY_ASSET_TRANSFER_OUT_CANCEL,
];
