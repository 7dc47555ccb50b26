diesel::table! {
    accounts (id) {
        id -> Text,
        name -> Text,
        institution -> Nullable<Text>,
        base_code -> Text,
        currency -> Text,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    assets (id) {
        id -> Text,
        symbol -> Text,
        isin -> Nullable<Text>,
        cusip -> Nullable<Text>,
        name -> Nullable<Text>,
        currency -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    statement_records (id) {
        id -> Text,
        account_id -> Text,
        asset_id -> Nullable<Text>,
        report_type -> Text,
        category -> Text,
        record_date -> Date,
        amount -> Text,
        quantity -> Nullable<Text>,
        unit_price -> Nullable<Text>,
        currency -> Text,
        description -> Nullable<Text>,
        reference -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    twr_daily_rows (id) {
        id -> Text,
        account_id -> Text,
        row_date -> Date,
        nav -> Text,
        cash_flow -> Text,
        hp_return -> Nullable<Text>,
        twr -> Nullable<Text>,
        cutoff_date -> Nullable<Date>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    twr_cutoffs (account_id) {
        account_id -> Text,
        cutoff_date -> Date,
    }
}

diesel::joinable!(statement_records -> accounts (account_id));
diesel::joinable!(statement_records -> assets (asset_id));
diesel::joinable!(twr_daily_rows -> accounts (account_id));

diesel::allow_tables_to_appear_in_same_query!(
    accounts,
    assets,
    statement_records,
    twr_daily_rows,
    twr_cutoffs,
);
