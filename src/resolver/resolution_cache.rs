use std::collections::{BTreeMap, HashMap};

use crate::accounts::Account;
use crate::assets::Asset;

/// Run-scoped identifier cache backing the entity resolver.
///
/// One map per key space: currency-suffixed account code, account base code,
/// asset ISIN, asset symbol and asset name. Keys are write-once (first
/// resolution wins) and the cache is never persisted; a new pipeline run
/// starts from an empty cache and an eager preload.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    account_codes: HashMap<String, String>,
    account_base_codes: HashMap<String, String>,
    asset_isins: HashMap<String, String>,
    asset_symbols: HashMap<String, String>,
    // BTreeMap so prefix scans are deterministic
    asset_names: BTreeMap<String, String>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account under its suffixed code and base code key spaces.
    pub fn insert_account(&mut self, account: &Account) {
        self.account_codes
            .entry(account.external_code().to_uppercase())
            .or_insert_with(|| account.id.clone());
        self.account_base_codes
            .entry(account.base_code.to_uppercase())
            .or_insert_with(|| account.id.clone());
    }

    /// Registers an asset under the ISIN, symbol and name key spaces.
    pub fn insert_asset(&mut self, asset: &Asset) {
        if let Some(isin) = asset.isin.as_deref() {
            if !isin.trim().is_empty() {
                self.asset_isins
                    .entry(isin.trim().to_uppercase())
                    .or_insert_with(|| asset.id.clone());
            }
        }
        if !asset.symbol.trim().is_empty() {
            self.asset_symbols
                .entry(asset.symbol.trim().to_uppercase())
                .or_insert_with(|| asset.id.clone());
        }
        if let Some(name) = asset.name.as_deref() {
            if !name.trim().is_empty() {
                self.asset_names
                    .entry(name.trim().to_uppercase())
                    .or_insert_with(|| asset.id.clone());
            }
        }
    }

    pub fn get_account_code(&self, code: &str) -> Option<&String> {
        self.account_codes.get(&code.to_uppercase())
    }

    pub fn get_account_base_code(&self, base_code: &str) -> Option<&String> {
        self.account_base_codes.get(&base_code.to_uppercase())
    }

    pub fn get_asset_isin(&self, isin: &str) -> Option<&String> {
        self.asset_isins.get(&isin.to_uppercase())
    }

    pub fn get_asset_symbol(&self, symbol: &str) -> Option<&String> {
        self.asset_symbols.get(&symbol.to_uppercase())
    }

    /// Case-insensitive name lookup: exact match first, then the first asset
    /// whose name starts with the given text.
    pub fn get_asset_name(&self, name: &str) -> Option<&String> {
        let key = name.trim().to_uppercase();
        if let Some(id) = self.asset_names.get(&key) {
            return Some(id);
        }
        self.asset_names
            .range(key.clone()..)
            .take_while(|(stored, _)| stored.starts_with(&key))
            .map(|(_, id)| id)
            .next()
    }

    pub fn len(&self) -> usize {
        self.account_codes.len()
            + self.account_base_codes.len()
            + self.asset_isins.len()
            + self.asset_symbols.len()
            + self.asset_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
