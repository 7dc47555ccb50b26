use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::accounts::AccountRepositoryTrait;
use crate::assets::AssetRepositoryTrait;
use crate::errors::Result;

use super::resolution_cache::ResolutionCache;

/// Resolves external account and asset identifiers to internal registry IDs.
///
/// Scoped to one pipeline run: constructed, preloaded, consulted row by row,
/// then dropped. Unresolved identifiers are recorded once each and surfaced
/// at the end of the run instead of aborting it.
pub struct EntityResolver {
    account_repository: Arc<dyn AccountRepositoryTrait>,
    asset_repository: Arc<dyn AssetRepositoryTrait>,
    cache: ResolutionCache,
    unresolved_accounts: BTreeSet<String>,
    unresolved_assets: BTreeSet<String>,
}

impl EntityResolver {
    pub fn new(
        account_repository: Arc<dyn AccountRepositoryTrait>,
        asset_repository: Arc<dyn AssetRepositoryTrait>,
    ) -> Self {
        Self {
            account_repository,
            asset_repository,
            cache: ResolutionCache::new(),
            unresolved_accounts: BTreeSet::new(),
            unresolved_assets: BTreeSet::new(),
        }
    }

    /// Bulk-loads the full registry into the run cache so that per-row
    /// lookups stay in memory.
    pub fn preload(&mut self) -> Result<()> {
        let accounts = self.account_repository.list(Some(true))?;
        for account in &accounts {
            self.cache.insert_account(account);
        }
        let assets = self.asset_repository.list()?;
        for asset in &assets {
            self.cache.insert_asset(asset);
        }
        debug!(
            "Resolver preloaded {} accounts and {} assets",
            accounts.len(),
            assets.len()
        );
        Ok(())
    }

    /// Resolves an external account code plus currency to an account ID.
    ///
    /// Cascade, first hit wins:
    /// (a) `{base_code}_{currency}`,
    /// (b) the raw code as given,
    /// (c) the base code alone (for sources that omit the currency suffix).
    pub fn resolve_account(&mut self, external_code: &str, currency: &str) -> Option<String> {
        let code = external_code.trim();
        let currency = currency.trim();
        if code.is_empty() {
            return None;
        }

        let suffix = format!("_{}", currency.to_uppercase());
        let base = code
            .to_uppercase()
            .strip_suffix(&suffix)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_uppercase());

        let suffixed = format!("{}_{}", base, currency.to_uppercase());
        if let Some(id) = self.cache.get_account_code(&suffixed) {
            return Some(id.clone());
        }
        if let Some(id) = self.cache.get_account_code(code) {
            return Some(id.clone());
        }
        if let Some(id) = self.cache.get_account_base_code(&base) {
            return Some(id.clone());
        }

        // Lazy fill for accounts registered after the preload.
        if let Ok(Some(account)) = self
            .account_repository
            .find_by_base_and_currency(&base, currency)
        {
            let id = account.id.clone();
            self.cache.insert_account(&account);
            return Some(id);
        }

        self.unresolved_accounts.insert(code.to_string());
        None
    }

    /// Resolves an asset to an asset ID.
    ///
    /// Cascade, first hit wins:
    /// (a) the ISIN-field value against the ISIN key space,
    /// (b) the ISIN-field value against the symbol key space (sources
    ///     sometimes put a plain symbol into the ISIN column),
    /// (c) case-insensitive exact/prefix match of the description against
    ///     asset names,
    /// (d) the symbol-field value against the symbol key space.
    ///
    /// A miss leaves the record without asset attribution; the identifier is
    /// recorded once into the unresolved list.
    pub fn resolve_asset(
        &mut self,
        isin: Option<&str>,
        symbol: Option<&str>,
        description: Option<&str>,
    ) -> Option<String> {
        let isin = isin.map(str::trim).filter(|s| !s.is_empty());
        let symbol = symbol.map(str::trim).filter(|s| !s.is_empty());
        let description = description.map(str::trim).filter(|s| !s.is_empty());

        if let Some(value) = isin {
            if let Some(id) = self.cache.get_asset_isin(value) {
                return Some(id.clone());
            }
            if let Some(id) = self.cache.get_asset_symbol(value) {
                return Some(id.clone());
            }
        }

        if let Some(text) = description {
            if let Some(id) = self.cache.get_asset_name(text) {
                return Some(id.clone());
            }
        }

        if let Some(value) = symbol {
            if let Some(id) = self.cache.get_asset_symbol(value) {
                return Some(id.clone());
            }
        }

        // Lazy fill: the registry may have grown since the preload.
        if let Some(value) = isin {
            if let Ok(Some(asset)) = self.asset_repository.find_by_isin(value) {
                let id = asset.id.clone();
                self.cache.insert_asset(&asset);
                return Some(id);
            }
        }
        if let Some(value) = symbol {
            if let Ok(Some(asset)) = self.asset_repository.find_by_symbol(value) {
                let id = asset.id.clone();
                self.cache.insert_asset(&asset);
                return Some(id);
            }
        }

        if let Some(identifier) = isin.or(symbol).or(description) {
            self.unresolved_assets.insert(identifier.to_string());
        }
        None
    }

    /// Deduplicated external account codes that failed to resolve.
    pub fn unresolved_accounts(&self) -> Vec<String> {
        self.unresolved_accounts.iter().cloned().collect()
    }

    /// Deduplicated asset identifiers that failed to resolve.
    pub fn unresolved_assets(&self) -> Vec<String> {
        self.unresolved_assets.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::accounts::{Account, NewAccount};
    use crate::assets::{Asset, NewAsset};
    use crate::errors::Result as AppResult;

    #[derive(Default)]
    struct MockAccountRepository {
        accounts: Mutex<Vec<Account>>,
        lookups: AtomicUsize,
    }

    impl MockAccountRepository {
        fn with_accounts(accounts: Vec<Account>) -> Self {
            Self {
                accounts: Mutex::new(accounts),
                lookups: AtomicUsize::new(0),
            }
        }
    }

    impl AccountRepositoryTrait for MockAccountRepository {
        fn create(&self, _new_account: NewAccount) -> AppResult<Account> {
            unimplemented!()
        }
        fn get_by_id(&self, _account_id: &str) -> AppResult<Account> {
            unimplemented!()
        }
        fn list(&self, _is_active_filter: Option<bool>) -> AppResult<Vec<Account>> {
            Ok(self.accounts.lock().unwrap().clone())
        }
        fn find_by_base_and_currency(
            &self,
            base_code: &str,
            currency: &str,
        ) -> AppResult<Option<Account>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .accounts
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.base_code == base_code && a.currency == currency)
                .cloned())
        }
    }

    #[derive(Default)]
    struct MockAssetRepository {
        assets: Mutex<Vec<Asset>>,
        symbol_lookups: AtomicUsize,
    }

    impl MockAssetRepository {
        fn with_assets(assets: Vec<Asset>) -> Self {
            Self {
                assets: Mutex::new(assets),
                symbol_lookups: AtomicUsize::new(0),
            }
        }
    }

    impl AssetRepositoryTrait for MockAssetRepository {
        fn create(&self, _new_asset: NewAsset) -> AppResult<Asset> {
            unimplemented!()
        }
        fn get_by_id(&self, _asset_id: &str) -> AppResult<Asset> {
            unimplemented!()
        }
        fn list(&self) -> AppResult<Vec<Asset>> {
            Ok(self.assets.lock().unwrap().clone())
        }
        fn find_by_isin(&self, isin: &str) -> AppResult<Option<Asset>> {
            Ok(self
                .assets
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.isin.as_deref() == Some(isin))
                .cloned())
        }
        fn find_by_symbol(&self, symbol: &str) -> AppResult<Option<Asset>> {
            self.symbol_lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .assets
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.symbol == symbol)
                .cloned())
        }
    }

    fn account(id: &str, base_code: &str, currency: &str) -> Account {
        Account {
            id: id.to_string(),
            name: format!("{} {}", base_code, currency),
            institution: None,
            base_code: base_code.to_string(),
            currency: currency.to_string(),
            is_active: true,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    fn asset(id: &str, symbol: &str, isin: Option<&str>, name: Option<&str>) -> Asset {
        Asset {
            id: id.to_string(),
            symbol: symbol.to_string(),
            isin: isin.map(str::to_string),
            cusip: None,
            name: name.map(str::to_string),
            currency: "USD".to_string(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    fn resolver_with(
        accounts: Vec<Account>,
        assets: Vec<Asset>,
    ) -> (
        EntityResolver,
        Arc<MockAccountRepository>,
        Arc<MockAssetRepository>,
    ) {
        let account_repo = Arc::new(MockAccountRepository::with_accounts(accounts));
        let asset_repo = Arc::new(MockAssetRepository::with_assets(assets));
        let mut resolver = EntityResolver::new(account_repo.clone(), asset_repo.clone());
        resolver.preload().unwrap();
        (resolver, account_repo, asset_repo)
    }

    #[test]
    fn account_resolves_same_id_for_suffixed_and_base_form() {
        let (mut resolver, _, _) =
            resolver_with(vec![account("acc-1", "U123", "USD")], Vec::new());

        let by_suffixed = resolver.resolve_account("U123_USD", "USD");
        let by_base = resolver.resolve_account("U123", "USD");

        assert_eq!(by_suffixed.as_deref(), Some("acc-1"));
        assert_eq!(by_base.as_deref(), Some("acc-1"));
        assert!(resolver.unresolved_accounts().is_empty());
    }

    #[test]
    fn account_base_code_disambiguated_by_currency() {
        let (mut resolver, _, _) = resolver_with(
            vec![
                account("acc-usd", "U123", "USD"),
                account("acc-eur", "U123", "EUR"),
            ],
            Vec::new(),
        );

        assert_eq!(
            resolver.resolve_account("U123", "EUR").as_deref(),
            Some("acc-eur")
        );
        assert_eq!(
            resolver.resolve_account("U123_USD", "USD").as_deref(),
            Some("acc-usd")
        );
    }

    #[test]
    fn unresolved_account_recorded_once() {
        let (mut resolver, _, _) = resolver_with(Vec::new(), Vec::new());

        assert!(resolver.resolve_account("U999_USD", "USD").is_none());
        assert!(resolver.resolve_account("U999_USD", "USD").is_none());

        assert_eq!(resolver.unresolved_accounts(), vec!["U999_USD".to_string()]);
    }

    #[test]
    fn isin_match_wins_over_symbol_match() {
        let (mut resolver, _, _) = resolver_with(
            Vec::new(),
            vec![
                asset("asset-isin", "ACME", Some("US0000000001"), None),
                asset("asset-sym", "US0000000001", None, None),
            ],
        );

        let resolved = resolver.resolve_asset(Some("US0000000001"), Some("ACME"), None);
        assert_eq!(resolved.as_deref(), Some("asset-isin"));
    }

    #[test]
    fn symbol_in_isin_field_falls_through_to_symbol_space() {
        let (mut resolver, _, _) = resolver_with(
            Vec::new(),
            vec![asset("asset-1", "ACME", Some("US0000000001"), None)],
        );

        let resolved = resolver.resolve_asset(Some("ACME"), None, None);
        assert_eq!(resolved.as_deref(), Some("asset-1"));
    }

    #[test]
    fn description_prefix_match_is_case_insensitive() {
        let (mut resolver, _, _) = resolver_with(
            Vec::new(),
            vec![asset(
                "asset-1",
                "ACME",
                None,
                Some("Acme Holdings Class A"),
            )],
        );

        let resolved = resolver.resolve_asset(None, None, Some("acme holdings"));
        assert_eq!(resolved.as_deref(), Some("asset-1"));
    }

    #[test]
    fn unresolved_asset_leaves_reference_unset_and_is_deduplicated() {
        let (mut resolver, _, _) = resolver_with(Vec::new(), Vec::new());

        assert!(resolver.resolve_asset(Some("XX0000000000"), None, None).is_none());
        assert!(resolver.resolve_asset(Some("XX0000000000"), None, None).is_none());

        assert_eq!(
            resolver.unresolved_assets(),
            vec!["XX0000000000".to_string()]
        );
    }

    #[test]
    fn lazy_fill_caches_post_preload_registrations() {
        let (mut resolver, _, asset_repo) = resolver_with(Vec::new(), Vec::new());

        assert!(resolver.resolve_asset(None, Some("NEW"), None).is_none());

        asset_repo
            .assets
            .lock()
            .unwrap()
            .push(asset("asset-new", "NEW", None, None));

        let lookups_before = asset_repo.symbol_lookups.load(Ordering::SeqCst);
        assert_eq!(
            resolver.resolve_asset(None, Some("NEW"), None).as_deref(),
            Some("asset-new")
        );
        assert_eq!(
            asset_repo.symbol_lookups.load(Ordering::SeqCst),
            lookups_before + 1
        );

        // Second lookup must come from the cache, not the registry.
        assert_eq!(
            resolver.resolve_asset(None, Some("NEW"), None).as_deref(),
            Some("asset-new")
        );
        assert_eq!(
            asset_repo.symbol_lookups.load(Ordering::SeqCst),
            lookups_before + 1
        );
    }
}
