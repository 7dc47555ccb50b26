use super::accounts_model::{Account, NewAccount};
use crate::errors::Result;

/// Trait defining the contract for account registry operations.
pub trait AccountRepositoryTrait: Send + Sync {
    fn create(&self, new_account: NewAccount) -> Result<Account>;
    fn get_by_id(&self, account_id: &str) -> Result<Account>;
    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Account>>;
    fn find_by_base_and_currency(
        &self,
        base_code: &str,
        currency: &str,
    ) -> Result<Option<Account>>;
}
