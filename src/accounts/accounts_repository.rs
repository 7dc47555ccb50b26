use diesel::prelude::*;
use std::sync::Arc;

use crate::accounts::AccountError;
use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::accounts;
use crate::schema::accounts::dsl::*;

use super::accounts_model::{Account, AccountDB, NewAccount};
use super::accounts_traits::AccountRepositoryTrait;

/// Repository for managing account registry data in the database
pub struct AccountRepository {
    pool: Arc<DbPool>,
}

impl AccountRepository {
    /// Creates a new AccountRepository instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl AccountRepositoryTrait for AccountRepository {
    /// Creates a new account in the database
    fn create(&self, new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;

        let mut account_db: AccountDB = new_account.into();
        if account_db.id.is_empty() {
            account_db.id = uuid::Uuid::new_v4().to_string();
        }

        let mut conn = get_connection(&self.pool)?;

        diesel::insert_into(accounts::table)
            .values(&account_db)
            .execute(&mut conn)
            .map_err(AccountError::from)?;

        Ok(account_db.into())
    }

    /// Retrieves an account by its ID
    fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)?;

        let account = accounts
            .find(account_id)
            .first::<AccountDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    AccountError::NotFound(format!("Account with id {} not found", account_id))
                }
                _ => AccountError::DatabaseError(e.to_string()),
            })?;

        Ok(account.into())
    }

    /// Lists accounts, optionally filtering by active status
    fn list(&self, is_active_filter: Option<bool>) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = accounts::table.into_boxed();

        if let Some(active) = is_active_filter {
            query = query.filter(is_active.eq(active));
        }

        let results = query
            .order((base_code.asc(), currency.asc()))
            .load::<AccountDB>(&mut conn)
            .map_err(AccountError::from)?;

        Ok(results.into_iter().map(Account::from).collect())
    }

    /// Finds the unique account addressed by (base_code, currency)
    fn find_by_base_and_currency(
        &self,
        account_base_code: &str,
        account_currency: &str,
    ) -> Result<Option<Account>> {
        let mut conn = get_connection(&self.pool)?;

        let account = accounts::table
            .filter(base_code.eq(account_base_code))
            .filter(currency.eq(account_currency))
            .first::<AccountDB>(&mut conn)
            .optional()
            .map_err(AccountError::from)?;

        Ok(account.map(Account::from))
    }
}
