use diesel::prelude::*;
use std::sync::Arc;

use crate::assets::AssetError;
use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::assets;

use super::assets_model::{Asset, AssetDB, NewAsset};
use super::assets_traits::AssetRepositoryTrait;

/// Repository for managing asset registry data in the database
pub struct AssetRepository {
    pool: Arc<DbPool>,
}

impl AssetRepository {
    /// Creates a new AssetRepository instance
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl AssetRepositoryTrait for AssetRepository {
    /// Creates a new asset in the database
    fn create(&self, new_asset: NewAsset) -> Result<Asset> {
        new_asset.validate()?;

        let mut asset_db: AssetDB = new_asset.into();
        if asset_db.id.is_empty() {
            asset_db.id = uuid::Uuid::new_v4().to_string();
        }

        let mut conn = get_connection(&self.pool)?;

        diesel::insert_into(assets::table)
            .values(&asset_db)
            .execute(&mut conn)
            .map_err(AssetError::from)?;

        Ok(asset_db.into())
    }

    /// Retrieves an asset by its ID
    fn get_by_id(&self, asset_id: &str) -> Result<Asset> {
        let mut conn = get_connection(&self.pool)?;

        let asset = assets::table
            .find(asset_id)
            .first::<AssetDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    AssetError::NotFound(format!("Asset with id {} not found", asset_id))
                }
                _ => AssetError::DatabaseError(e.to_string()),
            })?;

        Ok(asset.into())
    }

    /// Lists all assets in the database
    fn list(&self) -> Result<Vec<Asset>> {
        let mut conn = get_connection(&self.pool)?;

        let results = assets::table
            .order(assets::symbol.asc())
            .load::<AssetDB>(&mut conn)
            .map_err(AssetError::from)?;

        Ok(results.into_iter().map(Asset::from).collect())
    }

    /// Finds an asset by its ISIN
    fn find_by_isin(&self, isin: &str) -> Result<Option<Asset>> {
        let mut conn = get_connection(&self.pool)?;

        let asset = assets::table
            .filter(assets::isin.eq(isin))
            .first::<AssetDB>(&mut conn)
            .optional()
            .map_err(AssetError::from)?;

        Ok(asset.map(Asset::from))
    }

    /// Finds an asset by its exact symbol
    fn find_by_symbol(&self, symbol: &str) -> Result<Option<Asset>> {
        let mut conn = get_connection(&self.pool)?;

        let asset = assets::table
            .filter(assets::symbol.eq(symbol))
            .order(assets::symbol.asc())
            .first::<AssetDB>(&mut conn)
            .optional()
            .map_err(AssetError::from)?;

        Ok(asset.map(Asset::from))
    }
}
