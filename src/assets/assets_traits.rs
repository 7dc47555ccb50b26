use super::assets_model::{Asset, NewAsset};
use crate::errors::Result;

/// Trait defining the contract for asset registry operations.
pub trait AssetRepositoryTrait: Send + Sync {
    fn create(&self, new_asset: NewAsset) -> Result<Asset>;
    fn get_by_id(&self, asset_id: &str) -> Result<Asset>;
    fn list(&self) -> Result<Vec<Asset>>;
    fn find_by_isin(&self, isin: &str) -> Result<Option<Asset>>;
    fn find_by_symbol(&self, symbol: &str) -> Result<Option<Asset>>;
}
