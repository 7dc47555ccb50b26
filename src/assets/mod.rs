pub(crate) mod assets_errors;
pub(crate) mod assets_model;
pub(crate) mod assets_repository;
pub(crate) mod assets_traits;

pub use assets_errors::AssetError;
pub use assets_model::{Asset, AssetDB, NewAsset};
pub use assets_repository::AssetRepository;
pub use assets_traits::AssetRepositoryTrait;
