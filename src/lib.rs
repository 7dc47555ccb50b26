pub mod db;

pub mod accounts;
pub mod assets;

pub mod constants;
pub mod errors;
pub mod ingest;
pub mod performance;
pub mod resolver;
pub mod schema;

pub use errors::{Error, Result};
pub use ingest::*;
pub use performance::*;
