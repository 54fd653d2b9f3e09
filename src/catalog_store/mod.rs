mod legacy_adapter;
mod models;
mod schema;
mod store;
mod trait_def;

pub use legacy_adapter::LegacyCatalogAdapter;
pub use models::*;
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use store::{ImportTransaction, SqliteCatalogStore};
pub use trait_def::{CatalogStore, SearchableContentType, SearchableItem};
