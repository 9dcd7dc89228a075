pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryCatalog, InMemoryStore};
pub use postgres::PostgresStore;
pub use store::{CartStore, CartStoreExt, CheckoutStore, OrderStore, ProductCatalog};
