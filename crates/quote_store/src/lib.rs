pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{QuoteStore, SqliteQuoteStore};
