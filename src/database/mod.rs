pub mod schema;
pub mod watch_store;

pub use schema::initialize_schema;
pub use watch_store::{StoreError, WatchStore};
