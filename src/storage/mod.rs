//! Provider access: pooled connections and compiled-query execution.

pub mod executor;
pub mod pool;

pub use executor::{count, execute, total_pages, CancelToken, Page};
pub use pool::{Pool, PooledConn};
