//! Domain model: closed enums, static catalog tables, and the denormalized
//! book record.

pub mod book;
pub mod types;

pub use book::BookRow;
pub use types::{OrderField, SearchMode, SortDirection};
