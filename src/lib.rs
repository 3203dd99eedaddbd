//! Faceted search and catalog browsing over a denormalized book index.
//!
//! The pipeline: [`search::SearchSpec`] accumulates validated filter,
//! search, order, and paging intent; [`search::compile`] turns one spec
//! into provider SQL; [`storage`] runs it under a consistent snapshot with
//! timeout and cancellation; [`format`] crosswalks rows into output
//! schemas; [`catalog`] layers classification browsing and facets on top.
//! [`service::SearchService`] ties the pieces together behind one facade.

pub mod catalog;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod search;
pub mod service;
pub mod storage;

pub use catalog::{BrowseFilters, BrowseOutcome, FacetEntry, Navigator};
pub use config::Config;
pub use error::{Result, SearchError};
pub use format::OutputSchema;
pub use model::{BookRow, OrderField, SearchMode, SortDirection};
pub use search::SearchSpec;
pub use service::SearchService;
pub use storage::{CancelToken, Page};
