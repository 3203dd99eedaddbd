//! Catalog browsing: classification tree, facet aggregation, navigator.

pub mod facets;
pub mod navigator;
pub mod tree;

pub use facets::FacetEntry;
pub use navigator::{
    BookFeed, BrowseFilters, BrowseOutcome, FilterGroup, NavEntry, NavEntryKind, Navigator,
};
pub use tree::{ClassificationNode, ClassificationTree};
