//! Hierarchical catalog browsing.
//!
//! One navigator serves three shapes of request from a single
//! classification-code parameter: no code lists the registered top-level
//! classes, a code with registered children lists those children, and a
//! leaf code turns into a filtered, formatted book feed. Subject and
//! bookshelf browsing reuse the same feed path with a different predicate.

use crate::catalog::facets::FacetEntry;
use crate::catalog::tree::{ClassificationNode, ClassificationTree};
use crate::error::Result;
use crate::format::OutputSchema;
use crate::model::types::{
    OrderField, SearchMode, SortDirection, CURATED_BOOKSHELVES, LANGUAGES,
};
use crate::search::spec::SearchSpec;
use crate::service::SearchService;
use crate::storage::executor::Page;
use serde_json::Value;
use tracing::debug;

/// Request-scoped browse parameters, as handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct BrowseFilters {
    pub query: Option<String>,
    pub mode: SearchMode,
    pub lang: Option<String>,
    /// `Some(true)` keeps copyrighted books only, `Some(false)` public domain.
    pub copyrighted: Option<bool>,
    /// `Some(true)` keeps audiobooks only, `Some(false)` text renditions.
    pub audiobook: Option<bool>,
    pub order: Option<(OrderField, Option<SortDirection>)>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for BrowseFilters {
    fn default() -> Self {
        BrowseFilters {
            query: None,
            mode: SearchMode::Fuzzy,
            lang: None,
            copyrighted: None,
            audiobook: None,
            order: None,
            page: 1,
            page_size: crate::search::spec::DEFAULT_PAGE_SIZE,
        }
    }
}

/// One navigation entry below the current node.
#[derive(Debug, Clone)]
pub struct NavEntry {
    pub code: String,
    pub label: String,
    pub kind: NavEntryKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavEntryKind {
    /// Has registered children; carries how many.
    Branch { subcategories: usize },
    /// Terminal node; carries its matching book count.
    Leaf { books: u64 },
}

/// A filtered, formatted page of books plus its subject facets.
#[derive(Debug)]
pub struct BookFeed {
    pub title: String,
    pub page: Page<Value>,
    pub facets: Vec<FacetEntry>,
}

/// Outcome of one classification browse step.
#[derive(Debug)]
pub enum BrowseOutcome {
    Navigation(Vec<NavEntry>),
    Books(BookFeed),
}

/// One static filter group rendered next to a feed, as (value, label) pairs.
#[derive(Debug, Clone, Copy)]
pub struct FilterGroup {
    pub title: &'static str,
    pub options: &'static [(&'static str, &'static str)],
}

pub struct Navigator<'a> {
    service: &'a SearchService,
    tree: ClassificationTree,
}

impl<'a> Navigator<'a> {
    pub fn new(service: &'a SearchService) -> Result<Self> {
        let tree = service.classification_tree()?;
        Ok(Navigator { service, tree })
    }

    pub fn tree(&self) -> &ClassificationTree {
        &self.tree
    }

    /// Static language list for feed facets.
    pub fn languages() -> &'static [(&'static str, &'static str)] {
        LANGUAGES
    }

    /// Curated bookshelf categories for the bookshelves landing page.
    pub fn curated_shelves() -> &'static [(&'static str, &'static [(i64, &'static str)])] {
        CURATED_BOOKSHELVES
    }

    /// Sort, copyright, and format groups rendered as facet links on feeds.
    /// Language options come from [`Navigator::languages`].
    pub fn filter_groups() -> &'static [FilterGroup] {
        &[
            FilterGroup {
                title: "Sort",
                options: &[
                    ("downloads", "Popular"),
                    ("release_date", "Recently Added"),
                    ("title", "Alphabetical"),
                    ("random", "Random"),
                ],
            },
            FilterGroup {
                title: "Copyright",
                options: &[("false", "Public Domain"), ("true", "Copyrighted")],
            },
            FilterGroup {
                title: "Format",
                options: &[("text", "Text"), ("audio", "Audiobook")],
            },
        ]
    }

    /// Drive the classification state machine from an optional code.
    pub fn browse(&self, code: Option<&str>, filters: &BrowseFilters) -> Result<BrowseOutcome> {
        let code = code.map(str::trim).filter(|c| !c.is_empty());
        match code {
            None => Ok(BrowseOutcome::Navigation(self.entries(self.tree.roots())?)),
            Some(code) => match self.tree.children(code) {
                Some(children) if !children.is_empty() => {
                    Ok(BrowseOutcome::Navigation(self.entries(children)?))
                }
                _ => {
                    debug!(code, "classification leaf, fetching books");
                    let label = self
                        .tree
                        .get(code)
                        .map(|node| node.label.clone())
                        .unwrap_or_else(|| code.to_ascii_uppercase());
                    let spec = self.feed_spec(filters)?.classification(code)?;
                    self.feed(label, spec).map(BrowseOutcome::Books)
                }
            },
        }
    }

    /// Book feed for one subject, titled with its resolved name.
    pub fn subject(&self, subject_id: i64, filters: &BrowseFilters) -> Result<BookFeed> {
        let title = self.service.subject_name(subject_id)?;
        let spec = self.feed_spec(filters)?.subject_id(subject_id)?;
        self.feed(title, spec)
    }

    /// Book feed for one bookshelf, titled with its resolved name.
    pub fn bookshelf(&self, bookshelf_id: i64, filters: &BrowseFilters) -> Result<BookFeed> {
        let title = self.service.bookshelf_name(bookshelf_id)?;
        let spec = self.feed_spec(filters)?.bookshelf_id(bookshelf_id)?;
        self.feed(title, spec)
    }

    /// Plain search feed with no classification predicate.
    pub fn search(&self, filters: &BrowseFilters) -> Result<BookFeed> {
        let title = filters
            .query
            .as_deref()
            .map(|q| format!("Search: {q}"))
            .unwrap_or_else(|| "All Books".to_string());
        let spec = self.feed_spec(filters)?;
        self.feed(title, spec)
    }

    fn entries(&self, nodes: Vec<&ClassificationNode>) -> Result<Vec<NavEntry>> {
        nodes
            .into_iter()
            .map(|node| {
                let kind = if node.is_leaf() {
                    let spec = SearchSpec::new().classification(&node.code)?;
                    NavEntryKind::Leaf {
                        books: self.service.count(&spec)?,
                    }
                } else {
                    NavEntryKind::Branch {
                        subcategories: node.children.len(),
                    }
                };
                Ok(NavEntry {
                    code: node.code.clone(),
                    label: node.label.clone(),
                    kind,
                })
            })
            .collect()
    }

    fn feed(&self, title: String, spec: SearchSpec) -> Result<BookFeed> {
        let page = self.service.execute(&spec, &OutputSchema::Catalog)?;
        let facets = self.service.top_subjects(&spec)?;
        Ok(BookFeed { title, page, facets })
    }

    fn feed_spec(&self, filters: &BrowseFilters) -> Result<SearchSpec> {
        let mut spec = SearchSpec::new().page(filters.page, filters.page_size)?;
        if let Some(query) = filters.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            spec = spec.search(query, filters.mode)?;
        }
        if let Some(lang) = &filters.lang {
            spec = spec.lang(lang)?;
        }
        spec = match filters.copyrighted {
            Some(true) => spec.copyrighted_only(),
            Some(false) => spec.public_domain(),
            None => spec,
        };
        spec = match filters.audiobook {
            Some(true) => spec.audiobook_only(),
            Some(false) => spec.text_only(),
            None => spec,
        };
        if let Some((field, direction)) = filters.order {
            spec = spec.order_by(field, direction);
        }
        Ok(spec)
    }
}
