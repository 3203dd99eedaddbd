//! The engine facade: pool ownership, query execution, catalog aggregates.
//!
//! One `SearchService` serves many concurrent requests. Each call checks a
//! connection out of the pool for its own duration; specs are immutable
//! values, so nothing here needs locking beyond the pool itself.

use crate::catalog::facets::{self, FacetEntry};
use crate::catalog::tree::ClassificationTree;
use crate::config::Config;
use crate::error::Result;
use crate::format::OutputSchema;
use crate::model::book::BookRow;
use crate::search::compile::{self, CompiledQuery};
use crate::search::spec::SearchSpec;
use crate::storage::executor::{self, CancelToken, Page};
use crate::storage::pool::Pool;
use serde_json::Value;
use tracing::info;

pub struct SearchService {
    pool: Pool,
    config: Config,
}

impl SearchService {
    pub fn open(config: Config) -> Result<Self> {
        let pool = Pool::open(&config)?;
        info!(db = %config.db_path.display(), "search service ready");
        Ok(SearchService { pool, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn compile(&self, spec: &SearchSpec) -> CompiledQuery {
        compile::compile(spec, self.config.similarity_threshold)
    }

    /// Run `spec` and return raw validated rows with paging totals.
    pub fn fetch(&self, spec: &SearchSpec) -> Result<Page<BookRow>> {
        self.fetch_with(spec, None)
    }

    pub fn fetch_with(&self, spec: &SearchSpec, cancel: Option<CancelToken>) -> Result<Page<BookRow>> {
        let query = self.compile(spec);
        let conn = self.pool.acquire()?;
        executor::execute(&conn, &query, self.config.statement_timeout, cancel)
    }

    /// Run `spec` and crosswalk each row through `schema`.
    pub fn execute(&self, spec: &SearchSpec, schema: &OutputSchema) -> Result<Page<Value>> {
        self.execute_with(spec, schema, None)
    }

    pub fn execute_with(
        &self,
        spec: &SearchSpec,
        schema: &OutputSchema,
        cancel: Option<CancelToken>,
    ) -> Result<Page<Value>> {
        let page = self.fetch_with(spec, cancel)?;
        let items = page
            .items
            .iter()
            .map(|row| schema.apply(row))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page {
            items,
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
        })
    }

    /// Count matches without fetching rows.
    pub fn count(&self, spec: &SearchSpec) -> Result<u64> {
        let query = self.compile(spec);
        let conn = self.pool.acquire()?;
        executor::count(&conn, &query, self.config.statement_timeout, None)
    }

    /// Top subjects across the full filtered set of `spec`.
    pub fn top_subjects(&self, spec: &SearchSpec) -> Result<Vec<FacetEntry>> {
        let query = self.compile(spec);
        let conn = self.pool.acquire()?;
        facets::top_subjects(&conn, &query, self.config.facet_limit)
    }

    pub fn list_subjects(&self) -> Result<Vec<FacetEntry>> {
        let conn = self.pool.acquire()?;
        facets::list_subjects(&conn)
    }

    pub fn list_bookshelves(&self) -> Result<Vec<FacetEntry>> {
        let conn = self.pool.acquire()?;
        facets::list_bookshelves(&conn)
    }

    pub fn subject_name(&self, subject_id: i64) -> Result<String> {
        let conn = self.pool.acquire()?;
        facets::subject_name(&conn, subject_id)
    }

    pub fn bookshelf_name(&self, bookshelf_id: i64) -> Result<String> {
        let conn = self.pool.acquire()?;
        facets::bookshelf_name(&conn, bookshelf_id)
    }

    /// Classification arena over the main classes plus every code observed
    /// in the catalog. Rebuilt on demand; callers cache it per navigator.
    pub fn classification_tree(&self) -> Result<ClassificationTree> {
        let conn = self.pool.acquire()?;
        let observed = facets::observed_classifications(&conn)?;
        Ok(ClassificationTree::build(observed))
    }
}
