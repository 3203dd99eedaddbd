//! Immutable query specification.
//!
//! A [`SearchSpec`] is a value: every builder method consumes the spec and
//! returns a new one, so a spec can be cloned, shared across requests, and
//! re-executed without aliasing hazards. All validation happens here, at
//! build time, naming the offending field. Nothing is deferred to execution.

use crate::error::{Result, SearchError};
use crate::model::types::{OrderField, SearchMode, SortDirection};
use crate::search::boolean::{self, BoolQuery};
use chrono::NaiveDate;
use rand::Rng;
use rusqlite::types::{ToSql, ToSqlOutput};

pub const DEFAULT_PAGE_SIZE: u32 = 28;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlValue::Integer(v) => v.to_sql(),
            SqlValue::Real(v) => v.to_sql(),
            SqlValue::Text(v) => v.to_sql(),
        }
    }
}

/// One filter condition contributed to the specification.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = value`
    Equals { column: &'static str, value: SqlValue },
    /// `column IN (...)`
    InSet { column: &'static str, values: Vec<i64> },
    /// `column <op> value`
    Range {
        column: &'static str,
        op: &'static str,
        value: SqlValue,
    },
    /// JSON array column contains `value`.
    ArrayContains { column: &'static str, value: SqlValue },
    /// JSON array column holds any element starting with `prefix`.
    ArrayPrefix { column: &'static str, prefix: String },
    /// Caller-supplied SQL fragment with named parameters.
    Raw {
        sql: String,
        params: Vec<(String, SqlValue)>,
    },
}

/// The active search-mode predicate. At most one per spec; a later
/// `search()` call replaces it.
#[derive(Debug, Clone)]
pub struct SearchPredicate {
    pub text: String,
    pub mode: SearchMode,
    /// Parsed boolean expression; present exactly when `mode` is Exact.
    pub parsed: Option<BoolQuery>,
}

/// Immutable description of filters, mode, order, and paging for one query.
#[derive(Debug, Clone)]
pub struct SearchSpec {
    pub(crate) search: Option<SearchPredicate>,
    pub(crate) predicates: Vec<Predicate>,
    pub(crate) order: Option<(OrderField, Option<SortDirection>)>,
    pub(crate) page: u32,
    pub(crate) page_size: u32,
    /// Sampled once when random order is selected, so re-executing the same
    /// spec yields identical ordered results.
    pub(crate) random_pivot: Option<f64>,
}

impl SearchSpec {
    pub fn new() -> Self {
        Self {
            search: None,
            predicates: Vec::new(),
            order: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            random_pivot: None,
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }

    /// Attach a text-search predicate. Exact mode parses the boolean grammar
    /// eagerly; a malformed expression fails here, before any query runs.
    pub fn search(mut self, text: &str, mode: SearchMode) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SearchError::validation("query", "search text must not be empty"));
        }
        let parsed = match mode {
            SearchMode::Exact => Some(boolean::parse(text)?),
            SearchMode::Fuzzy => None,
        };
        self.search = Some(SearchPredicate {
            text: text.to_string(),
            mode,
            parsed,
        });
        Ok(self)
    }

    pub fn book_id(self, id: i64) -> Result<Self> {
        if id <= 0 {
            return Err(SearchError::validation("book_id", "must be positive"));
        }
        Ok(self.push(Predicate::Equals {
            column: "b.book_id",
            value: SqlValue::Integer(id),
        }))
    }

    pub fn book_ids(self, ids: &[i64]) -> Result<Self> {
        if ids.is_empty() {
            return Err(SearchError::validation("book_ids", "must not be empty"));
        }
        if let Some(bad) = ids.iter().find(|&&id| id <= 0) {
            return Err(SearchError::validation("book_ids", format!("invalid id {bad}")));
        }
        Ok(self.push(Predicate::InSet {
            column: "b.book_id",
            values: ids.to_vec(),
        }))
    }

    pub fn downloads_gte(self, n: i64) -> Result<Self> {
        self.count_range("downloads", "b.downloads", ">=", n)
    }

    pub fn downloads_lte(self, n: i64) -> Result<Self> {
        self.count_range("downloads", "b.downloads", "<=", n)
    }

    fn count_range(
        self,
        field: &'static str,
        column: &'static str,
        op: &'static str,
        n: i64,
    ) -> Result<Self> {
        if n < 0 {
            return Err(SearchError::validation(field, "must not be negative"));
        }
        Ok(self.push(Predicate::Range {
            column,
            op,
            value: SqlValue::Integer(n),
        }))
    }

    pub fn released_after(self, date: &str) -> Result<Self> {
        self.date_range("b.release_date", ">=", date)
    }

    pub fn released_before(self, date: &str) -> Result<Self> {
        self.date_range("b.release_date", "<=", date)
    }

    fn date_range(self, column: &'static str, op: &'static str, date: &str) -> Result<Self> {
        // ISO dates compare correctly as text once the format is validated.
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
            SearchError::validation("release_date", format!("{date:?} is not a YYYY-MM-DD date: {e}"))
        })?;
        Ok(self.push(Predicate::Range {
            column,
            op,
            value: SqlValue::Text(parsed.format("%Y-%m-%d").to_string()),
        }))
    }

    pub fn author_born_after(self, year: i32) -> Result<Self> {
        self.year_range("b.max_author_birthyear", ">=", year)
    }

    pub fn author_born_before(self, year: i32) -> Result<Self> {
        self.year_range("b.min_author_birthyear", "<=", year)
    }

    pub fn author_died_after(self, year: i32) -> Result<Self> {
        self.year_range("b.max_author_deathyear", ">=", year)
    }

    pub fn author_died_before(self, year: i32) -> Result<Self> {
        self.year_range("b.min_author_deathyear", "<=", year)
    }

    fn year_range(self, column: &'static str, op: &'static str, year: i32) -> Result<Self> {
        if !(-4000..=9999).contains(&year) {
            return Err(SearchError::validation("year", format!("{year} out of range")));
        }
        Ok(self.push(Predicate::Range {
            column,
            op,
            value: SqlValue::Integer(i64::from(year)),
        }))
    }

    pub fn lang(self, code: &str) -> Result<Self> {
        let code = code.trim().to_ascii_lowercase();
        if code.is_empty() || code.len() > 3 || !code.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(SearchError::validation("lang", format!("bad language code {code:?}")));
        }
        Ok(self.push(Predicate::ArrayContains {
            column: "b.lang_codes",
            value: SqlValue::Text(code),
        }))
    }

    pub fn public_domain(self) -> Self {
        self.push(Predicate::Equals {
            column: "b.copyrighted",
            value: SqlValue::Integer(0),
        })
    }

    pub fn copyrighted_only(self) -> Self {
        self.push(Predicate::Equals {
            column: "b.copyrighted",
            value: SqlValue::Integer(1),
        })
    }

    pub fn text_only(self) -> Self {
        self.push(Predicate::Equals {
            column: "b.is_audio",
            value: SqlValue::Integer(0),
        })
    }

    pub fn audiobook_only(self) -> Self {
        self.push(Predicate::Equals {
            column: "b.is_audio",
            value: SqlValue::Integer(1),
        })
    }

    pub fn subject_id(self, id: i64) -> Result<Self> {
        if id <= 0 {
            return Err(SearchError::validation("subject_id", "must be positive"));
        }
        Ok(self.push(Predicate::ArrayContains {
            column: "b.subject_ids",
            value: SqlValue::Integer(id),
        }))
    }

    pub fn bookshelf_id(self, id: i64) -> Result<Self> {
        if id <= 0 {
            return Err(SearchError::validation("bookshelf_id", "must be positive"));
        }
        Ok(self.push(Predicate::ArrayContains {
            column: "b.bookshelf_ids",
            value: SqlValue::Integer(id),
        }))
    }

    /// Filter to books whose classification codes fall under `code`
    /// (child codes are textual extensions of the parent code).
    pub fn classification(self, code: &str) -> Result<Self> {
        let code = code.trim().to_ascii_uppercase();
        if code.is_empty()
            || !code.chars().next().is_some_and(|c| c.is_ascii_uppercase())
            || !code.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(SearchError::validation(
                "classification",
                format!("bad classification code {code:?}"),
            ));
        }
        Ok(self.push(Predicate::ArrayPrefix {
            column: "b.locc_codes",
            prefix: code,
        }))
    }

    pub fn contributor_role(self, role: &str) -> Result<Self> {
        let role = role.trim();
        if role.is_empty() {
            return Err(SearchError::validation("contributor_role", "must not be empty"));
        }
        Ok(self.push(Predicate::ArrayContains {
            column: "b.creator_roles",
            value: SqlValue::Text(role.to_string()),
        }))
    }

    pub fn media_type(self, mediatype: &str) -> Result<Self> {
        let mediatype = mediatype.trim();
        if mediatype.is_empty() || !mediatype.contains('/') {
            return Err(SearchError::validation(
                "media_type",
                format!("{mediatype:?} is not a media type"),
            ));
        }
        Ok(self.push(Predicate::ArrayContains {
            column: "b.format_mediatypes",
            value: SqlValue::Text(mediatype.to_string()),
        }))
    }

    /// Raw SQL escape hatch. Parameter names matching the compiler's
    /// auto-generated `p<N>` family are rejected.
    pub fn raw(self, sql: &str, params: Vec<(String, SqlValue)>) -> Result<Self> {
        if sql.trim().is_empty() {
            return Err(SearchError::validation("raw", "empty SQL fragment"));
        }
        for (name, _) in &params {
            let mut chars = name.chars();
            let reserved = chars.next() == Some('p')
                && name.len() > 1
                && chars.all(|c| c.is_ascii_digit());
            if reserved {
                return Err(SearchError::validation(
                    "raw",
                    format!("parameter name {name:?} is reserved by the compiler"),
                ));
            }
        }
        Ok(self.push(Predicate::Raw {
            sql: sql.to_string(),
            params,
        }))
    }

    /// Set ordering. Selecting random order samples the pivot immediately so
    /// the spec stays a self-contained, re-executable value.
    pub fn order_by(mut self, field: OrderField, direction: Option<SortDirection>) -> Self {
        if field == OrderField::Random && self.random_pivot.is_none() {
            self.random_pivot = Some(rand::thread_rng().gen_range(0.0..1.0));
        }
        self.order = Some((field, direction));
        self
    }

    /// Set paging. Out-of-range values fail fast; nothing is clamped.
    pub fn page(mut self, number: u32, size: u32) -> Result<Self> {
        if number < 1 {
            return Err(SearchError::validation("page", "page number must be >= 1"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(SearchError::validation(
                "page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}, got {size}"),
            ));
        }
        self.page = number;
        self.page_size = size;
        Ok(self)
    }

    fn push(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }
}
