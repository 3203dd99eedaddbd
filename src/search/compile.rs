//! Translates a [`SearchSpec`] into provider SQL.
//!
//! Compilation is pure string and parameter assembly; it touches no
//! connection. The compiled form keeps FROM/WHERE separate from ORDER and
//! paging so the executor can reuse the filter for counting and the
//! navigator can reuse it for facet aggregation.

use crate::model::book::SELECT_COLUMNS;
use crate::model::types::{OrderField, SearchMode, SortDirection};
use crate::search::spec::{Predicate, SearchPredicate, SearchSpec, SqlValue};
use itertools::Itertools;

/// Expression the fuzzy scorer runs against.
const FUZZY_TARGET: &str = "coalesce(b.title, '') || ' ' || coalesce(b.all_authors, '')";

/// How result rows are to be fetched.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchPlan {
    /// Single ordered scan with LIMIT/OFFSET.
    Ordered,
    /// Two indexed `rand_key` range scans wrapping around the pivot.
    RandomPivot(f64),
}

/// SQL pieces for one spec, ready to bind and run.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    from_clause: String,
    where_clause: String,
    order_clause: String,
    params: Vec<(String, SqlValue)>,
    pub plan: FetchPlan,
    pub page: u32,
    pub page_size: u32,
}

impl CompiledQuery {
    /// `(":p0", value)` pairs plus any raw-predicate params.
    pub fn params(&self) -> impl Iterator<Item = (String, &dyn rusqlite::ToSql)> {
        self.params
            .iter()
            .map(|(name, value)| (format!(":{name}"), value as &dyn rusqlite::ToSql))
    }

    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) {}{}", self.from_clause, self.where_clause)
    }

    /// Ordered fetch with `:limit` / `:offset` placeholders.
    pub fn fetch_sql(&self) -> String {
        format!(
            "SELECT {SELECT_COLUMNS} {}{} ORDER BY {} LIMIT :limit OFFSET :offset",
            self.from_clause, self.where_clause, self.order_clause
        )
    }

    /// Rows at or above the random pivot, in other words the head segment.
    pub fn random_head_count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) {}{}",
            self.from_clause,
            self.and_where("b.rand_key >= :pivot")
        )
    }

    /// One of the two random segments, ordered by `rand_key`.
    pub fn random_segment_sql(&self, head: bool) -> String {
        let bound = if head { "b.rand_key >= :pivot" } else { "b.rand_key < :pivot" };
        format!(
            "SELECT {SELECT_COLUMNS} {}{} ORDER BY b.rand_key ASC, b.book_id ASC \
             LIMIT :limit OFFSET :offset",
            self.from_clause,
            self.and_where(bound)
        )
    }

    /// FROM and WHERE verbatim, for aggregates that share the filter.
    pub fn filter_clauses(&self) -> (&str, &str) {
        (&self.from_clause, &self.where_clause)
    }

    fn and_where(&self, extra: &str) -> String {
        if self.where_clause.is_empty() {
            format!(" WHERE {extra}")
        } else {
            format!("{} AND {extra}", self.where_clause)
        }
    }
}

/// Compile a validated spec. `similarity_threshold` gates fuzzy matches.
pub fn compile(spec: &SearchSpec, similarity_threshold: f64) -> CompiledQuery {
    let mut params: Vec<(String, SqlValue)> = Vec::new();
    let mut bind = |value: SqlValue, params: &mut Vec<(String, SqlValue)>| -> String {
        let name = format!("p{}", params.len());
        params.push((name.clone(), value));
        format!(":{name}")
    };

    let mut from_clause = String::from("FROM books b");
    let mut conditions: Vec<String> = Vec::new();

    if let Some(SearchPredicate { text, mode, parsed }) = &spec.search {
        match mode {
            SearchMode::Exact => {
                from_clause.push_str(" JOIN books_fts ON books_fts.rowid = b.book_id");
                let expr = parsed
                    .as_ref()
                    .map(|q| q.to_match_expr())
                    .unwrap_or_else(|| text.clone());
                let p = bind(SqlValue::Text(expr), &mut params);
                conditions.push(format!("books_fts MATCH {p}"));
            }
            SearchMode::Fuzzy => {
                let q = bind(SqlValue::Text(text.clone()), &mut params);
                let t = bind(SqlValue::Real(similarity_threshold), &mut params);
                conditions.push(format!("word_similarity({q}, {FUZZY_TARGET}) >= {t}"));
            }
        }
    }

    for predicate in &spec.predicates {
        match predicate {
            Predicate::Equals { column, value } => {
                let p = bind(value.clone(), &mut params);
                conditions.push(format!("{column} = {p}"));
            }
            Predicate::InSet { column, values } => {
                // Validated positive integers, safe to inline.
                let list = values.iter().join(", ");
                conditions.push(format!("{column} IN ({list})"));
            }
            Predicate::Range { column, op, value } => {
                let p = bind(value.clone(), &mut params);
                conditions.push(format!("{column} {op} {p}"));
            }
            Predicate::ArrayContains { column, value } => {
                let p = bind(value.clone(), &mut params);
                conditions.push(format!(
                    "EXISTS (SELECT 1 FROM json_each({column}) WHERE json_each.value = {p})"
                ));
            }
            Predicate::ArrayPrefix { column, prefix } => {
                let p = bind(SqlValue::Text(format!("{prefix}%")), &mut params);
                conditions.push(format!(
                    "EXISTS (SELECT 1 FROM json_each({column}) WHERE json_each.value LIKE {p})"
                ));
            }
            Predicate::Raw { sql, params: raw } => {
                conditions.push(format!("({sql})"));
                params.extend(raw.iter().cloned());
            }
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let (order_clause, plan) = order_plan(spec, &mut params);

    CompiledQuery {
        from_clause,
        where_clause,
        order_clause,
        params,
        plan,
        page: spec.page,
        page_size: spec.page_size,
    }
}

fn order_plan(spec: &SearchSpec, params: &mut Vec<(String, SqlValue)>) -> (String, FetchPlan) {
    let search_mode = spec.search.as_ref().map(|s| s.mode);

    // No explicit order: relevance when a search is active, popularity otherwise.
    let (field, direction) = match spec.order {
        Some((field, dir)) => (field, dir),
        None if search_mode.is_some() => (OrderField::Relevance, None),
        None => (OrderField::Downloads, None),
    };

    if field == OrderField::Random {
        let pivot = spec.random_pivot.unwrap_or(0.0);
        return (String::new(), FetchPlan::RandomPivot(pivot));
    }

    let dir = direction.unwrap_or(match field {
        OrderField::Title | OrderField::Author => SortDirection::Asc,
        _ => SortDirection::Desc,
    });

    let mut keys: Vec<String> = Vec::new();
    match (field, search_mode) {
        (OrderField::Relevance, Some(SearchMode::Exact)) => {
            // bm25 reports lower-is-better, so descending relevance is ASC.
            let bm25_dir = match dir {
                SortDirection::Desc => "ASC",
                SortDirection::Asc => "DESC",
            };
            keys.push(format!("bm25(books_fts) {bm25_dir}"));
            keys.push("b.downloads DESC".into());
        }
        (OrderField::Relevance, Some(SearchMode::Fuzzy)) => {
            let q = format!("p{}", params.len());
            let text = spec.search.as_ref().map(|s| s.text.clone()).unwrap_or_default();
            params.push((q.clone(), SqlValue::Text(text)));
            keys.push(format!("word_similarity(:{q}, {FUZZY_TARGET}) {}", dir.as_sql()));
            keys.push("b.downloads DESC".into());
        }
        (OrderField::Relevance, None) => {
            keys.push(format!("b.downloads {}", dir.as_sql()));
        }
        (OrderField::Downloads, _) => keys.push(format!("b.downloads {}", dir.as_sql())),
        (OrderField::Title, _) => keys.push(format!("b.title COLLATE NOCASE {}", dir.as_sql())),
        (OrderField::Author, _) => {
            keys.push(format!("b.all_authors COLLATE NOCASE {}", dir.as_sql()))
        }
        (OrderField::ReleaseDate, _) => keys.push(format!("b.release_date {}", dir.as_sql())),
        (OrderField::Random, _) => unreachable!("handled above"),
    }
    // Stable tiebreak keeps pagination deterministic across identical runs.
    keys.push("b.book_id ASC".into());

    (keys.join(", "), FetchPlan::Ordered)
}
