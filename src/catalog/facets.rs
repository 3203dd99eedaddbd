//! Facet and catalog-entity aggregation.
//!
//! All aggregates here pair the id and name arrays of one family through
//! `json_each` on the shared array index, so a misaligned row simply drops
//! out of the pairing instead of poisoning the whole aggregate.

use crate::error::{Result, SearchError};
use crate::search::compile::CompiledQuery;
use crate::storage::executor::bind_known;
use rusqlite::Connection;

/// One facet row: entity identity plus its occurrence count.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetEntry {
    pub id: i64,
    pub name: String,
    pub count: u64,
}

/// Top subjects across the full filtered set of `query`, counted per book,
/// ordered by count descending with name ascending on ties.
pub fn top_subjects(
    conn: &Connection,
    query: &CompiledQuery,
    limit: usize,
) -> Result<Vec<FacetEntry>> {
    let (from_clause, where_clause) = query.filter_clauses();
    let pairing = "si.key = sn.key";
    let where_sql = if where_clause.is_empty() {
        format!(" WHERE {pairing}")
    } else {
        format!("{where_clause} AND {pairing}")
    };
    let sql = format!(
        "SELECT si.value, sn.value, COUNT(*) AS n \
         {from_clause}, json_each(b.subject_ids) si, json_each(b.subject_names) sn\
         {where_sql} \
         GROUP BY si.value, sn.value \
         ORDER BY n DESC, sn.value ASC \
         LIMIT {limit}"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| SearchError::db("prepare subject facet", e))?;
    bind_known(&mut stmt, query, &[]).map_err(|e| SearchError::db("bind subject facet", e))?;
    collect_entries(stmt, "subject facet")
}

/// Every subject in the catalog with its book count, most used first.
pub fn list_subjects(conn: &Connection) -> Result<Vec<FacetEntry>> {
    aggregate_family(conn, "subject_ids", "subject_names", "ORDER BY n DESC, name ASC")
}

/// Every bookshelf in the catalog with its book count, in name order.
pub fn list_bookshelves(conn: &Connection) -> Result<Vec<FacetEntry>> {
    aggregate_family(conn, "bookshelf_ids", "bookshelf_names", "ORDER BY name ASC")
}

fn aggregate_family(
    conn: &Connection,
    ids: &str,
    names: &str,
    order: &str,
) -> Result<Vec<FacetEntry>> {
    let sql = format!(
        "SELECT i.value, n.value AS name, COUNT(*) AS n \
         FROM books b, json_each(b.{ids}) i, json_each(b.{names}) n \
         WHERE i.key = n.key \
         GROUP BY i.value, n.value {order}"
    );
    let stmt = conn
        .prepare(&sql)
        .map_err(|e| SearchError::db("prepare catalog aggregate", e))?;
    collect_entries(stmt, "catalog aggregate")
}

/// Resolve one subject id to its display name.
pub fn subject_name(conn: &Connection, subject_id: i64) -> Result<String> {
    entity_name(conn, "subject_ids", "subject_names", "subject", subject_id)
}

/// Resolve one bookshelf id to its display name.
pub fn bookshelf_name(conn: &Connection, bookshelf_id: i64) -> Result<String> {
    entity_name(conn, "bookshelf_ids", "bookshelf_names", "bookshelf", bookshelf_id)
}

fn entity_name(
    conn: &Connection,
    ids: &str,
    names: &str,
    entity: &'static str,
    id: i64,
) -> Result<String> {
    let sql = format!(
        "SELECT n.value FROM books b, json_each(b.{ids}) i, json_each(b.{names}) n \
         WHERE i.key = n.key AND i.value = ?1 LIMIT 1"
    );
    let found: Option<String> = conn
        .query_row(&sql, [id], |row| row.get(0))
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(SearchError::db("resolve entity name", other)),
        })?;
    found.ok_or_else(|| SearchError::NotFound {
        entity,
        id: id.to_string(),
    })
}

/// Distinct classification codes observed anywhere in the catalog.
pub fn observed_classifications(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT json_each.value FROM books b, json_each(b.locc_codes) \
             WHERE json_each.value <> ''",
        )
        .map_err(|e| SearchError::db("prepare classification scan", e))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| SearchError::db("run classification scan", e))?;
    let mut out = Vec::new();
    for code in rows {
        out.push(code.map_err(|e| SearchError::db("read classification code", e))?);
    }
    Ok(out)
}

fn collect_entries(mut stmt: rusqlite::Statement<'_>, context: &str) -> Result<Vec<FacetEntry>> {
    let mut rows = stmt.raw_query();
    let mut out = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| SearchError::db(context.to_string(), e))?
    {
        let entry = FacetEntry {
            id: row.get(0).map_err(|e| SearchError::db(context.to_string(), e))?,
            name: row.get(1).map_err(|e| SearchError::db(context.to_string(), e))?,
            count: row
                .get::<_, i64>(2)
                .map_err(|e| SearchError::db(context.to_string(), e))?
                .max(0) as u64,
        };
        out.push(entry);
    }
    Ok(out)
}
