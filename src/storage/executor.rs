//! Runs compiled queries against a pooled connection.
//!
//! Count and fetch run inside one deferred read transaction so both see the
//! same snapshot. A watchdog thread owns the connection's interrupt handle
//! and fires it when the statement deadline passes or the caller's cancel
//! token trips.

use crate::error::{Result, SearchError};
use crate::model::book::BookRow;
use crate::search::compile::{CompiledQuery, FetchPlan};
use rusqlite::{Connection, Statement, ToSql};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// One page of results plus the totals needed to render pagination.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    fn new(items: Vec<T>, total: u64, page: u32, page_size: u32) -> Self {
        Self {
            items,
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        }
    }
}

/// `ceil(total / page_size)`; zero for an empty result set.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    ((total + size - 1) / size) as u32
}

/// Cooperative cancellation shared between a caller and a running query.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct Watchdog {
    done: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Spawn a thread that interrupts the connection once the deadline
    /// passes or the token is cancelled, and keeps interrupting until the
    /// guarded work finishes.
    fn arm(conn: &Connection, deadline: Instant, cancel: Option<CancelToken>) -> Self {
        let interrupt = conn.get_interrupt_handle();
        let done = Arc::new(AtomicBool::new(false));
        let done_flag = done.clone();
        let handle = std::thread::spawn(move || {
            while !done_flag.load(Ordering::SeqCst) {
                let tripped = Instant::now() >= deadline
                    || cancel.as_ref().is_some_and(CancelToken::is_cancelled);
                if tripped {
                    interrupt.interrupt();
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        });
        Watchdog {
            done,
            handle: Some(handle),
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.done.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Execute `query`: count the filtered set, fetch the requested page, and
/// validate each row's parallel attribute arrays.
pub fn execute(
    conn: &Connection,
    query: &CompiledQuery,
    statement_timeout: Duration,
    cancel: Option<CancelToken>,
) -> Result<Page<BookRow>> {
    let deadline = Instant::now() + statement_timeout;
    let _watchdog = Watchdog::arm(conn, deadline, cancel.clone());

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| SearchError::db("begin read transaction", e))?;

    let total = run_count(&tx, &query.count_sql(), query).map_err(remap(&cancel))?;

    let offset = u64::from(query.page - 1) * u64::from(query.page_size);
    let limit = u64::from(query.page_size);

    let items = match query.plan {
        FetchPlan::Ordered => {
            fetch_rows(&tx, &query.fetch_sql(), query, &[], limit, offset)
                .map_err(remap(&cancel))?
        }
        FetchPlan::RandomPivot(pivot) => {
            fetch_random(&tx, query, pivot, limit, offset).map_err(remap(&cancel))?
        }
    };

    tx.commit().map_err(|e| SearchError::db("finish read transaction", e))?;

    debug!(total, page = query.page, rows = items.len(), "query executed");
    Ok(Page::new(items, total, query.page, query.page_size))
}

/// Count the filtered set without fetching rows.
pub fn count(
    conn: &Connection,
    query: &CompiledQuery,
    statement_timeout: Duration,
    cancel: Option<CancelToken>,
) -> Result<u64> {
    let deadline = Instant::now() + statement_timeout;
    let _watchdog = Watchdog::arm(conn, deadline, cancel.clone());
    run_count(conn, &query.count_sql(), query).map_err(remap(&cancel))
}

/// Random order fetches the head segment (`rand_key >= pivot`) first and
/// wraps to the tail, translating the page offset across the seam.
fn fetch_random(
    conn: &Connection,
    query: &CompiledQuery,
    pivot: f64,
    limit: u64,
    offset: u64,
) -> Result<Vec<BookRow>> {
    let pivot_param: (&str, &dyn ToSql) = (":pivot", &pivot);
    let head_total = run_count_extra(conn, &query.random_head_count_sql(), query, &[pivot_param])?;
    trace!(pivot, head_total, offset, "random fetch plan");

    let mut rows = Vec::new();
    if offset < head_total {
        rows = fetch_rows(
            conn,
            &query.random_segment_sql(true),
            query,
            &[pivot_param],
            limit,
            offset,
        )?;
    }
    let missing = limit as usize - rows.len().min(limit as usize);
    if missing > 0 {
        let tail_offset = offset.saturating_sub(head_total);
        let mut tail = fetch_rows(
            conn,
            &query.random_segment_sql(false),
            query,
            &[pivot_param],
            missing as u64,
            tail_offset,
        )?;
        rows.append(&mut tail);
    }
    Ok(rows)
}

fn run_count(conn: &Connection, sql: &str, query: &CompiledQuery) -> Result<u64> {
    run_count_extra(conn, sql, query, &[])
}

fn run_count_extra(
    conn: &Connection,
    sql: &str,
    query: &CompiledQuery,
    extra: &[(&str, &dyn ToSql)],
) -> Result<u64> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| SearchError::db(format!("prepare: {sql}"), e))?;
    bind_known(&mut stmt, query, extra).map_err(|e| SearchError::db("bind count params", e))?;
    let mut rows = stmt.raw_query();
    let row = rows
        .next()
        .map_err(|e| SearchError::db("run count", e))?
        .ok_or_else(|| SearchError::db("run count", rusqlite::Error::QueryReturnedNoRows))?;
    let total: i64 = row.get(0).map_err(|e| SearchError::db("read count", e))?;
    Ok(total.max(0) as u64)
}

fn fetch_rows(
    conn: &Connection,
    sql: &str,
    query: &CompiledQuery,
    extra: &[(&str, &dyn ToSql)],
    limit: u64,
    offset: u64,
) -> Result<Vec<BookRow>> {
    let limit = limit as i64;
    let offset = offset as i64;
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| SearchError::db(format!("prepare: {sql}"), e))?;
    let mut all: Vec<(&str, &dyn ToSql)> = extra.to_vec();
    all.push((":limit", &limit));
    all.push((":offset", &offset));
    bind_known(&mut stmt, query, &all).map_err(|e| SearchError::db("bind fetch params", e))?;

    let mut rows = stmt.raw_query();
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(|e| SearchError::db("step fetch", e))? {
        let book = BookRow::from_sql_row(row).map_err(|e| SearchError::db("map row", e))?;
        book.validate()?;
        out.push(book);
    }
    Ok(out)
}

/// Bind every compiled or extra parameter whose name appears in the
/// statement. Count statements legitimately use a subset of the fetch
/// parameters, so absent names are skipped rather than rejected.
pub(crate) fn bind_known(
    stmt: &mut Statement<'_>,
    query: &CompiledQuery,
    extra: &[(&str, &dyn ToSql)],
) -> rusqlite::Result<()> {
    for (name, value) in query.params() {
        if let Some(idx) = stmt.parameter_index(&name)? {
            stmt.raw_bind_parameter(idx, value)?;
        }
    }
    for (name, value) in extra {
        if let Some(idx) = stmt.parameter_index(name)? {
            stmt.raw_bind_parameter(idx, *value)?;
        }
    }
    Ok(())
}

/// Turn an interrupt surfaced by the provider into the caller-facing
/// cancellation or timeout error.
fn remap(cancel: &Option<CancelToken>) -> impl Fn(SearchError) -> SearchError + '_ {
    move |err| match err {
        SearchError::Database { source, .. } if is_interrupt(&source) => {
            if cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                SearchError::Interrupted { reason: "cancelled by caller" }
            } else {
                SearchError::Interrupted { reason: "statement timeout" }
            }
        }
        other => other,
    }
}

fn is_interrupt(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::OperationInterrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 28), 0);
        assert_eq!(total_pages(1, 28), 1);
        assert_eq!(total_pages(28, 28), 1);
        assert_eq!(total_pages(29, 28), 2);
        assert_eq!(total_pages(100, 10), 10);
    }

    #[test]
    fn cancel_token_trips_once() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.clone().is_cancelled());
    }
}
