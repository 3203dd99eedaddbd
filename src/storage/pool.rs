//! Bounded connection pool over the provider database.
//!
//! A fixed set of connections is opened up front and cycled through a
//! bounded channel. Checkout hands back an RAII guard; dropping the guard
//! returns the connection to the free list. Each connection registers the
//! `word_similarity` scalar used by fuzzy search.

use crate::config::Config;
use crate::error::{Result, SearchError};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub struct Pool {
    free_tx: Sender<Connection>,
    free_rx: Receiver<Connection>,
    acquire_timeout: Duration,
}

impl Pool {
    /// Open `config.pool_size` connections against `config.db_path`.
    pub fn open(config: &Config) -> Result<Self> {
        let size = config.pool_size.max(1);
        let (free_tx, free_rx) = bounded(size);
        for _ in 0..size {
            let conn = open_connection(&config.db_path)?;
            free_tx
                .send(conn)
                .expect("free list cannot be full during pool construction");
        }
        debug!(size, path = %config.db_path.display(), "connection pool ready");
        Ok(Pool {
            free_tx,
            free_rx,
            acquire_timeout: config.acquire_timeout,
        })
    }

    /// Check out a connection, waiting up to the acquire timeout.
    pub fn acquire(&self) -> Result<PooledConn> {
        match self.free_rx.recv_timeout(self.acquire_timeout) {
            Ok(conn) => Ok(PooledConn {
                conn: Some(conn),
                free_tx: self.free_tx.clone(),
            }),
            Err(RecvTimeoutError::Timeout) => Err(SearchError::PoolExhausted {
                waited_ms: self.acquire_timeout.as_millis() as u64,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(SearchError::PoolExhausted { waited_ms: 0 }),
        }
    }
}

/// Checkout guard. Derefs to the connection and returns it on drop.
pub struct PooledConn {
    conn: Option<Connection>,
    free_tx: Sender<Connection>,
}

impl Deref for PooledConn {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for PooledConn {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConn {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            // Receiver gone means the pool itself was dropped.
            let _ = self.free_tx.send(conn);
        }
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).map_err(|e| SearchError::db("open connection", e))?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| SearchError::db("set journal_mode", e))?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(|e| SearchError::db("set synchronous", e))?;
    conn.pragma_update(None, "busy_timeout", 5000)
        .map_err(|e| SearchError::db("set busy_timeout", e))?;
    register_word_similarity(&conn)?;
    Ok(conn)
}

/// Install `word_similarity(query, text) -> REAL` on this connection.
pub fn register_word_similarity(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "word_similarity",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let query: String = ctx.get(0)?;
            let text: String = ctx.get(1)?;
            Ok(word_similarity(&query, &text))
        },
    )
    .map_err(|e| SearchError::db("register word_similarity", e))
}

/// Word-level similarity in `[0, 1]`. Each query word is scored against its
/// best-matching text word with Sorensen-Dice over character bigrams, and
/// the per-word bests are averaged.
pub fn word_similarity(query: &str, text: &str) -> f64 {
    let query = query.to_lowercase();
    let text = text.to_lowercase();
    let text_words: Vec<&str> = text.split_whitespace().collect();
    if text_words.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    let mut count = 0usize;
    for query_word in query.split_whitespace() {
        let best = text_words
            .iter()
            .map(|w| strsim::sorensen_dice(query_word, w))
            .fold(0.0f64, f64::max);
        total += best;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_words_score_one() {
        assert_eq!(word_similarity("whale", "The Whale"), 1.0);
    }

    #[test]
    fn typo_scores_between_zero_and_one() {
        let score = word_similarity("Shakspeare", "William Shakespeare");
        assert!(score > 0.6, "got {score}");
        assert!(score < 1.0);
    }

    #[test]
    fn unrelated_text_scores_low() {
        let score = word_similarity("zebra", "Pride and Prejudice");
        assert!(score < 0.3, "got {score}");
    }

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(word_similarity("whale", ""), 0.0);
        assert_eq!(word_similarity("", "whale"), 0.0);
    }

    #[test]
    fn udf_is_callable_from_sql() {
        let conn = Connection::open_in_memory().unwrap();
        register_word_similarity(&conn).unwrap();
        let score: f64 = conn
            .query_row("SELECT word_similarity('whale', 'The Whale')", [], |r| r.get(0))
            .unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn guard_returns_connection_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            db_path: dir.path().join("pool.db"),
            pool_size: 1,
            ..Config::default()
        };
        let pool = Pool::open(&config).unwrap();
        {
            let conn = pool.acquire().unwrap();
            conn.execute_batch("SELECT 1").unwrap();
            // Second checkout would block while the guard is alive.
        }
        let again = pool.acquire().unwrap();
        again.execute_batch("SELECT 1").unwrap();
    }
}
