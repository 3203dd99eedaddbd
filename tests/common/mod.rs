//! Shared fixture: a temporary catalog database with the provider schema
//! the engine expects (denormalized `books` table, `books_fts` index,
//! indexed `rand_key`).

use gutensearch::{Config, SearchService};
use rusqlite::{params, Connection};
use std::path::PathBuf;
use tempfile::TempDir;

pub struct Fixture {
    _dir: TempDir,
    pub db_path: PathBuf,
}

/// One seedable catalog row. Only set what the test cares about.
#[derive(Debug, Clone)]
pub struct Seed {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub downloads: i64,
    pub release_date: String,
    pub copyrighted: bool,
    pub is_audio: bool,
    pub langs: Vec<&'static str>,
    /// (id, name, role)
    pub creators: Vec<(i64, String, String)>,
    /// (id, name)
    pub subjects: Vec<(i64, String)>,
    /// (id, name)
    pub shelves: Vec<(i64, String)>,
    pub loccs: Vec<&'static str>,
    /// (filename, filetype, hr_filetype, mediatype, extent)
    pub formats: Vec<(String, String, String, String, i64)>,
    pub author_birthyear: Option<i64>,
    pub author_deathyear: Option<i64>,
}

impl Seed {
    pub fn new(id: i64, title: &str, author: &str) -> Self {
        Seed {
            id,
            title: title.to_string(),
            author: author.to_string(),
            downloads: 0,
            release_date: "2000-01-01".to_string(),
            copyrighted: false,
            is_audio: false,
            langs: vec!["en"],
            creators: vec![(id * 10, author.to_string(), "Author".to_string())],
            subjects: Vec::new(),
            shelves: Vec::new(),
            loccs: Vec::new(),
            formats: Vec::new(),
            author_birthyear: None,
            author_deathyear: None,
        }
    }
}

const SCHEMA: &str = "
    CREATE TABLE books (
        book_id INTEGER PRIMARY KEY,
        title TEXT,
        all_authors TEXT,
        downloads INTEGER NOT NULL DEFAULT 0,
        release_date TEXT,
        copyrighted INTEGER NOT NULL DEFAULT 0,
        is_audio INTEGER NOT NULL DEFAULT 0,
        lang_codes TEXT,
        creator_ids TEXT,
        creator_names TEXT,
        creator_roles TEXT,
        subject_ids TEXT,
        subject_names TEXT,
        bookshelf_ids TEXT,
        bookshelf_names TEXT,
        locc_codes TEXT,
        dcmitypes TEXT,
        publisher TEXT,
        summary TEXT,
        credits TEXT,
        reading_level TEXT,
        coverpage TEXT,
        format_filenames TEXT,
        format_filetypes TEXT,
        format_hr_filetypes TEXT,
        format_mediatypes TEXT,
        format_extents TEXT,
        min_author_birthyear INTEGER,
        max_author_birthyear INTEGER,
        min_author_deathyear INTEGER,
        max_author_deathyear INTEGER,
        rand_key REAL NOT NULL DEFAULT 0.5
    );
    CREATE INDEX idx_books_rand_key ON books(rand_key);
    CREATE INDEX idx_books_downloads ON books(downloads);
    CREATE VIRTUAL TABLE books_fts USING fts5(
        title, all_authors, subjects,
        content='',
        tokenize='porter unicode61'
    );
";

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let db_path = dir.path().join("catalog.db");
        let conn = Connection::open(&db_path).expect("open fixture db");
        conn.execute_batch(SCHEMA).expect("apply schema");
        Fixture {
            _dir: dir,
            db_path,
        }
    }

    pub fn conn(&self) -> Connection {
        Connection::open(&self.db_path).expect("open fixture db")
    }

    pub fn config(&self) -> Config {
        Config {
            db_path: self.db_path.clone(),
            pool_size: 2,
            ..Config::default()
        }
    }

    pub fn service(&self) -> SearchService {
        SearchService::open(self.config()).expect("open service")
    }

    pub fn add(&self, seed: &Seed) {
        let conn = self.conn();
        let json = |v: &serde_json::Value| v.to_string();
        let creator_ids: Vec<i64> = seed.creators.iter().map(|c| c.0).collect();
        let creator_names: Vec<&str> = seed.creators.iter().map(|c| c.1.as_str()).collect();
        let creator_roles: Vec<&str> = seed.creators.iter().map(|c| c.2.as_str()).collect();
        let subject_ids: Vec<i64> = seed.subjects.iter().map(|s| s.0).collect();
        let subject_names: Vec<&str> = seed.subjects.iter().map(|s| s.1.as_str()).collect();
        let shelf_ids: Vec<i64> = seed.shelves.iter().map(|s| s.0).collect();
        let shelf_names: Vec<&str> = seed.shelves.iter().map(|s| s.1.as_str()).collect();
        let filenames: Vec<&str> = seed.formats.iter().map(|f| f.0.as_str()).collect();
        let filetypes: Vec<&str> = seed.formats.iter().map(|f| f.1.as_str()).collect();
        let hr_filetypes: Vec<&str> = seed.formats.iter().map(|f| f.2.as_str()).collect();
        let mediatypes: Vec<&str> = seed.formats.iter().map(|f| f.3.as_str()).collect();
        let extents: Vec<i64> = seed.formats.iter().map(|f| f.4).collect();

        // Deterministic spread over [0, 1) so random-order tests are stable.
        let rand_key = (seed.id.wrapping_mul(2654435761) % 1000).unsigned_abs() as f64 / 1000.0;

        conn.execute(
            "INSERT INTO books (
                book_id, title, all_authors, downloads, release_date,
                copyrighted, is_audio, lang_codes,
                creator_ids, creator_names, creator_roles,
                subject_ids, subject_names, bookshelf_ids, bookshelf_names,
                locc_codes, dcmitypes, publisher, summary, credits,
                reading_level, coverpage,
                format_filenames, format_filetypes, format_hr_filetypes,
                format_mediatypes, format_extents,
                min_author_birthyear, max_author_birthyear,
                min_author_deathyear, max_author_deathyear,
                rand_key
             ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26,
                ?27, ?28, ?29, ?30, ?31, ?32
             )",
            params![
                seed.id,
                seed.title,
                seed.author,
                seed.downloads,
                seed.release_date,
                seed.copyrighted as i64,
                seed.is_audio as i64,
                json(&serde_json::json!(seed.langs)),
                json(&serde_json::json!(creator_ids)),
                json(&serde_json::json!(creator_names)),
                json(&serde_json::json!(creator_roles)),
                json(&serde_json::json!(subject_ids)),
                json(&serde_json::json!(subject_names)),
                json(&serde_json::json!(shelf_ids)),
                json(&serde_json::json!(shelf_names)),
                json(&serde_json::json!(seed.loccs)),
                "[]",
                Option::<String>::None,
                "[]",
                "[]",
                Option::<String>::None,
                "[]",
                json(&serde_json::json!(filenames)),
                json(&serde_json::json!(filetypes)),
                json(&serde_json::json!(hr_filetypes)),
                json(&serde_json::json!(mediatypes)),
                json(&serde_json::json!(extents)),
                seed.author_birthyear,
                seed.author_birthyear,
                seed.author_deathyear,
                seed.author_deathyear,
                rand_key,
            ],
        )
        .expect("insert book");

        conn.execute(
            "INSERT INTO books_fts (rowid, title, all_authors, subjects) VALUES (?1, ?2, ?3, ?4)",
            params![
                seed.id,
                seed.title,
                seed.author,
                subject_names.join(" "),
            ],
        )
        .expect("insert fts row");
    }
}

/// 50 rows, the first 30 matching "Shakespeare" in title or author.
pub fn shakespeare_scenario() -> Fixture {
    let fixture = Fixture::new();
    for i in 1..=50i64 {
        let mut seed = if i <= 30 {
            let mut s = Seed::new(i, &format!("The Plays of Shakespeare, Volume {i}"), "Shakespeare, William");
            s.loccs = vec!["PR"];
            s.subjects = vec![(900, "Drama".to_string())];
            s
        } else {
            let mut s = Seed::new(i, &format!("A Treatise on Botany, Volume {i}"), "Linnaeus, Carl");
            s.loccs = vec!["QK"];
            s.subjects = vec![(901, "Botany".to_string())];
            s
        };
        // Distinct download counts give every ordering a unique answer.
        seed.downloads = 1000 - i;
        fixture.add(&seed);
    }
    fixture
}
