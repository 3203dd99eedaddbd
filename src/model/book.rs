//! The denormalized book record and its parallel attribute families.
//!
//! Each family (creators, subjects, bookshelves, formats) is stored as a set
//! of parallel JSON array columns; index `i` refers to the same logical
//! sub-entity across every array in the family. The accessors here are the
//! single place that invariant is checked: a length mismatch is reported as
//! `SearchError::Format` naming the row, never zipped or truncated silently.

use crate::error::{Result, SearchError};
use itertools::izip;
use serde::{Deserialize, Serialize};

/// One denormalized catalog row, as selected by the query compiler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookRow {
    pub book_id: i64,
    pub title: Option<String>,
    pub all_authors: Option<String>,
    pub downloads: i64,
    pub release_date: Option<String>,
    pub copyrighted: bool,
    pub is_audio: bool,
    pub lang_codes: Vec<String>,
    pub creator_ids: Vec<i64>,
    pub creator_names: Vec<String>,
    pub creator_roles: Vec<String>,
    pub subject_ids: Vec<i64>,
    pub subject_names: Vec<String>,
    pub bookshelf_ids: Vec<i64>,
    pub bookshelf_names: Vec<String>,
    pub locc_codes: Vec<String>,
    pub dcmitypes: Vec<String>,
    pub publisher: Option<String>,
    pub summary: Vec<String>,
    pub credits: Vec<String>,
    pub reading_level: Option<String>,
    pub coverpage: Vec<String>,
    pub format_filenames: Vec<String>,
    pub format_filetypes: Vec<String>,
    pub format_hr_filetypes: Vec<String>,
    pub format_mediatypes: Vec<String>,
    pub format_extents: Vec<i64>,
}

/// A creator entry joined across the creator family.
#[derive(Debug, Clone, Serialize)]
pub struct Creator {
    pub id: i64,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShelfRef {
    pub id: i64,
    pub name: String,
}

/// One downloadable rendition joined across the format family.
#[derive(Debug, Clone, Serialize)]
pub struct FormatRef {
    pub filename: String,
    pub filetype: String,
    pub hr_filetype: String,
    pub mediatype: String,
    pub extent: i64,
}

/// Column list the compiler selects, in `from_sql_row` order.
pub const SELECT_COLUMNS: &str = "b.book_id, b.title, b.all_authors, b.downloads, \
     b.release_date, b.copyrighted, b.is_audio, b.lang_codes, \
     b.creator_ids, b.creator_names, b.creator_roles, \
     b.subject_ids, b.subject_names, b.bookshelf_ids, b.bookshelf_names, \
     b.locc_codes, b.dcmitypes, b.publisher, b.summary, b.credits, \
     b.reading_level, b.coverpage, b.format_filenames, b.format_filetypes, \
     b.format_hr_filetypes, b.format_mediatypes, b.format_extents";

fn json_column<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Vec<T>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(Vec::new()),
        Some(s) if s.is_empty() => Ok(Vec::new()),
        Some(s) => serde_json::from_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        }),
    }
}

impl BookRow {
    /// Map one provider row. Column order must match [`SELECT_COLUMNS`].
    pub fn from_sql_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(BookRow {
            book_id: row.get(0)?,
            title: row.get(1)?,
            all_authors: row.get(2)?,
            downloads: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
            release_date: row.get(4)?,
            copyrighted: row.get::<_, Option<i64>>(5)?.unwrap_or(0) != 0,
            is_audio: row.get::<_, Option<i64>>(6)?.unwrap_or(0) != 0,
            lang_codes: json_column(row, 7)?,
            creator_ids: json_column(row, 8)?,
            creator_names: json_column(row, 9)?,
            creator_roles: json_column(row, 10)?,
            subject_ids: json_column(row, 11)?,
            subject_names: json_column(row, 12)?,
            bookshelf_ids: json_column(row, 13)?,
            bookshelf_names: json_column(row, 14)?,
            locc_codes: json_column(row, 15)?,
            dcmitypes: json_column(row, 16)?,
            publisher: row.get(17)?,
            summary: json_column(row, 18)?,
            credits: json_column(row, 19)?,
            reading_level: row.get(20)?,
            coverpage: json_column(row, 21)?,
            format_filenames: json_column(row, 22)?,
            format_filetypes: json_column(row, 23)?,
            format_hr_filetypes: json_column(row, 24)?,
            format_mediatypes: json_column(row, 25)?,
            format_extents: json_column(row, 26)?,
        })
    }

    /// Check every parallel family at once, as done per fetched row.
    pub fn validate(&self) -> Result<()> {
        self.creators()?;
        self.subjects()?;
        self.bookshelves()?;
        self.formats()?;
        Ok(())
    }

    fn check_family(&self, family: &'static str, lens: &[(&'static str, usize)]) -> Result<()> {
        let first = lens[0].1;
        if lens.iter().any(|&(_, len)| len != first) {
            let detail = lens
                .iter()
                .map(|(name, len)| format!("{name}={len}"))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(SearchError::Format {
                book_id: self.book_id,
                family,
                detail,
            });
        }
        Ok(())
    }

    /// Creator sub-entities. A blank role falls back to "Author".
    pub fn creators(&self) -> Result<Vec<Creator>> {
        self.check_family(
            "creator",
            &[
                ("creator_ids", self.creator_ids.len()),
                ("creator_names", self.creator_names.len()),
                ("creator_roles", self.creator_roles.len()),
            ],
        )?;
        Ok(izip!(&self.creator_ids, &self.creator_names, &self.creator_roles)
            .filter(|(_, name, _)| !name.is_empty())
            .map(|(&id, name, role)| Creator {
                id,
                name: name.clone(),
                role: if role.is_empty() {
                    "Author".to_string()
                } else {
                    role.clone()
                },
            })
            .collect())
    }

    pub fn subjects(&self) -> Result<Vec<SubjectRef>> {
        self.check_family(
            "subject",
            &[
                ("subject_ids", self.subject_ids.len()),
                ("subject_names", self.subject_names.len()),
            ],
        )?;
        Ok(izip!(&self.subject_ids, &self.subject_names)
            .filter(|(_, name)| !name.is_empty())
            .map(|(&id, name)| SubjectRef {
                id,
                name: name.clone(),
            })
            .collect())
    }

    pub fn bookshelves(&self) -> Result<Vec<ShelfRef>> {
        self.check_family(
            "bookshelf",
            &[
                ("bookshelf_ids", self.bookshelf_ids.len()),
                ("bookshelf_names", self.bookshelf_names.len()),
            ],
        )?;
        Ok(izip!(&self.bookshelf_ids, &self.bookshelf_names)
            .filter(|(_, name)| !name.is_empty())
            .map(|(&id, name)| ShelfRef {
                id,
                name: name.clone(),
            })
            .collect())
    }

    pub fn formats(&self) -> Result<Vec<FormatRef>> {
        self.check_family(
            "format",
            &[
                ("format_filenames", self.format_filenames.len()),
                ("format_filetypes", self.format_filetypes.len()),
                ("format_hr_filetypes", self.format_hr_filetypes.len()),
                ("format_mediatypes", self.format_mediatypes.len()),
                ("format_extents", self.format_extents.len()),
            ],
        )?;
        Ok(izip!(
            &self.format_filenames,
            &self.format_filetypes,
            &self.format_hr_filetypes,
            &self.format_mediatypes,
            &self.format_extents
        )
        .filter(|(fname, ..)| !fname.is_empty())
        .map(|(fname, ftype, hr, media, &extent)| FormatRef {
            filename: fname.clone(),
            filetype: ftype.clone(),
            hr_filetype: hr.clone(),
            mediatype: media.clone(),
            extent,
        })
        .collect())
    }
}
