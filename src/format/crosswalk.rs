//! Row-to-JSON crosswalks.
//!
//! Each crosswalk takes one validated [`BookRow`] and emits a
//! self-contained JSON document. Field cleanup happens here, on the way
//! out; the row itself keeps the raw stored values.

use crate::error::Result;
use crate::format::text::{clean, clean_credits};
use crate::model::book::BookRow;
use crate::model::types::language_label;
use serde_json::{json, Value};

pub(crate) fn rights_text(copyrighted: bool) -> &'static str {
    if copyrighted {
        "Copyrighted. Read the copyright notice inside this book for details."
    } else {
        "Public domain in the USA."
    }
}

fn languages(row: &BookRow) -> Vec<Value> {
    row.lang_codes
        .iter()
        .filter(|code| !code.is_empty())
        .map(|code| {
            json!({
                "code": code,
                "name": language_label(code),
            })
        })
        .collect()
}

/// Everything the record holds, families joined into sub-objects.
pub fn full(row: &BookRow) -> Result<Value> {
    let creators: Vec<Value> = row
        .creators()?
        .iter()
        .map(|c| json!({"id": c.id, "name": clean(&c.name), "role": c.role}))
        .collect();
    let subjects: Vec<Value> = row
        .subjects()?
        .iter()
        .map(|s| json!({"id": s.id, "subject": clean(&s.name)}))
        .collect();
    let bookshelves: Vec<Value> = row
        .bookshelves()?
        .iter()
        .map(|b| json!({"id": b.id, "bookshelf": clean(&b.name)}))
        .collect();
    let formats: Vec<Value> = row
        .formats()?
        .iter()
        .map(|f| {
            json!({
                "filename": f.filename,
                "filetype": f.filetype,
                "hr_filetype": f.hr_filetype,
                "mediatype": f.mediatype,
                "extent": f.extent,
            })
        })
        .collect();
    let coverage: Vec<Value> = row
        .locc_codes
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| json!({"id": c, "locc": c}))
        .collect();
    let dcmitypes: Vec<Value> = row
        .dcmitypes
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| json!({"dcmitype": t}))
        .collect();

    Ok(json!({
        "book_id": row.book_id,
        "title": row.title.as_deref().map(clean),
        "author": row.all_authors.as_deref().map(clean),
        "downloads": row.downloads,
        "creators": creators,
        "language": languages(row),
        "subjects": subjects,
        "bookshelves": bookshelves,
        "date": row.release_date,
        "format": formats,
        "coverpage": row.coverpage,
        "summary": row.summary.iter().map(|s| clean(s)).collect::<Vec<_>>(),
        "credits": row.credits.iter().map(|c| clean_credits(c)).collect::<Vec<_>>(),
        "type": dcmitypes,
        "rights": rights_text(row.copyrighted),
        "coverage": coverage,
        "publisher": row.publisher.as_deref().map(|p| json!({"raw": clean(p)})),
    }))
}

/// Result-list shape: identity, display line, popularity.
pub fn mini(row: &BookRow) -> Result<Value> {
    Ok(json!({
        "id": row.book_id,
        "title": row.title.as_deref().map(clean),
        "author": row.all_authors.as_deref().map(clean),
        "downloads": row.downloads,
    }))
}

/// The shape served to external API consumers.
pub fn external_api(row: &BookRow) -> Result<Value> {
    let contributors: Vec<Value> = row
        .creators()?
        .iter()
        .map(|c| json!({"name": clean(&c.name), "role": c.role}))
        .collect();
    let subjects: Vec<String> = row.subjects()?.iter().map(|s| clean(&s.name)).collect();
    let bookshelves: Vec<String> = row.bookshelves()?.iter().map(|b| clean(&b.name)).collect();
    let files: Vec<Value> = row
        .formats()?
        .iter()
        .map(|f| json!({"filename": f.filename, "type": f.mediatype, "size": f.extent}))
        .collect();

    Ok(json!({
        "ebook_no": row.book_id,
        "title": row.title.as_deref().map(clean),
        "contributors": contributors,
        "language": languages(row),
        "subjects": subjects,
        "bookshelves": bookshelves,
        "release_date": row.release_date,
        "downloads_last_30_days": row.downloads,
        "files": files,
        "cover_url": row.coverpage.first(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> BookRow {
        BookRow {
            book_id: 2701,
            title: Some("Moby Dick; or, The Whale".into()),
            all_authors: Some("Melville, Herman".into()),
            downloads: 99120,
            release_date: Some("2001-07-01".into()),
            copyrighted: false,
            lang_codes: vec!["en".into()],
            creator_ids: vec![9],
            creator_names: vec!["Melville, Herman".into()],
            creator_roles: vec!["Author".into()],
            subject_ids: vec![3, 4],
            subject_names: vec!["Whaling -- Fiction".into(), "Sea stories".into()],
            locc_codes: vec!["PS".into()],
            format_filenames: vec!["/ebooks/2701.epub3.images".into()],
            format_filetypes: vec!["epub3.images".into()],
            format_hr_filetypes: vec!["EPUB3 (E-readers incl. Send-to-Kindle)".into()],
            format_mediatypes: vec!["application/epub+zip".into()],
            format_extents: vec![12345],
            ..BookRow::default()
        }
    }

    #[test]
    fn mini_is_a_subset_of_full() {
        let row = sample_row();
        let full = full(&row).unwrap();
        let mini = mini(&row).unwrap();
        assert_eq!(mini["id"], full["book_id"]);
        assert_eq!(mini["title"], full["title"]);
        assert_eq!(mini["author"], full["author"]);
        assert_eq!(mini["downloads"], full["downloads"]);
    }

    #[test]
    fn full_cleans_title_separators_and_labels_languages() {
        let doc = full(&sample_row()).unwrap();
        assert_eq!(doc["title"], "Moby Dick: or, The Whale");
        assert_eq!(doc["language"][0]["code"], "en");
        assert_eq!(doc["language"][0]["name"], "English");
        assert_eq!(doc["rights"], "Public domain in the USA.");
        assert_eq!(doc["coverage"][0]["locc"], "PS");
    }

    #[test]
    fn external_api_flattens_subjects_and_files() {
        let doc = external_api(&sample_row()).unwrap();
        assert_eq!(doc["ebook_no"], 2701);
        assert_eq!(doc["subjects"][0], "Whaling -- Fiction");
        assert_eq!(doc["files"][0]["type"], "application/epub+zip");
        assert_eq!(doc["files"][0]["size"], 12345);
        assert_eq!(doc["downloads_last_30_days"], 99120);
        assert!(doc["cover_url"].is_null());
    }

    #[test]
    fn misaligned_family_surfaces_as_format_error() {
        let mut row = sample_row();
        row.subject_ids.pop();
        assert!(full(&row).is_err());
    }
}
