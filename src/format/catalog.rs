//! Catalog-feed publication shape (OPDS 2.0 style).
//!
//! Unlike the flat crosswalks, a publication folds the record into
//! `metadata` plus acquisition `links`. Link selection walks a per-medium
//! format ladder so feed readers always get the best available rendition,
//! and a readable HTML page stands in when no stored file qualifies.

use crate::error::Result;
use crate::format::crosswalk::rights_text;
use crate::format::text::{clean, clean_credits, contributor_line, reverse_name, strunk};
use crate::model::book::{BookRow, FormatRef};
use crate::model::types::{AUDIO_FORMAT_PRIORITY, FILETYPE_MEDIA, TEXT_FORMAT_PRIORITY};
use serde_json::{json, Map, Value};

const SITE: &str = "https://www.gutenberg.org";

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

fn absolute_href(filename: &str) -> String {
    if filename.starts_with("http://") || filename.starts_with("https://") {
        filename.to_string()
    } else {
        format!("{SITE}/{}", filename.trim_start_matches('/'))
    }
}

/// First format whose filetype matches the medium's priority ladder.
fn pick_acquisition(formats: &[FormatRef], is_audio: bool) -> Option<&FormatRef> {
    let ladder = if is_audio { AUDIO_FORMAT_PRIORITY } else { TEXT_FORMAT_PRIORITY };
    ladder.iter().find_map(|wanted| {
        formats
            .iter()
            .filter(|f| !f.filename.is_empty())
            .find(|f| f.filetype.trim().to_lowercase() == *wanted)
    })
}

/// Cover image: `cover.medium` wins, any other cover rendition is the
/// fallback.
fn pick_cover(formats: &[FormatRef]) -> Option<&FormatRef> {
    formats
        .iter()
        .filter(|f| !f.filename.is_empty())
        .find(|f| f.filetype.contains("cover.medium"))
        .or_else(|| {
            formats
                .iter()
                .filter(|f| !f.filename.is_empty())
                .find(|f| f.filetype.contains("cover"))
        })
}

/// Crosswalk one row into a catalog publication.
pub fn publication(row: &BookRow) -> Result<Value> {
    let creators = row.creators()?;
    let subjects = row.subjects()?;
    let bookshelves = row.bookshelves()?;
    let formats = row.formats()?;
    let locc_codes: Vec<&String> = row.locc_codes.iter().filter(|c| !c.is_empty()).collect();

    let mut metadata = Map::new();
    metadata.insert("@type".into(), json!("http://schema.org/Book"));
    metadata.insert("identifier".into(), json!(format!("urn:gutenberg:{}", row.book_id)));
    metadata.insert("title".into(), json!(row.title.as_deref().map(clean)));
    let language = row
        .lang_codes
        .iter()
        .find(|c| !c.is_empty())
        .map(String::as_str)
        .unwrap_or("en");
    metadata.insert("language".into(), json!(language));

    if let Some(main) = creators.first() {
        let sort_as = clean(&main.name);
        let mut author = Map::new();
        author.insert("name".into(), json!(reverse_name(&sort_as)));
        author.insert("sortAs".into(), json!(sort_as));
        if main.id > 0 {
            author.insert(
                "identifier".into(),
                json!(format!("{SITE}/ebooks/author/{}", main.id)),
            );
        }
        metadata.insert("author".into(), Value::Object(author));
    }

    if let Some(date) = &row.release_date {
        metadata.insert("published".into(), json!(date));
    }

    let mut description_parts: Vec<String> = Vec::new();
    if let Some(summary) = row.summary.first() {
        description_parts.push(clean(summary));
    }
    let by_lines: Vec<String> = creators
        .iter()
        .map(|c| contributor_line(&clean(&c.name), &c.role, true))
        .filter(|line| !line.is_empty())
        .collect();
    if !by_lines.is_empty() {
        description_parts.push(format!("By {}", strunk(&by_lines)));
    }
    if let Some(credits) = row.credits.first() {
        description_parts.push(format!("Credits: {}", clean_credits(credits)));
    }
    if let Some(level) = &row.reading_level {
        description_parts.push(format!("Reading Level: {level}"));
    }
    let dcmitypes: Vec<&String> = row.dcmitypes.iter().filter(|t| !t.is_empty()).collect();
    if !dcmitypes.is_empty() {
        let joined = dcmitypes.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ");
        description_parts.push(format!("Category: {joined}"));
    }
    description_parts.push(format!("Rights: {}", rights_text(row.copyrighted)));
    description_parts.push(format!("Downloads: {}", row.downloads));
    let description = format!(
        "<p>{}</p>",
        description_parts
            .iter()
            .map(|p| escape_html(p))
            .collect::<Vec<_>>()
            .join("</p><p>")
    );
    metadata.insert("description".into(), json!(description));

    let mut subject_values: Vec<String> = subjects.iter().map(|s| clean(&s.name)).collect();
    subject_values.extend(locc_codes.iter().map(|c| c.to_string()));
    if !subject_values.is_empty() {
        metadata.insert("subject".into(), json!(subject_values));
    }

    if let Some(publisher) = &row.publisher {
        metadata.insert("publisher".into(), json!(clean(publisher)));
    }

    let mut collections: Vec<Value> = bookshelves
        .iter()
        .map(|shelf| {
            json!({
                "name": clean(&shelf.name),
                "identifier": format!("{SITE}/ebooks/bookshelf/{}", shelf.id),
            })
        })
        .collect();
    collections.extend(locc_codes.iter().map(|code| {
        json!({
            "name": code,
            "identifier": format!("{SITE}/ebooks/locc/{code}"),
        })
    }));
    if !collections.is_empty() {
        metadata.insert("belongsTo".into(), json!({ "collection": collections }));
    }

    // Feed readers require at least one acquisition link.
    let link = match pick_acquisition(&formats, row.is_audio) {
        Some(f) => {
            let fallback = FILETYPE_MEDIA.get(f.filetype.trim().to_lowercase().as_str());
            let mut link = Map::new();
            link.insert("rel".into(), json!("http://opds-spec.org/acquisition/open-access"));
            link.insert("href".into(), json!(absolute_href(&f.filename)));
            let mediatype = f.mediatype.trim();
            let mediatype = if mediatype.is_empty() {
                fallback.map(|(m, _)| *m).unwrap_or("application/epub+zip")
            } else {
                mediatype
            };
            link.insert("type".into(), json!(mediatype));
            if f.extent > 0 {
                link.insert("length".into(), json!(f.extent));
            }
            let label = if f.hr_filetype.is_empty() {
                fallback.map(|(_, l)| (*l).to_string())
            } else {
                Some(f.hr_filetype.clone())
            };
            if let Some(label) = label {
                link.insert("title".into(), json!(label));
            }
            Value::Object(link)
        }
        None => json!({
            "rel": "http://opds-spec.org/acquisition/open-access",
            "href": format!("{SITE}/ebooks/{}", row.book_id),
            "type": "text/html",
        }),
    };

    let mut publication = Map::new();
    publication.insert("metadata".into(), Value::Object(metadata));
    publication.insert("links".into(), json!([link]));

    if let Some(cover) = pick_cover(&formats) {
        publication.insert(
            "images".into(),
            json!([{ "href": absolute_href(&cover.filename), "type": "image/jpeg" }]),
        );
    }

    Ok(Value::Object(publication))
}
