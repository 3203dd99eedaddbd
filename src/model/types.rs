//! Closed enums and static catalog tables.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How search text is matched against the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Stemmed full-text match with the restricted boolean grammar.
    Exact,
    /// Typo-tolerant similarity match; no operator parsing.
    Fuzzy,
}

/// Supported sort fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    /// Match score. Only meaningful with a search predicate; the compiler
    /// falls back to downloads descending otherwise.
    Relevance,
    Downloads,
    Title,
    Author,
    ReleaseDate,
    /// Indexed random sampling; never a full ranked scan.
    Random,
}

impl OrderField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "relevance" => Some(Self::Relevance),
            "downloads" => Some(Self::Downloads),
            "title" => Some(Self::Title),
            "author" => Some(Self::Author),
            "release_date" => Some(Self::ReleaseDate),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// `(code, label)` pairs for every language the catalog carries.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("af", "Afrikaans"),
    ("ang", "Old English"),
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("br", "Breton"),
    ("ca", "Catalan"),
    ("ceb", "Cebuano"),
    ("cs", "Czech"),
    ("cy", "Welsh"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("enm", "Middle English"),
    ("eo", "Esperanto"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("fa", "Persian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("fy", "Western Frisian"),
    ("ga", "Irish"),
    ("gl", "Galician"),
    ("gla", "Scottish Gaelic"),
    ("grc", "Ancient Greek"),
    ("he", "Hebrew"),
    ("hu", "Hungarian"),
    ("ia", "Interlingua"),
    ("is", "Icelandic"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("la", "Latin"),
    ("lt", "Lithuanian"),
    ("mi", "M\u{101}ori"),
    ("nah", "Nahuatl"),
    ("nap", "Neapolitan"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("oc", "Occitan"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sa", "Sanskrit"),
    ("sco", "Scots"),
    ("sl", "Slovenian"),
    ("sr", "Serbian"),
    ("sv", "Swedish"),
    ("te", "Telugu"),
    ("tl", "Tagalog"),
    ("yi", "Yiddish"),
    ("zh", "Chinese"),
];

static LANGUAGE_LABELS: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| LANGUAGES.iter().copied().collect());

/// Human label for a language code, falling back to the code itself.
pub fn language_label(code: &str) -> &str {
    LANGUAGE_LABELS.get(code).copied().unwrap_or(code)
}

/// Top-level subject classification classes (Library of Congress style).
pub const MAIN_CLASSES: &[(&str, &str)] = &[
    ("A", "General Works"),
    ("B", "Philosophy, Psychology, Religion"),
    ("C", "History: Auxiliary Sciences"),
    ("D", "History: General and Eastern Hemisphere"),
    ("E", "History: America"),
    ("F", "History: America (Local)"),
    ("G", "Geography, Anthropology, Recreation"),
    ("H", "Social Sciences"),
    ("J", "Political Science"),
    ("K", "Law"),
    ("L", "Education"),
    ("M", "Music"),
    ("N", "Fine Arts"),
    ("P", "Language and Literature"),
    ("Q", "Science"),
    ("R", "Medicine"),
    ("S", "Agriculture"),
    ("T", "Technology"),
    ("U", "Military Science"),
    ("V", "Naval Science"),
    ("Z", "Bibliography, Library Science"),
];

/// Curated bookshelf categories: `(category, [(shelf id, shelf name)])`.
pub const CURATED_BOOKSHELVES: &[(&str, &[(i64, &str)])] = &[
    (
        "Literature",
        &[
            (644, "Adventure"),
            (654, "American Literature"),
            (653, "British Literature"),
            (649, "Classics of Literature"),
            (643, "Biographies"),
            (645, "Novels"),
            (634, "Short Stories"),
            (637, "Poetry"),
            (642, "Plays/Films/Dramas"),
            (639, "Romance"),
            (638, "Science-Fiction & Fantasy"),
            (640, "Crime, Thrillers & Mystery"),
            (646, "Mythology, Legends & Folklore"),
            (641, "Humour"),
            (636, "Children & Young Adult Reading"),
            (633, "Literature - Other"),
        ],
    ),
    (
        "Science & Technology",
        &[
            (671, "Engineering & Technology"),
            (672, "Mathematics"),
            (667, "Science - Physics"),
            (668, "Science - Chemistry/Biochemistry"),
            (669, "Science - Biology"),
            (670, "Science - Earth/Agricultural/Farming"),
            (685, "Environmental Issues"),
        ],
    ),
    (
        "History",
        &[
            (656, "History - American"),
            (657, "History - British"),
            (658, "History - European"),
            (659, "History - Ancient"),
            (660, "History - Medieval/Middle Ages"),
            (661, "History - Early Modern (c. 1450-1750)"),
            (662, "History - Modern (1750+)"),
            (665, "History - Warfare"),
            (655, "History - Other"),
        ],
    ),
    (
        "Social Sciences & Society",
        &[
            (695, "Business/Management"),
            (696, "Economics"),
            (689, "Law & Criminology"),
            (688, "Psychiatry/Psychology"),
            (693, "Sociology"),
            (694, "Politics"),
        ],
    ),
    (
        "Arts & Culture",
        &[
            (675, "Art"),
            (674, "Architecture"),
            (677, "Music"),
            (687, "Language & Communication"),
            (647, "Essays, Letters & Speeches"),
        ],
    ),
    (
        "Religion & Philosophy",
        &[(692, "Religion/Spirituality"), (691, "Philosophy & Ethics")],
    ),
    (
        "Lifestyle & Hobbies",
        &[
            (678, "Cooking & Drinking"),
            (680, "Sports/Hobbies"),
            (648, "Travel Writing"),
            (683, "Nature/Gardening/Animals"),
        ],
    ),
    (
        "Health & Medicine",
        &[(681, "Health & Medicine"), (684, "Nutrition")],
    ),
    (
        "Education & Reference",
        &[
            (697, "Encyclopedias/Dictionaries/Reference"),
            (704, "Teaching & Education"),
            (699, "Journals"),
        ],
    ),
];

/// Static filetype -> (media type, human-readable label) fallback used by the
/// syndication crosswalk when a row lacks its own media type or label.
pub static FILETYPE_MEDIA: Lazy<HashMap<&'static str, (&'static str, &'static str)>> =
    Lazy::new(|| {
        HashMap::from([
            (
                "epub3.images",
                ("application/epub+zip", "EPUB3 (E-readers incl. Send-to-Kindle)"),
            ),
            ("epub.images", ("application/epub+zip", "EPUB (with images)")),
            ("epub.noimages", ("application/epub+zip", "EPUB (no images)")),
            (
                "kindle.images",
                ("application/x-mobipocket-ebook", "Kindle (with images)"),
            ),
            ("pdf.images", ("application/pdf", "PDF (with images)")),
            ("pdf.noimages", ("application/pdf", "PDF (no images)")),
            ("html", ("text/html", "Read online (HTML)")),
            ("index", ("text/html", "Audio book index")),
            ("txt", ("text/plain", "Plain Text UTF-8")),
            ("cover.medium", ("image/jpeg", "Cover (medium)")),
            ("cover.small", ("image/jpeg", "Cover (small)")),
        ])
    });

/// Acquisition-link preference ladders for the syndication crosswalk, most
/// readable format first.
pub const TEXT_FORMAT_PRIORITY: &[&str] = &[
    "epub3.images",
    "epub.images",
    "epub.noimages",
    "kindle.images",
    "pdf.images",
    "pdf.noimages",
    "html",
];
pub const AUDIO_FORMAT_PRIORITY: &[&str] = &["index", "html"];
