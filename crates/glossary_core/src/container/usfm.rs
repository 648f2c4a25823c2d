//! USFM to book/chapter/verse decomposition.
//!
//! # Responsibility
//! - Split one USFM book into chapters and plain-text verses.
//! - Drop notes, cross references, headings and word-level attributes.
//! - Drop inline alternate and published numbers (`\va`, `\vp`, `\ca`).
//!
//! # Invariants
//! - Verse text is whitespace-normalized and never contains USFM markers.
//! - Verse ranges (`\v 1-2`) are keyed by their first verse number.
//! - Chapters and verses keep source order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

static NOTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\(f|fe|x|ef|ex)\s.*?\\(f|fe|x|ef|ex)\*").expect("valid note regex")
});
static ALT_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\(va|vp|ca)\s.*?\\(va|vp|ca)\*").expect("valid alternate number regex")
});
static WORD_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\\+?w\s+([^|\\]*)(?:\|[^\\]*)?\\\+?w\*").expect("valid word regex")
});
static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(\+?[A-Za-z]+[0-9]*(?:-[se])?\*?|\*)").expect("valid marker regex")
});

/// Markers whose text is a heading or metadata rather than verse content.
const NON_VERSE_MARKERS: &[&str] = &[
    "s", "s1", "s2", "s3", "s4", "s5", "ms", "ms1", "ms2", "mr", "r", "sr", "d", "sp", "cl",
    "cp", "rem", "sts", "ide", "mt", "mt1", "mt2", "mt3", "toc1", "toc2", "toc3",
    "h", "id", "usfm",
];

/// One parsed USFM book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    /// Lowercase slug from `\id`, e.g. `gen`.
    pub slug: String,
    pub title: String,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    pub number: u32,
    pub verses: Vec<Verse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verse {
    pub number: u32,
    pub text: String,
}

impl Book {
    pub fn chapter(&self, number: u32) -> Option<&Chapter> {
        self.chapters.iter().find(|chapter| chapter.number == number)
    }
}

impl Chapter {
    pub fn verse(&self, number: u32) -> Option<&Verse> {
        self.verses.iter().find(|verse| verse.number == number)
    }
}

/// USFM structure error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsfmError {
    MissingBookId,
    InvalidChapterNumber(String),
    InvalidVerseNumber(String),
}

impl Display for UsfmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingBookId => write!(f, "usfm has no \\id marker"),
            Self::InvalidChapterNumber(value) => write!(f, "invalid chapter number `{value}`"),
            Self::InvalidVerseNumber(value) => write!(f, "invalid verse number `{value}`"),
        }
    }
}

impl Error for UsfmError {}

#[derive(Default)]
struct Titles {
    header: Option<String>,
    toc: Option<String>,
    main: Option<String>,
}

impl Titles {
    fn best(self) -> Option<String> {
        self.header.or(self.toc).or(self.main)
    }
}

/// Parses one USFM book.
///
/// `\v` markers before the first `\c` are ignored; text before the first
/// verse of a chapter (headings, psalm titles) is not part of any verse.
pub fn parse_book(source: &str) -> Result<Book, UsfmError> {
    let without_notes = NOTE_RE.replace_all(source, " ");
    let without_numbers = ALT_NUMBER_RE.replace_all(&without_notes, " ");
    let cleaned = WORD_ATTR_RE.replace_all(&without_numbers, "$1");

    let mut slug: Option<String> = None;
    let mut titles = Titles::default();
    let mut chapters: Vec<Chapter> = Vec::new();
    let mut current_chapter: Option<Chapter> = None;
    let mut current_verse: Option<Verse> = None;
    let mut in_heading = false;

    let markers: Vec<_> = MARKER_RE.captures_iter(&cleaned).collect();
    for (index, caps) in markers.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let text_end = markers
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map_or(cleaned.len(), |next| next.start());
        let text = &cleaned[whole.end()..text_end];
        let name = name.as_str().trim_start_matches('+');

        match name {
            "id" => {
                slug = text
                    .split_whitespace()
                    .next()
                    .map(|value| value.to_lowercase());
            }
            "h" => titles.header = non_empty(text),
            "toc2" => titles.toc = non_empty(text),
            "mt" | "mt1" => titles.main = non_empty(text),
            "c" => {
                flush_verse(&mut current_chapter, &mut current_verse);
                if let Some(chapter) = current_chapter.take() {
                    chapters.push(chapter);
                }
                let raw = text.split_whitespace().next().unwrap_or_default();
                let number = leading_number(raw)
                    .ok_or_else(|| UsfmError::InvalidChapterNumber(raw.to_string()))?;
                current_chapter = Some(Chapter {
                    number,
                    verses: Vec::new(),
                });
                in_heading = false;
            }
            "v" => {
                flush_verse(&mut current_chapter, &mut current_verse);
                in_heading = false;
                if current_chapter.is_none() {
                    continue;
                }
                let trimmed = text.trim_start();
                let (raw, rest) = trimmed
                    .split_once(char::is_whitespace)
                    .unwrap_or((trimmed, ""));
                let number = leading_number(raw)
                    .ok_or_else(|| UsfmError::InvalidVerseNumber(raw.to_string()))?;
                current_verse = Some(Verse {
                    number,
                    text: rest.to_string(),
                });
            }
            other if NON_VERSE_MARKERS.contains(&other) => in_heading = true,
            _ => {
                // Paragraph and poetry markers end a heading; character styles
                // inside a heading stay part of it.
                if is_paragraph_marker(name) {
                    in_heading = false;
                }
                if in_heading {
                    continue;
                }
                if let Some(verse) = current_verse.as_mut() {
                    verse.text.push(' ');
                    verse.text.push_str(text);
                }
            }
        }
    }

    flush_verse(&mut current_chapter, &mut current_verse);
    if let Some(chapter) = current_chapter.take() {
        chapters.push(chapter);
    }

    let slug = slug.ok_or(UsfmError::MissingBookId)?;
    let title = titles.best().unwrap_or_else(|| slug.to_uppercase());
    Ok(Book {
        slug,
        title,
        chapters,
    })
}

fn flush_verse(chapter: &mut Option<Chapter>, verse: &mut Option<Verse>) {
    if let (Some(chapter), Some(mut verse)) = (chapter.as_mut(), verse.take()) {
        verse.text = normalize_whitespace(&verse.text);
        chapter.verses.push(verse);
    }
}

fn is_paragraph_marker(name: &str) -> bool {
    matches!(
        name.trim_end_matches(|c: char| c.is_ascii_digit()),
        "p" | "m" | "q" | "pi" | "mi" | "nb" | "li" | "pc" | "pm" | "b" | "qm" | "qc"
    )
}

fn leading_number(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok().filter(|number| *number > 0)
}

fn non_empty(text: &str) -> Option<String> {
    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
