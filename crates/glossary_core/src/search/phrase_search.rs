//! Regex-based phrase to verse matching.
//!
//! # Responsibility
//! - Build a case-insensitive, word-bounded pattern from a phrase.
//! - Scan each chapter's concatenated verse text in one pass.
//! - Cap results, sampling randomly when there are more hits than the cap.
//!
//! # Invariants
//! - At most one hit per verse; hits are in canonical book/chapter/verse order.
//! - Match offsets are byte offsets into the hit's verse text.
//! - Blank phrases and zero limits return no hits.

use crate::container::usfm::Chapter;
use crate::container::workbook::Workbook;
use crate::container::ContainerError;
use crate::model::reference::VerseRef;
use log::debug;
use rand::seq::index::sample;
use rand::Rng;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default cap on returned hits.
pub const DEFAULT_MATCH_LIMIT: usize = 100;

const VERSE_SEPARATOR: &str = " ";

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    Container(ContainerError),
    InvalidPattern { phrase: String, message: String },
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Container(err) => write!(f, "{err}"),
            Self::InvalidPattern { phrase, message } => {
                write!(f, "cannot search for `{phrase}`: {message}")
            }
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Container(err) => Some(err),
            Self::InvalidPattern { .. } => None,
        }
    }
}

impl From<ContainerError> for SearchError {
    fn from(value: ContainerError) -> Self {
        Self::Container(value)
    }
}

/// Search options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum hits to return.
    pub limit: usize,
    /// Restrict scanning to these book slugs; `None` scans every book.
    pub books: Option<Vec<String>>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_MATCH_LIMIT,
            books: None,
        }
    }
}

/// One verse containing the phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhraseHit {
    pub location: VerseRef,
    pub text: String,
    pub match_start: usize,
    pub match_end: usize,
}

/// Search outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PhraseMatches {
    pub hits: Vec<PhraseHit>,
    /// Verses matched before applying the cap.
    pub total: usize,
    /// Whether `hits` is a random subset of all matches.
    pub sampled: bool,
}

/// Builds the match pattern for a phrase, or `None` for blank input.
///
/// Inner whitespace matches any whitespace run. Word boundaries are added
/// only at ends that start or finish with a word character.
pub fn phrase_pattern(phrase: &str) -> SearchResult<Option<Regex>> {
    let tokens: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    let (Some(first), Some(last)) = (phrase.trim().chars().next(), phrase.trim().chars().last())
    else {
        return Ok(None);
    };

    let mut pattern = String::new();
    if first.is_alphanumeric() || first == '_' {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&tokens.join(r"\s+"));
    if last.is_alphanumeric() || last == '_' {
        pattern.push_str(r"\b");
    }

    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .unicode(true)
        .build()
        .map(Some)
        .map_err(|err| SearchError::InvalidPattern {
            phrase: phrase.to_string(),
            message: err.to_string(),
        })
}

/// Finds verses of `workbook` that contain `phrase`.
pub fn find_phrase<R: Rng + ?Sized>(
    workbook: &Workbook,
    phrase: &str,
    options: &SearchOptions,
    rng: &mut R,
) -> SearchResult<PhraseMatches> {
    if options.limit == 0 {
        return Ok(PhraseMatches::default());
    }
    let Some(pattern) = phrase_pattern(phrase)? else {
        return Ok(PhraseMatches::default());
    };

    let mut hits = Vec::new();
    for entry in workbook.books() {
        if let Some(books) = options.books.as_ref() {
            if !books.iter().any(|slug| slug.eq_ignore_ascii_case(&entry.slug)) {
                continue;
            }
        }
        for chapter in workbook.chapters(&entry.slug)? {
            scan_chapter(&pattern, &entry.slug, chapter, &mut hits);
        }
    }

    let total = hits.len();
    let sampled = total > options.limit;
    if sampled {
        hits = sample_in_order(hits, options.limit, rng);
    }

    debug!(
        "event=phrase_search module=search status=ok resource={} total={} returned={} sampled={}",
        workbook.resource().slug(),
        total,
        hits.len(),
        sampled
    );
    Ok(PhraseMatches {
        hits,
        total,
        sampled,
    })
}

/// Returns up to `count` random verses in canonical order.
pub fn random_verses<R: Rng + ?Sized>(
    workbook: &Workbook,
    count: usize,
    rng: &mut R,
) -> SearchResult<Vec<PhraseHit>> {
    let mut verses = Vec::new();
    for entry in workbook.books() {
        for chapter in workbook.chapters(&entry.slug)? {
            for verse in &chapter.verses {
                verses.push(PhraseHit {
                    location: VerseRef::new(entry.slug.as_str(), chapter.number, verse.number),
                    text: verse.text.clone(),
                    match_start: 0,
                    match_end: 0,
                });
            }
        }
    }

    if verses.len() <= count {
        return Ok(verses);
    }
    Ok(sample_in_order(verses, count, rng))
}

fn scan_chapter(
    pattern: &Regex,
    book: &str,
    chapter: &Chapter,
    hits: &mut Vec<PhraseHit>,
) {
    let mut text = String::new();
    let mut starts = Vec::with_capacity(chapter.verses.len());
    for (index, verse) in chapter.verses.iter().enumerate() {
        if index > 0 {
            text.push_str(VERSE_SEPARATOR);
        }
        starts.push(text.len());
        text.push_str(&verse.text);
    }

    let mut last_verse: Option<usize> = None;
    for found in pattern.find_iter(&text) {
        let index = starts
            .partition_point(|start| *start <= found.start())
            .saturating_sub(1);
        if last_verse == Some(index) {
            continue;
        }
        last_verse = Some(index);

        let verse = &chapter.verses[index];
        let match_start = found.start() - starts[index];
        let match_end = (found.end() - starts[index]).min(verse.text.len());
        hits.push(PhraseHit {
            location: VerseRef::new(book, chapter.number, verse.number),
            text: verse.text.clone(),
            match_start,
            match_end,
        });
    }
}

fn sample_in_order<T, R: Rng + ?Sized>(items: Vec<T>, amount: usize, rng: &mut R) -> Vec<T> {
    let mut picked = sample(rng, items.len(), amount).into_vec();
    picked.sort_unstable();
    let mut picked = picked.into_iter().peekable();
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            if picked.peek() == Some(&index) {
                picked.next();
                Some(item)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{phrase_pattern, sample_in_order};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pattern_is_case_insensitive_and_word_bounded() {
        let pattern = phrase_pattern("the  Earth").unwrap().unwrap();
        assert!(pattern.is_match("and THE\nearth was"));
        assert!(!pattern.is_match("the earthen jar"));
        assert!(!pattern.is_match("bathe earth"));
    }

    #[test]
    fn pattern_escapes_regex_syntax() {
        let pattern = phrase_pattern("Lord (God)").unwrap().unwrap();
        assert!(pattern.is_match("the Lord (God) said"));
        assert!(!pattern.is_match("the Lord God said"));
    }

    #[test]
    fn blank_phrase_has_no_pattern() {
        assert!(phrase_pattern("   ").unwrap().is_none());
    }

    #[test]
    fn sample_keeps_source_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked = sample_in_order((0..50).collect::<Vec<_>>(), 10, &mut rng);
        assert_eq!(picked.len(), 10);
        assert!(picked.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
