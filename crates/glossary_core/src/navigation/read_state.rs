//! Reader position and phrase selection.
//!
//! # Invariants
//! - `book`/`chapter` always name a chapter that exists in the workbook the
//!   state was created from.
//! - Chapter moves skip books without chapters.
//! - A selection is whitespace-normalized and stripped of surrounding
//!   punctuation; an empty result clears it.

use crate::container::usfm::Chapter;
use crate::container::workbook::Workbook;
use crate::container::{ContainerError, ContainerResult};
use crate::model::phrase::normalize_phrase;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadState {
    book: String,
    chapter: u32,
    selection: Option<String>,
}

impl ReadState {
    /// Positions the reader at the first chapter of the first non-empty book.
    pub fn start(workbook: &Workbook) -> ContainerResult<Self> {
        for entry in workbook.books() {
            if let Some(first) = workbook.chapters(&entry.slug)?.first() {
                return Ok(Self::at(&entry.slug, first.number));
            }
        }
        Err(ContainerError::ProjectNotFound(
            "no book with chapters".to_string(),
        ))
    }

    /// Positions the reader at `book` `chapter`.
    pub fn open(workbook: &Workbook, book: &str, chapter: u32) -> ContainerResult<Self> {
        let entry = workbook.book_entry(book)?;
        workbook.chapter(&entry.slug, chapter)?;
        Ok(Self::at(&entry.slug, chapter))
    }

    fn at(book: &str, chapter: u32) -> Self {
        Self {
            book: book.to_string(),
            chapter,
            selection: None,
        }
    }

    pub fn book(&self) -> &str {
        &self.book
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    pub fn current_chapter<'w>(&self, workbook: &'w Workbook) -> ContainerResult<&'w Chapter> {
        workbook.chapter(&self.book, self.chapter)
    }

    /// Moves to the next chapter, crossing into the next book when needed.
    ///
    /// Returns `false` (position unchanged) at the end of the workbook.
    pub fn next_chapter(&mut self, workbook: &Workbook) -> ContainerResult<bool> {
        let chapters = workbook.chapters(&self.book)?;
        if let Some(next) = chapters
            .iter()
            .position(|chapter| chapter.number == self.chapter)
            .and_then(|index| chapters.get(index + 1))
        {
            self.move_to(&self.book.clone(), next.number);
            return Ok(true);
        }

        let books = workbook.books();
        let current = self.book_index(workbook)?;
        for entry in &books[current + 1..] {
            if let Some(first) = workbook.chapters(&entry.slug)?.first() {
                self.move_to(&entry.slug, first.number);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Moves to the previous chapter, crossing into the previous book's last
    /// chapter when needed. Returns `false` at the start of the workbook.
    pub fn previous_chapter(&mut self, workbook: &Workbook) -> ContainerResult<bool> {
        let chapters = workbook.chapters(&self.book)?;
        if let Some(previous) = chapters
            .iter()
            .position(|chapter| chapter.number == self.chapter)
            .filter(|index| *index > 0)
            .and_then(|index| chapters.get(index - 1))
        {
            self.move_to(&self.book.clone(), previous.number);
            return Ok(true);
        }

        let books = workbook.books();
        let current = self.book_index(workbook)?;
        for entry in books[..current].iter().rev() {
            if let Some(last) = workbook.chapters(&entry.slug)?.last() {
                self.move_to(&entry.slug, last.number);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Normalizes a text selection into a phrase candidate.
    ///
    /// Returns the stored phrase, or `None` when nothing usable was selected.
    pub fn select_text(&mut self, raw: &str) -> Option<&str> {
        let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric());
        let phrase = normalize_phrase(trimmed);
        self.selection = (!phrase.is_empty()).then_some(phrase);
        self.selection.as_deref()
    }

    pub fn selected_phrase(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn move_to(&mut self, book: &str, chapter: u32) {
        self.book = book.to_string();
        self.chapter = chapter;
        self.selection = None;
    }

    fn book_index(&self, workbook: &Workbook) -> ContainerResult<usize> {
        workbook
            .books()
            .iter()
            .position(|entry| entry.slug == self.book)
            .ok_or_else(|| ContainerError::ProjectNotFound(self.book.clone()))
    }
}
