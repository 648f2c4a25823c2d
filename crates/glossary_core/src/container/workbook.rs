//! Lazily decomposed Workbook -> Book -> Chapter -> Verse tree.
//!
//! # Responsibility
//! - Expose the book list of one resource straight from its manifest.
//! - Parse a book's USFM on first access and keep the result.
//!
//! # Invariants
//! - Each book is parsed at most once per workbook, even with concurrent readers.
//! - A failed parse is not cached; the next access retries.

use crate::container::manifest::Project;
use crate::container::usfm::{parse_book, Book, Chapter, Verse};
use crate::container::{ContainerError, ContainerResult, ResourceContainer};
use crate::model::reference::VerseRef;
use crate::model::resource::Resource;
use log::debug;
use once_cell::sync::OnceCell;
use std::path::Path;

/// Book slot in a workbook; content is parsed on demand.
#[derive(Debug)]
pub struct BookEntry {
    pub slug: String,
    pub title: String,
    pub sort: u32,
    project: Project,
    content: OnceCell<Book>,
}

impl BookEntry {
    /// Whether the book's chapters have been parsed already.
    pub fn is_loaded(&self) -> bool {
        self.content.get().is_some()
    }
}

/// Scripture tree of one resource.
#[derive(Debug)]
pub struct Workbook {
    resource: Resource,
    container: ResourceContainer,
    books: Vec<BookEntry>,
}

impl Workbook {
    /// Opens the container file backing `resource`. No book is parsed yet.
    pub fn open(resource: Resource, container_path: impl AsRef<Path>) -> ContainerResult<Self> {
        let container = ResourceContainer::open(container_path)?;
        Ok(Self::from_container(resource, container))
    }

    pub fn from_container(resource: Resource, container: ResourceContainer) -> Self {
        let books = container
            .manifest()
            .projects
            .iter()
            .map(|project| BookEntry {
                slug: project.identifier.clone(),
                title: if project.title.trim().is_empty() {
                    project.identifier.to_uppercase()
                } else {
                    project.title.trim().to_string()
                },
                sort: project.sort,
                project: project.clone(),
                content: OnceCell::new(),
            })
            .collect();

        Self {
            resource,
            container,
            books,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn container(&self) -> &ResourceContainer {
        &self.container
    }

    /// Books in canonical (manifest `sort`) order.
    pub fn books(&self) -> &[BookEntry] {
        &self.books
    }

    pub fn book_entry(&self, slug: &str) -> ContainerResult<&BookEntry> {
        self.books
            .iter()
            .find(|entry| entry.slug.eq_ignore_ascii_case(slug.trim()))
            .ok_or_else(|| ContainerError::ProjectNotFound(slug.to_string()))
    }

    /// Returns the parsed book, parsing its USFM on first access.
    pub fn book(&self, slug: &str) -> ContainerResult<&Book> {
        let entry = self.book_entry(slug)?;
        entry.content.get_or_try_init(|| {
            debug!(
                "event=book_parse module=container status=start resource={} book={}",
                self.resource.slug(),
                entry.slug
            );
            let source = self.container.read_project(&entry.project)?;
            let mut book = parse_book(&source).map_err(|source| ContainerError::Usfm {
                project: entry.slug.clone(),
                source,
            })?;
            // Manifest slugs are authoritative; `\id` values vary in case and padding.
            book.slug = entry.slug.clone();
            if !entry.project.title.trim().is_empty() {
                book.title = entry.title.clone();
            }
            Ok(book)
        })
    }

    pub fn chapters(&self, slug: &str) -> ContainerResult<&[Chapter]> {
        Ok(&self.book(slug)?.chapters)
    }

    pub fn chapter(&self, slug: &str, number: u32) -> ContainerResult<&Chapter> {
        self.book(slug)?
            .chapter(number)
            .ok_or_else(|| ContainerError::ChapterNotFound {
                book: slug.to_string(),
                chapter: number,
            })
    }

    pub fn verse(&self, location: &VerseRef) -> ContainerResult<&Verse> {
        self.chapter(&location.book, location.chapter)?
            .verse(location.verse)
            .ok_or_else(|| ContainerError::VerseNotFound(location.clone()))
    }

    /// Number of books parsed so far.
    pub fn loaded_books(&self) -> usize {
        self.books.iter().filter(|entry| entry.is_loaded()).count()
    }
}
