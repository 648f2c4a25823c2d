//! Flutter bridge for the glossary core.

pub mod api;
