//! Language and resource catalogs.
//!
//! # Responsibility
//! - Parse the language catalog bundled with the app.
//! - Fetch the remote resource catalog and download resource containers.
//!
//! # See also
//! - `service::init_service` for first-run seeding.
//! - `service::resource_service` for installing downloaded containers.

pub mod client;
pub mod languages;
