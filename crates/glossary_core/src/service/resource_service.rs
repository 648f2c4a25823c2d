//! Resource container registration, catalog installs and workbook access.
//!
//! # Responsibility
//! - Copy container zips into the resources dir and register them.
//! - Download containers listed by the remote catalog.
//! - Open the lazily parsed workbook of a registered resource.
//!
//! # Invariants
//! - A registered resource's file lives under `AppConfig::resources_dir`
//!   with the canonical `container_filename` name.
//! - A container is copied only after its manifest parses.

use crate::catalog::client::{CatalogClient, CatalogLanguage, CatalogResource};
use crate::config::AppConfig;
use crate::container::workbook::Workbook;
use crate::container::{ContainerError, ResourceContainer};
use crate::model::language::{Language, NewLanguage, TextDirection};
use crate::model::resource::{container_filename, NewResource, Resource, ResourceId, FORMAT_USFM};
use crate::repo::language_repo::SqliteLanguageRepository;
use crate::repo::resource_repo::SqliteResourceRepository;
use crate::service::{ServiceError, ServiceResult};
use log::{info, warn};
use rusqlite::Connection;
use std::path::Path;

pub struct ResourceService<'a> {
    conn: &'a Connection,
    config: &'a AppConfig,
}

impl<'a> ResourceService<'a> {
    pub fn new(conn: &'a Connection, config: &'a AppConfig) -> Self {
        Self { conn, config }
    }

    pub fn list_resources(&self) -> ServiceResult<Vec<Resource>> {
        Ok(self.resources().list_resources()?)
    }

    pub fn get_resource(&self, id: ResourceId) -> ServiceResult<Resource> {
        self.resources()
            .get_resource(id)?
            .ok_or_else(|| ServiceError::not_found("resource", id))
    }

    /// Registers the container at `path`, creating its language when unknown.
    ///
    /// # Errors
    /// - `Container` when the zip or its manifest is unreadable.
    /// - `AlreadyExists` when the same language/type/version is registered.
    pub fn register_container(&self, path: impl AsRef<Path>) -> ServiceResult<Resource> {
        let path = path.as_ref();
        let container = ResourceContainer::open(path)?;
        let kind = container.resource_kind().trim().to_lowercase();
        let version = container.version().trim().to_string();
        let file_name_for = |slug: &str| {
            container_filename(slug, &kind, &version)
                .map_err(|err| ContainerError::InvalidManifest(err.to_string()))
        };
        file_name_for(container.language_slug().trim())?;
        let language = self.ensure_manifest_language(&container)?;

        if self
            .resources()
            .find_resource(&language.slug, &kind, &version)?
            .is_some()
        {
            return Err(ServiceError::AlreadyExists {
                entity: "resource",
                key: format!("{}_{}_v{}", language.slug, kind, version),
            });
        }

        let filename = file_name_for(&language.slug)?;
        let target = self.config.resource_path(&filename);
        std::fs::create_dir_all(&self.config.resources_dir)?;
        if !same_file(path, &target) {
            std::fs::copy(path, &target)?;
        }

        let resource = self.resources().insert_resource(&NewResource {
            language_id: language.id,
            kind,
            version,
            format: FORMAT_USFM.to_string(),
            filename,
        });
        let resource = match resource {
            Ok(resource) => resource,
            Err(err) => {
                if !same_file(path, &target) {
                    let _ = std::fs::remove_file(&target);
                }
                return Err(err.into());
            }
        };

        info!(
            "event=resource_register module=service status=ok resource_id={} resource={}",
            resource.id,
            resource.slug()
        );
        Ok(resource)
    }

    /// Downloads a catalog resource and registers it.
    ///
    /// The catalog's language metadata is stored first, so names and
    /// direction come from the catalog rather than the container manifest.
    pub fn install_from_catalog(
        &self,
        client: &CatalogClient,
        language: &CatalogLanguage,
        entry: &CatalogResource,
    ) -> ServiceResult<Resource> {
        SqliteLanguageRepository::new(self.conn).upsert_language(&NewLanguage {
            slug: language.slug.trim().to_string(),
            name: language.name.trim().to_string(),
            angle_name: language.anglicized_name.trim().to_string(),
            direction: language.direction,
            gateway: language.gateway,
        })?;

        std::fs::create_dir_all(&self.config.resources_dir)?;
        let download_path = self.config.resources_dir.join(format!(
            "download_{}_{}.zip",
            language.slug.trim(),
            entry.kind.trim()
        ));
        client.download(&entry.url, &download_path)?;

        let registered = self.register_container(&download_path);
        if let Err(err) = std::fs::remove_file(&download_path) {
            warn!("event=resource_install module=service status=cleanup_failed error={err}");
        }
        registered
    }

    /// Opens the workbook of a registered resource. No book is parsed yet.
    pub fn open_workbook(&self, id: ResourceId) -> ServiceResult<Workbook> {
        let resource = self.get_resource(id)?;
        let path = self.config.resource_path(&resource.filename);
        if !path.is_file() {
            return Err(ServiceError::not_found("resource", resource.slug()));
        }
        Ok(Workbook::open(resource, path)?)
    }

    /// Unregisters a resource and removes its container file.
    pub fn delete_resource(&self, id: ResourceId) -> ServiceResult<()> {
        let resource = self.get_resource(id)?;
        self.resources().delete_resource(id)?;
        let path = self.config.resource_path(&resource.filename);
        if let Err(err) = std::fs::remove_file(&path) {
            warn!(
                "event=resource_delete module=service status=file_remove_failed resource_id={id} error={err}"
            );
        }
        Ok(())
    }

    fn ensure_manifest_language(&self, container: &ResourceContainer) -> ServiceResult<Language> {
        let languages = SqliteLanguageRepository::new(self.conn);
        let slug = container.language_slug().trim();
        if let Some(language) = languages.get_language(slug)? {
            return Ok(language);
        }

        let declared = &container.manifest().dublin_core.language;
        let mut language = NewLanguage::new(slug, declared.title.trim());
        language.direction = TextDirection::parse(&declared.direction).unwrap_or_default();
        if language.name.is_empty() {
            language.name = slug.to_string();
        }
        Ok(languages.upsert_language(&language)?)
    }

    fn resources(&self) -> SqliteResourceRepository<'a> {
        SqliteResourceRepository::new(self.conn)
    }
}

fn same_file(left: &Path, right: &Path) -> bool {
    match (left.canonicalize(), right.canonicalize()) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}
