//! Resource-container `manifest.yaml` model.
//!
//! Only the fields the glossary needs are modeled; unknown keys are ignored.

use serde::{Deserialize, Deserializer};

/// Parsed container manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    pub dublin_core: DublinCore,
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DublinCore {
    /// Resource type, e.g. `ulb`.
    pub identifier: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub format: String,
    pub language: ManifestLanguage,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestLanguage {
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub direction: String,
}

/// One book of the container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    /// Book slug, e.g. `gen`.
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sort: u32,
    /// Path relative to the container root, usually `./01-GEN.usfm`.
    pub path: String,
}

impl Project {
    /// Path with the leading `./` removed.
    pub fn relative_path(&self) -> &str {
        self.path.trim_start_matches("./")
    }
}

impl Manifest {
    pub fn parse(source: &str) -> Result<Self, serde_yaml::Error> {
        let mut manifest: Manifest = serde_yaml::from_str(source)?;
        for project in &mut manifest.projects {
            project.identifier = project.identifier.trim().to_lowercase();
        }
        manifest.projects.sort_by_key(|project| project.sort);
        Ok(manifest)
    }

    pub fn project(&self, slug: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|project| project.identifier.eq_ignore_ascii_case(slug.trim()))
    }
}

// YAML authors write `version: 12` as often as `version: '12'`.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(value) => value,
        Scalar::Int(value) => value.to_string(),
        Scalar::Float(value) => value.to_string(),
    })
}
