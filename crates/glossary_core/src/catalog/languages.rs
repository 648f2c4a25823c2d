//! Bundled language catalog (`assets/langnames.json`).

use crate::model::language::{NewLanguage, TextDirection};
use serde::Deserialize;

const BUNDLED_LANGNAMES: &str = include_str!("../../assets/langnames.json");

/// One entry in the langnames format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LangnamesEntry {
    /// Language code.
    pub lc: String,
    /// Native name.
    pub ln: String,
    /// Anglicized name.
    #[serde(default)]
    pub ang: String,
    /// Direction, `ltr` or `rtl`.
    #[serde(default)]
    pub ld: String,
    /// Gateway flag.
    #[serde(default)]
    pub gw: bool,
}

impl LangnamesEntry {
    pub fn to_new_language(&self) -> NewLanguage {
        NewLanguage {
            slug: self.lc.trim().to_string(),
            name: self.ln.trim().to_string(),
            angle_name: self.ang.trim().to_string(),
            direction: TextDirection::parse(&self.ld).unwrap_or_default(),
            gateway: self.gw,
        }
    }
}

/// Parses a langnames JSON document.
pub fn parse_langnames(source: &str) -> Result<Vec<NewLanguage>, serde_json::Error> {
    let entries: Vec<LangnamesEntry> = serde_json::from_str(source)?;
    Ok(entries.iter().map(LangnamesEntry::to_new_language).collect())
}

/// Languages shipped inside the binary.
pub fn load_bundled_languages() -> Result<Vec<NewLanguage>, serde_json::Error> {
    parse_langnames(BUNDLED_LANGNAMES)
}

#[cfg(test)]
mod tests {
    use super::{load_bundled_languages, parse_langnames};
    use crate::model::language::TextDirection;

    #[test]
    fn bundled_catalog_contains_english_gateway() {
        let languages = load_bundled_languages().unwrap();
        let english = languages.iter().find(|lang| lang.slug == "en").unwrap();
        assert!(english.gateway);
        assert_eq!(english.direction, TextDirection::Ltr);
        assert!(languages.iter().all(|lang| lang.validate().is_ok()));
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let languages = parse_langnames(r#"[{"lc": "xyz", "ln": "Xyz", "ld": "sideways"}]"#).unwrap();
        assert_eq!(languages[0].direction, TextDirection::Ltr);
        assert!(!languages[0].gateway);
        assert_eq!(languages[0].angle_name, "");
    }
}
