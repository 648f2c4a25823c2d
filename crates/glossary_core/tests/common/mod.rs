#![allow(dead_code)]

use glossary_core::db::open_db;
use glossary_core::{AppConfig, InitService, Resource, ResourceService};
use rusqlite::Connection;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const GENESIS_USFM: &str = r"\id GEN EN_ULB en_English_ltr
\h Genesis
\mt Genesis
\s5
\c 1
\p
\v 1 In the beginning, God created the heavens and the earth.
\v 2 The earth was without form and empty.\f + \ft Or \fqa void \f* Darkness was upon the surface of the deep.
\v 3 God said, ``Let there be light,'' and there was light.
\v 4 God saw the light, that it was good.
\v 5 God called the LIGHT ``day,'' and the darkness he called ``night.''
\c 2
\p
\v 1 Then the heavens and the earth were finished.
\v 2-3 On the seventh day God rested.
";

pub const EXODUS_USFM: &str = r"\id EXO EN_ULB en_English_ltr
\h Exodus
\c 1
\p
\v 1 These are the names of the sons of Israel who came into Egypt.
\v 2 Reuben, Simeon, Levi, and Judah.
";

pub fn manifest_yaml(language: &str, version: &str) -> String {
    format!(
        "dublin_core:
  conformsto: 'rc0.2'
  identifier: 'ulb'
  language:
    identifier: '{language}'
    title: 'Language {language}'
    direction: 'ltr'
  title: 'Unlocked Literal Bible'
  format: 'text/usfm'
  version: {version}
projects:
  - title: 'Exodus'
    identifier: 'exo'
    sort: 2
    path: './02-EXO.usfm'
  - title: 'Genesis'
    identifier: 'gen'
    sort: 1
    path: './01-GEN.usfm'
"
    )
}

/// Writes a two-book container; `root` nests everything one directory deep.
pub fn write_container(path: &Path, language: &str, version: &str, root: &str) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    let entries = [
        ("manifest.yaml", manifest_yaml(language, version)),
        ("01-GEN.usfm", GENESIS_USFM.to_string()),
        ("02-EXO.usfm", EXODUS_USFM.to_string()),
    ];
    for (name, content) in entries {
        zip.start_file(format!("{root}{name}"), options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

pub struct Fixture {
    pub dir: TempDir,
    pub config: AppConfig,
    pub conn: Connection,
}

impl Fixture {
    /// Data dir with migrated database and seeded languages.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::for_data_dir(dir.path().join("data"));
        let conn = open_db(&config.db_path).unwrap();
        InitService::new(&conn, &config).run().unwrap();
        Self { dir, config, conn }
    }

    /// Path for scratch files outside the data dir.
    pub fn scratch(&self, name: &str) -> PathBuf {
        let scratch = self.dir.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();
        scratch.join(name)
    }

    /// Registers an English ULB container and returns its resource row.
    pub fn register_english(&self) -> Resource {
        let source = self.scratch("en_ulb.zip");
        write_container(&source, "en", "12", "en_ulb/");
        ResourceService::new(&self.conn, &self.config)
            .register_container(&source)
            .unwrap()
    }
}
