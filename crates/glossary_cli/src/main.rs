//! `glossary` command-line entry point.
//!
//! # Responsibility
//! - Drive core use-cases without the Flutter shell (scripting, smoke checks).
//! - Print plain, line-oriented output; errors go to stderr with exit code 1.

use clap::{Args, Parser, Subcommand};
use glossary_core::db::open_db;
use glossary_core::search::phrase_search::find_phrase;
use glossary_core::service::{NewGlossaryRequest, PhraseInput};
use glossary_core::{
    default_log_level, export_glossary, import_glossary, init_logging, AppConfig, CatalogClient,
    Glossary, GlossaryService, InitService, ResourceService, SearchOptions, ServiceError,
    DEFAULT_MATCH_LIMIT,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::Connection;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "glossary")]
#[command(about = "Manage Bible translation glossaries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory holding the database, resources and audio
    #[arg(long, global = true, env = "GLOSSARY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory with containers shipped alongside the app
    #[arg(long, global = true, env = "GLOSSARY_BUNDLED_DIR")]
    bundled_dir: Option<PathBuf>,

    /// Remote resource catalog URL
    #[arg(long, global = true, env = "GLOSSARY_CATALOG_URL")]
    catalog_url: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "GLOSSARY_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed languages and the default resource (idempotent)
    Init,
    /// Manage glossaries
    #[command(subcommand)]
    Glossary(GlossaryCommand),
    /// Manage phrases of a glossary
    #[command(subcommand)]
    Phrase(PhraseCommand),
    /// Manage installed resource containers
    #[command(subcommand)]
    Resource(ResourceCommand),
    /// Find verses containing a phrase
    Search(SearchArgs),
    /// Export a glossary archive
    Export {
        /// Glossary code or id
        glossary: String,
        /// Destination zip path
        dest: PathBuf,
    },
    /// Import a glossary archive
    Import {
        /// Archive zip path
        path: PathBuf,
    },
    /// Browse and install resources from the remote catalog
    #[command(subcommand)]
    Catalog(CatalogCommand),
}

#[derive(Subcommand)]
enum GlossaryCommand {
    /// Create a glossary
    Create {
        #[arg(long)]
        code: String,
        #[arg(long)]
        author: String,
        /// Source language slug
        #[arg(long)]
        source: String,
        /// Target language slug
        #[arg(long)]
        target: String,
        /// Resource id
        #[arg(long)]
        resource: i64,
    },
    /// List glossaries, most recently edited first
    List,
    /// Delete a glossary with its phrases
    Delete {
        /// Glossary code or id
        glossary: String,
    },
}

#[derive(Subcommand)]
enum PhraseCommand {
    /// Add a phrase
    Add {
        /// Glossary code or id
        #[arg(long)]
        glossary: String,
        phrase: String,
        #[arg(long, default_value = "")]
        spelling: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Link every verse containing the phrase as refs
        #[arg(long)]
        link: bool,
    },
    /// List phrases with their refs
    List {
        /// Glossary code or id
        #[arg(long)]
        glossary: String,
    },
}

#[derive(Subcommand)]
enum ResourceCommand {
    /// Register a resource container zip
    Add { path: PathBuf },
    /// List installed resources
    List,
}

#[derive(Args)]
struct SearchArgs {
    /// Resource id
    #[arg(long)]
    resource: i64,
    phrase: String,
    #[arg(long, default_value_t = DEFAULT_MATCH_LIMIT)]
    limit: usize,
    /// Seed for sampling when hits exceed the limit
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// List downloadable resources
    List,
    /// Download and register a resource
    Install { language: String, kind: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let log_dir = std::path::absolute(&config.log_dir).unwrap_or_else(|_| config.log_dir.clone());
    if let Err(err) = init_logging(&level, &log_dir.to_string_lossy()) {
        eprintln!("warning: logging disabled: {err}");
    }

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.user_message());
            log::error!("event=cli_command module=cli status=error error={err}");
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: &Cli) -> AppConfig {
    let mut config = match cli.data_dir.as_ref() {
        Some(dir) => AppConfig::for_data_dir(dir),
        None => AppConfig::from_env(),
    };
    if let Some(dir) = cli.bundled_dir.clone() {
        config = config.with_bundled_resources_dir(dir);
    }
    if let Some(url) = cli.catalog_url.clone() {
        config = config.with_catalog_url(url);
    }
    config
}

fn run(command: Commands, config: &AppConfig) -> Result<(), ServiceError> {
    let conn = open(config)?;
    match command {
        Commands::Init => {
            let report = InitService::new(&conn, config).run()?;
            println!(
                "initialized first_run={} languages_seeded={} resource_seeded={}",
                report.first_run,
                report.languages_seeded,
                report
                    .resource_seeded
                    .map(|resource| resource.slug())
                    .unwrap_or_else(|| "-".to_string())
            );
        }
        Commands::Glossary(command) => run_glossary(command, &conn)?,
        Commands::Phrase(command) => run_phrase(command, &conn, config)?,
        Commands::Resource(command) => run_resource(command, &conn, config)?,
        Commands::Search(args) => {
            let workbook = ResourceService::new(&conn, config).open_workbook(args.resource)?;
            let mut rng = seeded_rng(args.seed);
            let options = SearchOptions {
                limit: args.limit,
                books: None,
            };
            let matches = find_phrase(&workbook, &args.phrase, &options, &mut rng)?;
            for hit in &matches.hits {
                println!("{}\t{}", hit.location, hit.text);
            }
            println!(
                "matches total={} shown={} sampled={}",
                matches.total,
                matches.hits.len(),
                matches.sampled
            );
        }
        Commands::Export { glossary, dest } => {
            let glossary = resolve_glossary(&conn, &glossary)?;
            let summary = export_glossary(&conn, config, glossary.id, &dest)?;
            println!(
                "exported {} phrases={} refs={} audio={}",
                summary.path.display(),
                summary.phrases,
                summary.refs,
                summary.audio_files
            );
        }
        Commands::Import { path } => {
            let summary = import_glossary(&conn, config, &path)?;
            println!(
                "imported {} id={} phrases={} refs={} resource_installed={}",
                summary.code,
                summary.glossary_id,
                summary.phrases,
                summary.refs,
                summary.resource_installed
            );
        }
        Commands::Catalog(command) => run_catalog(command, &conn, config)?,
    }
    Ok(())
}

fn run_glossary(command: GlossaryCommand, conn: &Connection) -> Result<(), ServiceError> {
    let service = GlossaryService::new(conn);
    match command {
        GlossaryCommand::Create {
            code,
            author,
            source,
            target,
            resource,
        } => {
            let glossary = service.create_glossary(&NewGlossaryRequest {
                code,
                author,
                source_language: source,
                target_language: target,
                resource_id: resource,
            })?;
            println!("created {} {}", glossary.code, glossary.id);
        }
        GlossaryCommand::List => {
            for glossary in service.list_glossaries()? {
                println!(
                    "{}\t{}\t{}\tresource={}",
                    glossary.id, glossary.code, glossary.author, glossary.resource_id
                );
            }
        }
        GlossaryCommand::Delete { glossary } => {
            let glossary = resolve_glossary(conn, &glossary)?;
            service.delete_glossary(glossary.id)?;
            println!("deleted {}", glossary.code);
        }
    }
    Ok(())
}

fn run_phrase(
    command: PhraseCommand,
    conn: &Connection,
    config: &AppConfig,
) -> Result<(), ServiceError> {
    let service = GlossaryService::new(conn);
    match command {
        PhraseCommand::Add {
            glossary,
            phrase,
            spelling,
            description,
            link,
        } => {
            let glossary = resolve_glossary(conn, &glossary)?;
            let created = service.add_phrase(
                glossary.id,
                &PhraseInput {
                    phrase,
                    spelling,
                    description,
                    audio: None,
                },
            )?;
            println!("added {} {}", created.phrase, created.id);

            if link {
                let workbook =
                    ResourceService::new(conn, config).open_workbook(glossary.resource_id)?;
                let options = SearchOptions {
                    limit: usize::MAX,
                    books: None,
                };
                let matches =
                    find_phrase(&workbook, &created.phrase, &options, &mut seeded_rng(None))?;
                let locations: Vec<_> =
                    matches.hits.into_iter().map(|hit| hit.location).collect();
                let refs = service.link_refs(created.id, glossary.resource_id, &locations)?;
                println!("linked refs={}", refs.len());
            }
        }
        PhraseCommand::List { glossary } => {
            let glossary = resolve_glossary(conn, &glossary)?;
            for phrase in service.list_phrases(glossary.id)? {
                let refs = service
                    .list_refs(phrase.id)?
                    .into_iter()
                    .map(|reference| reference.location.to_string())
                    .collect::<Vec<_>>();
                println!(
                    "{}\t{}\t{}\t{}",
                    phrase.phrase,
                    phrase.spelling,
                    phrase.description,
                    refs.join(", ")
                );
            }
        }
    }
    Ok(())
}

fn run_resource(
    command: ResourceCommand,
    conn: &Connection,
    config: &AppConfig,
) -> Result<(), ServiceError> {
    let service = ResourceService::new(conn, config);
    match command {
        ResourceCommand::Add { path } => {
            let resource = service.register_container(&path)?;
            println!("registered {} id={}", resource.slug(), resource.id);
        }
        ResourceCommand::List => {
            for resource in service.list_resources()? {
                println!(
                    "{}\t{}\tv{}\t{}",
                    resource.id,
                    resource.slug(),
                    resource.version,
                    resource.filename
                );
            }
        }
    }
    Ok(())
}

fn run_catalog(
    command: CatalogCommand,
    conn: &Connection,
    config: &AppConfig,
) -> Result<(), ServiceError> {
    let client = CatalogClient::new(config)?;
    let catalog = client.fetch_catalog()?;
    match command {
        CatalogCommand::List => {
            for (language, resource) in catalog.entries() {
                println!(
                    "{}\t{}\tv{}\t{}",
                    language.slug, resource.kind, resource.version, resource.title
                );
            }
        }
        CatalogCommand::Install { language, kind } => {
            let (found_language, found_resource) =
                catalog
                    .find(&language, &kind)
                    .ok_or_else(|| ServiceError::NotFound {
                        entity: "resource",
                        key: format!("{language}_{kind}"),
                    })?;
            let resource = ResourceService::new(conn, config).install_from_catalog(
                &client,
                found_language,
                found_resource,
            )?;
            println!("installed {} id={}", resource.slug(), resource.id);
        }
    }
    Ok(())
}

fn open(config: &AppConfig) -> Result<Connection, ServiceError> {
    config.ensure_dirs()?;
    open_db(&config.db_path).map_err(|err| ServiceError::Repo(err.into()))
}

/// Accepts either a glossary UUID or its code.
fn resolve_glossary(conn: &Connection, value: &str) -> Result<Glossary, ServiceError> {
    let service = GlossaryService::new(conn);
    match Uuid::parse_str(value.trim()) {
        Ok(id) => service.get_glossary(id),
        Err(_) => service.get_glossary_by_code(value),
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
