//! touchfish - read documents in disguise, from the terminal

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use touchfish::{
    Background, BackgroundRequest, BackgroundResponse, Bridge, Error, JsonFileStore, LibraryStore,
    LocalTransport, ReaderConfig, Result, StorageError, admit, config::AdmissionConfig,
    disguise::StaticPage, ingest, paging,
};

#[derive(Parser)]
#[command(name = "touchfish")]
#[command(version, about = "Read txt, EPUB and PDF documents a page at a time", long_about = None)]
#[command(after_help = "EXAMPLES:
    touchfish extract novel.epub           Print the extracted text
    touchfish import novel.epub            Add to the library and make it current
    touchfish read --next                  Show the next page of the current document
    touchfish list                         Show the library")]
struct Cli {
    /// Library file
    #[arg(long, global = true, value_name = "PATH", default_value = "touchfish-library.json")]
    store: PathBuf,

    /// JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More log output (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the normalized text of a file
    Extract {
        file: PathBuf,
    },
    /// Add a file to the library and make it current
    Import {
        file: PathBuf,
        /// Title to store instead of the file name
        #[arg(long)]
        title: Option<String>,
        /// Page size used for the cached page count
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// List the library
    List,
    /// Make a document current
    Switch { id: String },
    /// Delete a document
    Delete { id: String },
    /// Print a page of the current document
    Read {
        #[arg(long)]
        page_size: Option<usize>,
        #[arg(long, conflicts_with_all = ["prev", "page"])]
        next: bool,
        #[arg(long, conflicts_with = "page")]
        prev: bool,
        /// Jump to a page (1-based)
        #[arg(long)]
        page: Option<usize>,
    },
    /// Upgrade a single-document store to the library layout
    Migrate,
    /// Print the size of the store in bytes
    Usage,
    /// Delete everything in the store
    Clear,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Ingestion(e)) => {
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,touchfish={}", level.as_str().to_lowercase()))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ReaderConfig::from_json_file(path)?,
        None => ReaderConfig::default(),
    };
    let store = JsonFileStore::new(&cli.store);
    let library = LibraryStore::new(store.clone());

    match cli.command {
        Cmd::Extract { file } => {
            let (name, bytes) = read_input(&file, &config.admission)?;
            let ingested = ingest(&name, &bytes, &config.admission)?;
            for warning in &ingested.extraction.warnings {
                eprintln!("warning: {warning}");
            }
            println!("{}", ingested.extraction.text);
        }
        Cmd::Import {
            file,
            title,
            page_size,
        } => {
            let (name, bytes) = read_input(&file, &config.admission)?;
            let ingested = ingest(&name, &bytes, &config.admission)?;
            for warning in &ingested.extraction.warnings {
                eprintln!("warning: {warning}");
            }
            let title = title.unwrap_or(ingested.title);
            let page_size = page_size.unwrap_or(config.paging.default_page_size);
            let record = library
                .import_document(&ingested.extraction.text, Some(&title), page_size)
                .await?;
            println!("{}  {}  ({} pages)", record.id, record.title, record.total_pages);
        }
        Cmd::List => {
            let listed = library.list_documents().await?;
            if listed.is_empty() {
                println!("library is empty");
            }
            for record in listed.sorted_records() {
                let marker = if listed.current_id.as_deref() == Some(record.id.as_str()) {
                    '*'
                } else {
                    ' '
                };
                println!(
                    "{marker} {}  {}  page {}/{}  {}%  imported {}",
                    record.id,
                    record.title,
                    record.current_page_index + 1,
                    record.total_pages.max(1),
                    record.progress_percent(),
                    record.imported_at.format("%Y-%m-%d %H:%M"),
                );
            }
        }
        Cmd::Switch { id } => {
            let record = library.switch_current(&id).await?;
            println!("now reading {}", record.title);
        }
        Cmd::Delete { id } => match library.delete_document(&id).await? {
            Some(current) => println!("deleted {id}, current is now {current}"),
            None => println!("deleted {id}, library is empty"),
        },
        Cmd::Read {
            page_size,
            next,
            prev,
            page,
        } => {
            let Some(record) = library.current_document().await? else {
                println!("no current document, import one first");
                return Ok(());
            };
            let page_size = page_size.unwrap_or(config.paging.default_page_size).max(1);
            let total = paging::total_pages(&record.full_text, page_size);
            let stored = paging::clamp_index(record.current_page_index, total);

            let index = if next {
                paging::next_index(stored, total).unwrap_or(stored)
            } else if prev {
                paging::prev_index(stored).unwrap_or(stored)
            } else if let Some(page) = page {
                paging::clamp_index(page.saturating_sub(1), total)
            } else {
                stored
            };
            if index != record.current_page_index {
                library.update_current_page(&record.id, index, page_size).await?;
            }

            println!("{}", paging::page(&record.full_text, page_size, index));
            eprintln!("[{}  page {}/{}]", record.title, index + 1, total.max(1));
        }
        Cmd::Migrate => match library.migrate_legacy_schema(config.paging.default_page_size).await? {
            Some(record) => println!("migrated legacy document as {}", record.id),
            None => println!("nothing to migrate"),
        },
        Cmd::Usage => housekeeping(store, &config, BackgroundRequest::GetStorageUsage).await?,
        Cmd::Clear => housekeeping(store, &config, BackgroundRequest::ClearStorage).await?,
    }
    Ok(())
}

/// Storage housekeeping goes through the background handler.
async fn housekeeping(store: JsonFileStore, config: &ReaderConfig, request: BackgroundRequest) -> Result<()> {
    let path = store.path().to_path_buf();
    let transport: LocalTransport<JsonFileStore, StaticPage> =
        LocalTransport::new(store.clone(), config.clone());
    let background = Background::new(store, Bridge::new(transport, config.bridge.clone()));

    match background.handle(request).await {
        BackgroundResponse::Usage { usage } => println!("{usage} bytes"),
        BackgroundResponse::Cleared { success: true } => println!("store cleared"),
        BackgroundResponse::Cleared { success: false } => {
            return Err(StorageError::Backend(format!("could not clear {}", path.display())).into());
        }
    }
    Ok(())
}

/// Read a file that passes admission. Type and size are checked from the
/// name and metadata before any bytes are loaded.
fn read_input(path: &Path, admission: &AdmissionConfig) -> Result<(String, Vec<u8>)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    admit(&name, std::fs::metadata(path)?.len(), admission)?;
    let bytes = std::fs::read(path)?;
    Ok((name, bytes))
}
