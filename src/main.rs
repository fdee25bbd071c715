//! Binary entry point: resolve settings, open the library, and hand it to the
//! chosen front end.
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use personal_library::{run_app, web, App, Library, LibraryStore, Settings};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "personal-library")]
#[command(about = "Keep track of the books you own and the ones you have read")]
#[command(version)]
struct Cli {
    /// Library file (JSON)
    #[arg(short, long, global = true, env = "LIBRARY_FILE")]
    file: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal menu (default)
    Tui,
    /// Serve the library as a local web page
    Web {
        /// Address to listen on
        #[arg(short, long, env = "LIBRARY_BIND")]
        bind: Option<String>,

        /// Open the page in the default browser once listening
        #[arg(long)]
        open: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    if let Some(file) = cli.file {
        settings.data_file = file;
    }

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => run_tui(&settings, cli.verbose),
        Commands::Web { bind, open } => {
            if let Some(bind) = bind {
                settings.bind = bind;
            }
            run_web(&settings, cli.verbose, open)
        }
    }
}

fn run_tui(settings: &Settings, verbose: bool) -> Result<()> {
    init_file_logging(&log_path(&settings.data_file), verbose);

    let (library, warning) = open_library(settings);
    let mut app = App::new(library, warning);
    run_app(&mut app)?;
    info!(books = app.library().len(), "terminal session finished");
    Ok(())
}

fn run_web(settings: &Settings, verbose: bool, open_browser: bool) -> Result<()> {
    init_logging(verbose);

    let (library, warning) = open_library(settings);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(web::serve(library, warning, &settings.bind, open_browser))
}

fn open_library(settings: &Settings) -> (Library, Option<personal_library::StoreError>) {
    Library::open(LibraryStore::new(&settings.data_file), settings.rules())
}

fn env_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_target(false)
        .init();
}

/// The terminal owns stdout/stderr while the TUI runs, so logs go to a file
/// next to the library instead.
fn init_file_logging(path: &Path, verbose: bool) {
    match open_log_file(path) {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(verbose))
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        // Logging is best-effort here; the session still runs without it.
        Err(err) => {
            eprintln!("logging disabled: cannot open {}: {err}", path.display());
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(verbose))
                .with_writer(std::io::sink)
                .init();
        }
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// `library.json` -> `library.json.log`
fn log_path(data_file: &Path) -> PathBuf {
    let mut name = OsString::from(data_file.as_os_str());
    name.push(".log");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_file_sits_next_to_the_library() {
        assert_eq!(
            log_path(Path::new("data/library.json")),
            PathBuf::from("data/library.json.log")
        );
    }

    #[test]
    fn log_file_creates_missing_directories() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join("library.json.log");
        open_log_file(&path).expect("open");
        assert!(path.exists());
    }

    #[test]
    fn log_file_under_a_regular_file_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").expect("write");
        assert!(open_log_file(&blocker.join("library.json.log")).is_err());
    }

    #[test]
    fn open_library_reads_the_configured_file() {
        let dir = TempDir::new().expect("temp dir");
        let settings = Settings {
            data_file: dir.path().join("books.json"),
            ..Settings::default()
        };
        fs::write(
            &settings.data_file,
            r#"[{"title":"Dune","author":"Frank Herbert","year":1965,"genre":"Sci-Fi","read":true}]"#,
        )
        .expect("write");

        let (library, warning) = open_library(&settings);
        assert!(warning.is_none());
        assert_eq!(library.len(), 1);
    }
}
