use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use photo_organizer::config::Config;
use photo_organizer::db::{Database, Source};
use photo_organizer::export::{self, ExportFormat};
use photo_organizer::logging;
use photo_organizer::reconcile::{self, AlbumStatus, CompareOptions, CompareReport};
use photo_organizer::remote::{GooglePhotosClient, RemoteSync};
use photo_organizer::scanner::{LocalScanner, ScanProgress};

#[derive(Parser)]
#[command(name = "photo-organizer")]
#[command(about = "Find local photos missing from your cloud photo library", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SQLite store (overrides db_path from config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Root of the local photo tree (overrides local_photos_dir from config)
    #[arg(long, global = true)]
    local_photos_dir: Option<PathBuf>,

    /// Log store writes instead of performing them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Also log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull albums and media items from the remote library
    ScanRemote {
        /// Stop after this many media items
        #[arg(long)]
        max_photos: Option<usize>,
    },

    /// Scan the local photo tree
    ScanLocal {
        /// Directory to scan (defaults to --local-photos-dir or config)
        dir: Option<PathBuf>,
    },

    /// Compare local albums against the remote library
    Compare {
        /// Also write the report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,
    },

    /// Search both sources by filename
    Search {
        pattern: String,
    },

    /// Show the remote match of every local photo
    Match {
        /// Only albums whose title matches this glob
        #[arg(long)]
        album_filter: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,
    },

    /// List albums with their photo counts
    Albums {
        /// local or remote (both when omitted)
        #[arg(long)]
        source: Option<Source>,
    },

    /// Scan remote, scan local, then compare
    All {
        #[arg(long)]
        max_photos: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Journald on Linux, file fallback otherwise
    logging::init(None, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    let db = Database::open(&db_path, cli.dry_run)?;
    if cli.dry_run {
        println!("Dry run: no changes will be written to {}", db_path.display());
    }

    match cli.command {
        Commands::ScanRemote { max_photos } => cmd_scan_remote(&config, &db, max_photos),
        Commands::ScanLocal { dir } => {
            let root = local_root(dir, &cli.local_photos_dir, &config)?;
            cmd_scan_local(&config, &db, &root)
        }
        Commands::Compare { output, format } => cmd_compare(&config, &db, output.as_deref(), format),
        Commands::Search { pattern } => cmd_search(&db, &pattern),
        Commands::Match {
            album_filter,
            output,
            format,
        } => cmd_match(&db, album_filter.as_deref(), output.as_deref(), format),
        Commands::Albums { source } => cmd_albums(&db, source),
        Commands::All { max_photos } => {
            let root = local_root(None, &cli.local_photos_dir, &config)?;
            cmd_scan_remote(&config, &db, max_photos)?;
            cmd_scan_local(&config, &db, &root)?;
            cmd_compare(&config, &db, None, ExportFormat::Json)
        }
    }
}

fn local_root(dir: Option<PathBuf>, flag: &Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    match dir.or_else(|| flag.clone()).or_else(|| config.local_photos_dir.clone()) {
        Some(root) => Ok(root),
        None => bail!("No local photo directory given; pass DIR, --local-photos-dir, or set local_photos_dir in the config"),
    }
}

fn cmd_scan_remote(config: &Config, db: &Database, max_photos: Option<usize>) -> Result<()> {
    db.initialize()?;

    let client = GooglePhotosClient::from_config(&config.remote)?;
    let sync = RemoteSync::new(client, &config.remote);
    let result = sync.sync_into(db, max_photos)?;

    println!(
        "Remote: {} photos, {} albums, {} memberships",
        result.photos, result.albums, result.memberships
    );
    if result.skipped_memberships > 0 {
        println!(
            "  {} memberships skipped for photos outside the fetched set",
            result.skipped_memberships
        );
    }
    Ok(())
}

fn cmd_scan_local(config: &Config, db: &Database, root: &Path) -> Result<()> {
    db.initialize()?;

    println!("Scanning {}", root.display());
    let scanner = LocalScanner::new(&config.scanner);
    let result = scanner.scan_into(root, db, &mut |event| match event {
        ScanProgress::Album {
            current,
            total,
            title,
            photos,
        } => println!("  [{}/{}] {} ({} photos)", current, total, title, photos),
        ScanProgress::Skipped { path, message } => eprintln!("  skipped {}: {}", path, message),
        ScanProgress::Started { .. } | ScanProgress::Completed { .. } => {}
    })?;

    println!(
        "Local: {} photos in {} albums ({} skipped)",
        result.photos, result.albums, result.skipped
    );
    Ok(())
}

fn cmd_compare(config: &Config, db: &Database, output: Option<&Path>, format: ExportFormat) -> Result<()> {
    let report = reconcile::compare_albums(db, CompareOptions::from(&config.compare))?;
    print_report(&report);

    if let Some(path) = output {
        let count = export::export_compare_report(&report, path, format)?;
        println!("Wrote {} albums to {} ({})", count, path.display(), format.name());
    }
    Ok(())
}

fn print_report(report: &CompareReport) {
    for album in &report.albums {
        match &album.status {
            AlbumStatus::ToCreate { missing } => println!(
                "{}: create album ({} photos, {} not in library)",
                album.title,
                album.local_count,
                missing.len()
            ),
            AlbumStatus::InSync { .. } => {
                println!("{}: in sync ({} photos)", album.title, album.local_count)
            }
            AlbumStatus::NeedsReconcile {
                remote_count,
                missing,
                ..
            } => println!(
                "{}: {} local / {} remote, {} missing",
                album.title,
                album.local_count,
                remote_count,
                missing.len()
            ),
        }
        for photo in album.status.missing() {
            println!("    {} ({}x{})", photo.filename, photo.width, photo.height);
        }
    }

    for duplicate in &report.duplicate_remote_titles {
        println!(
            "warning: {} remote albums are titled \"{}\"; only the first is compared",
            duplicate.count, duplicate.title
        );
    }

    println!(
        "{} albums, {} to create, {} need reconciling, {} photos missing",
        report.albums.len(),
        report.count("to_create"),
        report.count("needs_reconcile"),
        report.missing_total()
    );
}

fn cmd_search(db: &Database, pattern: &str) -> Result<()> {
    db.ensure_initialized()?;

    let hits = db.search(pattern)?;
    if hits.is_empty() {
        println!("No photos match \"{}\"", pattern);
        return Ok(());
    }

    for hit in &hits {
        let (width, height) = hit.photo.dimensions();
        println!(
            "{:<6} {} ({}x{}) [{}] {}",
            hit.source.as_str(),
            hit.photo.filename(),
            width,
            height,
            hit.albums,
            hit.photo.base().path
        );
    }
    println!("{} matches", hits.len());
    Ok(())
}

fn cmd_match(
    db: &Database,
    album_filter: Option<&str>,
    output: Option<&Path>,
    format: ExportFormat,
) -> Result<()> {
    let matches = reconcile::match_photos(db, album_filter)?;

    for m in &matches {
        match &m.remote {
            Some(remote) => println!(
                "{} | {} -> {} ({})",
                m.album_title,
                m.filename,
                remote.filename,
                remote.album_title.as_deref().unwrap_or("no album")
            ),
            None => println!("{} | {} -> not found", m.album_title, m.filename),
        }
    }
    let matched = matches.iter().filter(|m| m.remote.is_some()).count();
    println!("{} of {} local photos found remotely", matched, matches.len());

    if let Some(path) = output {
        let count = export::export_matches(&matches, path, format)?;
        println!("Wrote {} photos to {} ({})", count, path.display(), format.name());
    }
    Ok(())
}

fn cmd_albums(db: &Database, source: Option<Source>) -> Result<()> {
    db.ensure_initialized()?;

    let sources = match source {
        Some(source) => vec![source],
        None => vec![Source::Local, Source::Remote],
    };

    for source in sources {
        let albums = db.list_albums(source)?;
        println!("{} albums ({}):", source, albums.len());
        for summary in albums {
            println!("  {:>6}  {}", summary.photo_count, summary.album.title);
        }
    }
    Ok(())
}
