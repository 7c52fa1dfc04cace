// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! pixcull: scan, color-tag and soft-delete image files

use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use pixcull::config::default_config_path;
use pixcull::files::{absolute, exists};
use pixcull::scanner::ScanSummary;
use pixcull::sources::well_known_roots;
use pixcull::staging::with_related;
use pixcull::{
    AppConfig, PixcullError, Result, ScanResult, ScanView, Scanner, StagingArea, TagColor,
    TagFilter, TagIndex,
};

/// pixcull CLI - image culling helper
#[derive(Parser, Debug)]
#[command(name = "pixcull")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Scan, color-tag and soft-delete image files", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format, default ~/.pixcull/settings.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json", "jsonl"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a directory tree for images
    Scan {
        /// Directory to scan
        #[arg(required_unless_present = "well_known", conflicts_with = "well_known")]
        dir: Option<PathBuf>,

        /// Scan the well-known message folders instead
        #[arg(long)]
        well_known: bool,
    },

    /// Color tag operations
    Tag {
        #[command(subcommand)]
        action: TagCommands,
    },

    /// Staging area (soft delete) operations
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum TagCommands {
    /// Tag a file with a color key (1-7)
    Set {
        file: PathBuf,
        /// 1 Red, 2 Orange, 3 Yellow, 4 Green, 5 Blue, 6 Purple, 7 Gray
        color: String,
    },

    /// Remove a file's tag
    Remove { file: PathBuf },

    /// Show a file's tag
    Get { file: PathBuf },

    /// List tagged files
    List {
        /// Only files with this color key
        #[arg(long, conflicts_with = "name")]
        color: Option<String>,

        /// Only files with this color name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Drop tags of files that no longer exist
    Cleanup,
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    /// Move files into the staging area
    Relocate {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also move companion `.pic.jpg` / `.pic_thumb.jpg` files
        #[arg(long)]
        with_related: bool,
    },

    /// Show staging area size
    Status,

    /// Permanently delete staged files
    Purge {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// List recent relocations
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Move recently staged files back
    Restore {
        /// Number of files to restore
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// Show what would be restored
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "settings.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = AppConfig::load(&config_path)?;
    debug!("Using configuration from {:?}", config_path);

    match cli.command {
        Commands::Scan { dir, well_known } => run_scan(&config, dir, well_known, &cli.format).await,
        Commands::Tag { action } => run_tag_command(&config, action, &cli.format),
        Commands::Cache { action } => run_cache_command(&config, action),
        Commands::Config { action } => run_config_command(&config, action),
    }
}

/// Scan one or more roots and print what was found
async fn run_scan(
    config: &AppConfig,
    dir: Option<PathBuf>,
    well_known: bool,
    format: &str,
) -> Result<()> {
    let roots = if well_known {
        let roots = well_known_roots();
        if roots.is_empty() {
            warn!("No well-known image folders found");
        }
        roots
    } else {
        dir.into_iter().collect()
    };

    let tags = TagIndex::open(&config.database.path)?;
    let scanner = Scanner::new(config.scan_options(), Some(tags.clone()));

    let mut results: Vec<ScanResult> = Vec::new();
    let mut summaries: Vec<ScanSummary> = Vec::new();
    for root in &roots {
        info!("Scanning {:?}", root);
        let mut stream = scanner.start_scan(root);
        let mut view = ScanView::new();
        view.begin();
        let summary = view.drain(&mut stream).await;
        if !summary.completed {
            warn!("Scan of {:?} ended without completing", root);
        }
        results.extend(view.results().iter().cloned());
        summaries.push(summary);
    }
    drop(scanner);
    tags.close()?;

    match format {
        "json" => {
            let output = serde_json::json!({
                "roots": roots,
                "results": results,
                "summaries": summaries,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "jsonl" => {
            for result in &results {
                println!("{}", serde_json::to_string(result)?);
            }
        }
        _ => {
            for result in &results {
                println!(
                    "{:1} {:<40} {:>12}  {}  {}",
                    result.tag_mark,
                    result.file_name,
                    result.size_display,
                    result.modified_at,
                    result.path.display()
                );
            }
            let found: usize = summaries.iter().map(|s| s.found).sum();
            let tagged: usize = summaries.iter().map(|s| s.tagged).sum();
            println!("\nScan complete, found {} image files ({} tagged)", found, tagged);
        }
    }

    Ok(())
}

/// Absolute form of `path`, which must exist
fn existing_file(path: &Path) -> Result<PathBuf> {
    let path = absolute(path);
    if !exists(&path) {
        return Err(PixcullError::FileSystem(io::Error::new(
            io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }
    Ok(path)
}

fn run_tag_command(config: &AppConfig, action: TagCommands, format: &str) -> Result<()> {
    let tags = TagIndex::open(&config.database.path)?;

    match action {
        TagCommands::Set { file, color } => {
            let path = existing_file(&file)?;
            let color = tags.set_tag_key(&path, &color)?;
            println!("{} {} -> {}", color.symbol(), path.display(), color);
        }
        TagCommands::Remove { file } => {
            let path = existing_file(&file)?;
            tags.remove_tag(&path)?;
            println!("Removed tag from {}", path.display());
        }
        TagCommands::Get { file } => {
            let path = existing_file(&file)?;
            match tags.get_tag(&path)? {
                Some(record) if format != "text" => {
                    println!("{}", serde_json::to_string(&record)?);
                }
                Some(record) => {
                    let symbol = record.color().map(TagColor::symbol).unwrap_or("");
                    println!(
                        "{} {} ({}) since {}",
                        symbol, record.tag_name, record.tag_key, record.created_at
                    );
                }
                None => println!("{} is not tagged", path.display()),
            }
        }
        TagCommands::List { color, name } => {
            let filter = TagFilter::from_options(color.as_deref(), name.as_deref())?;
            let files = tags.list_files_by_tag(&filter)?;
            match format {
                "json" => println!("{}", serde_json::to_string_pretty(&files)?),
                "jsonl" => {
                    for file in &files {
                        println!("{}", serde_json::to_string(file)?);
                    }
                }
                _ => {
                    println!("Tagged files ({}):", files.len());
                    for file in &files {
                        println!("  {}", file);
                    }
                }
            }
        }
        TagCommands::Cleanup => {
            let removed = tags.cleanup()?;
            println!("Removed {} stale tag(s)", removed);
        }
    }

    tags.close()
}

fn run_cache_command(config: &AppConfig, action: CacheCommands) -> Result<()> {
    let staging = StagingArea::from_config(&config.staging)?;

    match action {
        CacheCommands::Relocate { files, with_related: related } => {
            let mut paths = Vec::with_capacity(files.len());
            for file in &files {
                paths.push(existing_file(file)?);
            }
            if related {
                paths = with_related(&paths);
            }

            let moved = staging.relocate(&paths)?;
            for entry in &moved {
                println!(
                    "Staged: {} -> {}",
                    entry.original_path.display(),
                    entry.staged_path.display()
                );
            }
            if staging.threshold_reached()? {
                println!(
                    "Staging area holds {} file(s); run `pixcull cache purge --force` to free space",
                    staging.file_count()?
                );
            }
        }
        CacheCommands::Status => {
            println!("Staging area: {}", staging.dir().display());
            println!("  Files: {}", staging.file_count()?);
            println!("  Purge threshold: {}", staging.threshold());
            println!("  Journal: {}", staging.journal().path().display());
        }
        CacheCommands::Purge { force } => {
            if !force {
                eprintln!(
                    "Use --force to permanently delete {} staged file(s)",
                    staging.file_count()?
                );
                return Ok(());
            }
            let removed = staging.purge()?;
            println!("Deleted {} staged file(s)", removed);
        }
        CacheCommands::History { count } => {
            let entries = staging.journal().latest(count)?;
            println!("Recent relocations ({} entries):", entries.len());
            for entry in entries {
                let status = if entry.restored { "[RESTORED]" } else { "" };
                println!(
                    "  {} {} -> {} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.original_path.display(),
                    entry.staged_path.display(),
                    status
                );
            }
        }
        CacheCommands::Restore { count, dry_run } => {
            let report = staging.restore_recent(count, dry_run)?;
            if report.restored.is_empty() && report.skipped.is_empty() {
                println!("Nothing to restore");
            }
            let verb = if dry_run { "Would restore" } else { "Restored" };
            for entry in &report.restored {
                println!(
                    "{}: {} -> {}",
                    verb,
                    entry.staged_path.display(),
                    entry.original_path.display()
                );
            }
            for (entry, reason) in &report.skipped {
                warn!("Skipped {:?}: {}", entry.staged_path, reason);
            }
        }
    }

    Ok(())
}

fn run_config_command(config: &AppConfig, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_scan_command() {
        let cli = Cli::try_parse_from(["pixcull", "scan", "/tmp/photos"]).unwrap();
        assert!(!cli.verbose);
        assert_eq!(cli.format, "text");

        match cli.command {
            Commands::Scan { dir, well_known } => {
                assert_eq!(dir, Some(PathBuf::from("/tmp/photos")));
                assert!(!well_known);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_cli_scan_requires_root() {
        assert!(Cli::try_parse_from(["pixcull", "scan"]).is_err());
        assert!(Cli::try_parse_from(["pixcull", "scan", "/tmp", "--well-known"]).is_err());
        assert!(Cli::try_parse_from(["pixcull", "scan", "--well-known"]).is_ok());
    }

    #[test]
    fn test_cli_tag_set() {
        let cli = Cli::try_parse_from([
            "pixcull", "--format", "json", "tag", "set", "/tmp/a.jpg", "4"
        ]).unwrap();

        assert_eq!(cli.format, "json");
        match cli.command {
            Commands::Tag { action: TagCommands::Set { file, color } } => {
                assert_eq!(file, PathBuf::from("/tmp/a.jpg"));
                assert_eq!(color, "4");
            }
            _ => panic!("Expected Tag Set command"),
        }
    }

    #[test]
    fn test_cli_tag_list_filters_conflict() {
        assert!(Cli::try_parse_from(["pixcull", "tag", "list", "--color", "1"]).is_ok());
        assert!(Cli::try_parse_from([
            "pixcull", "tag", "list", "--color", "1", "--name", "Red"
        ]).is_err());
    }

    #[test]
    fn test_cli_cache_restore() {
        let cli = Cli::try_parse_from([
            "pixcull", "cache", "restore", "-n", "3", "--dry-run"
        ]).unwrap();

        match cli.command {
            Commands::Cache { action: CacheCommands::Restore { count, dry_run } } => {
                assert_eq!(count, 3);
                assert!(dry_run);
            }
            _ => panic!("Expected Cache Restore command"),
        }
    }

    #[test]
    fn test_existing_file_rejects_missing() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.jpg");
        std::fs::write(&present, b"x").unwrap();

        assert_eq!(existing_file(&present).unwrap(), present);
        assert!(matches!(
            existing_file(&dir.path().join("b.jpg")),
            Err(PixcullError::FileSystem(_))
        ));
    }
}
