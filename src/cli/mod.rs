//! # CLI Module
//!
//! Command-line interface for the fingerprinting engine.
//!
//! ## Usage
//! ```bash
//! # Find files with identical content
//! fingerprint dupes ~/Downloads ~/Documents
//!
//! # Compare a folder with its backup, by file name
//! fingerprint compare ~/Photos/2024 --against /mnt/backup/2024
//!
//! # Checksums as JSON
//! fingerprint checksum ~/isos --output json
//!
//! # Check a file against a known checksum
//! fingerprint verify image.iso cbf43926
//!
//! # Cache maintenance
//! fingerprint cache stats
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use file_fingerprint::core::cache::{CacheStats, CacheValidation, FingerprintCache};
use file_fingerprint::core::hasher::HashCore;
use file_fingerprint::core::operation::{OperationResult, OperationSummary};
use file_fingerprint::core::scanner::{FileScanner, ScanConfig, WalkDirScanner};
use file_fingerprint::core::service::{
    HashService, ProgressReporter, ReporterRelay, ResultsDisplay, ServiceConfig, WorkerSelection,
};
use file_fingerprint::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::SystemTime;

/// File Fingerprint - content checksums, duplicates and mirror checks
#[derive(Parser, Debug)]
#[command(name = "fingerprint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Fingerprint cache database path
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Keep fingerprints in memory only
    #[arg(long, global = true, conflicts_with = "cache")]
    no_cache_file: bool,

    /// JSON service configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find files with identical content
    Dupes(InputArgs),

    /// Compare files with same-named files in another folder
    Compare {
        #[command(flatten)]
        input: InputArgs,

        /// Folder to compare against
        #[arg(long)]
        against: PathBuf,
    },

    /// Print the checksum of every file
    Checksum(InputArgs),

    /// Check a file against an expected checksum
    Verify {
        file: PathBuf,
        /// Expected checksum, 8 hex digits
        expected: String,
    },

    /// Inspect or maintain the fingerprint cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Files and directories to process
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Only process the top level of each directory
    #[arg(long)]
    no_recursive: bool,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,

    /// Force a worker instead of choosing by file count
    #[arg(long)]
    worker: Option<WorkerArg>,

    /// Recheck size and modification time before trusting the cache
    #[arg(long)]
    revalidate: bool,
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Show entry count and age
    Stats,
    /// Remove every entry
    Clear,
    /// Remove entries whose file no longer exists
    Prune,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WorkerArg {
    Sequential,
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI.
///
/// A failed verification maps to a failure exit code; the cache is dropped
/// before the process exits so SQLite can checkpoint its WAL.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let cache = Arc::new(open_cache(&cli));
    let term = Term::stderr();

    match &cli.command {
        Commands::Dupes(input) => {
            let service = build_service(&cli, input, Arc::clone(&cache))?;
            let files = collect_files(input);
            let relay = service.start_duplicate_scan(files, ReporterRelay::new(BarReporter::new(cli.output)))?;
            finish_operation(relay.wait()?, cli.output, &term)?;
        }
        Commands::Compare { input, against } => {
            let service = build_service(&cli, input, Arc::clone(&cache))?;
            let files = collect_files(input);
            let relay = service.start_external_comparison(
                files,
                against.clone(),
                ReporterRelay::new(BarReporter::new(cli.output)),
            )?;
            finish_operation(relay.wait()?, cli.output, &term)?;
        }
        Commands::Checksum(input) => {
            let service = build_service(&cli, input, Arc::clone(&cache))?;
            let files = collect_files(input);
            let relay =
                service.start_checksum_calculation(files, ReporterRelay::new(BarReporter::new(cli.output)))?;
            finish_operation(relay.wait()?, cli.output, &term)?;
        }
        Commands::Verify { file, expected } => {
            if !run_verify(cache, file, expected, cli.output)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Cache { action } => run_cache(&cache, action, cli.output, &term)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn open_cache(cli: &Cli) -> FingerprintCache {
    if cli.no_cache_file {
        return FingerprintCache::in_memory();
    }
    let path = cli.cache.clone().unwrap_or_else(|| {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("file-fingerprint")
            .join("fingerprints.db")
    });
    FingerprintCache::open(&path)
}

fn build_service(cli: &Cli, input: &InputArgs, cache: Arc<FingerprintCache>) -> Result<HashService> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_json_file(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(worker) = input.worker {
        config = config.worker(match worker {
            WorkerArg::Sequential => WorkerSelection::Sequential,
            WorkerArg::Parallel => WorkerSelection::Parallel,
        });
    }
    if input.revalidate {
        config = config.validation(CacheValidation::SizeAndModified);
    }
    Ok(HashService::new(cache, config))
}

fn collect_files(input: &InputArgs) -> Vec<PathBuf> {
    let scanner = WalkDirScanner::new(ScanConfig {
        recursive: !input.no_recursive,
        include_hidden: input.include_hidden,
        ..ScanConfig::default()
    });
    let scanned = scanner.scan(&input.paths);
    for error in &scanned.errors {
        tracing::warn!(error = %error, "Input skipped");
    }
    scanned.files
}

/// Drives an indicatif bar from progress callbacks
struct BarReporter {
    bar: Option<ProgressBar>,
}

impl BarReporter {
    fn new(output: OutputFormat) -> Self {
        let bar = (output == OutputFormat::Pretty).then(|| {
            let bar = ProgressBar::new(0);
            if let Ok(bar_style) =
                ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(bar_style.progress_chars("█▓░"));
            }
            bar
        });
        Self { bar }
    }
}

impl ProgressReporter for BarReporter {
    fn report_progress(&mut self, current: usize, total: usize, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_length(total as u64);
            bar.set_position(current as u64);
            bar.set_message(message.to_string());
        }
    }
}

/// Prints results to stdout
struct TerminalDisplay<'a> {
    term: &'a Term,
    output: OutputFormat,
    summary: Option<&'a OperationSummary>,
}

impl ResultsDisplay for TerminalDisplay<'_> {
    fn show_hash_results(&mut self, results: &OperationResult, was_cancelled: bool) {
        match self.output {
            OutputFormat::Json => print_json_results(results, self.summary),
            OutputFormat::Pretty => print_pretty_results(self.term, results, self.summary, was_cancelled),
        }
    }
}

fn finish_operation(relay: ReporterRelay<BarReporter>, output: OutputFormat, term: &Term) -> Result<()> {
    if let Some(bar) = &relay.reporter().bar {
        bar.finish_and_clear();
    }
    for error in relay.errors() {
        term.write_line(&format!("{} {}", style("✗").red().bold(), error)).ok();
    }

    let mut display = TerminalDisplay {
        term,
        output,
        summary: relay.summary(),
    };
    relay.show(&mut display);
    Ok(())
}

fn print_pretty_results(
    term: &Term,
    result: &OperationResult,
    summary: Option<&OperationSummary>,
    cancelled: bool,
) {
    let marker = if cancelled {
        style("!").yellow().bold()
    } else {
        style("✓").green().bold()
    };
    if let Some(summary) = summary {
        term.write_line(&format!("{} {}", marker, summary.message)).ok();
        term.write_line(&format!(
            "  {} files in {:.1}s, {} from cache, {} skipped",
            style(summary.total).cyan(),
            summary.duration_ms as f64 / 1000.0,
            style(summary.cache_hits).dim(),
            style(summary.failed).yellow()
        ))
        .ok();
        for error in &summary.errors {
            term.write_line(&format!("  {} {}", style("○").dim(), style(error).dim())).ok();
        }
    }
    term.write_line("").ok();

    match result {
        OperationResult::Duplicates(groups) => {
            if groups.is_empty() {
                term.write_line("  No duplicates found").ok();
            }
            for (hash, paths) in groups {
                println!("{} ({} files)", style(hash).bold(), paths.len());
                for path in paths {
                    println!("    {}", display_path(path));
                }
            }
        }
        OperationResult::Compare(entries) => {
            for (name, entry) in entries {
                let verdict = if entry.is_same {
                    style("same").green()
                } else {
                    style("DIFFERENT").red().bold()
                };
                println!("{:<10} {} {} {}", verdict, entry.hash_a, entry.hash_b, name);
            }
        }
        OperationResult::Checksum(sums) => {
            for (path, hash) in sums {
                println!("{}  {}", hash, display_path(path));
            }
        }
    }
}

fn print_json_results(result: &OperationResult, summary: Option<&OperationSummary>) {
    let output = serde_json::json!({
        "summary": summary,
        "result": result,
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => tracing::error!(error = %e, "Failed to serialize results"),
    }
}

/// Print how `file` compares with `expected`; `Ok(false)` on a mismatch
fn run_verify(cache: Arc<FingerprintCache>, file: &Path, expected: &str, output: OutputFormat) -> Result<bool> {
    let core = HashCore::new(cache);
    let actual = core.calculate_hash(file, None, None);
    let matches = core.verify_file_integrity(file, expected);

    match output {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "path": file,
                "expected": expected.trim().to_lowercase(),
                "actual": actual.map(|h| h.to_string()),
                "matches": matches,
            });
            println!("{}", report);
        }
        OutputFormat::Pretty => match actual {
            Some(hash) if matches => println!("{} {}  {}", style("✓").green().bold(), hash, display_path(file)),
            Some(hash) => println!(
                "{} {}  {} (expected {})",
                style("✗").red().bold(),
                hash,
                display_path(file),
                expected.trim()
            ),
            None => println!("{} {} could not be read", style("✗").red().bold(), display_path(file)),
        },
    }

    Ok(matches)
}

fn run_cache(cache: &FingerprintCache, action: &CacheAction, output: OutputFormat, term: &Term) -> Result<()> {
    match action {
        CacheAction::Stats => {
            let stats = cache.stats()?;
            match output {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({
                        "backend": cache.cache_type().as_str(),
                        "total_entries": stats.total_entries,
                        "oldest_entry": stats.oldest_entry.map(format_time),
                        "newest_entry": stats.newest_entry.map(format_time),
                    })
                ),
                OutputFormat::Pretty => print_cache_stats(term, cache, &stats),
            }
        }
        CacheAction::Clear => {
            cache.clear();
            term.write_line(&format!("{} Cache cleared", style("✓").green().bold())).ok();
        }
        CacheAction::Prune => {
            let removed = cache.prune_orphans()?;
            term.write_line(&format!(
                "{} Removed {} stale entries",
                style("✓").green().bold(),
                style(removed).cyan()
            ))
            .ok();
        }
    }
    Ok(())
}

fn print_cache_stats(term: &Term, cache: &FingerprintCache, stats: &CacheStats) {
    term.write_line(&format!("{}", style("Fingerprint cache").bold().underlined())).ok();
    term.write_line(&format!("  backend: {}", style(cache.cache_type()).cyan())).ok();
    term.write_line(&format!("  entries: {}", style(stats.total_entries).cyan())).ok();
    if let Some(oldest) = stats.oldest_entry {
        term.write_line(&format!("  oldest:  {}", format_time(oldest))).ok();
    }
    if let Some(newest) = stats.newest_entry {
        term.write_line(&format!("  newest:  {}", format_time(newest))).ok();
    }
}

fn format_time(time: SystemTime) -> String {
    chrono::DateTime::<chrono::Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn display_path(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(relative) => format!("~/{}", relative.display()),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}
