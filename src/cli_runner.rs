//! CLI runner shared by the `samplepack` binary and the integration tests.
//!
//! Status output goes to stdout; logs and the progress line go to stderr.

use crate::catalog::{self, CatalogListing};
use crate::cli::{self, Args, Commands};
use crate::combine::BatchCombiner;
use crate::config::EngineConfig;
use crate::materialize::{default_export_file_name, ExportOutcome, Materializer};
use crate::pack::PackManifest;
use crate::progress::ProgressState;

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Public entry for running the CLI.
pub async fn run_cli_app() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::run()?;
    init_tracing(args.verbose);
    run_command(args).await
}

pub async fn run_command(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::load(args.config.as_deref())?;
    debug!(?config, "configuration loaded");

    match args.command {
        Commands::List { path } => {
            let listing = if is_zip_path(&path) {
                catalog::list_archive(&path).await
            } else {
                catalog::list_directory(&path).await
            };
            print_listing(&listing);
        }
        Commands::Export { manifest, output } => {
            let text = tokio::fs::read_to_string(&manifest)
                .await
                .map_err(|e| format!("could not read manifest '{}': {e}", manifest.display()))?;
            let manifest: PackManifest = serde_json::from_str(&text)?;
            let pack = manifest.into_pack()?;
            let output = output.unwrap_or_else(|| PathBuf::from(default_export_file_name(&pack)));

            let mut materializer = Materializer::new(&config);
            if io::stderr().is_terminal() {
                materializer = materializer.with_progress(create_cli_progress_callback("export"));
            }
            match materializer.materialize(&pack, &output).await? {
                ExportOutcome::EmptyPack => println!("No items to export"),
                ExportOutcome::Exported(report) => {
                    println!("{}", report.summary());
                    for failed in &report.failed_items {
                        eprintln!("  failed: {} ({})", failed.display_path(), failed.reason);
                    }
                    println!("{}", report.output_path.display());
                }
            }
        }
        Commands::Combine { archives, output_dir } => {
            let mut config = config;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            let mut combiner = BatchCombiner::new(&config);
            if io::stderr().is_terminal() {
                combiner = combiner.with_progress(create_cli_progress_callback("combine"));
            }
            let output = combiner.combine(&archives).await?;
            println!("{}", output.display());
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

fn is_zip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

fn print_listing(listing: &CatalogListing) {
    if let Some(warning) = &listing.warning {
        eprintln!("Warning: {warning}");
    }
    for entry in &listing.entries {
        if entry.is_directory {
            println!("{}/", entry.name.trim_end_matches('/'));
        } else if let Some(size) = entry.size {
            println!("{}\t{}", entry.name, size);
        } else {
            println!("{}", entry.name);
        }
    }
}

// --- utils for CLI progress -------------------------------------------------

fn create_cli_progress_callback(operation: &str) -> impl Fn(ProgressState) + Send + Sync + 'static {
    let operation = operation.to_uppercase();
    let prev_len = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicBool::new(false));

    move |state: ProgressState| {
        if done.load(Ordering::Relaxed) {
            return;
        }
        let bar_width = 30usize;
        let filled = ((state.progress_percent / 100.0) * bar_width as f32) as usize;
        let bar = format!("[{}{}]", "█".repeat(filled), "░".repeat(bar_width.saturating_sub(filled)));
        let mut line = format!(
            "[{}] {} {:.1}% | {}/{} items | {} failed | {}",
            operation,
            bar,
            state.progress_percent,
            state.processed_items,
            state.total_items,
            state.failed_items,
            state.current.as_deref().unwrap_or(""),
        );

        // Pad over the tail of a longer previous line.
        let prev = prev_len.swap(line.chars().count(), Ordering::Relaxed);
        let len = line.chars().count();
        if prev > len {
            line.push_str(&" ".repeat(prev - len));
        }
        eprint!("\r\x1B[2K{line}");
        io::stderr().flush().ok();

        if state.is_complete() {
            eprintln!();
            done.store(true, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_detection_is_case_insensitive() {
        assert!(is_zip_path(Path::new("/a/b/Kit.ZIP")));
        assert!(is_zip_path(Path::new("kit.zip")));
        assert!(!is_zip_path(Path::new("/a/zip")));
        assert!(!is_zip_path(Path::new("kit.wav")));
    }
}
