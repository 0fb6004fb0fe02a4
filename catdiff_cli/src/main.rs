use anyhow::Context;
use catdiff_common::{
    ensure_config, load_config, load_config_file, AppConfig, DiffEntry, DiffKind, DiffOptions,
    SuppressionRecord,
};
use catdiff_core::{Catalog, DiffEngine, DiffOutcome};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_NO_DIFFERENCES: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_DIFFERENCES: i32 = 2;

#[derive(Parser)]
#[command(name = "catdiff")]
#[command(author = "catdiff Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Compare two configuration catalogs resource by resource", long_about = None)]
struct Cli {
    /// Enable debug logging (includes suppressed resources)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff two catalog files
    Diff {
        /// Catalog to compare from (old)
        from: PathBuf,

        /// Catalog to compare to (new)
        to: PathBuf,

        /// Skip resources carrying this tag (can be specified multiple times)
        #[arg(long = "ignore-tags", value_name = "TAG")]
        ignore_tags: Vec<String>,

        /// Skip attributes matching this rule, e.g. "mode" or "File[/etc/*]::content"
        #[arg(long = "ignore-attribute", value_name = "RULE")]
        ignore_attributes: Vec<String>,

        /// Report source file and line changes
        #[arg(long)]
        compare_file_line: bool,

        /// Also diff relationship edges
        #[arg(long)]
        include_edges: bool,

        /// Configuration file (defaults to the platform config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Disable ANSI colors in output
        #[arg(long)]
        no_color: bool,
    },

    /// Load a catalog file and report whether it is well formed
    Validate {
        /// Catalog file to check
        catalog: PathBuf,
    },

    /// Write a default configuration file if none exists and print its path
    InitConfig {
        /// Place the file beside the executable instead of the platform config directory
        #[arg(long)]
        portable: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let code = match cli.command {
        Commands::Diff {
            from,
            to,
            ignore_tags,
            ignore_attributes,
            compare_file_line,
            include_edges,
            config,
            json,
            no_color,
        } => {
            let flags = DiffFlags {
                ignore_tags,
                ignore_attributes,
                compare_file_line,
                include_edges,
            };
            match run_diff(&from, &to, flags, config.as_deref(), json, no_color) {
                Ok(true) => EXIT_DIFFERENCES,
                Ok(false) => EXIT_NO_DIFFERENCES,
                Err(e) => {
                    error!("Diff failed: {:#}", e);
                    EXIT_ERROR
                }
            }
        }
        Commands::Validate { catalog } => match run_validate(&catalog) {
            Ok(()) => EXIT_NO_DIFFERENCES,
            Err(e) => {
                error!("Validation failed: {:#}", e);
                EXIT_ERROR
            }
        },
        Commands::InitConfig { portable } => match run_init_config(portable) {
            Ok(()) => EXIT_NO_DIFFERENCES,
            Err(e) => {
                error!("Failed to write configuration: {:#}", e);
                EXIT_ERROR
            }
        },
    };

    std::process::exit(code);
}

/// Command-line overrides applied on top of the configuration file
#[derive(Debug, Default)]
struct DiffFlags {
    ignore_tags: Vec<String>,
    ignore_attributes: Vec<String>,
    compare_file_line: bool,
    include_edges: bool,
}

fn merge_options(mut config: AppConfig, flags: DiffFlags) -> DiffOptions {
    config.ignore_tags.extend(flags.ignore_tags);
    config.ignore_attributes.extend(flags.ignore_attributes);
    if flags.compare_file_line {
        config.compare_file_line = true;
    }
    if flags.include_edges {
        config.include_edges = true;
    }
    config.diff_options()
}

/// Returns whether any differences were found
fn run_diff(
    from: &Path,
    to: &Path,
    flags: DiffFlags,
    config_path: Option<&Path>,
    json: bool,
    no_color: bool,
) -> anyhow::Result<bool> {
    let loaded = match config_path {
        Some(path) => load_config_file(path)?,
        None => load_config(false)?,
    };
    if loaded.exists {
        let mode = if loaded.portable { " (portable)" } else { "" };
        info!("Using configuration {}{}", loaded.path.display(), mode);
    }

    let options = merge_options(loaded.config, flags);
    let engine = DiffEngine::new(&options).context("Invalid diff options")?;

    info!("Comparing:");
    info!("  From: {}", from.display());
    info!("  To:   {}", to.display());

    let from_catalog = Catalog::from_json_file(from).context("Failed to load from-catalog")?;
    let to_catalog = Catalog::from_json_file(to).context("Failed to load to-catalog")?;

    let outcome = engine.compare(&from_catalog, &to_catalog);

    if json {
        let report = build_json_report(from, to, &outcome);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let use_color = !no_color && std::io::stdout().is_terminal();
        print_text_report(&outcome, use_color);
    }

    Ok(!outcome.is_empty())
}

fn run_validate(path: &Path) -> anyhow::Result<()> {
    let catalog = Catalog::from_json_file(path)
        .with_context(|| format!("Invalid catalog {}", path.display()))?;
    println!(
        "{}: {} resources, {} edges, {} exported",
        path.display(),
        catalog.len(),
        catalog.edges().len(),
        catalog.exported_count()
    );
    Ok(())
}

fn run_init_config(portable: bool) -> anyhow::Result<()> {
    let loaded = ensure_config(portable).context("Unable to prepare configuration file")?;
    if loaded.exists {
        info!("Configuration already present");
    }
    println!("{}", loaded.path.display());
    Ok(())
}

fn print_text_report(outcome: &DiffOutcome, use_color: bool) {
    println!("\n{}", "=".repeat(80));
    println!("Catalog Differences");
    println!("{}", "=".repeat(80));

    for entry in &outcome.entries {
        println!("{}", format_entry(entry, use_color));
    }

    let summary = JsonSummary::from_outcome(outcome);
    println!("\n{}", "=".repeat(80));
    println!("Summary:");
    println!("  Total differences: {}", summary.total);
    println!("  Added:             {}", summary.added);
    println!("  Removed:           {}", summary.removed);
    println!("  Changed:           {}", summary.changed);
    println!("  Context changes:   {}", summary.changed_context);
    println!("  Suppressed:        {}", summary.suppressed);
    println!("{}", "=".repeat(80));
}

fn format_entry(entry: &DiffEntry, use_color: bool) -> String {
    let (color, reset) = if use_color {
        (
            match entry.kind {
                DiffKind::Added => "\x1b[32m",          // Green
                DiffKind::Removed => "\x1b[31m",        // Red
                DiffKind::Changed => "\x1b[33m",        // Yellow
                DiffKind::ChangedContext => "\x1b[36m", // Cyan
            },
            "\x1b[0m",
        )
    } else {
        ("", "")
    };

    let line = entry.to_string();
    match line.split_once(' ') {
        Some((symbol, rest)) => format!("{}{}{} {}", color, symbol, reset, rest),
        None => line,
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    from: String,
    to: String,
    summary: JsonSummary,
    diffs: &'a [DiffEntry],
    suppressed: &'a [SuppressionRecord],
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct JsonSummary {
    total: usize,
    added: usize,
    removed: usize,
    changed: usize,
    changed_context: usize,
    suppressed: usize,
}

impl JsonSummary {
    fn from_outcome(outcome: &DiffOutcome) -> Self {
        Self {
            total: outcome.len(),
            added: outcome.count(DiffKind::Added),
            removed: outcome.count(DiffKind::Removed),
            changed: outcome.count(DiffKind::Changed),
            changed_context: outcome.count(DiffKind::ChangedContext),
            suppressed: outcome.suppressed.len(),
        }
    }
}

fn build_json_report<'a>(from: &Path, to: &Path, outcome: &'a DiffOutcome) -> JsonReport<'a> {
    JsonReport {
        from: from.to_string_lossy().to_string(),
        to: to.to_string_lossy().to_string(),
        summary: JsonSummary::from_outcome(outcome),
        diffs: &outcome.entries,
        suppressed: &outcome.suppressed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catdiff_common::{AttrValue, CatalogSide, DiffPath, ResourceKey};

    fn sample_outcome() -> DiffOutcome {
        DiffOutcome {
            entries: vec![
                DiffEntry {
                    kind: DiffKind::Changed,
                    resource: ResourceKey::new("File", "/etc/motd"),
                    path: DiffPath::Attribute("mode".to_string()),
                    old_value: Some(AttrValue::from("0644")),
                    new_value: Some(AttrValue::from("0600")),
                },
                DiffEntry::resource_added(ResourceKey::new("Package", "curl")),
            ],
            suppressed: vec![SuppressionRecord {
                resource: ResourceKey::new("File", "/tmp/x"),
                tag: "noisy".to_string(),
                origin: CatalogSide::From,
            }],
        }
    }

    #[test]
    fn test_merge_options_extends_config() {
        let config = AppConfig {
            ignore_tags: vec!["from_config".to_string()],
            ignore_attributes: vec!["checksum".to_string()],
            ..AppConfig::default()
        };
        let flags = DiffFlags {
            ignore_tags: vec!["from_flag".to_string()],
            ignore_attributes: vec![],
            compare_file_line: true,
            include_edges: false,
        };

        let options = merge_options(config, flags);
        assert!(options.ignore_tags.contains("from_config"));
        assert!(options.ignore_tags.contains("from_flag"));
        assert_eq!(options.ignore_attributes, vec!["checksum".to_string()]);
        assert!(options.compare_file_line);
        assert!(!options.include_edges);
    }

    #[test]
    fn test_merge_options_keeps_config_booleans() {
        let config = AppConfig {
            include_edges: true,
            ..AppConfig::default()
        };
        let options = merge_options(config, DiffFlags::default());
        assert!(options.include_edges);
    }

    #[test]
    fn test_build_json_report() {
        let outcome = sample_outcome();
        let report = build_json_report(Path::new("/old.json"), Path::new("/new.json"), &outcome);

        assert_eq!(report.from, "/old.json");
        assert_eq!(report.to, "/new.json");
        assert_eq!(
            report.summary,
            JsonSummary {
                total: 2,
                added: 1,
                removed: 0,
                changed: 1,
                changed_context: 0,
                suppressed: 1,
            }
        );

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value["diffs"][0],
            serde_json::json!(["changed", "File[/etc/motd] -> mode", "0644", "0600"])
        );
        assert_eq!(value["suppressed"][0]["origin"], "from-catalog");
    }

    #[test]
    fn test_format_entry_plain() {
        let outcome = sample_outcome();
        assert_eq!(
            format_entry(&outcome.entries[1], false),
            "+ Package[curl]"
        );
    }

    #[test]
    fn test_format_entry_colored() {
        let outcome = sample_outcome();
        let line = format_entry(&outcome.entries[0], true);
        assert!(line.starts_with("\x1b[33m~\x1b[0m File[/etc/motd] -> mode"));
    }
}
