use clap::Parser;
use jcompare_common::{PairStatus, RenderOptions};
use jcompare_core::{list_pairs, AccessorPath, CompareOptions, ComparisonDriver};
use std::collections::BTreeSet;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Whitespace-separated accessor strings, unioned with `--ignore` flags
const IGNORE_ENV: &str = "JCOMPARE_IGNORE";

#[derive(Parser)]
#[command(name = "jcompare")]
#[command(author = "JCompare Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Structural comparison of JSON files and directories", long_about = None)]
struct Cli {
    /// Path to the first file or 'old' directory
    path1: PathBuf,

    /// Path to the second file or 'new' directory
    path2: PathBuf,

    /// Field to ignore, as a bracketed accessor string, e.g.
    /// "['metadata']['timestamp']". Can be specified multiple times;
    /// whitespace-separated values are also read from $JCOMPARE_IGNORE
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Maximum number of report entries before truncation (0 = unlimited)
    #[arg(short = 't', long, default_value_t = 100)]
    truncate_items: usize,

    /// Also print the full report for failing pairs
    #[arg(short, long)]
    verbose: bool,

    /// One line per change instead of the nested grouped report
    #[arg(long)]
    flat: bool,

    /// Compare sequences element by element instead of as multisets
    #[arg(long)]
    ordered: bool,

    /// Disable ANSI colors in output
    #[arg(long)]
    no_color: bool,
}

fn main() {
    // Diagnostics go to stderr so report output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Comparison failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let ignore = collect_ignore_paths(&cli.ignore, std::env::var(IGNORE_ENV).ok().as_deref());

    let use_color = !cli.no_color && std::io::stderr().is_terminal();
    let options = CompareOptions {
        ignore,
        max_items: cli.truncate_items,
        order_insensitive: !cli.ordered,
        flat: cli.flat,
        render: RenderOptions {
            color: use_color,
            ..RenderOptions::default()
        },
    };
    let driver = ComparisonDriver::new(options);

    if cli.path1.is_dir() && cli.path2.is_dir() {
        run_directories(&driver, &cli.path1, &cli.path2, cli.verbose)
    } else {
        // Validates existence and matching path kinds before any pair runs
        list_pairs(&cli.path1, &cli.path2)?;
        Ok(run_single_pair(&driver, &cli.path1, &cli.path2, cli.verbose))
    }
}

fn run_single_pair(
    driver: &ComparisonDriver,
    old_path: &Path,
    new_path: &Path,
    verbose: bool,
) -> i32 {
    let result = driver.compare_pair(old_path, new_path);
    let old_name = display_name(old_path);
    let new_name = display_name(new_path);

    match result.status {
        PairStatus::FileError => {
            eprintln!("Error reading or parsing a file.");
            1
        }
        PairStatus::Ok => {
            println!("Files '{}' and '{}' are identical.", old_name, new_name);
            0
        }
        PairStatus::Bad => {
            eprintln!(
                "Differences found between '{}' and '{}':",
                old_name, new_name
            );
            if verbose {
                if let Some(text) = &result.report {
                    eprintln!();
                    eprint!("{}", text);
                }
            }
            1
        }
    }
}

fn run_directories(
    driver: &ComparisonDriver,
    old_dir: &Path,
    new_dir: &Path,
    verbose: bool,
) -> anyhow::Result<i32> {
    println!(
        "Comparing directories:\n- Old: {}\n- New: {}\n",
        old_dir.display(),
        new_dir.display()
    );

    let report = driver.compare_directories(old_dir, new_dir)?;

    for (name, result) in &report.outcomes {
        if result.status == PairStatus::Ok {
            println!("[OK  ]  {}", name);
        }
    }
    for name in &report.extra {
        eprintln!("[NEW ]  {}", name);
    }
    for (name, result) in &report.outcomes {
        match result.status {
            PairStatus::Ok => {}
            PairStatus::Bad => {
                eprintln!("[BAD ]  {}", name);
                if verbose {
                    if let Some(text) = &result.report {
                        eprint!("{}", text);
                    }
                }
            }
            PairStatus::FileError => {
                eprintln!("[ERR ]  {}", name);
            }
        }
    }
    for name in &report.missing {
        eprintln!("[MISS]  {}", name);
    }

    if report.success() {
        println!("\nComparison finished successfully.");
        Ok(0)
    } else {
        eprintln!("\nComparison finished with errors.");
        Ok(1)
    }
}

/// Union the repeatable flag values with the environment list, de-duplicated
fn collect_ignore_paths(flags: &[String], env_value: Option<&str>) -> Vec<AccessorPath> {
    let mut accessors: BTreeSet<String> = flags.iter().cloned().collect();
    if let Some(env_value) = env_value {
        accessors.extend(env_value.split_whitespace().map(str::to_string));
    }
    accessors
        .iter()
        .map(|accessor| AccessorPath::parse(accessor))
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
