//! Command-line interface for filecombinator.
//!
//! Combines the files of a directory into one output file and prints a
//! summary of what was included and what was detected as binary or image.

use clap::Parser;
use filecombinator::{
    CombineReport, CombinatorBuilder, CombinatorOptions, Combiner, ContentSniffing,
    default_output_path, resolve_output_path, staging,
};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// filecombinator — combine a directory into a single annotated text file
#[derive(Parser)]
#[command(name = "filecombinator", version, about, long_about = None)]
struct Cli {
    /// Directory to process
    #[arg(short, long, default_value = ".")]
    directory: PathBuf,

    /// Output file (default: <directory_name><suffix>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Additional patterns to exclude (can be repeated)
    #[arg(short, long = "exclude")]
    exclude: Vec<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not apply the built-in exclusion patterns
    #[arg(long)]
    no_default_excludes: bool,

    /// Classify by extension and byte heuristic only
    #[arg(long)]
    no_sniff: bool,

    /// Honor .gitignore files
    #[arg(long)]
    gitignore: bool,

    /// Overwrite an existing output file without asking
    #[arg(short, long)]
    force: bool,

    /// Print the run report as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_options(self) -> Result<(CombinatorOptions, PathBuf, bool, bool), String> {
        let base = match &self.config {
            Some(path) => CombinatorOptions::from_json_file(path).map_err(|e| e.to_string())?,
            None => CombinatorOptions::default(),
        };
        let mut builder = CombinatorBuilder::from_options(base)
            .root(self.directory)
            .additional_excludes(self.exclude);
        if self.no_default_excludes {
            builder = builder.use_default_excludes(false);
        }
        if self.no_sniff {
            builder = builder.content_sniffing(ContentSniffing::Off);
        }
        if self.gitignore {
            builder = builder.respect_gitignore(true);
        }
        let options = builder.build();

        let output = match self.output {
            Some(given) => resolve_output_path(&given, &options.output_suffix),
            None => default_output_path(&options.root, &options.output_suffix),
        };
        Ok((options, output, self.force, self.json))
    }
}

fn setup_logging(verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            tracing_subscriber::EnvFilter::new("debug,ignore=warn,globset=warn")
        } else {
            tracing_subscriber::EnvFilter::new("info,ignore=warn,globset=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let _cleanup = staging::install_cleanup_guard();
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let (options, output, force, json) = match cli.into_options() {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !options.root.is_dir() {
        eprintln!("Error: Directory not found: {}", options.root.display());
        return ExitCode::FAILURE;
    }

    if output.exists() && !force && io::stdin().is_terminal() && !confirm_overwrite(&output) {
        eprintln!("Operation cancelled by user");
        return ExitCode::SUCCESS;
    }

    let root = options.root.clone();
    let result = Combiner::new(options).and_then(|mut combiner| combiner.run(&root, &output));
    match result {
        Ok(report) => {
            if json {
                print_json(&report)
            } else {
                print_summary(&report);
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn confirm_overwrite(output: &std::path::Path) -> bool {
    eprint!(
        "Output file '{}' already exists. Overwrite? [Y/n] ",
        output.display()
    );
    let _ = io::stderr().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}

fn print_json(report: &CombineReport) -> ExitCode {
    match serde_json::to_string_pretty(report) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("JSON serialization error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_summary(report: &CombineReport) {
    let stats = &report.stats;
    println!("\nProcessing completed!");
    println!("Text files processed: {}", stats.processed);
    println!("Binary files detected: {}", stats.binary);
    println!("Image files detected: {}", stats.image);
    println!("Files skipped: {}", stats.skipped);
    println!("Output written to: {}", report.output.display());

    for (label, files) in [("Binary", &report.lists.binary), ("Image", &report.lists.image)] {
        if !files.is_empty() {
            println!("\n{} files detected and excluded:", label);
            for name in files {
                println!("  {}", name);
            }
        }
    }

    if stats.skipped > 0 {
        eprintln!("Skipped {} files due to errors", stats.skipped);
    }
}
