//! Weave compiler front end
//!
//! Run with: `weavec [--threads N] [--timings] [--print-tree] [-v] <PATH>...`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use weave::project::{CompilerConfig, FileSet, Pipeline, expand_inputs};

#[derive(Parser)]
#[command(name = "weavec")]
#[command(about = "Check Weave source files")]
#[command(version)]
struct Cli {
    /// Source files, or directories to search for .wv files
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Worker threads (default: available parallelism)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Print stage durations
    #[arg(long)]
    timings: bool,

    /// Print the resolved program tree
    #[arg(long)]
    print_tree: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let config = CompilerConfig {
        threads: cli.threads,
        report_timings: cli.timings,
        print_tree: cli.print_tree,
    };

    let paths = match expand_inputs(&cli.paths) {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("error: {}", error);
            return ExitCode::from(1);
        }
    };
    if paths.is_empty() {
        eprintln!("error: no .wv files found");
        return ExitCode::from(1);
    }

    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(error) => {
            eprintln!("error: cannot start worker pool: {}", error);
            return ExitCode::from(1);
        }
    };
    debug!(threads = pipeline.threads(), files = paths.len(), "starting");

    let compilation = pipeline.compile(FileSet::from_paths(&paths));

    for diagnostic in compilation.diagnostics.diagnostics() {
        eprintln!("{}: {}", compilation.files.display(diagnostic.file), diagnostic);
    }

    if pipeline.config().print_tree && compilation.is_success() {
        if let Some(program) = &compilation.program {
            print!("{}", program.dump());
        }
    }

    if pipeline.config().report_timings {
        eprintln!("timings: {}", compilation.timings);
    }

    ExitCode::from(compilation.exit_code())
}
