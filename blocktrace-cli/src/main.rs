//! blocktrace CLI - insert block-entry trace markers into C and C++ sources

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use blocktrace_core::config::{self, validate_run_id};
use blocktrace_core::{
    render_json, render_text, CompilationDatabase, FileTask, InstrumentOptions, MarkerStyle,
    NamingScheme, RunReport,
};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blocktrace")]
#[command(about = "Insert a trace marker at the start of every block of every C/C++ function")]
#[command(version = env!("BLOCKTRACE_VERSION"))]
struct Cli {
    /// Source files to instrument
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Build directory containing compile_commands.json (default: search upward from the first source)
    #[arg(short = 'p', long = "build-path")]
    build_path: Option<PathBuf>,

    /// Path to config file (default: auto-discover in the current directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trace function name (overrides config file)
    #[arg(long = "marker-fn")]
    marker_fn: Option<String>,

    /// Run id token passed to the trace function (overrides config file)
    #[arg(long = "run-id")]
    run_id: Option<String>,

    /// Marker style (overrides config file)
    #[arg(long)]
    style: Option<StyleArg>,

    /// Identifier scheme (overrides config file)
    #[arg(long)]
    naming: Option<NamingArg>,

    /// Plan and report without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Number of worker threads (default: one per core)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Compiler arguments used for every source instead of a compilation database
    #[arg(last = true)]
    compiler_args: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum StyleArg {
    Comment,
    Statement,
}

#[derive(Clone, Copy, PartialEq, clap::ValueEnum)]
enum NamingArg {
    Auto,
    Qualified,
}

fn init_logging(verbose: u8) {
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            logger.filter_level(log::LevelFilter::Info);
        }
        _ => {
            logger.filter_level(log::LevelFilter::Debug);
        }
    }
    let _ = logger.try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("failed to read current directory")?;

    // Invalid configuration stops the run before any file is touched
    let mut resolved = match config::load_and_resolve(&cwd, cli.config.as_deref()) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    if let Some(ref p) = resolved.config_path {
        eprintln!("Using config: {}", p.display());
    }

    if let Some(name) = cli.marker_fn {
        if !config::is_c_identifier(&name) {
            eprintln!("Error: --marker-fn must be a C identifier (got {:?})", name);
            std::process::exit(1);
        }
        resolved.marker.function = name;
    }
    if let Some(run_id) = cli.run_id {
        if let Err(e) = validate_run_id(&run_id) {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        resolved.marker.run_id = run_id;
    }
    if let Some(style) = cli.style {
        resolved.marker.style = match style {
            StyleArg::Comment => MarkerStyle::Comment,
            StyleArg::Statement => MarkerStyle::Statement,
        };
    }
    if let Some(naming) = cli.naming {
        resolved.naming = match naming {
            NamingArg::Auto => NamingScheme::Auto,
            NamingArg::Qualified => NamingScheme::Qualified,
        };
    }

    // `--` with no arguments still selects a fixed database
    let fixed = !cli.compiler_args.is_empty() || std::env::args().any(|arg| arg == "--");
    let database = if fixed {
        Ok(CompilationDatabase::fixed(cli.compiler_args.clone(), &cwd))
    } else if let Some(ref build_path) = cli.build_path {
        CompilationDatabase::load(build_path)
    } else {
        CompilationDatabase::discover(&cli.sources[0])
    };
    let database = match database {
        Ok(database) => database,
        Err(e) => {
            eprintln!("Error while trying to load a compilation database:\n{:#}", e);
            std::process::exit(1);
        }
    };

    let mut tasks = Vec::new();
    let mut skipped = 0;
    for source in &cli.sources {
        if !resolved.should_include(source) {
            debug!("{}: excluded by configuration", source.display());
            skipped += 1;
            continue;
        }
        tasks.push(FileTask {
            path: source.clone(),
            command: database.command_for(source),
        });
    }
    info!("{} sources to instrument, {} skipped", tasks.len(), skipped);

    let options = InstrumentOptions {
        marker: resolved.marker.clone(),
        naming: resolved.naming,
        dry_run: cli.dry_run,
        jobs: cli.jobs,
    };
    let outcomes = blocktrace_core::run(&tasks, &options)?;
    let report = RunReport::new(outcomes, skipped, cli.dry_run);

    match cli.format {
        OutputFormat::Text => {
            print!("{}", render_text(&report));
        }
        OutputFormat::Json => {
            println!("{}", render_json(&report));
        }
    }

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}
