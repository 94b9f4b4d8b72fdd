//! Command-line surface and dispatch.
//!
//! Thin layer over the library: argument definitions, per-command handlers,
//! and top-level error rendering. Handlers return `Result` and the single
//! exit point turns any error into a miette report and a non-zero exit.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, process};

use clap::{Parser, Subcommand};

use crate::errors::KavaError;
use crate::harness::{self, HarnessConfig};
use crate::program::{self, SOURCE_EXT};
use crate::remote::{RemoteClient, DEFAULT_BASE_URL};
use crate::{output, scrape, select, store};

// ============================================================================
// CLI ARGUMENTS
// ============================================================================

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "kava",
    version,
    about = "Tests Java exercise programs against grading-service specs."
)]
pub struct KavaArgs {
    /// Where to store specs.
    #[arg(short = 'd', long = "rootDir", global = true, default_value = ".")]
    pub root_dir: PathBuf,

    /// Grading service base URL.
    #[arg(long = "baseUrl", global = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[command(subcommand)]
    pub command: ArgsCommand,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum ArgsCommand {
    /// Lists specs from the remote server.
    List,
    /// Dumps a spec from the remote server into the local store.
    Dump {
        /// Name of the spec.
        #[arg(required = true)]
        spec_name: String,
    },
    /// Tests a file on the remote server.
    Online {
        /// File to test.
        #[arg(required = true)]
        source_file: PathBuf,
    },
    /// Tests a file locally against a stored spec.
    Test {
        /// File to test.
        #[arg(required = true)]
        source_file: PathBuf,
        /// Subset of tests to run, e.g. "1,3-5".
        #[arg(long = "tests")]
        tests: Option<String>,
        /// Never display diffs.
        #[arg(long = "nodiff")]
        no_diff: bool,
        /// Exit on first test failure.
        #[arg(long = "failfatal")]
        fail_fatal: bool,
        /// Kill a test after this many seconds.
        #[arg(long = "timeout")]
        timeout: Option<u64>,
    },
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = KavaArgs::parse();

    let result = match args.command {
        ArgsCommand::List => cmd_list(&RemoteClient::new(&args.base_url)),
        ArgsCommand::Dump { spec_name } => {
            cmd_dump(&RemoteClient::new(&args.base_url), &spec_name, &args.root_dir)
        }
        ArgsCommand::Online { source_file } => {
            cmd_online(&RemoteClient::new(&args.base_url), &source_file)
        }
        ArgsCommand::Test {
            source_file,
            tests,
            no_diff,
            fail_fatal,
            timeout,
        } => cmd_test(
            &source_file,
            &args.root_dir,
            tests.as_deref(),
            no_diff,
            fail_fatal,
            timeout.map(Duration::from_secs),
        ),
    };

    if let Err(error) = result {
        print_error(error);
        process::exit(1);
    }
}

fn print_error(error: KavaError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn cmd_list(client: &RemoteClient) -> Result<(), KavaError> {
    println!("Specs on remote server:");
    for spec in client.list_specs()? {
        println!("\t{} ({})", spec.name, spec.path);
    }
    Ok(())
}

fn cmd_dump(client: &RemoteClient, spec_name: &str, root_dir: &Path) -> Result<(), KavaError> {
    let page = client.test_by_name(spec_name, None)?;
    let spec = scrape::parse_html_dump(spec_name, &page)?;
    println!("{spec}");
    store::save(&spec, root_dir)
}

fn cmd_online(client: &RemoteClient, source_file: &Path) -> Result<(), KavaError> {
    let spec_name = source_stem(source_file)?;
    let source =
        fs::read_to_string(source_file).map_err(|e| KavaError::io(source_file, e))?;
    let page = client.test_by_name(&spec_name, Some(&source))?;

    let report = env::temp_dir().join(format!("TestResult-{}-{}.html", spec_name, process::id()));
    fs::write(&report, page).map_err(|e| KavaError::io(&report, e))?;
    println!("Result page written to {}", report.display());
    Ok(())
}

fn cmd_test(
    source_file: &Path,
    root_dir: &Path,
    selector: Option<&str>,
    no_diff: bool,
    fail_fatal: bool,
    timeout: Option<Duration>,
) -> Result<(), KavaError> {
    let spec_name = source_stem(source_file)?;
    let spec = store::restore(root_dir, &spec_name)?;

    // Resolve the subset before paying for compilation: a bad selector
    // aborts before anything runs.
    let selected = match selector {
        Some(expression) => select::subset(expression, &spec.tests)?,
        None => spec.tests.clone(),
    };

    let program = program::compile(source_file, root_dir)?;
    let config = HarnessConfig {
        fail_fast: fail_fatal,
        timeout,
    };
    let verdicts = harness::execute(&program, &selected, &config)?;

    let mut stdout = output::stdout();
    let mut passed = 0;
    for verdict in &verdicts {
        if verdict.passed {
            passed += 1;
        }
        output::print_verdict(&mut stdout, verdict, !no_diff);
    }

    if fail_fatal {
        if let Some(last) = verdicts.last() {
            if !last.passed {
                println!("Exiting due to failure ({})", last.id);
                return Ok(());
            }
        }
    }
    println!("{}/{}", passed, selected.len());
    Ok(())
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Validates the source file and derives the spec name from its stem.
fn source_stem(source_file: &Path) -> Result<String, KavaError> {
    if !source_file.exists() {
        return Err(KavaError::SourceMissing {
            path: source_file.to_path_buf(),
        });
    }
    if source_file.extension().and_then(|ext| ext.to_str()) != Some(SOURCE_EXT) {
        return Err(KavaError::WrongExtension {
            path: source_file.to_path_buf(),
        });
    }
    source_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| KavaError::SourceMissing {
            path: source_file.to_path_buf(),
        })
}
