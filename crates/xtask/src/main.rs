//! Task runner for the drivepage suite.
//!
//! ```text
//! cargo xtask setup
//! cargo xtask test [--file tests/drive_e2e.rs] [--grep upload] [--headed] [--workers 4]
//! cargo xtask ui
//! cargo xtask report [--port 9323]
//! ```

mod report;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use drivepage::session::{self, SessionStore};
use drivepage::{HarnessConfig, Paths, TestData};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Run and report the drive end-to-end suite")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration and sign in once, saving the session snapshot
    Setup,
    /// Run the suite (or part of it) and write reports
    Test(TestArgs),
    /// Run the suite headed, slowed down, one test at a time
    Ui(TestArgs),
    /// Serve the last HTML report
    Report {
        #[arg(long, default_value_t = 9323)]
        port: u16,
    },
}

#[derive(Args, Clone, Default)]
struct TestArgs {
    /// Only run this test file, e.g. tests/drive_e2e.rs
    #[arg(long)]
    file: Option<String>,

    /// Only run tests whose name contains this pattern
    #[arg(long)]
    grep: Option<String>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Number of tests run concurrently
    #[arg(long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    drivepage::logging::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Setup => {
            setup().await?;
        }
        Commands::Test(args) => run_tests(args, &[]).await?,
        Commands::Ui(args) => {
            let args = TestArgs {
                headed: true,
                workers: Some(1),
                ..args
            };
            run_tests(args, &[("SLOW_MO", "250")]).await?
        }
        Commands::Report { port } => {
            let config = load_config()?;
            report::serve(&config.paths.report, port).await?
        }
    }
    Ok(())
}

/// Test data shipped with the library, relative to the workspace root.
const BUNDLED_TEST_DATA: &str = "crates/drivepage/test-data/drive.json";

/// Configuration with every path made absolute against the workspace root.
///
/// Test binaries run with `crates/drivepage` as their working directory, so
/// relative paths would name different files there and here.
fn load_config() -> Result<HarnessConfig> {
    let mut config = HarnessConfig::from_env().context("invalid harness configuration")?;
    let bundled = std::env::var_os("TEST_DATA_PATH").is_none();
    anchor_paths(&mut config.paths, &workspace_root()?, bundled);
    Ok(config)
}

fn workspace_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(Path::to_path_buf)
        .context("xtask is not inside the workspace")
}

fn anchor_paths(paths: &mut Paths, root: &Path, bundled_test_data: bool) {
    if bundled_test_data {
        paths.test_data = PathBuf::from(BUNDLED_TEST_DATA);
    }
    for path in [
        &mut paths.test_files,
        &mut paths.screenshots,
        &mut paths.downloads,
        &mut paths.report,
        &mut paths.session_state,
        &mut paths.test_data,
    ] {
        if path.is_relative() {
            *path = root.join(&*path);
        }
    }
}

/// Path variables handed to `cargo test`, so the suite reads and writes the
/// same files as setup and the report.
fn path_env(paths: &Paths) -> [(&'static str, &Path); 6] {
    [
        ("TEST_FILES_PATH", paths.test_files.as_path()),
        ("SCREENSHOTS_PATH", paths.screenshots.as_path()),
        ("DOWNLOADS_PATH", paths.downloads.as_path()),
        ("REPORT_PATH", paths.report.as_path()),
        ("SESSION_STATE_PATH", paths.session_state.as_path()),
        ("TEST_DATA_PATH", paths.test_data.as_path()),
    ]
}

/// A missing, unreadable or malformed test data file stops the run.
fn validate_test_data(path: &Path) -> Result<()> {
    TestData::load(path).context("test data failed validation")?;
    Ok(())
}

/// Global setup: fails before any test runs if configuration, test data or
/// authentication is broken.
async fn setup() -> Result<HarnessConfig> {
    let config = load_config()?;
    validate_test_data(&config.paths.test_data)?;
    let snapshot = session::ensure_session(&config)
        .await
        .context("global sign-in failed")?;
    println!("session snapshot ready at {}", snapshot.display());
    Ok(config)
}

async fn run_tests(args: TestArgs, extra_env: &[(&str, &str)]) -> Result<()> {
    let config = load_config()?;
    SessionStore::new(&config.paths.session_state)
        .discard()
        .await
        .context("discarding the previous session snapshot")?;
    let config = setup().await?;

    let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let mut cmd = Command::new(cargo);
    cmd.args(cargo_test_args(&args)?)
        .envs(extra_env.iter().copied())
        .envs(path_env(&config.paths))
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    if args.headed {
        cmd.env("HEADLESS", "false");
    }

    tracing::info!("running cargo test");
    let mut child = cmd.spawn().context("spawning cargo test")?;
    let stdout = child.stdout.take().context("cargo test stdout was not captured")?;

    let mut output = String::new();
    let mut lines = BufReader::new(stdout).lines();
    while let Some(line) = lines.next_line().await? {
        println!("{line}");
        output.push_str(&line);
        output.push('\n');
    }
    let status = child.wait().await?;

    let report = report::Report::parse(&output)
        .write(&config.paths.report, &config.paths.screenshots)
        .await
        .context("writing reports")?;
    println!(
        "{} passed, {} failed, {} ignored; report in {}",
        report.passed(),
        report.failed(),
        report.ignored(),
        config.paths.report.display()
    );

    if !status.success() || report.failed() > 0 {
        bail!("test run failed");
    }
    Ok(())
}

/// Arguments for `cargo test` derived from the task options.
fn cargo_test_args(args: &TestArgs) -> Result<Vec<String>> {
    let mut out = vec!["test".to_string(), "-p".to_string(), "drivepage".to_string()];
    if let Some(file) = &args.file {
        let target = Path::new(file)
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("'{file}' is not a test file path"))?;
        out.push("--test".to_string());
        out.push(target.to_string());
    }
    out.push("--".to_string());
    if let Some(pattern) = &args.grep {
        out.push(pattern.clone());
    }
    out.push("--include-ignored".to_string());
    if let Some(workers) = args.workers {
        out.push(format!("--test-threads={workers}"));
    }
    Ok(out)
}
