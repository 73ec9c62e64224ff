use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use labcheck::{BuildOutcome, BuildRequest, CheckReport, Harness, RunRequest};

#[derive(Debug, Parser)]
#[command(name = "labcheck", about = "Compile, run, and memory-check a C assignment")]
struct Cli {
    /// Directory containing the assignment
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// C source file to compile
    #[arg(long, default_value = "test.c")]
    file: String,

    /// Build with the directory's Makefile instead of invoking gcc directly
    #[arg(long)]
    make: bool,

    /// Name of the produced executable
    #[arg(long, default_value = "a.out")]
    output: String,

    /// Wall-clock timeout for the run, in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Text fed to the program's standard input
    #[arg(long)]
    input: Option<String>,

    /// Skip the valgrind pass
    #[arg(long)]
    no_valgrind: bool,

    /// Write output.log / valgrind.log instead of printing to the console
    #[arg(long)]
    logs: bool,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    set_panic_hook();

    let cli = Cli::parse();

    let mut build = BuildRequest::new(&cli.dir, &cli.file).with_output_name(&cli.output);
    if cli.make {
        build = build.with_make();
    }

    let mut run = RunRequest::new(&cli.dir)
        .with_executable_name(&cli.output)
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_memcheck(!cli.no_valgrind)
        .with_log_to_files(cli.logs);
    if let Some(input) = cli.input {
        run = run.with_input(input);
    }

    let harness = Harness::native();
    let report = harness.check(&build, &run).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report(report: &CheckReport) {
    match &report.build {
        BuildOutcome::Failed { stderr } => {
            println!("Build failed:");
            print!("{stderr}");
        }
        BuildOutcome::Succeeded if report.errors.is_empty() => {
            println!("All checks passed.");
        }
        BuildOutcome::Succeeded => {
            for (kind, message) in report.errors.iter() {
                println!("{kind}: {message}");
            }
        }
    }
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
