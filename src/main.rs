use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};

use theme_compiler::config::{Cli, Config};
use theme_compiler::error::error_chain;
use theme_compiler::orchestrator::{collect_results, prepare_family, run, BuildStats, JobStatus};
use theme_compiler::theme::InputDescriptor;

fn main() -> ExitCode {
    match run_cli() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run_cli() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::MissingRequiredArgument => {
            println!("Usage: compile-themes <PACKAGE_NAME>");
            println!();
            println!("{}", Cli::command().render_help());
            return Ok(ExitCode::from(1));
        }
        Err(e) => e.exit(),
    };
    let config = Config::from_cli(cli)?;

    let default_filter = if config.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    // Configure Rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build_global()
        .ok();

    // Discover sources; discovery and bootstrap failures abort the run
    let mut descriptors: Vec<InputDescriptor> = Vec::new();
    for &family in config.families() {
        match prepare_family(family, &config) {
            Ok(found) => descriptors.extend(found),
            Err(e) if !e.is_fatal() => {
                error!("Skipping {family} themes: {}", error_chain(&e));
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to prepare {family} themes"));
            }
        }
    }

    if let Some(theme) = &config.target_theme {
        info!("Theme filter: {theme}");
    }
    info!(
        "Compiling {} file(s) with {} worker(s)",
        descriptors.len(),
        config.jobs
    );

    let start = Instant::now();
    let stats = BuildStats::new();

    // Progress bar (only in verbose mode)
    let progress = if config.verbose {
        let pb = ProgressBar::new(descriptors.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let results = run(
        &descriptors,
        &config.pipelines,
        &config.load_paths,
        &stats,
        |_| {
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
        },
    );

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let (results, has_success, has_failure) = collect_results(results);
    let duration = start.elapsed();

    // Per-file breakdown
    for result in &results {
        match &result.status {
            JobStatus::Compiled { outputs } => {
                println!(
                    "✔ {} ({:.2}s)",
                    result.source.display(),
                    result.duration.as_secs_f64()
                );
                for path in outputs {
                    println!("    {}", path.display());
                }
            }
            JobStatus::Failed(e) => {
                println!("✗ {}: {}", result.source.display(), error_chain(e));
            }
        }
    }

    let compiled = stats.files_compiled.get();
    let throughput = if duration.as_secs_f64() > 0.0 {
        compiled as f64 / duration.as_secs_f64()
    } else {
        0.0
    };
    println!(
        "Compiled {} of {} file(s), {} artifact(s), {} bytes in {:.2}s ({:.1} files/sec), {} failure(s)",
        compiled,
        results.len(),
        stats.artifacts_written.get(),
        stats.bytes_written.get(),
        duration.as_secs_f64(),
        throughput,
        stats.failures.get()
    );

    // Determine exit code
    if has_failure && !has_success {
        warn!("No file compiled successfully");
    }
    if has_failure && config.strict {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
