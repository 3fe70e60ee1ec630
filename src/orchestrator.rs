//! Compilation orchestration.
//!
//! Every source file is compiled as an independent rayon task. A failing file
//! produces a failed [`JobResult`] and never affects the others; progress is
//! tracked with cache-aligned atomic counters.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use log::{debug, error, info};
use rayon::prelude::*;

use crate::compiler::compile;
use crate::config::Config;
use crate::error::{error_chain, BuildError};
use crate::postprocess::{postprocess, Pipelines};
use crate::scanner::FamilySource;
use crate::theme::{InputDescriptor, ThemeFamily};
use crate::types::derive_types;
use crate::variables::to_json;
use crate::writer::{ensure_dir, write_artifacts, ArtifactSet};

/// Result of compiling one source file
#[derive(Debug)]
pub struct JobResult {
    pub source: PathBuf,
    pub status: JobStatus,
    /// Time taken for this file
    pub duration: Duration,
}

/// Compilation outcome
#[derive(Debug)]
pub enum JobStatus {
    /// All five artifacts written
    Compiled { outputs: Vec<PathBuf> },
    /// Failed with error; artifacts may be partially written
    Failed(BuildError),
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Compiled { .. })
    }
}

/// Cache-line aligned atomic counter to prevent false sharing
#[repr(align(64))]
pub struct CacheAlignedAtomic(pub AtomicU64);

impl CacheAlignedAtomic {
    pub const fn new(val: u64) -> Self {
        Self(AtomicU64::new(val))
    }

    #[inline]
    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Run-wide counters, updated from every worker
pub struct BuildStats {
    pub files_compiled: CacheAlignedAtomic,
    pub artifacts_written: CacheAlignedAtomic,
    pub bytes_written: CacheAlignedAtomic,
    pub failures: CacheAlignedAtomic,
}

impl BuildStats {
    pub fn new() -> Self {
        Self {
            files_compiled: CacheAlignedAtomic::new(0),
            artifacts_written: CacheAlignedAtomic::new(0),
            bytes_written: CacheAlignedAtomic::new(0),
            failures: CacheAlignedAtomic::new(0),
        }
    }
}

impl Default for BuildStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile one source into its artifacts without writing them
pub fn build_artifacts(
    descriptor: &InputDescriptor,
    pipelines: &Pipelines,
    load_paths: &[PathBuf],
) -> Result<ArtifactSet, BuildError> {
    let compiled = compile(&descriptor.source_path, load_paths)?;

    let type_declaration = derive_types(&compiled.variables, &descriptor.json_module_path())
        .map_err(|source| BuildError::Types {
            path: descriptor.source_path.clone(),
            source,
        })?;

    let (css, minified_css) = rayon::join(
        || postprocess(&compiled.css, &pipelines.base, &descriptor.output_css_path),
        || {
            postprocess(
                &compiled.css,
                &pipelines.minified,
                &descriptor.output_min_css_path,
            )
        },
    );

    let variables_json = to_json(&compiled.variables).map_err(|source| BuildError::Serialize {
        path: descriptor.source_path.clone(),
        source,
    })?;

    Ok(ArtifactSet {
        css: css?,
        minified_css: minified_css?,
        docs_json: variables_json.clone(),
        variables_json,
        type_declaration,
    })
}

/// Compile one source and write its five artifacts
pub fn compile_file(
    descriptor: &InputDescriptor,
    pipelines: &Pipelines,
    load_paths: &[PathBuf],
) -> Result<Vec<PathBuf>, BuildError> {
    let artifacts = build_artifacts(descriptor, pipelines, load_paths)?;
    write_artifacts(&artifacts, descriptor)
}

/// Compile one source, converting any error into a failed result
pub fn compile_job(
    descriptor: &InputDescriptor,
    pipelines: &Pipelines,
    load_paths: &[PathBuf],
    stats: &BuildStats,
) -> JobResult {
    let start = Instant::now();
    info!("Compiling {}", descriptor.source_path.display());

    let status = match compile_file(descriptor, pipelines, load_paths) {
        Ok(outputs) => {
            let bytes: u64 = outputs
                .iter()
                .filter_map(|path| fs::metadata(path).ok())
                .map(|meta| meta.len())
                .sum();
            stats.files_compiled.add(1);
            stats.artifacts_written.add(outputs.len() as u64);
            stats.bytes_written.add(bytes);
            JobStatus::Compiled { outputs }
        }
        Err(e) => JobStatus::Failed(e),
    };

    let duration = start.elapsed();
    match &status {
        JobStatus::Compiled { .. } => info!(
            "Compiled {} in {:.2}s",
            descriptor.source_path.display(),
            duration.as_secs_f64()
        ),
        JobStatus::Failed(e) => {
            stats.failures.add(1);
            error!("{}", failure_line(&descriptor.source_path, e));
        }
    }

    JobResult {
        source: descriptor.source_path.clone(),
        status,
        duration,
    }
}

/// Log line for a failed source; output-side errors only name the artifact
fn failure_line(source: &Path, err: &BuildError) -> String {
    format!("{}: {}", source.display(), error_chain(err))
}

/// Compile every descriptor in parallel. All tasks run to completion and one
/// result is returned per descriptor, in input order.
pub fn run<F>(
    descriptors: &[InputDescriptor],
    pipelines: &Pipelines,
    load_paths: &[PathBuf],
    stats: &BuildStats,
    on_complete: F,
) -> Vec<JobResult>
where
    F: Fn(&JobResult) + Sync,
{
    descriptors
        .par_iter()
        .map(|descriptor| {
            let result = compile_job(descriptor, pipelines, load_paths, stats);
            on_complete(&result);
            result
        })
        .collect()
}

/// Bootstrap the output directories and discover one family's sources
pub fn prepare_family(
    family: ThemeFamily,
    config: &Config,
) -> Result<Vec<InputDescriptor>, BuildError> {
    ensure_dir(&config.dest_dir)?;
    ensure_dir(&config.docs_dir)?;

    let source = FamilySource::new(family, &config.themes_dir);
    let sources = source.discover(config.target_theme.as_ref())?;
    debug!(
        "{} family: {} source(s) matching {}",
        family,
        sources.len(),
        source.pattern()
    );

    sources
        .iter()
        .map(|path| descriptor_for(path, config))
        .collect()
}

fn descriptor_for(path: &Path, config: &Config) -> Result<InputDescriptor, BuildError> {
    InputDescriptor::new(
        path,
        &config.dest_dir,
        &config.docs_dir,
        config.package_name.clone(),
    )
}

/// Collect and aggregate results from parallel jobs
pub fn collect_results(results: Vec<JobResult>) -> (Vec<JobResult>, bool, bool) {
    let mut all_results = Vec::with_capacity(results.len());
    let mut has_success = false;
    let mut has_failure = false;

    for result in results {
        if result.is_success() {
            has_success = true;
        } else {
            has_failure = true;
        }
        all_results.push(result);
    }

    (all_results, has_success, has_failure)
}
