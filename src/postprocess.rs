//! CSS postprocessing pipelines built on lightningcss.
//!
//! A [`PipelineConfig`] is an immutable list of stages. The minified variant
//! is derived from the base one with [`PipelineConfig::with_stage`], and both
//! are applied to the same rendered CSS.
//!
//! Both variants go through the lightningcss minify pass, which is where
//! prefixes are added, so the base stylesheet also has rules merged and
//! values shortened. Unparsable rules and declarations (old IE hacks such
//! as `*zoom`) are dropped with a warning instead of failing the file.

use std::path::Path;
use std::sync::{Arc, RwLock};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use log::warn;

use crate::error::BuildError;

/// Encode a browser version the way lightningcss expects (`major.minor.patch`)
const fn version(major: u32, minor: u32) -> u32 {
    (major << 16) | (minor << 8)
}

/// Browsers the stylesheets are prefixed for
pub const DEFAULT_BROWSERS: Browsers = Browsers {
    android: Some(version(81, 0)),
    chrome: Some(version(80, 0)),
    edge: Some(version(80, 0)),
    firefox: Some(version(78, 0)),
    ie: None,
    ios_saf: Some(version(13, 0)),
    opera: Some(version(67, 0)),
    safari: Some(version(13, 0)),
    samsung: Some(version(12, 0)),
};

/// One step of a postprocessing pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Vendor prefixing and syntax lowering for the given browsers
    Prefix(Browsers),
    /// Compact output
    Minify,
}

/// Immutable, cheaply cloned list of stages
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    stages: Arc<[Stage]>,
}

impl PipelineConfig {
    pub fn new(stages: impl Into<Vec<Stage>>) -> Self {
        Self {
            stages: Arc::from(stages.into()),
        }
    }

    /// Stages shared by every stylesheet variant
    pub fn base(browsers: Browsers) -> Self {
        Self::new(vec![Stage::Prefix(browsers)])
    }

    /// A new configuration with `stage` appended; `self` is unchanged
    pub fn with_stage(&self, stage: Stage) -> Self {
        let mut stages = self.stages.to_vec();
        stages.push(stage);
        Self::new(stages)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    fn browsers(&self) -> Option<Browsers> {
        self.stages().iter().rev().find_map(|stage| match stage {
            Stage::Prefix(browsers) => Some(*browsers),
            Stage::Minify => None,
        })
    }

    fn minifies(&self) -> bool {
        self.stages().contains(&Stage::Minify)
    }
}

/// The two variants every source is postprocessed with
#[derive(Debug, Clone)]
pub struct Pipelines {
    pub base: PipelineConfig,
    pub minified: PipelineConfig,
}

impl Pipelines {
    pub fn new(browsers: Browsers) -> Self {
        let base = PipelineConfig::base(browsers);
        let minified = base.with_stage(Stage::Minify);
        Self { base, minified }
    }
}

impl Default for Pipelines {
    fn default() -> Self {
        Self::new(DEFAULT_BROWSERS)
    }
}

/// Apply `config` to `css`. `filename` is only used in diagnostics.
pub fn postprocess(css: &str, config: &PipelineConfig, filename: &Path) -> Result<String, BuildError> {
    let transform_error = |message: String| BuildError::Transform {
        path: filename.to_path_buf(),
        message,
    };

    let warnings = Arc::new(RwLock::new(Vec::new()));
    let options = ParserOptions {
        filename: filename.to_string_lossy().into_owned(),
        error_recovery: true,
        warnings: Some(Arc::clone(&warnings)),
        ..ParserOptions::default()
    };
    let mut stylesheet =
        StyleSheet::parse(css, options).map_err(|e| transform_error(e.to_string()))?;
    if let Ok(warnings) = warnings.read() {
        for warning in warnings.iter() {
            warn!("{}: {}", filename.display(), warning);
        }
    }

    let targets = config.browsers().map(Targets::from).unwrap_or_default();
    if config.browsers().is_some() || config.minifies() {
        stylesheet
            .minify(MinifyOptions {
                targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| transform_error(e.to_string()))?;
    }

    let printed = stylesheet
        .to_css(PrinterOptions {
            minify: config.minifies(),
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| transform_error(e.to_string()))?;

    Ok(printed.code)
}
