//! CLI configuration and runtime settings for theme compilation.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use crate::postprocess::Pipelines;
use crate::theme::{ThemeFamily, ThemeName};

/// Compile SCSS themes into CSS, variable JSON and type declarations
#[derive(Parser, Debug)]
#[command(name = "compile-themes")]
#[command(version)]
#[command(about = "Compile SCSS theme sources into CSS, JSON variables and type declarations")]
pub struct Cli {
    /// Package name used in the declared module path (e.g., @elastic/eui)
    pub package_name: String,

    /// Root directory of the theme families
    #[arg(long, default_value = "src/themes")]
    pub themes_dir: PathBuf,

    /// Directory receiving the build artifacts
    #[arg(long, default_value = "dist")]
    pub dest: PathBuf,

    /// Directory receiving the documentation copy of the variables
    #[arg(long, default_value = "src-docs/src/views/theme/_json")]
    pub docs_dir: PathBuf,

    /// Additional Sass load paths
    #[arg(short = 'I', long = "load-path")]
    pub load_paths: Vec<PathBuf>,

    /// Only compile the named theme (e.g., light)
    #[arg(long, env = "TARGET_THEME")]
    pub target_theme: Option<String>,

    /// Number of parallel workers
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub jobs: usize,

    /// Exit with a nonzero code when any file fails
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Runtime configuration parsed from CLI
#[derive(Debug, Clone)]
pub struct Config {
    /// Package name shared by every descriptor
    pub package_name: Arc<str>,
    pub themes_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub load_paths: Vec<PathBuf>,
    /// Theme filter (None = every source of every family)
    pub target_theme: Option<ThemeName>,
    /// Number of parallel workers
    pub jobs: usize,
    pub strict: bool,
    pub verbose: bool,
    /// Base and minified postprocessing pipelines
    pub pipelines: Pipelines,
}

impl Config {
    /// Create Config from CLI arguments
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        if cli.package_name.trim().is_empty() {
            anyhow::bail!("package name must not be empty");
        }

        // Empty TARGET_THEME means no filter
        let target_theme = match cli.target_theme.as_deref() {
            None | Some("") => None,
            Some(name) => match ThemeName::validated(name) {
                Ok(theme) => Some(theme),
                Err(msg) => anyhow::bail!(msg),
            },
        };

        Ok(Config {
            package_name: Arc::from(cli.package_name),
            themes_dir: cli.themes_dir,
            dest_dir: cli.dest,
            docs_dir: cli.docs_dir,
            load_paths: cli.load_paths,
            target_theme,
            jobs: cli.jobs.max(1),
            strict: cli.strict,
            verbose: cli.verbose,
            pipelines: Pipelines::default(),
        })
    }

    /// Families compiled in one run
    pub fn families(&self) -> &'static [ThemeFamily] {
        &ThemeFamily::ALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_cli(target_theme: Option<&str>, jobs: usize, strict: bool, verbose: bool) -> Cli {
        Cli {
            package_name: "@elastic/eui".to_string(),
            themes_dir: PathBuf::from("src/themes"),
            dest: PathBuf::from("dist"),
            docs_dir: PathBuf::from("docs/_json"),
            load_paths: Vec::new(),
            target_theme: target_theme.map(str::to_string),
            jobs,
            strict,
            verbose,
        }
    }

    // ==================== Cli parsing tests ====================

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["compile-themes", "@elastic/eui"]).unwrap();

        assert_eq!(cli.package_name, "@elastic/eui");
        assert_eq!(cli.themes_dir, PathBuf::from("src/themes"));
        assert_eq!(cli.dest, PathBuf::from("dist"));
        assert_eq!(
            cli.docs_dir,
            PathBuf::from("src-docs/src/views/theme/_json")
        );
        assert!(cli.load_paths.is_empty());
        assert!(!cli.strict);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_missing_package_name() {
        let err = Cli::try_parse_from(["compile-themes"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_load_paths_repeatable() {
        let cli = Cli::try_parse_from([
            "compile-themes",
            "pkg",
            "-I",
            "node_modules",
            "--load-path",
            "vendor/scss",
        ])
        .unwrap();

        assert_eq!(
            cli.load_paths,
            vec![PathBuf::from("node_modules"), PathBuf::from("vendor/scss")]
        );
    }

    // ==================== Config::from_cli tests ====================

    #[test]
    fn test_config_from_cli_basic() {
        let config = Config::from_cli(make_cli(None, 4, false, false)).unwrap();

        assert_eq!(&*config.package_name, "@elastic/eui");
        assert_eq!(config.dest_dir, PathBuf::from("dist"));
        assert_eq!(config.docs_dir, PathBuf::from("docs/_json"));
        assert!(config.target_theme.is_none());
        assert_eq!(config.jobs, 4);
        assert!(!config.strict);
    }

    #[test]
    fn test_config_from_cli_target_theme() {
        let config = Config::from_cli(make_cli(Some("dark"), 4, false, false)).unwrap();

        assert_eq!(config.target_theme.unwrap().as_str(), "dark");
    }

    #[test]
    fn test_config_from_cli_empty_target_theme() {
        let config = Config::from_cli(make_cli(Some(""), 4, false, false)).unwrap();

        assert!(config.target_theme.is_none());
    }

    #[test]
    fn test_config_from_cli_invalid_target_theme() {
        let result = Config::from_cli(make_cli(Some("../light"), 4, false, false));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_from_cli_jobs_minimum_one() {
        let config = Config::from_cli(make_cli(None, 0, false, false)).unwrap();

        assert_eq!(config.jobs, 1);
    }

    #[test]
    fn test_config_from_cli_flags() {
        let config = Config::from_cli(make_cli(None, 2, true, true)).unwrap();

        assert!(config.strict);
        assert!(config.verbose);
    }

    #[test]
    fn test_config_from_cli_blank_package_name() {
        let mut cli = make_cli(None, 4, false, false);
        cli.package_name = "  ".to_string();

        assert!(Config::from_cli(cli).is_err());
    }

    #[test]
    fn test_config_families() {
        let config = Config::from_cli(make_cli(None, 4, false, false)).unwrap();

        assert_eq!(
            config.families(),
            &[ThemeFamily::Legacy, ThemeFamily::Named]
        );
    }
}
