//! Theme families, theme names, and per-file input descriptors.
//!
//! Provides type-safe wrappers for theme names with validation and the
//! deterministic mapping from a source file to its five output paths.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::BuildError;

/// Prefix prepended to every artifact file name
pub const ARTIFACT_PREFIX: &str = "eui_";

/// Theme name selected through `TARGET_THEME` (e.g., "light", "dark")
/// Newtype wrapper for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThemeName(Arc<str>);

impl ThemeName {
    /// Create a validated ThemeName, returning error for invalid format
    /// Allowed characters: ASCII letters, digits, `_` and `-`
    pub fn validated(s: &str) -> Result<Self, String> {
        if Self::validate_format(s) {
            Ok(Self(Arc::from(s)))
        } else {
            Err(format!(
                "invalid theme name '{}': expected letters, digits, '_' or '-' (e.g., light)",
                s
            ))
        }
    }

    #[inline]
    fn validate_format(s: &str) -> bool {
        !s.is_empty()
            && s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    }

    /// Get the inner string reference
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Family of theme sources compiled in one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeFamily {
    /// `legacy/legacy_*.scss`
    Legacy,
    /// `amsterdam/theme_*.scss`
    Named,
}

impl ThemeFamily {
    /// Families in the order they are compiled
    pub const ALL: [ThemeFamily; 2] = [ThemeFamily::Legacy, ThemeFamily::Named];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeFamily::Legacy => "legacy",
            ThemeFamily::Named => "named",
        }
    }

    /// Directory below the themes root holding this family's sources
    #[inline]
    pub fn directory(&self) -> &'static str {
        match self {
            ThemeFamily::Legacy => "legacy",
            ThemeFamily::Named => "amsterdam",
        }
    }

    /// File name glob for this family's sources
    #[inline]
    pub fn file_pattern(&self) -> &'static str {
        match self {
            ThemeFamily::Legacy => "legacy_*.scss",
            ThemeFamily::Named => "theme_*.scss",
        }
    }

    /// The only source a theme filter accepts in this family.
    ///
    /// Legacy sources are never named after a theme, so a set filter leaves
    /// the legacy family empty.
    pub fn filtered_source(&self, themes_dir: &Path, theme: &ThemeName) -> Option<PathBuf> {
        match self {
            ThemeFamily::Legacy => None,
            ThemeFamily::Named => Some(
                themes_dir
                    .join(self.directory())
                    .join(format!("theme_{}.scss", theme.as_str())),
            ),
        }
    }
}

impl fmt::Display for ThemeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source file and the five artifact paths derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDescriptor {
    pub source_path: PathBuf,
    pub output_css_path: PathBuf,
    pub output_min_css_path: PathBuf,
    pub output_vars_path: PathBuf,
    pub output_types_path: PathBuf,
    pub output_docs_vars_path: PathBuf,
    /// Package name shared by every descriptor of a run
    pub package_name: Arc<str>,
}

impl InputDescriptor {
    /// Derive output paths from the source file stem
    pub fn new(
        source_path: &Path,
        destination_dir: &Path,
        docs_dir: &Path,
        package_name: Arc<str>,
    ) -> Result<Self, BuildError> {
        let stem = source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BuildError::InvalidSource {
                path: source_path.to_path_buf(),
            })?;
        let base = format!("{ARTIFACT_PREFIX}{stem}");

        Ok(Self {
            source_path: source_path.to_path_buf(),
            output_css_path: destination_dir.join(format!("{base}.css")),
            output_min_css_path: destination_dir.join(format!("{base}.min.css")),
            output_vars_path: destination_dir.join(format!("{base}.json")),
            output_types_path: destination_dir.join(format!("{base}.json.d.ts")),
            output_docs_vars_path: docs_dir.join(format!("{base}.json")),
            package_name,
        })
    }

    /// Module specifier under which the variable JSON is imported
    pub fn json_module_path(&self) -> String {
        let vars = self.output_vars_path.to_string_lossy().replace('\\', "/");
        format!("{}/{}", self.package_name, vars.trim_start_matches("./"))
    }

    /// All five output paths in write order
    pub fn output_paths(&self) -> [&Path; 5] {
        [
            &self.output_css_path,
            &self.output_min_css_path,
            &self.output_vars_path,
            &self.output_types_path,
            &self.output_docs_vars_path,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== ThemeName tests ====================

    #[test]
    fn test_theme_name_valid() {
        let name = ThemeName::validated("dark").unwrap();
        assert_eq!(name.as_str(), "dark");
        assert_eq!(name.to_string(), "dark");
    }

    #[test]
    fn test_theme_name_allows_separators() {
        assert!(ThemeName::validated("high_contrast-2").is_ok());
    }

    #[test]
    fn test_theme_name_rejects_path_characters() {
        assert!(ThemeName::validated("../light").is_err());
        assert!(ThemeName::validated("a/b").is_err());
        assert!(ThemeName::validated("").is_err());
    }

    // ==================== ThemeFamily tests ====================

    #[test]
    fn test_family_names() {
        assert_eq!(ThemeFamily::Legacy.to_string(), "legacy");
        assert_eq!(ThemeFamily::Named.as_str(), "named");
    }

    #[test]
    fn test_filtered_source_named() {
        let theme = ThemeName::validated("foo").unwrap();
        let path = ThemeFamily::Named.filtered_source(Path::new("src/themes"), &theme);
        assert_eq!(
            path,
            Some(PathBuf::from("src/themes/amsterdam/theme_foo.scss"))
        );
    }

    #[test]
    fn test_filtered_source_legacy_is_none() {
        let theme = ThemeName::validated("foo").unwrap();
        assert_eq!(
            ThemeFamily::Legacy.filtered_source(Path::new("src/themes"), &theme),
            None
        );
    }

    // ==================== InputDescriptor tests ====================

    fn descriptor(source: &str) -> InputDescriptor {
        InputDescriptor::new(
            Path::new(source),
            Path::new("dist"),
            Path::new("docs/_json"),
            Arc::from("@elastic/eui"),
        )
        .unwrap()
    }

    #[test]
    fn test_descriptor_paths() {
        let d = descriptor("src/themes/amsterdam/theme_light.scss");

        assert_eq!(d.output_css_path, PathBuf::from("dist/eui_theme_light.css"));
        assert_eq!(
            d.output_min_css_path,
            PathBuf::from("dist/eui_theme_light.min.css")
        );
        assert_eq!(d.output_vars_path, PathBuf::from("dist/eui_theme_light.json"));
        assert_eq!(
            d.output_types_path,
            PathBuf::from("dist/eui_theme_light.json.d.ts")
        );
        assert_eq!(
            d.output_docs_vars_path,
            PathBuf::from("docs/_json/eui_theme_light.json")
        );
    }

    #[test]
    fn test_descriptor_is_deterministic() {
        assert_eq!(
            descriptor("src/themes/legacy/legacy_dark.scss"),
            descriptor("src/themes/legacy/legacy_dark.scss")
        );
    }

    #[test]
    fn test_descriptor_json_module_path() {
        let d = descriptor("src/themes/amsterdam/theme_dark.scss");
        assert_eq!(d.json_module_path(), "@elastic/eui/dist/eui_theme_dark.json");
    }

    #[test]
    fn test_descriptor_output_paths_order() {
        let d = descriptor("theme_light.scss");
        let paths = d.output_paths();
        assert_eq!(paths.len(), 5);
        assert!(paths[0].ends_with("eui_theme_light.css"));
        assert!(paths[4].starts_with("docs/_json"));
    }

    #[test]
    fn test_descriptor_without_file_name() {
        let result = InputDescriptor::new(
            Path::new("/"),
            Path::new("dist"),
            Path::new("docs"),
            Arc::from("pkg"),
        );
        assert!(matches!(result, Err(BuildError::InvalidSource { .. })));
    }
}
