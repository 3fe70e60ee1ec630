use std::path::{Path, PathBuf};

use glob::glob;

use crate::error::BuildError;
use crate::theme::{ThemeFamily, ThemeName};

/// Expand a glob pattern into the matching source files, sorted.
///
/// When `filter` is given only paths accepted by it are kept. No matches is
/// not an error.
#[must_use = "this returns the discovered sources which should be compiled"]
pub fn discover(
    pattern: &str,
    filter: Option<&dyn Fn(&Path) -> bool>,
) -> Result<Vec<PathBuf>, BuildError> {
    let entries = glob(pattern).map_err(|source| BuildError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|source| BuildError::Discovery {
            pattern: pattern.to_string(),
            source,
        })?;

        if !path.is_file() {
            continue;
        }
        if let Some(accept) = filter {
            if !accept(&path) {
                continue;
            }
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}

/// A theme family rooted at a themes directory
#[derive(Debug, Clone)]
pub struct FamilySource {
    pub family: ThemeFamily,
    pub themes_dir: PathBuf,
}

impl FamilySource {
    pub fn new(family: ThemeFamily, themes_dir: impl Into<PathBuf>) -> Self {
        Self {
            family,
            themes_dir: themes_dir.into(),
        }
    }

    /// Glob pattern for this family's sources
    pub fn pattern(&self) -> String {
        self.themes_dir
            .join(self.family.directory())
            .join(self.family.file_pattern())
            .to_string_lossy()
            .into_owned()
    }

    /// Discover this family's sources, restricted to `theme` when set
    pub fn discover(&self, theme: Option<&ThemeName>) -> Result<Vec<PathBuf>, BuildError> {
        let pattern = self.pattern();

        let Some(theme) = theme else {
            return discover(&pattern, None);
        };

        let expected = self.family.filtered_source(&self.themes_dir, theme);
        let accept = move |path: &Path| expected.as_deref() == Some(path);
        discover(&pattern, Some(&accept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_themes(temp: &TempDir) -> PathBuf {
        let themes = temp.path().join("themes");
        let legacy = themes.join("legacy");
        let named = themes.join("amsterdam");
        fs::create_dir_all(&legacy).unwrap();
        fs::create_dir_all(&named).unwrap();

        fs::write(legacy.join("legacy_light.scss"), "$a: 1;").unwrap();
        fs::write(legacy.join("legacy_dark.scss"), "$a: 2;").unwrap();
        fs::write(named.join("theme_light.scss"), "$a: 3;").unwrap();
        fs::write(named.join("theme_dark.scss"), "$a: 4;").unwrap();
        fs::write(named.join("theme_foo.scss"), "$a: 5;").unwrap();
        fs::write(named.join("_partial.scss"), "$b: 1;").unwrap();
        themes
    }

    // ==================== discover tests ====================

    #[test]
    fn test_discover_sorted_matches() {
        let temp = TempDir::new().unwrap();
        let themes = create_themes(&temp);
        let pattern = themes.join("amsterdam").join("theme_*.scss");

        let files = discover(&pattern.to_string_lossy(), None).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["theme_dark.scss", "theme_foo.scss", "theme_light.scss"]
        );
    }

    #[test]
    fn test_discover_empty_is_ok() {
        let temp = TempDir::new().unwrap();
        let pattern = temp.path().join("nothing_*.scss");

        let files = discover(&pattern.to_string_lossy(), None).unwrap();

        assert!(files.is_empty());
    }

    #[test]
    fn test_discover_with_filter() {
        let temp = TempDir::new().unwrap();
        let themes = create_themes(&temp);
        let pattern = themes.join("legacy").join("*.scss");

        let accept = |p: &Path| p.to_string_lossy().contains("dark");
        let files = discover(&pattern.to_string_lossy(), Some(&accept)).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("legacy_dark.scss"));
    }

    #[test]
    fn test_discover_skips_directories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("theme_dir.scss")).unwrap();
        fs::write(temp.path().join("theme_file.scss"), "").unwrap();
        let pattern = temp.path().join("theme_*.scss");

        let files = discover(&pattern.to_string_lossy(), None).unwrap();

        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_discover_invalid_pattern() {
        let result = discover("src/themes/[", None);
        assert!(matches!(result, Err(BuildError::InvalidPattern { .. })));
    }

    // ==================== FamilySource tests ====================

    #[test]
    fn test_family_pattern() {
        let source = FamilySource::new(ThemeFamily::Named, "src/themes");
        assert_eq!(
            PathBuf::from(source.pattern()),
            PathBuf::from("src/themes/amsterdam/theme_*.scss")
        );
    }

    #[test]
    fn test_family_discover_unfiltered() {
        let temp = TempDir::new().unwrap();
        let themes = create_themes(&temp);

        let legacy = FamilySource::new(ThemeFamily::Legacy, &themes)
            .discover(None)
            .unwrap();
        let named = FamilySource::new(ThemeFamily::Named, &themes)
            .discover(None)
            .unwrap();

        assert_eq!(legacy.len(), 2);
        assert_eq!(named.len(), 3);
    }

    #[test]
    fn test_family_discover_filter_asymmetry() {
        let temp = TempDir::new().unwrap();
        let themes = create_themes(&temp);
        let theme = ThemeName::validated("foo").unwrap();

        let legacy = FamilySource::new(ThemeFamily::Legacy, &themes)
            .discover(Some(&theme))
            .unwrap();
        let named = FamilySource::new(ThemeFamily::Named, &themes)
            .discover(Some(&theme))
            .unwrap();

        assert!(legacy.is_empty());
        assert_eq!(named.len(), 1);
        assert!(named[0].ends_with("amsterdam/theme_foo.scss"));
    }

    #[test]
    fn test_family_discover_filter_no_match() {
        let temp = TempDir::new().unwrap();
        let themes = create_themes(&temp);
        let theme = ThemeName::validated("missing").unwrap();

        let named = FamilySource::new(ThemeFamily::Named, &themes)
            .discover(Some(&theme))
            .unwrap();

        assert!(named.is_empty());
    }
}
