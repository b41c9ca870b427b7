//! Handler file discovery and file-to-class name derivation.

use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::metadata::handler::NAMESPACE_SEPARATOR;

/// File name globs used when a directory lists none.
pub const DEFAULT_PATTERNS: [&str; 1] = ["*.rs"];

/// Normalizes a namespace to `Segment\Segment\` form.
pub fn normalize_namespace(namespace: &str) -> String {
    let trimmed = namespace
        .replace('/', "\\")
        .trim_matches(NAMESPACE_SEPARATOR)
        .to_string();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}{NAMESPACE_SEPARATOR}")
    }
}

fn slashed(path: &str) -> String {
    path.replace('\\', "/")
}

/// Fully-qualified class name for a handler file.
///
/// The path is made relative to `base_path`, its extension dropped and its
/// separators turned into namespace separators under `root_namespace`.
/// Both `/` and `\` separate path components, whatever the host platform.
pub fn class_name_from_path(path: &str, base_path: &str, root_namespace: &str) -> String {
    let path = slashed(path);
    let base = slashed(base_path).trim_matches('/').to_string();

    let relative = if base.is_empty() {
        path.as_str()
    } else {
        path.trim_start_matches('/')
            .strip_prefix(base.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .or_else(|| {
                path.find(&format!("/{base}/"))
                    .map(|index| &path[index + base.len() + 1..])
            })
            .unwrap_or(path.as_str())
    };

    let relative = relative.trim_matches('/');
    let without_extension = match relative.rfind('.') {
        Some(dot) if !relative[dot..].contains('/') && dot > relative.rfind('/').map_or(0, |s| s + 1) => {
            &relative[..dot]
        }
        _ => relative,
    };

    let class: Vec<&str> = without_extension
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    let separator = NAMESPACE_SEPARATOR.to_string();
    format!("{}{}", normalize_namespace(root_namespace), class.join(separator.as_str()))
}

fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|pattern| match Pattern::new(pattern) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "Ignoring invalid file pattern");
                None
            }
        })
        .collect()
}

/// Files under `directories` whose names match `patterns` (default `*.rs`)
/// and none of `not_patterns`, sorted by path. Missing directories are
/// skipped.
pub fn scan(directories: &[PathBuf], patterns: &[String], not_patterns: &[String]) -> Vec<PathBuf> {
    let include = if patterns.is_empty() {
        compile_patterns(&DEFAULT_PATTERNS.map(String::from))
    } else {
        compile_patterns(patterns)
    };
    let exclude = compile_patterns(not_patterns);

    let mut files: Vec<PathBuf> = directories
        .iter()
        .filter(|directory| {
            let exists = directory.is_dir();
            if !exists {
                tracing::debug!(directory = %directory.display(), "Handler directory does not exist");
            }
            exists
        })
        .flat_map(|directory| WalkDir::new(directory).into_iter().filter_map(|entry| entry.ok()))
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            include.iter().any(|p| p.matches(&name)) && !exclude.iter().any(|p| p.matches(&name))
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files.dedup();
    files
}

/// Path as a string with forward slashes.
pub fn display_path(path: &Path) -> String {
    slashed(&path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_class_name_from_path() {
        assert_eq!(
            class_name_from_path("app/Http/Controllers/PhotoController.rs", "app", "App"),
            "App\\Http\\Controllers\\PhotoController"
        );
        assert_eq!(
            class_name_from_path("/srv/site/app/Http/Admin/UserController.rs", "/srv/site/app/", "App\\"),
            "App\\Http\\Admin\\UserController"
        );
    }

    #[test]
    fn test_class_name_ignores_platform_separators() {
        let windows = class_name_from_path("C:\\site\\modules\\Blog\\PostController.rs", "C:\\site\\modules", "Modules/");
        let unix = class_name_from_path("C:/site/modules/Blog/PostController.rs", "C:/site/modules", "Modules");
        assert_eq!(windows, "Modules\\Blog\\PostController");
        assert_eq!(windows, unix);
    }

    #[test]
    fn test_class_name_base_found_inside_path() {
        assert_eq!(
            class_name_from_path("/abs/root/app/Http/PingController.rs", "app", "App"),
            "App\\Http\\PingController"
        );
    }

    #[test]
    fn test_normalize_namespace() {
        assert_eq!(normalize_namespace("App"), "App\\");
        assert_eq!(normalize_namespace("App/Http\\"), "App\\Http\\");
        assert_eq!(normalize_namespace(""), "");
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let root = std::env::temp_dir().join(format!("routing-scan-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(root.join("Admin")).unwrap();
        for file in ["ZController.rs", "AController.rs", "notes.md", "Admin/UserController.rs", "BaseHelper.rs"] {
            fs::write(root.join(file), "").unwrap();
        }

        let files = scan(
            &[root.clone(), root.join("missing")],
            &[],
            &["*Helper.rs".to_string()],
        );
        let names: Vec<String> = files
            .iter()
            .map(|p| display_path(p.strip_prefix(&root).unwrap()))
            .collect();
        assert_eq!(names, vec!["AController.rs", "Admin/UserController.rs", "ZController.rs"]);

        fs::remove_dir_all(&root).unwrap();
    }
}
