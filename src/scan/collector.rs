//! Walks a project tree and selects the files worth scanning.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::CancelFlag;

/// Directory names that are never descended into, at any depth.
const EXCLUDED_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", "coverage"];

/// Extension used when the language is not in the table.
const DEFAULT_EXTENSION: &str = "js";

/// Source extensions scanned for a given language.
pub fn extensions_for(language: &str) -> &'static [&'static str] {
    match language.to_lowercase().as_str() {
        "typescript" => &["ts", "tsx"],
        "javascript" => &["js", "jsx", "mjs", "cjs"],
        "python" => &["py"],
        "java" => &["java"],
        "go" => &["go"],
        "rust" => &["rs"],
        "ruby" => &["rb"],
        "php" => &["php"],
        "csharp" => &["cs"],
        _ => &[DEFAULT_EXTENSION],
    }
}

/// Collect the scannable files under `root` for `language`.
///
/// Excluded directories are pruned before descent. Entries the walker
/// cannot read (permissions, broken symlinks) are logged and skipped; a
/// local failure never aborts the walk. The walk stops early once `cancel`
/// is set.
pub fn collect(root: &Path, language: &str, cancel: &CancelFlag) -> Vec<PathBuf> {
    let extensions = extensions_for(language);
    let mut files = Vec::new();

    // Sorted traversal keeps the scan set, and therefore report order,
    // stable across runs.
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| EXCLUDED_DIRS.contains(&name)))
        });

    for entry in walker {
        if cancel.is_cancelled() {
            break;
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches_language = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if matches_language {
            files.push(entry.into_path());
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn collects_only_matching_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/app.ts"));
        touch(&dir.path().join("src/util.tsx"));
        touch(&dir.path().join("src/legacy.js"));
        touch(&dir.path().join("README.md"));

        let mut files = collect(dir.path(), "typescript", &CancelFlag::new());
        files.sort();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["app.ts", "util.tsx"]);
    }

    #[test]
    fn excluded_directories_are_pruned_at_any_depth() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/ok.ts"));
        touch(&dir.path().join("node_modules/pkg/index.ts"));
        touch(&dir.path().join("src/dist/bundle.ts"));
        touch(&dir.path().join("a/b/coverage/report.ts"));
        touch(&dir.path().join("a/.git/hook.ts"));

        let files = collect(dir.path(), "typescript", &CancelFlag::new());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/ok.ts"));
    }

    #[test]
    fn unknown_language_falls_back_to_default_extension() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("main.js"));
        touch(&dir.path().join("main.kt"));

        let files = collect(dir.path(), "kotlin", &CancelFlag::new());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("main.js"));
    }

    #[test]
    fn cancelled_walk_returns_early() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.ts"));
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert!(collect(dir.path(), "typescript", &cancel).is_empty());
    }

    #[test]
    fn missing_root_is_not_fatal() {
        let files = collect(
            Path::new("/nonexistent/definitely/not/here"),
            "typescript",
            &CancelFlag::new(),
        );
        assert!(files.is_empty());
    }
}
