use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

use crate::scanner::language;

const MAX_FILE_SIZE: u64 = 2_000_000; // 2MB

/// Directories never worth analyzing, on top of the walker's hidden/ignore
/// filtering.
const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "__pycache__",
    ".git",
    ".venv",
    "venv",
    "env",
    "build",
    "dist",
    "target",
    "bin",
    "obj",
    ".next",
    ".cache",
];

/// Walk `root` (file or directory) and collect source files with recognized
/// extensions, in traversal order, capped at `max_files` when given.
pub fn collect_files(root: &Path, max_files: Option<usize>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .standard_filters(true)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.path().is_dir() && EXCLUDED_DIRS.contains(&name.as_ref()))
        })
        .build()
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .map(|e| e.into_path())
        .filter(|p| language::is_supported(p))
        .collect();

    if let Some(cap) = max_files {
        files.truncate(cap);
    }

    files
}

/// Read a candidate file's contents. Returns `None` for files that should be
/// skipped: unreadable, too large, or binary-looking. Never fatal.
pub fn read_source(path: &Path) -> Option<String> {
    if let Ok(metadata) = fs::metadata(path) {
        if metadata.len() > MAX_FILE_SIZE {
            eprintln!("⚠️  Skipping {} (larger than 2MB)", path.display());
            return None;
        }
    }

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("⚠️  Skipping unreadable file {}: {}", path.display(), e);
            return None;
        }
    };

    if content.contains('\0') {
        return None;
    }

    Some(content)
}

/// Identifier used in reports: the path relative to the analyzed root. When
/// the root is the file itself, the file name is the identifier.
pub fn relative_source(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().replace('\\', "/"),
        _ => path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = File::create(path).unwrap();
        writeln!(f, "print('hello')").unwrap();
    }

    #[test]
    fn collects_only_supported_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "app.py");
        touch(dir.path(), "lib.rs");
        touch(dir.path(), "README.md");
        touch(dir.path(), "data.csv");

        let files = collect_files(dir.path(), None);
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(files.len(), 2);
        assert!(names.contains(&"app.py".to_string()));
        assert!(names.contains(&"lib.rs".to_string()));
    }

    #[test]
    fn skips_excluded_and_hidden_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/main.py");
        touch(dir.path(), "node_modules/pkg/index.js");
        touch(dir.path(), "__pycache__/main.py");
        touch(dir.path(), ".hidden/secret.py");

        let files = collect_files(dir.path(), None);

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/main.py"));
    }

    #[test]
    fn max_file_cap_is_honored() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            touch(dir.path(), &format!("file{}.py", i));
        }

        assert_eq!(collect_files(dir.path(), Some(3)).len(), 3);
        assert_eq!(collect_files(dir.path(), None).len(), 10);
    }

    #[test]
    fn single_file_root_is_collected() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "only.py");

        let files = collect_files(&dir.path().join("only.py"), None);
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn binary_content_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.py");
        fs::write(&path, b"\x00\x01\x02").unwrap();

        assert!(read_source(&path).is_none());
    }

    #[test]
    fn relative_source_is_root_relative() {
        let root = Path::new("/proj");
        assert_eq!(
            relative_source(root, Path::new("/proj/src/app.py")),
            "src/app.py"
        );
        // A single-file root identifies itself by file name.
        let file = Path::new("/proj/app.py");
        assert_eq!(relative_source(file, file), "app.py");
    }
}
