use std::path::Path;

/// Extensions the collector will pick up.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "py", "java", "js", "ts", "jsx", "tsx", "go", "rb", "php", "cpp", "c", "cs", "swift", "kt",
    "rs", "scala",
];

pub fn is_supported(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Language hint for the prompt, derived from the file extension.
pub fn language_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("py") => "Python",
        Some("java") => "Java",
        Some("js") => "JavaScript",
        Some("ts") => "TypeScript",
        Some("jsx") => "JavaScript React",
        Some("tsx") => "TypeScript React",
        Some("go") => "Go",
        Some("rb") => "Ruby",
        Some("php") => "PHP",
        Some("cpp") => "C++",
        Some("c") => "C",
        Some("cs") => "C#",
        Some("swift") => "Swift",
        Some("kt") => "Kotlin",
        Some("rs") => "Rust",
        Some("scala") => "Scala",
        _ => "Unknown",
    }
}
