use std::path::Path;

/// Directory names whose whole subtree is left out of the repository context.
pub const IGNORED_DIRS: [&str; 3] = ["node_modules", "venv", "__pycache__"];

/// File extensions read into the repository context.
pub const SUPPORTED_EXTENSIONS: [&str; 12] = [
    "py", "js", "jsx", "ts", "tsx", "html", "css", "java", "cpp", "json", "sql", "md",
];

pub fn is_supported_file(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    SUPPORTED_EXTENSIONS.contains(&ext)
}

/// Hidden directories and dependency/bytecode caches are pruned at the node.
pub fn is_ignored_dir(name: &str) -> bool {
    name.starts_with('.') || IGNORED_DIRS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_files() {
        assert!(is_supported_file(Path::new("src/app.py")));
        assert!(is_supported_file(Path::new("web/index.tsx")));
        assert!(is_supported_file(Path::new("README.md")));
        assert!(is_supported_file(Path::new("config/.eslintrc.json")));
        assert!(!is_supported_file(Path::new("main.rs")));
        assert!(!is_supported_file(Path::new("logo.png")));
        assert!(!is_supported_file(Path::new("Makefile")));
        // matching is case-sensitive
        assert!(!is_supported_file(Path::new("NOTES.MD")));
    }

    #[test]
    fn test_ignored_dirs() {
        assert!(is_ignored_dir(".git"));
        assert!(is_ignored_dir(".venv"));
        assert!(is_ignored_dir("node_modules"));
        assert!(is_ignored_dir("venv"));
        assert!(is_ignored_dir("__pycache__"));
        assert!(!is_ignored_dir("src"));
        assert!(!is_ignored_dir("vendor"));
    }
}
