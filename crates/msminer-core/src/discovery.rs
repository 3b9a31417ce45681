use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::DiscoveryConfig;

fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Recursively find regular files under `root` whose file name matches
/// `pattern`, returned as `/`-separated paths relative to `root`.
///
/// Traversal is sorted by file name so results are stable across runs.
/// Unreadable entries are skipped.
pub fn locate(root: &Path, pattern: &str) -> Vec<String> {
    locate_excluding(root, pattern, &GlobSet::empty())
}

fn locate_excluding(root: &Path, pattern: &str, exclude: &GlobSet) -> Vec<String> {
    debug!(root = %root.display(), pattern, "locating descriptors");
    let matcher = match Glob::new(pattern) {
        Ok(glob) => glob.compile_matcher(),
        Err(e) => {
            debug!("invalid descriptor pattern {pattern:?}: {e}");
            return Vec::new();
        }
    };

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| matcher.is_match(Path::new(e.file_name())))
        .filter_map(|e| {
            let rel = e.path().strip_prefix(root).ok()?;
            let rel = rel.to_string_lossy().replace('\\', "/");
            (!exclude.is_match(&rel)).then_some(rel)
        })
        .collect()
}

/// Locate descriptors for every configured file name, in configuration order.
pub fn locate_descriptors(root: &Path, config: &DiscoveryConfig) -> Vec<String> {
    let exclude = build_globset(&config.exclude_patterns);
    config
        .filenames
        .iter()
        .flat_map(|name| locate_excluding(root, name, &exclude))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("deploy/dev")).unwrap();
        fs::create_dir_all(root.join("vendor/lib")).unwrap();
        fs::create_dir_all(root.join("docker-compose.yml.d")).unwrap();
        fs::write(root.join("docker-compose.yml"), "services: {}\n").unwrap();
        fs::write(root.join("deploy/dev/docker-compose.yaml"), "services: {}\n").unwrap();
        fs::write(root.join("vendor/lib/docker-compose.yml"), "services: {}\n").unwrap();
        fs::write(root.join("deploy/compose.yml"), "services: {}\n").unwrap();
        dir
    }

    #[test]
    fn test_locate_exact_file_name() {
        let dir = project();
        assert_eq!(
            locate(dir.path(), "docker-compose.yml"),
            vec!["docker-compose.yml", "vendor/lib/docker-compose.yml"]
        );
    }

    #[test]
    fn test_locate_glob_pattern() {
        let dir = project();
        assert_eq!(
            locate(dir.path(), "*compose.y*ml"),
            vec![
                "deploy/compose.yml",
                "deploy/dev/docker-compose.yaml",
                "docker-compose.yml",
                "vendor/lib/docker-compose.yml",
            ]
        );
    }

    #[test]
    fn test_locate_missing_root_is_empty() {
        assert!(locate(Path::new("/definitely/not/here"), "docker-compose.yml").is_empty());
    }

    #[test]
    fn test_locate_descriptors_in_config_order_with_excludes() {
        let dir = project();
        let config = DiscoveryConfig {
            exclude_patterns: vec!["vendor/**".to_string()],
            ..DiscoveryConfig::default()
        };
        assert_eq!(
            locate_descriptors(dir.path(), &config),
            vec!["docker-compose.yml", "deploy/dev/docker-compose.yaml"]
        );
    }
}
