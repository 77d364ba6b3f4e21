//! Fragment discovery.
//!
//! Walks a root directory for `<domain>.sdl` / `<domain>.sdl.graphql` files.
//! Paths are sorted before parsing so the discovery order, and therefore
//! every error attribution, is stable across runs and platforms.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::BuildError;
use crate::fragment::SchemaFragment;
use crate::naming::domain_from_file_name;

/// Discovers schema fragments beneath a root directory.
#[derive(Debug, Clone)]
pub struct FragmentLoader {
    root: PathBuf,
}

impl FragmentLoader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns every fragment under the root, in sorted path order.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Discovery`] if the root is not a directory, a
    /// file cannot be read or parsed, or two files map to the same domain.
    pub fn discover(&self) -> Result<Vec<SchemaFragment>, BuildError> {
        if !self.root.is_dir() {
            return Err(BuildError::discovery_at(
                &self.root,
                "fragment root is not a directory",
            ));
        }

        let mut files = Vec::new();
        collect_fragment_files(&self.root, &mut files)?;
        files.sort();

        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        let mut fragments = Vec::with_capacity(files.len());

        for (domain, path) in files
            .into_iter()
            .filter_map(|path| fragment_domain(&path).map(|d| (d, path)))
        {
            if let Some(previous) = seen.get(&domain) {
                return Err(BuildError::discovery_at(
                    &path,
                    format!(
                        "domain '{domain}' already declared by {}",
                        previous.display()
                    ),
                ));
            }

            let source = std::fs::read_to_string(&path).map_err(|e| {
                BuildError::discovery_at(&path, format!("cannot read fragment: {e}"))
            })?;
            let fragment = SchemaFragment::parse(domain.clone(), source)
                .map_err(|e| e.with_path(&path))?
                .with_path(&path);

            debug!(
                domain = %domain,
                path = %path.display(),
                types = fragment.types().len(),
                "Schema fragment loaded"
            );
            seen.insert(domain, path);
            fragments.push(fragment);
        }

        info!(
            root = %self.root.display(),
            fragments = fragments.len(),
            "Schema fragment discovery complete"
        );
        Ok(fragments)
    }
}

fn fragment_domain(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    domain_from_file_name(file_name).map(str::to_string)
}

fn collect_fragment_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), BuildError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| BuildError::discovery_at(dir, format!("cannot list directory: {e}")))?;

    for entry in entries {
        let entry = entry
            .map_err(|e| BuildError::discovery_at(dir, format!("cannot list directory: {e}")))?;
        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if hidden {
            continue;
        }
        if path.is_dir() {
            collect_fragment_files(&path, out)?;
        } else if fragment_domain(&path).is_some() {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_sorted_and_nested() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("trucks.sdl"), "type Truck { id: ID }").unwrap();
        fs::write(dir.path().join("cars.sdl.graphql"), "type Car { id: ID }").unwrap();
        fs::write(dir.path().join("nested/owners.sdl"), "type Owner { id: ID }").unwrap();
        fs::write(dir.path().join("README.md"), "not a fragment").unwrap();

        let fragments = FragmentLoader::new(dir.path()).discover().unwrap();
        let domains: Vec<&str> = fragments.iter().map(SchemaFragment::domain).collect();
        assert_eq!(domains, ["cars", "owners", "trucks"]);
        assert!(fragments[1].path().unwrap().ends_with("nested/owners.sdl"));
    }

    #[test]
    fn test_duplicate_domain_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("cars.sdl"), "type Car { id: ID }").unwrap();
        fs::write(dir.path().join("a/cars.sdl"), "type Car { id: ID }").unwrap();

        let err = FragmentLoader::new(dir.path()).discover().unwrap_err();
        assert!(err.to_string().contains("already declared"));
    }

    #[test]
    fn test_malformed_fragment_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cars.sdl"), "type Car {").unwrap();

        let err = FragmentLoader::new(dir.path()).discover().unwrap_err();
        match err {
            BuildError::Discovery { path, .. } => {
                assert!(path.unwrap().ends_with("cars.sdl"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = FragmentLoader::new(dir.path().join("missing"))
            .discover()
            .unwrap_err();
        assert!(matches!(err, BuildError::Discovery { .. }));
    }
}
