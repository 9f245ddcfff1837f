//! RECORD-driven removal of an installed distribution.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use wheelcheck_core::name::normalize_name;
use wheelcheck_core::{Category, Scheme};

use crate::error::{io_error, InstallError, Result};
use crate::record::parse_record;

#[derive(Debug, Clone, Serialize)]
pub struct UninstallReport {
    pub distribution: String,
    pub dist_info: PathBuf,
    pub removed: Vec<PathBuf>,
}

/// Locate the `.dist-info` directory of `distribution` in purelib or platlib.
pub fn find_dist_info(scheme: &Scheme, distribution: &str) -> Result<Option<PathBuf>> {
    let wanted = normalize_name(distribution);
    for site in scheme.site_dirs() {
        let entries = match fs::read_dir(site) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(io_error(site)(e)),
        };
        for entry in entries {
            let entry = entry.map_err(io_error(site))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let Some(stem) = file_name.strip_suffix(".dist-info") else {
                continue;
            };
            let Some((name, _version)) = stem.rsplit_once('-') else {
                continue;
            };
            if normalize_name(name) == wanted && entry.path().is_dir() {
                return Ok(Some(entry.path()));
            }
        }
    }
    Ok(None)
}

/// Remove every file listed in the distribution's RECORD, its bytecode
/// caches and its `.dist-info` directory, then prune directories left empty.
/// Scheme directories and their ancestors are never removed.
pub fn uninstall(scheme: &Scheme, distribution: &str) -> Result<UninstallReport> {
    let dist_info = find_dist_info(scheme, distribution)?
        .ok_or_else(|| InstallError::NotInstalled(distribution.to_string()))?;
    let base = dist_info
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dist_info.clone());
    let record_path = dist_info.join("RECORD");
    let record_text = fs::read_to_string(&record_path).map_err(io_error(&record_path))?;
    let entries = parse_record(&record_text)?;

    let roots: Vec<&Path> = [
        Category::Purelib,
        Category::Platlib,
        Category::Headers,
        Category::Scripts,
        Category::Data,
    ]
    .iter()
    .map(|c| scheme.path_for(*c))
    .collect();

    let mut removed = Vec::new();
    let mut touched_dirs = BTreeSet::new();
    for entry in &entries {
        let path = normalize_lexically(&base.join(&entry.path));
        if !roots.iter().any(|root| path.starts_with(root)) {
            tracing::warn!(path = %path.display(), "RECORD entry outside the install scheme, skipping");
            continue;
        }
        if remove_file_if_present(&path)? {
            removed.push(path.clone());
        }
        if path.extension().is_some_and(|ext| ext == "py") {
            removed.extend(remove_bytecode(&path)?);
        }
        if let Some(parent) = path.parent() {
            touched_dirs.insert(parent.to_path_buf());
            touched_dirs.insert(parent.join("__pycache__"));
        }
    }

    if dist_info.exists() {
        fs::remove_dir_all(&dist_info).map_err(io_error(&dist_info))?;
    }

    // Deepest first so that emptied parents become removable.
    let mut dirs: Vec<PathBuf> = touched_dirs.into_iter().collect();
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for dir in dirs {
        prune_empty(&dir, &roots)?;
    }

    tracing::info!(
        distribution,
        dist_info = %dist_info.display(),
        removed = removed.len(),
        "Uninstalled distribution"
    );
    Ok(UninstallReport {
        distribution: distribution.to_string(),
        dist_info,
        removed,
    })
}

fn remove_file_if_present(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(false),
        Ok(_) => {
            fs::remove_file(path).map_err(io_error(path))?;
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(path)(e)),
    }
}

/// `__pycache__/<stem>.*.pyc` next to `source`, written by the interpreter on import.
fn remove_bytecode(source: &Path) -> Result<Vec<PathBuf>> {
    let (Some(parent), Some(stem)) = (source.parent(), source.file_stem()) else {
        return Ok(Vec::new());
    };
    let cache = parent.join("__pycache__");
    let prefix = format!("{}.", stem.to_string_lossy());
    let entries = match fs::read_dir(&cache) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(&cache)(e)),
    };
    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(io_error(&cache))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && name.ends_with(".pyc") {
            let path = entry.path();
            if remove_file_if_present(&path)? {
                removed.push(path);
            }
        }
    }
    Ok(removed)
}

/// Remove `dir` and then its parents while they are empty, stopping at any
/// scheme root or ancestor of one.
fn prune_empty(dir: &Path, roots: &[&Path]) -> Result<()> {
    let mut current = Some(dir);
    while let Some(dir) = current {
        if roots.iter().any(|root| root.starts_with(dir)) {
            break;
        }
        let is_empty = match fs::read_dir(dir) {
            Ok(mut entries) => entries.next().is_none(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                current = dir.parent();
                continue;
            }
            Err(e) => return Err(io_error(dir)(e)),
        };
        if !is_empty {
            break;
        }
        fs::remove_dir(dir).map_err(io_error(dir))?;
        current = dir.parent();
    }
    Ok(())
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::SchemeDictionaryDestination;
    use crate::install::{install, AdditionalMetadata};
    use crate::scripts::ScriptKind;
    use crate::source::WheelFile;
    use crate::test_support::WheelBuilder;

    fn install_fixture(root: &Path) -> Scheme {
        let wheel_path = WheelBuilder::new("test_pkg", "0.0.1")
            .file("test_pkg/__init__.py", b"def main():\n    pass\n")
            .file("test_pkg/sub/mod.py", b"")
            .entry_points("[console_scripts]\ntest-pkg = test_pkg:main\n")
            .write(root);
        let prefix = root.join("env");
        let scheme = Scheme::for_prefix(&prefix, (3, 12));
        let dest = SchemeDictionaryDestination::new(
            scheme.clone(),
            prefix.join("bin/python"),
            ScriptKind::Posix,
        );
        install(
            &mut WheelFile::open(&wheel_path).unwrap(),
            &dest,
            &AdditionalMetadata::new(),
        )
        .unwrap();
        scheme
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/env/lib/python3.12/site-packages/../../../bin/x")),
            PathBuf::from("/env/bin/x")
        );
    }

    #[test]
    fn test_find_dist_info_by_normalized_name() {
        let tmp = tempfile::tempdir().unwrap();
        let scheme = install_fixture(tmp.path());
        let found = find_dist_info(&scheme, "Test-Pkg").unwrap().unwrap();
        assert!(found.ends_with("test_pkg-0.0.1.dist-info"));
        assert!(find_dist_info(&scheme, "other").unwrap().is_none());
    }

    #[test]
    fn test_uninstall_removes_files_and_prunes() {
        let tmp = tempfile::tempdir().unwrap();
        let scheme = install_fixture(tmp.path());
        let pycache = scheme.purelib.join("test_pkg/__pycache__");
        fs::create_dir_all(&pycache).unwrap();
        fs::write(pycache.join("__init__.cpython-312.pyc"), b"").unwrap();

        let report = uninstall(&scheme, "test-pkg").unwrap();
        assert!(report.removed.iter().any(|p| p.ends_with("bin/test-pkg")));
        assert!(!scheme.purelib.join("test_pkg").exists());
        assert!(!report.dist_info.exists());
        assert!(!scheme.scripts.join("test-pkg").exists());
        assert!(scheme.purelib.is_dir());
        assert!(scheme.scripts.is_dir());
    }

    #[test]
    fn test_uninstall_missing_distribution() {
        let tmp = tempfile::tempdir().unwrap();
        let scheme = Scheme::for_prefix(tmp.path(), (3, 12));
        assert!(matches!(
            uninstall(&scheme, "test-pkg").unwrap_err(),
            InstallError::NotInstalled(_)
        ));
    }
}
