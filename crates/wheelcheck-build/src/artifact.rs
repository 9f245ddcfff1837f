//! Reading core metadata back out of built distributions.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use wheelcheck_core::core_metadata::CoreMetadata;
use wheelcheck_core::DistributionKind;

use crate::error::{BuildError, Result};

/// A distribution file produced by a build.
#[derive(Debug, Clone, Serialize)]
pub struct BuiltArtifact {
    pub path: PathBuf,
    pub kind: DistributionKind,
    pub metadata: CoreMetadata,
}

/// Identify `path` by extension and read its `METADATA` / `PKG-INFO`.
pub fn inspect(path: &Path) -> Result<BuiltArtifact> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (kind, text) = if file_name.ends_with(".whl") {
        (DistributionKind::Wheel, wheel_metadata(path)?)
    } else if file_name.ends_with(".tar.gz") {
        (DistributionKind::Sdist, sdist_pkg_info(path)?)
    } else {
        return Err(artifact_error(path, "not a .whl or .tar.gz file"));
    };
    let metadata = CoreMetadata::parse(&text).map_err(|e| artifact_error(path, e.to_string()))?;
    Ok(BuiltArtifact {
        path: path.to_path_buf(),
        kind,
        metadata,
    })
}

fn wheel_metadata(path: &Path) -> Result<String> {
    let file = open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| artifact_error(path, e.to_string()))?;
    let name = archive
        .file_names()
        .find(|n| {
            let mut parts = n.split('/');
            matches!(
                (parts.next(), parts.next(), parts.next()),
                (Some(dir), Some("METADATA"), None) if dir.ends_with(".dist-info")
            )
        })
        .map(str::to_string)
        .ok_or_else(|| artifact_error(path, "no .dist-info/METADATA entry"))?;
    let mut entry = archive
        .by_name(&name)
        .map_err(|e| artifact_error(path, e.to_string()))?;
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|e| artifact_error(path, e.to_string()))?;
    Ok(text)
}

fn sdist_pkg_info(path: &Path) -> Result<String> {
    let file = open(path)?;
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));
    let entries = archive
        .entries()
        .map_err(|e| artifact_error(path, e.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| artifact_error(path, e.to_string()))?;
        let is_top_level_pkg_info = {
            let entry_path = entry.path().map_err(|e| artifact_error(path, e.to_string()))?;
            let components: Vec<_> = entry_path.components().collect();
            components.len() == 2 && entry_path.ends_with("PKG-INFO")
        };
        if is_top_level_pkg_info {
            let mut text = String::new();
            entry
                .read_to_string(&mut text)
                .map_err(|e| artifact_error(path, e.to_string()))?;
            return Ok(text);
        }
    }
    Err(artifact_error(path, "no top-level PKG-INFO entry"))
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn artifact_error(path: &Path, message: impl Into<String>) -> BuildError {
    BuildError::Artifact {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const METADATA: &str = "Metadata-Version: 2.1\nName: test-pkg\nVersion: 0.0.1\n";

    #[test]
    fn test_inspect_wheel() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("test_pkg-0.0.1-py3-none-any.whl");
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        let options = zip::write::FileOptions::default();
        zip.start_file("test_pkg/__init__.py", options).unwrap();
        zip.start_file("test_pkg-0.0.1.dist-info/METADATA", options).unwrap();
        zip.write_all(METADATA.as_bytes()).unwrap();
        zip.finish().unwrap();

        let artifact = inspect(&path).unwrap();
        assert_eq!(artifact.kind, DistributionKind::Wheel);
        assert_eq!(artifact.metadata.name, "test-pkg");
        assert_eq!(artifact.metadata.version, "0.0.1");
    }

    #[test]
    fn test_inspect_sdist() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("test_pkg-0.0.1.tar.gz");
        let encoder = flate2::write::GzEncoder::new(
            File::create(&path).unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_size(METADATA.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "test_pkg-0.0.1/PKG-INFO", METADATA.as_bytes())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let artifact = inspect(&path).unwrap();
        assert_eq!(artifact.kind, DistributionKind::Sdist);
        assert_eq!(artifact.metadata.version, "0.0.1");
    }

    #[test]
    fn test_inspect_rejects_unknown_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("thing.egg");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(inspect(&path).unwrap_err(), BuildError::Artifact { .. }));
    }
}
