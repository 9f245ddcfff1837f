//! Installing an opened wheel into a destination.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use wheelcheck_core::core_metadata::CoreMetadata;
use wheelcheck_core::Category;

use crate::destination::WheelDestination;
use crate::error::{InstallError, Result};
use crate::source::WheelFile;

/// Extra files written into the `.dist-info` directory, keyed by file name.
pub type AdditionalMetadata = BTreeMap<String, Vec<u8>>;

const DEFAULT_INSTALLER: &[u8] = b"wheelcheck\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledFile {
    pub category: Category,
    pub path: String,
}

/// Outcome of a successful install.
#[derive(Debug, Clone, Serialize)]
pub struct InstalledDistribution {
    pub name: String,
    pub version: String,
    /// Absolute path of the installed `.dist-info` directory
    pub dist_info: PathBuf,
    pub files: Vec<InstalledFile>,
}

/// Install `wheel` into `destination`.
///
/// Payload files are verified against RECORD as they are extracted. Files
/// under `<name>-<version>.data/<category>/` go to that category and every
/// other file goes to the root category. Entry points become launcher
/// scripts, `INSTALLER` plus any `additional_metadata` is written into the
/// `.dist-info` directory, and a fresh RECORD covering all of it is written
/// last.
pub fn install(
    wheel: &mut WheelFile,
    destination: &dyn WheelDestination,
    additional_metadata: &AdditionalMetadata,
) -> Result<InstalledDistribution> {
    let metadata_text = wheel
        .read_dist_info("METADATA")?
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .ok_or_else(|| InstallError::InvalidWheelMetadata {
            file: "METADATA".to_string(),
            reason: "missing".to_string(),
        })?;
    let metadata = CoreMetadata::parse(&metadata_text).map_err(|e| {
        InstallError::InvalidWheelMetadata {
            file: "METADATA".to_string(),
            reason: e.to_string(),
        }
    })?;

    let root_category = if wheel.info().root_is_purelib {
        Category::Purelib
    } else {
        Category::Platlib
    };
    let dist_info = wheel.dist_info_dir().to_string();
    let data_prefix = format!("{}/", wheel.data_dir());
    let header_dir = dist_info
        .strip_suffix(".dist-info")
        .and_then(|stem| stem.rsplit_once('-'))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| wheel.filename().name.clone());

    let mut metadata_files = additional_metadata.clone();
    metadata_files
        .entry("INSTALLER".to_string())
        .or_insert_with(|| DEFAULT_INSTALLER.to_vec());

    tracing::info!(
        wheel = %wheel.path().display(),
        name = %metadata.name,
        version = %metadata.version,
        root = %root_category,
        "Installing wheel"
    );

    let payload: Vec<_> = wheel
        .record()
        .iter()
        .filter(|e| !wheel.is_record_file(&e.path))
        .filter(|e| {
            // Overridden by the metadata we write ourselves.
            e.path
                .strip_prefix(&format!("{}/", dist_info))
                .map_or(true, |name| !metadata_files.contains_key(name))
        })
        .cloned()
        .collect();

    let mut records = Vec::with_capacity(payload.len() + wheel.entry_points().len() + metadata_files.len());
    for entry in &payload {
        let (data, executable) = wheel.read_verified(entry)?;
        let (category, path) = match entry.path.strip_prefix(&data_prefix) {
            Some(rest) => {
                let (scheme_key, rel) = rest
                    .split_once('/')
                    .ok_or_else(|| InstallError::UnmappedCategory(rest.to_string()))?;
                let category: Category = scheme_key
                    .parse()
                    .map_err(|_| InstallError::UnmappedCategory(scheme_key.to_string()))?;
                let rel = match category {
                    Category::Headers => format!("{}/{}", header_dir, rel),
                    _ => rel.to_string(),
                };
                (category, rel)
            }
            None => (root_category, entry.path.clone()),
        };
        let record = destination.write_file(category, &path, &data, executable)?;
        records.push((category, record));
    }

    for entry in wheel.entry_points() {
        let record = destination.write_script(entry)?;
        tracing::debug!(script = %entry.name, module = %entry.module, attr = %entry.attr, "Generated script");
        records.push((Category::Scripts, record));
    }

    for (name, data) in &metadata_files {
        if name.is_empty() || name.contains(['/', '\\']) || name == "RECORD" {
            return Err(InstallError::InvalidWheelMetadata {
                file: name.clone(),
                reason: "not a valid .dist-info file name".to_string(),
            });
        }
        let path = format!("{}/{}", dist_info, name);
        let record = destination.write_file(root_category, &path, data, false)?;
        records.push((root_category, record));
    }

    let files = records
        .iter()
        .map(|(category, record)| InstalledFile {
            category: *category,
            path: record.path.clone(),
        })
        .collect();
    let record_path = destination.finalize_installation(
        root_category,
        &format!("{}/RECORD", dist_info),
        records,
    )?;
    let dist_info = record_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| record_path.clone());

    tracing::info!(dist_info = %dist_info.display(), "Installed {}-{}", metadata.name, metadata.version);
    Ok(InstalledDistribution {
        name: metadata.name,
        version: metadata.version,
        dist_info,
        files,
    })
}
