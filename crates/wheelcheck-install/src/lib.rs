//! Wheel installation into an install scheme.
//!
//! A [`WheelFile`] is opened and cross-checked against its RECORD, then
//! [`install`] streams its payload into a [`WheelDestination`], generating
//! entry-point launchers and a fresh RECORD. [`uninstall`] reverses an
//! install using that RECORD.

pub mod destination;
pub mod entry_points;
pub mod error;
pub mod filename;
pub mod install;
pub mod record;
pub mod scripts;
pub mod source;
pub mod uninstall;

pub use destination::{SchemeDictionaryDestination, WheelDestination};
pub use entry_points::{EntryPoint, ScriptSection};
pub use error::{InstallError, Result};
pub use filename::WheelFilename;
pub use install::{install, AdditionalMetadata, InstalledDistribution, InstalledFile};
pub use record::{RecordEntry, RecordHash};
pub use scripts::ScriptKind;
pub use source::{WheelFile, WheelInfo};
pub use uninstall::{find_dist_info, uninstall, UninstallReport};

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs::File;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use zip::write::FileOptions;

    use crate::record::{write_record, RecordEntry};

    /// Assembles small wheels for tests, generating RECORD from the payload.
    pub struct WheelBuilder {
        name: String,
        version: String,
        dist_info: Option<String>,
        entry_points: Option<String>,
        files: Vec<(String, Vec<u8>)>,
        unrecorded: Vec<(String, Vec<u8>)>,
        tampered: Vec<(String, Vec<u8>, Vec<u8>)>,
    }

    impl WheelBuilder {
        pub fn new(name: &str, version: &str) -> Self {
            Self {
                name: name.to_string(),
                version: version.to_string(),
                dist_info: None,
                entry_points: None,
                files: Vec::new(),
                unrecorded: Vec::new(),
                tampered: Vec::new(),
            }
        }

        pub fn file(mut self, path: &str, data: &[u8]) -> Self {
            self.files.push((path.to_string(), data.to_vec()));
            self
        }

        pub fn unrecorded_file(mut self, path: &str, data: &[u8]) -> Self {
            self.unrecorded.push((path.to_string(), data.to_vec()));
            self
        }

        /// Recorded with the hash of `recorded` but stored as `actual`.
        pub fn tampered_file(mut self, path: &str, recorded: &[u8], actual: &[u8]) -> Self {
            self.tampered
                .push((path.to_string(), recorded.to_vec(), actual.to_vec()));
            self
        }

        pub fn entry_points(mut self, text: &str) -> Self {
            self.entry_points = Some(text.to_string());
            self
        }

        pub fn dist_info_name(mut self, dir: &str) -> Self {
            self.dist_info = Some(dir.to_string());
            self
        }

        pub fn write(self, dir: &Path) -> PathBuf {
            let dist_info = self
                .dist_info
                .clone()
                .unwrap_or_else(|| format!("{}-{}.dist-info", self.name, self.version));
            let mut files = self.files.clone();
            files.push((
                format!("{}/METADATA", dist_info),
                format!("Metadata-Version: 2.1\nName: {}\nVersion: {}\n", self.name, self.version)
                    .into_bytes(),
            ));
            files.push((
                format!("{}/WHEEL", dist_info),
                b"Wheel-Version: 1.0\nGenerator: wheelcheck-tests\nRoot-Is-Purelib: true\nTag: py3-none-any\n"
                    .to_vec(),
            ));
            if let Some(ref eps) = self.entry_points {
                files.push((format!("{}/entry_points.txt", dist_info), eps.as_bytes().to_vec()));
            }

            let mut record: Vec<RecordEntry> = files
                .iter()
                .map(|(path, data)| RecordEntry::for_data(path.clone(), data))
                .collect();
            for (path, recorded, _) in &self.tampered {
                record.push(RecordEntry::for_data(path.clone(), recorded));
            }
            let record_path = format!("{}/RECORD", dist_info);
            record.push(RecordEntry {
                path: record_path.clone(),
                hash: None,
                size: None,
            });

            let wheel_path = dir.join(format!("{}-{}-py3-none-any.whl", self.name, self.version));
            let mut zip = zip::ZipWriter::new(File::create(&wheel_path).unwrap());
            let options = FileOptions::default();
            let stored = files
                .iter()
                .chain(self.unrecorded.iter())
                .map(|(p, d)| (p.clone(), d.clone()))
                .chain(self.tampered.iter().map(|(p, _, actual)| (p.clone(), actual.clone())))
                .chain(std::iter::once((record_path, write_record(&record).into_bytes())));
            for (path, data) in stored {
                zip.start_file(path, options).unwrap();
                zip.write_all(&data).unwrap();
            }
            zip.finish().unwrap();
            wheel_path
        }
    }
}
