//! Wheel archives opened for installation.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use wheelcheck_core::core_metadata::{header, parse_headers};
use wheelcheck_core::name::normalize_name;

use crate::entry_points::{parse_entry_points, EntryPoint};
use crate::error::{io_error, InstallError, Result};
use crate::filename::WheelFilename;
use crate::record::{parse_record, RecordEntry};

/// Parsed `WHEEL` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelInfo {
    pub wheel_version: String,
    pub root_is_purelib: bool,
    pub tags: Vec<String>,
}

impl WheelInfo {
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: &str| InstallError::InvalidWheelMetadata {
            file: "WHEEL".to_string(),
            reason: reason.to_string(),
        };
        let headers = parse_headers(text);
        let wheel_version = header(&headers, "Wheel-Version")
            .ok_or_else(|| invalid("missing Wheel-Version"))?
            .to_string();
        if wheel_version.split('.').next() != Some("1") {
            return Err(InstallError::UnsupportedWheelVersion(wheel_version));
        }
        let root_is_purelib = match header(&headers, "Root-Is-Purelib").map(str::to_lowercase).as_deref() {
            Some("true") => true,
            Some("false") => false,
            _ => return Err(invalid("Root-Is-Purelib must be true or false")),
        };
        let tags = headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("Tag"))
            .map(|(_, v)| v.clone())
            .collect();
        Ok(Self {
            wheel_version,
            root_is_purelib,
            tags,
        })
    }
}

/// An opened wheel with its metadata parsed and its manifest cross-checked.
pub struct WheelFile {
    path: PathBuf,
    archive: zip::ZipArchive<File>,
    filename: WheelFilename,
    dist_info_dir: String,
    info: WheelInfo,
    record: Vec<RecordEntry>,
    entry_points: Vec<EntryPoint>,
}

impl std::fmt::Debug for WheelFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WheelFile")
            .field("path", &self.path)
            .field("filename", &self.filename)
            .field("dist_info_dir", &self.dist_info_dir)
            .finish()
    }
}

impl WheelFile {
    /// Open `path`, locate its `.dist-info`, parse `WHEEL`, `RECORD` and
    /// `entry_points.txt`, and check every archive member is in `RECORD`.
    pub fn open(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let filename = WheelFilename::parse(&file_name)?;
        let file = File::open(path).map_err(io_error(path))?;
        let archive = zip::ZipArchive::new(file).map_err(|e| InstallError::Archive {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let dist_info_dir = locate_dist_info(path, &archive, &filename)?;
        let mut wheel = Self {
            path: path.to_path_buf(),
            archive,
            filename,
            dist_info_dir,
            info: WheelInfo {
                wheel_version: String::new(),
                root_is_purelib: true,
                tags: Vec::new(),
            },
            record: Vec::new(),
            entry_points: Vec::new(),
        };

        let wheel_text = wheel.read_dist_info_text("WHEEL")?.ok_or_else(|| {
            InstallError::InvalidWheelMetadata {
                file: "WHEEL".to_string(),
                reason: "missing".to_string(),
            }
        })?;
        wheel.info = WheelInfo::parse(&wheel_text)?;

        let record_text = wheel
            .read_dist_info_text("RECORD")?
            .ok_or_else(|| InstallError::InvalidRecord("missing RECORD".to_string()))?;
        wheel.record = parse_record(&record_text)?;

        if let Some(text) = wheel.read_dist_info_text("entry_points.txt")? {
            wheel.entry_points = parse_entry_points(&text)?;
        }

        wheel.check_manifest()?;
        Ok(wheel)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filename(&self) -> &WheelFilename {
        &self.filename
    }

    pub fn dist_info_dir(&self) -> &str {
        &self.dist_info_dir
    }

    /// `{name}-{version}.data`, derived from the `.dist-info` directory name.
    pub fn data_dir(&self) -> String {
        let stem = self
            .dist_info_dir
            .strip_suffix(".dist-info")
            .unwrap_or(&self.dist_info_dir);
        format!("{}.data", stem)
    }

    pub fn info(&self) -> &WheelInfo {
        &self.info
    }

    pub fn record(&self) -> &[RecordEntry] {
        &self.record
    }

    pub fn entry_points(&self) -> &[EntryPoint] {
        &self.entry_points
    }

    /// Whether `path` is the RECORD file or one of its signatures, which carry no hash.
    pub fn is_record_file(&self, path: &str) -> bool {
        ["RECORD", "RECORD.jws", "RECORD.p7s"]
            .iter()
            .any(|f| path == format!("{}/{}", self.dist_info_dir, f))
    }

    /// Read a file from the `.dist-info` directory; `None` if absent.
    pub fn read_dist_info(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let member = format!("{}/{}", self.dist_info_dir, name);
        if !self.archive.file_names().any(|n| n == member) {
            return Ok(None);
        }
        self.read_member(&member).map(Some)
    }

    fn read_dist_info_text(&mut self, name: &str) -> Result<Option<String>> {
        match self.read_dist_info(name)? {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| InstallError::InvalidWheelMetadata {
                    file: name.to_string(),
                    reason: "not valid UTF-8".to_string(),
                }),
        }
    }

    /// Read a member and check it against its RECORD entry. Returns the bytes
    /// and whether the archive marks the member executable.
    pub fn read_verified(&mut self, entry: &RecordEntry) -> Result<(Vec<u8>, bool)> {
        check_safe_path(&entry.path)?;
        let executable = {
            let member = self.archive.by_name(&entry.path).map_err(|e| InstallError::RecordMismatch {
                path: entry.path.clone(),
                reason: e.to_string(),
            })?;
            member.unix_mode().map(|m| m & 0o111 != 0).unwrap_or(false)
        };
        let data = self.read_member(&entry.path)?;
        entry.validate(&data)?;
        Ok((data, executable))
    }

    fn read_member(&mut self, member: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.by_name(member).map_err(|e| InstallError::Archive {
            path: self.path.clone(),
            message: format!("{}: {}", member, e),
        })?;
        // The declared size is untrusted; read_to_end grows past the cap.
        let capacity = usize::try_from(file.size().min(MAX_PREALLOCATION)).unwrap_or(0);
        let mut data = Vec::with_capacity(capacity);
        file.read_to_end(&mut data).map_err(|e| InstallError::Archive {
            path: self.path.clone(),
            message: format!("{}: {}", member, e),
        })?;
        Ok(data)
    }

    /// Every file member must be listed in RECORD, and every RECORD path
    /// other than the RECORD file itself must exist in the archive.
    fn check_manifest(&self) -> Result<()> {
        let recorded: BTreeSet<&str> = self.record.iter().map(|e| e.path.as_str()).collect();
        let members: BTreeSet<&str> = self
            .archive
            .file_names()
            .filter(|n| !n.ends_with('/'))
            .collect();
        for member in &members {
            check_safe_path(member)?;
            if !recorded.contains(member) && !self.is_record_file(member) {
                return Err(InstallError::RecordMismatch {
                    path: member.to_string(),
                    reason: "file is not listed in RECORD".to_string(),
                });
            }
        }
        for path in &recorded {
            if !members.contains(path) && !self.is_record_file(path) {
                return Err(InstallError::RecordMismatch {
                    path: path.to_string(),
                    reason: "listed in RECORD but missing from the archive".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Upper bound on the buffer reserved from a member's declared size.
const MAX_PREALLOCATION: u64 = 1 << 20;

fn locate_dist_info(
    path: &Path,
    archive: &zip::ZipArchive<File>,
    filename: &WheelFilename,
) -> Result<String> {
    let candidates: BTreeSet<&str> = archive
        .file_names()
        .filter_map(|n| n.split('/').next())
        .filter(|top| top.ends_with(".dist-info"))
        .collect();
    let missing = |reason: String| InstallError::MissingDistInfo {
        wheel: path.to_path_buf(),
        reason,
    };
    let mut iter = candidates.iter();
    let dir = match (iter.next(), iter.next()) {
        (Some(dir), None) => *dir,
        (None, _) => return Err(missing("no .dist-info directory".to_string())),
        (Some(_), Some(_)) => return Err(missing(format!("multiple .dist-info directories: {:?}", candidates))),
    };
    let stem = dir.strip_suffix(".dist-info").unwrap_or(dir);
    let (name, version) = stem
        .rsplit_once('-')
        .ok_or_else(|| missing(format!("malformed directory name '{}'", dir)))?;
    if normalize_name(name) != normalize_name(&filename.name) || version != filename.version {
        return Err(missing(format!(
            "'{}' does not match {}-{}",
            dir, filename.name, filename.version
        )));
    }
    Ok(dir.to_string())
}

/// Archive paths must be relative and must not climb out of their category.
pub(crate) fn check_safe_path(path: &str) -> Result<()> {
    let unsafe_path = path.starts_with('/')
        || path.starts_with('\\')
        || path.contains('\\')
        || path.split('/').any(|c| c == "..")
        || has_drive_prefix(path);
    if unsafe_path {
        return Err(InstallError::UnsafePath(path.to_string()));
    }
    Ok(())
}

/// `C:` or `C:/...`. A colon elsewhere is an ordinary name character.
fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes.get(2), None | Some(b'/') | Some(b'\\'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::WheelBuilder;

    #[test]
    fn test_wheel_info_parse() {
        let info = WheelInfo::parse("Wheel-Version: 1.0\nGenerator: x\nRoot-Is-Purelib: True\nTag: py3-none-any\n").unwrap();
        assert!(info.root_is_purelib);
        assert_eq!(info.tags, vec!["py3-none-any"]);
        assert!(matches!(
            WheelInfo::parse("Wheel-Version: 2.0\nRoot-Is-Purelib: true\n").unwrap_err(),
            InstallError::UnsupportedWheelVersion(_)
        ));
        assert!(WheelInfo::parse("Wheel-Version: 1.0\n").is_err());
    }

    #[test]
    fn test_open_parses_metadata_and_entry_points() {
        let tmp = tempfile::tempdir().unwrap();
        let path = WheelBuilder::new("test_pkg", "0.0.1")
            .file("test_pkg/__init__.py", b"def main():\n    print('hi')\n")
            .entry_points("[console_scripts]\ntest-pkg = test_pkg:main\n")
            .write(tmp.path());
        let wheel = WheelFile::open(&path).unwrap();
        assert_eq!(wheel.dist_info_dir(), "test_pkg-0.0.1.dist-info");
        assert_eq!(wheel.data_dir(), "test_pkg-0.0.1.data");
        assert_eq!(wheel.entry_points().len(), 1);
        assert!(wheel.info().root_is_purelib);
    }

    #[test]
    fn test_open_rejects_unlisted_member() {
        let tmp = tempfile::tempdir().unwrap();
        let path = WheelBuilder::new("test_pkg", "0.0.1")
            .file("test_pkg/__init__.py", b"")
            .unrecorded_file("test_pkg/sneaky.py", b"import os\n")
            .write(tmp.path());
        assert!(matches!(
            WheelFile::open(&path).unwrap_err(),
            InstallError::RecordMismatch { .. }
        ));
    }

    #[test]
    fn test_open_rejects_mismatched_dist_info() {
        let tmp = tempfile::tempdir().unwrap();
        let path = WheelBuilder::new("test_pkg", "0.0.1")
            .dist_info_name("other_pkg-0.0.1.dist-info")
            .write(tmp.path());
        assert!(matches!(
            WheelFile::open(&path).unwrap_err(),
            InstallError::MissingDistInfo { .. }
        ));
    }

    #[test]
    fn test_check_safe_path() {
        check_safe_path("pkg/mod.py").unwrap();
        for bad in ["/etc/passwd", "../x", "pkg/../../x", "C:/x", "C:", "c:\\x", "pkg\\x"] {
            assert!(check_safe_path(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_colon_in_member_name_is_allowed() {
        check_safe_path("a:b.txt").unwrap();
        check_safe_path("pkg/C:x").unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let path = WheelBuilder::new("test_pkg", "0.0.1")
            .file("test_pkg/a:b.txt", b"colon")
            .write(tmp.path());
        let mut wheel = WheelFile::open(&path).unwrap();
        let entry = wheel
            .record()
            .iter()
            .find(|e| e.path == "test_pkg/a:b.txt")
            .cloned()
            .unwrap();
        let (data, _) = wheel.read_verified(&entry).unwrap();
        assert_eq!(data, b"colon");
    }

    #[test]
    fn test_read_member_larger_than_preallocation() {
        let tmp = tempfile::tempdir().unwrap();
        let payload = vec![b'x'; (MAX_PREALLOCATION as usize) + 17];
        let path = WheelBuilder::new("test_pkg", "0.0.1")
            .file("test_pkg/blob.bin", &payload)
            .write(tmp.path());
        let mut wheel = WheelFile::open(&path).unwrap();
        let entry = wheel
            .record()
            .iter()
            .find(|e| e.path == "test_pkg/blob.bin")
            .cloned()
            .unwrap();
        let (data, _) = wheel.read_verified(&entry).unwrap();
        assert_eq!(data.len(), payload.len());
    }
}
