//! Where installed files land.

use std::fs;
use std::path::{Component, Path, PathBuf};

use wheelcheck_core::{Category, Scheme};

use crate::entry_points::EntryPoint;
use crate::error::{io_error, InstallError, Result};
use crate::record::{write_record, RecordEntry};
use crate::scripts::{launcher, rewrite_shebang, ScriptKind};

/// Receives the files of a wheel during installation.
pub trait WheelDestination {
    /// Write `data` at `path` relative to the directory of `category`.
    fn write_file(
        &self,
        category: Category,
        path: &str,
        data: &[u8],
        is_executable: bool,
    ) -> Result<RecordEntry>;

    /// Generate and write the launcher for a script entry point.
    fn write_script(&self, entry: &EntryPoint) -> Result<RecordEntry>;

    /// Write the RECORD file for everything installed. `record_path` is
    /// relative to the directory of `root_category`.
    fn finalize_installation(
        &self,
        root_category: Category,
        record_path: &str,
        records: Vec<(Category, RecordEntry)>,
    ) -> Result<PathBuf>;
}

/// Installs into the directories of a [`Scheme`].
#[derive(Debug, Clone)]
pub struct SchemeDictionaryDestination {
    scheme: Scheme,
    interpreter: PathBuf,
    script_kind: ScriptKind,
    overwrite_existing: bool,
}

impl SchemeDictionaryDestination {
    pub fn new(scheme: Scheme, interpreter: PathBuf, script_kind: ScriptKind) -> Self {
        Self {
            scheme,
            interpreter,
            script_kind,
            overwrite_existing: false,
        }
    }

    pub fn overwrite_existing(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn script_kind(&self) -> ScriptKind {
        self.script_kind
    }

    fn target_path(&self, category: Category, path: &str) -> Result<PathBuf> {
        crate::source::check_safe_path(path)?;
        Ok(self.scheme.path_for(category).join(path))
    }

    fn write_bytes(&self, target: &Path, data: &[u8], executable: bool) -> Result<()> {
        if target.exists() && !self.overwrite_existing {
            return Err(InstallError::FileExists(target.to_path_buf()));
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::write(target, data).map_err(io_error(target))?;
        if executable {
            make_executable(target)?;
        }
        tracing::trace!(path = %target.display(), bytes = data.len(), "Wrote file");
        Ok(())
    }
}

impl WheelDestination for SchemeDictionaryDestination {
    fn write_file(
        &self,
        category: Category,
        path: &str,
        data: &[u8],
        is_executable: bool,
    ) -> Result<RecordEntry> {
        let target = self.target_path(category, path)?;
        if category == Category::Scripts {
            // Scripts shipped in the data directory may carry a `#!python` placeholder.
            let rewritten = rewrite_shebang(data, &self.interpreter);
            let data = rewritten.as_deref().unwrap_or(data);
            self.write_bytes(&target, data, true)?;
            return Ok(RecordEntry::for_data(path, data));
        }
        self.write_bytes(&target, data, is_executable)?;
        Ok(RecordEntry::for_data(path, data))
    }

    fn write_script(&self, entry: &EntryPoint) -> Result<RecordEntry> {
        match self.script_kind {
            ScriptKind::Posix => {
                let data = launcher(entry, &self.interpreter);
                let target = self.target_path(Category::Scripts, &entry.name)?;
                self.write_bytes(&target, &data, true)?;
                Ok(RecordEntry::for_data(entry.name.clone(), &data))
            }
        }
    }

    fn finalize_installation(
        &self,
        root_category: Category,
        record_path: &str,
        records: Vec<(Category, RecordEntry)>,
    ) -> Result<PathBuf> {
        let root = self.scheme.path_for(root_category);
        let mut entries: Vec<RecordEntry> = records
            .into_iter()
            .map(|(category, mut entry)| {
                if category != root_category {
                    let absolute = self.scheme.path_for(category).join(&entry.path);
                    entry.path = relative_path(&absolute, root);
                }
                entry
            })
            .collect();
        entries.push(RecordEntry {
            path: record_path.to_string(),
            hash: None,
            size: None,
        });
        let target = self.target_path(root_category, record_path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::write(&target, write_record(&entries)).map_err(io_error(&target))?;
        Ok(target)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(io_error(path))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// `target` expressed relative to `base`, using `/` separators. Both are
/// expected to be absolute; the computation is purely lexical.
pub(crate) fn relative_path(target: &Path, base: &Path) -> String {
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();
    let common = target
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<String> = Vec::new();
    for _ in common..base.len() {
        parts.push("..".to_string());
    }
    for component in &target[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry_points::ScriptSection;
    use crate::record::parse_record;

    fn destination(prefix: &Path) -> SchemeDictionaryDestination {
        SchemeDictionaryDestination::new(
            Scheme::for_prefix(prefix, (3, 12)),
            prefix.join("bin").join("python"),
            ScriptKind::Posix,
        )
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/env/bin/tool"), Path::new("/env/lib/python3.12/site-packages")),
            "../../../bin/tool"
        );
        assert_eq!(relative_path(Path::new("/a/b/c"), Path::new("/a")), "b/c");
    }

    #[test]
    fn test_write_file_refuses_to_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = destination(tmp.path());
        dest.write_file(Category::Purelib, "pkg/mod.py", b"x = 1\n", false).unwrap();
        assert!(matches!(
            dest.write_file(Category::Purelib, "pkg/mod.py", b"x = 2\n", false).unwrap_err(),
            InstallError::FileExists(_)
        ));
        let dest = dest.overwrite_existing(true);
        dest.write_file(Category::Purelib, "pkg/mod.py", b"x = 2\n", false).unwrap();
        let written = fs::read_to_string(dest.scheme().purelib.join("pkg/mod.py")).unwrap();
        assert_eq!(written, "x = 2\n");
    }

    #[test]
    fn test_data_scripts_get_interpreter_shebang() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = destination(tmp.path());
        let entry = dest
            .write_file(Category::Scripts, "run-me", b"#!python\nprint('ok')\n", false)
            .unwrap();
        let written = fs::read(tmp.path().join("bin/run-me")).unwrap();
        let text = String::from_utf8(written.clone()).unwrap();
        assert!(!text.starts_with("#!python\n"));
        assert!(text.contains("bin/python"));
        assert!(text.ends_with("print('ok')\n"));
        entry.validate(&written).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(tmp.path().join("bin/run-me")).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn test_finalize_writes_record_relative_to_root() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = destination(tmp.path());
        let module = dest.write_file(Category::Purelib, "pkg/__init__.py", b"", false).unwrap();
        let script = dest
            .write_script(&EntryPoint {
                name: "tool".to_string(),
                module: "pkg".to_string(),
                attr: "main".to_string(),
                section: ScriptSection::Console,
            })
            .unwrap();
        let record = dest
            .finalize_installation(
                Category::Purelib,
                "pkg-1.0.dist-info/RECORD",
                vec![(Category::Purelib, module), (Category::Scripts, script)],
            )
            .unwrap();
        let entries = parse_record(&fs::read_to_string(record).unwrap()).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["pkg/__init__.py", "../../../bin/tool", "pkg-1.0.dist-info/RECORD"]
        );
        assert!(entries[2].hash.is_none());
    }
}
