//! Launcher scripts for entry points and `#!python` shebang rewriting.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::entry_points::EntryPoint;
use crate::error::InstallError;

/// Script-launching convention of the target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptKind {
    #[default]
    Posix,
}

impl FromStr for ScriptKind {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posix" => Ok(Self::Posix),
            other => Err(InstallError::UnsupportedScriptKind(other.to_string())),
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Posix => f.write_str("posix"),
        }
    }
}

/// Kernel limit on the shebang line on most POSIX systems.
const MAX_SHEBANG_LEN: usize = 127;

/// Shebang for `interpreter`. Paths with spaces or over the length limit go
/// through a `/bin/sh` trampoline that re-execs the interpreter.
pub fn shebang(interpreter: &Path) -> String {
    let interp = interpreter.to_string_lossy();
    if interp.len() + 2 <= MAX_SHEBANG_LEN && !interp.contains(' ') {
        format!("#!{}\n", interp)
    } else {
        format!("#!/bin/sh\n'''exec' {} \"$0\" \"$@\"\n' '''\n", sh_quote(&interp))
    }
}

/// Single-quote `s` for `/bin/sh`. Embedded quotes become `'"'"'`, which
/// also never forms `'''` inside the Python string the trampoline hides in.
fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\"'\"'"))
}

/// Python source of a launcher for `entry`.
pub fn launcher(entry: &EntryPoint, interpreter: &Path) -> Vec<u8> {
    let import_name = entry.attr.split('.').next().unwrap_or(&entry.attr);
    format!(
        "{shebang}# -*- coding: utf-8 -*-\n\
         import re\n\
         import sys\n\
         from {module} import {import_name}\n\
         if __name__ == \"__main__\":\n    \
         sys.argv[0] = re.sub(r\"(-script\\.pyw|\\.exe)?$\", \"\", sys.argv[0])\n    \
         sys.exit({call}())\n",
        shebang = shebang(interpreter),
        module = entry.module,
        import_name = import_name,
        call = entry.attr,
    )
    .into_bytes()
}

/// Replace a `#!python` / `#!pythonw` first line with the interpreter shebang.
/// `None` when `data` does not start with one.
pub fn rewrite_shebang(data: &[u8], interpreter: &Path) -> Option<Vec<u8>> {
    let first_end = data.iter().position(|&b| b == b'\n').unwrap_or(data.len());
    let first = std::str::from_utf8(&data[..first_end]).ok()?.trim_end_matches('\r');
    let rest = first.strip_prefix("#!python")?;
    if !(rest.is_empty() || rest == "w" || rest.starts_with(' ') || rest.starts_with("w ")) {
        return None;
    }
    let mut out = shebang(interpreter).into_bytes();
    out.extend_from_slice(data.get(first_end + 1..).unwrap_or_default());
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry_points::ScriptSection;

    #[test]
    fn test_shebang_direct_and_trampoline() {
        assert_eq!(shebang(Path::new("/env/bin/python")), "#!/env/bin/python\n");
        let spaced = shebang(Path::new("/my env/bin/python"));
        assert!(spaced.starts_with("#!/bin/sh\n"));
        assert!(spaced.contains("'/my env/bin/python'"));
        let long = format!("/{}/python", "a".repeat(200));
        assert!(shebang(Path::new(&long)).starts_with("#!/bin/sh\n"));
    }

    #[test]
    fn test_trampoline_quotes_apostrophes() {
        let interp = Path::new("/tmp/it's env/bin/python");
        let text = shebang(interp);
        assert!(text.contains("'/tmp/it'\"'\"'s env/bin/python'"));
        assert_eq!(text.matches("'''").count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_trampoline_parses_as_shell() {
        let tmp = tempfile::tempdir().unwrap();
        for interp in ["/tmp/it's env/bin/python", "/tmp/a''b c/python", "/my env/bin/python"] {
            let script = tmp.path().join("launcher");
            std::fs::write(&script, shebang(Path::new(interp))).unwrap();
            let status = std::process::Command::new("sh")
                .arg("-n")
                .arg(&script)
                .status()
                .unwrap();
            assert!(status.success(), "{}", interp);
        }
    }

    #[test]
    fn test_launcher_imports_head_and_calls_full_path() {
        let ep = EntryPoint {
            name: "tool".to_string(),
            module: "pkg.cli".to_string(),
            attr: "App.run".to_string(),
            section: ScriptSection::Console,
        };
        let script = String::from_utf8(launcher(&ep, Path::new("/env/bin/python"))).unwrap();
        assert!(script.starts_with("#!/env/bin/python\n"));
        assert!(script.contains("from pkg.cli import App\n"));
        assert!(script.contains("    sys.exit(App.run())\n"));
    }

    #[test]
    fn test_rewrite_shebang() {
        let out = rewrite_shebang(b"#!python\nprint(1)\n", Path::new("/env/bin/python")).unwrap();
        assert_eq!(out, b"#!/env/bin/python\nprint(1)\n");
        assert!(rewrite_shebang(b"#!pythonw\n", Path::new("/p")).is_some());
        assert!(rewrite_shebang(b"#!/bin/sh\necho\n", Path::new("/p")).is_none());
        assert!(rewrite_shebang(b"#!python3.11\n", Path::new("/p")).is_none());
    }

    #[test]
    fn test_windows_script_kinds_are_rejected() {
        assert_eq!("posix".parse::<ScriptKind>().unwrap(), ScriptKind::Posix);
        assert!(matches!(
            "win-amd64".parse::<ScriptKind>().unwrap_err(),
            InstallError::UnsupportedScriptKind(_)
        ));
    }
}
