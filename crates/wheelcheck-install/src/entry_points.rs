//! `entry_points.txt` parsing (console and GUI scripts only).

use crate::error::{InstallError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptSection {
    Console,
    Gui,
}

/// `name = module:attr` from a script section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub module: String,
    pub attr: String,
    pub section: ScriptSection,
}

/// Extract script entry points; other groups are ignored.
pub fn parse_entry_points(text: &str) -> Result<Vec<EntryPoint>> {
    let mut section: Option<ScriptSection> = None;
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(group) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = match group.trim() {
                "console_scripts" => Some(ScriptSection::Console),
                "gui_scripts" => Some(ScriptSection::Gui),
                _ => None,
            };
            continue;
        }
        let Some(section) = section else {
            continue;
        };
        let (name, value) = line
            .split_once('=')
            .ok_or_else(|| InstallError::InvalidEntryPoint(line.to_string()))?;
        // Drop extras: `module:attr [extra1, extra2]`
        let value = value.split('[').next().unwrap_or_default().trim();
        let (module, attr) = value
            .split_once(':')
            .map(|(m, a)| (m.trim(), a.trim()))
            .filter(|(m, a)| !m.is_empty() && !a.is_empty())
            .ok_or_else(|| InstallError::InvalidEntryPoint(line.to_string()))?;
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(InstallError::InvalidEntryPoint(line.to_string()));
        }
        entries.push(EntryPoint {
            name: name.to_string(),
            module: module.to_string(),
            attr: attr.to_string(),
            section,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script_sections_only() {
        let text = "\
[console_scripts]
test-pkg = test_pkg:main
tool = test_pkg.cli:App.run [color]

[gui_scripts]
viewer=test_pkg.gui:start

[pytest11]
plugin = test_pkg.plugin
";
        let eps = parse_entry_points(text).unwrap();
        assert_eq!(eps.len(), 3);
        assert_eq!(eps[0].name, "test-pkg");
        assert_eq!(eps[1].attr, "App.run");
        assert_eq!(eps[2].section, ScriptSection::Gui);
    }

    #[test]
    fn test_parse_rejects_module_only_script() {
        let err = parse_entry_points("[console_scripts]\nx = mod\n").unwrap_err();
        assert!(matches!(err, InstallError::InvalidEntryPoint(_)));
        assert!(parse_entry_points("[console_scripts]\n../x = m:f\n").is_err());
    }
}
