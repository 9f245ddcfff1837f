//! Environment variable loading.
//!
//! Keeps the alias/fallback chains in one place so callers never repeat
//! `or_else` ladders.

use std::env;
use std::path::Path;

/// Load `.env` from the current directory (existing variables win).
pub fn load_dotenv() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if let Ok(dir) = env::current_dir() {
            load_dotenv_from_dir(&dir);
        }
    });
}

/// Load `<dir>/.env` into the process environment without overriding
/// variables that are already set.
pub fn load_dotenv_from_dir(dir: &Path) {
    let Ok(content) = std::fs::read_to_string(dir.join(".env")) else {
        return;
    };
    for (key, value) in parse_dotenv(&content) {
        if env::var(&key).is_err() {
            env::set_var(&key, &value);
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some(eq_pos) = line.find('=') else {
            continue;
        };
        let key = line[..eq_pos].trim();
        let mut value = line[eq_pos + 1..].trim();
        // Strip inline comment (# not inside quotes)
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}

/// Read the primary variable or the first set alias, falling back to `default`.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default)
}

/// Read the primary variable or an alias; empty values count as unset.
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .and_then(|s| {
            let s = s.trim().to_string();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        })
}

/// Boolean variable: `0`/`false`/`no`/`off` are false, anything else set is true.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    let v = env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()));
    match v.as_deref() {
        Some(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotenv_quotes_and_comments() {
        let pairs = parse_dotenv(
            "# comment\nWHEELCHECK_A=1 # trailing\nexport WHEELCHECK_B=\"two words\"\nWHEELCHECK_C='x#y'\n\nbad line\n",
        );
        assert_eq!(
            pairs,
            vec![
                ("WHEELCHECK_A".to_string(), "1".to_string()),
                ("WHEELCHECK_B".to_string(), "two words".to_string()),
                ("WHEELCHECK_C".to_string(), "x#y".to_string()),
            ]
        );
    }

    #[test]
    fn test_env_helpers_fall_back_to_defaults() {
        let key = "WHEELCHECK_TEST_LOADER_UNSET_KEY";
        assert_eq!(env_or(key, &[], || "fallback".to_string()), "fallback");
        assert_eq!(env_optional(key, &[]), None);
        assert!(env_bool(key, &[], true));
        assert!(!env_bool(key, &[], false));
    }
}
