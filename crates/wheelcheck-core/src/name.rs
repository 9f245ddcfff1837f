//! Distribution name normalization.

/// PEP 503 normalized name: lowercase, runs of `-`, `_`, `.` collapsed to `-`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_run {
                out.push('-');
                in_run = true;
            }
        } else {
            out.extend(c.to_lowercase());
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Test_Pkg"), "test-pkg");
        assert_eq!(normalize_name("a.-_b"), "a-b");
        assert_eq!(normalize_name("test-pkg"), "test-pkg");
    }
}
