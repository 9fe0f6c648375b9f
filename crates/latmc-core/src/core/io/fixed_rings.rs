use super::IoError;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Loads the fixed-ring file: one ring ID per line, blank lines and
/// `#`-comments ignored. The resulting set is immutable for the whole
/// simulation.
pub fn load_fixed_rings(path: &Path) -> Result<HashSet<usize>, IoError> {
    let content = fs::read_to_string(path).map_err(|source| IoError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rings = HashSet::new();
    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let id: usize = trimmed.parse().map_err(|_| IoError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            message: format!("invalid ring ID '{trimmed}'"),
        })?;
        rings.insert(id);
    }
    Ok(rings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_ids_skipping_comments_and_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# pinned pore\n3\n\n17\n3").unwrap();
        let rings = load_fixed_rings(file.path()).unwrap();
        assert_eq!(rings, [3, 17].into_iter().collect());
    }

    #[test]
    fn rejects_non_numeric_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "seven").unwrap();
        assert!(load_fixed_rings(file.path()).is_err());
    }
}
